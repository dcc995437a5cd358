use std::cell::RefCell;

use serde::Serialize;

use super::cell::{format_number, text_as_number, CellValue};
use super::error::EngineError;
use super::formula::eval::{self, RowLookup, Value};
use super::formula::parser;

/// Mutable handle to a fixed-column table.
///
/// Rows are 0-based within the data body (the header row is not a row).
/// Columns are 0-based in header order.
pub trait TableHandle {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// Header text of a column.
    fn column_name(&self, col: usize) -> Option<&str>;

    /// Display text of every body cell in a column, top to bottom.
    fn read_column(&self, col: usize) -> Result<Vec<String>, EngineError>;

    /// Set the first `rows` cells of a column to empty in one write.
    fn clear_column_range(&mut self, col: usize, rows: usize) -> Result<(), EngineError>;

    /// Append a row at the bottom of the body. Returns the new row's index.
    fn append_row(&mut self, fields: Vec<CellValue>) -> Result<usize, EngineError>;

    fn write_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), EngineError>;

    /// Store a formula whose structured references resolve against its own row.
    fn write_formula(&mut self, row: usize, col: usize, formula: &str) -> Result<(), EngineError>;
}

/// In-memory named table: a header row plus an ordered data body.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Column lookup by header text (case-insensitive, like structured references).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim().to_lowercase();
        self.columns
            .iter()
            .position(|c| c.trim().to_lowercase() == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Evaluated display text of a cell. Out-of-range cells display as empty.
    pub fn display(&self, row: usize, col: usize) -> String {
        match self.cell(row, col) {
            None | Some(CellValue::Empty) => String::new(),
            Some(CellValue::Text(s)) => s.clone(),
            Some(CellValue::Number(n)) => format_number(*n),
            Some(CellValue::Formula { .. }) => self.row_context(row).cell_value(col).to_text(),
        }
    }

    /// Evaluated numeric value of a cell. Errors evaluate to NaN.
    pub fn number(&self, row: usize, col: usize) -> f64 {
        self.row_context(row)
            .cell_value(col)
            .to_number()
            .unwrap_or(f64::NAN)
    }

    fn row_context(&self, row: usize) -> RowContext<'_> {
        RowContext {
            table: self,
            row,
            evaluating: RefCell::new(Vec::new()),
        }
    }

    fn check_column(&self, col: usize) -> Result<(), EngineError> {
        if col >= self.columns.len() {
            return Err(EngineError::ColumnOutOfRange {
                col,
                columns: self.columns.len(),
            });
        }
        Ok(())
    }

    fn check_cell(&self, row: usize, col: usize) -> Result<(), EngineError> {
        self.check_column(col)?;
        if row >= self.rows.len() {
            return Err(EngineError::RowOutOfRange {
                row,
                rows: self.rows.len(),
            });
        }
        Ok(())
    }
}

impl TableHandle for Table {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, col: usize) -> Option<&str> {
        self.columns.get(col).map(String::as_str)
    }

    fn read_column(&self, col: usize) -> Result<Vec<String>, EngineError> {
        self.check_column(col)?;
        Ok((0..self.rows.len()).map(|row| self.display(row, col)).collect())
    }

    fn clear_column_range(&mut self, col: usize, rows: usize) -> Result<(), EngineError> {
        self.check_column(col)?;
        let end = rows.min(self.rows.len());
        for row in &mut self.rows[..end] {
            row[col] = CellValue::Empty;
        }
        log::trace!("table '{}': cleared column {col} for {end} row(s)", self.name);
        Ok(())
    }

    fn append_row(&mut self, fields: Vec<CellValue>) -> Result<usize, EngineError> {
        if fields.len() != self.columns.len() {
            return Err(EngineError::FieldCountMismatch {
                expected: self.columns.len(),
                found: fields.len(),
            });
        }
        self.rows.push(fields);
        Ok(self.rows.len() - 1)
    }

    fn write_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), EngineError> {
        self.check_cell(row, col)?;
        self.rows[row][col] = value;
        Ok(())
    }

    fn write_formula(&mut self, row: usize, col: usize, formula: &str) -> Result<(), EngineError> {
        self.check_cell(row, col)?;
        let ast = parser::parse(formula).map_err(|message| EngineError::FormulaParse {
            source: formula.to_string(),
            message,
        })?;
        if let Some(missing) = parser::referenced_columns(&ast)
            .into_iter()
            .find(|name| self.column_index(name).is_none())
        {
            return Err(EngineError::UnknownColumn(missing.to_string()));
        }
        self.rows[row][col] = CellValue::Formula {
            source: formula.trim().to_string(),
            ast: Some(ast),
        };
        Ok(())
    }
}

/// Evaluation context for one row. Tracks the columns currently being
/// evaluated so self-referencing formulas yield `#CIRC!` instead of recursing.
struct RowContext<'a> {
    table: &'a Table,
    row: usize,
    evaluating: RefCell<Vec<usize>>,
}

impl RowContext<'_> {
    fn cell_value(&self, col: usize) -> Value {
        match self.table.cell(self.row, col) {
            None | Some(CellValue::Empty) => Value::Number(0.0),
            Some(CellValue::Number(n)) => Value::Number(*n),
            Some(CellValue::Text(s)) => Value::Number(text_as_number(s)),
            Some(CellValue::Formula { ast: None, .. }) => Value::Error("#NAME?".to_string()),
            Some(CellValue::Formula { ast: Some(ast), .. }) => {
                if self.evaluating.borrow().contains(&col) {
                    return Value::Error("#CIRC!".to_string());
                }
                self.evaluating.borrow_mut().push(col);
                let result = eval::evaluate(ast, self);
                self.evaluating.borrow_mut().retain(|c| *c != col);
                result
            }
        }
    }
}

impl RowLookup for RowContext<'_> {
    fn column_value(&self, name: &str) -> Option<Value> {
        self.table.column_index(name).map(|col| self.cell_value(col))
    }
}
