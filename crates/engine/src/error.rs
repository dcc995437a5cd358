use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Column index past the table's last column.
    ColumnOutOfRange { col: usize, columns: usize },
    /// Row index past the end of the data body.
    RowOutOfRange { row: usize, rows: usize },
    /// Appended row does not have one field per column.
    FieldCountMismatch { expected: usize, found: usize },
    /// Formula text could not be parsed.
    FormulaParse { source: String, message: String },
    /// Structured reference names a column the table does not have.
    UnknownColumn(String),
    /// A table with this name already exists in the workbook.
    DuplicateTable(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnOutOfRange { col, columns } => {
                write!(f, "column {col} out of range (table has {columns} columns)")
            }
            Self::RowOutOfRange { row, rows } => {
                write!(f, "row {row} out of range (table has {rows} rows)")
            }
            Self::FieldCountMismatch { expected, found } => {
                write!(f, "row has {found} field(s), table expects {expected}")
            }
            Self::FormulaParse { source, message } => {
                write!(f, "cannot parse formula '{source}': {message}")
            }
            Self::UnknownColumn(name) => write!(f, "unknown column: {name}"),
            Self::DuplicateTable(name) => write!(f, "table '{name}' already exists"),
        }
    }
}

impl std::error::Error for EngineError {}
