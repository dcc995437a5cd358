use super::error::EngineError;
use super::table::Table;

/// Ordered collection of named tables.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    tables: Vec<Table>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. Table names are unique, compared case-insensitively.
    pub fn add_table(&mut self, table: Table) -> Result<usize, EngineError> {
        if self.table(table.name()).is_some() {
            return Err(EngineError::DuplicateTable(table.name().to_string()));
        }
        self.tables.push(table);
        Ok(self.tables.len() - 1)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name().eq_ignore_ascii_case(name))
    }
}
