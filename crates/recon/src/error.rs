use std::fmt;

use stockgrid_engine::EngineError;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (column out of width, duplicate index, etc.).
    ConfigValidation(String),
    /// The named stock table does not exist in the workbook.
    TableNotFound(String),
    /// Table is narrower than the configured column layout.
    TableTooNarrow { table_columns: usize, required: usize },
    /// The table store rejected a read or write.
    Store(EngineError),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::TableNotFound(name) => write!(f, "table not found: {name}"),
            Self::TableTooNarrow { table_columns, required } => {
                write!(f, "table has {table_columns} column(s), layout requires {required}")
            }
            Self::Store(err) => write!(f, "table store error: {err}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for ReconError {
    fn from(err: EngineError) -> Self {
        Self::Store(err)
    }
}
