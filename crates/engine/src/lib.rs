pub mod cell;
pub mod error;
pub mod formula;
pub mod table;
pub mod workbook;

pub use cell::CellValue;
pub use error::EngineError;
pub use table::{Table, TableHandle};
pub use workbook::Workbook;
