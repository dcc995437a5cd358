// Row-scoped formulas: structured references to the current row plus arithmetic

pub mod parser;
pub mod eval;
