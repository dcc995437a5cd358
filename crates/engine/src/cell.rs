use serde::Serialize;

use super::formula::parser::{self, Expr};

#[derive(Debug, Clone, Default, Serialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Formula {
        source: String,
        #[serde(skip)]
        ast: Option<Expr>,
    },
}

impl CellValue {
    /// Cell for text as entered. Text is kept verbatim and a leading `'` forces
    /// text. Input only becomes a number when it is that number's own rendering,
    /// so codes such as `007`, `1.50` or `1E3` stay as typed.
    pub fn from_input(input: &str) -> Self {
        if let Some(literal) = input.strip_prefix('\'') {
            return Self::text(literal);
        }

        if input.starts_with('=') {
            return Self::formula(input);
        }

        match input.parse::<f64>() {
            Ok(num) if format_number(num) == input => CellValue::Number(num),
            _ => Self::text(input),
        }
    }

    /// Text cell; an empty string is stored as an empty cell.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Formula cell. Unparseable sources are kept with no AST and display as `#NAME?`.
    pub fn formula(source: &str) -> Self {
        let source = source.trim();
        CellValue::Formula {
            source: source.to_string(),
            ast: parser::parse(source).ok(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Value as typed: the formula source for formulas, stored content otherwise.
    /// Text that would read back as a formula (or starts with `'`) gets a `'`
    /// prefix, so `from_input(&cell.raw_display())` gives the same cell.
    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) if s.starts_with('=') || s.starts_with('\'') => format!("'{s}"),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Formula { source, .. } => source.clone(),
        }
    }
}

/// Number to text the way a spreadsheet host stringifies cell values:
/// integers without a fraction, `NaN`, `Infinity`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Numeric view of stored text: parsed if it looks like a number, 0 otherwise.
pub fn text_as_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse().unwrap_or(0.0)
}
