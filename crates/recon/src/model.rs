use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use stockgrid_engine::cell::format_number;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One incoming purchase, coerced from a `[code, product, quantity, arrival]` row.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub code: String,
    /// Empty when the source row carried no (or a falsy) product name.
    pub product: String,
    /// NaN when the source quantity is not numeric.
    pub quantity: f64,
    pub arrival_date: String,
}

impl PurchaseRecord {
    pub fn new(
        code: impl Into<String>,
        product: impl Into<String>,
        quantity: f64,
        arrival_date: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            product: product.into(),
            quantity,
            arrival_date: arrival_date.into(),
        }
    }

    /// Coerce a raw purchase row. Never fails: missing fields read as absent,
    /// fields past index 3 are ignored, junk quantities become NaN.
    pub fn from_fields(fields: &[Value]) -> Self {
        let code = fields.first().map(to_text).unwrap_or_default();
        let product = match fields.get(1) {
            Some(v) if is_truthy(v) => to_text(v),
            _ => String::new(),
        };
        let quantity = fields.get(2).map(to_number).unwrap_or(f64::NAN);
        let arrival_date = fields.get(3).map(to_text).unwrap_or_default();

        Self { code, product, quantity, arrival_date }
    }

    pub fn batch_from_rows(rows: &[Vec<Value>]) -> Vec<Self> {
        rows.iter().map(|row| Self::from_fields(row)).collect()
    }
}

// ---------------------------------------------------------------------------
// Coercions (host scripting semantics)
// ---------------------------------------------------------------------------

/// String view of a JSON value. `null` reads as an empty string.
fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Numeric view of a JSON value: `null` is 0, booleans are 0/1, text is
/// parsed after trimming (empty text is 0), anything unparseable is NaN.
fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b { 1.0 } else { 0.0 }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_number_text(s),
        Value::Array(_) => parse_number_text(&to_text(value)),
        Value::Object(_) => f64::NAN,
    }
}

fn parse_number_text(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }

    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // Rust's float parser also accepts "inf"/"nan"; plain decimal notation only.
    if t.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) {
        t.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileSummary {
    /// Purchase records processed, duplicates included.
    #[serde(rename = "actualizados")]
    pub updated_count: usize,
    /// Rows appended for codes not present in the table.
    pub inserted: usize,
    /// Records applied to an already existing row.
    pub matched: usize,
    /// Rows whose order-state columns were reset before applying the batch.
    pub cleared_rows: usize,
    pub run_date: NaiveDate,
}
