// JSON purchase batches
//
// Accepts either a bare array of rows or the flow payload shape
// `{"purchases": [[code, product, quantity, arrival], ...]}`.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchDocument {
    Rows(Vec<Vec<Value>>),
    Wrapped { purchases: Vec<Vec<Value>> },
}

pub fn load_purchases(path: &Path) -> Result<Vec<Vec<Value>>, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    parse_purchases(&content)
}

pub fn parse_purchases(content: &str) -> Result<Vec<Vec<Value>>, String> {
    let document: BatchDocument = serde_json::from_str(content).map_err(|_| {
        "expected an array of purchase rows or {\"purchases\": [...]}".to_string()
    })?;
    let rows = match document {
        BatchDocument::Rows(rows) => rows,
        BatchDocument::Wrapped { purchases } => purchases,
    };
    log::debug!("loaded {} purchase row(s)", rows.len());
    Ok(rows)
}
