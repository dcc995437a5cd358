use std::path::Path;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    /// Name of the stock table in the workbook.
    #[serde(default = "default_table")]
    pub table: String,
    /// Value written to the ordered-flag column of every row in the batch.
    #[serde(default = "default_ordered_marker")]
    pub ordered_marker: String,
    #[serde(default)]
    pub columns: ColumnLayout,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            ordered_marker: default_ordered_marker(),
            columns: ColumnLayout::default(),
        }
    }
}

fn default_table() -> String {
    "Stock".into()
}

fn default_ordered_marker() -> String {
    "Sí".into()
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// 0-based column positions of the stock table contract.
///
/// Column 4 of the default layout is not touched by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnLayout {
    pub code: usize,
    pub product: usize,
    pub on_hand: usize,
    pub ordered_flag: usize,
    pub order_date: usize,
    pub quantity_ordered: usize,
    pub arrival_date: usize,
    pub projected: usize,
    /// Number of fields in a freshly inserted row.
    pub width: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            code: 0,
            product: 1,
            on_hand: 2,
            ordered_flag: 3,
            order_date: 5,
            quantity_ordered: 6,
            arrival_date: 7,
            projected: 8,
            width: 9,
        }
    }
}

impl ColumnLayout {
    /// Columns holding in-transit order state, cleared at the start of every pass.
    pub fn volatile(&self) -> [usize; 4] {
        [self.ordered_flag, self.order_date, self.quantity_ordered, self.arrival_date]
    }

    fn named(&self) -> [(&'static str, usize); 8] {
        [
            ("code", self.code),
            ("product", self.product),
            ("on_hand", self.on_hand),
            ("ordered_flag", self.ordered_flag),
            ("order_date", self.order_date),
            ("quantity_ordered", self.quantity_ordered),
            ("arrival_date", self.arrival_date),
            ("projected", self.projected),
        ]
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.table.trim().is_empty() {
            return Err(ReconError::ConfigValidation("table name must not be empty".into()));
        }

        if self.ordered_marker.is_empty() {
            return Err(ReconError::ConfigValidation(
                "ordered_marker must not be empty".into(),
            ));
        }

        let named = self.columns.named();

        // Every column must fit inside an inserted row
        for (name, index) in named {
            if index >= self.columns.width {
                return Err(ReconError::ConfigValidation(format!(
                    "column '{name}' = {index} is outside width {}",
                    self.columns.width
                )));
            }
        }

        // No two roles may share a column
        for (i, (name_a, index_a)) in named.iter().enumerate() {
            if let Some((name_b, _)) = named[i + 1..].iter().find(|(_, b)| b == index_a) {
                return Err(ReconError::ConfigValidation(format!(
                    "columns '{name_a}' and '{name_b}' both use index {index_a}"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
