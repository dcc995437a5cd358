use log::{debug, info, warn};

use stockgrid_engine::formula::parser::{self, this_row_ref};
use stockgrid_engine::{CellValue, EngineError, TableHandle, Workbook};

use crate::clock::{iso_date, Clock};
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::model::{PurchaseRecord, ReconcileSummary};

/// Reconcile a batch of purchases against the stock table.
///
/// 1. Clear the order-state columns of every existing row.
/// 2. Snapshot the code column once.
/// 3. For each purchase in order: find the first row with the same code
///    (appending a zero-stock row when there is none), then stamp the order
///    flag, order date, quantity, arrival date and the projected-stock formula.
///
/// Writes are applied as they happen. A store error midway leaves the rows
/// written so far in place; re-running the same batch converges.
pub fn reconcile<T: TableHandle + ?Sized>(
    table: &mut T,
    purchases: &[PurchaseRecord],
    config: &ReconConfig,
    clock: &dyn Clock,
) -> Result<ReconcileSummary, ReconError> {
    let layout = &config.columns;
    if table.column_count() < layout.width {
        return Err(ReconError::TableTooNarrow {
            table_columns: table.column_count(),
            required: layout.width,
        });
    }

    let projection = projection_formula(table, config)?;
    let run_date = clock.current_date();
    let today = iso_date(clock);

    // Reset stale order state
    let existing_rows = table.row_count();
    if existing_rows > 0 {
        for col in layout.volatile() {
            table.clear_column_range(col, existing_rows)?;
        }
        debug!("cleared order columns on {existing_rows} row(s)");
    }

    // Code snapshot: appended rows are pushed here too, keeping indices aligned
    let mut codes = table.read_column(layout.code)?;
    let mut inserted = 0usize;
    let mut matched = 0usize;
    let mut processed = 0usize;

    for purchase in purchases {
        if purchase.code.is_empty() {
            warn!("purchase #{processed} has a blank code; matching it as an empty key");
        }
        if purchase.quantity.is_nan() {
            warn!("purchase '{}' has a non-numeric quantity", purchase.code);
        }

        let row = match codes.iter().position(|c| *c == purchase.code) {
            Some(row) => {
                matched += 1;
                debug!("purchase '{}' -> existing row {row}", purchase.code);
                row
            }
            None => {
                let width = table.column_count();
                table.append_row(new_row(width, purchase, config))?;
                codes.push(purchase.code.clone());
                let row = codes.len() - 1;
                inserted += 1;
                debug!("purchase '{}' -> new row {row}", purchase.code);
                row
            }
        };

        table.write_cell(row, layout.ordered_flag, CellValue::text(config.ordered_marker.as_str()))?;
        table.write_cell(row, layout.order_date, CellValue::text(today.as_str()))?;
        table.write_cell(row, layout.quantity_ordered, CellValue::Number(purchase.quantity))?;
        table.write_cell(row, layout.arrival_date, CellValue::text(purchase.arrival_date.as_str()))?;
        table.write_formula(row, layout.projected, &projection)?;

        processed += 1;
    }

    info!(
        "reconciled {processed} purchase(s): {inserted} inserted, {matched} matched, {existing_rows} row(s) reset"
    );

    Ok(ReconcileSummary {
        updated_count: processed,
        inserted,
        matched,
        cleared_rows: existing_rows,
        run_date,
    })
}

/// Resolve the configured stock table in a workbook and reconcile it.
pub fn reconcile_in(
    workbook: &mut Workbook,
    purchases: &[PurchaseRecord],
    config: &ReconConfig,
    clock: &dyn Clock,
) -> Result<ReconcileSummary, ReconError> {
    let table = workbook
        .table_mut(&config.table)
        .ok_or_else(|| ReconError::TableNotFound(config.table.clone()))?;
    reconcile(table, purchases, config, clock)
}

/// `=[@<on hand>]+[@<quantity ordered>]` using the table's own header names.
/// Parsed here so a header the formula language cannot express fails before
/// any cell is touched.
fn projection_formula<T: TableHandle + ?Sized>(
    table: &T,
    config: &ReconConfig,
) -> Result<String, ReconError> {
    let header = move |col: usize| {
        table
            .column_name(col)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                ReconError::ConfigValidation(format!("column {col} has no header name to reference"))
            })
    };
    let on_hand = header(config.columns.on_hand)?;
    let ordered = header(config.columns.quantity_ordered)?;
    let formula = format!("={}+{}", this_row_ref(on_hand), this_row_ref(ordered));
    parser::parse(&formula).map_err(|message| EngineError::FormulaParse {
        source: formula.clone(),
        message,
    })?;
    Ok(formula)
}

/// Fresh row for an unknown code: code, product, zero on hand, everything else empty.
fn new_row(width: usize, purchase: &PurchaseRecord, config: &ReconConfig) -> Vec<CellValue> {
    let mut fields = vec![CellValue::Empty; width];
    fields[config.columns.code] = CellValue::text(purchase.code.as_str());
    fields[config.columns.product] = CellValue::text(purchase.product.as_str());
    fields[config.columns.on_hand] = CellValue::Number(0.0);
    fields
}
