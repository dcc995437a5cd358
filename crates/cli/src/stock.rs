//! `stockgrid reconcile | validate | show`: host side of a reconciliation pass.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use stockgrid_engine::{Table, Workbook};
use stockgrid_io::csv::{self as stock_csv, ExportMode};
use stockgrid_io::json::load_purchases;
use stockgrid_recon::{reconcile_in, Clock, FixedClock, PurchaseRecord, ReconConfig, SystemClock};

use crate::CliError;

pub struct ReconcileArgs {
    pub stock: PathBuf,
    pub purchases: PathBuf,
    pub config: Option<PathBuf>,
    pub date: Option<NaiveDate>,
    pub output: Option<PathBuf>,
    pub values: bool,
    pub delimiter: Option<char>,
    pub json: bool,
    pub dry_run: bool,
}

pub fn cmd_reconcile(args: ReconcileArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => ReconConfig::from_file(path)?,
        None => ReconConfig::default(),
    };

    let (table, delimiter) = load_stock(&args.stock, &config.table, args.delimiter)?;

    let rows = load_purchases(&args.purchases).map_err(CliError::io)?;
    let batch = PurchaseRecord::batch_from_rows(&rows);

    let mut workbook = Workbook::new();
    workbook
        .add_table(table)
        .map_err(|e| CliError::general(e.to_string()))?;

    let clock: Box<dyn Clock> = match args.date {
        Some(date) => Box::new(FixedClock(date)),
        None => Box::new(SystemClock),
    };
    let summary = reconcile_in(&mut workbook, &batch, &config, clock.as_ref())?;

    let written = if args.dry_run {
        None
    } else {
        let target = args.output.as_deref().unwrap_or(&args.stock);
        let table = workbook
            .table(&config.table)
            .ok_or_else(|| CliError::general(format!("table '{}' vanished after reconcile", config.table)))?;
        let mode = if args.values { ExportMode::Values } else { ExportMode::Formulas };
        stock_csv::export_table_with_delimiter(table, target, mode, delimiter).map_err(CliError::io)?;
        log::info!("wrote {}", target.display());
        Some(target.to_path_buf())
    };

    if args.json {
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::general(e.to_string()))?;
        println!("{text}");
    } else {
        println!(
            "reconciled {} purchase(s) on {}: {} inserted, {} matched, {} row(s) reset",
            summary.updated_count, summary.run_date, summary.inserted, summary.matched, summary.cleared_rows
        );
        match written {
            Some(path) => println!("wrote {}", path.display()),
            None => println!("dry run: no file written"),
        }
    }

    Ok(())
}

pub fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let parsed = ReconConfig::from_file(&config)?;
    println!(
        "{}: ok (table '{}', marker '{}', {} columns)",
        config.display(),
        parsed.table,
        parsed.ordered_marker,
        parsed.columns.width
    );
    Ok(())
}

pub fn cmd_show(stock: PathBuf, json: bool) -> Result<(), CliError> {
    let name = stock
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Stock".to_string());
    let (table, _) = load_stock(&stock, &name, None)?;

    if json {
        let rows = rows_as_json(&table);
        let text = serde_json::to_string_pretty(&rows).map_err(|e| CliError::general(e.to_string()))?;
        println!("{text}");
    } else {
        let text = stock_csv::export_table_to_string(&table, ExportMode::Values).map_err(CliError::io)?;
        print!("{text}");
    }
    Ok(())
}

/// Import the stock CSV. Returns the table and the delimiter to write it back with.
fn load_stock(path: &Path, name: &str, delimiter: Option<char>) -> Result<(Table, u8), CliError> {
    let content = stock_csv::read_file_as_utf8(path).map_err(CliError::io)?;
    let delimiter = match delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => return Err(CliError::usage(format!("delimiter must be a single ASCII character, got '{c}'"))),
        None => stock_csv::sniff_delimiter(&content),
    };
    let table = stock_csv::import_table_from_str(&content, name, delimiter).map_err(|e| {
        CliError::io(format!("{}: {e}", path.display()))
            .with_hint("the first row of the stock CSV must be the table header")
    })?;
    Ok((table, delimiter))
}

fn rows_as_json(table: &Table) -> Vec<serde_json::Map<String, serde_json::Value>> {
    (0..table.rows().len())
        .map(|row| {
            table
                .columns()
                .iter()
                .enumerate()
                .map(|(col, header)| (header.clone(), serde_json::Value::String(table.display(row, col))))
                .collect()
        })
        .collect()
}
