// CSV/TSV import/export of stock tables
//
// The first record is the header row; every following record is a body row.
// Fields are read as cell entries: '=' starts a formula, a leading ' forces
// text, and anything that is not a number's own rendering stays text verbatim.

use std::io::Read;
use std::path::Path;

use stockgrid_engine::{CellValue, Table, TableHandle};

/// What to write for formula cells on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Formula source text, so the file can be re-imported with live formulas.
    #[default]
    Formulas,
    /// Evaluated values.
    Values,
}

pub fn import_table(path: &Path, name: &str) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_table_from_str(&content, name, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins. Spreadsheet exports in
/// locales with a decimal comma use ';'.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Excel on Windows writes Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => {
            // Excel's "CSV UTF-8" writes a byte order mark
            if let Some(rest) = s.strip_prefix('\u{feff}') {
                return Ok(rest.to_string());
            }
            Ok(s)
        }
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub fn import_table_from_str(content: &str, name: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Err("missing header row".to_string()),
    };
    let columns: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    let width = columns.len();
    let mut table = Table::new(name, columns);

    for (index, result) in records.enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        let line = index + 2;

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if let Some(extra) = record.iter().skip(width).find(|f| !f.trim().is_empty()) {
            return Err(format!(
                "line {line}: value '{extra}' beyond the {width} header column(s)"
            ));
        }

        let mut cells: Vec<CellValue> = record.iter().take(width).map(CellValue::from_input).collect();
        cells.resize(width, CellValue::Empty);
        table.append_row(cells).map_err(|e| format!("line {line}: {e}"))?;
    }

    log::debug!("imported table '{}': {} row(s), {width} column(s)", table.name(), table.row_count());
    Ok(table)
}

pub fn export_table(table: &Table, path: &Path, mode: ExportMode) -> Result<(), String> {
    export_table_with_delimiter(table, path, mode, b',')
}

pub fn export_table_with_delimiter(
    table: &Table,
    path: &Path,
    mode: ExportMode,
    delimiter: u8,
) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    write_table(table, &mut writer, mode)?;
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Render a table as CSV text.
pub fn export_table_to_string(table: &Table, mode: ExportMode) -> Result<String, String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    write_table(table, &mut writer, mode)?;
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

fn write_table<W: std::io::Write>(
    table: &Table,
    writer: &mut csv::Writer<W>,
    mode: ExportMode,
) -> Result<(), String> {
    writer.write_record(table.columns()).map_err(|e| e.to_string())?;

    for (row, cells) in table.rows().iter().enumerate() {
        let record: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(col, cell)| match (mode, cell) {
                (ExportMode::Values, CellValue::Formula { .. }) => table.display(row, col),
                _ => cell.raw_display(),
            })
            .collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const STOCK_CSV: &str = "\
Codigo,Producto,Stock,Pedido,Proveedor,FechaPedido,CantidadPedida,FechaLlegada,StockProyectado
A1,Widget,5,Sí,,2024-01-01,10,2024-01-15,=[@Stock]+[@CantidadPedida]
007,Tuerca,12,,,,,,
";

    #[test]
    fn imports_header_and_body() {
        let table = import_table_from_str(STOCK_CSV, "Stock", b',').unwrap();
        assert_eq!(table.columns().len(), 9);
        assert_eq!(table.columns()[6], "CantidadPedida");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.number(0, 8), 15.0);
        assert_eq!(table.display(1, 0), "007");
        assert_eq!(table.display(1, 3), "");
    }

    #[test]
    fn short_rows_are_padded_and_blank_lines_skipped() {
        let table = import_table_from_str("Codigo,Producto,Stock\nA1\n,,\nB2,Gadget,3\n", "Stock", b',').unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(table.cell(0, 2).unwrap().is_empty());
        assert_eq!(table.read_column(0).unwrap(), vec!["A1", "B2"]);
    }

    #[test]
    fn values_beyond_header_are_rejected() {
        let err = import_table_from_str("Codigo,Producto\nA1,Widget,oops\n", "Stock", b',').unwrap_err();
        assert!(err.contains("line 2"), "{err}");
        // Trailing empty fields are tolerated
        assert!(import_table_from_str("Codigo,Producto\nA1,Widget,,\n", "Stock", b',').is_ok());
    }

    #[test]
    fn missing_header_is_an_error() {
        assert_eq!(import_table_from_str("", "Stock", b',').unwrap_err(), "missing header row");
    }

    #[test]
    fn export_keeps_formulas_or_values() {
        let table = import_table_from_str(STOCK_CSV, "Stock", b',').unwrap();

        let formulas = export_table_to_string(&table, ExportMode::Formulas).unwrap();
        assert!(formulas.contains("=[@Stock]+[@CantidadPedida]"));

        let values = export_table_to_string(&table, ExportMode::Values).unwrap();
        assert!(values.lines().nth(1).unwrap().ends_with(",15"));
    }

    #[test]
    fn file_round_trip_keeps_live_formulas() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stock.csv");
        fs::write(&path, STOCK_CSV).unwrap();

        let table = import_table(&path, "Stock").unwrap();
        export_table(&table, &path, ExportMode::Formulas).unwrap();
        let again = import_table(&path, "Stock").unwrap();

        assert_eq!(again.row_count(), 2);
        assert!(matches!(again.cell(0, 8), Some(CellValue::Formula { ast: Some(_), .. })));
        assert_eq!(again.number(0, 8), 15.0);
        assert_eq!(again.display(1, 0), "007");
    }

    #[test]
    fn codes_and_formula_like_text_survive_a_round_trip() {
        let csv = "Codigo,Producto,Stock\n1.50,Arandela,1\n1E3,Tornillo,2\n A1,'=SUM trap,3\n";
        let table = import_table_from_str(csv, "Stock", b',').unwrap();
        assert_eq!(table.read_column(0).unwrap(), vec!["1.50", "1E3", " A1"]);
        assert_eq!(table.display(2, 1), "=SUM trap");

        let written = export_table_to_string(&table, ExportMode::Formulas).unwrap();
        assert!(written.contains("1.50,Arandela,1"), "{written}");
        assert!(written.contains("'=SUM trap"), "{written}");
        let again = import_table_from_str(&written, "Stock", b',').unwrap();
        assert_eq!(again.read_column(0).unwrap(), vec!["1.50", "1E3", " A1"]);
        assert_eq!(again.display(2, 1), "=SUM trap");
        assert_eq!(again.number(1, 2), 2.0);
    }

    #[test]
    fn semicolon_export_from_spanish_excel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stock.csv");
        fs::write(&path, "Codigo;Producto;Stock\nA1;Widget;5\nB2;Gadget;0\n").unwrap();

        let table = import_table(&path, "Stock").unwrap();
        assert_eq!(table.columns(), ["Codigo", "Producto", "Stock"]);
        assert_eq!(table.number(0, 2), 5.0);
    }

    #[test]
    fn windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stock.csv");
        // "Código,Stock\nA1,5\n" with 0xF3 for ó
        let bytes: Vec<u8> = b"C\xf3digo,Stock\nA1,5\n".to_vec();
        fs::write(&path, bytes).unwrap();

        let table = import_table(&path, "Stock").unwrap();
        assert_eq!(table.columns()[0], "Código");
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
        assert_eq!(sniff_delimiter("a|b\n1|2\n"), b'|');
        assert_eq!(sniff_delimiter("\"x, y\";b\n\"1, 2\";3\n"), b';');
    }
}
