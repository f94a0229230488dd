use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::scan::ScanRow;
use crate::io::error::Error;
use crate::io::table::bom_writer;

/// Header of the classification table, in column order.
pub const CSV_COLUMNS: [&str; 14] = [
    "db_file",
    "row_id",
    "formula",
    "elements",
    "m_total",
    "x_total",
    "mx_ratio",
    "best_n",
    "has_M",
    "has_X",
    "has_term",
    "disallowed_elements",
    "is_mxene_like",
    "reason",
];

fn flag(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}

impl ScanRow {
    /// Cells of this row in [`CSV_COLUMNS`] order.
    pub fn csv_fields(&self) -> [String; 14] {
        let r = &self.result;
        [
            self.shard.clone(),
            self.row_id.to_string(),
            self.formula.clone(),
            self.elements.join(","),
            r.m_total.to_string(),
            r.x_total.to_string(),
            r.ratio.map(|v| format!("{v:.4}")).unwrap_or_default(),
            r.best_n.map(|n| n.to_string()).unwrap_or_default(),
            flag(r.has_m),
            flag(r.has_x),
            flag(r.has_term),
            r.disallowed_symbols().join(","),
            flag(r.is_match),
            r.reason_text(),
        ]
    }
}

/// Writes the header and every row, BOM first.
pub fn write_classification<W: Write>(writer: W, rows: &[ScanRow]) -> Result<(), Error> {
    let mut out = bom_writer(writer)?;
    out.write_record(CSV_COLUMNS)?;
    for row in rows {
        out.write_record(row.csv_fields())?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_classification_path(path: &Path, rows: &[ScanRow]) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| Error::output(path, e))?;
    write_classification(BufWriter::new(file), rows).map_err(|e| match e {
        Error::Io { source } => Error::output(path, source),
        other => other,
    })
}
