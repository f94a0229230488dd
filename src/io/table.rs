//! CSV tables: selection input, BOM-prefixed output and head copies.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};

use super::error::Error;

/// UTF-8 byte-order mark written at the start of every output table.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// A header row plus data rows, held as strings.
///
/// Rows keep their own length; callers treat missing trailing cells as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn read_table<R: Read>(reader: R) -> Result<Table, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = reader.records();

    let headers = match records.next() {
        Some(record) => strip_bom(&record?),
        None => return Err(Error::MissingHeader),
    };

    let rows = records
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()?;

    Ok(Table { headers, rows })
}

pub fn read_table_path(path: &Path) -> Result<Table, Error> {
    let file = File::open(path)?;
    read_table(BufReader::new(file))
}

/// Wraps `writer` in a CSV writer after emitting the byte-order mark.
pub fn bom_writer<W: Write>(mut writer: W) -> Result<csv::Writer<W>, Error> {
    writer.write_all(BOM)?;
    Ok(WriterBuilder::new().flexible(true).from_writer(writer))
}

/// Counts reported by [`head`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadSummary {
    pub header_copied: bool,
    pub rows_written: usize,
}

/// Copies the header (when `has_header`) and the first `rows` data rows.
///
/// Cells are copied byte for byte; a leading BOM on the input is dropped
/// and one is written to the output.
pub fn head<R: Read, W: Write>(
    reader: R,
    writer: W,
    rows: usize,
    has_header: bool,
) -> Result<HeadSummary, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut out = bom_writer(writer)?;
    let mut summary = HeadSummary::default();
    let mut record = ByteRecord::new();
    let mut first = true;

    while reader.read_byte_record(&mut record)? {
        if first {
            first = false;
            if let Some(cell) = record.get(0).filter(|c| c.starts_with(BOM)) {
                let mut cleaned = ByteRecord::new();
                cleaned.push_field(&cell[BOM.len()..]);
                record.iter().skip(1).for_each(|c| cleaned.push_field(c));
                record = cleaned;
            }
            if has_header {
                out.write_byte_record(&record)?;
                summary.header_copied = true;
                continue;
            }
        }

        if summary.rows_written >= rows {
            break;
        }
        out.write_byte_record(&record)?;
        summary.rows_written += 1;
    }

    out.flush()?;
    Ok(summary)
}

pub fn head_path(
    input: &Path,
    output: &Path,
    rows: usize,
    has_header: bool,
) -> Result<HeadSummary, Error> {
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output).map_err(|e| Error::output(output, e))?);
    head(reader, writer, rows, has_header)
}

fn strip_bom(record: &StringRecord) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let cell = if i == 0 {
                cell.trim_start_matches('\u{feff}')
            } else {
                cell
            };
            cell.trim().to_string()
        })
        .collect()
}
