//! The two end-to-end runs: classify every record of every shard, or
//! extract a resolved selection.
//!
//! Both walk shards one at a time in ascending name order and keep at most
//! one shard open. Per-record failures never abort a run; they are tallied
//! in the returned report.

mod error;
mod extract;
mod report;
mod scan;

pub use error::Error;
pub use extract::{ExtractReport, ShardExtraction, extract_selection};
pub use report::{CSV_COLUMNS, write_classification, write_classification_path};
pub use scan::{ScanReport, ScanRow, ShardScan, scan_catalog};
