use mxene_sieve::Format;
use mxene_sieve::select::ColumnOverrides;

use crate::cli::{ColumnOptions, StructureFormat};

impl From<StructureFormat> for Format {
    fn from(value: StructureFormat) -> Self {
        match value {
            StructureFormat::Xyz => Format::Xyz,
            StructureFormat::Extxyz => Format::ExtXyz,
        }
    }
}

pub fn column_overrides(opts: &ColumnOptions) -> ColumnOverrides {
    ColumnOverrides {
        id: opts.id_col.clone(),
        shard: opts.db_col.clone(),
        index: opts.idx_col.clone(),
    }
}
