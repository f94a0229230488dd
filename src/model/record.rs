use super::structure::Structure;

/// One structure read from a shard, with the keys needed to find it again.
///
/// `row_id` is the store's own record key (ASE ids start at 1 and may have
/// gaps); `index` is the zero-based position used for direct fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalRecord {
    pub shard: String,
    pub row_id: i64,
    pub index: usize,
    pub structure: Structure,
}

impl ChemicalRecord {
    pub fn new(shard: impl Into<String>, row_id: i64, index: usize, structure: Structure) -> Self {
        Self {
            shard: shard.into(),
            row_id,
            index,
            structure,
        }
    }
}
