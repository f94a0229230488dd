use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::Error;
use crate::io::Provenance;
use crate::io::sink::StructureSink;
use crate::select::WantedSet;
use crate::store::{RecordStore, ShardCatalog, StoreOpener};

/// Per-shard counters from an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardExtraction {
    pub name: String,
    /// Where the shard was found, if it was.
    pub path: Option<PathBuf>,
    pub requested: usize,
    pub written: usize,
    pub missed: usize,
    pub failure: Option<String>,
}

impl ShardExtraction {
    fn new(name: &str, requested: usize) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            requested,
            written: 0,
            missed: 0,
            failure: None,
        }
    }

    fn fail(&mut self, reason: String) {
        self.missed = self.requested;
        self.failure = Some(reason);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub shards: Vec<ShardExtraction>,
    pub written: usize,
    pub missed: usize,
    /// True when the run stopped because the limit was reached.
    pub limit_reached: bool,
}

impl ExtractReport {
    /// Records for which a fetch was attempted or a miss was recorded.
    pub fn attempted(&self) -> usize {
        self.written + self.missed
    }
}

/// Fetches every wanted record and hands it to `sink`.
///
/// A shard that cannot be located or opened turns all of its indices into
/// misses. A fetch failing for one record is a single miss; a failure of
/// the shard itself turns its remaining indices into misses. None of these
/// stop the run. Only a
/// failing sink is fatal. With a `limit`, the run ends once that many
/// records were written and the remaining work is neither attempted nor
/// counted.
pub fn extract_selection<O, S>(
    wanted: &WantedSet,
    catalog: &ShardCatalog,
    opener: &O,
    sink: &mut S,
    limit: Option<usize>,
    mut on_shard: impl FnMut(&ShardExtraction),
) -> Result<ExtractReport, Error>
where
    O: StoreOpener,
    S: StructureSink + ?Sized,
{
    let mut report = ExtractReport::default();
    let reached = |written: usize| limit.is_some_and(|max| written >= max);

    for (name, indices) in wanted.iter() {
        if reached(report.written) {
            report.limit_reached = true;
            break;
        }

        let mut tally = ShardExtraction::new(name, indices.len());

        let Some(path) = catalog.locate(name) else {
            warn!(shard = name, requested = indices.len(), "shard not found; skipping its records");
            tally.fail("shard not found".to_string());
            report.missed += tally.missed;
            on_shard(&tally);
            report.shards.push(tally);
            continue;
        };
        tally.path = Some(path.clone());

        let store = match opener.open(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!(shard = name, error = %e, "cannot open shard; skipping its records");
                tally.fail(e.to_string());
                report.missed += tally.missed;
                on_shard(&tally);
                report.shards.push(tally);
                continue;
            }
        };
        info!(shard = name, path = %path.display(), requested = indices.len(), "extracting");

        for &index in indices {
            if reached(report.written) {
                report.limit_reached = true;
                break;
            }
            match store.fetch(index) {
                Ok(structure) => {
                    let written = sink.write(&Provenance::new(name, index), &structure)?;
                    debug!(shard = name, index, path = %written.display(), "extracted");
                    tally.written += 1;
                    report.written += 1;
                }
                Err(e) if e.is_record_level() => {
                    warn!(shard = name, index, error = %e, "record miss");
                    tally.missed += 1;
                    report.missed += 1;
                }
                Err(e) => {
                    warn!(shard = name, index, error = %e, "shard read failed; skipping its remaining records");
                    let remaining = tally.requested - tally.written - tally.missed;
                    tally.missed += remaining;
                    report.missed += remaining;
                    tally.failure = Some(e.to_string());
                    break;
                }
            }
        }

        drop(store);
        on_shard(&tally);
        report.shards.push(tally);

        if report.limit_reached {
            break;
        }
    }

    Ok(report)
}
