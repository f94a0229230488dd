//! Selection-key resolution for the extraction path.
//!
//! A selection table names records either through one combined id column
//! (`db_1.db:42`, `db_1.db#42`, `db_1.db,42` or a bare index) or through a
//! shard column plus an index column. [`resolve`] turns the table into a
//! [`PendingSelection`]; [`PendingSelection::bind`] then applies the
//! single-shard shorthand against the discovered [`ShardCatalog`] and yields
//! the final [`WantedSet`].
//!
//! [`ShardCatalog`]: crate::store::ShardCatalog

mod columns;
mod error;
mod key;
mod wanted;

pub use columns::{ColumnOverrides, ColumnSpec, INDEX_CANDIDATES, SHARD_CANDIDATES, detect_columns};
pub use error::Error;
pub use key::{SEPARATORS, SelectionKey, parse_columns, parse_combined, split_combined};
pub use wanted::{PendingSelection, WantedSet, resolve};
