//! Composition and stoichiometry screening for sharded atomic-structure stores.
//!
//! `mxene-sieve` scans many ASE database shards, decides for every record
//! whether its element set and M/X ratio fit the `M_{n+1}X_n` family, and
//! ranks the results into a CSV table. A second path takes a table of
//! selected records, resolves the identifiers against the discovered shards
//! and writes the structures out as XYZ or extended XYZ.
//!
//! # Features
//!
//! - **Classification** - Element-set membership, M/X pairing, termination
//!   presence and ratio matching against `(n+1)/n` with a relative tolerance
//! - **Shard discovery** - Glob-based catalog keyed by base file name
//! - **Identifier resolution** - Combined ids (`db_1.db:42`, `#`, `,`),
//!   separate shard/index columns, one-based offsets and the single-shard
//!   shorthand
//! - **Extraction** - Direct indexed fetches written per record or appended
//!   to one combined file, with an optional global limit
//!
//! # Quick Start
//!
//! ```
//! use mxene_sieve::{Composition, Element, RuleConfig, classify};
//!
//! // Ti2C with two oxygen terminations
//! let composition = Composition::from_elements([
//!     Element::Ti,
//!     Element::Ti,
//!     Element::C,
//!     Element::O,
//!     Element::O,
//! ]);
//!
//! let result = classify(&composition, &RuleConfig::default());
//!
//! assert!(result.is_match);
//! assert_eq!(result.best_n, Some(1));
//! assert_eq!(result.relative_error, 0.0);
//! assert_eq!(composition.empirical_formula(), "CO2Ti2");
//! ```
//!
//! Rules can also come from a TOML preset; keys that are left out keep
//! their defaults:
//!
//! ```
//! use mxene_sieve::{Composition, Element, RuleConfig, classify};
//!
//! let rule = RuleConfig::from_toml_str(
//!     r#"
//!     m = ["Ti"]
//!     x = ["C"]
//!     terminations = ["O"]
//!     allowed_n = [1]
//!     "#,
//! )?;
//!
//! let composition = Composition::from_elements([Element::Ti, Element::C, Element::O, Element::O]);
//! let result = classify(&composition, &rule);
//!
//! assert!(!result.is_match);
//! assert_eq!(result.reasons.len(), 1);
//! # Ok::<(), mxene_sieve::ScreenError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`screen`]: Composition extraction and the stoichiometry classifier
//! - [`store`]: Record-store seam, ASE LMDB and SQLite backends, shard catalog
//! - [`select`]: Selection-table column detection and key resolution
//! - [`pipeline`]: Classification scans and selection extraction
//! - [`io`]: XYZ / extended XYZ encoders, output sinks and CSV tables
//!
//! # Data Types
//!
//! - [`Element`]: Chemical element (H through Og)
//! - [`Structure`] / [`Site`]: Atomic sites, cell and periodic flags
//! - [`ChemicalRecord`]: A structure plus the keys that locate it in a shard
//! - [`RuleConfig`]: Element roles, requirement flags, `n` values, tolerance
//! - [`ClassificationResult`]: Verdict with totals, ratio and reasons

mod model;

pub mod io;
pub mod pipeline;
pub mod screen;
pub mod select;
pub mod store;

pub use model::record::ChemicalRecord;
pub use model::structure::{Site, Structure};
pub use model::types::{Element, ParseElementError};

pub use screen::{ClassificationResult, Composition, RuleConfig, classify};

pub use io::Format;
pub use io::error::Error as IoError;
pub use pipeline::Error as PipelineError;
pub use screen::Error as ScreenError;
pub use select::Error as SelectError;
pub use store::Error as StoreError;
