//! Core data structures for atomic-structure records.
//!
//! - [`types`] – Periodic table elements and symbol parsing.
//! - [`structure`] – Atomic sites with positions, cell vectors, and periodicity.
//! - [`record`] – A structure together with the shard and row it was read from.
//!
//! A [`Structure`] is what the record store decodes and what the structural
//! encoders write; a [`ChemicalRecord`] adds the provenance needed to name,
//! rank, and re-fetch it.
//!
//! [`Structure`]: structure::Structure
//! [`ChemicalRecord`]: record::ChemicalRecord

pub mod record;
pub mod structure;
pub mod types;
