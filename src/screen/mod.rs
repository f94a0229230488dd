//! Composition extraction and MXene-like stoichiometry classification.
//!
//! A record is reduced to a [`Composition`] and checked against a
//! [`RuleConfig`]: every element must belong to the M, X, or termination
//! sets, at least one M and one X must be present, at least one termination
//! must be present, and the M/X site ratio must be within a relative
//! tolerance of `(n+1)/n` for some allowed `n`. Each requirement except the
//! ratio can be switched off.

mod classify;
mod composition;
mod config;
mod error;

pub use classify::{ClassificationResult, PASS_REASON, RatioFit, classify, fit_ratio};
pub use composition::Composition;
pub use config::{
    DEFAULT_ALLOWED_N, DEFAULT_M_ELEMENTS, DEFAULT_RATIO_TOLERANCE, DEFAULT_TERMINATIONS,
    DEFAULT_X_ELEMENTS, RuleConfig, parse_element_list,
};
pub use error::Error;

use crate::model::structure::Structure;

/// Composition, formula, and verdict for one structure.
pub fn screen_structure(structure: &Structure, rule: &RuleConfig) -> (Composition, ClassificationResult) {
    let composition = Composition::from_structure(structure);
    let result = classify(&composition, rule);
    (composition, result)
}
