//! Error types for rule configuration.
//!
//! Classification itself is total and never fails; the only fallible step is
//! building a [`RuleConfig`](super::RuleConfig) from user input.

use thiserror::Error;

/// Errors that can occur while loading or validating a classification rule.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse a TOML rule preset.
    #[error("failed to parse rule preset: {0}")]
    RuleParse(#[from] toml::de::Error),

    /// An element symbol in a rule list is not a known element.
    #[error("unknown element '{symbol}' in the {list} list")]
    UnknownElement {
        /// Which list the symbol came from (`m`, `x`, `terminations`).
        list: &'static str,
        /// The symbol as written.
        symbol: String,
    },

    /// The rule is structurally invalid.
    ///
    /// Occurs when `allowed_n` is empty or contains zero, or when the ratio
    /// tolerance is negative or not finite.
    #[error("invalid classification rule: {0}")]
    InvalidRule(String),
}

impl Error {
    /// Creates an [`UnknownElement`](Error::UnknownElement) error.
    ///
    /// # Arguments
    ///
    /// * `list` - Name of the rule list holding the symbol
    /// * `symbol` - The unrecognized symbol
    pub fn unknown_element(list: &'static str, symbol: impl Into<String>) -> Self {
        Self::UnknownElement {
            list,
            symbol: symbol.into(),
        }
    }
}
