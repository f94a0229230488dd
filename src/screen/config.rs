use std::collections::BTreeSet;

use serde::Deserialize;

use super::error::Error;
use crate::model::types::Element;

pub const DEFAULT_M_ELEMENTS: [Element; 10] = [
    // 3d
    Element::Sc,
    Element::Ti,
    Element::V,
    Element::Cr,
    // 4d
    Element::Zr,
    Element::Nb,
    Element::Mo,
    // 5d
    Element::Hf,
    Element::Ta,
    Element::W,
];

pub const DEFAULT_X_ELEMENTS: [Element; 2] = [Element::C, Element::N];

/// OH terminations appear as separate O and H sites.
pub const DEFAULT_TERMINATIONS: [Element; 6] = [
    Element::O,
    Element::F,
    Element::Cl,
    Element::Br,
    Element::I,
    Element::H,
];

pub const DEFAULT_ALLOWED_N: [u32; 3] = [1, 2, 3];

pub const DEFAULT_RATIO_TOLERANCE: f64 = 0.20;

/// Element-set and stoichiometry rule for `M_{n+1}X_n`-like compositions.
///
/// Built once per run and passed by reference to every classification; it is
/// never mutated after [`validate`](RuleConfig::validate) succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    pub m_set: BTreeSet<Element>,
    pub x_set: BTreeSet<Element>,
    pub termination_set: BTreeSet<Element>,
    pub require_only_allowed: bool,
    pub require_has_m_and_x: bool,
    pub require_termination: bool,
    /// Candidate `n` values; order decides ties between equally close targets.
    pub allowed_n: Vec<u32>,
    pub ratio_tolerance: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            m_set: DEFAULT_M_ELEMENTS.into_iter().collect(),
            x_set: DEFAULT_X_ELEMENTS.into_iter().collect(),
            termination_set: DEFAULT_TERMINATIONS.into_iter().collect(),
            require_only_allowed: true,
            require_has_m_and_x: true,
            require_termination: true,
            allowed_n: DEFAULT_ALLOWED_N.to_vec(),
            ratio_tolerance: DEFAULT_RATIO_TOLERANCE,
        }
    }
}

impl RuleConfig {
    /// Parses a TOML preset on top of the built-in defaults.
    ///
    /// Every key is optional; keys that are absent keep their default value.
    pub fn from_toml_str(toml: &str) -> Result<Self, Error> {
        let file: RuleFile = toml::from_str(toml)?;
        let mut rule = Self::default();

        if let Some(m) = file.m {
            rule.m_set = parse_element_list("m", &m)?;
        }
        if let Some(x) = file.x {
            rule.x_set = parse_element_list("x", &x)?;
        }
        if let Some(t) = file.terminations {
            rule.termination_set = parse_element_list("terminations", &t)?;
        }
        if let Some(v) = file.require_only_allowed {
            rule.require_only_allowed = v;
        }
        if let Some(v) = file.require_has_m_and_x {
            rule.require_has_m_and_x = v;
        }
        if let Some(v) = file.require_termination {
            rule.require_termination = v;
        }
        if let Some(n) = file.allowed_n {
            rule.allowed_n = n;
        }
        if let Some(tol) = file.ratio_tolerance {
            rule.ratio_tolerance = tol;
        }

        Ok(rule.normalized())
    }

    /// Drops repeated `n` values, keeping the first occurrence of each.
    pub fn normalized(mut self) -> Self {
        let mut seen = BTreeSet::new();
        self.allowed_n.retain(|n| seen.insert(*n));
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.allowed_n.is_empty() {
            return Err(Error::InvalidRule("allowed_n must not be empty".into()));
        }
        if self.allowed_n.contains(&0) {
            return Err(Error::InvalidRule(
                "allowed_n values must be positive integers".into(),
            ));
        }
        if !self.ratio_tolerance.is_finite() || self.ratio_tolerance < 0.0 {
            return Err(Error::InvalidRule(format!(
                "ratio tolerance must be a finite non-negative number (got {})",
                self.ratio_tolerance
            )));
        }
        Ok(())
    }

    /// Union of the M, X and termination sets.
    pub fn allowed_elements(&self) -> BTreeSet<Element> {
        self.m_set
            .iter()
            .chain(&self.x_set)
            .chain(&self.termination_set)
            .copied()
            .collect()
    }
}

/// Parses element symbols into a set, reporting the list name on failure.
pub fn parse_element_list<S: AsRef<str>>(
    list: &'static str,
    symbols: &[S],
) -> Result<BTreeSet<Element>, Error> {
    symbols
        .iter()
        .map(|s| {
            let s = s.as_ref().trim();
            s.parse::<Element>()
                .map_err(|_| Error::unknown_element(list, s))
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    m: Option<Vec<String>>,
    x: Option<Vec<String>>,
    terminations: Option<Vec<String>>,
    require_only_allowed: Option<bool>,
    require_has_m_and_x: Option<bool>,
    require_termination: Option<bool>,
    allowed_n: Option<Vec<u32>>,
    ratio_tolerance: Option<f64>,
}
