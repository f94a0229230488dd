use std::collections::BTreeSet;

use super::composition::Composition;
use super::config::RuleConfig;
use crate::model::types::Element;

pub const PASS_REASON: &str = "passed element-set and stoichiometry rules";

/// Outcome of matching the M/X ratio against `(n+1)/n` targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioFit {
    pub passed: bool,
    /// `m_total / x_total`, `None` when either total is zero.
    pub ratio: Option<f64>,
    pub best_n: Option<u32>,
    /// Relative error of the best target, `+∞` when undefined.
    pub relative_error: f64,
}

impl RatioFit {
    fn undefined() -> Self {
        Self {
            passed: false,
            ratio: None,
            best_n: None,
            relative_error: f64::INFINITY,
        }
    }
}

/// Finds the `n` whose target `(n+1)/n` is closest to `m_total / x_total`.
///
/// Candidates are visited in the order given and only a strictly smaller
/// error replaces the current best, so the first of several equally close
/// candidates wins.
pub fn fit_ratio(m_total: usize, x_total: usize, allowed_n: &[u32], tolerance: f64) -> RatioFit {
    if m_total == 0 || x_total == 0 {
        return RatioFit::undefined();
    }

    let ratio = m_total as f64 / x_total as f64;
    let mut best_n = None;
    let mut best_err = f64::INFINITY;

    for &n in allowed_n {
        if n == 0 {
            continue;
        }
        let target = f64::from(n + 1) / f64::from(n);
        let err = (ratio - target).abs() / target;
        if err < best_err {
            best_err = err;
            best_n = Some(n);
        }
    }

    RatioFit {
        passed: best_err <= tolerance,
        ratio: Some(ratio),
        best_n,
        relative_error: best_err,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub is_match: bool,
    pub has_m: bool,
    pub has_x: bool,
    pub has_term: bool,
    /// Elements outside `M ∪ X ∪ terminations`, sorted by symbol.
    pub disallowed: Vec<Element>,
    pub m_total: usize,
    pub x_total: usize,
    pub ratio: Option<f64>,
    pub best_n: Option<u32>,
    pub relative_error: f64,
    /// Every failing clause in check order, or the single pass message.
    pub reasons: Vec<String>,
}

impl ClassificationResult {
    pub fn reason_text(&self) -> String {
        self.reasons.join("; ")
    }

    pub fn disallowed_symbols(&self) -> Vec<&'static str> {
        self.disallowed.iter().map(Element::symbol).collect()
    }
}

pub fn classify(composition: &Composition, rule: &RuleConfig) -> ClassificationResult {
    let elements: BTreeSet<Element> = composition.elements().collect();

    let has_m = !elements.is_disjoint(&rule.m_set);
    let has_x = !elements.is_disjoint(&rule.x_set);
    let has_term = !elements.is_disjoint(&rule.termination_set);

    let allowed = rule.allowed_elements();
    let mut disallowed: Vec<Element> = elements.difference(&allowed).copied().collect();
    disallowed.sort_by_key(|e| e.symbol());

    let ok_allowed = !rule.require_only_allowed || disallowed.is_empty();
    let ok_pair = !rule.require_has_m_and_x || (has_m && has_x);
    let ok_term = !rule.require_termination || has_term;

    let m_total = total_in(composition, &rule.m_set);
    let x_total = total_in(composition, &rule.x_set);
    let fit = fit_ratio(m_total, x_total, &rule.allowed_n, rule.ratio_tolerance);

    let is_match = ok_allowed && ok_pair && ok_term && fit.passed;

    let mut reasons = Vec::new();
    if !ok_allowed {
        let symbols: Vec<_> = disallowed.iter().map(Element::symbol).collect();
        reasons.push(format!("contains disallowed elements: {}", symbols.join(", ")));
    }
    if !ok_pair {
        reasons.push("does not contain both an M and an X element".to_string());
    }
    if !ok_term {
        reasons.push("contains no termination element".to_string());
    }
    if !fit.passed {
        reasons.push(ratio_mismatch_reason(&fit, m_total, x_total, rule));
    }
    if reasons.is_empty() {
        reasons.push(PASS_REASON.to_string());
    }

    ClassificationResult {
        is_match,
        has_m,
        has_x,
        has_term,
        disallowed,
        m_total,
        x_total,
        ratio: fit.ratio,
        best_n: fit.best_n,
        relative_error: fit.relative_error,
        reasons,
    }
}

fn total_in(composition: &Composition, set: &BTreeSet<Element>) -> usize {
    composition
        .iter()
        .filter(|(e, _)| set.contains(e))
        .map(|(_, c)| c)
        .sum()
}

fn ratio_mismatch_reason(fit: &RatioFit, m_total: usize, x_total: usize, rule: &RuleConfig) -> String {
    let Some(ratio) = fit.ratio else {
        return format!("M/X ratio undefined (M total {m_total}, X total {x_total})");
    };

    let mut ns: Vec<u32> = rule.allowed_n.iter().copied().filter(|&n| n > 0).collect();
    ns.sort_unstable();
    ns.dedup();
    let targets: Vec<String> = ns
        .iter()
        .map(|&n| format!("{:.2}", f64::from(n + 1) / f64::from(n)))
        .collect();

    format!(
        "M/X={:.2} does not match {} (error {:.2}% > tolerance {:.0}%)",
        ratio,
        targets.join(", "),
        fit.relative_error * 100.0,
        rule.ratio_tolerance * 100.0
    )
}
