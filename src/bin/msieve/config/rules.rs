use std::fs;

use anyhow::{Context, Result};

use mxene_sieve::RuleConfig;
use mxene_sieve::screen::parse_element_list;

use crate::cli::RuleOptions;

/// Defaults, then the optional TOML preset, then command-line flags.
pub fn build_rule_config(opts: &RuleOptions) -> Result<RuleConfig> {
    let mut rule = match &opts.rules {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read rule preset: {}", path.display()))?;
            RuleConfig::from_toml_str(&text)
                .with_context(|| format!("Invalid rule preset: {}", path.display()))?
        }
        None => RuleConfig::default(),
    };

    if !opts.m_list.is_empty() {
        rule.m_set = parse_element_list("m", &opts.m_list)?;
    }
    if !opts.x_list.is_empty() {
        rule.x_set = parse_element_list("x", &opts.x_list)?;
    }
    if !opts.terminations.is_empty() {
        rule.termination_set = parse_element_list("terminations", &opts.terminations)?;
    }

    if opts.no_require_only_allowed {
        rule.require_only_allowed = false;
    }
    if opts.no_require_mx_pair {
        rule.require_has_m_and_x = false;
    }
    if opts.no_require_termination {
        rule.require_termination = false;
    }

    if !opts.allowed_n.is_empty() {
        rule.allowed_n = opts.allowed_n.clone();
    }
    if let Some(tol) = opts.ratio_tolerance {
        rule.ratio_tolerance = tol;
    }

    let rule = rule.normalized();
    rule.validate()?;
    Ok(rule)
}
