use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::Path;

use mxene_sieve::{Element, RuleConfig};
use mxene_sieve::pipeline::{ExtractReport, ScanReport};

use crate::util::text::{join_limited, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

pub fn print_rule_summary(rule: &RuleConfig) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let symbols = |set: &BTreeSet<Element>| {
        let names: Vec<&str> = set.iter().map(|e| e.symbol()).collect();
        join_limited(&names, 8)
    };
    let targets: Vec<String> = rule
        .allowed_n
        .iter()
        .map(|&n| format!("{:.2}", f64::from(n + 1) / f64::from(n)))
        .collect();
    let required: Vec<&str> = [
        (rule.require_only_allowed, "allowed-only"),
        (rule.require_has_m_and_x, "M+X"),
        (rule.require_termination, "termination"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();

    let rows = vec![
        ("M", symbols(&rule.m_set)),
        ("X", symbols(&rule.x_set)),
        ("Terminations", symbols(&rule.termination_set)),
        ("M/X Targets", targets.join(", ")),
        (
            "Tolerance",
            format!("±{:.0}%", rule.ratio_tolerance * 100.0),
        ),
        (
            "Requires",
            if required.is_empty() {
                "nothing".to_string()
            } else {
                required.join(", ")
            },
        ),
    ];

    print_kv_table(&mut out, "Classification Rule", &rows);
}

pub fn print_scan_summary(report: &ScanReport, output: &Path) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut rows = vec![
        ("Shards Scanned", report.shards_scanned().to_string()),
        ("Shards Skipped", report.failed_shards().to_string()),
        ("Records", report.total_rows.to_string()),
        ("MXene-like", report.hit_rows.to_string()),
    ];
    if report.unreadable > 0 {
        rows.push(("Unreadable", report.unreadable.to_string()));
    }
    rows.push(("Output", output.display().to_string()));
    print_kv_table(&mut out, "Scan Summary", &rows);

    let mut by_n: BTreeMap<u32, usize> = BTreeMap::new();
    for row in report.rows.iter().filter(|r| r.result.is_match) {
        if let Some(n) = row.result.best_n {
            *by_n.entry(n).or_insert(0) += 1;
        }
    }
    if !by_n.is_empty() {
        let data: Vec<(String, usize)> = by_n
            .into_iter()
            .map(|(n, count)| (format!("M{}X{}", n + 1, n), count))
            .collect();
        print_distribution_table(&mut out, "Hits by Stoichiometry", &data, report.hit_rows);
    }
}

pub fn print_extract_summary(report: &ExtractReport, target: &Path) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut rows = vec![
        ("Shards", report.shards.len().to_string()),
        ("Attempted", report.attempted().to_string()),
        ("Extracted", report.written.to_string()),
        ("Missed", report.missed.to_string()),
    ];
    if report.limit_reached {
        rows.push(("Limit", "reached".to_string()));
    }
    rows.push(("Output", target.display().to_string()));
    print_kv_table(&mut out, "Extraction Summary", &rows);

    let data: Vec<(String, usize)> = report
        .shards
        .iter()
        .filter(|s| s.written > 0)
        .map(|s| (s.name.clone(), s.written))
        .collect();
    if !data.is_empty() {
        print_distribution_table(&mut out, "Extracted per Shard", &data, report.written);
    }
}

fn print_distribution_table(
    out: &mut impl Write,
    title: &str,
    data: &[(String, usize)],
    total: usize,
) {
    let name_w = 14usize;
    let count_w = 8usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);
    let max_bar_width = dist_w.saturating_sub(8).min(20);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{name_line}┬{count_line}┬{dist_line}┐",
        INDENT,
        name_line = "─".repeat(name_w + 2),
        count_line = "─".repeat(count_w + 2),
        dist_line = "─".repeat(dist_w + 2)
    );
    let _ = writeln!(
        out,
        "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
        INDENT, "Group", "Count", "Share",
    );
    let _ = writeln!(
        out,
        "{}├{name_line}┼{count_line}┼{dist_line}┤",
        INDENT,
        name_line = "─".repeat(name_w + 2),
        count_line = "─".repeat(count_w + 2),
        dist_line = "─".repeat(dist_w + 2)
    );

    for (name, count) in data.iter().take(12) {
        let pct = if total == 0 {
            0.0
        } else {
            (*count as f64 / total as f64) * 100.0
        };
        let dist_cell = format!("{}  {:>5.1}%", make_bar(pct, max_bar_width), pct);
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            truncate(name, name_w),
            count,
            dist_cell,
        );
    }

    if data.len() > 12 {
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            "...",
            "...",
            format!("({} more)", data.len() - 12),
        );
    }

    let _ = writeln!(
        out,
        "{}└{name_line}┴{count_line}┴{dist_line}┘",
        INDENT,
        name_line = "─".repeat(name_w + 2),
        count_line = "─".repeat(count_w + 2),
        dist_line = "─".repeat(dist_w + 2)
    );
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w),
        );
    }

    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}

fn make_bar(pct: f64, max_width: usize) -> String {
    let filled = (((pct / 100.0) * max_width as f64).round() as usize).min(max_width);
    let empty = max_width - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_clamped_to_width() {
        assert_eq!(make_bar(50.0, 4), "██░░");
        assert_eq!(make_bar(250.0, 3), "███");
        assert_eq!(make_bar(0.0, 2), "░░");
    }

    #[test]
    fn kv_table_rows_have_equal_width() {
        let mut buf = Vec::new();
        print_kv_table(
            &mut buf,
            "Scan Summary",
            &[("Records", "12".to_string()), ("Output", "out.csv".to_string())],
        );
        let text = String::from_utf8(buf).unwrap();
        let widths: Vec<usize> = text.lines().skip(1).map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
