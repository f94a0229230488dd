use anyhow::{Context, Result};

use mxene_sieve::pipeline::{scan_catalog, write_classification_path};
use mxene_sieve::store::{AseOpener, ShardCatalog};

use crate::cli::FilterArgs;
use crate::config::build_rule_config;
use crate::display::{Context as DisplayContext, Progress, print_rule_summary, print_scan_summary};
use crate::io::ensure_parent;
use crate::util::text::count_noun;

const TOTAL_STEPS: u8 = 3;

pub fn run_filter(args: FilterArgs, ctx: DisplayContext) -> Result<()> {
    let rule = build_rule_config(&args.rules)?;

    if ctx.interactive {
        print_rule_summary(&rule);
    }

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Discovering shards");
    let catalog = ShardCatalog::discover(&args.shards.root, &args.shards.pattern)?;
    let mut discovered = vec![format!(
        "{} matching '{}' under {}",
        count_noun(catalog.len(), "shard"),
        args.shards.pattern,
        args.shards.root.display()
    )];
    if !catalog.shadowed().is_empty() {
        discovered.push(format!(
            "{} shadowed by later duplicates",
            count_noun(catalog.shadowed().len(), "path")
        ));
    }
    let discovered_ref: Vec<&str> = discovered.iter().map(String::as_str).collect();
    progress.complete_step("Discovering shards", &discovered_ref);

    progress.step_counted("Classifying records", catalog.len());
    let report = scan_catalog(&catalog, &AseOpener, &rule, |shard| {
        progress.advance(&shard.name)
    })?;

    let mut scanned = vec![
        format!(
            "{} in {}",
            count_noun(report.total_rows, "record"),
            count_noun(report.shards_scanned(), "shard")
        ),
        format!("{} MXene-like", count_noun(report.hit_rows, "hit")),
    ];
    if report.failed_shards() > 0 {
        scanned.push(format!(
            "{} skipped",
            count_noun(report.failed_shards(), "shard")
        ));
    }
    if report.unreadable > 0 {
        scanned.push(format!(
            "{} unreadable",
            count_noun(report.unreadable, "record")
        ));
    }
    let scanned_ref: Vec<&str> = scanned.iter().map(String::as_str).collect();
    progress.complete_step("Classifying records", &scanned_ref);

    progress.step("Writing CSV");
    ensure_parent(&args.output)?;
    write_classification_path(&args.output, &report.rows).with_context(|| {
        format!("Failed to write classification table: {}", args.output.display())
    })?;
    let written = format!(
        "{} → {}",
        count_noun(report.rows.len(), "row"),
        args.output.display()
    );
    progress.complete_step("Writing CSV", &[&written]);

    if ctx.interactive {
        print_scan_summary(&report, &args.output);
    }
    progress.finish("Filter complete");

    println!(
        "scanned {} ({} skipped): {}, {} MXene-like; wrote {}",
        count_noun(report.shards_scanned(), "shard"),
        report.failed_shards(),
        count_noun(report.total_rows, "record"),
        report.hit_rows,
        args.output.display()
    );

    Ok(())
}
