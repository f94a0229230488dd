use std::path::PathBuf;

use anyhow::{Context, Result};

use mxene_sieve::Format;
use mxene_sieve::io::sink::{CombinedFile, PerRecordFiles, StructureSink};
use mxene_sieve::io::table::read_table_path;
use mxene_sieve::pipeline::extract_selection;
use mxene_sieve::select::resolve;
use mxene_sieve::store::{AseOpener, ShardCatalog};

use crate::cli::ExtractArgs;
use crate::display::{Context as DisplayContext, Progress, print_extract_summary};
use crate::util::convert::column_overrides;
use crate::util::text::count_noun;

const TOTAL_STEPS: u8 = 2;

pub fn run_extract(args: ExtractArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Resolving selection");
    let table = read_table_path(&args.csv)
        .with_context(|| format!("Failed to read selection table: {}", args.csv.display()))?;
    let pending = resolve(
        &table.headers,
        &table.rows,
        &column_overrides(&args.columns),
        args.columns.one_based,
    )?;
    let catalog = ShardCatalog::discover(&args.db_dir, &args.db_glob)?;
    let wanted = pending.bind(&catalog)?;

    let resolved = [
        format!("{} read from {}", count_noun(table.len(), "row"), args.csv.display()),
        format!(
            "{} matching '{}'",
            count_noun(catalog.len(), "shard"),
            args.db_glob
        ),
        format!(
            "{} across {}",
            count_noun(wanted.total(), "record"),
            count_noun(wanted.shard_count(), "shard")
        ),
    ];
    let resolved_ref: Vec<&str> = resolved.iter().map(String::as_str).collect();
    progress.complete_step("Resolving selection", &resolved_ref);

    let format = args.output.format.map(Format::from);
    let mut sink: Box<dyn StructureSink> = if args.output.per_structure {
        Box::new(PerRecordFiles::create(&args.output.out_dir, format)?)
    } else {
        Box::new(CombinedFile::create(&args.output.out, format)?)
    };
    let target: PathBuf = sink.target().to_path_buf();

    progress.step_counted("Extracting structures", wanted.shard_count());
    let report = extract_selection(
        &wanted,
        &catalog,
        &AseOpener,
        sink.as_mut(),
        args.output.limit,
        |shard| progress.advance(&shard.name),
    )?;

    let mut extracted = vec![
        format!("{} written", count_noun(report.written, "structure")),
        format!("{} missed", count_noun(report.missed, "record")),
    ];
    if report.limit_reached {
        extracted.push("stopped at --limit".to_string());
    }
    let extracted_ref: Vec<&str> = extracted.iter().map(String::as_str).collect();
    progress.complete_step("Extracting structures", &extracted_ref);

    if ctx.interactive {
        print_extract_summary(&report, &target);
    }
    progress.finish("Extraction complete");

    println!(
        "attempted {}, extracted {}, missed {}{}; output {}",
        report.attempted(),
        report.written,
        report.missed,
        if report.limit_reached { " (limit reached)" } else { "" },
        target.display()
    );

    Ok(())
}
