use anyhow::{Context, Result};

use mxene_sieve::io::table::head_path;

use crate::cli::HeadArgs;
use crate::display::{Context as DisplayContext, Progress};
use crate::io::ensure_parent;
use crate::util::text::count_noun;

pub fn run_head(args: HeadArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, 1);

    progress.step("Copying rows");
    ensure_parent(&args.output)?;
    let summary = head_path(&args.input, &args.output, args.rows, !args.no_header)
        .with_context(|| {
            format!(
                "Failed to copy {} into {}",
                args.input.display(),
                args.output.display()
            )
        })?;

    let detail = format!(
        "{}{} → {}",
        if summary.header_copied { "header + " } else { "" },
        count_noun(summary.rows_written, "row"),
        args.output.display()
    );
    progress.complete_step("Copying rows", &[&detail]);
    progress.finish("Head complete");

    println!(
        "wrote {} to {}",
        count_noun(summary.rows_written, "row"),
        args.output.display()
    );

    Ok(())
}
