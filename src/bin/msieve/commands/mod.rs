mod extract;
mod filter;
mod head;

use extract::run_extract;
use filter::run_filter;
use head::run_head;

use anyhow::Result;

use crate::cli::Command;
use crate::display::Context;

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Filter(args) => run_filter(args, ctx),
        Command::Extract(args) => run_extract(args, ctx),
        Command::Head(args) => run_head(args, ctx),
    }
}
