use super::Context;
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Notes directory
    pub directory: PathBuf,
    /// Title to look up (case-insensitive)
    pub title: String,
}

/// Execute `resolve`: the filenames carrying a title.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let filenames = ctx.notebook.resolve(&args.directory, &args.title)?;
    ctx.render(&filenames, |filenames| {
        if filenames.is_empty() {
            return format!("{} No note titled {:?}\n", "✗".red(), args.title);
        }
        filenames.iter().map(|f| format!("{}\n", f)).collect()
    })
}
