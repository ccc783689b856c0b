use super::Context;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Note the new one links back to; it is created in the same directory
    pub from: PathBuf,
    /// Title of the new note
    pub title: String,
}

#[derive(Serialize)]
struct Created {
    path: PathBuf,
}

/// Execute `create`: a new note with a "See also" link back to `from`.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let path = ctx.notebook.create_note(&args.from, &args.title)?;
    ctx.render(&Created { path }, |created| {
        format!("{} {}\n", "Created".green(), created.path.display())
    })
}
