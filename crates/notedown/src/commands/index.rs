use super::Context;
use anyhow::Result;
use colored::Colorize;
use notedown_core::NoteEntry;
use serde::Serialize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Notes directory
    #[arg(default_value = ".")]
    pub directory: PathBuf,
}

#[derive(Serialize)]
struct TitleRow<'a> {
    key: &'a str,
    entries: &'a [NoteEntry],
}

/// Execute `index`: every lowercase title key with the notes carrying it.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let index = ctx.notebook.index(&args.directory)?;

    let mut keys: Vec<&str> = index.keys().collect();
    keys.sort_unstable();
    let rows: Vec<TitleRow> = keys
        .into_iter()
        .map(|key| TitleRow {
            key,
            entries: index.get(key).unwrap_or_default(),
        })
        .collect();

    ctx.render(&rows, |rows| {
        if rows.is_empty() {
            return format!("No notes in {}\n", args.directory.display());
        }
        let mut output = String::new();
        for row in rows {
            output.push_str(&format!("{}\n", row.key.bold()));
            for entry in row.entries {
                output.push_str(&format!("  {} ({})\n", entry.filename, entry.title.dimmed()));
            }
        }
        output.push_str(&format!(
            "\n{} notes, {} titles\n",
            index.files().len(),
            rows.len()
        ));
        output
    })
}
