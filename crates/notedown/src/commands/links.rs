use super::{load_document, Context};
use anyhow::Result;
use colored::Colorize;
use notedown_core::Document;
use serde::Serialize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Note to read
    pub file: PathBuf,
}

#[derive(Serialize)]
struct LinkRow {
    title: String,
    line: usize,
    start: usize,
    end: usize,
    targets: Vec<String>,
}

/// Execute `links`: every link in the note with the files it resolves to.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let doc = load_document(&args.file)?;
    let text = doc.text();
    let directory = crate::parent_dir(&args.file);
    let index = ctx.notebook.index(&directory)?;

    let rows: Vec<LinkRow> = ctx
        .notebook
        .links(&doc)
        .iter()
        .map(|span| {
            let title = span.title(text);
            LinkRow {
                title: title.to_string(),
                line: text[..span.start].matches('\n').count() + 1,
                start: span.start,
                end: span.end,
                targets: notedown_core::resolver::resolve(&index, title),
            }
        })
        .collect();

    ctx.render(&rows, |rows| {
        if rows.is_empty() {
            return "No links\n".to_string();
        }
        let mut output = String::new();
        for row in rows {
            let targets = if row.targets.is_empty() {
                "(missing)".red().to_string()
            } else {
                row.targets.join(", ")
            };
            output.push_str(&format!("{:>4}: [[{}]] -> {}\n", row.line, row.title, targets));
        }
        output
    })
}
