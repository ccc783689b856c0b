use super::{load_document, numbered, offset_in, parse_choice, Context};
use anyhow::{Context as _, Result};
use notedown_core::resolver::{choose, link_text};
use notedown_core::{Choice, Document, TextEdit};
use serde::Serialize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Note to insert the link into
    pub file: PathBuf,

    /// Byte offset to insert at
    #[arg(long, conflicts_with = "line")]
    pub offset: Option<usize>,

    /// Line to insert at (1-based)
    #[arg(long)]
    pub line: Option<usize>,

    /// Column to insert at (1-based, in characters)
    #[arg(long, requires = "line")]
    pub column: Option<usize>,

    /// Title to link to, as numbered in the listing, or `cancel`
    #[arg(long, value_parser = parse_choice)]
    pub pick: Option<Choice>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
enum Outcome {
    Candidates { titles: Vec<String> },
    Inserted { link: String, offset: usize },
    Cancelled,
}

fn place(ctx: &Context, args: &Args) -> Result<Outcome> {
    let titles = ctx.notebook.link_picker(&args.file)?;
    let Some(choice) = args.pick else {
        return Ok(Outcome::Candidates { titles });
    };
    let Some(title) = choose(&titles, choice) else {
        return Ok(Outcome::Cancelled);
    };

    let doc = load_document(&args.file)?;
    let offset = offset_in(doc.text(), args.offset, args.line, args.column)?;
    let link = link_text(title);
    let mut text = doc.text().to_string();
    notedown_core::link_parser::apply_edits(
        &mut text,
        &[TextEdit {
            offset,
            remove_len: 0,
            insert_text: link.clone(),
        }],
    );
    std::fs::write(&args.file, text)
        .with_context(|| format!("Could not write {}", args.file.display()))?;
    tracing::info!("Inserted {} into {}", link, args.file.display());
    Ok(Outcome::Inserted { link, offset })
}

/// Execute `insert-link`: list the titles to choose from, then insert the
/// picked one as a link.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let outcome = place(ctx, args)?;
    ctx.render(&outcome, |outcome| match outcome {
        Outcome::Candidates { titles } if titles.is_empty() => "No other notes to link to\n".to_string(),
        Outcome::Candidates { titles } => {
            format!("{}Pass --pick N to insert one\n", numbered(titles))
        }
        Outcome::Inserted { link, offset } => format!("Inserted {} at {}\n", link, offset),
        Outcome::Cancelled => "Cancelled\n".to_string(),
    })
}
