use super::{load_document, numbered, offset_in, parse_choice, Context};
use anyhow::{Context as _, Result};
use colored::Colorize;
use notedown_core::resolver::choose;
use notedown_core::{Choice, Document, LinkTarget};
use serde::Serialize;
use std::ops::Range;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Note containing the link
    pub file: PathBuf,

    /// Byte offset of the cursor
    #[arg(long, conflicts_with = "line")]
    pub offset: Option<usize>,

    /// Cursor line (1-based)
    #[arg(long)]
    pub line: Option<usize>,

    /// Cursor column (1-based, in characters)
    #[arg(long, requires = "line")]
    pub column: Option<usize>,

    /// Selected byte range START..END; its text is the title to follow
    #[arg(long, value_parser = parse_range)]
    pub selection: Option<Range<usize>>,

    /// Item to open when several notes share the title, or `cancel`
    #[arg(long, value_parser = parse_choice)]
    pub pick: Option<Choice>,

    /// Create the note when none carries the title
    #[arg(long)]
    pub create: bool,
}

fn parse_range(value: &str) -> std::result::Result<Range<usize>, String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {:?}", value))?;
    let start: usize = start.parse().map_err(|_| format!("bad start {:?}", start))?;
    let end: usize = end.parse().map_err(|_| format!("bad end {:?}", end))?;
    if end < start {
        return Err(format!("range {:?} ends before it starts", value));
    }
    Ok(start..end)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
enum Outcome {
    Open { path: PathBuf },
    Url { url: String },
    Choose { title: String, filenames: Vec<String> },
    Missing { title: String },
    Created { path: PathBuf },
    Cancelled,
}

fn follow(ctx: &Context, args: &Args) -> Result<Outcome> {
    let doc = load_document(&args.file)?;
    let directory = crate::parent_dir(&args.file);
    let cursor = match &args.selection {
        Some(selection) => selection.start,
        None => offset_in(doc.text(), args.offset, args.line, args.column)?,
    };

    let target = ctx
        .notebook
        .open_link(&doc, &args.file, cursor, args.selection.clone())?
        .context("No link or word at the cursor")?;

    Ok(match target {
        LinkTarget::Open { filename } => Outcome::Open {
            path: directory.join(filename),
        },
        LinkTarget::Url { url } => Outcome::Url { url },
        LinkTarget::Choose { title, filenames } => match args.pick {
            None => Outcome::Choose { title, filenames },
            Some(choice) => match choose(&filenames, choice) {
                Some(filename) => Outcome::Open {
                    path: directory.join(filename),
                },
                None => Outcome::Cancelled,
            },
        },
        LinkTarget::Missing { title } if args.create => Outcome::Created {
            path: ctx.notebook.create_note(&args.file, &title)?,
        },
        LinkTarget::Missing { title } => Outcome::Missing { title },
    })
}

/// Execute `open`: where the link at the cursor leads.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let outcome = follow(ctx, args)?;
    ctx.render(&outcome, |outcome| match outcome {
        Outcome::Open { path } => format!("{}\n", path.display()),
        Outcome::Url { url } => format!("{}\n", url),
        Outcome::Created { path } => format!("{} {}\n", "Created".green(), path.display()),
        Outcome::Cancelled => "Cancelled\n".to_string(),
        Outcome::Missing { title } => format!(
            "No note titled {:?}; pass --create to create it\n",
            title
        ),
        Outcome::Choose { title, filenames } => format!(
            "Several notes are titled {:?}:\n{}Pass --pick N to open one\n",
            title,
            numbered(filenames)
        ),
    })
}
