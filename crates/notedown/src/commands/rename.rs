use super::{file_name, load_document, Context};
use crate::host::FileHost;
use anyhow::{Context as _, Result};
use colored::Colorize;
use notedown_core::backlinks::preview_rewrite;
use notedown_core::{BacklinkRewrite, RenamePlan, RenameReport};
use serde::Serialize;
use similar::TextDiff;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Note to rename
    pub file: PathBuf,
    /// New filename, in the same directory (e.g. "New title~Alias.md")
    pub new_name: String,

    /// Show what would change without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(clap::Args)]
pub struct RetitleArgs {
    /// Note whose filename should follow its heading
    pub file: PathBuf,

    /// Show what would change without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Serialize)]
struct FileDiff {
    filename: String,
    substitutions: usize,
    diff: String,
}

#[derive(Serialize)]
struct RenameOutcome {
    plan: RenamePlan,
    changes: Vec<FileDiff>,
    /// `None` for dry runs and declined confirmations.
    applied: Option<RenameReport>,
}

/// Links in other notes the rename would rewrite, as unified diffs.
fn preview(ctx: &Context, plan: &RenamePlan) -> Result<Vec<FileDiff>> {
    let parser = ctx.notebook.parser();
    let Some(rewrite) = BacklinkRewrite::plan(parser, &plan.old_filename, &plan.new_filename)? else {
        return Ok(Vec::new());
    };
    let (changed, skipped) = preview_rewrite(ctx.notebook.indexer(), &plan.directory, &rewrite)?;
    for filename in skipped {
        tracing::warn!("{} is not UTF-8, its links will not be updated", filename);
    }
    Ok(changed
        .into_iter()
        .map(|file| {
            let diff = TextDiff::from_lines(&file.original, &file.updated)
                .unified_diff()
                .context_radius(1)
                .header(&file.filename, &file.filename)
                .to_string();
            FileDiff {
                filename: file.filename,
                substitutions: file.substitutions,
                diff,
            }
        })
        .collect())
}

fn confirm(prompt: &str, input: &mut impl BufRead) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer).context("Could not read the answer")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn run(
    ctx: &Context,
    plan: RenamePlan,
    dry_run: bool,
    yes: bool,
    input: &mut impl BufRead,
) -> Result<RenameOutcome> {
    plan.check_target()?;
    let changes = preview(ctx, &plan)?;

    let proceed = !dry_run
        && (yes
            || confirm(
                &format!("Rename {} to {}?", plan.old_filename, plan.new_filename),
                input,
            )?);
    let applied = if proceed {
        let mut host = FileHost::new(&plan.old_path());
        let report = ctx.notebook.apply_rename(&plan, &mut host)?;
        if let Some(current) = host.current() {
            tracing::debug!("Now at {}", current.display());
        }
        Some(report)
    } else {
        None
    };

    Ok(RenameOutcome {
        plan,
        changes,
        applied,
    })
}

fn render(ctx: &Context, outcome: &RenameOutcome) -> Result<String> {
    ctx.render(outcome, |outcome| {
        let mut output = format!(
            "{} -> {}\n",
            outcome.plan.old_filename.bold(),
            outcome.plan.new_filename.bold()
        );
        for change in &outcome.changes {
            output.push_str(&change.diff);
        }
        match &outcome.applied {
            Some(report) => output.push_str(&format!(
                "{} Renamed; updated {} link(s) in {} note(s)\n",
                "✓".green(),
                report.backlinks.substitutions(),
                report.backlinks.files_modified()
            )),
            None => output.push_str(&format!(
                "Not renamed; {} note(s) would be updated\n",
                outcome.changes.len()
            )),
        }
        output
    })
}

/// Execute `rename`: move a note to a new filename and update links to the
/// titles it no longer carries.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    anyhow::ensure!(
        !args.new_name.contains('/') && !args.new_name.contains('\\'),
        "The new name must be a filename in the same directory"
    );
    anyhow::ensure!(args.file.is_file(), "{} is not a file", args.file.display());
    let plan = RenamePlan::new(
        crate::parent_dir(&args.file),
        file_name(&args.file),
        args.new_name.clone(),
    );
    let outcome = run(ctx, plan, args.dry_run, args.yes, &mut std::io::stdin().lock())?;
    render(ctx, &outcome)
}

/// Execute `retitle`: rename the note so its primary title is its heading.
pub fn retitle(ctx: &Context, args: &RetitleArgs) -> Result<String> {
    let doc = load_document(&args.file)?;
    let Some(plan) = ctx.notebook.plan_heading_rename(&doc, &args.file)? else {
        return ctx.render(&Option::<RenameOutcome>::None, |_| {
            "Filename already matches the heading\n".to_string()
        });
    };
    let outcome = run(ctx, plan, args.dry_run, args.yes, &mut std::io::stdin().lock())?;
    render(ctx, &outcome)
}
