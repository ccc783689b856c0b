use super::{file_name, load_document, Context};
use anyhow::Result;
use colored::Colorize;
use notedown_core::{Diagnostic, Document};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub struct Args {
    /// Note to check, or a directory to check every note in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Fail when anything is reported
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct FileReport {
    file: String,
    diagnostics: Vec<Diagnostic>,
    /// Two-line presentation of each diagnostic.
    summaries: Vec<[String; 2]>,
    /// The heading no longer matches the filename.
    rename_suggested: bool,
}

impl FileReport {
    fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && !self.rename_suggested
    }
}

fn lint_file(ctx: &Context, path: &Path) -> Result<FileReport> {
    let doc = load_document(path)?;
    let diagnostics = ctx.notebook.lint(&doc, path)?;
    let summaries = diagnostics.iter().map(|d| d.summary(doc.text())).collect();
    let rename_suggested = ctx.notebook.heading_rename_suggested(&doc, path);
    // Nothing outlives this run, so drop the cached links right away.
    ctx.notebook.on_close(doc.id(), true);
    Ok(FileReport {
        file: file_name(path),
        diagnostics,
        summaries,
        rename_suggested,
    })
}

/// Execute `lint` on one note or every note of a directory.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let reports = if args.path.is_dir() {
        let index = ctx.notebook.index(&args.path)?;
        let mut reports = Vec::with_capacity(index.files().len());
        for filename in index.files() {
            match lint_file(ctx, &index.path_of(filename)) {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!("Skipping {}: {:#}", filename, e),
            }
        }
        reports
    } else {
        vec![lint_file(ctx, &args.path)?]
    };

    let problems = reports.iter().filter(|r| !r.is_clean()).count();
    let output = ctx.render(&reports, |reports| {
        let mut output = String::new();
        for report in reports.iter().filter(|r| !r.is_clean()) {
            output.push_str(&format!("{}\n", report.file.bold()));
            for [description, location] in &report.summaries {
                output.push_str(&format!("  {} {}\n", "warning:".yellow(), description));
                output.push_str(&format!("    {}\n", location));
            }
            if report.rename_suggested {
                output.push_str(&format!(
                    "  {} filename does not match the heading; `notedown retitle` renames it\n",
                    "note:".cyan()
                ));
            }
        }
        if problems == 0 {
            output.push_str(&format!("{} {} note(s) checked\n", "✓".green(), reports.len()));
        }
        output
    })?;

    if args.strict && problems > 0 {
        anyhow::bail!("{}{} note(s) with problems", output, problems);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use std::fs;

    #[test]
    fn reports_missing_note_with_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Here.md");
        fs::write(&file, "# Here\n\nSee [[Nope]]\n").unwrap();

        let output = execute(
            &test_context(false),
            &Args {
                path: file,
                strict: false,
            },
        )
        .unwrap();
        assert!(output.contains("Note file not found"));
        assert!(output.contains("Line 3: [[Nope]]"));
    }

    #[test]
    fn directory_lint_checks_every_note() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.md"), "# A\n[[B]]\n").unwrap();
        fs::write(dir.path().join("B.md"), "no heading\n").unwrap();

        let output = execute(
            &test_context(true),
            &Args {
                path: dir.path().to_path_buf(),
                strict: false,
            },
        )
        .unwrap();
        let mut reports: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        reports.sort_by_key(|r| r["file"].as_str().unwrap().to_string());
        assert_eq!(reports[0]["diagnostics"].as_array().unwrap().len(), 0);
        assert_eq!(reports[1]["diagnostics"][0]["kind"], "invalid_title");
    }

    #[test]
    fn strict_mode_fails_on_problems() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Here.md");
        fs::write(&file, "no heading\n").unwrap();
        let args = Args {
            path: file,
            strict: true,
        };
        assert!(execute(&test_context(false), &args).is_err());
    }

    #[test]
    fn clean_note_passes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Here.md");
        fs::write(&file, "# Here\n").unwrap();
        let args = Args {
            path: file,
            strict: true,
        };
        assert!(execute(&test_context(false), &args).unwrap().contains("1 note(s) checked"));
    }
}
