use super::Context;
use anyhow::Result;
use colored::Colorize;
use notedown_core::{ConfigDiagnostic, Settings};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub struct Args {
    /// Notes directory whose settings to show
    #[arg(default_value = ".")]
    pub directory: PathBuf,
}

#[derive(Serialize)]
struct Report<'a> {
    path: &'a Path,
    settings: &'a Settings,
    diagnostics: &'a [ConfigDiagnostic],
    note_folder: bool,
}

/// Execute `config`: the settings in effect, as TOML, with any values that
/// fell back to their defaults.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let report = Report {
        path: &ctx.settings_path,
        settings: ctx.notebook.settings(),
        diagnostics: &ctx.config_diagnostics,
        note_folder: ctx.notebook.is_note_folder(&args.directory),
    };
    if ctx.json {
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut output = format!("# {}\n", report.path.display());
    output.push_str(&toml::to_string(report.settings)?);
    for diagnostic in report.diagnostics {
        output.push_str(&format!("{} {}\n", "warning:".yellow(), diagnostic));
    }
    if !report.note_folder {
        output.push_str(&format!(
            "{} {} does not match note_folder_patterns\n",
            "note:".cyan(),
            args.directory.display()
        ));
    }
    Ok(output)
}
