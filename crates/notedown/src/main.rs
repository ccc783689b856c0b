use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use notedown_core::{ConfigDiagnostic, Notebook, Settings, SETTINGS_FILE_NAME};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;
mod host;

use commands::Context;

#[derive(Parser)]
#[command(
    name = "notedown",
    version,
    about = "Work with a directory of notes linked by [[Title]]"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to notedown.toml in the notes directory)
    #[arg(long, global = true, env = "NOTEDOWN_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List every title in a directory and the notes carrying it
    Index(commands::index::Args),
    /// Find the notes carrying a title
    Resolve(commands::resolve::Args),
    /// Titles a note can link to
    Candidates(commands::candidates::Args),
    /// List the links in a note and where they lead
    Links(commands::links::Args),
    /// Report missing headings and broken links
    Lint(commands::lint::Args),
    /// Follow the link (or word) at a position in a note
    Open(commands::open::Args),
    /// Create a note linking back to the current one
    Create(commands::create::Args),
    /// Link completions at a position in a note
    Complete(commands::complete::Args),
    /// Insert a link to another note at a position
    InsertLink(commands::insert_link::Args),
    /// Rename a note and update links to it
    Rename(commands::rename::Args),
    /// Rename a note so its filename matches its heading
    Retitle(commands::rename::RetitleArgs),
    /// Show the settings in effect
    Config(commands::config::Args),
}

impl Command {
    /// The notes directory the command works in.
    fn directory(&self) -> PathBuf {
        let target = match self {
            Command::Index(args) => return args.directory.clone(),
            Command::Resolve(args) => return args.directory.clone(),
            Command::Config(args) => return args.directory.clone(),
            Command::Lint(args) => {
                if args.path.is_dir() {
                    return args.path.clone();
                }
                &args.path
            }
            Command::Links(args) => &args.file,
            Command::Candidates(args) => &args.file,
            Command::Open(args) => &args.file,
            Command::Create(args) => &args.from,
            Command::Complete(args) => &args.file,
            Command::InsertLink(args) => &args.file,
            Command::Rename(args) => &args.file,
            Command::Retitle(args) => &args.file,
        };
        parent_dir(target)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn settings_path(cli: &Cli, directory: &Path) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(|| directory.join(SETTINGS_FILE_NAME))
}

fn load_settings(path: &Path) -> Result<(Settings, Vec<ConfigDiagnostic>)> {
    let (settings, diagnostics) = Settings::load(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if !diagnostics.is_empty() {
        tracing::info!(
            "{} setting(s) in {} fell back to defaults",
            diagnostics.len(),
            path.display()
        );
    }
    Ok((settings, diagnostics))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let directory = cli.command.directory();
    let settings_path = settings_path(&cli, &directory);
    let (settings, config_diagnostics) = load_settings(&settings_path)?;
    let notebook = Notebook::new(settings);
    let is_config = matches!(cli.command, Command::Config(_));
    if !is_config && !notebook.is_note_folder(&directory) {
        anyhow::bail!(
            "{} does not match any note_folder_patterns; not a notes directory",
            directory.display()
        );
    }

    let ctx = Context {
        notebook,
        json: cli.json,
        settings_path,
        config_diagnostics,
    };
    let output = match &cli.command {
        Command::Index(args) => commands::index::execute(&ctx, args),
        Command::Resolve(args) => commands::resolve::execute(&ctx, args),
        Command::Candidates(args) => commands::candidates::execute(&ctx, args),
        Command::Links(args) => commands::links::execute(&ctx, args),
        Command::Lint(args) => commands::lint::execute(&ctx, args),
        Command::Open(args) => commands::open::execute(&ctx, args),
        Command::Create(args) => commands::create::execute(&ctx, args),
        Command::Complete(args) => commands::complete::execute(&ctx, args),
        Command::InsertLink(args) => commands::insert_link::execute(&ctx, args),
        Command::Rename(args) => commands::rename::execute(&ctx, args),
        Command::Retitle(args) => commands::rename::retitle(&ctx, args),
        Command::Config(args) => commands::config::execute(&ctx, args),
    }?;

    if !output.is_empty() {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
