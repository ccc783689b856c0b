pub mod candidates;
pub mod complete;
pub mod config;
pub mod create;
pub mod index;
pub mod insert_link;
pub mod links;
pub mod lint;
pub mod open;
pub mod rename;
pub mod resolve;

use anyhow::{Context as _, Result};
use notedown_core::{Choice, ConfigDiagnostic, DocumentId, Notebook, TextDocument};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// State shared by every command for one invocation.
pub struct Context {
    pub notebook: Notebook,
    pub json: bool,
    /// Where the settings were looked up.
    pub settings_path: PathBuf,
    pub config_diagnostics: Vec<ConfigDiagnostic>,
}

impl Context {
    /// Render `value` as pretty JSON when `--json` was given, otherwise run
    /// the text formatter.
    pub fn render<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<String> {
        if self.json {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(text(value))
        }
    }
}

/// Stable id for the document stored at `path` within this process.
pub fn document_id(path: &Path) -> DocumentId {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}

/// Read the note at `path` as a document.
pub fn load_document(path: &Path) -> Result<TextDocument> {
    let bytes = std::fs::read(path).with_context(|| format!("Could not read {}", path.display()))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| notedown_core::NotedownError::Encoding { path: path.to_path_buf() })?;
    Ok(TextDocument::new(document_id(path), text))
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse a `--pick` value: a 1-based item number, or `cancel`.
pub fn parse_choice(value: &str) -> std::result::Result<Choice, String> {
    if value.eq_ignore_ascii_case("cancel") {
        return Ok(Choice::Cancelled);
    }
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Choice::Picked(n - 1)),
        _ => Err(format!("expected an item number or `cancel`, got {:?}", value)),
    }
}

/// Numbered list shown when the user has to pick one item.
pub fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{:>3}. {}\n", i + 1, item))
        .collect()
}

/// Byte offset given as either `--offset` or `--line`/`--column` (both 1-based).
pub fn offset_in(text: &str, offset: Option<usize>, line: Option<usize>, column: Option<usize>) -> Result<usize> {
    if let Some(offset) = offset {
        anyhow::ensure!(offset <= text.len(), "offset {} is past the end of the note", offset);
        anyhow::ensure!(text.is_char_boundary(offset), "offset {} is inside a character", offset);
        return Ok(offset);
    }
    let line = line.context("either --offset or --line is required")?;
    let column = column.unwrap_or(1);
    anyhow::ensure!(line >= 1 && column >= 1, "lines and columns start at 1");

    let line_start = if line == 1 {
        0
    } else {
        text.match_indices('\n')
            .nth(line - 2)
            .map(|(i, _)| i + 1)
            .with_context(|| format!("the note has fewer than {} lines", line))?
    };
    let line_text = text[line_start..].split('\n').next().unwrap_or_default();
    let within = line_text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line_text.len()))
        .nth(column - 1)
        .with_context(|| format!("line {} has fewer than {} columns", line, column))?;
    Ok(line_start + within)
}

#[cfg(test)]
pub fn test_context(json: bool) -> Context {
    Context {
        notebook: Notebook::new(notedown_core::Settings::default()),
        json,
        settings_path: PathBuf::from(notedown_core::SETTINGS_FILE_NAME),
        config_diagnostics: Vec::new(),
    }
}
