use crate::error::{NotedownError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use toml::{Table, Value};

pub const DEFAULT_MARKDOWN_EXTENSION: &str = "md";
pub const DEFAULT_NOTE_EXTENSIONS: &[&str] = &["md", "mdown", "markdown", "markdn"];
pub const DEFAULT_TITLE_SEPARATOR: char = '~';
pub const DEFAULT_TITLE_CACHE_CAPACITY: usize = 1 << 16;

/// Name of the settings file looked up in a notes directory.
pub const SETTINGS_FILE_NAME: &str = "notedown.toml";

/// User settings. Every field has a default; see [`Settings::from_toml_str`]
/// for how malformed values are handled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Extension used for newly created notes.
    pub markdown_extension: String,
    /// Extensions recognized as notes (case-insensitive). `markdown_extension`
    /// is always recognized in addition to these.
    pub note_extensions: Vec<String>,
    /// Character separating the primary title from aliases in a filename.
    pub title_separator: char,
    /// Globs restricting which directories are note collections. Empty means all.
    pub note_folder_patterns: Vec<String>,
    /// Propose renaming a note when its heading no longer matches its filename.
    pub reflect_title_in_filename: bool,
    /// Bound on the filename -> titles memo table. Zero disables memoization.
    pub title_cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            markdown_extension: DEFAULT_MARKDOWN_EXTENSION.to_string(),
            note_extensions: DEFAULT_NOTE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            title_separator: DEFAULT_TITLE_SEPARATOR,
            note_folder_patterns: Vec::new(),
            reflect_title_in_filename: false,
            title_cache_capacity: DEFAULT_TITLE_CACHE_CAPACITY,
        }
    }
}

/// A setting whose value had the wrong shape. The default was used instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigDiagnostic {
    pub key: String,
    pub message: String,
}

impl std::fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid setting `{}`: {}", self.key, self.message)
    }
}

impl Settings {
    /// Parse settings leniently: each key that has the wrong type falls back to
    /// its default and produces a diagnostic. A document that is not valid TOML
    /// yields all defaults and a single diagnostic. Unknown keys are ignored.
    pub fn from_toml_str(source: &str) -> (Settings, Vec<ConfigDiagnostic>) {
        let mut settings = Settings::default();
        let mut diagnostics = Vec::new();

        let table: Table = match source.parse() {
            Ok(table) => table,
            Err(e) => {
                diagnostics.push(ConfigDiagnostic {
                    key: "*".to_string(),
                    message: format!("not valid TOML ({}), using defaults", e.message()),
                });
                return (settings, diagnostics);
            }
        };

        let mut reject = |key: &str, expected: &str, value: &Value| {
            diagnostics.push(ConfigDiagnostic {
                key: key.to_string(),
                message: format!("expected {}, found {}", expected, value.type_str()),
            });
        };

        for (key, value) in &table {
            match key.as_str() {
                "markdown_extension" => match value.as_str().map(normalize_extension) {
                    Some(ext) if !ext.is_empty() => settings.markdown_extension = ext,
                    _ => reject(key, "a non-empty string", value),
                },
                "note_extensions" => match string_list(value) {
                    Some(list) => {
                        settings.note_extensions =
                            list.iter().map(|e| normalize_extension(e)).collect()
                    }
                    None => reject(key, "a list of strings", value),
                },
                "title_separator" => {
                    let mut chars = value.as_str().map(|s| s.chars()).into_iter().flatten();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) if !c.is_whitespace() && c != '.' && c != '/' => {
                            settings.title_separator = c
                        }
                        _ => reject(key, "a single non-space character", value),
                    }
                }
                "note_folder_patterns" => match string_list(value) {
                    Some(list) => settings.note_folder_patterns = list,
                    None => reject(key, "a list of glob patterns", value),
                },
                "reflect_title_in_filename" => match value.as_bool() {
                    Some(b) => settings.reflect_title_in_filename = b,
                    None => reject(key, "a boolean", value),
                },
                "title_cache_capacity" => match value.as_integer() {
                    Some(n) if n >= 0 => settings.title_cache_capacity = n as usize,
                    _ => reject(key, "a non-negative integer", value),
                },
                _ => {}
            }
        }

        for diagnostic in &diagnostics {
            tracing::warn!("{}", diagnostic);
        }
        (settings, diagnostics)
    }

    /// Load settings from `path`. A missing file means defaults; a file that
    /// exists but cannot be read is a filesystem error.
    pub fn load(path: &Path) -> Result<(Settings, Vec<ConfigDiagnostic>)> {
        match std::fs::read_to_string(path) {
            Ok(source) => Ok(Settings::from_toml_str(&source)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((Settings::default(), Vec::new()))
            }
            Err(e) => Err(NotedownError::fs("read settings", path, e)),
        }
    }

    /// All recognized note extensions, lowercased, `markdown_extension` included.
    pub fn recognized_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self
            .note_extensions
            .iter()
            .map(|e| e.to_lowercase())
            .collect();
        let primary = self.markdown_extension.to_lowercase();
        if !exts.contains(&primary) {
            exts.push(primary);
        }
        exts
    }

    /// Whether `dir` is a note collection according to `note_folder_patterns`.
    pub fn is_note_folder(&self, dir: &Path) -> bool {
        if self.note_folder_patterns.is_empty() {
            return true;
        }
        let dir = dir.to_string_lossy().replace('\\', "/");
        let dir = dir.trim_end_matches('/');
        self.note_folder_patterns
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, dir))
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
