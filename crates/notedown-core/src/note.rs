use crate::error::{NotedownError, Result};
use crate::title_parser::{TitleParser, TitleSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// The document's title: its first line must be `# <title>` (exactly one `#`
/// followed by whitespace). Returns the trimmed title, or `None` if the first
/// line is not such a heading or the title is empty.
pub fn heading_title(text: &str) -> Option<&str> {
    let first = text.lines().next()?;
    let rest = first.strip_prefix('#')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim();
    (!title.is_empty()).then_some(title)
}

/// Contents of a freshly created note that links back to `back_title`.
pub fn note_template(title: &str, back_title: &str) -> String {
    format!("# {}\n\nSee also:\n\n- [[{}]]\n", title, back_title)
}

/// Check that `title` can be encoded in a filename on its own.
pub fn validate_title(title: &str, separator: char) -> Result<()> {
    let reason = if title.trim().is_empty() {
        Some("title is empty")
    } else if title.trim() != title {
        Some("title has surrounding whitespace")
    } else if title.contains(separator) {
        Some("title contains the alias separator")
    } else if title.contains('/') || title.contains('\\') {
        Some("title contains a path separator")
    } else if title.starts_with('.') {
        Some("title starts with a dot")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(NotedownError::InvalidTitle {
            title: title.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Title used when linking back to the note stored as `filename`: its primary
/// title, or the file stem when the filename is not a note.
pub fn back_title(parser: &TitleParser, filename: &str) -> String {
    match parser.parse(filename).primary() {
        Some(primary) => primary.to_string(),
        None => Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string()),
    }
}

/// Filename a new note titled `title` gets.
pub fn new_note_filename(title: &str, separator: char, extension: &str) -> String {
    TitleSet::new(vec![title.to_string()]).to_filename(separator, extension)
}

/// Create `<directory>/<title>.<extension>` with the standard template.
///
/// Never overwrites: an existing file is reported as [`NotedownError::TargetExists`].
pub fn create_note(
    directory: &Path,
    title: &str,
    back_title: &str,
    separator: char,
    extension: &str,
) -> Result<PathBuf> {
    validate_title(title, separator)?;
    let path = directory.join(new_note_filename(title, separator, extension));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => NotedownError::TargetExists { path: path.clone() },
            _ => NotedownError::fs("create", &path, e),
        })?;
    file.write_all(note_template(title, back_title).as_bytes())
        .map_err(|e| NotedownError::fs("write", &path, e))?;

    tracing::info!("Created note {}", path.display());
    Ok(path)
}
