use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort a core operation.
///
/// Broken links and missing headings are not errors: they are reported as
/// [`crate::lint::Diagnostic`]s. Configuration problems are reported as
/// [`crate::config::ConfigDiagnostic`]s and never abort anything.
#[derive(Debug, Error)]
pub enum NotedownError {
    #[error("Could not {action} {path}: {source}")]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    Encoding { path: PathBuf },

    #[error("Invalid title {title:?}: {reason}")]
    InvalidTitle { title: String, reason: &'static str },

    #[error("{path} already exists")]
    TargetExists { path: PathBuf },

    #[error("Could not build the link pattern for {titles:?}: {source}")]
    LinkPattern {
        titles: Vec<String>,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, NotedownError>;

impl NotedownError {
    pub(crate) fn fs(action: &'static str, path: &Path, source: io::Error) -> Self {
        NotedownError::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// The path this error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            NotedownError::Filesystem { path, .. }
            | NotedownError::Encoding { path }
            | NotedownError::TargetExists { path } => Some(path),
            NotedownError::InvalidTitle { .. } | NotedownError::LinkPattern { .. } => None,
        }
    }
}
