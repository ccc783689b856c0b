//! A flat directory of plain-text notes linked with `[[Title]]` syntax.
//!
//! A note's titles live in its filename (`Primary~Alias one~Alias two.md`).
//! The crate indexes a directory by title, finds and resolves links, lints
//! documents and keeps links valid when notes are renamed.

pub mod backlinks;
pub mod config;
pub mod dir_index;
pub mod error;
pub mod link_parser;
pub mod lint;
pub mod note;
pub mod notebook;
pub mod rename;
pub mod resolver;
pub mod title_parser;

pub use backlinks::{BacklinkRewrite, FileRewrite, RewriteReport};
pub use config::{ConfigDiagnostic, Settings, SETTINGS_FILE_NAME};
pub use dir_index::{DirectoryIndexer, NoteEntry, NoteIndex};
pub use error::{NotedownError, Result};
pub use link_parser::{Document, DocumentId, LinkLocator, LinkSpan, TextDocument, TextEdit};
pub use lint::{Diagnostic, DiagnosticKind};
pub use notebook::Notebook;
pub use rename::{DocumentHost, RenamePlan, RenameReport};
pub use resolver::{Choice, Completion, LinkTarget};
pub use title_parser::{TitleParser, TitleSet};
