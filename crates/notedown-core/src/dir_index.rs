use crate::error::{NotedownError, Result};
use crate::title_parser::TitleParser;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// One title carried by one note file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    /// Title as written in the filename.
    pub title: String,
    /// Filename inside the indexed directory, e.g. "Note two~Alt one.md".
    pub filename: String,
}

/// Case-insensitive title -> notes mapping for one directory.
///
/// Entries under a key keep the order in which files were encountered while
/// scanning. Several entries under one key are expected when files (or aliases
/// within one file) collide case-insensitively; nothing here picks a winner.
#[derive(Debug, Default, Serialize)]
pub struct NoteIndex {
    directory: PathBuf,
    /// Note filenames in scan order.
    files: Vec<String>,
    titles: HashMap<String, Vec<NoteEntry>>,
}

impl NoteIndex {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Entries for a title, looked up case-insensitively.
    pub fn get(&self, title: &str) -> Option<&[NoteEntry]> {
        self.titles.get(&title.to_lowercase()).map(Vec::as_slice)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.titles.contains_key(&title.to_lowercase())
    }

    /// Lowercase keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.titles.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &NoteEntry> {
        self.titles.values().flatten()
    }

    /// Note filenames in scan order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.directory.join(filename)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    fn insert(&mut self, title: &str, filename: &str) {
        self.titles
            .entry(title.to_lowercase())
            .or_default()
            .push(NoteEntry {
                title: title.to_string(),
                filename: filename.to_string(),
            });
    }
}

struct CachedIndex {
    mtime: SystemTime,
    index: Arc<NoteIndex>,
}

/// Caches one [`NoteIndex`] per directory, keyed on the directory's mtime.
///
/// A cached index is reused exactly while the directory's modification time
/// is unchanged, and the very same `Arc` is handed back so callers can detect
/// "nothing changed" with `Arc::ptr_eq`. Adding, removing or renaming a note
/// bumps the directory mtime and forces a rebuild on the next call. Editing a
/// note in place does not, but titles come from filenames only, so the index
/// stays correct.
pub struct DirectoryIndexer {
    parser: Arc<TitleParser>,
    cache: DashMap<PathBuf, CachedIndex>,
}

impl DirectoryIndexer {
    pub fn new(parser: Arc<TitleParser>) -> Self {
        Self {
            parser,
            cache: DashMap::new(),
        }
    }

    pub fn parser(&self) -> &TitleParser {
        &self.parser
    }

    /// Return the index for `directory`, rebuilding it if the directory has
    /// changed since the last call. Unreadable directories are an error and
    /// are not cached.
    pub fn index(&self, directory: &Path) -> Result<Arc<NoteIndex>> {
        let mtime = dir_mtime(directory)?;

        if let Some(cached) = self.cache.get(directory) {
            if cached.mtime == mtime {
                tracing::debug!("Index cache hit for {}", directory.display());
                return Ok(cached.index.clone());
            }
        }

        let started = Instant::now();
        let index = Arc::new(self.scan(directory)?);

        // Store the mtime seen before listing: a change that lands mid-scan
        // leaves the stored stamp stale, so the next call rebuilds.
        let after = dir_mtime(directory)?;
        if after != mtime {
            tracing::debug!(
                "{} changed during scan, index will be rebuilt on next access",
                directory.display()
            );
        }
        self.cache.insert(
            directory.to_path_buf(),
            CachedIndex {
                mtime,
                index: index.clone(),
            },
        );

        tracing::debug!(
            "{:.3}s to index {} ({} files, {} titles)",
            started.elapsed().as_secs_f64(),
            directory.display(),
            index.files.len(),
            index.titles.len()
        );
        Ok(index)
    }

    fn scan(&self, directory: &Path) -> Result<NoteIndex> {
        let read_dir = std::fs::read_dir(directory)
            .map_err(|e| NotedownError::fs("read directory", directory, e))?;

        let mut index = NoteIndex {
            directory: directory.to_path_buf(),
            ..NoteIndex::default()
        };

        for entry in read_dir {
            let entry = entry.map_err(|e| NotedownError::fs("read directory", directory, e))?;
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let titles = self.parser.parse(&filename);
            if titles.is_empty() {
                continue;
            }
            // Directories named like notes are not notes.
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            for title in titles.titles() {
                index.insert(title, &filename);
            }
            index.files.push(filename);
        }

        Ok(index)
    }

    /// Drop the cached index for `directory`, forcing a rescan on next access.
    ///
    /// Useful on filesystems that do not bump directory mtimes reliably.
    pub fn invalidate(&self, directory: &Path) {
        self.cache.remove(directory);
    }

    pub fn is_cached(&self, directory: &Path) -> bool {
        self.cache.contains_key(directory)
    }
}

fn dir_mtime(directory: &Path) -> Result<SystemTime> {
    std::fs::metadata(directory)
        .and_then(|m| m.modified())
        .map_err(|e| NotedownError::fs("stat", directory, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
