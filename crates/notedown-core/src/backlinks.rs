use crate::dir_index::DirectoryIndexer;
use crate::error::{NotedownError, Result};
use crate::link_parser::{apply_edits, TextEdit};
use crate::resolver::link_text;
use crate::title_parser::TitleParser;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::path::Path;

/// Compiled size bound for the alternation of removed titles.
const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// The link substitution implied by renaming one note.
///
/// Titles the old filename carried but the new one does not are "removed";
/// every `[[removed]]` (case-insensitive, whole title) becomes
/// `[[new primary title]]`.
#[derive(Debug, Clone)]
pub struct BacklinkRewrite {
    removed: Vec<String>,
    replacement: String,
    pattern: Regex,
}

impl BacklinkRewrite {
    /// Returns `None` when no rewrite is needed: every old title is still
    /// valid, or the new filename carries no title to point at.
    pub fn plan(parser: &TitleParser, old_filename: &str, new_filename: &str) -> Result<Option<Self>> {
        let old_titles = parser.parse(old_filename);
        let new_titles = parser.parse(new_filename);
        let removed = old_titles.difference(&new_titles);
        if removed.is_empty() {
            return Ok(None);
        }
        let Some(primary) = new_titles.primary() else {
            tracing::warn!(
                "{} carries no titles, links to {:?} are left as they are",
                new_filename,
                removed
            );
            return Ok(None);
        };
        Self::new(removed, primary).map(Some)
    }

    pub fn new(removed: Vec<String>, new_title: &str) -> Result<Self> {
        Self::with_size_limit(removed, new_title, PATTERN_SIZE_LIMIT)
    }

    fn with_size_limit(removed: Vec<String>, new_title: &str, size_limit: usize) -> Result<Self> {
        let alternatives: Vec<String> = removed.iter().map(|t| regex::escape(t)).collect();
        let pattern = RegexBuilder::new(&format!(r"\[\[(?:{})\]\]", alternatives.join("|")))
            .case_insensitive(true)
            .size_limit(size_limit)
            .build();
        match pattern {
            Ok(pattern) => Ok(Self {
                removed,
                replacement: link_text(new_title),
                pattern,
            }),
            Err(source) => Err(NotedownError::LinkPattern {
                titles: removed,
                source,
            }),
        }
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    /// The link text every match is replaced with, e.g. `[[x]]`.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Edits for every match in `text`, in reverse offset order.
    pub fn edits(&self, text: &str) -> Vec<TextEdit> {
        let mut edits: Vec<TextEdit> = self
            .pattern
            .find_iter(text)
            .map(|m| TextEdit {
                offset: m.start(),
                remove_len: m.len(),
                insert_text: self.replacement.clone(),
            })
            .collect();
        edits.reverse();
        edits
    }

    /// Rewritten text and the number of substitutions made.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let edits = self.edits(text);
        let mut updated = text.to_string();
        apply_edits(&mut updated, &edits);
        (updated, edits.len())
    }
}

/// One note whose text the rewrite changes.
#[derive(Debug, Clone, Serialize)]
pub struct FileRewrite {
    pub filename: String,
    pub original: String,
    pub updated: String,
    pub substitutions: usize,
}

/// What a rewrite changed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RewriteReport {
    /// (filename, substitutions) for every file written.
    pub files: Vec<(String, usize)>,
    /// Files skipped because they could not be decoded.
    pub skipped: Vec<String>,
}

impl RewriteReport {
    pub fn files_modified(&self) -> usize {
        self.files.len()
    }

    pub fn substitutions(&self) -> usize {
        self.files.iter().map(|(_, n)| n).sum()
    }
}

/// Compute the rewrite for every note in `directory` without writing anything.
/// Returns the changed files and the filenames skipped as undecodable.
pub fn preview_rewrite(
    indexer: &DirectoryIndexer,
    directory: &Path,
    rewrite: &BacklinkRewrite,
) -> Result<(Vec<FileRewrite>, Vec<String>)> {
    let index = indexer.index(directory)?;
    let mut changed = Vec::new();
    let mut skipped = Vec::new();

    for filename in index.files() {
        let path = index.path_of(filename);
        let bytes = std::fs::read(&path).map_err(|e| NotedownError::fs("read", &path, e))?;
        let original = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                tracing::warn!("{}", NotedownError::Encoding { path: path.clone() });
                skipped.push(filename.clone());
                continue;
            }
        };

        let (updated, substitutions) = rewrite.apply(&original);
        if substitutions > 0 {
            changed.push(FileRewrite {
                filename: filename.clone(),
                original,
                updated,
                substitutions,
            });
        }
    }

    Ok((changed, skipped))
}

/// Rewrite links in every note of `directory` and write back the files that
/// changed. Undecodable files are skipped and logged.
pub fn apply_rewrite(
    indexer: &DirectoryIndexer,
    directory: &Path,
    rewrite: &BacklinkRewrite,
) -> Result<RewriteReport> {
    let (changed, skipped) = preview_rewrite(indexer, directory, rewrite)?;
    let mut report = RewriteReport {
        skipped,
        ..RewriteReport::default()
    };

    for file in changed {
        let path = directory.join(&file.filename);
        std::fs::write(&path, file.updated.as_bytes())
            .map_err(|e| NotedownError::fs("write", &path, e))?;
        tracing::info!(
            "Updated {} link(s) in {} ({:?} -> {})",
            file.substitutions,
            file.filename,
            rewrite.removed(),
            rewrite.replacement()
        );
        report.files.push((file.filename, file.substitutions));
    }

    Ok(report)
}

/// Keep links valid after `old_filename` was renamed to `new_filename` inside
/// `directory`. Returns an empty report when the rename removed no title.
pub fn rewrite_backlinks(
    indexer: &DirectoryIndexer,
    directory: &Path,
    old_filename: &str,
    new_filename: &str,
) -> Result<RewriteReport> {
    let Some(rewrite) = BacklinkRewrite::plan(indexer.parser(), old_filename, new_filename)? else {
        tracing::info!(
            "Rename {} -> {}: all titles still valid, no links to update",
            old_filename,
            new_filename
        );
        return Ok(RewriteReport::default());
    };

    let report = apply_rewrite(indexer, directory, &rewrite)?;
    tracing::info!(
        "Rename {} -> {}: updated {} file(s)",
        old_filename,
        new_filename,
        report.files_modified()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::fs;
    use std::sync::Arc;

    fn parser() -> TitleParser {
        TitleParser::from_settings(&Settings::default())
    }

    fn indexer() -> DirectoryIndexer {
        DirectoryIndexer::new(Arc::new(parser()))
    }

    #[test]
    fn rename_to_new_title_set_replaces_with_primary() {
        let rewrite = BacklinkRewrite::plan(&parser(), "a.md", "x~y.md").unwrap().unwrap();
        assert_eq!(rewrite.removed(), &["a".to_string()]);
        assert_eq!(rewrite.apply("[[a]] [[A]] [[y]]").0, "[[x]] [[x]] [[y]]");
    }

    #[test]
    fn adding_an_alias_needs_no_rewrite() {
        assert!(BacklinkRewrite::plan(&parser(), "a.md", "a~x.md").unwrap().is_none());
    }

    #[test]
    fn dropping_all_titles_rewrites_each() {
        let rewrite = BacklinkRewrite::plan(&parser(), "a~b.md", "x.md").unwrap().unwrap();
        let (text, n) = rewrite.apply("[[a]], [[B]] and [[c]]");
        assert_eq!(text, "[[x]], [[x]] and [[c]]");
        assert_eq!(n, 2);
    }

    #[test]
    fn partial_titles_are_not_substituted() {
        let rewrite = BacklinkRewrite::new(vec!["a".into()], "x").unwrap();
        assert_eq!(rewrite.apply("[[ab]] [[b a]] [[a]]").0, "[[ab]] [[b a]] [[x]]");
    }

    #[test]
    fn regex_metacharacters_in_titles_are_literal() {
        let rewrite = BacklinkRewrite::new(vec!["C++ (draft)".into()], "C++").unwrap();
        assert_eq!(rewrite.apply("[[c++ (DRAFT)]] [[C (draft)]]").0, "[[C++]] [[C (draft)]]");
    }

    #[test]
    fn oversized_pattern_is_an_error() {
        let titles: Vec<String> = (0..50).map(|i| format!("title number {}", i)).collect();
        let err = BacklinkRewrite::with_size_limit(titles, "x", 64).unwrap_err();
        assert!(matches!(err, NotedownError::LinkPattern { ref titles, .. } if titles.len() == 50));
        assert!(err.to_string().starts_with("Could not build the link pattern"));
    }

    #[test]
    fn renaming_to_non_note_needs_no_rewrite() {
        assert!(BacklinkRewrite::plan(&parser(), "a.md", "a.txt").unwrap().is_none());
    }

    #[test]
    fn edits_are_in_reverse_offset_order() {
        let rewrite = BacklinkRewrite::new(vec!["a".into()], "x").unwrap();
        let edits = rewrite.edits("[[a]] and [[a]]");
        assert_eq!(edits.len(), 2);
        assert!(edits[0].offset > edits[1].offset);
    }

    #[test]
    fn rewrites_only_files_with_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("C.md"), "# C\n").unwrap();
        fs::write(dir.path().join("Other.md"), "See [[A]] and [[b]]").unwrap();
        fs::write(dir.path().join("Unrelated.md"), "See [[Other]]").unwrap();

        let report = rewrite_backlinks(&indexer(), dir.path(), "A~B.md", "C.md").unwrap();
        assert_eq!(report.files_modified(), 1);
        assert_eq!(report.files, vec![("Other.md".to_string(), 2)]);
        assert_eq!(
            fs::read_to_string(dir.path().join("Other.md")).unwrap(),
            "See [[C]] and [[C]]"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("Unrelated.md")).unwrap(),
            "See [[Other]]"
        );
    }

    #[test]
    fn undecodable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.md"), "# x\n").unwrap();
        fs::write(dir.path().join("Binary.md"), [0xff, 0xfe, b'[', b'[', b'a', b']', b']']).unwrap();
        fs::write(dir.path().join("Text.md"), "[[a]]").unwrap();

        let report = rewrite_backlinks(&indexer(), dir.path(), "a.md", "x.md").unwrap();
        assert_eq!(report.files_modified(), 1);
        assert_eq!(report.skipped, vec!["Binary.md".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("Text.md")).unwrap(), "[[x]]");
    }

    #[test]
    fn preview_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Other.md"), "[[a]]").unwrap();
        let rewrite = BacklinkRewrite::new(vec!["a".into()], "x").unwrap();

        let (changed, _) = preview_rewrite(&indexer(), dir.path(), &rewrite).unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].updated, "[[x]]");
        assert_eq!(fs::read_to_string(dir.path().join("Other.md")).unwrap(), "[[a]]");
    }

    #[test]
    fn no_removed_titles_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Other.md"), "[[a]]").unwrap();
        let report = rewrite_backlinks(&indexer(), dir.path(), "a.md", "a~x.md").unwrap();
        assert_eq!(report.files_modified(), 0);
        assert_eq!(fs::read_to_string(dir.path().join("Other.md")).unwrap(), "[[a]]");
    }
}
