use crate::backlinks::{rewrite_backlinks, RewriteReport};
use crate::dir_index::DirectoryIndexer;
use crate::error::{NotedownError, Result};
use crate::note::{heading_title, validate_title};
use crate::title_parser::{TitleParser, TitleSet};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Host side of a rename: open views must let go of the file before it is
/// renamed (some platforms refuse to rename open files) and come back after.
pub trait DocumentHost {
    /// Close every view of `path`.
    fn close(&mut self, path: &Path);
    /// Open `path` again after a successful rename.
    fn reopen(&mut self, path: &Path);
}

/// A rename of one note within its directory, not yet performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    pub directory: PathBuf,
    pub old_filename: String,
    pub new_filename: String,
}

impl RenamePlan {
    pub fn new(
        directory: impl Into<PathBuf>,
        old_filename: impl Into<String>,
        new_filename: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            old_filename: old_filename.into(),
            new_filename: new_filename.into(),
        }
    }

    pub fn old_path(&self) -> PathBuf {
        self.directory.join(&self.old_filename)
    }

    pub fn new_path(&self) -> PathBuf {
        self.directory.join(&self.new_filename)
    }

    /// Case-only renames target the same file on case-insensitive filesystems.
    fn is_case_only(&self) -> bool {
        self.old_filename.to_lowercase() == self.new_filename.to_lowercase()
    }

    /// Refuse to clobber another existing file.
    pub fn check_target(&self) -> Result<()> {
        let new_path = self.new_path();
        if !self.is_case_only() && new_path.exists() {
            return Err(NotedownError::TargetExists { path: new_path });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameReport {
    pub old_filename: String,
    pub new_filename: String,
    pub backlinks: RewriteReport,
}

/// Title set the note should have once its filename reflects `heading`:
/// the heading first, then the old aliases that differ from it.
pub fn retitled(old: &TitleSet, heading: &str) -> TitleSet {
    let mut titles = vec![heading.to_string()];
    titles.extend(old.aliases().iter().filter(|a| *a != heading).cloned());
    TitleSet::new(titles)
}

/// Plan renaming the note at `path` so its primary title matches the
/// document's heading. `Ok(None)` means the filename already matches.
pub fn plan_heading_rename(parser: &TitleParser, path: &Path, text: &str) -> Result<Option<RenamePlan>> {
    let heading = heading_title(text).ok_or_else(|| NotedownError::InvalidTitle {
        title: text.lines().next().unwrap_or_default().to_string(),
        reason: "first line is not a `# Title` heading",
    })?;
    validate_title(heading, parser.separator())?;

    let (Some(directory), Some(old_filename)) = (path.parent(), path.file_name().and_then(|n| n.to_str())) else {
        return Err(NotedownError::fs(
            "rename",
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
        ));
    };
    let extension = old_filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("md");

    let old_titles = parser.parse(old_filename);
    let new_filename = retitled(&old_titles, heading).to_filename(parser.separator(), extension);
    if new_filename == old_filename {
        return Ok(None);
    }

    let plan = RenamePlan::new(directory, old_filename, new_filename);
    plan.check_target()?;
    Ok(Some(plan))
}

/// Perform a planned rename: close the document, rename the file, reopen it
/// under the new name and update links in the other notes.
///
/// If the filesystem rename fails the document stays closed and nothing else
/// is touched.
pub fn apply_rename(
    indexer: &DirectoryIndexer,
    plan: &RenamePlan,
    host: &mut impl DocumentHost,
) -> Result<RenameReport> {
    plan.check_target()?;
    let old_path = plan.old_path();
    let new_path = plan.new_path();

    host.close(&old_path);
    std::fs::rename(&old_path, &new_path).map_err(|e| NotedownError::fs("rename", &old_path, e))?;
    tracing::info!("Renamed {} -> {}", plan.old_filename, plan.new_filename);
    host.reopen(&new_path);

    let backlinks = rewrite_backlinks(indexer, &plan.directory, &plan.old_filename, &plan.new_filename)?;
    Ok(RenameReport {
        old_filename: plan.old_filename.clone(),
        new_filename: plan.new_filename.clone(),
        backlinks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::fs;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingHost {
        events: Vec<String>,
    }

    impl DocumentHost for RecordingHost {
        fn close(&mut self, path: &Path) {
            self.events.push(format!("close {}", path.file_name().unwrap().to_string_lossy()));
        }

        fn reopen(&mut self, path: &Path) {
            self.events.push(format!("reopen {}", path.file_name().unwrap().to_string_lossy()));
        }
    }

    fn parser() -> TitleParser {
        TitleParser::from_settings(&Settings::default())
    }

    #[test]
    fn retitle_keeps_aliases() {
        let p = parser();
        assert_eq!(retitled(&p.parse("a~b.md"), "x").titles(), &["x".to_string(), "b".to_string()]);
        assert_eq!(retitled(&p.parse("a~x.md"), "x").titles(), &["x".to_string()]);
    }

    #[test]
    fn plan_matches_heading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Old~Alias.md");
        let plan = plan_heading_rename(&parser(), &path, "# New\n").unwrap().unwrap();
        assert_eq!(plan.old_filename, "Old~Alias.md");
        assert_eq!(plan.new_filename, "New~Alias.md");
    }

    #[test]
    fn plan_preserves_extension() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_heading_rename(&parser(), &dir.path().join("a.markdown"), "# b")
            .unwrap()
            .unwrap();
        assert_eq!(plan.new_filename, "b.markdown");
    }

    #[test]
    fn plan_is_none_when_filename_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Same~Alias.md");
        assert!(plan_heading_rename(&parser(), &path, "# Same\n").unwrap().is_none());
    }

    #[test]
    fn plan_rejects_missing_or_bad_heading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        assert!(matches!(
            plan_heading_rename(&parser(), &path, "no heading"),
            Err(NotedownError::InvalidTitle { .. })
        ));
        assert!(matches!(
            plan_heading_rename(&parser(), &path, "# a~b"),
            Err(NotedownError::InvalidTitle { .. })
        ));
    }

    #[test]
    fn plan_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "").unwrap();
        let err = plan_heading_rename(&parser(), &dir.path().join("a.md"), "# b").unwrap_err();
        assert!(matches!(err, NotedownError::TargetExists { .. }));
    }

    #[test]
    fn apply_follows_close_rename_reopen_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "# x\n").unwrap();
        fs::write(dir.path().join("Other.md"), "[[a]]").unwrap();
        let indexer = DirectoryIndexer::new(Arc::new(parser()));
        let mut host = RecordingHost::default();

        let plan = RenamePlan::new(dir.path(), "a.md", "x.md");
        let report = apply_rename(&indexer, &plan, &mut host).unwrap();

        assert_eq!(host.events, vec!["close a.md", "reopen x.md"]);
        assert!(dir.path().join("x.md").exists());
        assert!(!dir.path().join("a.md").exists());
        assert_eq!(report.backlinks.files_modified(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("Other.md")).unwrap(), "[[x]]");
    }

    #[test]
    fn failed_rename_leaves_document_closed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Other.md"), "[[a]]").unwrap();
        let indexer = DirectoryIndexer::new(Arc::new(parser()));
        let mut host = RecordingHost::default();

        let plan = RenamePlan::new(dir.path(), "a.md", "x.md");
        let err = apply_rename(&indexer, &plan, &mut host).unwrap_err();

        assert!(matches!(err, NotedownError::Filesystem { action: "rename", .. }));
        assert_eq!(host.events, vec!["close a.md"]);
        assert_eq!(fs::read_to_string(dir.path().join("Other.md")).unwrap(), "[[a]]");
    }
}
