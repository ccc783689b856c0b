use crate::backlinks::{rewrite_backlinks, RewriteReport};
use crate::config::Settings;
use crate::dir_index::{DirectoryIndexer, NoteIndex};
use crate::error::Result;
use crate::link_parser::{Document, DocumentId, LinkLocator, LinkSpan};
use crate::lint::{lint, Diagnostic};
use crate::note::{back_title, create_note, heading_title};
use crate::rename::{apply_rename, plan_heading_rename, DocumentHost, RenamePlan, RenameReport};
use crate::resolver::{self, Completion, LinkTarget};
use crate::title_parser::TitleParser;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The long-lived service a host talks to.
///
/// Owns the title memo table, the per-directory index cache and the
/// per-document link cache. Construct one per workspace and keep it for the
/// life of the process; the only teardown is [`Notebook::on_close`].
pub struct Notebook {
    settings: Settings,
    indexer: DirectoryIndexer,
    links: LinkLocator,
}

impl Notebook {
    pub fn new(settings: Settings) -> Self {
        let parser = Arc::new(TitleParser::from_settings(&settings));
        Self {
            settings,
            indexer: DirectoryIndexer::new(parser),
            links: LinkLocator::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn parser(&self) -> &TitleParser {
        self.indexer.parser()
    }

    pub fn indexer(&self) -> &DirectoryIndexer {
        &self.indexer
    }

    pub fn is_note_folder(&self, directory: &Path) -> bool {
        self.settings.is_note_folder(directory)
    }

    pub fn index(&self, directory: &Path) -> Result<Arc<NoteIndex>> {
        self.indexer.index(directory)
    }

    pub fn resolve(&self, directory: &Path, title: &str) -> Result<Vec<String>> {
        let index = self.index(directory)?;
        Ok(resolver::resolve(&index, title))
    }

    pub fn candidates(&self, directory: &Path, exclude_filename: Option<&str>) -> Result<Vec<String>> {
        let index = self.index(directory)?;
        Ok(resolver::candidates(&index, exclude_filename))
    }

    pub fn links(&self, doc: &impl Document) -> Arc<[LinkSpan]> {
        self.links.links(doc)
    }

    /// Host hook for a closing view of a document.
    pub fn on_close(&self, id: DocumentId, last_view: bool) {
        self.links.on_close(id, last_view);
    }

    /// Diagnostics for the document stored at `path`.
    pub fn lint(&self, doc: &impl Document, path: &Path) -> Result<Vec<Diagnostic>> {
        let index = self.index(parent_of(path))?;
        let links = self.links(doc);
        Ok(lint(doc.text(), &links, &index))
    }

    /// Where following the link under the cursor (or the selection) leads.
    /// A URL under the cursor wins over note titles. `None` when there is no
    /// title at the cursor.
    pub fn open_link(
        &self,
        doc: &impl Document,
        path: &Path,
        cursor: usize,
        selection: Option<Range<usize>>,
    ) -> Result<Option<LinkTarget>> {
        let has_selection = selection.as_ref().is_some_and(|s| !s.is_empty());
        if !has_selection {
            if let Some(url) = resolver::url_at(doc.text(), cursor) {
                return Ok(Some(LinkTarget::Url { url: url.to_string() }));
            }
        }
        let links = self.links(doc);
        let Some(title) = resolver::title_at(doc.text(), &links, cursor, selection) else {
            return Ok(None);
        };
        let index = self.index(parent_of(path))?;
        Ok(Some(resolver::link_target(&index, title)))
    }

    /// Create the note `title` next to `from_path`, linking back to it.
    pub fn create_note(&self, from_path: &Path, title: &str) -> Result<PathBuf> {
        let from_filename = file_name_of(from_path);
        create_note(
            parent_of(from_path),
            title,
            &back_title(self.parser(), &from_filename),
            self.parser().separator(),
            &self.settings.markdown_extension,
        )
    }

    /// Completion items for the cursor, or nothing if completion does not apply.
    pub fn completions(&self, doc: &impl Document, path: &Path, cursor: usize) -> Result<Vec<Completion>> {
        let text = doc.text();
        if !text.is_char_boundary(cursor) || doc.is_non_linkable(cursor) {
            return Ok(Vec::new());
        }
        let line_start = text[..cursor].rfind('\n').map(|i| i + 1).unwrap_or(0);
        if !resolver::can_complete(&text[line_start..cursor]) {
            return Ok(Vec::new());
        }
        let index = self.index(parent_of(path))?;
        Ok(resolver::completions(&index, Some(&file_name_of(path))))
    }

    /// Titles offered by the insert-link picker for the document at `path`.
    pub fn link_picker(&self, path: &Path) -> Result<Vec<String>> {
        self.candidates(parent_of(path), Some(&file_name_of(path)))
    }

    /// Whether the document's heading disagrees with its filename and the
    /// settings ask for filenames to follow headings.
    pub fn heading_rename_suggested(&self, doc: &impl Document, path: &Path) -> bool {
        if !self.settings.reflect_title_in_filename {
            return false;
        }
        let Some(heading) = heading_title(doc.text()) else {
            return false;
        };
        self.parser().parse(&file_name_of(path)).primary() != Some(heading)
    }

    pub fn plan_heading_rename(&self, doc: &impl Document, path: &Path) -> Result<Option<RenamePlan>> {
        plan_heading_rename(self.parser(), path, doc.text())
    }

    pub fn apply_rename(&self, plan: &RenamePlan, host: &mut impl DocumentHost) -> Result<RenameReport> {
        apply_rename(&self.indexer, plan, host)
    }

    pub fn rewrite_backlinks(&self, directory: &Path, old_filename: &str, new_filename: &str) -> Result<RewriteReport> {
        rewrite_backlinks(&self.indexer, directory, old_filename, new_filename)
    }
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
