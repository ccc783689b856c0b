use dashmap::DashMap;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

// Compile regex once, reuse across calls
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[(.+?)\]\]").unwrap());

static FENCED_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[^\n]*\n.*?```|~~~[^\n]*\n.*?~~~").unwrap()
});

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]*`").unwrap());

pub const LINK_OPEN: &str = "[[";
pub const LINK_CLOSE: &str = "]]";

/// Half-open byte range of one `[[...]]` occurrence, delimiters included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LinkSpan {
    pub start: usize,
    pub end: usize,
}

impl LinkSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Byte range of the text between the delimiters.
    pub fn title_range(&self) -> Range<usize> {
        self.start + LINK_OPEN.len()..self.end - LINK_CLOSE.len()
    }

    pub fn title<'a>(&self, text: &'a str) -> &'a str {
        &text[self.title_range()]
    }

    /// Inclusive on both ends, so a cursor just after `]]` still counts.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Stable identity of an open document, assigned by the host.
pub type DocumentId = u64;

/// What the link locator needs from the host for one document.
pub trait Document {
    fn id(&self) -> DocumentId;
    fn text(&self) -> &str;
    /// Monotonically increasing edit counter.
    fn change_count(&self) -> u64;
    /// Whether `offset` lies in a region where links are not recognized
    /// (code spans, raw blocks).
    fn is_non_linkable(&self, offset: usize) -> bool;
}

/// Find all links in `text`, skipping those that start inside a region
/// `is_non_linkable` reports. Matching is non-greedy, so `[[A]] [[B]]` is
/// two links.
pub fn find_link_spans<F>(text: &str, is_non_linkable: F) -> Vec<LinkSpan>
where
    F: Fn(usize) -> bool,
{
    LINK_RE
        .find_iter(text)
        .filter(|m| !is_non_linkable(m.start()))
        .map(|m| LinkSpan {
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Byte ranges of fenced code blocks and inline code spans.
///
/// Hosts without their own syntax scopes can use this as the non-linkable test.
pub fn code_regions(markdown: &str) -> Vec<Range<usize>> {
    let fenced: Vec<Range<usize>> = FENCED_CODE_RE.find_iter(markdown).map(|m| m.range()).collect();

    // Inline code is only searched between fences, so backticks inside a
    // fence never pair with ones after it.
    let mut inline = Vec::new();
    let mut gap_start = 0;
    let gap_ends = fenced.iter().map(|r| (r.start, r.end)).chain(std::iter::once((markdown.len(), markdown.len())));
    for (gap_end, next_start) in gap_ends {
        let gap = &markdown[gap_start..gap_end];
        inline.extend(
            INLINE_CODE_RE
                .find_iter(gap)
                .map(|m| gap_start + m.start()..gap_start + m.end()),
        );
        gap_start = next_start;
    }

    let mut ranges = fenced;
    ranges.extend(inline);
    ranges
}

/// Returns true if the byte offset falls within any excluded range.
pub fn is_excluded(offset: usize, excluded: &[Range<usize>]) -> bool {
    excluded.iter().any(|r| r.contains(&offset))
}

/// A plain in-memory [`Document`] whose non-linkable regions are markdown code.
#[derive(Debug, Clone)]
pub struct TextDocument {
    id: DocumentId,
    text: String,
    change_count: u64,
    code: Vec<Range<usize>>,
}

impl TextDocument {
    pub fn new(id: DocumentId, text: impl Into<String>) -> Self {
        let text = text.into();
        let code = code_regions(&text);
        Self {
            id,
            text,
            change_count: 0,
            code,
        }
    }

    /// Replace the whole text, bumping the change count.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.code = code_regions(&self.text);
        self.change_count += 1;
    }
}

impl Document for TextDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn change_count(&self) -> u64 {
        self.change_count
    }

    fn is_non_linkable(&self, offset: usize) -> bool {
        is_excluded(offset, &self.code)
    }
}

struct CachedLinks {
    change_count: u64,
    spans: Arc<[LinkSpan]>,
}

/// Caches link spans per document, keyed on the document's change count.
///
/// At most one scan happens per edit. Entries are dropped when the host
/// reports that the last view of a document was closed.
#[derive(Default)]
pub struct LinkLocator {
    cache: DashMap<DocumentId, CachedLinks>,
}

impl LinkLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links(&self, doc: &impl Document) -> Arc<[LinkSpan]> {
        let id = doc.id();
        let change_count = doc.change_count();

        if let Some(cached) = self.cache.get(&id) {
            if cached.change_count == change_count {
                return cached.spans.clone();
            }
        }

        let started = Instant::now();
        let spans: Arc<[LinkSpan]> =
            find_link_spans(doc.text(), |offset| doc.is_non_linkable(offset)).into();
        tracing::debug!(
            "{:.3}s to find {} link(s) in document {}",
            started.elapsed().as_secs_f64(),
            spans.len(),
            id
        );

        self.cache.insert(
            id,
            CachedLinks {
                change_count,
                spans: spans.clone(),
            },
        );
        spans
    }

    /// Host hook for a closing view. The entry is only dropped when no other
    /// view of the same document remains open.
    pub fn on_close(&self, id: DocumentId, last_view: bool) {
        if last_view {
            self.cache.remove(&id);
        }
    }

    pub fn is_cached(&self, id: DocumentId) -> bool {
        self.cache.contains_key(&id)
    }
}

/// A text edit: replace `remove_len` bytes at `offset` with `insert_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte offset in source
    pub offset: usize,
    /// Number of bytes to remove
    pub remove_len: usize,
    /// Replacement text
    pub insert_text: String,
}

/// Apply edits sorted in reverse offset order.
pub fn apply_edits(text: &mut String, edits: &[TextEdit]) {
    for edit in edits {
        text.replace_range(edit.offset..edit.offset + edit.remove_len, &edit.insert_text);
    }
}
