use crate::dir_index::NoteIndex;
use crate::link_parser::{LinkSpan, LINK_CLOSE, LINK_OPEN};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

/// Characters that end a word when looking up the title under the cursor.
const WORD_SEPARATORS: &str = "./\\()\"'-:,;<>~!@#$%^&*|+=[]{}`?";

/// Autolinks (`<scheme:...>`) and bare URLs.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<((?:https?|ftp|file|mailto):[^\s<>]+)>|((?:https?|ftp|file)://[^\s<>()\[\]`]+|mailto:[^\s<>()\[\]`]+)").unwrap()
});

/// Filenames carrying `title`, case-insensitively, in index order.
///
/// An empty result means the note does not exist yet. When several files
/// share the title all of them are returned; choosing one is the host's job.
pub fn resolve(index: &NoteIndex, title: &str) -> Vec<String> {
    index
        .get(title)
        .map(|entries| entries.iter().map(|e| e.filename.clone()).collect())
        .unwrap_or_default()
}

/// Every title in the directory except those of `exclude_filename`, sorted
/// and deduplicated.
pub fn candidates(index: &NoteIndex, exclude_filename: Option<&str>) -> Vec<String> {
    index
        .entries()
        .filter(|e| Some(e.filename.as_str()) != exclude_filename)
        .map(|e| e.title.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A completion item offered after `[[`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub label: String,
    pub insert_text: String,
}

pub fn completions(index: &NoteIndex, exclude_filename: Option<&str>) -> Vec<Completion> {
    candidates(index, exclude_filename)
        .into_iter()
        .map(|title| Completion {
            label: format!("{}\tNote", title),
            insert_text: format!("{}{}", title, LINK_CLOSE),
        })
        .collect()
}

/// Whether link completion applies: the line up to the cursor has a `[[`
/// that has not been closed yet.
pub fn can_complete(line_before_cursor: &str) -> bool {
    match line_before_cursor.rfind(LINK_OPEN) {
        Some(open) => !line_before_cursor[open..].contains(LINK_CLOSE),
        None => false,
    }
}

/// The link text for a title chosen in a picker.
pub fn link_text(title: &str) -> String {
    format!("{}{}{}", LINK_OPEN, title, LINK_CLOSE)
}

/// The title the user means when asking to follow a link.
///
/// A non-empty selection is taken verbatim. Otherwise a link containing the
/// cursor gives its inner text, and failing that the word under the cursor.
pub fn title_at<'a>(
    text: &'a str,
    links: &[LinkSpan],
    cursor: usize,
    selection: Option<Range<usize>>,
) -> Option<&'a str> {
    if let Some(sel) = selection.filter(|s| !s.is_empty()) {
        return text.get(sel).map(str::trim).filter(|t| !t.is_empty());
    }
    if let Some(span) = links.iter().find(|s| s.contains(cursor)) {
        return Some(span.title(text));
    }
    word_at(text, cursor)
}

/// The URL under `offset` (inclusive of both ends), without autolink angle
/// brackets. Trailing sentence punctuation is not part of a bare URL.
pub fn url_at(text: &str, offset: usize) -> Option<&str> {
    URL_RE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if offset < whole.start() || offset > whole.end() {
            return None;
        }
        match (caps.get(1), caps.get(2)) {
            (Some(autolink), _) => Some(autolink.as_str()),
            (None, Some(bare)) => Some(bare.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"'])),
            (None, None) => None,
        }
    })
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !WORD_SEPARATORS.contains(c)
}

/// The word touching `offset`, if any.
pub fn word_at(text: &str, offset: usize) -> Option<&str> {
    if offset > text.len() || !text.is_char_boundary(offset) {
        return None;
    }
    let start = text[..offset]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_word_char(c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(offset);
    let end = text[offset..]
        .char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, _)| offset + i)
        .unwrap_or(text.len());
    (start < end).then(|| &text[start..end])
}

/// What following a link leads to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LinkTarget {
    /// The cursor is on a URL; the host hands it to a browser.
    Url { url: String },
    /// Exactly one note carries the title.
    Open { filename: String },
    /// Several notes carry the title; the host asks which one.
    Choose { title: String, filenames: Vec<String> },
    /// No note carries the title; the host may offer to create it.
    Missing { title: String },
}

pub fn link_target(index: &NoteIndex, title: &str) -> LinkTarget {
    let mut filenames = resolve(index, title);
    match filenames.len() {
        0 => LinkTarget::Missing {
            title: title.to_string(),
        },
        1 => LinkTarget::Open {
            filename: filenames.remove(0),
        },
        _ => LinkTarget::Choose {
            title: title.to_string(),
            filenames,
        },
    }
}

/// Outcome of a host dialog: the chosen item index, or cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Picked(usize),
    Cancelled,
}

/// Pick an item after the host's dialog. Cancellation, or an index out of
/// range, picks nothing.
pub fn choose<T>(items: &[T], choice: Choice) -> Option<&T> {
    match choice {
        Choice::Picked(i) => items.get(i),
        Choice::Cancelled => None,
    }
}
