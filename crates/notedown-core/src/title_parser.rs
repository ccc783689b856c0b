use crate::config::Settings;
use dashmap::DashMap;
use serde::Serialize;

/// The ordered titles encoded in one note filename.
///
/// The first title is the primary title; the rest are aliases. Titles keep
/// their original case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TitleSet(Vec<String>);

impl TitleSet {
    pub fn new(titles: Vec<String>) -> Self {
        Self(titles)
    }

    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn aliases(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn titles(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact (case-sensitive) membership.
    pub fn contains(&self, title: &str) -> bool {
        self.0.iter().any(|t| t == title)
    }

    /// Titles of `self` that do not appear, literally, in `other`.
    pub fn difference(&self, other: &TitleSet) -> Vec<String> {
        self.0
            .iter()
            .filter(|t| !other.contains(t))
            .cloned()
            .collect()
    }

    /// Build the filename encoding this title set.
    pub fn to_filename(&self, separator: char, extension: &str) -> String {
        let mut sep = [0u8; 4];
        format!("{}.{}", self.0.join(separator.encode_utf8(&mut sep)), extension)
    }
}

/// Parses note filenames into [`TitleSet`]s.
///
/// Grammar: `<title>[<SEP><alias>]*.<ext>`. Pieces are whitespace-trimmed and
/// empty pieces are discarded. Parsing is pure, so results are memoized by
/// filename in a table bounded by `capacity` entries.
pub struct TitleParser {
    separator: char,
    extensions: Vec<String>,
    capacity: usize,
    memo: DashMap<String, TitleSet>,
}

impl TitleParser {
    pub fn new(separator: char, extensions: Vec<String>, capacity: usize) -> Self {
        Self {
            separator,
            extensions: extensions.into_iter().map(|e| e.to_lowercase()).collect(),
            capacity,
            memo: DashMap::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.title_separator,
            settings.recognized_extensions(),
            settings.title_cache_capacity,
        )
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Returns the filename without its extension if the extension is recognized.
    pub fn strip_extension<'a>(&self, filename: &'a str) -> Option<&'a str> {
        let (base, ext) = filename.rsplit_once('.')?;
        let ext = ext.to_lowercase();
        if self.extensions.iter().any(|e| *e == ext) {
            Some(base)
        } else {
            None
        }
    }

    pub fn is_note_filename(&self, filename: &str) -> bool {
        !self.parse(filename).is_empty()
    }

    /// Parse `filename` (no directory part). Unrecognized extensions give an
    /// empty title set.
    pub fn parse(&self, filename: &str) -> TitleSet {
        if let Some(hit) = self.memo.get(filename) {
            return hit.clone();
        }

        let titles = self.parse_uncached(filename);

        if self.capacity > 0 {
            // Coarse eviction: start over once the table is full.
            if self.memo.len() >= self.capacity {
                self.memo.clear();
            }
            self.memo.insert(filename.to_string(), titles.clone());
        }
        titles
    }

    fn parse_uncached(&self, filename: &str) -> TitleSet {
        let Some(base) = self.strip_extension(filename) else {
            return TitleSet::default();
        };
        TitleSet(
            base.split(self.separator)
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn cached_len(&self) -> usize {
        self.memo.len()
    }
}
