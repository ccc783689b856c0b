use crate::dir_index::NoteIndex;
use crate::link_parser::LinkSpan;
use crate::note::heading_title;
use serde::Serialize;
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The first line is not a `# Title` heading.
    InvalidTitle,
    /// A link names a title no note in the directory carries.
    MissingNote,
}

/// An advisory finding about one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub description: String,
    /// 1-based line number of `span.start`.
    pub line: usize,
    /// Byte range the diagnostic is anchored to.
    pub span: Range<usize>,
    /// Byte range a quick fix should select, e.g. the title inside `[[...]]`.
    pub editable: Range<usize>,
}

impl Diagnostic {
    /// Two-line presentation: description, then location and offending text.
    pub fn summary(&self, text: &str) -> [String; 2] {
        let snippet = text.get(self.span.clone()).unwrap_or_default();
        [
            self.description.clone(),
            format!("Line {}: {}", self.line, snippet),
        ]
    }
}

/// Check a document against the directory it lives in. Never touches disk.
pub fn lint(text: &str, links: &[LinkSpan], index: &NoteIndex) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if heading_title(text).is_none() {
        let first_line_len = text.lines().next().map(str::len).unwrap_or(0);
        diagnostics.push(Diagnostic {
            kind: DiagnosticKind::InvalidTitle,
            description: "Invalid title".to_string(),
            line: 1,
            span: 0..first_line_len,
            editable: 0..first_line_len,
        });
    }

    for link in links {
        let title = link.title(text);
        if index.contains_title(title) {
            continue;
        }
        diagnostics.push(Diagnostic {
            kind: DiagnosticKind::MissingNote,
            description: "Note file not found".to_string(),
            line: line_of(text, link.start),
            span: link.range(),
            editable: link.title_range(),
        });
    }

    diagnostics
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}
