//! Source text shared by every function compiled from one file.

use std::sync::OnceLock;

use ecmabc_core::LineIndex;

/// A source file and its lazily built line index.
///
/// Shared between producers behind an `Arc`; the index is built by the first
/// function that needs a position.
#[derive(Debug)]
pub struct SourceFile {
    path: String,
    text: String,
    line_index: OnceLock<LineIndex>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            line_index: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.text))
    }
}
