//! Source text indexing and validation.

use crate::error::{EngineError, Result};

/// An ordered, 1-indexed view over the lines of a submitted script.
///
/// Immutable once built; empty lines are preserved so line numbers match
/// what the user submitted.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    text: String,
    lines: Vec<String>,
}

impl SourceIndex {
    /// Split the source into lines, rejecting blank submissions.
    pub fn build(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(EngineError::Validation("Code cannot be empty".to_string()));
        }

        Ok(Self {
            text: source.to_string(),
            lines: source.split('\n').map(str::to_string).collect(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Fetch a line by its 1-based number.
    pub fn line_at(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.lines.get(line - 1).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}
