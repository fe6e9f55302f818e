//! Rewindable view over the lines of a source file.
//!
//! The whole file is loaded into memory up front so that the classifier can
//! read ahead (continuation and section boundaries) and give lines back on a
//! negative match. An explicit index makes "give that line back" a plain
//! integer assignment rather than a pushback buffer.

use std::io;
use std::path::Path;

/// A pre-loaded list of lines with a current position.
#[derive(Debug, Clone)]
pub struct Cursor {
    lines: Vec<String>,
    next: usize,
}

impl Cursor {
    /// Load a cursor from an in-memory body.
    #[must_use]
    pub fn new(body: &str) -> Self {
        Self {
            lines: body.lines().map(str::to_owned).collect(),
            next: 0,
        }
    }

    /// Load a cursor from a file. Reading is side-effect-free.
    ///
    /// # Errors
    ///
    /// The underlying I/O error, untranslated.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Ok(Self::new(&std::fs::read_to_string(path)?))
    }

    /// Index of the line the next [`advance`](Self::advance) will return.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.next
    }

    /// The line most recently returned by [`advance`](Self::advance), if any.
    #[must_use]
    pub fn current_line(&self) -> Option<&str> {
        self.next
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    /// Return the next line and move past it, or `None` at end of input.
    pub fn advance(&mut self) -> Option<&str> {
        let line = self.lines.get(self.next)?;
        self.next += 1;
        Some(line)
    }

    /// Move the cursor so the next [`advance`](Self::advance) returns the
    /// line at `index`. Rewinding past the end simply exhausts the cursor.
    pub const fn rewind(&mut self, index: usize) {
        self.next = index;
    }

    /// Total number of lines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the source had no lines at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_walks_lines_in_order() {
        let mut c = Cursor::new("a\nb\nc\n");
        assert_eq!(c.advance(), Some("a"));
        assert_eq!(c.advance(), Some("b"));
        assert_eq!(c.advance(), Some("c"));
        assert_eq!(c.advance(), None);
        assert_eq!(c.advance(), None, "exhausted cursor stays exhausted");
    }

    #[test]
    fn rewind_replays_a_line() {
        let mut c = Cursor::new("a\nb\nc\n");
        assert_eq!(c.advance(), Some("a"));
        let mark = c.index();
        assert_eq!(c.advance(), Some("b"));
        c.rewind(mark);
        assert_eq!(c.advance(), Some("b"), "rewound line is returned again");
    }

    #[test]
    fn current_line_tracks_last_advance() {
        let mut c = Cursor::new("a\nb\n");
        assert_eq!(c.current_line(), None, "nothing returned yet");
        c.advance();
        assert_eq!(c.current_line(), Some("a"));
        c.advance();
        assert_eq!(c.current_line(), Some("b"));
    }

    #[test]
    fn empty_body() {
        let mut c = Cursor::new("");
        assert!(c.is_empty());
        assert_eq!(c.advance(), None);
    }

    #[test]
    fn blank_lines_are_preserved_as_empty_strings() {
        let mut c = Cursor::new("a\n\nb\n");
        assert_eq!(c.len(), 3);
        c.advance();
        assert_eq!(c.advance(), Some(""));
    }
}
