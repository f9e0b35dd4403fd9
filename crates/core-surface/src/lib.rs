//! Host-surface capability boundary.
//!
//! The interpreter never owns the text it edits: a host text widget does. This
//! crate defines the narrow contract the rest of the workspace programs
//! against (`Surface`), a char-indexed snapshot type used by the motion and
//! command layers (`FlatText`), and a reference in-memory implementation
//! (`MemorySurface`) backed by a rope, used by the driver binary and the test
//! suites.
//!
//! All offsets crossing this boundary are 0-based char indices into the flat
//! buffer; end-of-buffer is the char length. Selections are half-open
//! `[start, end)` pairs; a collapsed selection is the cursor.

use ropey::Rope;

pub mod text;

pub use text::FlatText;

/// Capability set a host text widget must provide.
///
/// `replace_range` is the single mutation primitive; it returns the removed
/// text so callers can feed registers and undo records without a second read.
/// The scroll methods are presentation hints and default to no-ops: a host
/// with no viewport (tests, batch driver) simply ignores them.
pub trait Surface {
    /// Full buffer contents.
    fn text(&self) -> String;

    /// Splice `new_text` over the char range `[start, end)`, returning the
    /// removed text. Out-of-range offsets are clamped to the buffer.
    fn replace_range(&mut self, start: usize, end: usize, new_text: &str) -> String;

    /// Current selection as `(start, end)` char offsets.
    fn selection(&self) -> (usize, usize);

    /// Replace the selection. `start == end` collapses to a bare cursor.
    fn set_selection(&mut self, start: usize, end: usize);

    /// Hint that the view should show the top of the buffer.
    fn scroll_hint_top(&mut self) {}

    /// Hint that the view should show the bottom of the buffer.
    fn scroll_hint_bottom(&mut self) {}

    /// Scroll the view by whole rows (negative is up).
    fn scroll_by_rows(&mut self, _rows: isize) {}

    /// Rows visible in the widget's viewport; drives the scroll commands.
    /// Hosts without a meaningful viewport can keep the default.
    fn viewport_rows(&self) -> usize {
        24
    }
}

/// In-memory `Surface` for tests and the headless driver.
///
/// Backed by a rope so char-offset splices stay cheap on large buffers. The
/// selection is clamped on every write, mirroring what a real text widget
/// does when its value shrinks underneath the caret.
pub struct MemorySurface {
    rope: Rope,
    sel_start: usize,
    sel_end: usize,
    viewport_rows: usize,
}

impl MemorySurface {
    pub fn new(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            sel_start: 0,
            sel_end: 0,
            viewport_rows: 24,
        }
    }

    pub fn with_viewport_rows(mut self, rows: usize) -> Self {
        self.viewport_rows = rows.max(1);
        self
    }

    /// Char length of the buffer.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    fn clamp(&self, pos: usize) -> usize {
        pos.min(self.rope.len_chars())
    }
}

impl Surface for MemorySurface {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn replace_range(&mut self, start: usize, end: usize, new_text: &str) -> String {
        let start = self.clamp(start);
        let end = self.clamp(end).max(start);
        let removed = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        if !new_text.is_empty() {
            self.rope.insert(start, new_text);
        }
        tracing::trace!(
            target: "surface.edit",
            start,
            end,
            removed = removed.len(),
            inserted = new_text.len(),
            "replace_range"
        );
        self.sel_start = self.clamp(self.sel_start);
        self.sel_end = self.clamp(self.sel_end);
        removed
    }

    fn selection(&self) -> (usize, usize) {
        (self.sel_start, self.sel_end)
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        self.sel_start = self.clamp(start);
        self.sel_end = self.clamp(end.max(start));
    }

    fn viewport_rows(&self) -> usize {
        self.viewport_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_returns_removed_text() {
        let mut s = MemorySurface::new("foo bar\nbaz\n");
        let removed = s.replace_range(0, 4, "");
        assert_eq!(removed, "foo ");
        assert_eq!(s.text(), "bar\nbaz\n");
    }

    #[test]
    fn replace_clamps_out_of_range() {
        let mut s = MemorySurface::new("ab");
        let removed = s.replace_range(1, 99, "X");
        assert_eq!(removed, "b");
        assert_eq!(s.text(), "aX");
    }

    #[test]
    fn selection_clamped_after_shrink() {
        let mut s = MemorySurface::new("hello");
        s.set_selection(5, 5);
        s.replace_range(2, 5, "");
        assert_eq!(s.selection(), (2, 2));
    }

    #[test]
    fn insert_at_cursor() {
        let mut s = MemorySurface::new("ac");
        s.replace_range(1, 1, "b");
        assert_eq!(s.text(), "abc");
    }
}
