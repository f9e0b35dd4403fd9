//! Position computations for all motions.
//!
//! Everything here is a pure function over a `FlatText` snapshot and a char
//! offset; no editor state is read or written. The command layer owns count
//! resolution, the saved vertical column, and the decision of what a computed
//! offset means (cursor move vs. operator range end).
//!
//! Boundary conventions, shared by every function:
//! * a line's "end" is the offset of its trailing newline, or end-of-buffer
//!   for the final line;
//! * a line's "start" is the offset just past the previous newline;
//! * out-of-range reads classify as word characters, so scans terminate at
//!   the buffer edge without special-casing.

use core_surface::FlatText;

pub mod pairs;
pub mod search;
pub mod seek;
pub mod vertical;

pub use pairs::match_pair;
pub use search::{search, SearchDir};
pub use seek::{seek, SeekKind};
pub use vertical::{cursor_dy, find_pos_for_col, Col};

/// Character classes for word motions.
///
/// `w`/`b`/`e` use the strict classification where punctuation forms its own
/// word class; `W`/`B`/`E` lump everything non-whitespace together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Whitespace,
    Punctuation,
    Word,
}

/// Control characters and space count as whitespace (this includes newline).
pub fn is_whitespace(c: char) -> bool {
    (c as u32) <= 32
}

/// Classify a char. Non-ASCII always classifies as `Word`.
pub fn classify(c: char, strict: bool) -> CharClass {
    if is_whitespace(c) {
        return CharClass::Whitespace;
    }
    if !strict {
        return CharClass::Word;
    }
    match c as u32 {
        33..=47 | 58..=64 | 91..=94 | 96 | 123..=126 => CharClass::Punctuation,
        _ => CharClass::Word,
    }
}

/// Class of the char at `pos`; positions at or past the end read as `Word`
/// so word scans stop at the buffer edge.
fn class_at(t: &FlatText, pos: usize, strict: bool) -> CharClass {
    match t.char_at(pos) {
        Some(c) => classify(c, strict),
        None => CharClass::Word,
    }
}

fn ws_at(t: &FlatText, pos: usize) -> bool {
    t.char_at(pos).map(is_whitespace).unwrap_or(false)
}

/// Clamp a possibly-negative offset into `[0, max]`.
pub fn clean_pos(pos: isize, max: usize) -> usize {
    pos.clamp(0, max as isize) as usize
}

/// Offset of the first char of the line containing `pos`.
pub fn find_start_of_line(t: &FlatText, pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    let start = t
        .last_index_of('\n', pos - 1)
        .map(|nl| nl + 1)
        .unwrap_or(0);
    start.min(pos)
}

/// Offset of the newline ending the line containing `pos`, or end-of-buffer
/// if the final line has none.
pub fn find_end_of_line(t: &FlatText, pos: usize) -> usize {
    t.index_of('\n', pos).unwrap_or(t.len())
}

/// Column of `pos` within its line.
pub fn find_col(t: &FlatText, pos: usize) -> usize {
    pos - find_start_of_line(t, pos)
}

/// Skip spaces and tabs forward from `pos`, stopping at a newline or any
/// other char. This is the "first non-blank" used by `^`, `I`, and linewise
/// cursor placement.
pub fn first_non_blank(t: &FlatText, pos: usize) -> usize {
    let max = t.len();
    let mut pos = pos;
    while pos < max {
        match t.char_at(pos) {
            Some('\n') => break,
            Some(' ') | Some('\t') => pos += 1,
            _ => break,
        }
    }
    pos.min(max)
}

/// Back up over whitespace so `pos` lands just after the previous
/// non-whitespace char. Used by `cw` to leave trailing space behind.
pub fn find_prev_whitespace_start(t: &FlatText, pos: usize) -> usize {
    let mut pos = pos;
    while pos > 0 && ws_at(t, pos - 1) {
        pos -= 1;
    }
    pos
}

/// End of the next word: skips leading whitespace then runs to the last char
/// of the same class.
pub fn find_next_word_end(t: &FlatText, orig: usize, strict: bool) -> usize {
    let max = t.len();
    let mut pos = orig + 1;
    while pos < max && ws_at(t, pos) {
        pos += 1;
    }
    let orig_class = class_at(t, pos, strict);
    while pos + 1 < max && class_at(t, pos + 1, strict) == orig_class {
        pos += 1;
    }
    pos.min(max)
}

/// Start of the next word: runs off the current same-class run, then skips
/// whitespace.
pub fn find_next_word_start(t: &FlatText, orig: usize, strict: bool) -> usize {
    let max = t.len();
    let mut pos = orig;
    let orig_class = class_at(t, pos, strict);
    pos += 1;
    while pos < max && class_at(t, pos, strict) == orig_class {
        pos += 1;
    }
    while pos < max && ws_at(t, pos) {
        pos += 1;
    }
    pos.min(max)
}

/// Like `find_next_word_start` but refuses to run past a newline; used for
/// the final hop of an operator-argument `w`/`W` so `cw`/`dw` at the end of
/// a line do not swallow the newline.
pub fn find_next_word_start_or_newline(t: &FlatText, orig: usize, strict: bool) -> usize {
    if t.char_at(orig) == Some('\n') {
        return orig;
    }
    let max = t.len();
    let mut pos = orig;
    let orig_class = class_at(t, pos, strict);
    pos += 1;
    while pos < max {
        match t.char_at(pos) {
            Some('\n') => break,
            Some(c) if classify(c, strict) != orig_class => break,
            _ => pos += 1,
        }
    }
    while pos < max {
        match t.char_at(pos) {
            Some('\n') => break,
            Some(c) if !is_whitespace(c) => break,
            _ => pos += 1,
        }
    }
    pos.min(max)
}

/// Start of the previous word: skip whitespace backward, then run to the
/// start of the same-class run.
pub fn find_prev_word_start(t: &FlatText, orig: usize, strict: bool) -> usize {
    let mut pos = orig;
    while pos > 0 && ws_at(t, pos - 1) {
        pos -= 1;
    }
    if pos == 0 {
        return 0;
    }
    let orig_class = class_at(t, pos - 1, strict);
    while pos > 0 && class_at(t, pos - 1, strict) == orig_class {
        pos -= 1;
    }
    pos
}

/// Apply `f` up to `mul` times, stopping early once it makes no progress.
pub fn loop_motion<F>(t: &FlatText, mul: usize, start: usize, f: F) -> usize
where
    F: Fn(&FlatText, usize) -> usize,
{
    let mut orig = start;
    let mut pos = start;
    for _ in 0..mul {
        pos = f(t, orig);
        if pos == orig {
            break;
        }
        orig = pos;
    }
    pos
}

/// Horizontal displacement stopping at line boundaries (the `h`/`l` family).
pub fn cursor_dx(t: &FlatText, pos: usize, delta: isize) -> usize {
    let max = t.len();
    let mut pos = pos;
    let mut delta = delta;
    if delta > 0 {
        while delta > 0 && pos < max && t.char_at(pos) != Some('\n') {
            delta -= 1;
            pos += 1;
        }
    } else {
        while delta < 0 && pos > 0 && t.char_at(pos - 1) != Some('\n') {
            delta += 1;
            pos -= 1;
        }
    }
    pos
}

/// Start of line `line` (1-based); `None` or `Some(0)` means the last line.
/// `cur` is returned for the degenerate single-line "last line" case.
pub fn goto_line(t: &FlatText, line: Option<usize>, cur: usize) -> usize {
    let len = t.len();
    match line {
        None | Some(0) => {
            let last_newline = if len == 0 {
                None
            } else {
                t.last_index_of('\n', len - 1)
            };
            match last_newline {
                Some(nl) => (nl + 1).min(len),
                None => cur.min(len),
            }
        }
        Some(n) => {
            let mut pos = 0;
            for _ in 1..n {
                if pos >= len {
                    break;
                }
                match t.index_of('\n', pos) {
                    Some(nl) => pos = nl + 1,
                    None => break,
                }
            }
            pos.min(len)
        }
    }
}

/// Pull an offset off a trailing newline or the end of the buffer so the
/// cursor rests on a real char — except on empty lines, which keep the
/// cursor on their newline.
pub fn fixup_end_of_line(t: &FlatText, pos: usize) -> usize {
    let max = t.len();
    let mut pos = pos as isize;
    let at_eol_char = t.char_at(pos as usize) == Some('\n')
        && pos > 0
        && t.char_at(pos as usize - 1) != Some('\n');
    if pos as usize == max || at_eol_char {
        pos -= 1;
    }
    clean_pos(pos, max)
}

/// Step back one char unless that would cross a line boundary. Used when
/// leaving insert mode.
pub fn safe_back_up(t: &FlatText, pos: usize) -> usize {
    let mut pos = pos;
    if pos > 0 && t.char_at(pos - 1) != Some('\n') {
        pos -= 1;
    }
    clean_pos(pos as isize, t.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> FlatText {
        FlatText::new(s.to_string())
    }

    #[test]
    fn line_boundaries() {
        let b = t("foo bar\nbaz\n");
        assert_eq!(find_start_of_line(&b, 0), 0);
        assert_eq!(find_start_of_line(&b, 5), 0);
        assert_eq!(find_start_of_line(&b, 8), 8);
        assert_eq!(find_start_of_line(&b, 10), 8);
        assert_eq!(find_end_of_line(&b, 0), 7);
        assert_eq!(find_end_of_line(&b, 8), 11);
        assert_eq!(find_col(&b, 10), 2);
    }

    #[test]
    fn end_of_line_without_trailing_newline() {
        let b = t("abc");
        assert_eq!(find_end_of_line(&b, 1), 3);
    }

    #[test]
    fn first_non_blank_stops_at_newline() {
        let b = t("   x\n\t\n");
        assert_eq!(first_non_blank(&b, 0), 3);
        assert_eq!(first_non_blank(&b, 5), 5); // blank line keeps the newline
    }

    #[test]
    fn word_forward_strict_vs_loose() {
        let b = t("foo.bar baz");
        // strict: '.' is its own word
        assert_eq!(find_next_word_start(&b, 0, true), 3);
        assert_eq!(find_next_word_start(&b, 3, true), 4);
        // loose: foo.bar is one word
        assert_eq!(find_next_word_start(&b, 0, false), 8);
    }

    #[test]
    fn word_end_skips_leading_whitespace() {
        let b = t("foo  bar");
        assert_eq!(find_next_word_end(&b, 2, true), 7);
    }

    #[test]
    fn word_backward() {
        let b = t("foo bar baz");
        assert_eq!(find_prev_word_start(&b, 8, true), 4);
        assert_eq!(find_prev_word_start(&b, 4, true), 0);
        assert_eq!(find_prev_word_start(&b, 0, true), 0);
    }

    #[test]
    fn word_start_or_newline_stops_at_eol() {
        let b = t("foo\nbar");
        // from 'f', the hop would cross the newline; it stops on it instead
        assert_eq!(find_next_word_start_or_newline(&b, 0, true), 3);
        // already on the newline: no movement
        assert_eq!(find_next_word_start_or_newline(&b, 3, true), 3);
        // plain variant hops across
        assert_eq!(find_next_word_start(&b, 0, true), 4);
    }

    #[test]
    fn dx_stops_at_line_boundary() {
        let b = t("ab\ncd");
        assert_eq!(cursor_dx(&b, 0, 5), 2);
        assert_eq!(cursor_dx(&b, 4, -5), 3);
    }

    #[test]
    fn goto_line_variants() {
        let b = t("one\ntwo\nthree\n");
        assert_eq!(goto_line(&b, Some(1), 0), 0);
        assert_eq!(goto_line(&b, Some(2), 0), 4);
        assert_eq!(goto_line(&b, Some(99), 0), 14);
        // last line of a trailing-newline buffer is the empty final line
        assert_eq!(goto_line(&b, None, 5), 14);
    }

    #[test]
    fn fixup_pulls_off_newline_and_eob() {
        let b = t("ab\n\ncd");
        assert_eq!(fixup_end_of_line(&b, 2), 1); // trailing newline of "ab"
        assert_eq!(fixup_end_of_line(&b, 3), 3); // empty line keeps its newline
        assert_eq!(fixup_end_of_line(&b, 6), 5); // end of buffer
        assert_eq!(fixup_end_of_line(&b, 1), 1);
    }

    #[test]
    fn fixup_on_empty_buffer() {
        let b = t("");
        assert_eq!(fixup_end_of_line(&b, 0), 0);
    }

    #[test]
    fn safe_back_up_respects_line_start() {
        let b = t("ab\ncd");
        assert_eq!(safe_back_up(&b, 5), 4);
        assert_eq!(safe_back_up(&b, 3), 3);
        assert_eq!(safe_back_up(&b, 0), 0);
    }
}
