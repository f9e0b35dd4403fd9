//! Vertical motion with a remembered target column.
//!
//! `j`/`k` keep the cursor at the column it had before the first vertical
//! move, clamped per-line; `$` pins the column to end-of-line so repeated
//! vertical motion tracks each line's end. The column survives across
//! consecutive vertical motions and is reset by the command layer on any
//! horizontal move or edit.

use crate::{find_end_of_line, find_start_of_line};
use core_surface::FlatText;

/// Remembered column for vertical motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Col {
    Cells(usize),
    /// Always land at end of line (set by `$`).
    EndOfLine,
}

impl Col {
    /// `base + col`, saturating at `cap`; `EndOfLine` goes straight to `cap`.
    fn add_clamped(self, base: usize, cap: usize) -> usize {
        match self {
            Col::Cells(n) => (base + n).min(cap),
            Col::EndOfLine => cap,
        }
    }
}

/// From a line start, move right by `col` or until stopped just short of the
/// newline. An empty line keeps the cursor on its newline.
pub fn find_pos_for_col(t: &FlatText, line_start: usize, col: Col) -> usize {
    let eol = find_end_of_line(t, line_start);
    if eol == line_start {
        return line_start;
    }
    col.add_clamped(line_start, eol - 1)
}

/// Move `delta` lines (negative is up), keeping `col`. Returns the original
/// position when no whole line could be crossed.
pub fn cursor_dy(t: &FlatText, pos: usize, delta: isize, col: Col) -> usize {
    if delta > 0 {
        // Cross up to `delta` newlines, then advance into the target line by
        // at most `col` chars, never past its end.
        let max = t.len();
        let mut p = pos;
        let mut crossed = 0;
        while crossed < delta {
            let eol = find_end_of_line(t, p);
            if eol >= max {
                break;
            }
            p = eol + 1;
            crossed += 1;
        }
        if crossed == 0 {
            return pos;
        }
        col.add_clamped(p, find_end_of_line(t, p))
    } else {
        let mut sol = find_start_of_line(t, pos);
        let mut delta = delta;
        let orig_delta = delta;
        while delta < 0 && sol > 0 {
            sol = find_start_of_line(t, sol - 1);
            delta += 1;
        }
        if orig_delta == delta {
            return pos;
        }
        find_pos_for_col(t, sol, col)
    }
}
