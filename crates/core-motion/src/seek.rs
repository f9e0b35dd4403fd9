//! In-line char seeking (`f`, `F`, `t`, `T` and `;`).
//!
//! A seek finds the count'th occurrence of a literal char on the current
//! line, never crossing a newline. `t`/`T` are the exclusive ("till")
//! variants. Whether the result is nudged for inclusivity depends on whether
//! the seek serves an operator: a bare `t` rests one before the target while
//! `dt` already excludes it, and `df` must extend one past the target to
//! consume it.

use core_surface::FlatText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekKind {
    /// `f` — onto the char, forward.
    ToForward,
    /// `F` — onto the char, backward.
    ToBackward,
    /// `t` — till just before the char, forward.
    TillForward,
    /// `T` — till just after the char, backward.
    TillBackward,
}

impl SeekKind {
    pub fn forward(self) -> bool {
        matches!(self, SeekKind::ToForward | SeekKind::TillForward)
    }

    pub fn till(self) -> bool {
        matches!(self, SeekKind::TillForward | SeekKind::TillBackward)
    }
}

/// Locate the `mul`'th occurrence of `target` from `pos` on the current
/// line. `operator` selects the operator-argument inclusivity adjustment.
/// `None` when there are not enough occurrences before the line boundary.
pub fn seek(
    t: &FlatText,
    pos: usize,
    mul: usize,
    kind: SeekKind,
    target: char,
    operator: bool,
) -> Option<usize> {
    let max = t.len();
    if kind.forward() {
        let mut found = 0;
        let mut p = pos + 1;
        while p < max {
            let c = t.char_at(p)?;
            if c == target {
                found += 1;
                if found == mul {
                    let mut new_pos = p;
                    if kind.till() && !operator {
                        new_pos -= 1;
                    } else if !kind.till() && operator {
                        new_pos += 1;
                    }
                    return Some(new_pos);
                }
            } else if c == '\n' {
                return None;
            }
            p += 1;
        }
        None
    } else {
        let mut found = 0;
        let mut p = pos;
        while p > 0 {
            p -= 1;
            let c = t.char_at(p)?;
            if c == target {
                found += 1;
                if found == mul {
                    let mut new_pos = p;
                    if kind.till() {
                        new_pos += 1;
                    }
                    return Some(new_pos);
                }
            } else if c == '\n' {
                return None;
            }
        }
        None
    }
}
