//! Coalesced undo/redo history for one surface.
//!
//! Edits are reported here as they happen (`add_edit`) and coalesce into a
//! single growing unit while they stay contiguous — an insert run, an
//! overwrite run, a delete. A non-contiguous edit commits the in-progress
//! record and opens a fresh one. The command layer calls `commit` at every
//! return to command mode that is not itself an undo/redo, which is what
//! makes one user-visible action undo as one step.
//!
//! A unit stores the range `[start, end)` of the *current* text that must be
//! replaced with `text` to restore the previous state. Replaying a record
//! (units in reverse order) therefore restores the pre-record buffer, and
//! the replaced spans become the inverse record for the opposite stack.
//!
//! Invariants:
//! * at most one in-progress unit exists; `commit` leaves none;
//! * any committed record has at least one unit;
//! * pushing a new unit clears the redo stack.

use tracing::{error, trace};

/// One reversible splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoUnit {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Cursor position before an `o`/`O` so undo can restore it.
    pub open_line_origin: Option<usize>,
}

/// Units applied together as one user-visible action.
#[derive(Debug, Clone, Default)]
pub struct UndoRecord {
    units: Vec<UndoUnit>,
}

impl UndoRecord {
    pub fn push(&mut self, unit: UndoUnit) {
        self.units.push(unit);
    }

    pub fn pop(&mut self) -> Option<UndoUnit> {
        self.units.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }
}

#[derive(Debug, Default)]
struct PendingUnit {
    start: usize,
    end: usize,
    text: String,
}

/// Undo/redo stacks plus the in-progress coalescing unit.
#[derive(Debug, Default)]
pub struct UndoManager {
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    pending: Option<PendingUnit>,
    /// Text removed by the Delete key during text entry; replayed by `.`.
    pending_del_chars: String,
    open_line_origin: Option<usize>,
    record: Option<UndoRecord>,
    /// Vi-style undo bookkeeping: true while the last `u` was an undo, so
    /// the next `u` redoes (when the vi undo style is configured).
    pub undoing: bool,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record one splice: `[start, end)` of the current text replaced with
    /// `text` restores the prior state. Contiguous follow-ups grow the
    /// pending unit; anything else commits and starts over.
    pub fn add_edit(&mut self, start: usize, end: usize, text: String) {
        self.add_edit_inner(start, end, text, false);
    }

    fn add_edit_inner(&mut self, start: usize, mut end: usize, text: String, recursing: bool) {
        match &mut self.pending {
            None => {
                self.pending = Some(PendingUnit { start, end, text });
            }
            Some(cur) => {
                if end <= start {
                    error!(target: "state.undo", start, end, "follow-up edit with empty span");
                    return;
                }
                if start != cur.end {
                    if start + 1 == cur.end {
                        // Chasing the newline inserted by an open-line: the
                        // insert lands one before the pending end.
                        end += 1;
                    } else {
                        if recursing {
                            error!(target: "state.undo", "incompatible edit after commit");
                            return;
                        }
                        // Non-contiguous (mouse moved the caret mid-insert,
                        // or the host mutated the buffer): seal what we have
                        // and restart.
                        self.commit();
                        self.add_edit_inner(start, end, text, true);
                        return;
                    }
                } else if !text.is_empty() {
                    // Overwrite mode: keep accumulating replaced text.
                    cur.text.push_str(&text);
                }
                cur.end = end;
            }
        }
    }

    /// Record text removed by the Delete key just past the pending unit.
    pub fn add_del_chars(&mut self, pos: usize, deleted: &str) {
        self.pending_del_chars.push_str(deleted);
        if self.pending.is_none() {
            self.pending = Some(PendingUnit {
                start: pos,
                end: pos,
                text: String::new(),
            });
        }
    }

    /// Shrink the pending unit after a backspace removed `count` chars of
    /// fresh input; `put_back_len` chars of overwritten text were restored
    /// to the buffer. `buffer_cleared` tolerates a host that emptied the
    /// widget underneath us.
    pub fn trim(
        &mut self,
        is_overwrite: bool,
        count: usize,
        put_back_len: usize,
        buffer_cleared: bool,
    ) {
        let cur = match &mut self.pending {
            Some(cur) => cur,
            None => {
                error!(target: "state.undo", "trim with no pending unit");
                return;
            }
        };
        if cur.end <= cur.start {
            if buffer_cleared {
                cur.end = cur.start;
            } else {
                error!(target: "state.undo", "trim on empty pending unit");
                return;
            }
        } else {
            cur.end -= count;
        }
        if is_overwrite && put_back_len > 0 {
            let have = cur.text.chars().count();
            if have < put_back_len {
                error!(target: "state.undo", have, put_back_len, "overwrite trim underflow");
                return;
            }
            cur.text = cur.text.chars().take(have - put_back_len).collect();
        }
    }

    /// Note the pre-command cursor of an `o`/`O` for undo cursor placement.
    pub fn set_open_line_origin(&mut self, pos: usize) {
        self.open_line_origin = Some(pos);
    }

    /// Amount of Delete-key text attached to the pending unit.
    pub fn pending_del_len(&self) -> usize {
        self.pending_del_chars.chars().count()
    }

    /// Seal the pending unit (if any) into the in-progress record. Any new
    /// unit invalidates the redo stack.
    fn push_unit(&mut self) {
        if self.pending.is_none() && self.pending_del_chars.is_empty() {
            return;
        }
        self.undoing = false;
        let cur = self.pending.take().unwrap_or_default();
        let mut text = cur.text;
        text.push_str(&self.pending_del_chars);
        self.pending_del_chars.clear();
        let unit = UndoUnit {
            start: cur.start,
            end: cur.end,
            text,
            open_line_origin: self.open_line_origin.take(),
        };
        self.record.get_or_insert_with(UndoRecord::default).push(unit);
        self.redo_stack.clear();
    }

    /// Commit the in-progress record to the undo stack.
    pub fn commit(&mut self) {
        self.push_unit();
        if let Some(rec) = self.record.take() {
            trace!(
                target: "state.undo",
                units = rec.len(),
                depth = self.undo_stack.len() + 1,
                "commit"
            );
            self.undo_stack.push(rec);
        }
    }

    /// Pop the newest record for replay. The replayed inverse goes back via
    /// `push_inverse_*`, which deliberately does not clear the redo stack.
    pub fn pop_for_undo(&mut self) -> Option<UndoRecord> {
        let rec = self.undo_stack.pop();
        if rec.is_some() {
            trace!(target: "state.undo", depth = self.undo_stack.len(), "undo_pop");
        }
        rec
    }

    pub fn pop_for_redo(&mut self) -> Option<UndoRecord> {
        let rec = self.redo_stack.pop();
        if rec.is_some() {
            trace!(target: "state.undo", depth = self.redo_stack.len(), "redo_pop");
        }
        rec
    }

    pub fn push_inverse_redo(&mut self, rec: UndoRecord) {
        self.redo_stack.push(rec);
    }

    pub fn push_inverse_undo(&mut self, rec: UndoRecord) {
        self.undo_stack.push(rec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_edits_coalesce() {
        let mut u = UndoManager::new();
        // typing "ab": each insert replaces nothing
        u.add_edit(0, 1, String::new());
        u.add_edit(1, 2, String::new());
        u.commit();
        let mut rec = u.pop_for_undo().expect("one record");
        assert_eq!(rec.len(), 1);
        let unit = rec.pop().unwrap();
        assert_eq!((unit.start, unit.end), (0, 2));
        assert_eq!(unit.text, "");
    }

    #[test]
    fn gap_forces_new_record() {
        let mut u = UndoManager::new();
        u.add_edit(0, 1, String::new());
        u.add_edit(5, 6, String::new());
        u.commit();
        // the first record was committed by the incompatible edit
        assert_eq!(u.undo_depth(), 2);
    }

    #[test]
    fn open_line_newline_chase_extends_unit() {
        let mut u = UndoManager::new();
        // o inserts "\n" at 4: unit [4,5)
        u.add_edit(4, 5, String::new());
        // first typed char goes at 4 (one before pending end)
        u.add_edit(4, 5, String::new());
        u.commit();
        let mut rec = u.pop_for_undo().unwrap();
        let unit = rec.pop().unwrap();
        assert_eq!((unit.start, unit.end), (4, 6));
        assert_eq!(u.undo_depth(), 0);
    }

    #[test]
    fn trim_shrinks_pending() {
        let mut u = UndoManager::new();
        u.add_edit(0, 3, String::new());
        u.trim(false, 2, 0, false);
        u.commit();
        let mut rec = u.pop_for_undo().unwrap();
        let unit = rec.pop().unwrap();
        assert_eq!((unit.start, unit.end), (0, 1));
    }

    #[test]
    fn overwrite_trim_restores_text() {
        let mut u = UndoManager::new();
        u.add_edit(0, 2, "xy".to_string());
        u.trim(true, 1, 1, false);
        u.commit();
        let mut rec = u.pop_for_undo().unwrap();
        let unit = rec.pop().unwrap();
        assert_eq!((unit.start, unit.end), (0, 1));
        assert_eq!(unit.text, "x");
    }

    #[test]
    fn commit_clears_redo() {
        let mut u = UndoManager::new();
        u.add_edit(0, 1, String::new());
        u.commit();
        let rec = u.pop_for_undo().unwrap();
        u.push_inverse_redo(rec);
        assert_eq!(u.redo_depth(), 1);
        u.add_edit(1, 2, String::new());
        u.commit();
        assert_eq!(u.redo_depth(), 0);
    }

    #[test]
    fn empty_commit_is_a_noop() {
        let mut u = UndoManager::new();
        u.commit();
        assert_eq!(u.undo_depth(), 0);
    }

    #[test]
    fn del_chars_attach_to_unit() {
        let mut u = UndoManager::new();
        u.add_del_chars(3, "x");
        u.add_del_chars(3, "y");
        u.commit();
        let mut rec = u.pop_for_undo().unwrap();
        let unit = rec.pop().unwrap();
        assert_eq!((unit.start, unit.end), (3, 3));
        assert_eq!(unit.text, "xy");
    }
}
