//! Interpreter context: one window + one session + one surface, assembled
//! for the duration of a queue drain.
//!
//! The context owns the text snapshot cache. Every splice goes through
//! `replace_range*`, which invalidates the snapshot, so reads after a
//! mutation always see the host's current value — a host widget can mutate
//! its own buffer underneath us and the next read picks it up.

use crate::decode;
use crate::session::Session;
use crate::vars::Verb;
use crate::{Abort, HostRegister, Window};
use core_motion as motion;
use core_state::{Mode, RegName, Register};
use core_surface::{FlatText, Surface};
use std::rc::Rc;
use tracing::{error, trace};

pub(crate) struct Ctx<'a> {
    pub win: &'a mut Window,
    pub sess: &'a mut Session,
    pub surface: &'a mut dyn Surface,
    snapshot: Option<Rc<FlatText>>,
}

impl<'a> Ctx<'a> {
    pub fn new(win: &'a mut Window, sess: &'a mut Session, surface: &'a mut dyn Surface) -> Self {
        Self {
            win,
            sess,
            surface,
            snapshot: None,
        }
    }

    // ----- buffer access -------------------------------------------------

    /// Current text snapshot (rebuilt after any mutation).
    pub fn text(&mut self) -> Rc<FlatText> {
        if self.snapshot.is_none() {
            self.snapshot = Some(Rc::new(FlatText::new(self.surface.text())));
        }
        self.snapshot.as_ref().unwrap().clone()
    }

    fn invalidate(&mut self) {
        self.snapshot = None;
    }

    pub fn max_pos(&mut self) -> usize {
        self.text().len()
    }

    pub fn char_at(&mut self, pos: usize) -> Option<char> {
        self.text().char_at(pos)
    }

    pub fn get_range(&mut self, start: usize, end: usize) -> String {
        self.text().slice(start, end).to_string()
    }

    // ----- mutation ------------------------------------------------------

    /// Splice without recording undo (used by undo replay itself and by
    /// backspace, which trims the pending record instead).
    pub fn replace_range_no_undo(
        &mut self,
        start: usize,
        end: usize,
        new_text: &str,
        save_col: bool,
    ) -> String {
        if !save_col {
            self.sess.vars.col = None;
        }
        let removed = self.surface.replace_range(start, end, new_text);
        self.invalidate();
        removed
    }

    /// Splice and record the inverse edit.
    pub fn replace_range(&mut self, start: usize, end: usize, new_text: &str) -> String {
        let removed = self.replace_range_no_undo(start, end, new_text, false);
        self.sess
            .undo
            .add_edit(start, start + new_text.chars().count(), removed.clone());
        removed
    }

    /// Delete `count` chars at `start`, keeping the cursor put. Recorded as
    /// Delete-key removal so `.` can replay it.
    pub fn delete_chars(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        let pos = self.cursor_pos();
        let max = self.max_pos();
        let end = (start + count).min(max);
        let removed = self.replace_range_no_undo(start, end, "", false);
        self.sess.undo.add_del_chars(start, &removed);
        self.set_cursor_pos(pos);
    }

    // ----- selection / cursor -------------------------------------------

    pub fn selection(&self) -> (usize, usize) {
        self.surface.selection()
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.surface.set_selection(start, end);
    }

    /// Cursor position: the visual extent while a selection is live, the
    /// selection end otherwise.
    pub fn cursor_pos(&self) -> usize {
        self.sess
            .vars
            .visual_end
            .unwrap_or_else(|| self.surface.selection().1)
    }

    /// Move the cursor; in visual mode this drags the extent and repaints
    /// the highlight instead of collapsing the selection.
    pub fn set_cursor_pos(&mut self, pos: usize) {
        if self.sess.vars.visual_end.is_some() {
            self.sess.vars.visual_end = Some(pos);
            self.highlight_visual_range();
        } else {
            self.set_selection(pos, pos);
        }
    }

    // ----- registers -----------------------------------------------------

    pub fn get_reg(&mut self, name: Option<RegName>) -> Register {
        self.win.registers.get(name.unwrap_or(RegName::Default))
    }

    pub fn reg_is_linewise(&self, name: Option<RegName>) -> bool {
        self.win
            .registers
            .is_linewise(name.unwrap_or(RegName::Default))
    }

    /// Write a register. `+`/`*` push through to the host; the local slot
    /// keeps the last-known value so later reads stay synchronous.
    pub fn set_reg(&mut self, name: RegName, text: &str, linewise: bool) {
        let host = match name {
            RegName::Clipboard => Some(HostRegister::Clipboard),
            RegName::Selection => Some(HostRegister::Selection),
            _ => None,
        };
        if let Some(which) = host {
            if let Some(cb) = self.win.clipboard_mut() {
                cb.store(which, text);
            }
        }
        self.win.registers.set(name, text, linewise);
    }

    // ----- host feedback -------------------------------------------------

    pub fn bell(&mut self) {
        trace!(target: "command.dispatch", "bell");
        if self.win.config.visual_bell {
            self.win.notifier_mut().bell();
        }
    }

    /// Invariant diagnostics: always logged, surfaced to the host only when
    /// configured.
    pub fn diag(&mut self, message: &str) {
        error!(target: "command.invariant", message);
        if self.win.config.diagnostic_alerts {
            self.win.notifier_mut().diagnostic(message);
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode.is_text_entry() {
            self.sess.vars.col = None;
        }
        self.sess.vars.mode = mode;
        self.notify_mode();
    }

    pub fn notify_mode(&mut self) {
        let mode = self.sess.vars.mode;
        let visual = self.sess.vars.visual;
        self.win.notifier_mut().mode_changed(mode, visual);
    }

    // ----- command boundaries -------------------------------------------

    /// Abort the in-progress command: bell, reset state, collapse any
    /// selection, back to command mode. The returned `Abort` is propagated
    /// with `?` up to the queue drain.
    pub fn abort(&mut self) -> Abort {
        self.abort_with(false)
    }

    pub fn abort_quiet(&mut self) -> Abort {
        self.abort_with(true)
    }

    fn abort_with(&mut self, quiet: bool) -> Abort {
        if !quiet {
            self.bell();
        }
        self.sess.vars.clear_command(true);
        let pos = self.cursor_pos();
        self.set_cursor_pos(pos);
        self.set_mode(Mode::Command);
        trace!(target: "command.dispatch", quiet, "command aborted");
        Abort
    }

    /// Freeze the current command into the `last` block for `.`. A repeat
    /// keeps the stored command, with a freshly typed count taking over.
    pub fn store_cmd_vars(&mut self) {
        let v = &mut self.sess.vars;
        if v.cmd == Some(Verb::Repeat) {
            v.last.mul = v.mul.or(v.last.mul);
        } else {
            v.last.cmd = v.cmd;
            v.last.reg = v.reg;
            v.last.mul = v.mul;
            v.last.motion = v.motion;
            v.last.literal = v.literal;
            v.last.seek = v.seek;
            v.last.seek_char = v.seek_char;
            v.last.search = v.search;
            v.last.search_str = v.search_str.clone();
            // Delete-key repeat chars are only known once the insert phase
            // runs; they accumulate directly into `last`.
            v.last.del_chars = 0;
            v.last.visual_dx = v.visual_dx;
            v.last.visual_dy = v.visual_dy;
            v.last.visual_used = v.visual_used;
        }
    }

    /// Boundary for commands that never passed through text entry.
    /// Returns true when the finished command was undo/redo (those must not
    /// commit a fresh undo record).
    pub fn end_non_text_command(&mut self, repeatable: bool, mode: Mode) -> bool {
        if repeatable {
            self.store_cmd_vars();
        }
        let was_undo_redo = matches!(self.sess.vars.cmd, Some(Verb::Undo) | Some(Verb::Redo));
        self.sess.vars.clear_command(false);
        if mode == Mode::Insert {
            self.win.registers.set(RegName::Insert, "", false);
        } else if mode == Mode::Overwrite {
            self.win.registers.set(RegName::Insert, "", false);
            self.sess.vars.over.clear();
            self.sess.vars.over_extend = 0;
        }
        was_undo_redo
    }

    /// The normal end of a command. When leaving insert/overwrite this also
    /// applies the count-repetition of the typed text (`3ifoo<Esc>`).
    /// `special` marks the arrow-key-in-insert escape hatch, which skips the
    /// multiplier machinery entirely.
    pub fn end_command(&mut self, mode: Mode, repeatable: bool, special: bool) {
        let cur_mode = self.sess.vars.mode;
        let mut was_undo_redo = false;
        if cur_mode.is_text_entry() {
            let old_cmd = self.sess.vars.last.cmd;
            let reps = self.sess.vars.last.mul.unwrap_or(1).saturating_sub(1);
            let start = self.cursor_pos();
            let mut end = start;
            let repeatable_insert = old_cmd.map(decode::is_repeatable_insert).unwrap_or(false);
            if !special && reps > 0 && repeatable_insert {
                let ins = self.get_reg(Some(RegName::Insert)).text;
                if !ins.is_empty() {
                    let mut new_text = ins;
                    if matches!(old_cmd, Some(Verb::OpenBelow) | Some(Verb::OpenAbove)) {
                        new_text.insert(0, '\n');
                    }
                    let single = new_text.clone();
                    for _ in 1..reps {
                        new_text.push_str(&single);
                    }
                    let end_pos = start + new_text.chars().count();
                    if cur_mode == Mode::Overwrite {
                        end = end_pos;
                        let old_text = self.get_range(start, end);
                        if let Some(eoln) = old_text.chars().position(|c| c == '\n') {
                            // Overwrite repetition never runs past the line.
                            end = start + eoln;
                        }
                    }
                    self.replace_range(start, end, &new_text);
                    self.set_cursor_pos(end_pos);
                }
            }
            if !special {
                let t = self.text();
                let pos = motion::safe_back_up(&t, self.cursor_pos());
                self.set_cursor_pos(pos);
            }
            self.sess.vars.col = None;
            if special {
                self.sess.vars.last.mul = None;
            }
        } else {
            was_undo_redo = self.end_non_text_command(repeatable, mode);
        }
        self.set_mode(mode);
        if mode == Mode::Command && !was_undo_redo {
            self.sess.undo.commit();
        }
    }

    /// Escape (and Ctrl-C / Ctrl-[): cancel whatever is in progress. A
    /// search cancels back to its starting point without dropping visual
    /// mode; a pending `r` just evaporates; a bare visual selection
    /// collapses to the cursor.
    pub fn handle_esc(&mut self) {
        let search_origin = self.sess.vars.search_start;
        let in_replace =
            self.sess.vars.mode == Mode::Command && self.sess.vars.cmd == Some(Verb::ReplaceChar);
        if let Some(origin) = search_origin {
            self.set_cursor_pos(origin);
        } else if in_replace {
            // nothing to restore
        } else if let Some(extent) = self.sess.vars.visual_end {
            self.sess.vars.clear_visual();
            self.set_cursor_pos(extent);
        }
        self.end_command(Mode::Command, false, false);
    }
}
