//! Visual-mode selection tracking.
//!
//! Visual is a flag orthogonal to the main mode: count entry, seeks, and
//! searches all keep working while a selection is live. The anchor stays
//! put; the extent follows the cursor (`Ctx::set_cursor_pos` drags it).
//! Operators consume the selection through the `Visual` pseudo-motion; the
//! capital-letter shortcuts convert it into the equivalent doubled linewise
//! command first.

use crate::ctx::Ctx;
use crate::decode;
use crate::vars::{MotionKind, Verb};
use core_motion as motion;
use core_state::VisualKind;

impl Ctx<'_> {
    /// Paint the host selection to match the visual range. Charwise
    /// selections include the extent char (when dragged forward); linewise
    /// selections round out to whole lines including the trailing newline.
    pub(crate) fn highlight_visual_range(&mut self) {
        let max = self.max_pos();
        let kind = self.sess.vars.visual;
        let (mut start, mut end) = match (self.sess.vars.visual_start, self.sess.vars.visual_end) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                self.diag("visual highlight without anchor/extent");
                return;
            }
        };
        if start > end {
            std::mem::swap(&mut start, &mut end);
        } else if kind != Some(VisualKind::Line) {
            end += 1;
        }
        if kind == Some(VisualKind::Line) {
            let t = self.text();
            start = motion::find_start_of_line(&t, start);
            end = motion::find_end_of_line(&t, end);
            if end < max {
                end += 1;
            }
        }
        self.set_selection(start, end);
    }

    /// `v`/`V`: enter visual mode, switch kinds, or leave when the same key
    /// repeats. Entering clears any pending count/register — they belong to
    /// the command the selection will feed.
    pub(crate) fn handle_visual_char(&mut self, c: char) -> bool {
        let kind = match decode::visual_kind(c) {
            Some(k) => k,
            None => return false,
        };
        if let Some(current) = self.sess.vars.visual {
            if current == kind {
                let extent = self.sess.vars.visual_end;
                self.sess.vars.clear_visual();
                if let Some(pos) = extent {
                    self.set_cursor_pos(pos);
                }
            } else {
                self.sess.vars.visual = Some(kind);
                self.highlight_visual_range();
            }
        } else {
            let anchor = self.cursor_pos();
            self.sess.vars.visual_start = Some(anchor);
            self.sess.vars.visual_end = Some(anchor);
            self.sess.vars.visual = Some(kind);
            self.sess.vars.reg = None;
            self.sess.vars.mul = None;
            self.highlight_visual_range();
        }
        self.notify_mode();
        true
    }

    /// Turn the live selection into the doubled form of `verb` (`V` + `d`
    /// becomes `Ndd` for the selected line count) and collapse the
    /// selection to its top.
    pub(crate) fn convert_visual_to_doubled(&mut self, kind: VisualKind, verb: Verb) {
        self.sess.vars.motion = Some(MotionKind::Doubled(verb));
        let (sel_start, sel_end) = self.selection();
        let text = self.get_range(sel_start, sel_end);
        let mut lines = text.split('\n').count();
        if kind == VisualKind::Line && text.ends_with('\n') {
            // V highlights the trailing newline; it is not an extra line.
            lines -= 1;
        }
        self.sess.vars.mul = Some(lines);
        self.sess.vars.cur_num = Some(1);
        let pos = match (self.sess.vars.visual_start, self.sess.vars.visual_end) {
            (Some(a), Some(b)) => a.min(b),
            _ => sel_start,
        };
        self.sess.vars.clear_visual();
        self.set_cursor_pos(pos);
    }

    /// Host-reported caret/selection change (mouse). A range becomes a
    /// charwise visual selection anchored at its start; a bare caret is
    /// normalized off any trailing newline.
    pub(crate) fn adopt_selection(&mut self) {
        self.sess.vars.col = None;
        if self.sess.vars.mode.is_text_entry() {
            return;
        }
        let (start, end) = self.selection();
        if self.sess.vars.visual.is_some() {
            self.sess.vars.clear_visual();
        }
        if start == end {
            let t = self.text();
            let pos = motion::fixup_end_of_line(&t, self.cursor_pos());
            self.set_cursor_pos(pos);
        } else {
            self.sess.vars.visual = Some(VisualKind::Char);
            self.sess.vars.visual_start = Some(start);
            self.sess.vars.visual_end = Some(end);
            self.set_cursor_pos(end.saturating_sub(1));
        }
        self.notify_mode();
    }
}
