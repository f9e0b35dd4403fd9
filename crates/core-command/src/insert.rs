//! Text-entry handling for insert and overwrite modes.
//!
//! Printable keystrokes bypass the command decoder. The handler peeks ahead
//! into the session queue so a burst of typing delivered in one flush is
//! spliced into the buffer as a single operation (queued backspaces cancel
//! the tail of the batch before it ever touches the buffer). Everything
//! typed also accumulates into the insert register, which is what Esc-time
//! count repetition and `.` replay.
//!
//! Overwrite mode keeps two pieces of bookkeeping: the text it replaced
//! (`over`), so backspace can restore it, and the count of chars appended
//! past end-of-line (`over_extend`), which backspace must simply remove.

use crate::ctx::Ctx;
use crate::Flow;
use core_input::{keys, Keystroke};
use core_state::{Mode, RegName};

fn is_printable(c: char) -> bool {
    c >= ' ' || c == keys::TAB || c == keys::LF
}

impl Ctx<'_> {
    pub(crate) fn text_entry_input(&mut self, c: char) -> Flow<()> {
        let mode = self.sess.vars.mode;
        if is_printable(c) {
            let mut batch: Vec<char> = vec![c];
            loop {
                let next = match self.sess.queue.peek() {
                    Some(Keystroke::Char(pc)) => pc,
                    _ => break,
                };
                if is_printable(next) {
                    batch.push(next);
                    self.sess.queue.pop();
                    continue;
                }
                if next == keys::BS && !batch.is_empty() {
                    batch.pop();
                    self.sess.queue.pop();
                    continue;
                }
                break;
            }
            if !batch.is_empty() {
                let input: String = batch.into_iter().collect();
                let len = input.chars().count();
                self.win.registers.append_insert(&input);
                let pos = self.cursor_pos();
                let mut end = pos;
                if mode == Mode::Overwrite {
                    let max = self.max_pos();
                    let mut extend = self.sess.vars.over_extend;
                    for i in 0..len {
                        if pos + i < max && self.char_at(pos + i) != Some('\n') {
                            end += 1;
                        } else {
                            // Extending the line despite overwrite mode;
                            // backspace must not restore anything for these.
                            extend += len - i;
                            break;
                        }
                    }
                    self.sess.vars.over_extend = extend;
                }
                let removed = self.replace_range(pos, end, &input);
                self.set_cursor_pos(pos + len);
                if mode == Mode::Overwrite {
                    self.sess.vars.over.push_str(&removed);
                }
            }
            return Ok(());
        }
        if c == keys::BS {
            let mut count = 1;
            while let Some(Keystroke::Char(keys::BS)) = self.sess.queue.peek() {
                self.sess.queue.pop();
                count += 1;
            }
            self.handle_backspace(mode, count);
            return Ok(());
        }
        if c == keys::CTRL_U {
            self.handle_ctrl_u(mode);
            return Ok(());
        }
        // Other control chars are inert during text entry.
        Ok(())
    }

    /// Backspace over the last `count` chars of the current entry run. Only
    /// freshly typed text can be erased; at the run boundary the bell rings.
    pub(crate) fn handle_backspace(&mut self, mode: Mode, count: usize) {
        let ins = self.get_reg(Some(RegName::Insert)).text;
        let typed = ins.chars().count();
        let mut beep = true;
        if typed > 0 {
            let mut count = count;
            if count <= typed {
                beep = false;
            } else {
                count = typed;
            }
            let kept: String = ins.chars().take(typed - count).collect();
            self.win.registers.set(RegName::Insert, kept, false);
            let mut put_back = String::new();
            let mut put_back_len = 0usize;
            if mode == Mode::Overwrite {
                let mut overage = self.sess.vars.over_extend;
                if overage >= count {
                    overage -= count;
                } else {
                    put_back_len = count - overage;
                    overage = 0;
                    let over_len = self.sess.vars.over.chars().count();
                    let cut = over_len.saturating_sub(put_back_len);
                    put_back = self.sess.vars.over.chars().skip(cut).collect();
                    self.sess.vars.over = self.sess.vars.over.chars().take(cut).collect();
                }
                self.sess.vars.over_extend = overage;
            }
            let pos = self.cursor_pos().saturating_sub(count);
            self.replace_range_no_undo(pos, pos + count, &put_back, false);
            let buffer_cleared = self.selection().1 == 0;
            self.sess
                .undo
                .trim(mode == Mode::Overwrite, count, put_back_len, buffer_cleared);
            self.set_cursor_pos(pos);
        }
        if beep {
            self.bell();
        }
    }

    /// Ctrl-U: erase the current entry run back to the last inserted
    /// newline, or all of it.
    pub(crate) fn handle_ctrl_u(&mut self, mode: Mode) {
        let ins = self.get_reg(Some(RegName::Insert)).text;
        let chars: Vec<char> = ins.chars().collect();
        if chars.is_empty() {
            self.bell();
            return;
        }
        let upto = chars.len().saturating_sub(2);
        let newline = chars[..=upto].iter().rposition(|&c| c == '\n');
        let count = match newline {
            None => chars.len(),
            // Keep the newline itself when anything follows it.
            Some(idx) => (chars.len() - idx - 1).max(1),
        };
        self.handle_backspace(mode, count);
    }
}
