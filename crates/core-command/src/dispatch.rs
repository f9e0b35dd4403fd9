//! Keystroke routing across modes.
//!
//! One keystroke at a time comes off the queue and lands here. Printable
//! input in text-entry modes bypasses the decoder entirely (see `insert`);
//! everything else accumulates into `CommandVars` until a command is
//! complete, then `execute` runs it. Any unrecognized sequence aborts.

use crate::ctx::Ctx;
use crate::decode::{self, MotionKey};
use crate::vars::{MotionKind, Verb};
use crate::Flow;
use core_input::{keys, Keystroke, NavKey};
use core_motion::SearchDir;
use core_state::{Mode, RegName, VisualKind};
use tracing::trace;

impl Ctx<'_> {
    /// Drain the session queue in arrival order. An abort drops whatever is
    /// still queued: it belonged to the aborted command context.
    pub(crate) fn drain_queue(&mut self) {
        loop {
            let key = match self.sess.queue.pop() {
                Some(k) => k,
                None => break,
            };
            trace!(target: "command.dispatch", ?key, mode = ?self.sess.vars.mode, "keystroke");
            if self.handle_keystroke(key).is_err() {
                self.sess.queue.clear();
                break;
            }
        }
        // Keep the view pinned when the cursor sits at the very end of the
        // buffer (a `G` to a blank last line, an `A` at a long wrapped one).
        if self.cursor_pos() == self.max_pos() {
            self.surface.scroll_hint_bottom();
        }
    }

    pub(crate) fn handle_keystroke(&mut self, key: Keystroke) -> Flow<()> {
        match key {
            Keystroke::Char(c) => self.handle_char(c, false),
            Keystroke::Nav(k) => self.handle_nav(k),
        }
    }

    /// Route one resolved character by mode. `inhibit_repeatable` marks the
    /// synthetic keys used to emulate arrow motions inside insert mode —
    /// they must not become the `.`-repeatable command.
    pub(crate) fn handle_char(&mut self, c: char, inhibit_repeatable: bool) -> Flow<()> {
        let mode = self.sess.vars.mode;
        let in_replace = mode == Mode::Command && self.sess.vars.cmd == Some(Verb::ReplaceChar);
        if c == keys::ESC || c == keys::CTRL_C {
            self.handle_esc();
            return Ok(());
        }
        if mode.is_text_entry() {
            return self.text_entry_input(c);
        }
        match mode {
            Mode::Command => self.command_mode_input(c, in_replace, inhibit_repeatable),
            Mode::RegisterPending => self.reg_mode_input(c),
            Mode::CountPending => self.num_mode_input(c, false),
            Mode::Seek => self.seek_mode_input(c),
            Mode::Search => self.search_mode_input(c),
            Mode::Insert | Mode::Overwrite => unreachable!("text entry handled above"),
        }
    }

    fn command_mode_input(&mut self, c: char, in_replace: bool, inhibit: bool) -> Flow<()> {
        if self.sess.vars.cmd.is_some() && !in_replace && self.sess.vars.visual.is_some() {
            self.diag("operator pending while a visual selection is active");
        }
        if inhibit && self.sess.vars.visual.is_some() {
            self.diag("synthetic motion while a visual selection is active");
        }
        if in_replace {
            self.sess.vars.literal = Some(c);
            if self.sess.vars.visual.is_some() {
                self.sess.vars.motion = Some(MotionKind::Visual);
            }
            return self.execute(false);
        }
        if self.handle_combo_char(c)? {
            return Ok(());
        }
        if let Some(mk) = decode::motion_key(c) {
            match mk {
                MotionKey::Plain(m) => self.sess.vars.motion = Some(m),
                MotionKey::RepeatSeek => self.prepare_seek_repeat()?,
                MotionKey::SearchAgain { invert } => self.prepare_search_again(invert)?,
            }
            return self.execute(inhibit);
        }
        if self.handle_seek_char(c) || self.handle_search_char(c) || self.handle_visual_char(c) {
            return Ok(());
        }
        if c.is_ascii_digit() {
            return self.handle_leading_digit(c);
        }
        if let Some(pending) = self.sess.vars.cmd {
            // Doubled operator: the second `d` of `dd` and friends.
            if decode::partial_command(c) == Some(pending) {
                self.sess.vars.motion = Some(MotionKind::Doubled(pending));
                return self.execute(false);
            }
            return Err(self.abort());
        }
        if c == '"' {
            self.set_mode(Mode::RegisterPending);
            return Ok(());
        }
        if let Some(verb) = decode::partial_command(c) {
            self.sess.vars.cmd = Some(verb);
            let visual = self.sess.vars.visual;
            if let Some(kind) = visual {
                if verb != Verb::ReplaceChar {
                    match kind {
                        VisualKind::Line => self.convert_visual_to_doubled(kind, verb),
                        VisualKind::Char => self.sess.vars.motion = Some(MotionKind::Visual),
                    }
                    return self.execute(false);
                }
            }
            return Ok(());
        }
        if decode::is_complete_command(c) {
            if !self.decode_command(c) {
                self.sess.vars.cmd = decode::immediate_verb(c);
            }
            if self.sess.vars.visual.is_some() {
                if decode::is_visual_irrelevant(c) {
                    // scrolling works the same with a selection up
                } else if decode::is_visual_compatible(c) {
                    self.sess.vars.motion = Some(MotionKind::Visual);
                } else {
                    return Err(self.abort());
                }
            }
            return self.execute(inhibit);
        }
        Err(self.abort())
    }

    /// Shorthand decode: `C`→`c$`, `D`→`d$`, `Y`→`yy`, `x`→`dl`, `X`→`dh`,
    /// `s`→`cl`, `S`→`cc`; in visual mode the capital forms convert the
    /// selection into the doubled linewise command. Returns false when the
    /// char is a plain complete command needing no rewrite.
    fn decode_command(&mut self, c: char) -> bool {
        let visual = self.sess.vars.visual;
        match c {
            'C' | 'D' | 'Y' => {
                let verb = match c {
                    'C' => Verb::Change,
                    'D' => Verb::Delete,
                    _ => Verb::Yank,
                };
                self.sess.vars.cmd = Some(verb);
                if let Some(kind) = visual {
                    self.convert_visual_to_doubled(kind, verb);
                } else {
                    self.sess.vars.motion = Some(MotionKind::LineEnd);
                }
                true
            }
            'x' => {
                self.sess.vars.cmd = Some(Verb::Delete);
                if visual == Some(VisualKind::Line) {
                    self.convert_visual_to_doubled(VisualKind::Line, Verb::Delete);
                } else {
                    self.sess.vars.motion = Some(MotionKind::Right);
                }
                true
            }
            'X' => {
                self.sess.vars.cmd = Some(Verb::Delete);
                if let Some(kind) = visual {
                    self.convert_visual_to_doubled(kind, Verb::Delete);
                } else {
                    self.sess.vars.motion = Some(MotionKind::Left);
                }
                true
            }
            'R' => {
                if let Some(kind) = visual {
                    self.sess.vars.cmd = Some(Verb::Change);
                    self.convert_visual_to_doubled(kind, Verb::Change);
                    true
                } else {
                    false
                }
            }
            's' => {
                self.sess.vars.cmd = Some(Verb::Change);
                self.sess.vars.motion = Some(MotionKind::Right);
                true
            }
            'S' => {
                self.sess.vars.cmd = Some(Verb::Change);
                if let Some(kind) = visual {
                    self.convert_visual_to_doubled(kind, Verb::Change);
                } else {
                    self.sess.vars.motion = Some(MotionKind::Doubled(Verb::Change));
                }
                true
            }
            _ => false,
        }
    }

    /// Combo prefix handling; currently only `g` (for `gg`). Returns true
    /// when the char was consumed.
    fn handle_combo_char(&mut self, c: char) -> Flow<bool> {
        let pending = self.sess.vars.combo;
        let starts_combo = decode::is_combo_char(c);
        if pending.is_none() && !starts_combo {
            return Ok(false);
        }
        if let Some(prefix) = pending {
            if prefix == 'g' && c == 'g' {
                self.sess.vars.motion = Some(MotionKind::GotoLine);
                if self.sess.vars.mul.is_none() {
                    self.sess.vars.mul = Some(1);
                }
                self.execute(false)?;
            } else {
                return Err(self.abort());
            }
        } else {
            self.sess.vars.combo = Some(c);
        }
        Ok(true)
    }

    /// `;` — re-run the remembered seek in its original direction.
    fn prepare_seek_repeat(&mut self) -> Flow<()> {
        self.sess.vars.motion = Some(MotionKind::Seek);
        match self.win.registers.last_seek() {
            Some((kind, target)) => {
                self.sess.vars.seek = Some(kind);
                self.sess.vars.seek_char = Some(target);
                self.set_mode(Mode::Seek);
                Ok(())
            }
            None => Err(self.abort()),
        }
    }

    /// `n`/`N` — re-run the remembered search, optionally reversed.
    fn prepare_search_again(&mut self, invert: bool) -> Flow<()> {
        self.sess.vars.motion = Some(MotionKind::Search);
        let dir = self.win.registers.last_search_dir();
        let pattern = self.win.registers.get(RegName::SearchPattern).text;
        let dir = match dir {
            Some(d) if !pattern.is_empty() => d,
            _ => return Err(self.abort()),
        };
        let dir = if invert { dir.invert() } else { dir };
        self.sess.vars.search = Some(dir);
        self.sess.vars.search_str = Some(pattern);
        self.set_mode(Mode::Search);
        Ok(())
    }

    /// `f`/`F`/`t`/`T` — next char names the target.
    fn handle_seek_char(&mut self, c: char) -> bool {
        match decode::seek_kind(c) {
            Some(kind) => {
                self.sess.vars.motion = Some(MotionKind::Seek);
                self.sess.vars.seek = Some(kind);
                self.set_mode(Mode::Seek);
                true
            }
            None => false,
        }
    }

    /// `/`/`?` — start collecting a pattern.
    fn handle_search_char(&mut self, c: char) -> bool {
        match decode::search_dir(c) {
            Some(dir) => {
                self.sess.vars.motion = Some(MotionKind::Search);
                self.sess.vars.search_start = Some(self.cursor_pos());
                self.sess.vars.search_str = None;
                self.sess.vars.search = Some(dir);
                self.set_mode(Mode::Search);
                true
            }
            None => false,
        }
    }

    fn handle_leading_digit(&mut self, c: char) -> Flow<()> {
        if c == '0' {
            // A bare 0 is the start-of-line motion, not a count.
            self.sess.vars.motion = Some(MotionKind::LineStart);
            return self.execute(false);
        }
        self.sess.vars.cur_num = Some(c as usize - '0' as usize);
        self.set_mode(Mode::CountPending);
        Ok(())
    }

    /// A digit run is in progress; decide what the next char completes.
    fn num_mode_input(&mut self, c: char, treat_as_non_digit: bool) -> Flow<()> {
        if !treat_as_non_digit && c.is_ascii_digit() {
            let cur = self.sess.vars.cur_num.unwrap_or(0);
            self.sess.vars.cur_num =
                Some(cur.saturating_mul(10).saturating_add(c as usize - '0' as usize));
            return Ok(());
        }

        let reg = self.sess.vars.reg;
        let cmd = self.sess.vars.cmd;
        let mut mul = self.sess.vars.mul;
        let mut should_execute = false;
        let mut should_abort = false;
        let mut new_mode: Option<Mode> = None;
        let mut new_cmd: Option<Verb> = None;
        let mut new_motion: Option<MotionKind> = None;

        if c == '"' {
            if reg.is_none() && cmd.is_none() && mul.is_none() {
                new_mode = Some(Mode::RegisterPending);
            } else {
                // More than one register (or a register mid-command) aborts.
                should_abort = true;
            }
        } else if let Some(verb) = decode::partial_command(c) {
            if cmd.is_none() {
                new_cmd = Some(verb);
                let visual = self.sess.vars.visual;
                if visual.is_some() && verb != Verb::ReplaceChar {
                    if visual == Some(VisualKind::Line) {
                        self.convert_visual_to_doubled(VisualKind::Line, verb);
                    } else {
                        self.sess.vars.motion = Some(MotionKind::Visual);
                    }
                    should_execute = true;
                } else {
                    new_mode = Some(Mode::Command);
                }
            } else if cmd == Some(verb) {
                // `d5d` and the like
                new_motion = Some(MotionKind::Doubled(verb));
                should_execute = true;
            } else {
                should_abort = true;
            }
        } else if decode::is_complete_command(c) {
            if cmd.is_none() {
                if !self.decode_command(c) {
                    new_cmd = decode::immediate_verb(c);
                } else {
                    mul = self.sess.vars.mul; // decode may have set it
                }
                if self.sess.vars.visual.is_some() {
                    if decode::is_visual_irrelevant(c) {
                        should_execute = true;
                    } else if decode::is_visual_compatible(c) {
                        self.sess.vars.motion = Some(MotionKind::Visual);
                        should_execute = true;
                    } else {
                        should_abort = true;
                    }
                } else {
                    should_execute = true;
                }
            } else {
                should_abort = true;
            }
        } else if let Some(mk) = decode::motion_key(c) {
            match mk {
                MotionKey::Plain(m) => new_motion = Some(m),
                MotionKey::RepeatSeek => self.prepare_seek_repeat()?,
                MotionKey::SearchAgain { invert } => self.prepare_search_again(invert)?,
            }
            should_execute = true;
        } else if self.handle_seek_char(c) || self.handle_search_char(c) || self.handle_combo_char(c)?
        {
            // consumed; just fold the count below
        } else {
            return Err(self.abort());
        }

        if should_abort {
            return Err(self.abort());
        }
        if let Some(verb) = new_cmd {
            self.sess.vars.cmd = Some(verb);
        }
        if let Some(m) = new_motion {
            self.sess.vars.motion = Some(m);
        }
        // Fold the digit run into the multiplier. A consumed combo may have
        // already executed (second `g` of `gg`), leaving no digits — the
        // count must not leak into the next command then.
        let mul = mul.unwrap_or(1);
        match self.sess.vars.cur_num.take() {
            Some(cur) => self.sess.vars.mul = Some(mul.saturating_mul(cur)),
            None => self.sess.vars.mul = None,
        }
        if should_execute {
            self.execute(false)
        } else {
            if let Some(m) = new_mode {
                self.set_mode(m);
            }
            Ok(())
        }
    }

    /// The char after `"` names a register.
    fn reg_mode_input(&mut self, c: char) -> Flow<()> {
        match RegName::from_char(c, self.win.has_host_registers()) {
            Some(reg) => {
                self.set_mode(Mode::Command);
                self.sess.vars.reg = Some(reg);
                Ok(())
            }
            None => Err(self.abort()),
        }
    }

    /// The char after `f`/`F`/`t`/`T` is the seek target; remember it for
    /// `;` and execute.
    fn seek_mode_input(&mut self, c: char) -> Flow<()> {
        let kind = match self.sess.vars.seek {
            Some(k) => k,
            None => {
                self.diag("seek mode without a seek kind");
                return Err(self.abort());
            }
        };
        self.sess.vars.seek_char = Some(c);
        self.win.registers.set_last_seek(kind, c);
        self.execute(false)
    }

    /// Pattern collection for `/`/`?`: printable chars extend the pattern
    /// (with live preview), backspace shrinks it, Enter commits.
    fn search_mode_input(&mut self, c: char) -> Flow<()> {
        let dir = match self.sess.vars.search {
            Some(d) => d,
            None => {
                self.diag("search mode without a direction");
                return Err(self.abort());
            }
        };
        let mut pattern = self.sess.vars.search_str.clone().unwrap_or_default();
        if c == keys::LF {
            if pattern.is_empty() {
                // Bare Enter reuses the remembered pattern.
                pattern = self.win.registers.get(RegName::SearchPattern).text;
                self.sess.vars.search_str = Some(pattern.clone());
            }
            if pattern.is_empty() {
                return Err(self.abort());
            }
            self.win.registers.set_last_search_dir(dir);
            self.win
                .registers
                .set(RegName::SearchPattern, pattern, false);
            match self.sess.vars.search_start {
                Some(origin) => self.set_cursor_pos(origin),
                None => self.diag("search commit without a start position"),
            }
            return self.execute(false);
        }
        if c == keys::BS {
            if pattern.is_empty() {
                return Err(self.abort_quiet());
            }
            pattern.pop();
        } else {
            pattern.push(c);
        }
        self.sess.vars.search_str = Some(pattern.clone());
        self.preview_search(dir, &pattern);
        Ok(())
    }

    /// Incremental preview while the pattern is being typed: highlight the
    /// prospective match, or sit back at the origin when there is none.
    fn preview_search(&mut self, dir: SearchDir, pattern: &str) {
        let mul = self.sess.vars.mul.unwrap_or(1);
        let origin = self
            .sess
            .vars
            .search_start
            .unwrap_or_else(|| self.cursor_pos());
        let t = self.text();
        match core_motion::search(&t, origin, mul, dir, pattern) {
            Some((start, end)) => {
                if self.sess.vars.visual.is_some() {
                    self.set_cursor_pos(start);
                } else {
                    self.set_selection(start, end);
                }
            }
            None => self.set_cursor_pos(origin),
        }
    }

    // ----- navigation keycodes ------------------------------------------

    fn handle_nav(&mut self, key: NavKey) -> Flow<()> {
        if let Some(motion_char) = decode::nav_motion_char(key) {
            return self.handle_nav_as_motion(motion_char);
        }
        if key == NavKey::Delete {
            return self.handle_nav_delete();
        }
        Err(self.abort())
    }

    /// Arrows and Home/End act like their motion chars. In text entry the
    /// motion is emulated by briefly dropping to command mode, running the
    /// motion with repeat inhibited, and re-entering the same mode — which
    /// also discards any pending insert multiplier.
    fn handle_nav_as_motion(&mut self, motion_char: char) -> Flow<()> {
        match self.sess.vars.mode {
            Mode::CountPending if motion_char == '0' => {
                // Home maps to 0, which must not extend the count.
                self.num_mode_input('0', true)
            }
            Mode::Command | Mode::CountPending => self.handle_char(motion_char, false),
            Mode::Insert => {
                self.end_command(Mode::Command, true, true);
                self.handle_char(motion_char, true)?;
                self.handle_char('i', true)
            }
            Mode::Overwrite => {
                self.end_command(Mode::Command, true, true);
                self.handle_char(motion_char, true)?;
                self.handle_char('R', true)
            }
            Mode::RegisterPending => Err(self.abort()),
            Mode::Seek | Mode::Search => {
                self.diag("navigation key during seek/search");
                Err(self.abort())
            }
        }
    }

    fn handle_nav_delete(&mut self) -> Flow<()> {
        match self.sess.vars.mode {
            Mode::Command => {
                if self.sess.vars.cmd == Some(Verb::ReplaceChar) {
                    return Err(self.abort());
                }
                self.handle_char('x', false)
            }
            Mode::CountPending => self.handle_char('x', false),
            Mode::Insert | Mode::Overwrite => {
                let pos = self.cursor_pos();
                let max = self.max_pos();
                if pos < max {
                    self.delete_chars(pos, 1);
                    self.sess.vars.last.del_chars += 1;
                } else {
                    self.bell();
                }
                Ok(())
            }
            Mode::Search => self.handle_char(keys::BS, false),
            Mode::RegisterPending | Mode::Seek => Err(self.abort()),
        }
    }
}
