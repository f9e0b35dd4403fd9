//! Command execution.
//!
//! Execution runs in two computation phases and one application phase,
//! always on a fresh `ExecState` assembled from the command variables:
//!
//! 1. motion resolution — the motion (or the live visual selection, or the
//!    doubled linewise form) becomes a target offset and, under an
//!    operator, a `[start, end)` range with per-motion inclusivity rules;
//! 2. non-motion commands compute their own range/text (insert entries,
//!    paste positions, join spans, case toggles, scrolls);
//! 3. application — splice the buffer, feed registers, place the cursor,
//!    then close the command boundary (which commits the undo record and
//!    stores the repeat block).
//!
//! Repeats (`.`) re-enter this code with `repeating` set and the stored
//! operands, so everything here must derive positions from the current
//! cursor, never from remembered offsets.

use crate::ctx::Ctx;
use crate::decode;
use crate::vars::{self, MotionKind, ScrollKind, Verb};
use crate::Flow;
use core_config::UndoStyle;
use core_input::keys;
use core_motion::{self as motion, Col, SearchDir, SeekKind};
use core_state::{Mode, RegName, UndoRecord, UndoUnit, VisualKind};
use core_surface::FlatText;
use regex::Regex;
use tracing::{debug, trace};

/// Ephemeral per-execution state. Built fresh for every execution —
/// including repeats and visual-derived ones — and discarded afterwards.
pub(crate) struct ExecState {
    pub pos: usize,
    pub max: usize,
    /// Resolved count; `None` only for a countless `G` (meaning last line).
    pub mul: Option<usize>,
    pub reg: Option<RegName>,
    pub cmd: Option<Verb>,
    pub motion: Option<MotionKind>,
    pub seek: Option<SeekKind>,
    pub seek_char: Option<char>,
    pub search: Option<SearchDir>,
    pub search_str: Option<String>,
    /// Delete-key removals to replay (repeat only).
    pub del_chars: usize,
    pub repeating: bool,
    pub inhibit_repeatable: bool,
    pub next_mode: Mode,
    pub new_text: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub new_pos: Option<usize>,
    pub paste_pos: Option<usize>,
    /// Linewise delete consumed a leading newline instead of a trailing one.
    pub rotate_newline: bool,
    /// Linewise range had no newline to consume; the register gets one.
    pub add_newline: bool,
    /// Register content (paste) or origin command (`o`/`O`) was linewise.
    pub was_linewise: bool,
    /// Range came from a linewise visual selection.
    pub is_linewise: bool,
    /// Cursor position inside the visual selection, for `~` placement.
    pub true_pos: Option<usize>,
    pub visual: Option<VisualKind>,
    pub visual_dx: Option<usize>,
    pub visual_dy: Option<usize>,
    pub literal: Option<char>,
    pub scrolling: bool,
    pub repeatable: bool,
}

/// Swap the case of every char, building the replacement in place.
fn do_tilde(es: &mut ExecState, start: usize, text: &str) {
    let mut out = String::new();
    for c in text.chars() {
        let lower: String = c.to_lowercase().collect();
        if lower == c.to_string() {
            out.extend(c.to_uppercase());
        } else {
            out.push_str(&lower);
        }
    }
    es.start = Some(start);
    es.end = Some(start + out.chars().count());
    es.new_text = out;
}

impl Ctx<'_> {
    /// Resolve the accumulated command variables and run the command.
    pub(crate) fn execute(&mut self, inhibit_repeatable: bool) -> Flow<()> {
        // Pull everything out of the vars up front; a repeat substitutes the
        // stored block, with a freshly typed count winning over the stored
        // one.
        let (mut cmd, mut motion_kind, mut literal, typed_mul, typed_reg, visual) = {
            let v = &self.sess.vars;
            (v.cmd, v.motion, v.literal, v.mul, v.reg, v.visual)
        };
        let mut seek = None;
        let mut seek_char = None;
        let mut search = None;
        let mut search_str = None;
        {
            let v = &self.sess.vars;
            if motion_kind == Some(MotionKind::Seek) {
                seek = v.seek;
                seek_char = v.seek_char;
            } else if motion_kind == Some(MotionKind::Search) {
                search = v.search;
                search_str = v.search_str.clone();
            }
        }
        let mut default_mul = Some(1);
        if motion_kind == Some(MotionKind::GotoLine) {
            default_mul = None;
        }
        let mut mul = typed_mul.or(default_mul);
        let mut reg = typed_reg;
        let mut del_chars = 0usize;
        let mut visual_for_exec = visual;
        let mut visual_dx = None;
        let mut visual_dy = None;
        let mut repeating = false;

        if cmd == Some(Verb::Repeat) {
            let v = &self.sess.vars;
            motion_kind = v.last.motion;
            default_mul = Some(1);
            match motion_kind {
                Some(MotionKind::GotoLine) => default_mul = None,
                Some(MotionKind::Seek) => {
                    seek = v.last.seek;
                    seek_char = v.last.seek_char;
                }
                Some(MotionKind::Search) => {
                    search = v.last.search;
                    search_str = v.last.search_str.clone();
                }
                Some(MotionKind::Visual) => {
                    visual_dx = v.last.visual_dx;
                    visual_dy = v.last.visual_dy;
                    visual_for_exec = v.last.visual_used;
                }
                _ => {}
            }
            cmd = v.last.cmd;
            let last_mul = v.last.mul;
            let last_literal = v.last.literal;
            let last_reg = v.last.reg;
            let last_del = v.last.del_chars;
            if cmd.is_none() {
                return Err(self.abort());
            }
            if cmd == Some(Verb::ReplaceChar) {
                literal = last_literal;
            }
            mul = typed_mul.or(last_mul).or(default_mul);
            reg = last_reg;
            del_chars = last_del;
            repeating = true;
        }

        trace!(
            target: "command.exec",
            ?cmd,
            motion = ?motion_kind,
            ?mul,
            repeating,
            "execute"
        );

        // Undo and redo never go through ExecState: they replay records and
        // close their own boundary.
        if cmd == Some(Verb::Undo) || cmd == Some(Verb::Redo) {
            if inhibit_repeatable {
                self.diag("repeat inhibition during undo/redo");
            }
            let count = mul.unwrap_or(1);
            let vi_style = self.win.config.undo_style == UndoStyle::Vi;
            let undo_cmd = cmd == Some(Verb::Undo);
            return if undo_cmd {
                if vi_style {
                    if self.sess.undo.undoing {
                        self.sess.undo.undoing = false;
                        self.replay_records(count, false)
                    } else {
                        self.sess.undo.undoing = true;
                        self.replay_records(count, true)
                    }
                } else {
                    self.replay_records(count, true)
                }
            } else if vi_style {
                if self.sess.undo.undoing {
                    self.replay_records(count, true)
                } else {
                    self.replay_records(count, false)
                }
            } else {
                self.replay_records(count, false)
            };
        }

        let mut es = ExecState {
            pos: self.cursor_pos(),
            max: self.max_pos(),
            mul,
            reg,
            cmd,
            motion: motion_kind,
            seek,
            seek_char,
            search,
            search_str,
            del_chars,
            repeating,
            inhibit_repeatable,
            next_mode: Mode::Command,
            new_text: String::new(),
            start: None,
            end: None,
            new_pos: None,
            paste_pos: None,
            rotate_newline: false,
            add_newline: false,
            was_linewise: false,
            is_linewise: false,
            true_pos: None,
            visual: visual_for_exec,
            visual_dx,
            visual_dy,
            literal,
            scrolling: false,
            repeatable: false,
        };
        self.execute_args(&mut es)
    }

    fn execute_args(&mut self, es: &mut ExecState) -> Flow<()> {
        if es.motion.is_some() {
            self.compute_motion_for_exec(es)?;
        } else {
            self.compute_non_motion(es)?;
        }
        self.apply_changes(es)?;
        self.end_command(
            es.next_mode,
            es.repeatable && !es.inhibit_repeatable,
            false,
        );
        if es.motion == Some(MotionKind::GotoLine) && es.cmd != Some(Verb::Yank) {
            if es.mul.is_none() {
                self.surface.scroll_hint_bottom();
            } else if es.mul == Some(1) {
                self.surface.scroll_hint_top();
            }
        }
        Ok(())
    }

    // ----- motion resolution ---------------------------------------------

    fn compute_motion_for_exec(&mut self, es: &mut ExecState) -> Flow<()> {
        let doubled = matches!(
            (es.cmd, es.motion),
            (Some(c), Some(MotionKind::Doubled(m))) if c == m
        );
        if doubled {
            self.compute_motion_double(es);
        } else if es.motion == Some(MotionKind::Visual) {
            self.compute_motion_from_visual(es);
            self.process_visual_region(es)?;
        } else {
            let computed = self.compute_position(es);
            es.new_pos = match computed {
                // A failed seek/search/match is tolerated inside a visual
                // selection and fatal otherwise.
                None => {
                    if self.sess.vars.visual.is_some() {
                        Some(es.pos)
                    } else {
                        return Err(self.abort());
                    }
                }
                Some(p) => Some(p.max(0) as usize),
            };
            if es.cmd.is_some() {
                self.compute_motion_with_command(es);
            }
        }
        Ok(())
    }

    /// Target offset for a plain motion, or `None` when the motion could
    /// not find its target. Operator context changes several motions'
    /// boundary behavior, so the exec state rides along.
    fn compute_position(&mut self, es: &ExecState) -> Option<isize> {
        let mul = match es.mul {
            Some(m) if m > 0 => m,
            _ if es.motion == Some(MotionKind::GotoLine) => 0,
            _ => 1,
        };
        let t = self.text();
        let max = t.len();
        let operator = es.cmd.is_some();
        let pos = match es.motion? {
            MotionKind::BackChar => {
                if operator {
                    self.cursor_pos() as isize - mul as isize
                } else {
                    let mut pos = self.cursor_pos();
                    for _ in 0..mul {
                        pos = motion::fixup_end_of_line(&t, pos.saturating_sub(1));
                    }
                    pos as isize
                }
            }
            MotionKind::LineDown => {
                if operator {
                    self.cursor_dy_tracking_col(&t, es.pos, mul as isize) as isize
                } else {
                    let mut pos = self.cursor_pos();
                    let mut left = mul;
                    while left > 0 && pos < max {
                        pos = motion::find_end_of_line(&t, pos) + 1;
                        left -= 1;
                    }
                    motion::first_non_blank(&t, pos) as isize
                }
            }
            MotionKind::ForwardChar => {
                if operator {
                    es.pos as isize + mul as isize
                } else {
                    let mut pos = self.cursor_pos();
                    for _ in 0..mul {
                        pos = motion::safe_back_up(&t, pos + 2);
                    }
                    pos as isize
                }
            }
            MotionKind::FirstNonBlank => {
                let pos = motion::find_start_of_line(&t, self.cursor_pos());
                let pos = motion::first_non_blank(&t, pos);
                motion::fixup_end_of_line(&t, pos) as isize
            }
            MotionKind::WordBack(strict) => motion::loop_motion(
                &t,
                mul,
                self.cursor_pos(),
                |t, p| motion::find_prev_word_start(t, p, strict),
            ) as isize,
            MotionKind::WordEnd(strict) => motion::loop_motion(
                &t,
                mul,
                self.cursor_pos(),
                |t, p| motion::find_next_word_end(t, p, strict),
            ) as isize,
            MotionKind::GotoLine => motion::goto_line(&t, es.mul, self.cursor_pos()) as isize,
            MotionKind::Left => self.cursor_dx_tracking_col(&t, es.pos, -(mul as isize)) as isize,
            MotionKind::Down => self.cursor_dy_tracking_col(&t, es.pos, mul as isize) as isize,
            MotionKind::Up => {
                let p = self.cursor_dy_tracking_col(&t, es.pos, -(mul as isize));
                motion::fixup_end_of_line(&t, p) as isize
            }
            MotionKind::Right => {
                let p = self.cursor_dx_tracking_col(&t, es.pos, mul as isize);
                motion::fixup_end_of_line(&t, p) as isize
            }
            MotionKind::WordForward(strict) => {
                if operator {
                    // The final hop must not swallow a newline the operator
                    // does not need (`cw`/`dw` at the end of a line).
                    let p = motion::loop_motion(&t, mul.saturating_sub(1), self.cursor_pos(), |t, p| {
                        motion::find_next_word_start(t, p, strict)
                    });
                    motion::find_next_word_start_or_newline(&t, p, strict) as isize
                } else {
                    motion::loop_motion(&t, mul, self.cursor_pos(), |t, p| {
                        motion::find_next_word_start(t, p, strict)
                    }) as isize
                }
            }
            MotionKind::LineStart => motion::find_start_of_line(&t, self.cursor_pos()) as isize,
            MotionKind::LineEnd => {
                let mut pos = motion::find_end_of_line(&t, self.cursor_pos());
                let mut left = mul;
                while left > 1 && pos < max {
                    pos += 1;
                    pos = motion::find_end_of_line(&t, pos);
                    left -= 1;
                }
                motion::fixup_end_of_line(&t, pos) as isize
            }
            MotionKind::MatchPair => {
                let pos = motion::match_pair(&t, self.cursor_pos());
                pos as isize
            }
            MotionKind::Column => {
                let mut pos = motion::find_start_of_line(&t, self.cursor_pos());
                if mul > 1 {
                    let eoln = motion::find_end_of_line(&t, pos);
                    if eoln - pos > mul {
                        pos += mul;
                    } else {
                        pos = eoln;
                    }
                    pos = motion::fixup_end_of_line(&t, pos);
                }
                pos as isize
            }
            MotionKind::Seek => {
                let (kind, target) = match (es.seek, es.seek_char) {
                    (Some(k), Some(c)) => (k, c),
                    _ => return None,
                };
                return motion::seek(&t, self.cursor_pos(), mul, kind, target, operator)
                    .map(|p| p as isize);
            }
            MotionKind::Search => {
                let (dir, pattern) = match (es.search, es.search_str.as_ref()) {
                    (Some(d), Some(p)) => (d, p),
                    _ => return None,
                };
                return motion::search(&t, self.cursor_pos(), mul, dir, pattern)
                    .map(|(s, _)| s as isize);
            }
            MotionKind::Visual | MotionKind::Doubled(_) => return None,
        };
        Some(pos)
    }

    /// Horizontal move that drops the remembered column once it moves.
    fn cursor_dx_tracking_col(&mut self, t: &FlatText, pos: usize, delta: isize) -> usize {
        let new = motion::cursor_dx(t, pos, delta);
        if new != pos {
            self.sess.vars.col = None;
        }
        new
    }

    /// Vertical move that establishes the remembered column on first use.
    fn cursor_dy_tracking_col(&mut self, t: &FlatText, pos: usize, delta: isize) -> usize {
        let col = match self.sess.vars.col {
            Some(c) => c,
            None => {
                let c = Col::Cells(motion::find_col(t, self.cursor_pos()));
                self.sess.vars.col = Some(c);
                c
            }
        };
        motion::cursor_dy(t, pos, delta, col)
    }

    /// Range for the doubled linewise forms (`cc`, `dd`, `yy`): whole lines
    /// from the cursor's line through `count - 1` lines below, clamped at
    /// end-of-buffer. `dd` consumes one bounding newline — the trailing one
    /// if present, else the leading one — and `cc` starts at the first
    /// non-blank to preserve indentation.
    fn compute_motion_double(&mut self, es: &mut ExecState) {
        let t = self.text();
        let mul = es.mul.unwrap_or(1);
        let mut start = motion::find_start_of_line(&t, es.pos);
        let mut end = es.pos;
        let mut temp = es.pos;
        for i in 0..mul {
            end = motion::find_end_of_line(&t, temp);
            if end == es.max {
                break;
            }
            if i < mul - 1 {
                end += 1; // jump the newline to the next line
            }
            temp = end;
        }
        match es.cmd {
            Some(Verb::Change) => {
                start = motion::first_non_blank(&t, start);
            }
            Some(Verb::Delete) => {
                end += 1; // trim the trailing newline
                if end > es.max {
                    end = es.max;
                    if start == 0 {
                        // Nothing left at all; the register still records a
                        // full line.
                        es.add_newline = true;
                        es.new_pos = Some(0);
                    } else {
                        start -= 1; // no trailing newline: eat the leading one
                        es.rotate_newline = true;
                        es.new_pos = Some(motion::first_non_blank(
                            &t,
                            motion::find_start_of_line(&t, start),
                        ));
                    }
                } else if end == es.max {
                    let candidate = motion::first_non_blank(
                        &t,
                        motion::find_start_of_line(&t, start.saturating_sub(1)),
                    );
                    if candidate > start {
                        self.diag("linewise delete cursor landed past range start");
                        es.new_pos = Some(start);
                    } else {
                        es.new_pos = Some(candidate);
                    }
                } else {
                    es.new_pos = Some(motion::first_non_blank(&t, end) - end + start);
                }
            }
            _ => {
                // yank
                end += 1; // grab the newline
                es.new_pos = Some(es.pos);
                if end > es.max {
                    end = es.max;
                    es.add_newline = true;
                }
            }
        }
        es.start = Some(start);
        es.end = Some(end);
    }

    /// Turn a motion target into the operator's `[start, end)` range. Each
    /// motion family has its own inclusivity/rounding rules.
    fn compute_motion_with_command(&mut self, es: &mut ExecState) {
        let t = self.text();
        let new_pos = match es.new_pos {
            Some(p) => p,
            None => return,
        };
        match es.motion.unwrap_or(MotionKind::Right) {
            MotionKind::LineEnd => {
                if es.pos != new_pos && new_pos == es.max {
                    es.start = Some(es.pos);
                    es.end = Some(new_pos);
                } else if t.char_at(new_pos) != Some('\n') && new_pos < es.max {
                    es.start = Some(es.pos);
                    es.end = Some(new_pos + 1);
                }
                if es.cmd == Some(Verb::Yank) {
                    es.new_pos = Some(es.pos);
                } else if new_pos != es.pos {
                    if let Some(s) = es.start {
                        es.new_pos = Some(s);
                    }
                }
            }
            MotionKind::MatchPair => {
                if new_pos != es.pos {
                    es.start = Some(es.pos.min(new_pos));
                    es.end = Some(es.pos.max(new_pos) + 1);
                    es.new_pos = es.start;
                }
            }
            MotionKind::WordEnd(_) => {
                es.start = Some(es.pos);
                es.end = Some((new_pos + 1).min(es.max));
                es.new_pos = es.start;
            }
            MotionKind::GotoLine | MotionKind::Down | MotionKind::Up | MotionKind::LineDown => {
                if new_pos != es.pos || es.motion == Some(MotionKind::GotoLine) {
                    let mut start = es.pos.min(new_pos);
                    let mut end = es.pos.max(new_pos);
                    start = motion::find_start_of_line(&t, start);
                    end = motion::find_end_of_line(&t, end);
                    if es.cmd == Some(Verb::Delete) {
                        end += 1; // trim the newline (or rotate to the leading one)
                        if end > es.max {
                            end = es.max;
                            if start == 0 {
                                es.add_newline = true;
                            } else {
                                start -= 1;
                                es.rotate_newline = true;
                            }
                        }
                    } else if es.cmd == Some(Verb::Yank) {
                        if es.motion == Some(MotionKind::GotoLine) {
                            es.new_pos = Some(es.pos);
                        } else {
                            es.new_pos = Some(es.pos.min(new_pos));
                        }
                    } else {
                        let fnb = motion::first_non_blank(&t, end);
                        es.new_pos = Some(start + (fnb - end));
                    }
                    es.start = Some(start);
                    es.end = Some(end);
                }
            }
            MotionKind::Right => {
                let mut new_pos = new_pos;
                // The motion already pulled one short at end-of-line; an
                // operator wants the full span.
                if new_pos - es.pos < es.mul.unwrap_or(1) {
                    if es.max > 0 && new_pos == es.max - 1 {
                        new_pos += 1;
                    } else if t.char_at(new_pos) != Some('\n') {
                        new_pos += 1;
                    }
                }
                es.new_pos = Some(new_pos);
                if new_pos != es.pos {
                    es.start = Some(es.pos.min(new_pos));
                    es.end = Some(es.pos.max(new_pos));
                    if es.cmd == Some(Verb::Yank) {
                        es.new_pos = Some(es.pos);
                    } else {
                        es.new_pos = es.start;
                    }
                }
            }
            MotionKind::WordForward(_) => {
                if new_pos != es.pos {
                    es.start = Some(es.pos);
                    let mut end = new_pos;
                    es.new_pos = Some(es.pos);
                    if es.cmd == Some(Verb::Change) {
                        // Leave the trailing whitespace behind.
                        end = motion::find_prev_whitespace_start(&t, end);
                    }
                    es.end = Some(end);
                }
            }
            _ => {
                if new_pos != es.pos {
                    es.start = Some(es.pos.min(new_pos));
                    es.end = Some(es.pos.max(new_pos));
                    es.new_pos = es.start;
                }
            }
        }
    }

    /// Range from the live visual selection (or, on repeat, from the stored
    /// selection extents replayed at the current cursor).
    fn compute_motion_from_visual(&mut self, es: &mut ExecState) {
        let t = self.text();
        let dx = es.visual_dx.unwrap_or(0);
        let dy = es.visual_dy.unwrap_or(0);
        if dx != 0 || dy != 0 {
            // Repeat: rebuild a selection-shaped range below/after the
            // cursor.
            es.start = Some(es.pos);
            let mut pos = es.pos;
            if dy > 0 {
                let mut delta = dy;
                while delta > 0 && pos < es.max {
                    let eol = motion::find_end_of_line(&t, pos);
                    if eol < es.max {
                        pos = eol + 1;
                        delta -= 1;
                    } else {
                        pos = es.max;
                        break;
                    }
                }
            }
            if dx != 0 && pos < es.max {
                let eoln = motion::find_end_of_line(&t, pos);
                if eoln - pos > dx {
                    pos += dx;
                } else {
                    pos = eoln;
                }
            }
            es.end = Some(pos);
            if es.visual == Some(VisualKind::Line) {
                es.start = Some(motion::find_start_of_line(&t, es.start.unwrap_or(es.pos)));
                if dx != 0 {
                    let mut end = motion::find_end_of_line(&t, es.end.unwrap_or(pos));
                    if end < es.max {
                        end += 1;
                    }
                    es.end = Some(end);
                }
            }
            // Keep the extents for the next repeat.
            self.sess.vars.visual_dx = es.visual_dx;
            self.sess.vars.visual_dy = es.visual_dy;
        } else {
            let (sel_start, sel_end) = self.selection();
            es.start = Some(sel_start);
            es.end = Some(sel_end);
            let text = self.get_range(sel_start, sel_end);
            let parts: Vec<&str> = text.split('\n').collect();
            self.sess.vars.visual_dx =
                Some(parts.last().map(|p| p.chars().count()).unwrap_or(0));
            self.sess.vars.visual_dy = Some(parts.len() - 1);
        }
        es.true_pos = Some(self.cursor_pos());
        self.sess.vars.visual_used = es.visual;
        if es.visual == Some(VisualKind::Line) {
            es.is_linewise = true;
        }
        self.sess.vars.clear_visual();
        es.new_pos = es.start;
    }

    /// Visual-only commands that need the resolved region before the splice
    /// can be described (`J`, `r`, `p`/`P`, `~` over a selection).
    fn process_visual_region(&mut self, es: &mut ExecState) -> Flow<()> {
        let start = es.start.unwrap_or(es.pos);
        let end = es.end.unwrap_or(start);
        let text = self.get_range(start, end);
        match es.cmd {
            Some(Verb::Join) => {
                self.do_join(es, start, end, &text);
            }
            Some(Verb::ReplaceChar) => {
                let ch = match es.literal {
                    Some(c) => c,
                    None => {
                        self.diag("visual replace without a literal char");
                        return Err(self.abort());
                    }
                };
                es.new_text = text
                    .chars()
                    .map(|c| if c == '\n' { '\n' } else { ch })
                    .collect();
                if ch == '\n' {
                    es.new_pos = Some(es.new_pos.unwrap_or(start) + 1);
                }
            }
            Some(Verb::PasteAfter) | Some(Verb::PasteBefore) => {
                es.new_text = self.get_reg(es.reg).text;
                let was_linewise = self.reg_is_linewise(es.reg);
                if was_linewise && es.visual == Some(VisualKind::Char) {
                    es.new_text.insert(0, '\n');
                } else if !was_linewise && es.visual == Some(VisualKind::Line) {
                    // Leave the trailing newline in place.
                    es.end = Some(end.saturating_sub(1));
                }
            }
            Some(Verb::ToggleCase) => {
                do_tilde(es, start, &text);
                if es.visual == Some(VisualKind::Line) {
                    // The trailing newline does not count for cursor
                    // placement.
                    let chars: Vec<char> = text.chars().collect();
                    let upto = chars.len().saturating_sub(2);
                    let last_eoln = if chars.is_empty() {
                        None
                    } else {
                        chars[..=upto.min(chars.len() - 1)]
                            .iter()
                            .rposition(|&c| c == '\n')
                    };
                    let cursor_off = es.true_pos.unwrap_or(start).saturating_sub(start);
                    let keep_cursor = match last_eoln {
                        Some(e) => e >= cursor_off,
                        None => false,
                    };
                    es.new_pos = if keep_cursor { es.true_pos } else { Some(start) };
                } else {
                    es.new_pos = Some(start);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Collapse whitespace around newlines into single spaces.
    fn do_join(&mut self, es: &mut ExecState, start: usize, end: usize, text: &str) {
        let re = Regex::new(r"[ \t]*(\n[ \t]*)+").expect("join pattern");
        let joined = re.replace_all(text, " ").into_owned();
        es.start = Some(start);
        es.end = Some(end);
        es.new_pos = Some((start + joined.chars().count()).saturating_sub(1));
        es.new_text = joined;
    }

    // ----- non-motion commands -------------------------------------------

    fn compute_non_motion(&mut self, es: &mut ExecState) -> Flow<()> {
        let t = self.text();
        let mul = es.mul.unwrap_or(1);
        match es.cmd {
            Some(Verb::Scroll(kind)) => {
                self.handle_scroll(mul, kind);
                es.scrolling = true;
                es.new_pos = Some(es.pos);
            }
            Some(Verb::Append) => {
                es.new_pos = Some(if t.char_at(es.pos) != Some('\n') {
                    es.pos + 1
                } else {
                    es.pos
                });
                es.next_mode = Mode::Insert;
            }
            Some(Verb::AppendLineEnd) => {
                es.new_pos = Some(motion::find_end_of_line(&t, self.cursor_pos()));
                es.next_mode = Mode::Insert;
            }
            Some(Verb::InsertLineStart) => {
                let pos = motion::find_start_of_line(&t, self.cursor_pos());
                es.new_pos = Some(motion::first_non_blank(&t, pos));
                es.next_mode = Mode::Insert;
            }
            Some(Verb::Insert) => {
                es.new_pos = Some(es.pos);
                es.next_mode = Mode::Insert;
            }
            Some(Verb::Join) => {
                let pattern = format!(
                    "(([ \\t]*\\n[ \\t]*)[^\\n]*){{{}}}[ \\t]*\\n[ \\t]*",
                    mul.saturating_sub(1)
                );
                let re = match Regex::new(&pattern) {
                    Ok(re) => re,
                    Err(_) => {
                        self.diag("join pattern failed to compile");
                        return Err(self.abort());
                    }
                };
                let text = self.get_range(es.pos, es.max);
                match re.find(&text) {
                    None => return Err(self.abort()),
                    Some(m) => {
                        let start = es.pos + text[..m.start()].chars().count();
                        let end = es.pos + text[..m.end()].chars().count();
                        let segment = text[m.start()..m.end()].to_string();
                        self.do_join(es, start, end, &segment);
                    }
                }
            }
            Some(Verb::OpenBelow) => {
                self.sess.undo.set_open_line_origin(es.pos);
                es.was_linewise = true; // repeat prefixes the newline
                let start = motion::find_end_of_line(&t, self.cursor_pos());
                es.start = Some(start);
                es.end = Some(start);
                es.new_pos = Some(start + 1);
                es.new_text = "\n".to_string();
                es.next_mode = Mode::Insert;
            }
            Some(Verb::OpenAbove) => {
                self.sess.undo.set_open_line_origin(es.pos);
                es.was_linewise = true;
                let start = motion::find_start_of_line(&t, self.cursor_pos());
                es.start = Some(start);
                es.end = Some(start);
                es.new_text = "\n".to_string();
                es.next_mode = Mode::Insert;
            }
            Some(Verb::PasteAfter) => {
                let reg = self.get_reg(es.reg);
                es.new_text = reg.text;
                es.was_linewise = self.reg_is_linewise(es.reg);
                if es.was_linewise {
                    let mut paste_pos = motion::find_end_of_line(&t, self.cursor_pos());
                    if paste_pos < es.max {
                        paste_pos += 1;
                    }
                    es.paste_pos = Some(paste_pos);
                } else {
                    es.paste_pos = Some((es.pos + 1).min(es.max));
                }
            }
            Some(Verb::PasteBefore) => {
                let reg = self.get_reg(es.reg);
                es.new_text = reg.text;
                es.was_linewise = self.reg_is_linewise(es.reg);
                if es.was_linewise {
                    es.paste_pos = Some(motion::find_start_of_line(&t, self.cursor_pos()));
                } else {
                    es.paste_pos = Some(es.pos);
                }
            }
            Some(Verb::ReplaceChar) => {
                let ch = match es.literal {
                    Some(c) if c != keys::BS => c,
                    _ => return Err(self.abort()),
                };
                let mut offset = 1;
                let mut new_text = String::new();
                new_text.push(ch);
                if ch != '\n' {
                    for _ in 1..mul {
                        new_text.push(ch);
                    }
                } else {
                    // Never add more than one newline.
                    offset = 0;
                }
                let probe = self.get_range(es.pos, es.pos + mul);
                if probe.chars().any(|c| c == '\n') {
                    return Err(self.abort());
                }
                es.start = Some(es.pos);
                es.end = Some(es.pos + mul);
                es.new_pos = Some(es.pos + new_text.chars().count() - offset);
                es.new_text = new_text;
                let literal = ch.to_string();
                self.set_reg(RegName::Insert, &literal, false);
            }
            Some(Verb::Overwrite) => {
                es.new_pos = Some(es.pos);
                es.next_mode = Mode::Overwrite;
            }
            Some(Verb::ToggleCase) => {
                let start = es.pos;
                let end = start + mul;
                let text = self.get_range(start, end);
                let eoln = text.chars().position(|c| c == '\n');
                if eoln == Some(0) {
                    // Sitting on the newline: nothing to toggle.
                    return Err(self.abort());
                }
                let text = match eoln {
                    Some(n) => text.chars().take(n).collect::<String>(),
                    None => text,
                };
                do_tilde(es, start, &text);
                es.new_pos = es.end;
            }
            other => {
                debug!(target: "command.exec", ?other, "unexpected non-motion command");
                return Err(self.abort());
            }
        }
        Ok(())
    }

    fn handle_scroll(&mut self, mul: usize, kind: ScrollKind) {
        let rows = self.surface.viewport_rows() as isize;
        let m = mul as isize;
        let distance = match kind {
            ScrollKind::PageUp => -m * rows,
            ScrollKind::PageDown => m * rows,
            ScrollKind::HalfUp => -m * (rows / 2),
            ScrollKind::HalfDown => m * (rows / 2),
            ScrollKind::LineUp => -m,
            ScrollKind::LineDown => m,
        };
        self.surface.scroll_by_rows(distance);
    }

    // ----- application ---------------------------------------------------

    fn apply_changes(&mut self, es: &mut ExecState) -> Flow<()> {
        if es.start.is_some() {
            self.apply_basic_edit(es);
        } else if es.paste_pos.is_some() {
            self.apply_paste(es);
        } else if es.new_pos != Some(es.pos) {
            self.apply_motion(es);
        } else if es.motion.map(decode::ok_not_to_move).unwrap_or(false) {
            self.apply_non_motion(es);
        } else if es.next_mode == Mode::Insert || es.next_mode == Mode::Overwrite {
            let pos = es.new_pos.unwrap_or(es.pos);
            self.delete_chars(pos, es.mul.unwrap_or(0) * es.del_chars);
            es.repeatable = true;
        } else if es.scrolling {
            es.next_mode = self.sess.vars.mode;
        } else if self.sess.vars.visual.is_some() {
            // Failed to move, but visual mode stays up without complaining.
        } else {
            return Err(self.abort());
        }
        if es.repeating && (es.next_mode == Mode::Insert || es.next_mode == Mode::Overwrite) {
            self.apply_repeated_insertion(es);
        }
        Ok(())
    }

    /// Splice a resolved range: delete/change/yank/replace/join/paste-over-
    /// selection all end up here.
    fn apply_basic_edit(&mut self, es: &mut ExecState) {
        let start = es.start.unwrap_or(es.pos);
        let end = es.end.unwrap_or(start);
        let mut captured = if es.cmd == Some(Verb::Yank) {
            self.get_range(start, end)
        } else {
            // Replayed Delete-key removals come off just past the range.
            self.delete_chars(end, es.mul.unwrap_or(0) * es.del_chars);
            let new_text = es.new_text.clone();
            self.replace_range(start, end, &new_text)
        };
        if es.rotate_newline {
            let mut rotated: String = captured.chars().skip(1).collect();
            rotated.push('\n');
            captured = rotated;
        } else if es.add_newline {
            captured.push('\n');
        }
        if start != end {
            let linewise = es.is_linewise || vars::is_linewise(es.cmd, es.motion);
            if es.cmd != Some(Verb::ToggleCase) {
                self.set_reg(RegName::Default, &captured, linewise);
                if let Some(reg) = es.reg {
                    if es.cmd != Some(Verb::PasteAfter) && es.cmd != Some(Verb::PasteBefore) {
                        self.set_reg(reg, &captured, linewise);
                    }
                }
            }
        }
        if es.new_pos.is_none() {
            es.new_pos = Some(start);
        }
        if es.cmd == Some(Verb::Change) {
            es.next_mode = Mode::Insert;
        }
        if es.next_mode != Mode::Insert {
            let t = self.text();
            es.new_pos = Some(motion::fixup_end_of_line(&t, es.new_pos.unwrap_or(start)));
        }
        self.set_cursor_pos(es.new_pos.unwrap_or(start));
        self.sess.vars.col = None;
        es.repeatable = true;
    }

    /// Paste outside visual mode. Linewise content lands on its own line
    /// (manufacturing a trailing newline at end-of-buffer when needed);
    /// charwise content lands at/after the cursor, with the empty-line
    /// special case pulling `p` back before the newline.
    fn apply_paste(&mut self, es: &mut ExecState) {
        if !es.new_text.is_empty() {
            let single = es.new_text.clone();
            for _ in 1..es.mul.unwrap_or(1) {
                es.new_text.push_str(&single);
            }
            let mut paste_pos = es.paste_pos.unwrap_or(es.pos);
            if es.was_linewise
                && paste_pos == es.max
                && paste_pos > 0
                && self.char_at(paste_pos - 1) != Some('\n')
            {
                self.replace_range(paste_pos, paste_pos, "\n");
                paste_pos += 1;
            } else if !es.was_linewise
                && es.cmd == Some(Verb::PasteAfter)
                && self.char_at(es.pos) == Some('\n')
                && paste_pos > 0
            {
                // `p` on an empty line goes before its newline.
                paste_pos -= 1;
            }
            let new_text = es.new_text.clone();
            self.replace_range(paste_pos, paste_pos, &new_text);
            if es.was_linewise {
                let t = self.text();
                let landing =
                    motion::fixup_end_of_line(&t, motion::first_non_blank(&t, paste_pos));
                self.set_cursor_pos(landing);
            } else {
                self.set_cursor_pos(paste_pos + es.new_text.chars().count() - 1);
            }
        }
        self.sess.vars.col = None;
        es.repeatable = true;
    }

    /// Bare motion (or the cursor half of a repeated insert command).
    fn apply_motion(&mut self, es: &mut ExecState) {
        let new_pos = es.new_pos.unwrap_or(es.pos);
        if es.cmd.is_some() {
            self.delete_chars(new_pos, es.mul.unwrap_or(0) * es.del_chars);
        }
        if es.next_mode == Mode::Insert {
            self.set_cursor_pos(new_pos);
            es.repeatable = true;
        } else {
            let t = self.text();
            let fixed = motion::fixup_end_of_line(&t, new_pos);
            self.set_cursor_pos(fixed);
            if es.motion != Some(MotionKind::Down) && es.motion != Some(MotionKind::Up) {
                if es.motion == Some(MotionKind::LineEnd) {
                    self.sess.vars.col = Some(Col::EndOfLine);
                } else if es.motion == Some(MotionKind::Column) {
                    self.sess.vars.col = Some(Col::Cells(es.mul.unwrap_or(1)));
                } else {
                    self.sess.vars.col = None;
                }
            }
        }
    }

    /// Motion that legitimately did not move (`$` at line end, `0` at line
    /// start): no cursor change, but the column memory still updates.
    fn apply_non_motion(&mut self, es: &ExecState) {
        self.delete_chars(es.pos, es.mul.unwrap_or(0) * es.del_chars);
        if es.motion == Some(MotionKind::LineEnd) {
            self.sess.vars.col = Some(Col::EndOfLine);
        } else if es.motion != Some(MotionKind::Column) {
            self.sess.vars.col = None;
        }
    }

    /// A repeated insert-entering command (`.` after `i`/`o`/`R`/...):
    /// replay the remembered insert text, with the open-line forms
    /// prefixing each copy with a newline, and overwrite clamping at the
    /// end of the line.
    fn apply_repeated_insertion(&mut self, es: &mut ExecState) {
        es.new_text = self.get_reg(Some(RegName::Insert)).text;
        let start = self.cursor_pos();
        es.start = Some(start);
        let mut end = start;
        if !es.new_text.is_empty() {
            if es.cmd.map(decode::is_repeatable_insert).unwrap_or(false) {
                let mut single = es.new_text.clone();
                if es.was_linewise {
                    single.insert(0, '\n');
                }
                for _ in 1..es.mul.unwrap_or(1) {
                    es.new_text.push_str(&single);
                }
                if es.next_mode == Mode::Overwrite {
                    end = start + es.new_text.chars().count();
                    let old_text = self.get_range(start, end);
                    if let Some(eoln) = old_text.chars().position(|c| c == '\n') {
                        end = start + eoln;
                    }
                }
            }
            let new_text = es.new_text.clone();
            self.replace_range(start, end, &new_text);
            self.set_cursor_pos(start + es.new_text.chars().count() - 1);
        }
        self.sess.vars.col = None;
        es.next_mode = Mode::Command;
    }

    // ----- undo / redo ---------------------------------------------------

    /// Replay up to `count` records from one history stack onto the buffer,
    /// pushing the inverse records onto the other stack. Ringing the bell
    /// on shortfall, then placing the cursor by the nature of the last
    /// replayed unit.
    pub(crate) fn replay_records(&mut self, count: usize, is_undo: bool) -> Flow<()> {
        if count == 0 {
            self.diag("undo/redo with zero count");
        }
        let depth = if is_undo {
            self.sess.undo.undo_depth()
        } else {
            self.sess.undo.redo_depth()
        };
        if depth == 0 {
            return Err(self.abort());
        }
        let mut remaining = count;
        let mut last_unit: Option<UndoUnit> = None;
        let mut last_old_text = String::new();
        let mut last_max = 0usize;
        while remaining > 0 {
            let record = if is_undo {
                self.sess.undo.pop_for_undo()
            } else {
                self.sess.undo.pop_for_redo()
            };
            let mut record = match record {
                Some(r) => r,
                None => break,
            };
            if record.is_empty() {
                self.diag("empty undo record");
            }
            let mut inverse = UndoRecord::default();
            while let Some(unit) = record.pop() {
                last_max = self.max_pos();
                let old_text =
                    self.replace_range_no_undo(unit.start, unit.end, &unit.text, false);
                inverse.push(UndoUnit {
                    start: unit.start,
                    end: unit.start + unit.text.chars().count(),
                    text: old_text.clone(),
                    open_line_origin: unit.open_line_origin,
                });
                last_old_text = old_text;
                last_unit = Some(unit);
            }
            if is_undo {
                self.sess.undo.push_inverse_redo(inverse);
            } else {
                self.sess.undo.push_inverse_undo(inverse);
            }
            remaining -= 1;
        }
        if remaining > 0 {
            self.bell();
        }
        if let Some(unit) = last_unit {
            let t = self.text();
            let mut landing = unit.start;
            if unit.text.is_empty()
                && unit.end == last_max
                && landing > 0
                && last_old_text.contains('\n')
            {
                // The final line went away: back up to the previous line's
                // first non-blank instead of floating past the buffer.
                landing =
                    motion::first_non_blank(&t, motion::find_start_of_line(&t, landing));
            } else if last_old_text.is_empty()
                && landing == last_max
                && unit.text.chars().count() > 1
                && unit.text.starts_with('\n')
            {
                // The final line came back: step into it rather than sit on
                // its leading newline.
                landing = motion::first_non_blank(&t, landing + 1);
            } else if let Some(origin) = unit.open_line_origin {
                landing = origin;
            }
            let fixed = motion::fixup_end_of_line(&t, landing);
            self.set_cursor_pos(fixed);
        }
        self.end_command(Mode::Command, false, false);
        Ok(())
    }
}
