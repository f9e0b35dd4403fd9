//! Typed per-surface command variables.
//!
//! One struct of optional slots replaces the freeform name/value bag the
//! command accumulator conceptually is. A command like `55"a66d5l` fills the
//! slots piecewise across keystrokes: counts multiply into `mul`, `"a` sets
//! `reg`, `d` sets `cmd`, `l` sets `motion` and triggers execution. The
//! `last` block is only rewritten at a command boundary flagged repeatable,
//! which is exactly what `.` replays.

use core_motion::{Col, SearchDir, SeekKind};
use core_state::{Mode, RegName, VisualKind};

/// Command verbs as they exist after decode. Shorthand forms never appear
/// here: `C`/`D`/`Y`/`x`/`X`/`s`/`S` decode into an operator plus motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    // Operators awaiting a motion, plus `r` which awaits a literal char.
    Change,
    Delete,
    Yank,
    ReplaceChar,
    // Immediate commands.
    Append,
    AppendLineEnd,
    Insert,
    InsertLineStart,
    OpenBelow,
    OpenAbove,
    PasteAfter,
    PasteBefore,
    Overwrite,
    Join,
    ToggleCase,
    Undo,
    Redo,
    Repeat,
    Scroll(ScrollKind),
}

/// Viewport scroll commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollKind {
    /// `Ctrl-B`
    PageUp,
    /// `Ctrl-F`
    PageDown,
    /// `Ctrl-U`
    HalfUp,
    /// `Ctrl-D`
    HalfDown,
    /// `Ctrl-Y`
    LineUp,
    /// `Ctrl-E`
    LineDown,
}

/// Motions as stored in the motion slot. `Seek`/`Search` read their operands
/// from the seek/search slots; `Visual` stands for "the live selection";
/// `Doubled` is the linewise `cc`/`dd`/`yy` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// Backspace.
    BackChar,
    /// Enter — down one line, landing on the first non-blank.
    LineDown,
    /// Space.
    ForwardChar,
    /// `$`
    LineEnd,
    /// `%`
    MatchPair,
    /// `^`
    FirstNonBlank,
    /// `b`/`B` (flag: strict char classes).
    WordBack(bool),
    /// `e`/`E`
    WordEnd(bool),
    /// `G` (and `gg` via count 1).
    GotoLine,
    /// `h`
    Left,
    /// `j`
    Down,
    /// `k`
    Up,
    /// `l`
    Right,
    /// `0`
    LineStart,
    /// `w`/`W`
    WordForward(bool),
    /// `|`
    Column,
    Seek,
    Search,
    Visual,
    Doubled(Verb),
}

/// Whether text captured by `cmd` + `motion` pastes back linewise. The
/// doubled forms and whole-line vertical motions qualify; Enter-as-motion
/// deliberately does not, a quirk preserved from the reference behavior.
pub fn is_linewise(cmd: Option<Verb>, motion: Option<MotionKind>) -> bool {
    match motion {
        Some(MotionKind::Doubled(v)) => Some(v) == cmd,
        Some(MotionKind::Down) | Some(MotionKind::Up) | Some(MotionKind::GotoLine) => true,
        _ => false,
    }
}

/// The "last command" block replayed by `.`.
#[derive(Debug, Clone, Default)]
pub struct LastCommand {
    pub cmd: Option<Verb>,
    pub reg: Option<RegName>,
    pub mul: Option<usize>,
    pub motion: Option<MotionKind>,
    pub literal: Option<char>,
    pub seek: Option<SeekKind>,
    pub seek_char: Option<char>,
    pub search: Option<SearchDir>,
    pub search_str: Option<String>,
    /// Chars removed with the Delete key during the insert phase.
    pub del_chars: usize,
    pub visual_dx: Option<usize>,
    pub visual_dy: Option<usize>,
    pub visual_used: Option<VisualKind>,
}

/// In-progress command state for one surface. Cleared (not destroyed) at
/// command boundaries; persists across the keystrokes of one command.
#[derive(Debug)]
pub struct CommandVars {
    pub mode: Mode,
    /// Remembered column for vertical motion; `None` until a vertical move
    /// needs one, reset by horizontal motion and edits.
    pub col: Option<Col>,
    /// Resolved multiplier (counts multiply together: `2d3w` is 6).
    pub mul: Option<usize>,
    /// Digits still being accumulated.
    pub cur_num: Option<usize>,
    pub reg: Option<RegName>,
    pub cmd: Option<Verb>,
    pub motion: Option<MotionKind>,
    /// Pending combo prefix (`g` of `gg`).
    pub combo: Option<char>,
    /// Literal char argument captured for `r`.
    pub literal: Option<char>,
    pub seek: Option<SeekKind>,
    pub seek_char: Option<char>,
    pub search: Option<SearchDir>,
    pub search_str: Option<String>,
    /// Cursor position when `/`/`?` began, for incremental preview and Esc.
    pub search_start: Option<usize>,
    /// Text overwritten during an `R` run, for backspace restoration.
    pub over: String,
    /// Chars appended past end-of-line during an `R` run (nothing to restore
    /// when backspacing over them).
    pub over_extend: usize,
    pub visual: Option<VisualKind>,
    pub visual_start: Option<usize>,
    pub visual_end: Option<usize>,
    /// Extents of the last visual selection, measured as (chars on the last
    /// line, whole lines); `.` rebuilds a selection-shaped range from them.
    pub visual_dx: Option<usize>,
    pub visual_dy: Option<usize>,
    /// Visual kind consumed by the executing command; survives the clearing
    /// of the live selection so the boundary can store it for `.`.
    pub visual_used: Option<VisualKind>,
    pub last: LastCommand,
}

impl CommandVars {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            col: None,
            mul: None,
            cur_num: None,
            reg: None,
            cmd: None,
            motion: None,
            combo: None,
            literal: None,
            seek: None,
            seek_char: None,
            search: None,
            search_str: None,
            search_start: None,
            over: String::new(),
            over_extend: 0,
            visual: None,
            visual_start: None,
            visual_end: None,
            visual_dx: None,
            visual_dy: None,
            visual_used: None,
            last: LastCommand::default(),
        }
    }

    /// Clear the in-progress command slots (count, register, verb, motion,
    /// combo, search anchor). Seek/search operands survive — they are only
    /// read when a fresh seek/search sets the motion slot.
    pub fn clear_command(&mut self, clear_visual: bool) {
        self.mul = None;
        self.reg = None;
        self.cmd = None;
        self.motion = None;
        self.cur_num = None;
        self.combo = None;
        self.literal = None;
        self.search_start = None;
        if clear_visual {
            self.clear_visual();
        }
    }

    pub fn clear_visual(&mut self) {
        self.visual = None;
        self.visual_start = None;
        self.visual_end = None;
    }
}
