//! Per-session and per-window editor state: modes, registers, undo history.
//!
//! The command interpreter (`core-command`) is stateless between keystrokes
//! except for what lives here and in its own `CommandVars`. Registers are
//! window-scoped — every surface in one logical window shares the same
//! `RegisterFile`, so a yank in one text widget pastes into another. Undo
//! history is session-scoped: each surface owns its stacks.

pub mod registers;
pub mod undo;

pub use registers::{RegName, Register, RegisterFile};
pub use undo::{UndoManager, UndoRecord, UndoUnit};

/// Interpreter mode. Visual selection is an orthogonal flag (it coexists
/// with `Command`, `CountPending`, `Seek`, and `Search`), tracked separately
/// in the command layer's variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Between commands; may hold a partial command (an operator awaiting
    /// its motion, or a pending `r`).
    Command,
    /// Inserting text.
    Insert,
    /// Overwriting text (`R`).
    Overwrite,
    /// Just saw `"`; the next char names a register.
    RegisterPending,
    /// Accumulating a count (entered on a leading 1-9 digit).
    CountPending,
    /// Awaiting the target char of `f`/`F`/`t`/`T`.
    Seek,
    /// Collecting a search pattern after `/` or `?`.
    Search,
}

impl Mode {
    /// Modes where printable input goes into the buffer rather than the
    /// command decoder.
    pub fn is_text_entry(self) -> bool {
        matches!(self, Mode::Insert | Mode::Overwrite)
    }
}

/// Kind of active visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    /// `v` — exact char bounds.
    Char,
    /// `V` — whole lines.
    Line,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_entry_modes() {
        assert!(Mode::Insert.is_text_entry());
        assert!(Mode::Overwrite.is_text_entry());
        assert!(!Mode::Command.is_text_entry());
        assert!(!Mode::Search.is_text_entry());
    }
}
