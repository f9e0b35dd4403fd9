//! Key classification tables.
//!
//! Pure char → vocabulary lookups. The stateful part of decoding (shorthand
//! rewrites like `C` → `c$`, visual conversions) lives in the dispatch
//! module because it touches command variables.

use crate::vars::{MotionKind, ScrollKind, Verb};
use core_input::{keys, NavKey};
use core_motion::{SearchDir, SeekKind};
use core_state::VisualKind;

/// What a motion-class keystroke means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKey {
    Plain(MotionKind),
    /// `;` — repeat the remembered seek.
    RepeatSeek,
    /// `n`/`N` — repeat the remembered search, optionally reversed.
    SearchAgain { invert: bool },
}

/// Complete motions (seeks and searches enter through their own prefixes).
pub fn motion_key(c: char) -> Option<MotionKey> {
    use MotionKind::*;
    let plain = |m| Some(MotionKey::Plain(m));
    match c {
        keys::BS => plain(BackChar),
        keys::LF => plain(LineDown),
        ' ' => plain(ForwardChar),
        '$' => plain(LineEnd),
        '%' => plain(MatchPair),
        '^' => plain(FirstNonBlank),
        'b' => plain(WordBack(true)),
        'B' => plain(WordBack(false)),
        'e' => plain(WordEnd(true)),
        'E' => plain(WordEnd(false)),
        'G' => plain(GotoLine),
        'h' => plain(Left),
        'j' => plain(Down),
        'k' => plain(Up),
        'l' => plain(Right),
        '0' => plain(LineStart),
        'w' => plain(WordForward(true)),
        'W' => plain(WordForward(false)),
        '|' => plain(Column),
        ';' => Some(MotionKey::RepeatSeek),
        'n' => Some(MotionKey::SearchAgain { invert: false }),
        'N' => Some(MotionKey::SearchAgain { invert: true }),
        _ => None,
    }
}

/// Operators (and `r`) that await a further argument.
pub fn partial_command(c: char) -> Option<Verb> {
    match c {
        'c' => Some(Verb::Change),
        'd' => Some(Verb::Delete),
        'r' => Some(Verb::ReplaceChar),
        'y' => Some(Verb::Yank),
        _ => None,
    }
}

/// Commands complete in themselves (no shorthand decode needed).
pub fn immediate_verb(c: char) -> Option<Verb> {
    match c {
        keys::CTRL_B => Some(Verb::Scroll(ScrollKind::PageUp)),
        keys::CTRL_D => Some(Verb::Scroll(ScrollKind::HalfDown)),
        keys::CTRL_E => Some(Verb::Scroll(ScrollKind::LineDown)),
        keys::CTRL_F => Some(Verb::Scroll(ScrollKind::PageDown)),
        keys::CTRL_U => Some(Verb::Scroll(ScrollKind::HalfUp)),
        keys::CTRL_Y => Some(Verb::Scroll(ScrollKind::LineUp)),
        keys::CTRL_R => Some(Verb::Redo),
        '.' => Some(Verb::Repeat),
        'a' => Some(Verb::Append),
        'A' => Some(Verb::AppendLineEnd),
        'I' => Some(Verb::InsertLineStart),
        'i' => Some(Verb::Insert),
        'J' => Some(Verb::Join),
        'o' => Some(Verb::OpenBelow),
        'O' => Some(Verb::OpenAbove),
        'p' => Some(Verb::PasteAfter),
        'P' => Some(Verb::PasteBefore),
        'R' => Some(Verb::Overwrite),
        'u' => Some(Verb::Undo),
        '~' => Some(Verb::ToggleCase),
        _ => None,
    }
}

/// Every char accepted as a complete command, shorthand forms included.
pub fn is_complete_command(c: char) -> bool {
    immediate_verb(c).is_some() || matches!(c, 'C' | 'D' | 'x' | 'X' | 's' | 'S' | 'Y')
}

/// Complete commands that execute the same regardless of an active visual
/// selection (the scroll keys).
pub fn is_visual_irrelevant(c: char) -> bool {
    matches!(
        c,
        keys::CTRL_B | keys::CTRL_D | keys::CTRL_E | keys::CTRL_F | keys::CTRL_U | keys::CTRL_Y
    )
}

/// Complete commands that consume the visual selection as their range.
pub fn is_visual_compatible(c: char) -> bool {
    matches!(
        c,
        'C' | 'D' | 'J' | 'p' | 'P' | 'R' | 's' | 'S' | 'x' | 'X' | 'Y' | '~'
    )
}

/// Motions allowed to come back unmoved without aborting a bare command.
pub fn ok_not_to_move(motion: MotionKind) -> bool {
    matches!(
        motion,
        MotionKind::LineEnd
            | MotionKind::FirstNonBlank
            | MotionKind::GotoLine
            | MotionKind::LineStart
            | MotionKind::Column
            | MotionKind::Seek
            | MotionKind::Search
    )
}

/// Commands whose inserted text a count multiplies on Esc (`3ifoo<Esc>`).
pub fn is_repeatable_insert(verb: Verb) -> bool {
    matches!(
        verb,
        Verb::Append
            | Verb::AppendLineEnd
            | Verb::Insert
            | Verb::InsertLineStart
            | Verb::OpenBelow
            | Verb::OpenAbove
            | Verb::Overwrite
    )
}

pub fn is_combo_char(c: char) -> bool {
    c == 'g'
}

pub fn seek_kind(c: char) -> Option<SeekKind> {
    match c {
        'f' => Some(SeekKind::ToForward),
        'F' => Some(SeekKind::ToBackward),
        't' => Some(SeekKind::TillForward),
        'T' => Some(SeekKind::TillBackward),
        _ => None,
    }
}

pub fn search_dir(c: char) -> Option<SearchDir> {
    match c {
        '/' => Some(SearchDir::Forward),
        '?' => Some(SearchDir::Backward),
        _ => None,
    }
}

pub fn visual_kind(c: char) -> Option<VisualKind> {
    match c {
        'v' => Some(VisualKind::Char),
        'V' => Some(VisualKind::Line),
        _ => None,
    }
}

/// Navigation keycode → equivalent motion char, decoded like a typed key.
pub fn nav_motion_char(key: NavKey) -> Option<char> {
    match key {
        NavKey::Left => Some('h'),
        NavKey::Up => Some('k'),
        NavKey::Right => Some('l'),
        NavKey::Down => Some('j'),
        NavKey::End => Some('$'),
        NavKey::Home => Some('0'),
        _ => None,
    }
}
