//! Keystroke ingestion: the vocabulary the interpreter consumes and the
//! folding from raw host events into it.
//!
//! A host delivers either a resolved character (its keypress path) or a
//! navigation keycode (arrows, Home/End, Delete — keys with no character).
//! Folding normalizes the character path: Ctrl+letter becomes the
//! corresponding C0 control char, CR becomes LF, Ctrl+`[` becomes Escape,
//! and Ctrl chords the interpreter does not know are dropped so the host
//! keeps its own shortcuts.

use tracing::trace;

pub mod keys;
pub mod queue;
pub mod script;

pub use queue::KeyQueue;

/// Navigation keys that arrive as keycodes rather than characters. The
/// command layer maps them onto the equivalent motion/operator characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Left,
    Up,
    Right,
    Down,
    Home,
    End,
    Delete,
    PageUp,
    PageDown,
}

/// One keystroke in interpreter vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// A resolved printable or control character.
    Char(char),
    /// A navigation keycode.
    Nav(NavKey),
}

/// Raw host keyboard event, before folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKey {
    Char { ch: char, ctrl: bool },
    Nav { key: NavKey, ctrl: bool },
}

/// Ctrl+letter to C0 control char.
fn convert_control(c: char) -> char {
    match c {
        'a'..='z' => char::from((c as u8) - b'a' + 1),
        // Ctrl chords may report the uppercase letter; the shift is folded
        // away like the lowercase path.
        'A'..='Z' => char::from((c as u8) - b'A' + 1),
        _ => c,
    }
}

fn is_recognized_ctrl(c: char) -> bool {
    matches!(
        c,
        keys::CTRL_B
            | keys::CTRL_C
            | keys::CTRL_D
            | keys::CTRL_E
            | keys::CTRL_F
            | keys::ESC
            | keys::BS
            | keys::TAB
            | keys::LF
            | keys::CTRL_R
            | keys::CTRL_U
            | keys::CTRL_Y
    )
}

/// Fold a raw host event into a keystroke, or `None` when the event should
/// be left to the host (unrecognized Ctrl chords).
pub fn fold(host: HostKey) -> Option<Keystroke> {
    match host {
        HostKey::Char { ch, ctrl } => {
            let mut c = ch;
            if ctrl {
                if c == '[' {
                    c = keys::ESC;
                } else {
                    c = convert_control(c);
                }
            }
            if c == '\r' {
                c = keys::LF;
            }
            if ctrl && !is_recognized_ctrl(c) {
                trace!(target: "input.fold", code = c as u32, "unrecognized ctrl chord dropped");
                return None;
            }
            Some(Keystroke::Char(c))
        }
        // Ctrl+navigation behaves like the plain key.
        HostKey::Nav { key, .. } => Some(Keystroke::Nav(key)),
    }
}
