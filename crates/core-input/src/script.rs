//! Key-script notation.
//!
//! A compact way to describe keystroke sequences for the driver binary and
//! the test suites: plain characters are typed as themselves, special keys
//! use angle-bracket tokens in the familiar `<Esc>`, `<CR>`, `<C-r>`,
//! `<Left>` style. `<lt>` produces a literal `<`.

use crate::{HostKey, NavKey};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unterminated key token starting at char {0}")]
    Unterminated(usize),
    #[error("unknown key token <{0}>")]
    UnknownToken(String),
}

fn named_token(name: &str) -> Option<HostKey> {
    let ch = |c: char| Some(HostKey::Char { ch: c, ctrl: false });
    let nav = |k: NavKey| Some(HostKey::Nav { key: k, ctrl: false });
    match name {
        "Esc" | "esc" => ch('\u{1b}'),
        "CR" | "cr" | "Enter" | "enter" | "Return" => ch('\r'),
        "NL" | "nl" => ch('\n'),
        "Tab" | "tab" => ch('\t'),
        "BS" | "bs" => ch('\u{08}'),
        "Space" | "space" => ch(' '),
        "lt" => ch('<'),
        "Left" => nav(NavKey::Left),
        "Right" => nav(NavKey::Right),
        "Up" => nav(NavKey::Up),
        "Down" => nav(NavKey::Down),
        "Home" => nav(NavKey::Home),
        "End" => nav(NavKey::End),
        "Del" | "Delete" => nav(NavKey::Delete),
        "PageUp" => nav(NavKey::PageUp),
        "PageDown" => nav(NavKey::PageDown),
        _ => None,
    }
}

/// Parse a key script into host events.
pub fn parse_keys(script: &str) -> Result<Vec<HostKey>, ScriptError> {
    let mut out = Vec::new();
    let mut chars = script.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        if c != '<' {
            out.push(HostKey::Char { ch: c, ctrl: false });
            continue;
        }
        let mut name = String::new();
        let mut closed = false;
        for (_, t) in chars.by_ref() {
            if t == '>' {
                closed = true;
                break;
            }
            name.push(t);
        }
        if !closed {
            return Err(ScriptError::Unterminated(at));
        }
        if let Some(rest) = name.strip_prefix("C-") {
            let mut it = rest.chars();
            match (it.next(), it.next()) {
                (Some(ch), None) => {
                    out.push(HostKey::Char { ch, ctrl: true });
                    continue;
                }
                _ => return Err(ScriptError::UnknownToken(name)),
            }
        }
        match named_token(&name) {
            Some(key) => out.push(key),
            None => return Err(ScriptError::UnknownToken(name)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_chars() {
        let keys = parse_keys("dw").unwrap();
        assert_eq!(
            keys,
            vec![
                HostKey::Char { ch: 'd', ctrl: false },
                HostKey::Char { ch: 'w', ctrl: false },
            ]
        );
    }

    #[test]
    fn named_and_ctrl_tokens() {
        let keys = parse_keys("i<Esc><C-r><Left>").unwrap();
        assert_eq!(
            keys,
            vec![
                HostKey::Char { ch: 'i', ctrl: false },
                HostKey::Char { ch: '\u{1b}', ctrl: false },
                HostKey::Char { ch: 'r', ctrl: true },
                HostKey::Nav { key: NavKey::Left, ctrl: false },
            ]
        );
    }

    #[test]
    fn literal_less_than() {
        let keys = parse_keys("<lt>x").unwrap();
        assert_eq!(
            keys,
            vec![
                HostKey::Char { ch: '<', ctrl: false },
                HostKey::Char { ch: 'x', ctrl: false },
            ]
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse_keys("a<Es"), Err(ScriptError::Unterminated(1)));
        assert_eq!(
            parse_keys("<Bogus>"),
            Err(ScriptError::UnknownToken("Bogus".into()))
        );
    }
}
