//! Window-global register bank.
//!
//! Deletions and yanks always land in the default register `"`; a named
//! register receives a copy when the command asked for one. Each slot keeps
//! a linewise flag deciding how a later paste splices the text. The `+` and
//! `*` slots are caches of host clipboard/selection content: the command
//! layer pushes writes out to the host and refreshes the cache when the host
//! answers a fetch, so a read here is always the last-known value (staleness
//! against the system clipboard is accepted).
//!
//! The bank also remembers the last seek and last search direction, which is
//! what lets `;`, `n`, and `N` work across every surface of the window.

use core_motion::{SearchDir, SeekKind};
use std::collections::HashMap;
use tracing::trace;

/// Register names. `Hidden`-ish slots (seek/search memory) are separate
/// fields on `RegisterFile`, not addressable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegName {
    /// `"` — default yank/delete target.
    Default,
    /// `.` — text of the last insert run.
    Insert,
    /// `+` — system clipboard (host pass-through, cached).
    Clipboard,
    /// `*` — system selection (host pass-through, cached).
    Selection,
    /// `/` — last search pattern.
    SearchPattern,
    /// `a`–`z`.
    Named(char),
}

impl RegName {
    /// Register named by the char typed after `"`, if it is one.
    pub fn from_char(c: char, host_registers: bool) -> Option<RegName> {
        match c {
            'a'..='z' => Some(RegName::Named(c)),
            '.' => Some(RegName::Insert),
            '/' => Some(RegName::SearchPattern),
            '+' if host_registers => Some(RegName::Clipboard),
            '*' if host_registers => Some(RegName::Selection),
            _ => None,
        }
    }

    pub fn is_host_passthrough(self) -> bool {
        matches!(self, RegName::Clipboard | RegName::Selection)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    pub text: String,
    pub linewise: bool,
}

/// One window's registers plus seek/search memory.
#[derive(Debug, Default)]
pub struct RegisterFile {
    slots: HashMap<RegName, Register>,
    last_seek: Option<(SeekKind, char)>,
    last_search_dir: Option<SearchDir>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register; unset registers read as empty, charwise.
    pub fn get(&self, name: RegName) -> Register {
        self.slots.get(&name).cloned().unwrap_or_default()
    }

    pub fn is_linewise(&self, name: RegName) -> bool {
        self.slots.get(&name).map(|r| r.linewise).unwrap_or(false)
    }

    pub fn set(&mut self, name: RegName, text: impl Into<String>, linewise: bool) {
        let text = text.into();
        trace!(
            target: "state.regs",
            ?name,
            len = text.chars().count(),
            linewise,
            "set"
        );
        self.slots.insert(name, Register { text, linewise });
    }

    /// Append to the insert register during a text-entry run.
    pub fn append_insert(&mut self, text: &str) {
        let slot = self.slots.entry(RegName::Insert).or_default();
        slot.text.push_str(text);
    }

    pub fn last_seek(&self) -> Option<(SeekKind, char)> {
        self.last_seek
    }

    pub fn set_last_seek(&mut self, kind: SeekKind, target: char) {
        self.last_seek = Some((kind, target));
    }

    pub fn last_search_dir(&self) -> Option<SearchDir> {
        self.last_search_dir
    }

    pub fn set_last_search_dir(&mut self, dir: SearchDir) {
        self.last_search_dir = Some(dir);
    }
}
