//! Per-surface session: the keystroke queue and its draining policy.
//!
//! Keystrokes are enqueued and drained by a deferred flush so rapid input
//! coalesces (see `core_input::queue`). Two cases bypass the deferral: a
//! full queue flushes synchronously, and a clipboard paste (`"+p`) suspends
//! until the host supplies the register content.

use crate::ctx::Ctx;
use crate::vars::{CommandVars, Verb};
use crate::{ClipboardFetch, HostRegister, Window};
use core_config::TabHandling;
use core_input::{fold, keys, HostKey, KeyQueue, Keystroke};
use core_state::{Mode, RegName, UndoManager, VisualKind};
use core_surface::Surface;
use tracing::{debug, trace};

/// What the host should do after handing a keystroke over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Enqueued; schedule a zero-delay `process_queue`.
    Deferred,
    /// The queue was flushed synchronously (it was full).
    Flushed,
    /// A paste needs clipboard content: fetch it and call
    /// `provide_clipboard`. No flush should be scheduled meanwhile.
    AwaitingClipboard,
    /// Not handled; the host should run its default action.
    Ignored,
}

/// Interpreter state for one editable surface.
pub struct Session {
    pub(crate) vars: CommandVars,
    pub(crate) undo: UndoManager,
    pub(crate) queue: KeyQueue,
    started: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            vars: CommandVars::new(Mode::Command),
            undo: UndoManager::new(),
            queue: KeyQueue::default(),
            started: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.vars.mode
    }

    pub fn visual(&self) -> Option<VisualKind> {
        self.vars.visual
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    /// First-use initialization: sessions may be configured to begin in
    /// insert mode, as if `i` had been typed (and repeatable as such).
    fn ensure_started(&mut self, win: &mut Window, surface: &mut dyn Surface) {
        if self.started {
            return;
        }
        self.started = true;
        if win.config.start_mode == core_config::StartMode::Insert {
            self.vars.cmd = Some(Verb::Insert);
            let mut ctx = Ctx::new(win, self, surface);
            ctx.end_non_text_command(true, Mode::Insert);
            ctx.set_mode(Mode::Insert);
        }
    }

    /// Accept one raw keystroke from the host.
    pub fn push_key(
        &mut self,
        win: &mut Window,
        surface: &mut dyn Surface,
        key: HostKey,
    ) -> PushOutcome {
        let stroke = match fold(key) {
            Some(s) => s,
            None => return PushOutcome::Ignored,
        };
        self.ensure_started(win, surface);

        // Tab is only ours inside text entry (or a pending `r`); command
        // mode leaves it to the host, and configuration may opt out wholly.
        if stroke == Keystroke::Char(keys::TAB) {
            if win.config.tab == TabHandling::Ignore {
                return PushOutcome::Ignored;
            }
            // The routing decision needs current state, not queued state.
            self.process_queue(win, surface);
            let in_replace =
                self.vars.mode == Mode::Command && self.vars.cmd == Some(Verb::ReplaceChar);
            if self.vars.mode == Mode::Command && !in_replace {
                return PushOutcome::Ignored;
            }
        }

        // A paste from a host register cannot proceed until the host hands
        // over the content; queue the key and suspend instead of scheduling
        // a flush. Stale cache wins if more input arrives meanwhile.
        if win.has_host_registers()
            && matches!(stroke, Keystroke::Char('p') | Keystroke::Char('P'))
            && self.vars.cmd.is_none()
        {
            let which = match self.vars.reg {
                Some(RegName::Clipboard) => Some(HostRegister::Clipboard),
                Some(RegName::Selection) => Some(HostRegister::Selection),
                _ => None,
            };
            if let Some(which) = which {
                if self.queue.push(stroke).is_err() {
                    self.process_queue(win, surface);
                    let _ = self.queue.push(stroke);
                }
                let fetch = win
                    .clipboard_mut()
                    .expect("has_host_registers checked")
                    .fetch(which);
                match fetch {
                    ClipboardFetch::Ready(text) => {
                        self.refresh_host_register(win, which, text);
                        self.process_queue(win, surface);
                        return PushOutcome::Flushed;
                    }
                    ClipboardFetch::Deferred => {
                        debug!(target: "input.queue", "paste suspended on clipboard fetch");
                        return PushOutcome::AwaitingClipboard;
                    }
                }
            }
        }

        if let Err(stroke) = self.queue.push(stroke) {
            // Full queue: flush, then keep strict arrival order.
            trace!(target: "input.queue", "queue full; synchronous flush");
            self.process_queue(win, surface);
            let _ = self.queue.push(stroke);
            self.process_queue(win, surface);
            return PushOutcome::Flushed;
        }
        if self.queue.is_full() {
            self.process_queue(win, surface);
            return PushOutcome::Flushed;
        }
        PushOutcome::Deferred
    }

    /// Drain queued keystrokes in arrival order. An aborted command drops
    /// the rest of the queue — it belonged to the aborted context.
    pub fn process_queue(&mut self, win: &mut Window, surface: &mut dyn Surface) {
        self.ensure_started(win, surface);
        let mut ctx = Ctx::new(win, self, surface);
        ctx.drain_queue();
    }

    /// Host answer to a deferred clipboard fetch; resumes the queued paste.
    pub fn provide_clipboard(
        &mut self,
        win: &mut Window,
        surface: &mut dyn Surface,
        text: String,
    ) {
        let which = match self.vars.reg {
            Some(RegName::Selection) => HostRegister::Selection,
            _ => HostRegister::Clipboard,
        };
        self.refresh_host_register(win, which, text);
        self.process_queue(win, surface);
    }

    fn refresh_host_register(&mut self, win: &mut Window, which: HostRegister, text: String) {
        let name = match which {
            HostRegister::Clipboard => RegName::Clipboard,
            HostRegister::Selection => RegName::Selection,
        };
        let linewise = win.registers.is_linewise(name);
        win.registers.set(name, text, linewise);
    }

    /// Push one keystroke and flush immediately. Convenience for hosts with
    /// no deferred-task machinery (the batch driver, tests).
    pub fn feed(
        &mut self,
        win: &mut Window,
        surface: &mut dyn Surface,
        key: HostKey,
    ) -> PushOutcome {
        let outcome = self.push_key(win, surface, key);
        if outcome == PushOutcome::Deferred {
            self.process_queue(win, surface);
        }
        outcome
    }

    /// The host reports that the user moved the caret or made a selection
    /// by other means (mouse). A non-empty selection becomes a charwise
    /// visual selection; a bare caret is normalized onto a real char.
    pub fn adopt_selection(&mut self, win: &mut Window, surface: &mut dyn Surface) {
        self.ensure_started(win, surface);
        let mut ctx = Ctx::new(win, self, surface);
        ctx.adopt_selection();
    }
}
