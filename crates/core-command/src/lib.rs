//! The modal command interpreter.
//!
//! A `Window` groups everything shared across the text widgets of one host
//! window: the register bank, configuration, and the host callback objects.
//! A `Session` is the per-widget interpreter state: command variables, undo
//! history, and the keystroke queue. Every operation takes the window, the
//! session, and the widget's `Surface` explicitly; there is no ambient
//! "current element" anywhere in the crate.
//!
//! Command aborts are control flow, not errors: the interpreter threads
//! `Flow<T> = Result<T, Abort>` through decode and execution with `?`, and
//! the queue-draining loop at the top interprets `Abort` by dropping the
//! rest of the queued keystrokes. By the time an `Abort` value exists, the
//! bell has rung and the command state is already reset.

pub mod decode;
pub mod exec;
pub mod insert;
pub mod vars;
pub mod visual;

mod ctx;
mod dispatch;
mod session;

pub use session::{PushOutcome, Session};
pub use vars::{CommandVars, LastCommand, MotionKind, ScrollKind, Verb};

use core_config::Config;
use core_state::{Mode, RegisterFile, VisualKind};

/// Command-abort control signal. Constructed only by `Ctx::abort`, which has
/// already rung the bell and reset state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

/// Interpreter control flow.
pub type Flow<T> = Result<T, Abort>;

/// Host notification capability. All methods default to no-ops; a host
/// without a status bar or bell simply ignores them.
pub trait EditorNotifier {
    /// Mode (or visual-kind) transition, for status display.
    fn mode_changed(&mut self, _mode: Mode, _visual: Option<VisualKind>) {}

    /// Routine error signal (failed motion, bad key sequence).
    fn bell(&mut self) {}

    /// Developer-facing invariant diagnostics, gated by configuration.
    fn diagnostic(&mut self, _message: &str) {}
}

/// No-op notifier used when the host does not attach one.
pub struct NoopNotifier;

impl EditorNotifier for NoopNotifier {}

/// The two host-backed registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRegister {
    /// `+`
    Clipboard,
    /// `*`
    Selection,
}

/// Result of asking the host for clipboard/selection content.
pub enum ClipboardFetch {
    /// Content available synchronously.
    Ready(String),
    /// The host will answer later through `Session::provide_clipboard`;
    /// command processing suspends until then.
    Deferred,
}

/// Host clipboard/selection bridge. Writes are fire-and-forget; reads may
/// suspend the pending command (see `Session::push_key`).
pub trait ClipboardHost {
    fn fetch(&mut self, which: HostRegister) -> ClipboardFetch;

    fn store(&mut self, _which: HostRegister, _text: &str) {}
}

/// Shared state of one logical host window.
pub struct Window {
    pub registers: RegisterFile,
    pub config: Config,
    notifier: Box<dyn EditorNotifier>,
    clipboard: Option<Box<dyn ClipboardHost>>,
}

impl Window {
    pub fn new(config: Config) -> Self {
        Self {
            registers: RegisterFile::new(),
            config,
            notifier: Box::new(NoopNotifier),
            clipboard: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn EditorNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardHost>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Whether `"+`/`"*` are accepted register names. Without a clipboard
    /// bridge they are not, mirroring hosts that cannot reach a clipboard.
    pub fn has_host_registers(&self) -> bool {
        self.clipboard.is_some()
    }

    pub(crate) fn notifier_mut(&mut self) -> &mut dyn EditorNotifier {
        self.notifier.as_mut()
    }

    pub(crate) fn clipboard_mut(&mut self) -> Option<&mut (dyn ClipboardHost + 'static)> {
        self.clipboard.as_deref_mut()
    }
}
