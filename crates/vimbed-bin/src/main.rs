//! vimbed entrypoint: apply a key script to a text buffer headlessly.
//!
//! The binary is the reference host: it stands in for a browser text widget
//! by wrapping the input text in a `MemorySurface`, feeds the key script
//! through a `Session`, and prints the resulting buffer. Useful for
//! experimenting with command semantics and for scripted batch edits:
//!
//! ```text
//! vimbed --keys 'dw' notes.txt
//! echo 'foo bar' | vimbed --keys '"ayw$"ap'
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use core_command::{EditorNotifier, PushOutcome, Session, Window};
use core_config::load_from;
use core_input::script::parse_keys;
use core_state::{Mode, VisualKind};
use core_surface::{MemorySurface, Surface};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "vimbed", version, about = "Headless modal editing over a text buffer")]
struct Args {
    /// Input file (UTF-8 text); stdin when omitted.
    pub path: Option<PathBuf>,

    /// Key script to apply, e.g. 'dw', '"ayy"ap', 'cwword<Esc>'.
    #[arg(long = "keys", short = 'k')]
    pub keys: String,

    /// Initial cursor position (char offset).
    #[arg(long = "cursor", default_value_t = 0)]
    pub cursor: usize,

    /// Configuration file (defaults to discovering `vimbed.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Print the final cursor offset and mode to stderr.
    #[arg(long = "state", default_value_t = false)]
    pub state: bool,

    /// Write a trace log to this file (level via VIMBED_LOG).
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("VIMBED_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .context("log file path has no file name")?;
            let appender = tracing_appender::rolling::never(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Stderr notifier so bells and diagnostics are visible in batch runs.
struct StderrNotifier;

impl EditorNotifier for StderrNotifier {
    fn mode_changed(&mut self, mode: Mode, visual: Option<VisualKind>) {
        debug!(target: "host", ?mode, ?visual, "mode");
    }

    fn bell(&mut self) {
        eprintln!("vimbed: bell");
    }

    fn diagnostic(&mut self, message: &str) {
        eprintln!("vimbed: diagnostic: {message}");
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_ref())?;

    let config_path = args.config.clone().or_else(core_config::discover);
    let config = load_from(config_path.as_deref())?;

    let content = read_input(args.path.as_ref())?;
    let keys = parse_keys(&args.keys).context("parsing key script")?;
    info!(target: "host", keys = keys.len(), bytes = content.len(), "starting batch session");

    let mut window = Window::new(config).with_notifier(Box::new(StderrNotifier));
    let mut surface = MemorySurface::new(&content);
    let cursor = args.cursor.min(surface.len());
    surface.set_selection(cursor, cursor);
    let mut session = Session::new();

    for key in keys {
        let outcome = session.feed(&mut window, &mut surface, key);
        if outcome == PushOutcome::AwaitingClipboard {
            // No clipboard in batch mode: resume with the cached value.
            session.provide_clipboard(&mut window, &mut surface, String::new());
        }
    }
    // A script ending mid-insert still shows its typed text; close the
    // command boundary the way Esc would.
    if session.mode() != Mode::Command {
        let esc = parse_keys("<Esc>").expect("static script");
        for key in esc {
            session.feed(&mut window, &mut surface, key);
        }
    }

    print!("{}", surface.text());
    if args.state {
        let (_, cursor) = surface.selection();
        eprintln!("cursor={cursor} mode={:?}", session.mode());
    }
    Ok(())
}
