//! Configuration loading and parsing.
//!
//! Preferences live in `vimbed.toml` next to wherever the host decides to
//! keep them; the binary discovers one in the working directory. Unknown
//! keys are ignored so the file can grow without breaking older builds, and
//! a missing file simply yields defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Mode a fresh session starts in. Host text widgets are insert-first by
/// nature, so some users prefer sessions to begin as if `i` had been typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StartMode {
    #[default]
    Command,
    Insert,
}

/// How `u` behaves: vim-style (always undo, `Ctrl-R` redoes) or vi-style
/// (`u` alternates between undoing and redoing the same change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UndoStyle {
    #[default]
    Vim,
    Vi,
}

/// Whether Tab in command mode is left to the host (focus traversal) or
/// treated as ordinary insertable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TabHandling {
    #[default]
    Insert,
    Ignore,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct BehaviorSection {
    #[serde(default)]
    default_mode: StartMode,
    #[serde(default)]
    undo_style: UndoStyle,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct InputSection {
    #[serde(default)]
    tab: TabHandling,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BellSection {
    #[serde(default = "default_true")]
    visual: bool,
}

impl Default for BellSection {
    fn default() -> Self {
        Self { visual: true }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct DiagnosticsSection {
    /// Surface invariant violations through the host's diagnostic callback
    /// (they are always logged regardless).
    #[serde(default)]
    alerts: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct ConfigFile {
    #[serde(default)]
    behavior: BehaviorSection,
    #[serde(default)]
    input: InputSection,
    #[serde(default)]
    bell: BellSection,
    #[serde(default)]
    diagnostics: DiagnosticsSection,
}

/// Resolved configuration consumed by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub start_mode: StartMode,
    pub undo_style: UndoStyle,
    pub tab: TabHandling,
    pub visual_bell: bool,
    pub diagnostic_alerts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_mode: StartMode::Command,
            undo_style: UndoStyle::Vim,
            tab: TabHandling::Insert,
            visual_bell: true,
            diagnostic_alerts: false,
        }
    }
}

impl From<ConfigFile> for Config {
    fn from(f: ConfigFile) -> Self {
        Self {
            start_mode: f.behavior.default_mode,
            undo_style: f.behavior.undo_style,
            tab: f.input.tab,
            visual_bell: f.bell.visual,
            diagnostic_alerts: f.diagnostics.alerts,
        }
    }
}

pub const CONFIG_FILE_NAME: &str = "vimbed.toml";

/// Load configuration from `path`, or defaults when `None`.
pub fn load_from(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p,
        None => {
            info!(target: "config", "no config file; using defaults");
            return Ok(Config::default());
        }
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let file: ConfigFile =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    let config = Config::from(file);
    info!(target: "config", path = %path.display(), ?config, "config loaded");
    Ok(config)
}

/// Look for `vimbed.toml` in the current working directory.
pub fn discover() -> Option<PathBuf> {
    let candidate = PathBuf::from(CONFIG_FILE_NAME);
    if candidate.is_file() {
        Some(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_no_path() {
        let c = load_from(None).unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn parses_known_sections() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "[behavior]\ndefault-mode = \"insert\"\nundo-style = \"vi\"\n\
             [input]\ntab = \"ignore\"\n[bell]\nvisual = false\n\
             [diagnostics]\nalerts = true\n"
        )
        .unwrap();
        let c = load_from(Some(f.path())).unwrap();
        assert_eq!(c.start_mode, StartMode::Insert);
        assert_eq!(c.undo_style, UndoStyle::Vi);
        assert_eq!(c.tab, TabHandling::Ignore);
        assert!(!c.visual_bell);
        assert!(c.diagnostic_alerts);
    }

    #[test]
    fn unknown_keys_tolerated() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[future]\nshiny = 1\n[bell]\nvisual = true\n").unwrap();
        let c = load_from(Some(f.path())).unwrap();
        assert!(c.visual_bell);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "not toml [").unwrap();
        assert!(load_from(Some(f.path())).is_err());
    }
}
