#![allow(dead_code)]

use core_command::{Session, Window};
use core_config::Config;
use core_input::script::parse_keys;
use core_state::{RegName, Register};
use core_surface::{MemorySurface, Surface};

/// One window + one session + one in-memory surface, driven by key scripts.
pub struct Fixture {
    pub win: Window,
    pub session: Session,
    pub surface: MemorySurface,
}

impl Fixture {
    pub fn new(content: &str) -> Self {
        Self::with_config(content, Config::default())
    }

    pub fn with_config(content: &str, config: Config) -> Self {
        Self {
            win: Window::new(config),
            session: Session::new(),
            surface: MemorySurface::new(content),
        }
    }

    pub fn with_window(content: &str, win: Window) -> Self {
        Self {
            win,
            session: Session::new(),
            surface: MemorySurface::new(content),
        }
    }

    /// Place the cursor (collapsed selection) at a char offset.
    pub fn at(mut self, cursor: usize) -> Self {
        self.surface.set_selection(cursor, cursor);
        self
    }

    /// Feed a key script, flushing after every keystroke.
    pub fn keys(&mut self, script: &str) -> &mut Self {
        for key in parse_keys(script).expect("valid key script") {
            self.session.feed(&mut self.win, &mut self.surface, key);
        }
        self
    }

    pub fn text(&self) -> String {
        self.surface.text()
    }

    pub fn cursor(&self) -> usize {
        self.surface.selection().1
    }

    pub fn selection(&self) -> (usize, usize) {
        self.surface.selection()
    }

    pub fn reg(&self, name: RegName) -> Register {
        self.win.registers.get(name)
    }

    pub fn default_reg(&self) -> Register {
        self.reg(RegName::Default)
    }
}
