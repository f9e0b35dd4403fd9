//! Control characters the interpreter recognizes, named after their chords.

pub const CTRL_B: char = '\u{02}';
pub const CTRL_C: char = '\u{03}';
pub const CTRL_D: char = '\u{04}';
pub const CTRL_E: char = '\u{05}';
pub const CTRL_F: char = '\u{06}';
pub const BS: char = '\u{08}';
pub const TAB: char = '\t';
pub const LF: char = '\n';
pub const CTRL_R: char = '\u{12}';
pub const CTRL_U: char = '\u{15}';
pub const CTRL_Y: char = '\u{19}';
pub const ESC: char = '\u{1b}';
