//! Mode-machine flows: counts, register prefixes, combos, queue batching,
//! configuration-dependent routing.

mod common;

use common::Fixture;
use core_command::{EditorNotifier, PushOutcome, Window};
use core_config::{Config, StartMode, TabHandling};
use core_input::script::parse_keys;
use core_state::{Mode, VisualKind};
use core_surface::Surface;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn counts_accumulate_digit_by_digit() {
    let mut f = Fixture::new("abcdefghijklmnop").at(0);
    f.keys("12x");
    assert_eq!(f.text(), "mnop");
}

#[test]
fn zero_is_a_motion_not_a_count() {
    let mut f = Fixture::new("abc def\n").at(5);
    f.keys("0");
    assert_eq!(f.cursor(), 0);
    // and d0 deletes to line start
    let mut f = Fixture::new("abc def\n").at(5);
    f.keys("d0");
    assert_eq!(f.text(), "ef\n");
}

#[test]
fn counts_multiply_around_register() {
    // 2"a3x = six chars into register a
    let mut f = Fixture::new("abcdefgh").at(0);
    f.keys("2\"a3x");
    assert_eq!(f.text(), "gh");
    assert_eq!(f.reg(core_state::RegName::Named('a')).text, "abcdef");
}

#[test]
fn second_register_aborts() {
    let mut f = Fixture::new("abc\n").at(0);
    // More than one register in a command is rejected outright.
    f.keys("\"a2\"");
    assert_eq!(f.session.mode(), Mode::Command);
    assert_eq!(f.text(), "abc\n");
    assert_eq!(f.reg(core_state::RegName::Named('a')).text, "");
    assert_eq!(f.reg(core_state::RegName::Named('b')).text, "");
}

#[test]
fn gg_goes_to_first_line_g_to_last() {
    let mut f = Fixture::new("aa\nbb\ncc").at(4);
    f.keys("G");
    assert_eq!(f.cursor(), 6);
    f.keys("gg");
    assert_eq!(f.cursor(), 0);
    f.keys("2G");
    assert_eq!(f.cursor(), 3);
}

#[test]
fn bad_combo_aborts() {
    let mut f = Fixture::new("abc").at(1);
    f.keys("gx");
    assert_eq!(f.session.mode(), Mode::Command);
    assert_eq!(f.text(), "abc");
}

#[test]
fn vertical_motion_remembers_column() {
    let mut f = Fixture::new("abcdef\nxy\nlmnopq\n").at(4);
    f.keys("j");
    // short line clamps
    assert_eq!(f.cursor(), 8);
    f.keys("j");
    // column restored on the longer line
    assert_eq!(f.cursor(), 14);
}

#[test]
fn dollar_pins_column_to_line_end() {
    let mut f = Fixture::new("abc\nlonger\nxy\n").at(0);
    f.keys("$j");
    assert_eq!(f.cursor(), 9); // 'r' of longer
    f.keys("j");
    assert_eq!(f.cursor(), 12); // 'y'
}

#[test]
fn arrow_keys_mirror_hjkl() {
    let mut f = Fixture::new("ab\ncd").at(0);
    f.keys("<Right>");
    assert_eq!(f.cursor(), 1);
    f.keys("<Down>");
    assert_eq!(f.cursor(), 4);
    f.keys("<Left>");
    assert_eq!(f.cursor(), 3);
    f.keys("<Up>");
    assert_eq!(f.cursor(), 0);
    f.keys("<End>");
    assert_eq!(f.cursor(), 1);
    f.keys("<Home>");
    assert_eq!(f.cursor(), 0);
}

#[test]
fn delete_keycode_acts_like_x_in_command_mode() {
    let mut f = Fixture::new("abc").at(0);
    f.keys("<Del>");
    assert_eq!(f.text(), "bc");
}

#[test]
fn scroll_commands_do_not_disturb_state() {
    let mut f = Fixture::new("a\nb\nc\nd\ne\n").at(2);
    f.keys("<C-d><C-u><C-e><C-y><C-f><C-b>");
    assert_eq!(f.cursor(), 2);
    assert_eq!(f.session.mode(), Mode::Command);
    assert_eq!(f.text(), "a\nb\nc\nd\ne\n");
}

#[test]
fn queue_batches_insert_burst_into_one_splice() {
    let mut f = Fixture::new("").at(0);
    // enter insert first
    f.keys("i");
    // then enqueue a burst without flushing in between
    for key in parse_keys("abc").unwrap() {
        let outcome = f.session.push_key(&mut f.win, &mut f.surface, key);
        assert_eq!(outcome, PushOutcome::Deferred);
    }
    f.session.process_queue(&mut f.win, &mut f.surface);
    assert_eq!(f.text(), "abc");
    // the whole burst coalesced into a single undo record
    f.keys("<Esc>u");
    assert_eq!(f.text(), "");
}

#[test]
fn queued_backspace_cancels_queued_char() {
    let mut f = Fixture::new("").at(0);
    f.keys("i");
    for key in parse_keys("ab<BS>c").unwrap() {
        f.session.push_key(&mut f.win, &mut f.surface, key);
    }
    f.session.process_queue(&mut f.win, &mut f.surface);
    assert_eq!(f.text(), "ac");
}

#[test]
fn abort_clears_queued_backlog() {
    let mut f = Fixture::new("abc def ghi\n").at(0);
    // 'q' aborts; the queued 'dw' must NOT run afterwards
    for key in parse_keys("qdw").unwrap() {
        f.session.push_key(&mut f.win, &mut f.surface, key);
    }
    f.session.process_queue(&mut f.win, &mut f.surface);
    assert_eq!(f.text(), "abc def ghi\n");
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn full_queue_flushes_synchronously() {
    let mut f = Fixture::new("").at(0);
    f.keys("i");
    let keys = parse_keys(&"x".repeat(25)).unwrap();
    let mut flushed = false;
    for key in keys {
        if f.session.push_key(&mut f.win, &mut f.surface, key) == PushOutcome::Flushed {
            flushed = true;
        }
    }
    f.session.process_queue(&mut f.win, &mut f.surface);
    assert!(flushed);
    assert_eq!(f.text(), "x".repeat(25));
}

#[test]
fn tab_ignored_by_configuration() {
    let config = Config {
        tab: TabHandling::Ignore,
        ..Default::default()
    };
    let mut f = Fixture::with_config("", config).at(0);
    f.keys("i");
    let tab = parse_keys("<Tab>").unwrap()[0];
    let outcome = f.session.push_key(&mut f.win, &mut f.surface, tab);
    assert_eq!(outcome, PushOutcome::Ignored);
    assert_eq!(f.text(), "");
}

#[test]
fn tab_inserts_in_insert_mode_by_default() {
    let mut f = Fixture::new("").at(0);
    f.keys("i<Tab>x<Esc>");
    assert_eq!(f.text(), "\tx");
}

#[test]
fn tab_left_to_host_in_command_mode() {
    let mut f = Fixture::new("abc").at(0);
    let tab = parse_keys("<Tab>").unwrap()[0];
    let outcome = f.session.push_key(&mut f.win, &mut f.surface, tab);
    assert_eq!(outcome, PushOutcome::Ignored);
}

#[test]
fn unrecognized_ctrl_chord_left_to_host() {
    let mut f = Fixture::new("abc").at(0);
    let key = core_input::HostKey::Char { ch: 'q', ctrl: true };
    let outcome = f.session.push_key(&mut f.win, &mut f.surface, key);
    assert_eq!(outcome, PushOutcome::Ignored);
}

#[test]
fn default_mode_insert_starts_typing_directly() {
    let config = Config {
        start_mode: StartMode::Insert,
        ..Default::default()
    };
    let mut f = Fixture::with_config("", config).at(0);
    f.keys("hi");
    assert_eq!(f.text(), "hi");
    assert_eq!(f.session.mode(), Mode::Insert);
    f.keys("<Esc>");
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn adopt_selection_enters_charwise_visual() {
    let mut f = Fixture::new("abcdef").at(0);
    f.surface.set_selection(1, 4);
    f.session.adopt_selection(&mut f.win, &mut f.surface);
    assert_eq!(f.session.visual(), Some(VisualKind::Char));
    f.keys("d");
    assert_eq!(f.text(), "aef");
}

#[test]
fn adopt_collapsed_caret_normalizes_off_newline() {
    let mut f = Fixture::new("ab\ncd").at(0);
    f.surface.set_selection(2, 2); // on the newline
    f.session.adopt_selection(&mut f.win, &mut f.surface);
    assert_eq!(f.cursor(), 1);
}

struct CountingNotifier {
    bells: Rc<RefCell<usize>>,
    modes: Rc<RefCell<Vec<Mode>>>,
}

impl EditorNotifier for CountingNotifier {
    fn mode_changed(&mut self, mode: Mode, _visual: Option<VisualKind>) {
        self.modes.borrow_mut().push(mode);
    }

    fn bell(&mut self) {
        *self.bells.borrow_mut() += 1;
    }
}

#[test]
fn bell_rings_on_abort_and_mode_changes_notify() {
    let bells = Rc::new(RefCell::new(0));
    let modes = Rc::new(RefCell::new(Vec::new()));
    let notifier = CountingNotifier {
        bells: bells.clone(),
        modes: modes.clone(),
    };
    let win = Window::new(Config::default()).with_notifier(Box::new(notifier));
    let mut f = Fixture::with_window("abc", win).at(0);
    f.keys("q");
    assert_eq!(*bells.borrow(), 1);
    f.keys("i");
    assert!(modes.borrow().contains(&Mode::Insert));
}

#[test]
fn visual_bell_can_be_inhibited() {
    let bells = Rc::new(RefCell::new(0));
    let modes = Rc::new(RefCell::new(Vec::new()));
    let notifier = CountingNotifier {
        bells: bells.clone(),
        modes,
    };
    let config = Config {
        visual_bell: false,
        ..Default::default()
    };
    let win = Window::new(config).with_notifier(Box::new(notifier));
    let mut f = Fixture::with_window("abc", win).at(0);
    f.keys("q");
    assert_eq!(*bells.borrow(), 0);
    assert_eq!(f.session.mode(), Mode::Command);
}
