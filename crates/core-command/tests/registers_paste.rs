//! Register and paste semantics, including the host clipboard bridge.

mod common;

use common::Fixture;
use core_command::{ClipboardFetch, ClipboardHost, HostRegister, PushOutcome, Window};
use core_config::Config;
use core_input::script::parse_keys;
use core_state::{Mode, RegName};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn named_yank_then_paste_duplicates_line() {
    let mut f = Fixture::new("foo\nbar\n").at(0);
    f.keys("\"ayy");
    let reg = f.reg(RegName::Named('a'));
    assert_eq!(reg.text, "foo\n");
    assert!(reg.linewise);
    // the default register mirrors the yank
    assert_eq!(f.default_reg().text, "foo\n");

    f.keys("\"ap");
    assert_eq!(f.text(), "foo\nfoo\nbar\n");
    // linewise paste lands on the new line, not mid-line
    assert_eq!(f.cursor(), 4);
}

#[test]
fn charwise_paste_goes_after_cursor() {
    let mut f = Fixture::new("abc").at(0);
    f.keys("ylp");
    // yl yanked "a"; l moved to 'b'; p pastes after it
    assert_eq!(f.text(), "abac");
}

#[test]
fn paste_with_count_repeats_text() {
    let mut f = Fixture::new("ab").at(0);
    f.keys("yl3p");
    assert_eq!(f.text(), "aaaab");
}

#[test]
fn shift_p_pastes_before_cursor_linewise_above() {
    let mut f = Fixture::new("one\ntwo\n").at(4);
    f.keys("yy");
    f.keys("P");
    assert_eq!(f.text(), "one\ntwo\ntwo\n");
    assert_eq!(f.cursor(), 4);
}

#[test]
fn linewise_paste_at_end_of_unterminated_buffer_adds_newline() {
    let mut f = Fixture::new("aa\nbb").at(0);
    f.keys("yy");
    f.keys("G");
    f.keys("p");
    assert_eq!(f.text(), "aa\nbb\naa\n");
}

#[test]
fn delete_populates_default_register_for_paste() {
    let mut f = Fixture::new("foo bar").at(0);
    f.keys("dw$p");
    assert_eq!(f.text(), "barfoo ");
}

#[test]
fn named_register_is_window_global_across_sessions() {
    let mut f = Fixture::new("keep\n").at(0);
    f.keys("\"qyy");
    // A second surface in the same window sees the register.
    let mut other = core_surface::MemorySurface::new("");
    let mut session2 = core_command::Session::new();
    for key in parse_keys("\"qp").unwrap() {
        session2.feed(&mut f.win, &mut other, key);
    }
    use core_surface::Surface;
    assert_eq!(other.text(), "keep\n");
}

#[test]
fn unknown_register_name_aborts() {
    let mut f = Fixture::new("abc").at(0);
    f.keys("\"_x");
    // '"' then '_' aborted; the following 'x' ran as its own command
    assert_eq!(f.text(), "bc");
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn host_registers_rejected_without_clipboard_bridge() {
    let mut f = Fixture::new("abc").at(0);
    f.keys("\"+yy");
    // "+ aborted (no bridge), then y entered operator pending and the second
    // y doubled it: an ordinary yy into the default register. The register
    // records a full line even though the buffer lacks the newline.
    assert_eq!(f.default_reg().text, "abc\n");
}

#[derive(Default)]
struct FakeClipboard {
    content: Rc<RefCell<String>>,
    stored: Rc<RefCell<Vec<(HostRegister, String)>>>,
    defer: bool,
}

impl ClipboardHost for FakeClipboard {
    fn fetch(&mut self, _which: HostRegister) -> ClipboardFetch {
        if self.defer {
            ClipboardFetch::Deferred
        } else {
            ClipboardFetch::Ready(self.content.borrow().clone())
        }
    }

    fn store(&mut self, which: HostRegister, text: &str) {
        self.stored.borrow_mut().push((which, text.to_string()));
    }
}

#[test]
fn clipboard_paste_ready_path() {
    let clip = FakeClipboard {
        content: Rc::new(RefCell::new("HI".to_string())),
        ..Default::default()
    };
    let win = Window::new(Config::default()).with_clipboard(Box::new(clip));
    let mut f = Fixture::with_window("x", win).at(0);
    f.keys("\"+p");
    assert_eq!(f.text(), "xHI");
}

#[test]
fn clipboard_paste_suspends_and_resumes() {
    let clip = FakeClipboard {
        defer: true,
        ..Default::default()
    };
    let win = Window::new(Config::default()).with_clipboard(Box::new(clip));
    let mut f = Fixture::with_window("x", win).at(0);
    // Feed "+ then p by hand to observe the suspension.
    for key in parse_keys("\"+").unwrap() {
        f.session.feed(&mut f.win, &mut f.surface, key);
    }
    let p = parse_keys("p").unwrap()[0];
    let outcome = f.session.push_key(&mut f.win, &mut f.surface, p);
    assert_eq!(outcome, PushOutcome::AwaitingClipboard);
    // Nothing pasted yet.
    assert_eq!(f.text(), "x");
    f.session
        .provide_clipboard(&mut f.win, &mut f.surface, "LATE".to_string());
    assert_eq!(f.text(), "xLATE");
}

#[test]
fn clipboard_yank_pushes_to_host() {
    let stored = Rc::new(RefCell::new(Vec::new()));
    let clip = FakeClipboard {
        stored: stored.clone(),
        ..Default::default()
    };
    let win = Window::new(Config::default()).with_clipboard(Box::new(clip));
    let mut f = Fixture::with_window("hello\n", win).at(0);
    f.keys("\"+yy");
    let stored = stored.borrow();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, HostRegister::Clipboard);
    assert_eq!(stored[0].1, "hello\n");
}

#[test]
fn insert_register_replays_last_insert() {
    let mut f = Fixture::new("").at(0);
    f.keys("iword<Esc>");
    assert_eq!(f.reg(RegName::Insert).text, "word");
    // ". pastes it
    f.keys("\".p");
    assert_eq!(f.text(), "wordword");
}
