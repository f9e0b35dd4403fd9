//! Undo/redo stacks, coalescing, and cursor placement.

mod common;

use common::Fixture;
use core_state::Mode;

#[test]
fn undo_reverses_delete() {
    let mut f = Fixture::new("foo bar\n").at(0);
    f.keys("dw");
    assert_eq!(f.text(), "bar\n");
    f.keys("u");
    assert_eq!(f.text(), "foo bar\n");
}

#[test]
fn redo_reapplies_undone_edit() {
    let mut f = Fixture::new("foo bar\n").at(0);
    f.keys("dwu<C-r>");
    assert_eq!(f.text(), "bar\n");
}

#[test]
fn round_trip_restores_original_exactly() {
    let original = "alpha beta\ngamma\n";
    let mut f = Fixture::new(original).at(0);
    f.keys("dw");
    f.keys("x");
    f.keys("iXY<Esc>");
    assert_ne!(f.text(), original);
    let edited = f.text();
    f.keys("uuu");
    assert_eq!(f.text(), original);
    assert_eq!(f.session.undo_depth(), 0);
    f.keys("<C-r><C-r><C-r>");
    assert_eq!(f.text(), edited);
}

#[test]
fn insert_run_undoes_as_one_action() {
    let mut f = Fixture::new("").at(0);
    f.keys("ihello world<Esc>");
    assert_eq!(f.text(), "hello world");
    assert_eq!(f.session.undo_depth(), 1);
    f.keys("u");
    assert_eq!(f.text(), "");
}

#[test]
fn undo_with_count_pops_multiple_records() {
    let mut f = Fixture::new("abcdef").at(0);
    f.keys("xxx");
    assert_eq!(f.text(), "def");
    f.keys("3u");
    assert_eq!(f.text(), "abcdef");
}

#[test]
fn undo_shortfall_rings_bell_without_breaking() {
    let mut f = Fixture::new("ab").at(0);
    f.keys("x");
    f.keys("9u");
    assert_eq!(f.text(), "ab");
    assert_eq!(f.session.mode(), Mode::Command);
    // still usable afterwards
    f.keys("x");
    assert_eq!(f.text(), "b");
}

#[test]
fn undo_on_empty_stack_aborts_quietly() {
    let mut f = Fixture::new("ab").at(0);
    f.keys("u");
    assert_eq!(f.text(), "ab");
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn new_edit_clears_redo() {
    let mut f = Fixture::new("abc").at(0);
    f.keys("xu");
    assert_eq!(f.session.redo_depth(), 1);
    f.keys("dd");
    assert_eq!(f.session.redo_depth(), 0);
}

#[test]
fn double_escape_is_a_noop() {
    let mut f = Fixture::new("abc").at(1);
    f.keys("<Esc>");
    let depth = f.session.undo_depth();
    let text = f.text();
    let cursor = f.cursor();
    f.keys("<Esc>");
    assert_eq!(f.session.undo_depth(), depth);
    assert_eq!(f.text(), text);
    assert_eq!(f.cursor(), cursor);
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn undo_of_open_line_restores_cursor() {
    let mut f = Fixture::new("one\ntwo\n").at(1);
    f.keys("oinserted<Esc>");
    assert_eq!(f.text(), "one\ninserted\ntwo\n");
    f.keys("u");
    assert_eq!(f.text(), "one\ntwo\n");
    // cursor back where it was before `o`
    assert_eq!(f.cursor(), 1);
}

#[test]
fn undo_after_deleting_final_line_backs_up() {
    let mut f = Fixture::new("aa\nbb\n").at(3);
    f.keys("dd");
    assert_eq!(f.text(), "aa\n");
    f.keys("dd");
    assert_eq!(f.text(), "");
    // restore the last line; cursor steps into it
    f.keys("u");
    assert_eq!(f.text(), "aa\n");
    f.keys("u");
    assert_eq!(f.text(), "aa\nbb\n");
}

#[test]
fn undo_redo_not_repeatable_by_dot() {
    let mut f = Fixture::new("abc").at(0);
    f.keys("x");
    assert_eq!(f.text(), "bc");
    f.keys("u");
    assert_eq!(f.text(), "abc");
    // `.` replays the x, not the u
    f.keys(".");
    assert_eq!(f.text(), "bc");
}

#[test]
fn vi_style_undo_toggles() {
    let config = core_config::Config {
        undo_style: core_config::UndoStyle::Vi,
        ..Default::default()
    };
    let mut f = Fixture::with_config("abc", config).at(0);
    f.keys("x");
    assert_eq!(f.text(), "bc");
    f.keys("u");
    assert_eq!(f.text(), "abc");
    // second u re-does in vi style
    f.keys("u");
    assert_eq!(f.text(), "bc");
    f.keys("u");
    assert_eq!(f.text(), "abc");
}

#[test]
fn backspace_trims_the_pending_record() {
    let mut f = Fixture::new("").at(0);
    f.keys("iabcd<BS><BS><Esc>");
    assert_eq!(f.text(), "ab");
    f.keys("u");
    assert_eq!(f.text(), "");
    f.keys("<C-r>");
    assert_eq!(f.text(), "ab");
}
