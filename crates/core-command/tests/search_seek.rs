//! Search (`/`, `?`, `n`, `N`) and seek (`f`, `t`, `;`) motions.

mod common;

use common::Fixture;
use core_state::{Mode, RegName};

#[test]
fn search_moves_to_next_match() {
    let mut f = Fixture::new("a\nb\na\n").at(0);
    f.keys("/a<CR>");
    assert_eq!(f.cursor(), 4);
}

#[test]
fn search_wraps_past_buffer_end() {
    let mut f = Fixture::new("a\nb\na\n").at(4);
    f.keys("/a<CR>");
    assert_eq!(f.cursor(), 0);
}

#[test]
fn search_count_selects_nth_match_with_wrap() {
    let mut f = Fixture::new("a\nb\na\n").at(0);
    f.keys("2/a<CR>");
    // first hit at 4, second wraps to 0
    assert_eq!(f.cursor(), 0);
}

#[test]
fn n_continues_and_shift_n_reverses() {
    let mut f = Fixture::new("a\nb\na\n").at(0);
    f.keys("/a<CR>");
    assert_eq!(f.cursor(), 4);
    f.keys("n");
    assert_eq!(f.cursor(), 0);
    f.keys("n");
    assert_eq!(f.cursor(), 4);
    f.keys("N");
    assert_eq!(f.cursor(), 0);
}

#[test]
fn backward_search_finds_previous() {
    let mut f = Fixture::new("ax ax ax\n").at(6);
    f.keys("?ax<CR>");
    assert_eq!(f.cursor(), 3);
}

#[test]
fn backward_search_wraps_to_last_match() {
    let mut f = Fixture::new("b\na\nb\n").at(0);
    f.keys("?b<CR>");
    assert_eq!(f.cursor(), 4);
}

#[test]
fn pattern_is_a_regex() {
    let mut f = Fixture::new("foo 123 bar\n").at(0);
    f.keys("/[0-9]+<CR>");
    assert_eq!(f.cursor(), 4);
}

#[test]
fn invalid_regex_aborts_cleanly() {
    let mut f = Fixture::new("abc(def\n").at(0);
    f.keys("/(<CR>");
    assert_eq!(f.cursor(), 0);
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn no_match_aborts_with_cursor_at_origin() {
    let mut f = Fixture::new("abc\n").at(1);
    f.keys("/zzz<CR>");
    assert_eq!(f.cursor(), 1);
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn escape_cancels_search_back_to_origin() {
    let mut f = Fixture::new("aaa bbb\n").at(0);
    f.keys("/bbb");
    // preview moved the selection
    assert_eq!(f.selection(), (4, 7));
    f.keys("<Esc>");
    assert_eq!(f.cursor(), 0);
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn empty_search_reuses_last_pattern() {
    let mut f = Fixture::new("x1x2x3\n").at(0);
    f.keys("/x<CR>");
    assert_eq!(f.cursor(), 2);
    f.keys("/<CR>");
    assert_eq!(f.cursor(), 4);
}

#[test]
fn search_pattern_register_is_set() {
    let mut f = Fixture::new("hello\n").at(0);
    f.keys("/ll<CR>");
    assert_eq!(f.reg(RegName::SearchPattern).text, "ll");
}

#[test]
fn n_without_prior_search_aborts() {
    let mut f = Fixture::new("abc").at(0);
    f.keys("n");
    assert_eq!(f.cursor(), 0);
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn delete_to_search_match_is_charwise() {
    let mut f = Fixture::new("one two three\n").at(0);
    f.keys("d/three<CR>");
    assert_eq!(f.text(), "three\n");
    assert!(!f.default_reg().linewise);
}

#[test]
fn seek_moves_onto_char() {
    let mut f = Fixture::new("abcabc\n").at(0);
    f.keys("fc");
    assert_eq!(f.cursor(), 2);
    f.keys(";");
    assert_eq!(f.cursor(), 5);
}

#[test]
fn seek_with_count() {
    let mut f = Fixture::new("abcabc\n").at(0);
    f.keys("2fc");
    assert_eq!(f.cursor(), 5);
}

#[test]
fn till_stops_short() {
    let mut f = Fixture::new("abcdef\n").at(0);
    f.keys("td");
    assert_eq!(f.cursor(), 2);
}

#[test]
fn backward_seek() {
    let mut f = Fixture::new("abcabc\n").at(5);
    f.keys("Fa");
    assert_eq!(f.cursor(), 3);
    f.keys("Ta");
    // till-backward from 3 finds the first 'a'
    assert_eq!(f.cursor(), 1);
}

#[test]
fn seek_does_not_cross_lines() {
    let mut f = Fixture::new("ab\ncd\n").at(0);
    f.keys("fc");
    // aborted; cursor unchanged, state reset
    assert_eq!(f.cursor(), 0);
    assert_eq!(f.session.mode(), Mode::Command);
}

#[test]
fn semicolon_without_prior_seek_aborts() {
    let mut f = Fixture::new("abc").at(0);
    f.keys(";");
    assert_eq!(f.session.mode(), Mode::Command);
    assert_eq!(f.cursor(), 0);
}

#[test]
fn seek_memory_is_window_global() {
    let mut f = Fixture::new("xbx\n").at(0);
    f.keys("fb");
    assert_eq!(f.cursor(), 1);
    // a different session in the same window can repeat it
    let mut other = core_surface::MemorySurface::new("yyb\n");
    let mut session2 = core_command::Session::new();
    for key in core_input::script::parse_keys(";").unwrap() {
        session2.feed(&mut f.win, &mut other, key);
    }
    use core_surface::Surface;
    assert_eq!(other.selection().1, 2);
}
