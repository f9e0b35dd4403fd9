//! Bracket pair matching for `%`.
//!
//! Scans toward the partner bracket keeping a nesting count per bracket
//! family. Reaching the partner of the starting bracket while any family is
//! still unbalanced means mismatched nesting, and the motion fails.

use core_surface::FlatText;

const MATCHABLE: [char; 6] = ['(', ')', '[', ']', '{', '}'];

fn matchable_index(c: char) -> Option<usize> {
    MATCHABLE.iter().position(|&m| m == c)
}

/// Offset of the bracket matching the one under `pos`, or `pos` when the
/// cursor is not on a matchable char or no balanced partner exists.
pub fn match_pair(t: &FlatText, pos: usize) -> usize {
    let seek_index = match t.char_at(pos).and_then(matchable_index) {
        Some(i) => i,
        None => return pos,
    };
    // Partner is the XOR-1 sibling; openers scan forward, closers backward.
    let inc: isize = if seek_index & 1 == 0 { 1 } else { -1 };
    let half_seek = seek_index / 2;
    let mut counts = [0isize; 3];
    counts[half_seek] += inc;

    let max = t.len() as isize;
    let mut index = pos as isize + inc;
    while index >= 0 && index < max {
        if let Some(m) = t.char_at(index as usize).and_then(matchable_index) {
            let half = m / 2;
            if m & 1 == 1 {
                counts[half] -= 1;
            } else {
                counts[half] += 1;
            }
            if counts[half] == 0 && half == half_seek {
                if counts == [0, 0, 0] {
                    return index as usize;
                }
                // Our own family balanced while another is open: guaranteed
                // bad nesting.
                break;
            }
        }
        index += inc;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> FlatText {
        FlatText::new(s.to_string())
    }

    #[test]
    fn simple_pairs_both_directions() {
        let b = t("(a[b]c)");
        assert_eq!(match_pair(&b, 0), 6);
        assert_eq!(match_pair(&b, 6), 0);
        assert_eq!(match_pair(&b, 2), 4);
        assert_eq!(match_pair(&b, 4), 2);
    }

    #[test]
    fn nested_same_kind() {
        let b = t("{{}}");
        assert_eq!(match_pair(&b, 0), 3);
        assert_eq!(match_pair(&b, 1), 2);
        assert_eq!(match_pair(&b, 3), 0);
    }

    #[test]
    fn not_on_bracket_stays_put() {
        let b = t("abc");
        assert_eq!(match_pair(&b, 1), 1);
    }

    #[test]
    fn unbalanced_stays_put() {
        let b = t("(((");
        assert_eq!(match_pair(&b, 0), 0);
    }

    #[test]
    fn interleaved_nesting_fails() {
        // ( [ ) ] — the paren family balances while brackets are still open
        let b = t("([)]");
        assert_eq!(match_pair(&b, 0), 0);
    }

    #[test]
    fn crosses_lines() {
        let b = t("{\n  x\n}");
        assert_eq!(match_pair(&b, 0), 6);
    }
}
