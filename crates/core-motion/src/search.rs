//! Pattern search (`/`, `?`, `n`, `N`).
//!
//! The typed string is compiled directly by the `regex` crate — search
//! strings are host regular expressions, not Vi[m] syntax (a documented
//! deviation carried over from the reference behavior). A pattern that fails
//! to compile counts as "not found". Searches wrap around the buffer end,
//! and the count selects the N'th match in the search direction, wrapping as
//! needed.

use core_surface::FlatText;
use regex::Regex;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDir {
    /// `/` — next match after the cursor.
    Forward,
    /// `?` — nearest match before the cursor.
    Backward,
}

impl SearchDir {
    pub fn invert(self) -> Self {
        match self {
            SearchDir::Forward => SearchDir::Backward,
            SearchDir::Backward => SearchDir::Forward,
        }
    }
}

/// Find the `mul`'th match of `pattern` from `pos` in `dir`. Returns the
/// match as `(start, end)` char offsets, or `None` when the pattern is
/// invalid or matches nowhere.
pub fn search(
    t: &FlatText,
    pos: usize,
    mul: usize,
    dir: SearchDir,
    pattern: &str,
) -> Option<(usize, usize)> {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => {
            trace!(target: "motion.search", %err, "pattern rejected");
            return None;
        }
    };
    let hay = t.as_str();

    // A zero-width match must still advance the scan position or repeated
    // searches would never terminate.
    let mut scan_from = 0usize;
    let find_at = |from: usize| -> Option<(usize, usize)> {
        if from > hay.len() {
            return None;
        }
        re.find_at(hay, from).map(|m| (m.start(), m.end()))
    };
    let advance_past = |m: (usize, usize)| -> usize {
        if m.1 > m.0 {
            m.1
        } else {
            m.1 + hay[m.1..].chars().next().map(|c| c.len_utf8()).unwrap_or(1)
        }
    };
    let to_char = |m: (usize, usize)| (t.pos_of_byte(m.0), t.pos_of_byte(m.1));

    match dir {
        SearchDir::Forward => {
            let start_byte = t.byte_of((pos + 1).min(t.len()));
            let mut m = find_at(start_byte).or_else(|| find_at(0))?;
            for _ in 1..mul {
                // A match exists, so the wrapped retry always succeeds.
                m = find_at(advance_past(m)).or_else(|| find_at(0))?;
            }
            Some(to_char(m))
        }
        SearchDir::Backward => {
            // Enumerate matches in order, remembering the last one seen
            // before the cursor; with a count, collect enough of the match
            // list to step `mul - 1` hits further back, wrapping around the
            // end of the buffer.
            let mut next = || -> Option<(usize, usize)> {
                let m = find_at(scan_from)?;
                scan_from = advance_past(m);
                Some(to_char(m))
            };
            let mut results: Vec<(usize, usize)> = Vec::new();
            let mut hits_before_pos = 0usize;
            let mut last: Option<(usize, usize)> = None;
            let mut r = next();
            if let Some(m) = r {
                if mul > 1 {
                    results.push(m);
                }
                if m.0 < pos {
                    hits_before_pos += 1;
                }
            }
            while let Some(m) = r {
                if !(m.0 < pos || hits_before_pos < mul) {
                    break;
                }
                last = Some(m);
                r = next();
                if mul > 1 {
                    if let Some(m2) = r {
                        results.push(m2);
                        if m2.0 < pos {
                            hits_before_pos += 1;
                        }
                    }
                }
            }
            if mul <= 1 {
                last
            } else if !results.is_empty() {
                let m = mul % results.len();
                let index = (hits_before_pos + results.len() - m) % results.len();
                Some(results[index])
            } else {
                None
            }
        }
    }
}
