// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Natural ("human") ordering of chapter titles: embedded numbers compare by
// value, so "Chapter 2" sorts before "Chapter 10".

use std::cmp::Ordering;

/// A maximal run of ASCII digits or of non-digit characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl<'a> Run<'a> {
    fn as_str(&self) -> &'a str {
        match self {
            Run::Digits(s) | Run::Text(s) => s,
        }
    }
}

/// Splits a string into alternating digit / non-digit runs.
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Runs<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (run, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digit { Run::Digits(run) } else { Run::Text(run) })
    }
}

/// Compare two strings in natural order.
///
/// Digit runs compare by numeric magnitude with leading zeros ignored; the
/// comparison works on the digit text itself so runs of any length are exact.
/// Other runs compare case-insensitively by code point. When every compared
/// run is equal the string with fewer runs sorts first.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = Runs::new(a);
    let mut right = Runs::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_runs(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Sort items in place by the natural order of their titles.
///
/// The sort is stable: items whose titles compare equal keep their relative
/// order.
pub fn sort_by_title<T>(items: &mut [T], title: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| compare(title(a), title(b)));
}

fn compare_runs(a: Run<'_>, b: Run<'_>) -> Ordering {
    match (a, b) {
        (Run::Digits(x), Run::Digits(y)) => compare_digits(x, y),
        _ => compare_text(a.as_str(), b.as_str()),
    }
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(titles: &[&str]) -> Vec<String> {
        let mut owned: Vec<String> = titles.iter().map(|s| s.to_string()).collect();
        sort_by_title(&mut owned, |s| s.as_str());
        owned
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(
            sorted(&["Chapter 10", "Chapter 2", "Chapter 1b"]),
            vec!["Chapter 1b", "Chapter 2", "Chapter 10"]
        );
        assert_eq!(compare("2", "10"), Ordering::Less);
    }

    #[test]
    fn suffixed_number_sorts_after_its_prefix() {
        assert_eq!(compare("Chapter 2", "Chapter 2b"), Ordering::Less);
        assert_eq!(compare("Chapter 2b", "Chapter 10"), Ordering::Less);
    }

    #[test]
    fn text_is_case_insensitive() {
        assert_eq!(compare("prologue", "Prologue"), Ordering::Equal);
        assert_eq!(compare("Act B", "act a"), Ordering::Greater);
    }

    #[test]
    fn leading_zeros_are_ignored() {
        assert_eq!(compare("Part 007", "Part 7"), Ordering::Equal);
        assert_eq!(compare("Part 008", "Part 10"), Ordering::Less);
    }

    #[test]
    fn very_long_digit_runs_compare_exactly() {
        let big = "Chapter 123456789012345678901234567890";
        let bigger = "Chapter 123456789012345678901234567891";
        assert_eq!(compare(big, bigger), Ordering::Less);
        assert_eq!(compare("Chapter 99999999999999999999", big), Ordering::Less);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(compare("Chapter", "Chapter 1"), Ordering::Less);
        assert_eq!(compare("", "a"), Ordering::Less);
        assert_eq!(compare("", ""), Ordering::Equal);
    }

    #[test]
    fn sort_is_stable_for_equal_titles() {
        let mut items = vec![("a", 1), ("A", 2), ("a", 3)];
        sort_by_title(&mut items, |item| item.0);
        assert_eq!(items.iter().map(|i| i.1).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
