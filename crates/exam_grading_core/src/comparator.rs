//! crates/exam_grading_core/src/comparator.rs
//!
//! Decides whether a submitted answer matches the authoritative one.
//!
//! Options are stored by the question bank as delimited strings (`"A"`, `"A,B"`),
//! so multi-select answers are compared as sets: order and duplicates are ignored.

use std::collections::BTreeSet;

/// Separator between options in a stored or submitted answer.
pub const OPTION_DELIMITER: char = ',';

/// Splits an answer string into its set of unique, trimmed, non-empty options.
///
/// Missing input is represented by the empty string and yields the empty set.
pub fn option_set(raw: &str) -> BTreeSet<&str> {
    raw.split(OPTION_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Returns `true` when both answers contain exactly the same options.
///
/// Two empty answers are equal: a question with no recorded answer, left
/// unanswered, counts as matched.
pub fn is_correct(selected: &str, correct: &str) -> bool {
    option_set(selected) == option_set(correct)
}
