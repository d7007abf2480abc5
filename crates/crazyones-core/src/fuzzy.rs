//! Fuzzy command-verb and OS-tag matching (spec §4.7).
//!
//! `SkimMatcherV2` returns an unbounded integer score; both matchers
//! normalize it into a `0.0..=1.0` ratio by dividing by the input's
//! length before applying their cutoff, per spec.md's "edit-distance-
//! based ratio acceptable" language.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// The six canonical OS tokens recognized by `/updates`.
pub const CANONICAL_OS_TOKENS: [&str; 6] = ["ios", "ipados", "macos", "watchos", "tvos", "visionos"];

const VERB_CUTOFF: f64 = 0.6;
const TAG_CUTOFF: f64 = 0.5;

fn ratio(matcher: &SkimMatcherV2, input: &str, candidate: &str) -> Option<f64> {
    if input.is_empty() {
        return None;
    }
    matcher
        .fuzzy_match(candidate, input)
        .map(|score| score as f64 / input.len() as f64)
}

/// Finds the best match for an unrecognized command verb among
/// `known`, returning it with its normalized ratio when the ratio meets
/// the 0.6 cutoff.
pub fn best_verb_match<'a>(input: &str, known: &[&'a str]) -> Option<(&'a str, f64)> {
    let matcher = SkimMatcherV2::default();
    known
        .iter()
        .filter_map(|candidate| ratio(&matcher, input, candidate).map(|r| (*candidate, r)))
        .filter(|(_, r)| *r >= VERB_CUTOFF)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
}

/// Finds the best match for an unrecognized `/updates` tag among the
/// canonical OS tokens word-boundary-present in `subscriber_locale_names`,
/// case-insensitively, with the 0.5 cutoff.
pub fn best_tag_match(input: &str, subscriber_locale_names: &[&str]) -> Option<(&'static str, f64)> {
    let input = input.to_lowercase();
    let matcher = SkimMatcherV2::default();

    let candidates: Vec<&'static str> = CANONICAL_OS_TOKENS
        .iter()
        .filter(|token| {
            subscriber_locale_names
                .iter()
                .any(|name| contains_word(&name.to_lowercase(), token))
        })
        .copied()
        .collect();

    candidates
        .into_iter()
        .filter_map(|candidate| ratio(&matcher, &input, candidate).map(|r| (candidate, r)))
        .filter(|(_, r)| *r >= TAG_CUTOFF)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}
