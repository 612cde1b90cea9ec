//! The curiosity engine
//!
//! Scores and ranks elements using textual and structural heuristics.
//! "Risky" surfaces (forms, checkouts, settings, logins) score higher, which
//! biases exploration toward state-changing paths where bugs are more likely
//! than on passive content.

use crate::state::{Element, ElementKind, ScoredElement};
use std::collections::HashSet;

/// Base score for any interactive element
pub const BASE_SCORE: i32 = 10;

/// Bonus for the first high-risk keyword hit
pub const HIGH_RISK_BONUS: i32 = 40;

/// Bonus for the first medium-risk keyword hit
pub const MEDIUM_RISK_BONUS: i32 = 20;

/// Bonus for form controls and for buttons/submit inputs
pub const CONTROL_BONUS: i32 = 15;

/// Penalty for elements whose selector has already been acted on
pub const ACTED_PENALTY: i32 = 50;

const HIGH_RISK_KEYWORDS: &[&str] = &[
    "login", "signin", "sign-in", "password", "checkout", "cart", "buy", "pay", "billing",
    "credit", "settings", "config", "admin", "dashboard", "profile", "submit", "save", "delete",
    "remove", "destroy",
];

const MEDIUM_RISK_KEYWORDS: &[&str] = &[
    "search", "query", "filter", "sort", "add", "create", "new", "edit", "update",
];

/// Score an element's desirability, in the range [10, 100].
///
/// Keyword bonuses apply at most once each: the first high-risk hit adds 40,
/// and independently the first medium-risk hit adds 20. Form controls add 15,
/// and buttons or submit inputs add another 15.
pub fn score(element: &Element) -> i32 {
    let mut score = BASE_SCORE;

    let haystack = format!(
        "{} {} {} {}",
        element.text,
        element.selector,
        element.href.as_deref().unwrap_or(""),
        element.id,
    )
    .to_lowercase();

    if HIGH_RISK_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        score += HIGH_RISK_BONUS;
    }

    if MEDIUM_RISK_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        score += MEDIUM_RISK_BONUS;
    }

    if element.kind.is_form_control() {
        score += CONTROL_BONUS;
    }

    if element.kind == ElementKind::Button || element.input_type.as_deref() == Some("submit") {
        score += CONTROL_BONUS;
    }

    score
}

/// Score and rank a set of candidates.
///
/// Elements whose selector is in `already_acted` lose [`ACTED_PENALTY`] points
/// but stay in the list as a last resort. The sort is stable: ties keep their
/// original observation order, so the result is a pure function of the inputs.
pub fn prioritize(elements: Vec<Element>, already_acted: &HashSet<String>) -> Vec<ScoredElement> {
    let mut scored: Vec<ScoredElement> = elements
        .into_iter()
        .map(|element| {
            let mut score = score(&element);
            if already_acted.contains(&element.selector) {
                score -= ACTED_PENALTY;
            }
            ScoredElement { element, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}
