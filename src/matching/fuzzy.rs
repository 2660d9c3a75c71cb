// src/matching/fuzzy.rs
use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

/// Order-independent token-set similarity on a 0-100 scale.
///
/// Both names are split into lowercase token sets, then the score is the best
/// edit-distance ratio among the sorted-intersection string and the two
/// "intersection + remainder" strings. Shared tokens therefore never penalize
/// the score and word order is irrelevant; a name that is a token subset of
/// the other scores 100. The result is rounded to whole points, so threshold
/// comparisons behave like integer scores.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = join(tokens_a.intersection(&tokens_b));
    let rest_a = join(tokens_a.difference(&tokens_b));
    let rest_b = join(tokens_b.difference(&tokens_a));

    let combined_a = join_nonempty(&intersection, &rest_a);
    let combined_b = join_nonempty(&intersection, &rest_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !intersection.is_empty() {
        best = best
            .max(ratio(&intersection, &combined_a))
            .max(ratio(&intersection, &combined_b));
    }
    best.round()
}

fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

fn tokens(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

// BTreeSet iteration is already sorted, which keeps the joined forms stable.
fn join<'a, I: Iterator<Item = &'a String>>(parts: I) -> String {
    parts.map(|s| s.as_str()).collect::<Vec<_>>().join(" ")
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}
