// src/matching/brand.rs
use log::debug;
use regex::Regex;

use crate::matching::cache::ResolutionCache;
use crate::matching::fuzzy::token_set_ratio;
use crate::matching::normalize::normalize;
use crate::models::BrandLabel;
use crate::vocabulary::VocabularyStore;

/// Layered brand resolver: alias lookup, then canonical vocabulary match,
/// then fuzzy fallback. Strictly ordered, first match wins. Resolution is a
/// pure read of the vocabulary; results are memoized per distinct name until
/// the vocabulary version changes.
pub struct BrandResolver {
    fuzzy_threshold: f64,
    cache: ResolutionCache,
}

impl BrandResolver {
    pub fn new(fuzzy_threshold: f64, cache_capacity: usize) -> Self {
        Self {
            fuzzy_threshold,
            cache: ResolutionCache::new(cache_capacity),
        }
    }

    pub fn resolve(&mut self, raw_name: &str, vocab: &VocabularyStore) -> BrandLabel {
        let upper = raw_name.trim().to_uppercase();
        if upper.is_empty() {
            return BrandLabel::Unresolved;
        }

        let cache_key = normalize(raw_name).to_uppercase();
        if let Some(hit) = self.cache.get(&cache_key, vocab.version()) {
            return hit;
        }

        let label = resolve_layered(&upper, raw_name, self.fuzzy_threshold, vocab);
        debug!("Resolved '{}' -> {}", raw_name, label);
        self.cache.put(cache_key, label.clone(), vocab.version());
        label
    }

    pub fn log_cache_stats(&self) {
        self.cache.log_stats();
    }
}

fn resolve_layered(
    upper: &str,
    raw_name: &str,
    fuzzy_threshold: f64,
    vocab: &VocabularyStore,
) -> BrandLabel {
    if let Some(brand) = match_alias(upper, vocab) {
        return BrandLabel::Canonical(brand);
    }
    if let Some(brand) = match_vocabulary(upper, vocab) {
        return BrandLabel::Canonical(brand);
    }
    if let Some(brand) = match_fuzzy(raw_name, fuzzy_threshold, vocab) {
        return BrandLabel::Canonical(brand);
    }
    BrandLabel::Unresolved
}

/// Stage 1: operator-taught aliases as whole words in the upper-cased name.
///
/// Aliases are tried longest-first (ties lexicographic, then load order) so
/// the result does not depend on dictionary insertion order.
fn match_alias(upper: &str, vocab: &VocabularyStore) -> Option<String> {
    let mut pairs: Vec<&(String, String)> = vocab.aliases().iter().collect();
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    for (alias, brand) in pairs {
        if word_match(upper, alias) {
            return Some(brand.clone());
        }
    }
    None
}

/// Stage 2: canonical brand list, longest brand first so "ACERPURE" is tried
/// before "ACER". A brand matches as a whole word, or as a substring once all
/// whitespace is stripped from both sides (catches "LENOVO22").
fn match_vocabulary(upper: &str, vocab: &VocabularyStore) -> Option<String> {
    let mut brands: Vec<&String> = vocab.brands().iter().collect();
    brands.sort_by(|a, b| b.len().cmp(&a.len()));

    let name_nospace: String = upper.chars().filter(|c| !c.is_whitespace()).collect();
    for brand in brands {
        if word_match(upper, brand) {
            return Some(brand.clone());
        }
        let brand_nospace: String = brand.chars().filter(|c| !c.is_whitespace()).collect();
        if !brand_nospace.is_empty() && name_nospace.contains(&brand_nospace) {
            return Some(brand.clone());
        }
    }
    None
}

/// Stage 3: token-set similarity of the normalized name against every brand;
/// the best-scoring candidate wins if it clears the threshold. Ties keep the
/// first candidate in vocabulary order.
fn match_fuzzy(raw_name: &str, threshold: f64, vocab: &VocabularyStore) -> Option<String> {
    let normalized = normalize(raw_name);
    if normalized.is_empty() {
        return None;
    }

    let mut best_score = 0.0;
    let mut best: Option<&String> = None;
    for brand in vocab.brands() {
        let score = token_set_ratio(&normalized, brand);
        if score > best_score {
            best_score = score;
            best = Some(brand);
        }
    }
    match best {
        Some(brand) if best_score >= threshold => {
            debug!("Fuzzy accepted '{}' -> '{}' ({})", raw_name, brand, best_score);
            Some(brand.clone())
        }
        _ => None,
    }
}

fn word_match(haystack: &str, needle: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(needle));
    Regex::new(&pattern)
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(brands: &[&str], aliases: &[(&str, &str)]) -> VocabularyStore {
        VocabularyStore::new(
            brands.iter().map(|s| s.to_string()).collect(),
            aliases
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        )
    }

    #[test]
    fn alias_stage_wins_over_vocabulary_stage() {
        // "ROG" is both an alias for ASUS and a token of the "ROGUE" brand.
        let v = vocab(&["ROGUE", "ASUS"], &[("ROG", "ASUS")]);
        let mut r = BrandResolver::new(88.0, 64);
        assert_eq!(
            r.resolve("Laptop ROG Strix", &v),
            BrandLabel::Canonical("ASUS".into())
        );
    }

    #[test]
    fn alias_match_requires_whole_word() {
        let v = vocab(&[], &[("MI", "XIAOMI")]);
        let mut r = BrandResolver::new(88.0, 64);
        // "MICROPHONE" contains "MI" but not as a word.
        assert!(r.resolve("MICROPHONE STAND", &v).is_unresolved());
        assert_eq!(
            r.resolve("Mi Band 8", &v),
            BrandLabel::Canonical("XIAOMI".into())
        );
    }

    #[test]
    fn longer_brands_are_tried_before_their_prefixes() {
        let v = vocab(&["ACER", "ACERPURE"], &[]);
        let mut r = BrandResolver::new(88.0, 64);
        assert_eq!(
            r.resolve("ACERPURE MONITOR", &v),
            BrandLabel::Canonical("ACERPURE".into())
        );
        assert_eq!(
            r.resolve("ACER ASPIRE 5", &v),
            BrandLabel::Canonical("ACER".into())
        );
    }

    #[test]
    fn concatenated_brand_matches_after_whitespace_strip() {
        let v = vocab(&["LENOVO"], &[]);
        let mut r = BrandResolver::new(88.0, 64);
        assert_eq!(
            r.resolve("Monitor LENOVO22 Murah", &v),
            BrandLabel::Canonical("LENOVO".into())
        );
    }

    #[test]
    fn fuzzy_threshold_boundary() {
        // token_set_ratio of this pair is exactly 85 (see fuzzy.rs tests).
        let v = vocab(&["ABCDEFGHIJKLMNOPQXYZ"], &[]);

        let mut accept = BrandResolver::new(85.0, 64);
        assert_eq!(
            accept.resolve("abcdefghijklmnopqrst", &v),
            BrandLabel::Canonical("ABCDEFGHIJKLMNOPQXYZ".into())
        );

        let mut reject = BrandResolver::new(86.0, 64);
        assert!(reject.resolve("abcdefghijklmnopqrst", &v).is_unresolved());

        // A score of 84 is rejected at threshold 85.
        let v84 = vocab(&["ABCDEFGHIJKLMNOPQRSTUZZZZ"], &[]);
        let mut r = BrandResolver::new(85.0, 64);
        assert!(r.resolve("abcdefghijklmnopqrstuvwxy", &v84).is_unresolved());
    }

    #[test]
    fn alias_resolution_is_independent_of_fuzzy_threshold() {
        let v = vocab(&["XIAOMI"], &[("MI", "XIAOMI")]);
        // Threshold that no fuzzy score can clear.
        let mut r = BrandResolver::new(101.0, 64);
        assert_eq!(
            r.resolve("Mi Band 8 Wireless Garansi Resmi", &v),
            BrandLabel::Canonical("XIAOMI".into())
        );
    }

    #[test]
    fn empty_input_is_unresolved_without_error() {
        let v = vocab(&["ASUS"], &[]);
        let mut r = BrandResolver::new(88.0, 64);
        assert!(r.resolve("", &v).is_unresolved());
        assert!(r.resolve("   ", &v).is_unresolved());
    }

    #[test]
    fn resolution_is_deterministic_across_repeated_calls() {
        let v = vocab(&["ASUS", "ACER", "LENOVO"], &[("ROG", "ASUS")]);
        let mut r = BrandResolver::new(88.0, 64);
        let first = r.resolve("Laptop ASUS ROG 15\"", &v);
        for _ in 0..5 {
            assert_eq!(r.resolve("Laptop ASUS ROG 15\"", &v), first);
        }
    }

    #[test]
    fn vocabulary_append_invalidates_cached_misses() {
        let mut v = vocab(&["ASUS"], &[]);
        let mut r = BrandResolver::new(88.0, 64);
        assert!(r.resolve("NEWBRANDX ULTRA", &v).is_unresolved());

        v.append_brand("NEWBRANDX");
        assert_eq!(
            r.resolve("NEWBRANDX ULTRA", &v),
            BrandLabel::Canonical("NEWBRANDX".into())
        );
    }

    #[test]
    fn duplicate_alias_precedence_is_stable() {
        // Same alias taught twice for different brands: the first-loaded pair
        // wins under the stable longest-first ordering.
        let v = vocab(&["XIAOMI", "MIDEA"], &[("MI", "XIAOMI"), ("MI", "MIDEA")]);
        let mut r = BrandResolver::new(88.0, 64);
        assert_eq!(
            r.resolve("MI SMART FAN", &v),
            BrandLabel::Canonical("XIAOMI".into())
        );
    }
}
