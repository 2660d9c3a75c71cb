// src/matching/category.rs
use log::debug;

use crate::matching::fuzzy::token_set_ratio;
use crate::matching::normalize::normalize;
use crate::models::OTHER_CATEGORY;

/// Read-only name -> category reference drawn from the product database.
/// Reference names are normalized once at load time.
#[derive(Debug, Default)]
pub struct CategoryTable {
    entries: Vec<(String, String)>,
}

impl CategoryTable {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        let entries: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(name, category)| (normalize(&name), category))
            .filter(|(name, _)| !name.is_empty())
            .collect();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Single-stage fuzzy category resolver.
///
/// Reference names are full product titles, so this uses one strict fuzzy
/// pass rather than the brand resolver's layered cascade; anything below the
/// threshold (and every row when the table is empty or malformed) gets the
/// "OTHER" sentinel.
pub struct CategoryResolver {
    fuzzy_threshold: f64,
}

impl CategoryResolver {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self { fuzzy_threshold }
    }

    pub fn resolve(&self, raw_name: &str, table: &CategoryTable) -> String {
        if table.is_empty() {
            return OTHER_CATEGORY.to_string();
        }
        let normalized = normalize(raw_name);
        if normalized.is_empty() {
            return OTHER_CATEGORY.to_string();
        }

        let mut best_score = 0.0;
        let mut best: Option<&str> = None;
        for (name, category) in &table.entries {
            let score = token_set_ratio(&normalized, name);
            if score > best_score {
                best_score = score;
                best = Some(category);
            }
        }
        match best {
            Some(category) if best_score >= self.fuzzy_threshold => {
                debug!("Category '{}' for '{}' ({})", category, raw_name, best_score);
                category.to_string()
            }
            _ => OTHER_CATEGORY.to_string(),
        }
    }
}
