// src/vocabulary.rs
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::VocabularyAppend;

/// Single source of truth for canonical brands and operator-taught aliases.
///
/// Append-only: brands and alias pairs are only ever added. Every mutation
/// bumps `version`, which resolution caches use to detect staleness, and is
/// recorded as a pending [`VocabularyAppend`] for the persistence
/// collaborator to drain.
#[derive(Debug, Default)]
pub struct VocabularyStore {
    brands: Vec<String>,
    aliases: Vec<(String, String)>,
    version: u64,
    pending: Vec<VocabularyAppend>,
}

#[derive(Debug, Deserialize)]
struct AliasRow {
    alias: String,
    brand: String,
}

impl VocabularyStore {
    /// Builds a store from pre-seeded data. Brands are upper-cased and
    /// deduplicated keeping the first occurrence; alias keys are upper-cased
    /// but kept verbatim otherwise (duplicates tolerated, see DESIGN.md).
    pub fn new(brands: Vec<String>, aliases: Vec<(String, String)>) -> Self {
        let mut seen = Vec::new();
        for brand in brands {
            let brand = brand.trim().to_uppercase();
            if !brand.is_empty() && !seen.contains(&brand) {
                seen.push(brand);
            }
        }
        let aliases = aliases
            .into_iter()
            .map(|(alias, brand)| (alias.trim().to_uppercase(), brand.trim().to_uppercase()))
            .filter(|(alias, _)| !alias.is_empty())
            .collect();
        Self {
            brands: seen,
            aliases,
            version: 0,
            pending: Vec::new(),
        }
    }

    /// Loads the brand list (JSON array of strings) and, if given, the alias
    /// table (JSON array of `{alias, brand}` rows).
    pub fn from_files(brands_path: &Path, aliases_path: Option<&Path>) -> Result<Self> {
        let raw = fs::read_to_string(brands_path)
            .with_context(|| format!("failed to read brand list {}", brands_path.display()))?;
        let brands: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("brand list {} is not a JSON string array", brands_path.display()))?;

        let aliases = match aliases_path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read alias table {}", path.display()))?;
                let rows: Vec<AliasRow> = serde_json::from_str(&raw).with_context(|| {
                    format!("alias table {} must be an array of {{alias, brand}} rows", path.display())
                })?;
                rows.into_iter().map(|r| (r.alias, r.brand)).collect()
            }
            None => {
                warn!("No alias table provided; starting with an empty alias dictionary");
                Vec::new()
            }
        };

        let store = Self::new(brands, aliases);
        info!(
            "Loaded vocabulary: {} brands, {} aliases",
            store.brands.len(),
            store.aliases.len()
        );
        Ok(store)
    }

    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    pub fn aliases(&self) -> &[(String, String)] {
        &self.aliases
    }

    /// Monotonic counter bumped on every mutation; resolution caches compare
    /// against it to decide whether their entries are still valid.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains_brand(&self, brand: &str) -> bool {
        let brand = brand.trim().to_uppercase();
        self.brands.iter().any(|b| *b == brand)
    }

    /// Appends a new canonical brand. Returns false (and leaves the store
    /// untouched) when the brand is already present.
    pub fn append_brand(&mut self, brand: &str) -> bool {
        let brand = brand.trim().to_uppercase();
        if brand.is_empty() {
            return false;
        }
        if self.brands.contains(&brand) {
            warn!("Brand '{}' is already in the vocabulary; append skipped", brand);
            return false;
        }
        info!("Appending new brand '{}' to the vocabulary", brand);
        self.brands.push(brand.clone());
        self.pending.push(VocabularyAppend::Brand { brand });
        self.version += 1;
        true
    }

    /// Appends an alias -> brand pair. Duplicate alias keys are accepted
    /// blindly; the resolver's longest-first, stable ordering makes the
    /// outcome deterministic regardless.
    pub fn append_alias(&mut self, alias: &str, brand: &str) {
        let alias = alias.trim().to_uppercase();
        let brand = brand.trim().to_uppercase();
        if alias.is_empty() || brand.is_empty() {
            return;
        }
        info!("Appending alias '{}' -> '{}'", alias, brand);
        self.aliases.push((alias.clone(), brand.clone()));
        self.pending.push(VocabularyAppend::Alias { alias, brand });
        self.version += 1;
    }

    /// Drains the mutations accumulated since the last drain, for durable
    /// persistence by the caller.
    pub fn take_pending(&mut self) -> Vec<VocabularyAppend> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_brands_are_uppercased_and_deduplicated() {
        let store = VocabularyStore::new(
            vec!["asus".into(), "ASUS".into(), " Acer ".into()],
            Vec::new(),
        );
        assert_eq!(store.brands(), ["ASUS", "ACER"]);
    }

    #[test]
    fn append_brand_bumps_version_and_records_pending() {
        let mut store = VocabularyStore::new(vec!["ASUS".into()], Vec::new());
        assert_eq!(store.version(), 0);

        assert!(store.append_brand("xiaomi"));
        assert_eq!(store.version(), 1);
        assert!(store.contains_brand("XIAOMI"));
        assert_eq!(
            store.take_pending(),
            vec![VocabularyAppend::Brand { brand: "XIAOMI".into() }]
        );
        assert!(!store.has_pending());
    }

    #[test]
    fn appending_existing_brand_is_a_noop() {
        let mut store = VocabularyStore::new(vec!["ASUS".into()], Vec::new());
        assert!(!store.append_brand(" asus "));
        assert_eq!(store.version(), 0);
        assert!(!store.has_pending());
    }

    #[test]
    fn duplicate_aliases_are_appended_blindly() {
        let mut store = VocabularyStore::new(vec!["XIAOMI".into(), "MIDEA".into()], Vec::new());
        store.append_alias("MI", "XIAOMI");
        store.append_alias("MI", "MIDEA");
        assert_eq!(store.aliases().len(), 2);
        assert_eq!(store.version(), 2);
    }
}
