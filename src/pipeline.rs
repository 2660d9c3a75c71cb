// src/pipeline.rs
use indicatif::ProgressBar;
use log::info;
use std::time::Instant;

use crate::config::MatcherConfig;
use crate::matching::brand::BrandResolver;
use crate::matching::category::{CategoryResolver, CategoryTable};
use crate::models::ProductRecord;
use crate::vocabulary::VocabularyStore;

/// Result of one full resolution pass over a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub records: Vec<ProductRecord>,
    pub unresolved_count: usize,
}

impl BatchOutcome {
    /// Clean batches go straight to persistence/presentation; anything else
    /// routes into the correction workflow first.
    pub fn is_clean(&self) -> bool {
        self.unresolved_count == 0
    }
}

/// Runs brand and category resolution over an entire ingested batch.
///
/// Idempotent: processing an already-resolved dataset against an unchanged
/// vocabulary produces identical output. The resolution cache lives inside
/// the orchestrator, so it is scoped to this orchestrator's lifetime and a
/// fresh orchestrator always starts cold.
pub struct BatchOrchestrator {
    brand_resolver: BrandResolver,
    category_resolver: CategoryResolver,
}

impl BatchOrchestrator {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            brand_resolver: BrandResolver::new(
                config.brand_fuzzy_threshold,
                config.resolution_cache_size,
            ),
            category_resolver: CategoryResolver::new(config.category_fuzzy_threshold),
        }
    }

    pub fn process(
        &mut self,
        mut records: Vec<ProductRecord>,
        vocab: &VocabularyStore,
        reference: &CategoryTable,
        progress: Option<&ProgressBar>,
    ) -> BatchOutcome {
        let start = Instant::now();
        let total = records.len();
        let mut unresolved_count = 0;

        for record in &mut records {
            record.resolved_brand = self.brand_resolver.resolve(&record.raw_name, vocab);
            record.resolved_category = self.category_resolver.resolve(&record.raw_name, reference);
            if record.resolved_brand.is_unresolved() {
                unresolved_count += 1;
            }
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        self.brand_resolver.log_cache_stats();
        info!(
            "Labeled {} rows in {:.2?}: {} unresolved",
            total,
            start.elapsed(),
            unresolved_count
        );

        BatchOutcome {
            records,
            unresolved_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrandLabel, StockStatus, OTHER_CATEGORY};
    use chrono::NaiveDate;

    fn record(name: &str) -> ProductRecord {
        ProductRecord::new(
            name.to_string(),
            "TOKO A".to_string(),
            250_000.0,
            2,
            StockStatus::Available,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    fn fixture() -> (Vec<ProductRecord>, VocabularyStore, CategoryTable) {
        let records = vec![
            record("Laptop ASUS ROG Strix 15\""),
            record("Mi Band 8 Garansi Resmi"),
            record("Obscure Gadget 3000"),
        ];
        let vocab = VocabularyStore::new(
            vec!["ASUS".into(), "LENOVO".into()],
            vec![("MI".into(), "XIAOMI".into())],
        );
        let reference = CategoryTable::new(vec![(
            "Laptop ASUS ROG Strix 15 inch".into(),
            "LAPTOP GAMING".into(),
        )]);
        (records, vocab, reference)
    }

    #[test]
    fn labels_brands_and_categories_and_counts_unresolved() {
        let (records, vocab, reference) = fixture();
        let mut orchestrator = BatchOrchestrator::new(&MatcherConfig::default());
        let outcome = orchestrator.process(records, &vocab, &reference, None);

        assert_eq!(outcome.unresolved_count, 1);
        assert!(!outcome.is_clean());

        assert_eq!(
            outcome.records[0].resolved_brand,
            BrandLabel::Canonical("ASUS".into())
        );
        assert_eq!(outcome.records[0].resolved_category, "LAPTOP GAMING");
        assert_eq!(
            outcome.records[1].resolved_brand,
            BrandLabel::Canonical("XIAOMI".into())
        );
        assert_eq!(outcome.records[1].resolved_category, OTHER_CATEGORY);
        assert!(outcome.records[2].resolved_brand.is_unresolved());
    }

    #[test]
    fn reprocessing_a_resolved_batch_is_idempotent() {
        let (records, vocab, reference) = fixture();
        let mut orchestrator = BatchOrchestrator::new(&MatcherConfig::default());

        let first = orchestrator.process(records, &vocab, &reference, None);
        let second = orchestrator.process(first.records.clone(), &vocab, &reference, None);

        assert_eq!(first.records, second.records);
        assert_eq!(first.unresolved_count, second.unresolved_count);
    }

    #[test]
    fn fully_resolved_batch_is_clean() {
        let records = vec![record("Laptop ASUS Vivobook")];
        let vocab = VocabularyStore::new(vec!["ASUS".into()], Vec::new());
        let mut orchestrator = BatchOrchestrator::new(&MatcherConfig::default());

        let outcome = orchestrator.process(records, &vocab, &CategoryTable::empty(), None);
        assert!(outcome.is_clean());
    }
}
