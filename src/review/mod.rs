// src/review/mod.rs
//! Human-in-the-loop correction workflow.
//!
//! Scans a labeled batch for unresolved rows, surfaces them one at a time,
//! and applies operator corrections in bulk: `Scanning -> AwaitingInput ->
//! Applying -> Scanning`, terminating in `Clean` once nothing is unresolved.
//! Applying is the only place this crate mutates the vocabulary, and it runs
//! to completion (vocabulary appends, then row updates) before the next scan.

use log::{debug, info};
use thiserror::Error;

use crate::matching::fuzzy::token_set_ratio;
use crate::models::{BrandLabel, ProductRecord};
use crate::vocabulary::VocabularyStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("submission must select an existing brand or provide a new one")]
    MissingBrand,
    #[error("contains-phrase scope requires an alias/phrase")]
    MissingPhrase,
    #[error("no unresolved item is awaiting review")]
    NothingToReview,
}

/// How broadly one taught correction is applied to the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyScope {
    /// Only rows sharing the surfaced row's exact raw name.
    Single,
    /// Every currently-unresolved row whose upper-cased name contains the
    /// taught alias/phrase as a substring. Deliberately broader than the
    /// resolver's whole-word alias stage, for fast bulk cleanup.
    ContainsPhrase,
    /// Every currently-unresolved row whose token-set similarity to the
    /// surfaced row's name clears the threshold.
    FuzzySimilar { threshold: f64 },
}

impl Default for ApplyScope {
    fn default() -> Self {
        ApplyScope::Single
    }
}

/// One operator submission from the review form.
#[derive(Debug, Clone, Default)]
pub struct CorrectionSubmission {
    /// Brand picked from the existing vocabulary, if any.
    pub existing_brand: Option<String>,
    /// Freshly typed brand; trimmed and upper-cased before use.
    pub new_brand: Option<String>,
    /// Optional alias/phrase to teach to the vocabulary.
    pub alias: Option<String>,
    pub scope: ApplyScope,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewState {
    Scanning,
    AwaitingInput { raw_name: String },
    Applying,
    Clean,
}

/// What one `Applying` transition did.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub brand: String,
    pub rows_updated: usize,
    pub brand_added: bool,
    pub alias_added: bool,
    pub remaining_unresolved: usize,
}

/// Owns the in-flight labeled dataset while corrections are applied.
///
/// The vocabulary is passed into each submission rather than held here, so
/// callers keep one explicit mutation point for the store.
pub struct ReviewSession {
    records: Vec<ProductRecord>,
    state: ReviewState,
    iterations: usize,
}

impl ReviewSession {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        let mut session = Self {
            records,
            state: ReviewState::Scanning,
            iterations: 0,
        };
        session.scan();
        session
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn is_clean(&self) -> bool {
        self.state == ReviewState::Clean
    }

    /// Number of `Applying` transitions performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn unresolved_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.resolved_brand.is_unresolved())
            .count()
    }

    /// The row currently surfaced for review, if any.
    pub fn current(&self) -> Option<&ProductRecord> {
        match &self.state {
            ReviewState::AwaitingInput { raw_name } => self
                .records
                .iter()
                .find(|r| r.resolved_brand.is_unresolved() && r.raw_name == *raw_name),
            _ => None,
        }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }

    /// `AwaitingInput -> Applying -> Scanning`. On a validation error no
    /// state is mutated and the session stays in `AwaitingInput`.
    pub fn submit(
        &mut self,
        submission: CorrectionSubmission,
        vocab: &mut VocabularyStore,
    ) -> Result<ApplyOutcome, ReviewError> {
        let reviewed_name = match &self.state {
            ReviewState::AwaitingInput { raw_name } => raw_name.clone(),
            _ => return Err(ReviewError::NothingToReview),
        };

        let brand = validate_brand(&submission)?;
        let alias = submission
            .alias
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_uppercase);
        if submission.scope == ApplyScope::ContainsPhrase && alias.is_none() {
            return Err(ReviewError::MissingPhrase);
        }

        self.state = ReviewState::Applying;

        // Stable snapshot of the unresolved set, taken before any mutation.
        let unresolved: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.resolved_brand.is_unresolved())
            .map(|(i, _)| i)
            .collect();

        let scope_set = compute_scope(
            &self.records,
            &unresolved,
            &reviewed_name,
            &submission.scope,
            alias.as_deref(),
        );

        // Teach the vocabulary first, then update rows; both complete before
        // the next scan so no resolution pass sees a half-applied correction.
        let brand_added = !vocab.contains_brand(&brand) && vocab.append_brand(&brand);
        let alias_added = match &alias {
            Some(alias) => {
                vocab.append_alias(alias, &brand);
                true
            }
            None => false,
        };

        let mut rows_updated = 0;
        for &idx in &scope_set {
            self.records[idx].resolved_brand = BrandLabel::Canonical(brand.clone());
            rows_updated += 1;
        }

        self.iterations += 1;
        self.scan();
        let remaining = self.unresolved_count();
        info!(
            "Applied correction '{}' to {} rows ({} unresolved remaining)",
            brand, rows_updated, remaining
        );

        Ok(ApplyOutcome {
            brand,
            rows_updated,
            brand_added,
            alias_added,
            remaining_unresolved: remaining,
        })
    }

    fn scan(&mut self) {
        let next = self
            .records
            .iter()
            .find(|r| r.resolved_brand.is_unresolved())
            .map(|r| r.raw_name.clone());
        self.state = match next {
            Some(raw_name) => {
                debug!("Surfacing '{}' for review", raw_name);
                ReviewState::AwaitingInput { raw_name }
            }
            None => ReviewState::Clean,
        };
    }
}

fn validate_brand(submission: &CorrectionSubmission) -> Result<String, ReviewError> {
    let existing = submission
        .existing_brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());
    let new = submission
        .new_brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());
    existing
        .or(new)
        .map(str::to_uppercase)
        .ok_or(ReviewError::MissingBrand)
}

/// Computes the set of row indices a correction applies to. Always includes
/// the reviewed row(s); `unresolved` is the pre-mutation snapshot.
fn compute_scope(
    records: &[ProductRecord],
    unresolved: &[usize],
    reviewed_name: &str,
    scope: &ApplyScope,
    alias: Option<&str>,
) -> Vec<usize> {
    unresolved
        .iter()
        .copied()
        .filter(|&idx| {
            let row = &records[idx];
            if row.raw_name == reviewed_name {
                return true;
            }
            match scope {
                ApplyScope::Single => false,
                ApplyScope::ContainsPhrase => match alias {
                    Some(phrase) => row.raw_name.to_uppercase().contains(phrase),
                    None => false,
                },
                ApplyScope::FuzzySimilar { threshold } => {
                    token_set_ratio(&row.raw_name, reviewed_name) >= *threshold
                }
            }
        })
        .collect()
}
