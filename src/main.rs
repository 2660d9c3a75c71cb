// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use labeling_lib::config::MatcherConfig;
use labeling_lib::ingest;
use labeling_lib::matching::category::CategoryTable;
use labeling_lib::pipeline::{BatchOrchestrator, BatchOutcome};
use labeling_lib::review::{ApplyScope, CorrectionSubmission, ReviewSession};
use labeling_lib::vocabulary::VocabularyStore;

#[derive(Parser, Debug)]
#[command(
    name = "label",
    about = "Brand and category labeling pipeline for multi-store price data"
)]
struct Args {
    /// JSON file with raw product rows
    #[arg(long)]
    rows: PathBuf,

    /// JSON file with the canonical brand list (array of strings)
    #[arg(long)]
    brands: PathBuf,

    /// JSON file with the alias table (array of {alias, brand} rows)
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// JSON file with the category reference table (array of {name, category})
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Where to write the labeled rows
    #[arg(long, default_value = "labeled_rows.json")]
    out: PathBuf,

    /// Run the interactive correction loop on unresolved rows
    #[arg(long)]
    review: bool,

    /// Override BRAND_FUZZY_THRESHOLD
    #[arg(long)]
    brand_threshold: Option<f64>,

    /// Override CATEGORY_FUZZY_THRESHOLD
    #[arg(long)]
    category_threshold: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = MatcherConfig::from_env();
    if let Some(t) = args.brand_threshold {
        config.brand_fuzzy_threshold = t;
    }
    if let Some(t) = args.category_threshold {
        config.category_fuzzy_threshold = t;
    }
    config.log_config();

    let run_id = Uuid::new_v4().to_string();
    let start = Instant::now();
    info!("Starting labeling run {}", run_id);

    let mut vocab = VocabularyStore::from_files(&args.brands, args.aliases.as_deref())
        .context("Failed to load vocabulary")?;
    let reference = match &args.categories {
        Some(path) => ingest::load_category_table(path),
        None => {
            warn!("No category reference provided; every row will be categorized as OTHER");
            CategoryTable::empty()
        }
    };

    let raw_rows = ingest::load_rows(&args.rows).context("Failed to load raw rows")?;
    let (records, skipped) = ingest::to_records(raw_rows);
    info!("Ingested {} rows ({} skipped)", records.len(), skipped);

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    pb.set_message("Labeling rows...");

    let mut orchestrator = BatchOrchestrator::new(&config);
    let outcome = orchestrator.process(records, &vocab, &reference, Some(&pb));
    pb.finish_with_message("Labeling complete");

    let outcome = if !outcome.is_clean() && args.review {
        run_review_loop(outcome, &mut vocab, &config)?
    } else {
        outcome
    };

    if !outcome.is_clean() {
        warn!(
            "{} rows remain unresolved; rerun with --review to teach the system",
            outcome.unresolved_count
        );
    }

    persist_vocabulary(&mut vocab, &args.brands, args.aliases.as_deref());
    write_labeled_rows(&outcome, &args.out)?;
    log_summary(&outcome, skipped, start, &run_id);
    Ok(())
}

/// Surfaces unresolved rows one at a time on stdin/stdout until the batch is
/// clean or input ends. Corrections applied through a scope mutate rows
/// directly; the resolver is not re-run afterwards, so a correction taught
/// without an alias is never silently undone.
fn run_review_loop(
    outcome: BatchOutcome,
    vocab: &mut VocabularyStore,
    config: &MatcherConfig,
) -> Result<BatchOutcome> {
    println!(
        "\n{} products were not recognized. Teach the system below.\n",
        outcome.unresolved_count
    );
    let mut session = ReviewSession::new(outcome.records);

    while !session.is_clean() {
        let (name, store) = match session.current() {
            Some(row) => (row.raw_name.clone(), row.store.clone()),
            None => break,
        };
        println!("Needs review: '{}' (store: {})", name, store);

        let existing = match prompt("Existing brand (blank to skip)")? {
            Some(v) => v,
            None => break,
        };
        let new_brand = match prompt("New brand (blank to skip)")? {
            Some(v) => v,
            None => break,
        };
        let alias = match prompt("Alias/phrase to teach (optional)")? {
            Some(v) => v,
            None => break,
        };
        let scope = match prompt("Scope [single/phrase/fuzzy] (default single)")? {
            Some(v) => v,
            None => break,
        };

        let scope = match scope.to_lowercase().as_str() {
            "phrase" => ApplyScope::ContainsPhrase,
            "fuzzy" => ApplyScope::FuzzySimilar {
                threshold: config.review_fuzzy_threshold,
            },
            _ => ApplyScope::Single,
        };
        let submission = CorrectionSubmission {
            existing_brand: non_empty(existing),
            new_brand: non_empty(new_brand),
            alias: non_empty(alias),
            scope,
        };

        match session.submit(submission, vocab) {
            Ok(applied) => println!(
                "Taught '{}': {} rows updated, {} still unresolved\n",
                applied.brand, applied.rows_updated, applied.remaining_unresolved
            ),
            Err(e) => println!("Invalid submission: {}\n", e),
        }
    }

    if !session.is_clean() {
        warn!("Review ended early with {} rows unresolved", session.unresolved_count());
    }

    let unresolved_count = session.unresolved_count();
    Ok(BatchOutcome {
        records: session.into_records(),
        unresolved_count,
    })
}

fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}: ", label);
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    let read = io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        println!();
        return Ok(None); // EOF
    }
    Ok(Some(line.trim().to_string()))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Serialize)]
struct AliasOut<'a> {
    alias: &'a str,
    brand: &'a str,
}

/// Writes taught brands/aliases back to the vocabulary files. A failure here
/// is reported but does not abort the run: the in-memory vocabulary already
/// carries the teaching, it just will not survive a restart unless retried.
fn persist_vocabulary(vocab: &mut VocabularyStore, brands_path: &Path, aliases_path: Option<&Path>) {
    let pending = vocab.take_pending();
    if pending.is_empty() {
        return;
    }
    info!("Persisting {} vocabulary appends", pending.len());

    if let Err(e) = write_json(brands_path, &vocab.brands().to_vec()) {
        warn!(
            "Failed to persist brand list to {}: {}. Taught brands will not survive a restart unless resubmitted.",
            brands_path.display(),
            e
        );
    }
    match aliases_path {
        Some(path) => {
            let rows: Vec<AliasOut> = vocab
                .aliases()
                .iter()
                .map(|(alias, brand)| AliasOut { alias, brand })
                .collect();
            if let Err(e) = write_json(path, &rows) {
                warn!(
                    "Failed to persist alias table to {}: {}. Taught aliases will not survive a restart unless resubmitted.",
                    path.display(),
                    e
                );
            }
        }
        None => warn!("No alias file configured; taught aliases will not survive a restart"),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_labeled_rows(outcome: &BatchOutcome, path: &Path) -> Result<()> {
    write_json(path, &outcome.records)
        .with_context(|| format!("failed to write labeled rows to {}", path.display()))?;
    info!("Wrote {} labeled rows to {}", outcome.records.len(), path.display());
    Ok(())
}

fn log_summary(outcome: &BatchOutcome, skipped: usize, start: Instant, run_id: &str) {
    let total_revenue: f64 = outcome.records.iter().map(|r| r.revenue()).sum();
    info!(
        "Run {} finished in {:.2?}: {} rows labeled, {} unresolved, {} skipped, total revenue {:.0}",
        run_id,
        start.elapsed(),
        outcome.records.len(),
        outcome.unresolved_count,
        skipped,
        total_revenue
    );
}
