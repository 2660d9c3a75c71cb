// src/ingest.rs
//! Boundary between the out-of-scope ingestion collaborators (drive/CSV
//! readers) and the typed core: loosely-typed row tables come in, clean
//! `ProductRecord`s come out. Row-level defects are recovered locally and
//! never fail the batch.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::matching::category::CategoryTable;
use crate::models::{ProductRecord, StockStatus};

/// One raw row as handed over by the ingestion collaborator. Field names
/// accept both the canonical snake_case form and the original sheet headers.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    #[serde(default, alias = "Nama Produk", alias = "NAMA")]
    pub product_name: Option<String>,
    #[serde(default, alias = "Toko")]
    pub store: Option<String>,
    #[serde(default, alias = "Harga")]
    pub price: Option<f64>,
    #[serde(default, alias = "Terjual")]
    pub units_sold: Option<u64>,
    #[serde(default)]
    pub status: Option<StockStatus>,
    #[serde(default)]
    pub observed_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    #[serde(alias = "NAMA")]
    name: String,
    #[serde(alias = "KATEGORI")]
    category: String,
}

/// Converts raw rows into records for resolution. Rows without a product
/// name cannot be resolved and are skipped with a warning; the second return
/// value is the skipped count.
pub fn to_records(rows: Vec<RawRow>) -> (Vec<ProductRecord>, usize) {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (i, row) in rows.into_iter().enumerate() {
        let name = row
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                warn!("Row {} has no product name; excluded from resolution", i);
                skipped += 1;
                continue;
            }
        };
        records.push(ProductRecord::new(
            name,
            row.store.unwrap_or_else(|| "UNKNOWN".to_string()),
            row.price.unwrap_or(0.0),
            row.units_sold.unwrap_or(0),
            row.status.unwrap_or_default(),
            row.observed_at.unwrap_or_default(),
        ));
    }
    if skipped > 0 {
        warn!("Excluded {} rows without a product name", skipped);
    }
    (records, skipped)
}

/// Loads raw rows from a JSON array file.
pub fn load_rows(path: &Path) -> Result<Vec<RawRow>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read rows file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("rows file {} is not a JSON array of rows", path.display()))
}

/// Loads the category reference table, degrading to an empty table (every
/// row then resolves to OTHER) when the file is missing or malformed.
pub fn load_category_table(path: &Path) -> CategoryTable {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "Cannot read category reference {}: {}. Categories degrade to OTHER.",
                path.display(),
                e
            );
            return CategoryTable::empty();
        }
    };
    match serde_json::from_str::<Vec<CategoryRow>>(&raw) {
        Ok(rows) => CategoryTable::new(
            rows.into_iter().map(|r| (r.name, r.category)).collect(),
        ),
        Err(e) => {
            warn!(
                "Category reference {} is malformed: {}. Categories degrade to OTHER.",
                path.display(),
                e
            );
            CategoryTable::empty()
        }
    }
}
