// src/models.rs
use chrono::NaiveDate;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel label for names no resolution strategy could place.
pub const UNRESOLVED: &str = "UNRESOLVED";

/// Sentinel category for names without a confident reference match.
pub const OTHER_CATEGORY: &str = "OTHER";

/// Availability of a product in one store snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Available,
    OutOfStock,
    Unknown,
}

impl Default for StockStatus {
    fn default() -> Self {
        StockStatus::Unknown
    }
}

/// Outcome of brand resolution for one raw name.
///
/// `Unresolved` is a normal terminal value, not an error; it is what routes a
/// batch into the correction workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrandLabel {
    Canonical(String),
    Unresolved,
}

impl BrandLabel {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, BrandLabel::Unresolved)
    }

    pub fn as_str(&self) -> &str {
        match self {
            BrandLabel::Canonical(brand) => brand,
            BrandLabel::Unresolved => UNRESOLVED,
        }
    }
}

impl fmt::Display for BrandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Serialized as a plain string so labeled rows stay flat tabular data.
impl Serialize for BrandLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BrandLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(if value == UNRESOLVED {
            BrandLabel::Unresolved
        } else {
            BrandLabel::Canonical(value)
        })
    }
}

/// One ingested row of store data, plus the labels this core attaches.
///
/// Only `resolved_brand` and `resolved_category` are ever mutated, and only
/// by the resolution pipeline or the correction workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub raw_name: String,
    pub store: String,
    pub price: f64,
    pub units_sold: u64,
    pub status: StockStatus,
    pub observed_at: NaiveDate,
    pub resolved_brand: BrandLabel,
    pub resolved_category: String,
}

impl ProductRecord {
    pub fn new(
        raw_name: String,
        store: String,
        price: f64,
        units_sold: u64,
        status: StockStatus,
        observed_at: NaiveDate,
    ) -> Self {
        Self {
            raw_name,
            store,
            price,
            units_sold,
            status,
            observed_at,
            resolved_brand: BrandLabel::Unresolved,
            resolved_category: OTHER_CATEGORY.to_string(),
        }
    }

    /// Derived value; never stored independently.
    pub fn revenue(&self) -> f64 {
        self.price * self.units_sold as f64
    }
}

/// A vocabulary mutation awaiting durable persistence by the collaborator
/// that owns the brand/alias sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VocabularyAppend {
    Brand { brand: String },
    Alias { alias: String, brand: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: f64, units: u64) -> ProductRecord {
        ProductRecord::new(
            "Mi Band 8".to_string(),
            "TOKO A".to_string(),
            price,
            units,
            StockStatus::Available,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    #[test]
    fn revenue_is_price_times_units() {
        let r = record(150_000.0, 4);
        assert_eq!(r.revenue(), 600_000.0);
    }

    #[test]
    fn new_records_start_unresolved_and_other() {
        let r = record(1.0, 1);
        assert!(r.resolved_brand.is_unresolved());
        assert_eq!(r.resolved_category, OTHER_CATEGORY);
    }

    #[test]
    fn brand_label_serializes_as_plain_string() {
        let resolved = serde_json::to_string(&BrandLabel::Canonical("ASUS".into())).unwrap();
        assert_eq!(resolved, "\"ASUS\"");
        let unresolved = serde_json::to_string(&BrandLabel::Unresolved).unwrap();
        assert_eq!(unresolved, "\"UNRESOLVED\"");

        let back: BrandLabel = serde_json::from_str("\"UNRESOLVED\"").unwrap();
        assert!(back.is_unresolved());
    }
}
