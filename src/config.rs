// src/config.rs
use log::{info, warn};
use std::env;

pub const DEFAULT_BRAND_FUZZY_THRESHOLD: f64 = 88.0;
pub const DEFAULT_CATEGORY_FUZZY_THRESHOLD: f64 = 95.0;
pub const DEFAULT_REVIEW_FUZZY_THRESHOLD: f64 = 90.0;
pub const DEFAULT_RESOLUTION_CACHE_SIZE: usize = 20000;

/// Matching thresholds and cache sizing, overridable via environment.
///
/// The category threshold is deliberately stricter than the brand threshold:
/// category reference names are full product titles, and looser matching
/// misclassifies aggressively.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub brand_fuzzy_threshold: f64,
    pub category_fuzzy_threshold: f64,
    pub review_fuzzy_threshold: f64,
    pub resolution_cache_size: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            brand_fuzzy_threshold: DEFAULT_BRAND_FUZZY_THRESHOLD,
            category_fuzzy_threshold: DEFAULT_CATEGORY_FUZZY_THRESHOLD,
            review_fuzzy_threshold: DEFAULT_REVIEW_FUZZY_THRESHOLD,
            resolution_cache_size: DEFAULT_RESOLUTION_CACHE_SIZE,
        }
    }
}

impl MatcherConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            brand_fuzzy_threshold: env_threshold(
                "BRAND_FUZZY_THRESHOLD",
                DEFAULT_BRAND_FUZZY_THRESHOLD,
            ),
            category_fuzzy_threshold: env_threshold(
                "CATEGORY_FUZZY_THRESHOLD",
                DEFAULT_CATEGORY_FUZZY_THRESHOLD,
            ),
            review_fuzzy_threshold: env_threshold(
                "REVIEW_FUZZY_THRESHOLD",
                DEFAULT_REVIEW_FUZZY_THRESHOLD,
            ),
            resolution_cache_size: env::var("RESOLUTION_CACHE_SIZE")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_RESOLUTION_CACHE_SIZE),
        }
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!(
            "Matcher config: brand threshold {}, category threshold {}, review threshold {}, cache size {}",
            self.brand_fuzzy_threshold,
            self.category_fuzzy_threshold,
            self.review_fuzzy_threshold,
            self.resolution_cache_size
        );
    }
}

fn env_threshold(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(raw) => match raw.parse::<f64>() {
            Ok(value) if (0.0..=100.0).contains(&value) => value,
            _ => {
                warn!("Ignoring invalid {} value '{}'; using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // One test so the env mutations cannot race each other.
    #[test]
    fn from_env_defaults_and_validation() {
        env::remove_var("BRAND_FUZZY_THRESHOLD");
        env::remove_var("CATEGORY_FUZZY_THRESHOLD");
        env::remove_var("REVIEW_FUZZY_THRESHOLD");
        env::remove_var("RESOLUTION_CACHE_SIZE");

        let config = MatcherConfig::from_env();
        assert_eq!(config.brand_fuzzy_threshold, DEFAULT_BRAND_FUZZY_THRESHOLD);
        assert_eq!(config.category_fuzzy_threshold, DEFAULT_CATEGORY_FUZZY_THRESHOLD);
        assert_eq!(config.review_fuzzy_threshold, DEFAULT_REVIEW_FUZZY_THRESHOLD);
        assert_eq!(config.resolution_cache_size, DEFAULT_RESOLUTION_CACHE_SIZE);

        env::set_var("BRAND_FUZZY_THRESHOLD", "250");
        env::set_var("CATEGORY_FUZZY_THRESHOLD", "90.5");
        let config = MatcherConfig::from_env();
        assert_eq!(config.brand_fuzzy_threshold, DEFAULT_BRAND_FUZZY_THRESHOLD);
        assert_eq!(config.category_fuzzy_threshold, 90.5);

        env::remove_var("BRAND_FUZZY_THRESHOLD");
        env::remove_var("CATEGORY_FUZZY_THRESHOLD");
    }
}
