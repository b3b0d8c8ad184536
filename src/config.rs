// ⚙️ Detection Configuration - thresholds as data
// One immutable value per evaluation. Zero / empty means "detector disabled".

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Gap (seconds) below which two transactions of an account count as rapid.
/// Fixed; not part of the tunable configuration.
pub const RAPID_WINDOW_SECONDS: i64 = 3600;

// ============================================================================
// DATE RANGE
// ============================================================================

/// Inclusive date window. The filter only applies when both bounds are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDateTime>,

    #[serde(default)]
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Calendar-date bounds, each taken at midnight.
    ///
    /// A record at 10:00 on `end` is therefore outside the window.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange::new(
            start.and_time(NaiveTime::MIN),
            end.and_time(NaiveTime::MIN),
        )
    }

    /// Both bounds present, or None
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        match self.bounds() {
            Some((start, end)) => ts >= start && ts <= end,
            None => true,
        }
    }
}

// ============================================================================
// DETECTION CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// High-value detector threshold (0 = disabled)
    #[serde(default)]
    pub amount_threshold: f64,

    /// Rapid deltas per account that escalate the account (0 = disabled)
    #[serde(default)]
    pub rapid_count_threshold: u32,

    /// Exact merchant names to flag (empty = disabled)
    #[serde(default)]
    pub risky_merchants: BTreeSet<String>,

    #[serde(default)]
    pub date_range: DateRange,
}

impl DetectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse detection config JSON")
    }

    /// Pretty JSON with every field present, used by `init-config`
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize detection config")
    }

    /// Builder pattern: set high-value threshold
    pub fn with_amount_threshold(mut self, threshold: f64) -> Self {
        self.amount_threshold = threshold;
        self
    }

    /// Builder pattern: set rapid-succession threshold
    pub fn with_rapid_count_threshold(mut self, threshold: u32) -> Self {
        self.rapid_count_threshold = threshold;
        self
    }

    /// Builder pattern: add a risky merchant
    pub fn with_risky_merchant(mut self, merchant: &str) -> Self {
        self.risky_merchants.insert(merchant.to_string());
        self
    }

    /// Builder pattern: set date window
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn rapid_window_seconds(&self) -> i64 {
        RAPID_WINDOW_SECONDS
    }

    pub fn high_value_enabled(&self) -> bool {
        self.amount_threshold > 0.0
    }

    pub fn rapid_succession_enabled(&self) -> bool {
        self.rapid_count_threshold > 0
    }

    pub fn risky_merchants_enabled(&self) -> bool {
        !self.risky_merchants.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_disables_everything() {
        let config = DetectionConfig::default();

        assert!(!config.high_value_enabled());
        assert!(!config.rapid_succession_enabled());
        assert!(!config.risky_merchants_enabled());
        assert_eq!(config.date_range.bounds(), None);
        assert_eq!(config.rapid_window_seconds(), 3600);
    }

    #[test]
    fn test_negative_threshold_is_disabled() {
        let config = DetectionConfig::new().with_amount_threshold(-5.0);
        assert!(!config.high_value_enabled());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DetectionConfig::from_json(
            r#"{ "amount_threshold": 1000, "risky_merchants": ["Casino Royale"] }"#,
        )
        .unwrap();

        assert_eq!(config.amount_threshold, 1000.0);
        assert_eq!(config.rapid_count_threshold, 0);
        assert!(config.risky_merchants.contains("Casino Royale"));
        assert_eq!(config.date_range, DateRange::default());
    }

    #[test]
    fn test_date_range_json() {
        let config = DetectionConfig::from_json(
            r#"{ "date_range": { "start": "2024-01-01T00:00:00", "end": "2024-01-31T00:00:00" } }"#,
        )
        .unwrap();

        let (start, end) = config.date_range.bounds().unwrap();
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_half_open_range_has_no_bounds() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0),
            end: None,
        };

        assert_eq!(range.bounds(), None);
    }

    #[test]
    fn test_from_dates_is_inclusive_at_midnight() {
        let range = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );

        let at = |d: u32, h: u32| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };

        assert!(range.contains(at(1, 0)));
        assert!(range.contains(at(1, 23)));
        assert!(range.contains(at(2, 0)));
        assert!(!range.contains(at(2, 10)));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = DetectionConfig::new()
            .with_amount_threshold(250.0)
            .with_rapid_count_threshold(3)
            .with_risky_merchant("CryptoSwap");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json_pretty().unwrap().as_bytes())
            .unwrap();

        let loaded = DetectionConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);

        println!("✅ Config file test passed");
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = DetectionConfig::from_file("/nonexistent/flagger.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
