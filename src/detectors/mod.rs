// 🚩 Detector Set - independent suspicious-activity predicates
//
// Each detector is a pure function from the (date-filtered) record set to the
// ids it flags. Detectors never see each other's output; the aggregation
// policy ORs them together afterwards.

use crate::config::DetectionConfig;
use crate::record::{RecordId, TransactionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod high_value;
pub mod outlier;
pub mod rapid_succession;
pub mod risky_merchant;
pub mod weekend;

pub use high_value::HighValueDetector;
pub use outlier::StatisticalOutlierDetector;
pub use rapid_succession::RapidSuccessionDetector;
pub use risky_merchant::RiskyMerchantDetector;
pub use weekend::WeekendDetector;

/// Ids flagged by one detector
pub type FlagSet = BTreeSet<RecordId>;

// ============================================================================
// DETECTOR KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    HighValue,
    RapidSuccession,
    StatisticalOutlier,
    Weekend,
    RiskyMerchant,
}

impl DetectorKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::HighValue => "High value",
            DetectorKind::RapidSuccession => "Rapid succession",
            DetectorKind::StatisticalOutlier => "Account outlier",
            DetectorKind::Weekend => "Weekend",
            DetectorKind::RiskyMerchant => "Risky merchant",
        }
    }

    /// Short code used in exports
    pub fn code(&self) -> &'static str {
        match self {
            DetectorKind::HighValue => "high_value",
            DetectorKind::RapidSuccession => "rapid_succession",
            DetectorKind::StatisticalOutlier => "outlier",
            DetectorKind::Weekend => "weekend",
            DetectorKind::RiskyMerchant => "risky_merchant",
        }
    }
}

// ============================================================================
// DETECTOR TRAIT
// ============================================================================

/// Detector - core trait
///
/// `is_active` is the capability/threshold gate; `detect` is only called on
/// active detectors but must itself return an empty set when inactive.
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Whether this detector runs for the given batch
    fn is_active(&self, records: &[TransactionRecord]) -> bool;

    /// Ids of records this detector flags
    fn detect(&self, records: &[TransactionRecord]) -> FlagSet;
}

/// Build every detector from one configuration value
///
/// Factory: returns trait objects so the engine iterates them uniformly.
pub fn detector_set(config: &DetectionConfig) -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(HighValueDetector::new(config.amount_threshold)),
        Box::new(RapidSuccessionDetector::new(
            config.rapid_count_threshold,
            config.rapid_window_seconds(),
        )),
        Box::new(StatisticalOutlierDetector::new()),
        Box::new(WeekendDetector::new()),
        Box::new(RiskyMerchantDetector::new(config.risky_merchants.clone())),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::record::TransactionRecord;
    use chrono::{NaiveDate, NaiveDateTime};

    /// 2024-01-01 is a Monday
    pub fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    pub fn rec(id: usize, account: &str, amount: f64) -> TransactionRecord {
        TransactionRecord::new(id, amount, account, "purchase")
    }
}
