// Weekend detector: Saturday / Sunday timestamps.
// Inactive when the batch has no timestamps at all.

use super::{Detector, DetectorKind, FlagSet};
use crate::record::{has_timestamps, TransactionRecord};
use chrono::{Datelike, NaiveDateTime};

pub struct WeekendDetector;

impl WeekendDetector {
    pub fn new() -> Self {
        WeekendDetector
    }
}

impl Default for WeekendDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Monday = 0 … Sunday = 6; weekend is index ≥ 5
pub fn is_weekend(ts: &NaiveDateTime) -> bool {
    ts.weekday().num_days_from_monday() >= 5
}

impl Detector for WeekendDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Weekend
    }

    fn is_active(&self, records: &[TransactionRecord]) -> bool {
        has_timestamps(records)
    }

    fn detect(&self, records: &[TransactionRecord]) -> FlagSet {
        records
            .iter()
            .filter(|r| r.timestamp.as_ref().is_some_and(is_weekend))
            .map(|r| r.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{at, rec};

    #[test]
    fn test_saturday_and_sunday_flagged() {
        // Jan 5 2024 = Friday, 6 = Saturday, 7 = Sunday, 8 = Monday
        let records = vec![
            rec(0, "A", 10.0).with_timestamp(at(5, 23, 59)),
            rec(1, "A", 10.0).with_timestamp(at(6, 0, 0)),
            rec(2, "A", 10.0).with_timestamp(at(7, 12, 0)),
            rec(3, "A", 10.0).with_timestamp(at(8, 0, 0)),
            rec(4, "A", 10.0),
        ];

        let detector = WeekendDetector::new();
        assert!(detector.is_active(&records));
        assert_eq!(detector.detect(&records), FlagSet::from([1, 2]));
    }

    #[test]
    fn test_disabled_without_timestamps() {
        let records = vec![rec(0, "A", 10.0), rec(1, "B", 20.0)];
        let detector = WeekendDetector::new();

        assert!(!detector.is_active(&records));
        assert!(detector.detect(&records).is_empty());
    }
}
