// High-value transactions: amount strictly above a fixed threshold

use super::{Detector, DetectorKind, FlagSet};
use crate::record::TransactionRecord;

pub struct HighValueDetector {
    threshold: f64,
}

impl HighValueDetector {
    pub fn new(threshold: f64) -> Self {
        HighValueDetector { threshold }
    }
}

impl Detector for HighValueDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::HighValue
    }

    fn is_active(&self, _records: &[TransactionRecord]) -> bool {
        self.threshold > 0.0
    }

    fn detect(&self, records: &[TransactionRecord]) -> FlagSet {
        if !self.is_active(records) {
            return FlagSet::new();
        }

        records
            .iter()
            .filter(|r| r.amount > self.threshold)
            .map(|r| r.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::rec;

    #[test]
    fn test_strictly_above_threshold() {
        let records = vec![rec(0, "A", 500.0), rec(1, "A", 1500.0), rec(2, "B", 999.0)];
        let flagged = HighValueDetector::new(1000.0).detect(&records);

        assert_eq!(flagged, FlagSet::from([1]));
    }

    #[test]
    fn test_equal_to_threshold_not_flagged() {
        let records = vec![rec(0, "A", 1000.0)];
        assert!(HighValueDetector::new(1000.0).detect(&records).is_empty());
    }

    #[test]
    fn test_zero_threshold_disabled() {
        let records = vec![rec(0, "A", 1_000_000.0), rec(1, "A", 0.5)];
        let detector = HighValueDetector::new(0.0);

        assert!(!detector.is_active(&records));
        assert!(detector.detect(&records).is_empty());
    }
}
