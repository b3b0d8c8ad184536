// Risky-merchant detector: exact membership in a configured merchant set

use super::{Detector, DetectorKind, FlagSet};
use crate::record::TransactionRecord;
use std::collections::BTreeSet;

pub struct RiskyMerchantDetector {
    merchants: BTreeSet<String>,
}

impl RiskyMerchantDetector {
    pub fn new(merchants: BTreeSet<String>) -> Self {
        RiskyMerchantDetector { merchants }
    }
}

impl Detector for RiskyMerchantDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::RiskyMerchant
    }

    fn is_active(&self, _records: &[TransactionRecord]) -> bool {
        !self.merchants.is_empty()
    }

    fn detect(&self, records: &[TransactionRecord]) -> FlagSet {
        records
            .iter()
            .filter(|r| self.merchants.contains(&r.merchant))
            .map(|r| r.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::rec;

    #[test]
    fn test_exact_merchant_match() {
        let records = vec![
            rec(0, "A", 10.0).with_merchant("Lucky Casino"),
            rec(1, "A", 10.0).with_merchant("lucky casino"),
            rec(2, "B", 10.0).with_merchant("Grocer"),
        ];

        let detector = RiskyMerchantDetector::new(BTreeSet::from(["Lucky Casino".to_string()]));
        assert_eq!(detector.detect(&records), FlagSet::from([0]));
    }

    #[test]
    fn test_empty_set_is_noop() {
        let records = vec![rec(0, "A", 10.0)];
        let detector = RiskyMerchantDetector::new(BTreeSet::new());

        assert!(!detector.is_active(&records));
        assert!(detector.detect(&records).is_empty());
    }

    #[test]
    fn test_unknown_merchant_can_be_listed() {
        // Records without a merchant column default to "unknown"
        let records = vec![rec(0, "A", 10.0)];
        let detector = RiskyMerchantDetector::new(BTreeSet::from(["unknown".to_string()]));

        assert_eq!(detector.detect(&records), FlagSet::from([0]));
    }
}
