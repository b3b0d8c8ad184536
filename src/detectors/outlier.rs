// Statistical outlier: amount above the account's mean + 2 standard deviations.
// Always active. Singletons and zero-variance accounts never flag.

use super::{Detector, DetectorKind, FlagSet};
use crate::aggregates::group_by_account;
use crate::record::TransactionRecord;
use std::collections::HashMap;

/// Width of the band above the mean, in standard deviations
pub const OUTLIER_SIGMA: f64 = 2.0;

pub struct StatisticalOutlierDetector {
    sigma: f64,
}

impl StatisticalOutlierDetector {
    pub fn new() -> Self {
        StatisticalOutlierDetector {
            sigma: OUTLIER_SIGMA,
        }
    }
}

impl Default for StatisticalOutlierDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StatisticalOutlierDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::StatisticalOutlier
    }

    fn is_active(&self, _records: &[TransactionRecord]) -> bool {
        true
    }

    fn detect(&self, records: &[TransactionRecord]) -> FlagSet {
        let bounds: HashMap<String, f64> = group_by_account(records)
            .into_iter()
            .map(|(account, agg)| (account, agg.outlier_bound(self.sigma)))
            .collect();

        records
            .iter()
            .filter(|r| {
                bounds
                    .get(&r.account_id)
                    .is_some_and(|bound| r.amount > *bound)
            })
            .map(|r| r.id)
            .collect()
    }
}
