// ⏱️ Rapid-succession detector
//
// Per account: count gaps shorter than the rapid window between consecutive
// timestamped transactions. Once the count reaches the threshold the whole
// account is escalated: every record of that account is flagged, including
// ones without a timestamp and ones far from the rapid cluster.

use super::{Detector, DetectorKind, FlagSet};
use crate::aggregates::{group_by_account, AccountAggregate};
use crate::record::{has_timestamps, TransactionRecord};
use chrono::Duration;
use tracing::debug;

pub struct RapidSuccessionDetector {
    count_threshold: u32,
    window: Duration,
}

impl RapidSuccessionDetector {
    pub fn new(count_threshold: u32, window_seconds: i64) -> Self {
        RapidSuccessionDetector {
            count_threshold,
            window: Duration::seconds(window_seconds),
        }
    }

    /// Gaps strictly below the window. The leading None never counts.
    pub fn rapid_count(&self, account: &AccountAggregate) -> usize {
        account
            .deltas()
            .into_iter()
            .flatten()
            .filter(|delta| *delta < self.window)
            .count()
    }
}

impl Detector for RapidSuccessionDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::RapidSuccession
    }

    fn is_active(&self, records: &[TransactionRecord]) -> bool {
        self.count_threshold > 0 && has_timestamps(records)
    }

    fn detect(&self, records: &[TransactionRecord]) -> FlagSet {
        if !self.is_active(records) {
            return FlagSet::new();
        }

        let mut flagged = FlagSet::new();
        for (account_id, account) in group_by_account(records) {
            let rapid = self.rapid_count(&account);
            if rapid >= self.count_threshold as usize {
                debug!(
                    "Account {} escalated: {} rapid gaps (threshold {})",
                    account_id, rapid, self.count_threshold
                );
                flagged.extend(account.record_ids.iter().copied());
            }
        }

        flagged
    }
}
