// 📅 Date-Range Filter
// Runs once, before any detector. Every detector sees its output only.

use crate::config::DateRange;
use crate::record::{has_timestamps, TransactionRecord};
use tracing::debug;

/// Outcome of the date filter
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub records: Vec<TransactionRecord>,

    /// False when the filter was a no-op
    pub applied: bool,
}

/// Keep records whose timestamp lies in `[start, end]`.
///
/// No-op (records returned unchanged) when either bound is missing or the
/// batch has no timestamps at all. When applied, records without a
/// timestamp fall outside the window. `start > end` yields an empty set.
pub fn apply_date_range(records: &[TransactionRecord], range: &DateRange) -> FilterOutcome {
    let Some((start, end)) = range.bounds() else {
        return FilterOutcome {
            records: records.to_vec(),
            applied: false,
        };
    };

    if !has_timestamps(records) {
        debug!("Date range set but batch carries no timestamps, filter skipped");
        return FilterOutcome {
            records: records.to_vec(),
            applied: false,
        };
    }

    let kept: Vec<TransactionRecord> = records
        .iter()
        .filter(|r| r.timestamp.is_some_and(|ts| range.contains(ts)))
        .cloned()
        .collect();

    debug!(
        "Date filter {} → {}: kept {} of {} records",
        start,
        end,
        kept.len(),
        records.len()
    );

    FilterOutcome {
        records: kept,
        applied: true,
    }
}

// ============================================================================
// TESTS
// ============================================================================
