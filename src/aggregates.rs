// 📊 Account Aggregates - derived per-account statistics
// Recomputed from the current record set on every evaluation, never stored.

use crate::record::{RecordId, TransactionRecord};
use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AccountAggregate {
    pub account_id: String,

    /// Every record of the account, in batch order
    pub record_ids: Vec<RecordId>,

    pub mean: f64,

    /// Sample standard deviation (n - 1). 0 for one record or zero variance.
    pub std_dev: f64,

    /// Timestamped records only, ascending. Ties keep batch order.
    pub timeline: Vec<(NaiveDateTime, RecordId)>,
}

impl AccountAggregate {
    fn build(account_id: &str, records: &[&TransactionRecord]) -> Self {
        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
        let (mean, std_dev) = mean_and_std(&amounts);

        let mut timeline: Vec<(NaiveDateTime, RecordId)> = records
            .iter()
            .filter_map(|r| r.timestamp.map(|ts| (ts, r.id)))
            .collect();
        // Stable sort: equal timestamps stay in batch order
        timeline.sort_by_key(|(ts, _)| *ts);

        AccountAggregate {
            account_id: account_id.to_string(),
            record_ids: records.iter().map(|r| r.id).collect(),
            mean,
            std_dev,
            timeline,
        }
    }

    /// Gap to the previous timestamped record, one entry per timeline item.
    /// The first entry is None: infinitely far from its (absent) predecessor.
    pub fn deltas(&self) -> Vec<Option<Duration>> {
        self.timeline
            .iter()
            .enumerate()
            .map(|(i, (ts, _))| {
                if i == 0 {
                    None
                } else {
                    Some(*ts - self.timeline[i - 1].0)
                }
            })
            .collect()
    }

    /// Upper bound of the outlier band: mean + k × std
    pub fn outlier_bound(&self, k: f64) -> f64 {
        self.mean + k * self.std_dev
    }
}

/// Group a record set by account. BTreeMap keeps account order deterministic.
pub fn group_by_account(records: &[TransactionRecord]) -> BTreeMap<String, AccountAggregate> {
    let mut grouped: BTreeMap<&str, Vec<&TransactionRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.account_id.as_str())
            .or_default()
            .push(record);
    }

    grouped
        .into_iter()
        .map(|(account, rows)| (account.to_string(), AccountAggregate::build(account, &rows)))
        .collect()
}

/// Mean and sample standard deviation.
///
/// Zero-variance input returns the common value as the mean exactly, so no
/// member can exceed it through rounding in the sum.
fn mean_and_std(amounts: &[f64]) -> (f64, f64) {
    let Some(&first) = amounts.first() else {
        return (0.0, 0.0);
    };

    if amounts.iter().all(|&a| a == first) {
        return (first, 0.0);
    }

    let n = amounts.len() as f64;
    let mean = amounts.iter().sum::<f64>() / n;
    let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1.0);

    (mean, variance.sqrt())
}

// ============================================================================
// TESTS
// ============================================================================
