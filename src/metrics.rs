// 📈 Summary Metrics
// Empty record sets report "not available" (None) instead of NaN.

use crate::aggregation::FlagMap;
use crate::record::TransactionRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_count: usize,
    pub mean_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub min_amount: Option<f64>,
    pub flagged_count: usize,

    /// flagged / total × 100; 0 when the set is empty
    pub flagged_percentage: f64,
}

impl SummaryMetrics {
    pub fn compute(records: &[TransactionRecord], flags: &FlagMap) -> Self {
        let total_count = records.len();
        let flagged_count = records
            .iter()
            .filter(|r| flags.get(&r.id).copied().unwrap_or(false))
            .count();

        let (mean_amount, max_amount, min_amount) = if records.is_empty() {
            (None, None, None)
        } else {
            let sum: f64 = records.iter().map(|r| r.amount).sum();
            let max = records.iter().map(|r| r.amount).fold(f64::NEG_INFINITY, f64::max);
            let min = records.iter().map(|r| r.amount).fold(f64::INFINITY, f64::min);
            (Some(sum / total_count as f64), Some(max), Some(min))
        };

        let flagged_percentage = if total_count == 0 {
            0.0
        } else {
            flagged_count as f64 / total_count as f64 * 100.0
        };

        SummaryMetrics {
            total_count,
            mean_amount,
            max_amount,
            min_amount,
            flagged_count,
            flagged_percentage,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Transactions: {}, Avg: {}, Max: {}, Min: {}, Flagged: {} ({:.1}%)",
            self.total_count,
            format_amount(self.mean_amount),
            format_amount(self.max_amount),
            format_amount(self.min_amount),
            self.flagged_count,
            self.flagged_percentage
        )
    }
}

/// "$12.34" or "n/a"
pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) => format!("${:.2}", value),
        None => "n/a".to_string(),
    }
}
