// 🧾 Transaction Record - canonical row handed to the engine
// The normalizer produces these; detectors only ever read them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Row index assigned by the normalizer. Unique and stable for one batch.
pub type RecordId = usize;

/// Merchant / account / type placeholder used when the source has nothing
pub const UNKNOWN: &str = "unknown";

// ============================================================================
// TRANSACTION RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Position in the cleaned batch
    pub id: RecordId,

    /// Always finite after cleaning
    pub amount: f64,

    /// Never empty ("unknown" when the source cell was blank)
    pub account_id: String,

    /// Never empty ("unknown" when the source cell was blank)
    #[serde(rename = "type")]
    pub transaction_type: String,

    /// "unknown" when no merchant column was mapped
    pub merchant: String,

    /// None when the source had no date column or the cell did not parse
    pub timestamp: Option<NaiveDateTime>,
}

impl TransactionRecord {
    pub fn new(id: RecordId, amount: f64, account_id: &str, transaction_type: &str) -> Self {
        TransactionRecord {
            id,
            amount,
            account_id: non_empty_or_unknown(account_id),
            transaction_type: non_empty_or_unknown(transaction_type),
            merchant: UNKNOWN.to_string(),
            timestamp: None,
        }
    }

    /// Builder pattern: set merchant
    pub fn with_merchant(mut self, merchant: &str) -> Self {
        self.merchant = non_empty_or_unknown(merchant);
        self
    }

    /// Builder pattern: set timestamp
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }
}

pub(crate) fn non_empty_or_unknown(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Timestamp capability of a batch: true if at least one record carries one.
///
/// Detectors that depend on time (rapid succession, weekend) and the date
/// filter short-circuit to a no-op when this is false.
pub fn has_timestamps(records: &[TransactionRecord]) -> bool {
    records.iter().any(TransactionRecord::has_timestamp)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_blank_fields_default_to_unknown() {
        let record = TransactionRecord::new(0, 10.0, "  ", "").with_merchant("");

        assert_eq!(record.account_id, UNKNOWN);
        assert_eq!(record.transaction_type, UNKNOWN);
        assert_eq!(record.merchant, UNKNOWN);
        assert!(!record.has_timestamp());
    }

    #[test]
    fn test_timestamp_capability() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let without = vec![
            TransactionRecord::new(0, 1.0, "A", "debit"),
            TransactionRecord::new(1, 2.0, "A", "debit"),
        ];
        assert!(!has_timestamps(&without));
        assert!(!has_timestamps(&[]));

        let mut with = without.clone();
        with[1] = with[1].clone().with_timestamp(ts);
        assert!(has_timestamps(&with));

        println!("✅ Timestamp capability check passed");
    }
}
