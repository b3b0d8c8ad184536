// 🧹 Record Normalizer - source columns → canonical records
//
// Maps arbitrary CSV headers onto the canonical fields and applies the
// cleaning rules the engine relies on:
//   - fully empty rows are dropped
//   - non-numeric / non-finite amounts drop the row
//   - blank account / type become "unknown"
//   - merchant is "unknown" when unmapped or blank
//   - unparseable dates become None

use crate::record::{non_empty_or_unknown, TransactionRecord, UNKNOWN};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Column '{column}' mapped to {field} was not found in the header")]
    MissingColumn { field: &'static str, column: String },

    #[error("Input has no header row")]
    NoHeader,
}

// ============================================================================
// COLUMN MAPPING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub amount: String,
    pub account_id: String,
    pub transaction_type: String,

    #[serde(default)]
    pub merchant: Option<String>,

    #[serde(default)]
    pub date: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            amount: "amount".to_string(),
            account_id: "account_id".to_string(),
            transaction_type: "type".to_string(),
            merchant: None,
            date: None,
        }
    }
}

impl ColumnMapping {
    /// Builder pattern: map merchant column
    pub fn with_merchant(mut self, column: &str) -> Self {
        self.merchant = Some(column.to_string());
        self
    }

    /// Builder pattern: map date column
    pub fn with_date(mut self, column: &str) -> Self {
        self.date = Some(column.to_string());
        self
    }

    fn resolve(&self, headers: &StringRecord) -> Result<ResolvedColumns, NormalizeError> {
        let find = |field: &'static str, column: &str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| NormalizeError::MissingColumn {
                    field,
                    column: column.to_string(),
                })
        };

        let optional = |field: &'static str, column: &Option<String>| match column {
            Some(name) => find(field, name).map(Some),
            None => Ok(None),
        };

        Ok(ResolvedColumns {
            amount: find("amount", &self.amount)?,
            account_id: find("account_id", &self.account_id)?,
            transaction_type: find("type", &self.transaction_type)?,
            merchant: optional("merchant", &self.merchant)?,
            date: optional("date", &self.date)?,
        })
    }
}

struct ResolvedColumns {
    amount: usize,
    account_id: usize,
    transaction_type: usize,
    merchant: Option<usize>,
    date: Option<usize>,
}

// ============================================================================
// CLEANING OUTPUT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Data rows read (header excluded)
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub dates_unparsed: usize,
}

impl CleaningReport {
    pub fn summary(&self) -> String {
        format!(
            "Data cleaned: {} row(s) read, {} row(s) dropped, {} date(s) unparsed",
            self.rows_read, self.rows_dropped, self.dates_unparsed
        )
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub records: Vec<TransactionRecord>,
    pub report: CleaningReport,
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Load and normalize a CSV file
pub fn load_csv(path: &Path, mapping: &ColumnMapping) -> Result<NormalizedBatch> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    normalize_reader(file, mapping)
        .with_context(|| format!("Failed to normalize {}", path.display()))
}

/// Normalize CSV from any reader. Record ids are positions in the cleaned batch.
pub fn normalize_reader<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<NormalizedBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    if headers.is_empty() {
        return Err(NormalizeError::NoHeader.into());
    }
    let columns = mapping.resolve(&headers)?;

    let mut records = Vec::new();
    let mut report = CleaningReport::default();

    for (line_num, result) in reader.records().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse CSV line {}", line_num + 2) // +2: 1-indexed + header
        })?;
        report.rows_read += 1;

        if row.iter().all(|cell| cell.is_empty()) {
            report.rows_dropped += 1;
            continue;
        }

        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let Some(amount) = parse_amount(cell(columns.amount)) else {
            debug!("Line {}: dropping non-numeric amount {:?}", line_num + 2, cell(columns.amount));
            report.rows_dropped += 1;
            continue;
        };

        let mut record = TransactionRecord::new(
            records.len(),
            amount,
            cell(columns.account_id),
            cell(columns.transaction_type),
        );

        record.merchant = match columns.merchant {
            Some(idx) => non_empty_or_unknown(cell(idx)),
            None => UNKNOWN.to_string(),
        };

        if let Some(idx) = columns.date {
            let raw = cell(idx);
            record.timestamp = parse_timestamp(raw);
            if record.timestamp.is_none() && !raw.is_empty() {
                report.dates_unparsed += 1;
            }
        }

        records.push(record);
    }

    if report.rows_dropped > 0 {
        warn!("{}", report.summary());
    }

    Ok(NormalizedBatch { records, report })
}

/// Plain decimal parse; anything else (currency symbols, NaN, inf) is rejected
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Coerce a timestamp string; None when no known format matches.
///
/// RFC 3339 values are converted to their naive UTC time. Bare dates map
/// to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Amt,Account,Kind,Shop,When
100.50,ACC-1,purchase,Grocer,2024-01-01 10:00:00
abc,ACC-1,purchase,Grocer,2024-01-01 11:00:00
,,,,
200,,,, 01/06/2024
 300 ,ACC-2,refund,Casino,not a date
";

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            amount: "Amt".to_string(),
            account_id: "Account".to_string(),
            transaction_type: "Kind".to_string(),
            merchant: Some("Shop".to_string()),
            date: Some("When".to_string()),
        }
    }

    #[test]
    fn test_cleaning_rules() {
        let batch = normalize_reader(SAMPLE.as_bytes(), &mapping()).unwrap();

        assert_eq!(batch.report.rows_read, 5);
        assert_eq!(batch.report.rows_dropped, 2);
        assert_eq!(batch.report.dates_unparsed, 1);
        assert_eq!(batch.records.len(), 3);

        let first = &batch.records[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.amount, 100.5);
        assert_eq!(first.account_id, "ACC-1");
        assert_eq!(first.merchant, "Grocer");
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
        );

        let defaulted = &batch.records[1];
        assert_eq!(defaulted.id, 1);
        assert_eq!(defaulted.account_id, UNKNOWN);
        assert_eq!(defaulted.transaction_type, UNKNOWN);
        assert_eq!(defaulted.merchant, UNKNOWN);
        assert_eq!(
            defaulted.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 6)
                .unwrap()
                .and_hms_opt(0, 0, 0)
        );

        let third = &batch.records[2];
        assert_eq!(third.amount, 300.0);
        assert_eq!(third.timestamp, None);

        println!("✅ Normalizer test passed: {}", batch.report.summary());
    }

    #[test]
    fn test_unmapped_optional_columns() {
        let csv = "amount,account_id,type\n10,A,debit\n";
        let batch = normalize_reader(csv.as_bytes(), &ColumnMapping::default()).unwrap();

        assert_eq!(batch.records[0].merchant, UNKNOWN);
        assert_eq!(batch.records[0].timestamp, None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "value,account_id,type\n10,A,debit\n";
        let err = normalize_reader(csv.as_bytes(), &ColumnMapping::default()).unwrap_err();

        match err.downcast_ref::<NormalizeError>() {
            Some(NormalizeError::MissingColumn { field, column }) => {
                assert_eq!(*field, "amount");
                assert_eq!(column, "amount");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_optional_column_is_error() {
        let csv = "amount,account_id,type\n10,A,debit\n";
        let mapping = ColumnMapping::default().with_date("posted_at");

        assert!(normalize_reader(csv.as_bytes(), &mapping).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("42"), Some(42.0));
        assert_eq!(parse_amount(" -7.25 "), Some(-7.25));
        assert_eq!(parse_amount("$5"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 3)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2024-02-03 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-02-03T14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-02-03 14:30"), Some(expected));
        assert_eq!(parse_timestamp("02/03/2024 14:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-02-03T15:30:00+01:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-02-03"),
            NaiveDate::from_ymd_opt(2024, 2, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv(Path::new("/nonexistent/tx.csv"), &ColumnMapping::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }
}
