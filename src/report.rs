// 📋 Reporting - breakdown tables and flagged-transaction export
// Pure functions over an Evaluation; the only I/O is the CSV writer.

use crate::engine::Evaluation;
use crate::record::TransactionRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub const TOP_N: usize = 10;
pub const HISTOGRAM_BINS: usize = 50;

// ============================================================================
// BREAKDOWNS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountByKey {
    pub key: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountMerchant {
    pub account_id: String,
    pub merchant: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Total amount per transaction type, largest first
pub fn amount_by_type(records: &[TransactionRecord]) -> Vec<AmountByKey> {
    let mut totals = sum_by(records, |r| r.transaction_type.clone());
    sort_desc(&mut totals);
    totals
}

/// Merchants with the largest total amount
pub fn top_merchants(records: &[TransactionRecord], n: usize) -> Vec<AmountByKey> {
    let mut totals = sum_by(records, |r| r.merchant.clone());
    sort_desc(&mut totals);
    totals.truncate(n);
    totals
}

/// Highest-spending merchant of each account, top `n` accounts by that amount
pub fn top_merchant_per_account(records: &[TransactionRecord], n: usize) -> Vec<AccountMerchant> {
    let mut picks = pick_per_account(records, |candidate, best| candidate > best);
    picks.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.account_id.cmp(&b.account_id)));
    picks.truncate(n);
    picks
}

/// Lowest-spending merchant of each account, bottom `n` accounts by that amount
pub fn lowest_merchant_per_account(records: &[TransactionRecord], n: usize) -> Vec<AccountMerchant> {
    let mut picks = pick_per_account(records, |candidate, best| candidate < best);
    picks.sort_by(|a, b| a.total.total_cmp(&b.total).then_with(|| a.account_id.cmp(&b.account_id)));
    picks.truncate(n);
    picks
}

/// Equal-width bins over [min, max]. The max value lands in the last bin.
pub fn amount_histogram(records: &[TransactionRecord], bins: usize) -> Vec<HistogramBin> {
    if records.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = records.iter().map(|r| r.amount).fold(f64::INFINITY, f64::min);
    let max = records.iter().map(|r| r.amount).fold(f64::NEG_INFINITY, f64::max);

    // All amounts equal: one bin holding everything
    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: records.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for record in records {
        let idx = (((record.amount - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

fn sum_by<F>(records: &[TransactionRecord], key: F) -> Vec<AmountByKey>
where
    F: Fn(&TransactionRecord) -> String,
{
    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in records {
        *totals.entry(key(record)).or_insert(0.0) += record.amount;
    }

    totals
        .into_iter()
        .map(|(key, total)| AmountByKey { key, total })
        .collect()
}

fn sort_desc(rows: &mut [AmountByKey]) {
    rows.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
}

/// Sum per (account, merchant), then keep one merchant per account chosen by `better`.
/// Ties keep the alphabetically first merchant.
fn pick_per_account<F>(records: &[TransactionRecord], better: F) -> Vec<AccountMerchant>
where
    F: Fn(f64, f64) -> bool,
{
    let mut pairs: HashMap<(String, String), f64> = HashMap::new();
    for record in records {
        *pairs
            .entry((record.account_id.clone(), record.merchant.clone()))
            .or_insert(0.0) += record.amount;
    }

    let mut sorted: Vec<((String, String), f64)> = pairs.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut best: HashMap<String, AccountMerchant> = HashMap::new();
    for ((account_id, merchant), total) in sorted {
        match best.get_mut(&account_id) {
            Some(current) if better(total, current.total) => {
                current.merchant = merchant;
                current.total = total;
            }
            Some(_) => {}
            None => {
                best.insert(
                    account_id.clone(),
                    AccountMerchant {
                        account_id,
                        merchant,
                        total,
                    },
                );
            }
        }
    }

    best.into_values().collect()
}

// ============================================================================
// FULL REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Breakdown {
    pub by_type: Vec<AmountByKey>,
    pub top_merchants: Vec<AmountByKey>,
    pub top_merchant_per_account: Vec<AccountMerchant>,
    pub lowest_merchant_per_account: Vec<AccountMerchant>,
    pub histogram: Vec<HistogramBin>,
}

impl Breakdown {
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        let records = &evaluation.records;
        Breakdown {
            by_type: amount_by_type(records),
            top_merchants: top_merchants(records, TOP_N),
            top_merchant_per_account: top_merchant_per_account(records, TOP_N),
            lowest_merchant_per_account: lowest_merchant_per_account(records, TOP_N),
            histogram: amount_histogram(records, HISTOGRAM_BINS),
        }
    }
}

// ============================================================================
// EXPORT
// ============================================================================

/// One exported row: canonical columns plus the `flagged` decision
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: usize,
    amount: f64,
    account_id: &'a str,
    #[serde(rename = "type")]
    transaction_type: &'a str,
    merchant: &'a str,
    date: String,
    flagged: bool,
    flag_reasons: String,
}

/// Write rows in input order. `only_flagged` keeps just the flagged ones.
pub fn write_csv<W: Write>(writer: W, evaluation: &Evaluation, only_flagged: bool) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut written = 0;

    for record in &evaluation.records {
        let flagged = evaluation.is_flagged(record.id);
        if only_flagged && !flagged {
            continue;
        }

        let reasons: Vec<&str> = evaluation
            .reasons(record.id)
            .iter()
            .map(|kind| kind.code())
            .collect();

        wtr.serialize(ExportRow {
            id: record.id,
            amount: record.amount,
            account_id: &record.account_id,
            transaction_type: &record.transaction_type,
            merchant: &record.merchant,
            date: record
                .timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            flagged,
            flag_reasons: reasons.join(";"),
        })
        .context("Failed to write export row")?;
        written += 1;
    }

    wtr.flush().context("Failed to flush CSV export")?;
    Ok(written)
}

/// Export to a file; returns the number of data rows written
pub fn export_csv(path: &Path, evaluation: &Evaluation, only_flagged: bool) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_csv(file, evaluation, only_flagged)
}

// ============================================================================
// TESTS
// ============================================================================
