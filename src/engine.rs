// 🧮 Flagging Engine - one pure evaluation per (records, configuration)
//
// Pipeline:
//   date filter → every active detector on the filtered set → OR-merge → metrics
//
// Nothing is cached between evaluations; callers re-run on any config change.

use crate::aggregation::{combine, reasons_for, FlagMap};
use crate::config::DetectionConfig;
use crate::detectors::{detector_set, Detector, DetectorKind, FlagSet};
use crate::filter::apply_date_range;
use crate::metrics::SummaryMetrics;
use crate::record::{RecordId, TransactionRecord};
use std::collections::BTreeMap;
use tracing::{debug, info};

// ============================================================================
// EVALUATION RESULT
// ============================================================================

#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Records that survived the date filter, in input order
    pub records: Vec<TransactionRecord>,

    /// Final OR-combined decision, one entry per surviving record
    pub flags: FlagMap,

    /// Ids hit by each active detector
    pub hits: BTreeMap<DetectorKind, FlagSet>,

    /// Detectors that ran, in evaluation order
    pub active_detectors: Vec<DetectorKind>,

    /// Whether the date filter narrowed the batch
    pub date_filter_applied: bool,

    pub metrics: SummaryMetrics,
}

impl Evaluation {
    pub fn is_flagged(&self, id: RecordId) -> bool {
        self.flags.get(&id).copied().unwrap_or(false)
    }

    /// Flagged records, in input order
    pub fn flagged_records(&self) -> Vec<&TransactionRecord> {
        self.records.iter().filter(|r| self.is_flagged(r.id)).collect()
    }

    /// Detectors that flagged this record
    pub fn reasons(&self, id: RecordId) -> Vec<DetectorKind> {
        reasons_for(id, &self.hits)
    }

    /// Flag decisions in record order, for tabular output
    pub fn flag_column(&self) -> Vec<bool> {
        self.records.iter().map(|r| self.is_flagged(r.id)).collect()
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Runs the detector set for one configuration.
///
/// ```
/// use transaction_flagger::{DetectionConfig, FlaggingEngine, TransactionRecord};
///
/// let records = vec![
///     TransactionRecord::new(0, 500.0, "ACC-1", "purchase"),
///     TransactionRecord::new(1, 1500.0, "ACC-2", "purchase"),
///     TransactionRecord::new(2, 999.0, "ACC-3", "purchase"),
/// ];
///
/// let engine = FlaggingEngine::new(DetectionConfig::new().with_amount_threshold(1000.0));
/// let evaluation = engine.evaluate(&records);
///
/// assert_eq!(evaluation.flag_column(), vec![false, true, false]);
/// ```
pub struct FlaggingEngine {
    config: DetectionConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl FlaggingEngine {
    pub fn new(config: DetectionConfig) -> Self {
        let detectors = detector_set(&config);
        FlaggingEngine { config, detectors }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Filter, detect, merge and summarise. Never fails, including on empty input.
    pub fn evaluate(&self, records: &[TransactionRecord]) -> Evaluation {
        let filtered = apply_date_range(records, &self.config.date_range);
        let batch = filtered.records;

        let mut hits = BTreeMap::new();
        let mut active_detectors = Vec::new();

        for detector in &self.detectors {
            if !detector.is_active(&batch) {
                debug!("{} detector inactive", detector.kind().name());
                continue;
            }

            let flagged = detector.detect(&batch);
            debug!(
                "{} detector flagged {} of {} records",
                detector.kind().name(),
                flagged.len(),
                batch.len()
            );

            active_detectors.push(detector.kind());
            hits.insert(detector.kind(), flagged);
        }

        let flags = combine(&batch, &hits);
        let metrics = SummaryMetrics::compute(&batch, &flags);

        info!("Evaluation complete: {}", metrics.summary());

        Evaluation {
            records: batch,
            flags,
            hits,
            active_detectors,
            date_filter_applied: filtered.applied,
            metrics,
        }
    }
}

/// One-shot evaluation without keeping an engine around
pub fn evaluate(records: &[TransactionRecord], config: &DetectionConfig) -> Evaluation {
    FlaggingEngine::new(config.clone()).evaluate(records)
}

// ============================================================================
// TESTS
// ============================================================================
