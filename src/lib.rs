// Transaction Flagger - Core Library
// Rule-based suspicious-activity flagging over one in-memory batch

pub mod record;
pub mod normalizer;   // Input collaborator: column mapping + cleaning
pub mod config;
pub mod filter;
pub mod aggregates;
pub mod detectors;
pub mod aggregation;
pub mod metrics;
pub mod engine;
pub mod report;       // Output collaborator: breakdowns + CSV export

// Re-export commonly used types
pub use record::{has_timestamps, RecordId, TransactionRecord, UNKNOWN};
pub use normalizer::{
    load_csv, normalize_reader, parse_amount, parse_timestamp,
    CleaningReport, ColumnMapping, NormalizeError, NormalizedBatch,
};
pub use config::{DateRange, DetectionConfig, RAPID_WINDOW_SECONDS};
pub use filter::{apply_date_range, FilterOutcome};
pub use aggregates::{group_by_account, AccountAggregate};
pub use detectors::{
    detector_set, Detector, DetectorKind, FlagSet,
    HighValueDetector, RapidSuccessionDetector, RiskyMerchantDetector,
    StatisticalOutlierDetector, WeekendDetector,
};
pub use aggregation::{combine, FlagMap};
pub use metrics::{format_amount, SummaryMetrics};
pub use engine::{evaluate, Evaluation, FlaggingEngine};
pub use report::{export_csv, write_csv, Breakdown};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
