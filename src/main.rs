// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

mod cli;

use anyhow::{Context, Result};
use cli::{Args, Command, InputArgs, OutputFormat};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, error, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use transaction_flagger::report::Breakdown;
use transaction_flagger::{
    export_csv, format_amount, load_csv, parse_timestamp, ColumnMapping, DateRange,
    DetectionConfig, Evaluation, FlaggingEngine, NormalizedBatch,
};

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    let result = match args.command {
        Command::Scan {
            input,
            output,
            all_rows,
            format,
        } => run_scan(&input, output.as_deref(), all_rows, format),
        Command::View { input } => run_view(&input),
        Command::InitConfig { path } => run_init_config(&path),
    };

    if let Err(e) = result {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize logging. RUST_LOG takes precedence over -v / -q.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

// ============================================================================
// INPUT
// ============================================================================

fn column_mapping(input: &InputArgs) -> ColumnMapping {
    ColumnMapping {
        amount: input.amount_col.clone(),
        account_id: input.account_col.clone(),
        transaction_type: input.type_col.clone(),
        merchant: input.merchant_col.clone(),
        date: input.date_col.clone(),
    }
}

/// Config file (or defaults) with CLI flags layered on top
fn build_config(input: &InputArgs) -> Result<DetectionConfig> {
    let mut config = match &input.config {
        Some(path) => DetectionConfig::from_file(path)?,
        None => DetectionConfig::default(),
    };

    if let Some(threshold) = input.amount_threshold {
        config.amount_threshold = threshold;
    }
    if let Some(threshold) = input.rapid_threshold {
        config.rapid_count_threshold = threshold;
    }
    config
        .risky_merchants
        .extend(input.risky_merchants.iter().cloned());

    if input.start.is_some() || input.end.is_some() {
        config.date_range = DateRange {
            start: parse_bound("--start", input.start.as_deref()),
            end: parse_bound("--end", input.end.as_deref()),
        };
    }

    Ok(config)
}

/// Unparseable bounds leave the window open, which disables the filter
fn parse_bound(flag: &str, raw: Option<&str>) -> Option<chrono::NaiveDateTime> {
    let raw = raw?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!("Ignoring {} {:?}: not a recognised date", flag, raw);
    }
    parsed
}

/// Load, clean and evaluate. Progress lines go to `progress`.
fn load_and_evaluate(
    input: &InputArgs,
    progress: &mut dyn Write,
) -> Result<(NormalizedBatch, Evaluation)> {
    let config = build_config(input)?;

    writeln!(progress, "📂 Loading {}...", input.file.display())?;
    let batch = load_csv(&input.file, &column_mapping(input))?;
    writeln!(progress, "✓ {}", batch.report.summary())?;

    let engine = FlaggingEngine::new(config);
    let evaluation = engine.evaluate(&batch.records);

    if evaluation.date_filter_applied {
        let range = &engine.config().date_range;
        if let (Some(start), Some(end)) = (range.start, range.end) {
            writeln!(progress, "✓ Filter applied: {} to {}", start, end)?;
        }
    }

    Ok((batch, evaluation))
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_scan(
    input: &InputArgs,
    output: Option<&Path>,
    all_rows: bool,
    format: OutputFormat,
) -> Result<()> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    scan(
        input,
        output,
        all_rows,
        format,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
}

/// Summary goes to `out`. In JSON mode progress lines go to `err` so `out` stays parseable.
fn scan(
    input: &InputArgs,
    output: Option<&Path>,
    all_rows: bool,
    format: OutputFormat,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    let progress: &mut dyn Write = match format {
        OutputFormat::Text => &mut *out,
        OutputFormat::Json => &mut *err,
    };
    let (_, evaluation) = load_and_evaluate(input, progress)?;

    match format {
        OutputFormat::Text => write_text_summary(out, &evaluation)?,
        OutputFormat::Json => {
            let payload = json_summary(&evaluation);
            writeln!(
                out,
                "{}",
                serde_json::to_string_pretty(&payload).context("Failed to serialize summary")?
            )?;
        }
    }

    if let Some(path) = output {
        let written = export_csv(path, &evaluation, !all_rows)?;
        let progress: &mut dyn Write = match format {
            OutputFormat::Text => out,
            OutputFormat::Json => err,
        };
        writeln!(
            progress,
            "\n💾 Exported {} row(s) to {}",
            written,
            path.display()
        )?;
    }

    Ok(())
}

fn json_summary(evaluation: &Evaluation) -> serde_json::Value {
    serde_json::json!({
        "metrics": evaluation.metrics,
        "active_detectors": evaluation.active_detectors,
        "flagged_ids": evaluation.flagged_records().iter().map(|r| r.id).collect::<Vec<_>>(),
        "breakdown": Breakdown::from_evaluation(evaluation),
    })
}

fn write_text_summary(out: &mut dyn Write, evaluation: &Evaluation) -> io::Result<()> {
    let metrics = &evaluation.metrics;

    writeln!(out, "\n📊 Summary Metrics")?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(out, "Total Transactions: {}", metrics.total_count)?;
    writeln!(out, "Average Amount:     {}", format_amount(metrics.mean_amount))?;
    writeln!(out, "Max Amount:         {}", format_amount(metrics.max_amount))?;
    writeln!(out, "Min Amount:         {}", format_amount(metrics.min_amount))?;

    writeln!(out, "\n🚩 Fraud Detection")?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    for kind in &evaluation.active_detectors {
        let count = evaluation.hits.get(kind).map(|ids| ids.len()).unwrap_or(0);
        writeln!(out, "  {:<18} {}", kind.name(), count)?;
    }
    writeln!(
        out,
        "Flagged Transactions: {} ({:.1}%)",
        metrics.flagged_count, metrics.flagged_percentage
    )?;

    let flagged = evaluation.flagged_records();
    if !flagged.is_empty() {
        writeln!(out, "\n### Flagged Transaction Details")?;
        for record in flagged {
            let reasons: Vec<&str> = evaluation
                .reasons(record.id)
                .iter()
                .map(|kind| kind.code())
                .collect();
            writeln!(
                out,
                "  #{:<5} {:<14} {:>12.2}  {:<20} {}  [{}]",
                record.id,
                record.account_id,
                record.amount,
                record.merchant,
                record
                    .timestamp
                    .map(|ts| ts.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                reasons.join(", ")
            )?;
        }
    }

    Ok(())
}

fn run_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", path.display());
        std::process::exit(1);
    }

    let content = DetectionConfig::default().to_json_pretty()?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Created {} with default settings.", path.display());
    println!("   Every threshold is 0 (disabled); edit it to enable detectors.");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_view(input: &InputArgs) -> Result<()> {
    let (batch, evaluation) = load_and_evaluate(input, &mut io::stdout())?;

    println!("Starting UI... (Press 'q' to quit)\n");
    let mut app = ui::App::new(evaluation, batch.report);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_view(_input: &InputArgs) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: transaction-flagger scan <CSV>");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn scan_input(extra: &[&str]) -> InputArgs {
        let mut argv = vec!["transaction-flagger", "scan", "tx.csv"];
        argv.extend_from_slice(extra);
        match Args::try_parse_from(argv).unwrap().command {
            Command::Scan { input, .. } => input,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cli_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_file(
            dir.path(),
            "flagger.json",
            r#"{ "amount_threshold": 500, "rapid_count_threshold": 2, "risky_merchants": ["Casino"] }"#,
        );
        let config_arg = config_path.to_string_lossy().to_string();

        let input = scan_input(&[
            "--config",
            &config_arg,
            "--amount-threshold",
            "1000",
            "--risky-merchant",
            "Crypto",
        ]);
        let config = build_config(&input).unwrap();

        assert_eq!(config.amount_threshold, 1000.0);
        // Not given on the command line: file value kept
        assert_eq!(config.rapid_count_threshold, 2);
        assert!(config.risky_merchants.contains("Casino"));
        assert!(config.risky_merchants.contains("Crypto"));
        assert_eq!(config.risky_merchants.len(), 2);

        println!("✅ Config layering test passed");
    }

    #[test]
    fn test_rapid_threshold_override() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_file(dir.path(), "flagger.json", r#"{ "rapid_count_threshold": 2 }"#);
        let config_arg = config_path.to_string_lossy().to_string();

        let input = scan_input(&["--config", &config_arg, "--rapid-threshold", "5"]);
        let config = build_config(&input).unwrap();

        assert_eq!(config.rapid_count_threshold, 5);
        assert_eq!(config.amount_threshold, 0.0);
    }

    #[test]
    fn test_unparseable_bound_disables_filter() {
        let input = scan_input(&["--start", "garbage", "--end", "2024-01-31"]);
        let config = build_config(&input).unwrap();

        assert_eq!(config.date_range.start, None);
        assert!(config.date_range.end.is_some());
        assert_eq!(config.date_range.bounds(), None);
    }

    #[test]
    fn test_valid_bounds_from_flags() {
        let input = scan_input(&["--start", "2024-01-01", "--end", "2024-01-31"]);
        let config = build_config(&input).unwrap();

        let (start, end) = config.date_range.bounds().unwrap();
        assert_eq!(start.to_string(), "2024-01-01 00:00:00");
        assert_eq!(end.to_string(), "2024-01-31 00:00:00");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let input = scan_input(&["--config", "/nonexistent/flagger.json"]);
        assert!(build_config(&input).is_err());
    }

    #[test]
    fn test_json_scan_keeps_stdout_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_file(
            dir.path(),
            "tx.csv",
            "amount,account_id,type\n500,A,purchase\n1500,B,purchase\n999,C,purchase\n",
        );
        let export_path = dir.path().join("flagged.csv");

        let argv = [
            "transaction-flagger".to_string(),
            "scan".to_string(),
            csv_path.to_string_lossy().to_string(),
            "--format".to_string(),
            "json".to_string(),
            "--amount-threshold".to_string(),
            "1000".to_string(),
            "-o".to_string(),
            export_path.to_string_lossy().to_string(),
        ];
        let Command::Scan { input, output, all_rows, format } =
            Args::try_parse_from(argv).unwrap().command
        else {
            panic!("expected scan");
        };

        let mut out = Vec::new();
        let mut err = Vec::new();
        scan(&input, output.as_deref(), all_rows, format, &mut out, &mut err).unwrap();

        let stdout = String::from_utf8(out).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(payload["metrics"]["total_count"], 3);
        assert_eq!(payload["flagged_ids"], serde_json::json!([1]));

        let stderr = String::from_utf8(err).unwrap();
        assert!(stderr.contains("Loading"));
        assert!(stderr.contains("Exported 1 row(s)"));
        assert!(export_path.exists());

        println!("✅ JSON scan output test passed");
    }

    #[test]
    fn test_text_scan_writes_progress_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_file(dir.path(), "tx.csv", "amount,account_id,type\n10,A,purchase\n");
        let input = scan_input(&[]);
        let input = InputArgs {
            file: csv_path,
            ..input
        };

        let mut out = Vec::new();
        let mut err = Vec::new();
        scan(&input, None, false, OutputFormat::Text, &mut out, &mut err).unwrap();

        let stdout = String::from_utf8(out).unwrap();
        assert!(stdout.contains("Loading"));
        assert!(stdout.contains("Total Transactions: 1"));
        assert!(err.is_empty());
    }
}
