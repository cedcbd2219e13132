//! Insights CLI - Command-line interface for Growth Insights
//!
//! Commands:
//! - report: Build an insights report from a baby.snapshot.v1 document
//! - series: Print per-day feed and diaper totals
//! - age: Print the age breakdown for a birth date
//! - score: Score one metric against the reference curve
//! - doctor: Diagnose configuration and reference curve files

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use growth_insights::aggregate::{local_date, EventAggregator};
use growth_insights::pipeline::{process_snapshot, SharedCurve};
use growth_insights::reference::{ReferenceCurveProvider, SimplifiedCurve, TabulatedCurve};
use growth_insights::schema::{RowAdapter, SCHEMA_VERSION};
use growth_insights::types::{DailyAggregate, MetricScore, MetricType};
use growth_insights::{
    compute_age, InsightsConfig, InsightsEngine, InsightsError, PercentileScorer, ENGINE_VERSION,
    PRODUCER_NAME,
};

/// Growth Insights - On-device growth insights for infant care trackers
#[derive(Parser)]
#[command(name = "insights")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Compute age, feed, diaper and growth insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an insights report from a snapshot document
    Report {
        /// Snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Caller's time zone (IANA format, e.g., "Europe/London")
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Engine settings file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Tabulated reference curve file (JSON)
        #[arg(long)]
        curve: Option<PathBuf>,

        /// Override the daily feed target (mL)
        #[arg(long)]
        daily_target: Option<f64>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print per-day feed and diaper totals ending today
    Series {
        /// Snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Number of days to include
        #[arg(long, default_value = "7")]
        days: u32,

        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Caller's time zone (IANA format)
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print the age breakdown for a birth date
    Age {
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: String,

        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,
    },

    /// Score one metric against the reference curve
    Score {
        /// Metric to score
        #[arg(value_enum)]
        metric: MetricArg,

        /// Measured value (kg, cm or kg/m²)
        #[arg(allow_negative_numbers = true)]
        value: f64,

        /// Age in whole months
        #[arg(long, default_value = "0")]
        age_months: u32,

        /// Tabulated reference curve file (JSON)
        #[arg(long)]
        curve: Option<PathBuf>,
    },

    /// Diagnose configuration and reference curve files
    Doctor {
        /// Check an engine settings file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a tabulated reference curve file
        #[arg(long)]
        curve: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Weight,
    Height,
    Bmi,
}

impl From<MetricArg> for MetricType {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Weight => MetricType::Weight,
            MetricArg::Height => MetricType::Height,
            MetricArg::Bmi => MetricType::Bmi,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by RUST_LOG (default: warn)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), InsightsCliError> {
    match cli.command {
        Commands::Report {
            input,
            now,
            timezone,
            config,
            curve,
            daily_target,
            output_format,
        } => cmd_report(
            &input,
            now.as_deref(),
            &timezone,
            config.as_deref(),
            curve.as_deref(),
            daily_target,
            &output_format,
        ),

        Commands::Series {
            input,
            days,
            now,
            timezone,
            output_format,
        } => cmd_series(&input, days, now.as_deref(), &timezone, &output_format),

        Commands::Age { birth_date, now } => cmd_age(&birth_date, now.as_deref()),

        Commands::Score {
            metric,
            value,
            age_months,
            curve,
        } => cmd_score(metric.into(), value, age_months, curve.as_deref()),

        Commands::Doctor { config, curve, json } => {
            cmd_doctor(config.as_deref(), curve.as_deref(), json)
        }
    }
}

fn cmd_report(
    input: &Path,
    now: Option<&str>,
    timezone: &str,
    config: Option<&Path>,
    curve: Option<&Path>,
    daily_target: Option<f64>,
    output_format: &OutputFormat,
) -> Result<(), InsightsCliError> {
    let now = parse_now(now)?;
    let tz = parse_timezone(timezone)?;

    // Settings: file first, then flag overrides
    let mut settings = match config {
        Some(path) => InsightsConfig::from_json(&fs::read_to_string(path)?)?,
        None => InsightsConfig::default(),
    };
    if let Some(target) = daily_target {
        settings.daily_feed_target_ml = target;
    }

    let engine = InsightsEngine::with_provider(load_curve(curve)?, settings)?;

    let snapshot = RowAdapter::parse_snapshot(&read_input(input)?)?;
    let report = process_snapshot(&engine, &snapshot, now, &tz)?;

    println!("{}", format_output(&report, output_format)?);
    Ok(())
}

fn cmd_series(
    input: &Path,
    days: u32,
    now: Option<&str>,
    timezone: &str,
    output_format: &OutputFormat,
) -> Result<(), InsightsCliError> {
    if days == 0 {
        return Err(InsightsCliError::InvalidArgument(
            "--days must be at least 1".to_string(),
        ));
    }

    let now = parse_now(now)?;
    let tz = parse_timezone(timezone)?;
    let snapshot = RowAdapter::parse_snapshot(&read_input(input)?)?;

    let feeds = RowAdapter::feed_events(&snapshot.feeds);
    let diapers = RowAdapter::diaper_events(&snapshot.diapers);
    let today = local_date(now, &tz);

    let series = DailySeries {
        baby_id: snapshot.baby.id.to_string(),
        timezone: timezone.to_string(),
        feeds: EventAggregator::daily_series(&feeds, today, days, &tz),
        diapers: EventAggregator::daily_series(&diapers, today, days, &tz),
    };

    println!("{}", format_output(&series, output_format)?);
    Ok(())
}

fn cmd_age(birth_date: &str, now: Option<&str>) -> Result<(), InsightsCliError> {
    let birth = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").map_err(|e| {
        InsightsError::DateParseError(format!("birth date '{}': {}", birth_date, e))
    })?;
    let age = compute_age(birth, parse_now(now)?);

    let output = serde_json::json!({
        "age": age,
        "dashboard_age": age.dashboard_display(),
        "header_age": age.header_display(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_score(
    metric: MetricType,
    value: f64,
    age_months: u32,
    curve: Option<&Path>,
) -> Result<(), InsightsCliError> {
    let scorer = PercentileScorer::new(load_curve(curve)?);
    let score = MetricScore {
        metric,
        value,
        percentile: scorer.score(metric, value, age_months)?,
    };

    println!("{}", serde_json::to_string_pretty(&score)?);
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    curve: Option<&Path>,
    json: bool,
) -> Result<(), InsightsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Growth Insights version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    if let Some(path) = config {
        checks.push(check_file("config", path, |content| {
            let settings = InsightsConfig::from_json(content)?;
            Ok(format!(
                "Config valid (daily target {} mL, sensitivity {})",
                settings.daily_feed_target_ml, settings.sensitivity
            ))
        }));
    }

    if let Some(path) = curve {
        checks.push(check_file("curve", path, |content| {
            let table = TabulatedCurve::from_json(content)?;
            Ok(format!(
                "Curve '{}' valid ({} weight, {} height, {} BMI points)",
                table.name(),
                table.points(MetricType::Weight).len(),
                table.points(MetricType::Height).len(),
                table.points(MetricType::Bmi).len()
            ))
        }));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Insights Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(InsightsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn check_file(
    name: &str,
    path: &Path,
    inspect: impl FnOnce(&str) -> Result<String, InsightsError>,
) -> DoctorCheck {
    let (status, message) = if !path.exists() {
        (CheckStatus::Warning, format!("{} does not exist", path.display()))
    } else {
        match fs::read_to_string(path) {
            Ok(content) => match inspect(&content) {
                Ok(message) => (CheckStatus::Ok, message),
                Err(e) => (CheckStatus::Error, e.to_string()),
            },
            Err(e) => (CheckStatus::Error, format!("Cannot read {}: {}", path.display(), e)),
        }
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

fn read_input(input: &Path) -> Result<String, InsightsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_curve(curve: Option<&Path>) -> Result<SharedCurve, InsightsCliError> {
    match curve {
        Some(path) => {
            let table = TabulatedCurve::from_json(&fs::read_to_string(path)?)?;
            tracing::debug!(curve = table.name(), "loaded reference curve");
            Ok(Box::new(table))
        }
        None => Ok(Box::new(SimplifiedCurve)),
    }
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>, InsightsCliError> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|instant| instant.with_timezone(&Utc))
            .map_err(|e| {
                let message = format!("now '{}': {}", raw, e);
                InsightsCliError::from(InsightsError::DateParseError(message))
            }),
        None => Ok(Utc::now()),
    }
}

fn parse_timezone(timezone: &str) -> Result<Tz, InsightsCliError> {
    timezone.parse::<Tz>().map_err(|_| {
        InsightsCliError::from(InsightsError::InvalidTimezone(format!(
            "unknown IANA time zone '{}'",
            timezone
        )))
    })
}

fn format_output<T: Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, InsightsCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum InsightsCliError {
    Io(io::Error),
    Insights(InsightsError),
    Json(serde_json::Error),
    InvalidArgument(String),
    DoctorFailed,
}

impl From<io::Error> for InsightsCliError {
    fn from(e: io::Error) -> Self {
        InsightsCliError::Io(e)
    }
}

impl From<InsightsError> for InsightsCliError {
    fn from(e: InsightsError) -> Self {
        InsightsCliError::Insights(e)
    }
}

impl From<serde_json::Error> for InsightsCliError {
    fn from(e: serde_json::Error) -> Self {
        InsightsCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<InsightsCliError> for CliError {
    fn from(e: InsightsCliError) -> Self {
        match e {
            InsightsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            InsightsCliError::Insights(e) => {
                let (code, hint) = match &e {
                    InsightsError::ParseError(_) => (
                        "PARSE_ERROR",
                        format!("Ensure input matches the {} schema", SCHEMA_VERSION),
                    ),
                    InsightsError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax".to_string()),
                    InsightsError::InvalidConfig(_) => (
                        "CONFIG_ERROR",
                        "Run 'insights doctor --config <file>' for details".to_string(),
                    ),
                    InsightsError::InvalidReferenceCurve(_) => (
                        "CURVE_ERROR",
                        "Run 'insights doctor --curve <file>' for details".to_string(),
                    ),
                    InsightsError::InvalidMetricInput(_) => (
                        "METRIC_ERROR",
                        "Values must be finite numbers".to_string(),
                    ),
                    InsightsError::InvalidTimezone(_) => (
                        "TIMEZONE_ERROR",
                        "Use an IANA name such as 'America/New_York'".to_string(),
                    ),
                    InsightsError::DateParseError(_) => (
                        "DATE_ERROR",
                        "Use YYYY-MM-DD for dates and RFC 3339 for instants".to_string(),
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint),
                }
            }
            InsightsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            InsightsCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Run with --help for usage".to_string()),
            },
            InsightsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DailySeries {
    baby_id: String,
    timezone: String,
    feeds: Vec<DailyAggregate>,
    diapers: Vec<DailyAggregate>,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
