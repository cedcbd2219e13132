//! Growth Insights - On-device insights engine for infant care trackers
//!
//! The engine turns already-loaded baby records into derived values through a
//! deterministic pipeline: row adaptation → age breakdown → day-window
//! aggregation → percentile scoring → report assembly.
//!
//! ## Modules
//!
//! - **Age**: days, weeks and months since birth
//! - **Aggregation**: feed and diaper totals per local day and over all time
//! - **Scoring**: weight, height and BMI percentiles against a reference curve
//! - **Insights**: the combined read model consumed by the presentation layer
//!
//! The current instant is always passed in; nothing here reads the clock.

pub mod age;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod insights;
pub mod percentile;
pub mod pipeline;
pub mod reference;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use age::{compute_age, compute_age_between};
pub use aggregate::EventAggregator;
pub use config::InsightsConfig;
pub use error::InsightsError;
pub use insights::{BabyEvents, InsightsEngine};
pub use percentile::PercentileScorer;
pub use pipeline::{snapshot_to_insights, InsightsProcessor};
pub use reference::{ReferenceCurveProvider, SimplifiedCurve, TabulatedCurve};

// Schema exports
pub use schema::{BabySnapshot, RowAdapter, SCHEMA_VERSION};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "growth-insights";
