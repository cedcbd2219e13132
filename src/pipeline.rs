//! Pipeline orchestration
//!
//! This module provides the JSON-level API used by the CLI and FFI surfaces.
//! It takes a baby.snapshot.v1 document through the full engine and returns the
//! insights report as JSON.

use crate::config::InsightsConfig;
use crate::error::InsightsError;
use crate::insights::{BabyEvents, InsightsEngine};
use crate::reference::{ReferenceCurveProvider, SimplifiedCurve, TabulatedCurve};
use crate::schema::{BabySnapshot, RowAdapter};
use crate::types::InsightsReport;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// Reference curve shared across threads behind a trait object
pub type SharedCurve = Box<dyn ReferenceCurveProvider + Send + Sync>;

/// Convert a snapshot JSON document into an insights report JSON.
///
/// # Arguments
/// * `snapshot_json` - baby.snapshot.v1 document
/// * `now` - Reference instant for ages and "today"
/// * `utc_offset_minutes` - Caller's UTC offset, used for the local day window
///
/// # Example
/// ```ignore
/// let report_json = snapshot_to_insights(&snapshot_json, Utc::now(), -300)?;
/// ```
pub fn snapshot_to_insights(
    snapshot_json: &str,
    now: DateTime<Utc>,
    utc_offset_minutes: i32,
) -> Result<String, InsightsError> {
    InsightsProcessor::new().process_json(snapshot_json, now, utc_offset_minutes)
}

/// Run a parsed snapshot through an engine.
///
/// Pipeline stages:
/// 1. RowAdapter - Map rows onto event records and measurements
/// 2. RowAdapter - Pick the latest measurement
/// 3. InsightsEngine - Build the report
pub fn process_snapshot<P: ReferenceCurveProvider, Tz: TimeZone>(
    engine: &InsightsEngine<P>,
    snapshot: &BabySnapshot,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<InsightsReport, InsightsError> {
    // Stage 1: Rows to engine inputs
    let baby = RowAdapter::profile(&snapshot.baby);
    let feeds = RowAdapter::feed_events(&snapshot.feeds);
    let diapers = RowAdapter::diaper_events(&snapshot.diapers);
    let measurements = RowAdapter::measurements(&snapshot.measurements);

    // Stage 2: Latest measurement
    let latest = RowAdapter::latest_measurement(&measurements);

    // Stage 3: Report
    let events = BabyEvents {
        feeds: &feeds,
        diapers: &diapers,
        measurement_count: measurements.len(),
    };
    engine.build_insights(&baby, &events, latest, now, tz)
}

/// Fixed time zone for a UTC offset in minutes
pub fn fixed_offset(utc_offset_minutes: i32) -> Result<FixedOffset, InsightsError> {
    utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            InsightsError::InvalidTimezone(format!(
                "UTC offset of {} minutes is out of range",
                utc_offset_minutes
            ))
        })
}

/// Processor holding a configured engine.
///
/// Use this when the reference curve or settings differ from the defaults.
pub struct InsightsProcessor {
    engine: InsightsEngine<SharedCurve>,
}

impl Default for InsightsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightsProcessor {
    /// Processor with the simplified curve and default settings
    pub fn new() -> Self {
        let curve: SharedCurve = Box::new(SimplifiedCurve);
        Self {
            engine: InsightsEngine::with_default_config(curve),
        }
    }

    /// Processor with a custom curve and settings
    pub fn with_engine(curve: SharedCurve, config: InsightsConfig) -> Result<Self, InsightsError> {
        Ok(Self {
            engine: InsightsEngine::with_provider(curve, config)?,
        })
    }

    pub fn engine(&self) -> &InsightsEngine<SharedCurve> {
        &self.engine
    }

    /// Replace the settings, keeping the current curve
    pub fn load_config(&mut self, json: &str) -> Result<(), InsightsError> {
        let config = InsightsConfig::from_json(json)?;
        self.engine.set_config(config)
    }

    /// Replace the reference curve with a tabulated one
    pub fn load_curve(&mut self, json: &str) -> Result<(), InsightsError> {
        let curve: SharedCurve = Box::new(TabulatedCurve::from_json(json)?);
        self.engine = InsightsEngine::with_provider(curve, self.engine.config().clone())?;
        Ok(())
    }

    /// Process a snapshot document into a report
    pub fn process(
        &self,
        snapshot_json: &str,
        now: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<InsightsReport, InsightsError> {
        let tz = fixed_offset(utc_offset_minutes)?;
        let snapshot = RowAdapter::parse_snapshot(snapshot_json)?;
        process_snapshot(&self.engine, &snapshot, now, &tz)
    }

    /// Process a snapshot document into report JSON
    pub fn process_json(
        &self,
        snapshot_json: &str,
        now: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<String, InsightsError> {
        let report = self.process(snapshot_json, now, utc_offset_minutes)?;
        Ok(serde_json::to_string(&report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricType, StatusBand};

    fn sample_snapshot_json() -> &'static str {
        r#"{
            "schema_version": "baby.snapshot.v1",
            "baby": {
                "id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                "name": "Ada",
                "date_of_birth": "2024-01-01"
            },
            "feeds": [
                { "id": "00000000-0000-4000-8000-000000000001", "baby_id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                  "date_time": "2024-03-10T06:00:00Z", "quantity": 120, "feed_type": "Bottle", "fed_by": "Mum" },
                { "id": "00000000-0000-4000-8000-000000000002", "baby_id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                  "date_time": "2024-03-10T10:00:00Z", "quantity": 180, "feed_type": "Formula", "fed_by": "Dad" },
                { "id": "00000000-0000-4000-8000-000000000003", "baby_id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                  "date_time": "2024-03-09T10:00:00Z", "quantity": 150, "feed_type": "Breast", "fed_by": "Mum" }
            ],
            "diapers": [
                { "id": "00000000-0000-4000-8000-000000000004", "baby_id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                  "date_time": "2024-03-10T07:00:00Z", "occurred": true, "colour": "Yellow" },
                { "id": "00000000-0000-4000-8000-000000000005", "baby_id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                  "date_time": "2024-03-10T09:00:00Z", "occurred": false, "colour": "Yellow" }
            ],
            "measurements": [
                { "id": "00000000-0000-4000-8000-000000000006", "baby_id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                  "date_time": "2024-02-01T09:00:00Z", "weight_kg": 4.1, "height_cm": 54.0 },
                { "id": "00000000-0000-4000-8000-000000000007", "baby_id": "0b6a1b2c-3d4e-4f50-8a61-72839405a6b7",
                  "date_time": "2024-03-01T09:00:00Z", "weight_kg": 5.0, "height_cm": 57.0 }
            ]
        }"#
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_snapshot_to_insights() {
        let json = snapshot_to_insights(sample_snapshot_json(), now(), 0).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        // 2024-01-01 to 2024-03-10 is 69 days
        assert_eq!(report["age"]["days"], 69);
        assert_eq!(report["age"]["weeks"], 9);
        assert_eq!(report["age"]["months"], 2);
        assert_eq!(report["dashboard_age"]["unit"], "months");

        assert_eq!(report["today_feeds"]["event_count"], 2);
        assert_eq!(report["today_feeds"]["quantity_total"], 300.0);
        assert_eq!(report["feed_target"]["percentage_of_target"], 40);
        assert_eq!(report["feed_target"]["is_below_target"], true);
        assert_eq!(report["today_diapers"]["event_count"], 1);
        assert_eq!(report["totals"]["feeds"]["count"], 3);
        assert_eq!(report["totals"]["measurements"], 2);

        // Latest measurement: 5.0 kg / 57 cm vs medians 4.0 / 55.0 at 2 months
        assert_eq!(report["growth"]["weight"]["percentile"]["value"], 60.0);
        assert_eq!(report["growth"]["weight"]["percentile"]["band"], "normal");
        assert_eq!(report["growth"]["height"]["percentile"]["value"], 70.0);
        assert!(report["growth"]["bmi"].is_object());
    }

    #[test]
    fn test_utc_offset_moves_day_window() {
        // In UTC-8 the local 03-10 starts at 08:00Z; in UTC+10 it is already 03-11
        let processor = InsightsProcessor::new();
        let west = processor.process(sample_snapshot_json(), now(), -8 * 60).unwrap();
        assert_eq!(west.today_feeds.event_count, 1);

        let east = processor.process(sample_snapshot_json(), now(), 10 * 60).unwrap();
        assert_eq!(east.today_feeds.event_count, 0);
    }

    #[test]
    fn test_processor_with_custom_curve() {
        let mut processor = InsightsProcessor::new();
        processor
            .load_curve(
                r#"{
                    "name": "flat",
                    "weight": [{ "age_months": 0, "median": 5.0 }],
                    "height": [{ "age_months": 0, "median": 57.0 }],
                    "bmi": [{ "age_months": 0, "median": 15.4 }]
                }"#,
            )
            .unwrap();

        let report = processor.process(sample_snapshot_json(), now(), 0).unwrap();
        assert_eq!(processor.engine().scorer().provider().name(), "flat");
        let weight = report.growth.weight.unwrap();
        assert_eq!(weight.metric, MetricType::Weight);
        assert_eq!(weight.percentile.value, 50.0);
        assert_eq!(weight.percentile.band, StatusBand::Normal);
    }

    #[test]
    fn test_processor_load_config_keeps_curve() {
        let mut processor = InsightsProcessor::new();
        processor.load_config(r#"{"daily_feed_target_ml": 300}"#).unwrap();

        let report = processor.process(sample_snapshot_json(), now(), 0).unwrap();
        assert_eq!(report.feed_target.percentage_of_target, 100);
        assert!(!report.feed_target.is_below_target);
        assert_eq!(processor.engine().scorer().provider().name(), "simplified");
        assert_eq!(report.growth.weight.unwrap().percentile.value, 60.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            snapshot_to_insights("not valid json", now(), 0),
            Err(InsightsError::JsonError(_))
        ));
        assert!(matches!(
            snapshot_to_insights(sample_snapshot_json(), now(), 48 * 60),
            Err(InsightsError::InvalidTimezone(_))
        ));

        let mut processor = InsightsProcessor::new();
        assert!(processor.load_config(r#"{"sensitivity": 0}"#).is_err());
        assert!(processor.load_curve(r#"{"weight": []}"#).is_err());
    }
}
