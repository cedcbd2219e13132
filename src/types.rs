//! Core types for the Growth Insights engine
//!
//! This module defines the value types that flow through the engine: ages,
//! measurements, raw event records, aggregates, percentile results and the
//! final insights report. None of them hold references to each other or to
//! storage; they are passed in and returned by value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Average month length in days used for age-in-months
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Structured age of a baby relative to a reference instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeBreakdown {
    /// Whole days elapsed
    pub days: u32,
    /// Whole weeks elapsed (`days / 7`)
    pub weeks: u32,
    /// Whole average-length months elapsed (`floor(days / 30.44)`)
    pub months: u32,
}

impl AgeBreakdown {
    /// Build a breakdown from a whole number of elapsed days
    pub fn from_days(days: u32) -> Self {
        Self {
            days,
            weeks: days / 7,
            months: (days as f64 / DAYS_PER_MONTH).floor() as u32,
        }
    }

    /// Unit used on the insights dashboard: days for the first month, months after
    pub fn dashboard_display(&self) -> AgeDisplay {
        if self.days < 30 {
            AgeDisplay::Days(self.days)
        } else {
            AgeDisplay::Months(self.months)
        }
    }

    /// Unit used in the baby header: weeks until the first full month, months after
    pub fn header_display(&self) -> AgeDisplay {
        if self.months > 0 {
            AgeDisplay::Months(self.months)
        } else {
            AgeDisplay::Weeks(self.weeks)
        }
    }
}

/// Which unit the presentation layer should show an age in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum AgeDisplay {
    Days(u32),
    Weeks(u32),
    Months(u32),
}

/// Growth metric a percentile is computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Weight,
    Height,
    Bmi,
}

impl MetricType {
    pub const ALL: [MetricType; 3] = [MetricType::Weight, MetricType::Height, MetricType::Bmi];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Weight => "weight",
            MetricType::Height => "height",
            MetricType::Bmi => "bmi",
        }
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weight" => Ok(MetricType::Weight),
            "height" => Ok(MetricType::Height),
            "bmi" => Ok(MetricType::Bmi),
            other => Err(format!("unknown metric type: {other}")),
        }
    }
}

/// A single growth measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Weight in kilograms
    pub weight_kg: Option<f64>,
    /// Height (length) in centimeters
    pub height_cm: Option<f64>,
    /// When the measurement was taken
    pub taken_at: DateTime<Utc>,
}

impl Measurement {
    pub fn new(weight_kg: Option<f64>, height_cm: Option<f64>, taken_at: DateTime<Utc>) -> Self {
        Self {
            weight_kg,
            height_cm,
            taken_at,
        }
    }

    /// True when neither weight nor height was recorded
    pub fn is_empty(&self) -> bool {
        self.weight_kg.is_none() && self.height_cm.is_none()
    }

    /// Body mass index (kg/m²), rounded to one decimal.
    ///
    /// Only defined when both weight and a positive height are present.
    pub fn bmi(&self) -> Option<f64> {
        match (self.weight_kg, self.height_cm) {
            (Some(weight), Some(height)) if height > 0.0 => {
                let height_m = height / 100.0;
                Some(round_one_decimal(weight / (height_m * height_m)))
            }
            _ => None,
        }
    }

    /// Value recorded (or derived) for a metric
    pub fn value_for(&self, metric: MetricType) -> Option<f64> {
        match metric {
            MetricType::Weight => self.weight_kg,
            MetricType::Height => self.height_cm,
            MetricType::Bmi => self.bmi(),
        }
    }
}

/// Qualitative classification of a percentile, ordered along the percentile axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBand {
    BelowNormal,
    LowNormal,
    Normal,
    HighNormal,
    AboveNormal,
}

impl StatusBand {
    /// Classify a percentile.
    ///
    /// `<5` below, `[5,15)` low, `[15,85]` normal, `(85,95]` high, `>95` above.
    pub fn classify(percentile: f64) -> Self {
        if percentile < 5.0 {
            StatusBand::BelowNormal
        } else if percentile < 15.0 {
            StatusBand::LowNormal
        } else if percentile <= 85.0 {
            StatusBand::Normal
        } else if percentile <= 95.0 {
            StatusBand::HighNormal
        } else {
            StatusBand::AboveNormal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusBand::BelowNormal => "below_normal",
            StatusBand::LowNormal => "low_normal",
            StatusBand::Normal => "normal",
            StatusBand::HighNormal => "high_normal",
            StatusBand::AboveNormal => "above_normal",
        }
    }
}

/// Percentile score for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileResult {
    /// Percentile in `[1, 99]`, one decimal
    pub value: f64,
    pub band: StatusBand,
}

/// Raw event row in the uniform shape shared by feeds and diaper changes.
///
/// Feed entries carry a `quantity`; diaper entries carry `happened`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub baby_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub happened: Option<bool>,
}

impl EventRecord {
    /// Quantity-bearing record (feed volume in mL)
    pub fn with_quantity(baby_id: Uuid, occurred_at: DateTime<Utc>, quantity: f64) -> Self {
        Self {
            baby_id,
            occurred_at,
            quantity: Some(quantity),
            happened: None,
        }
    }

    /// Boolean-bearing record (a diaper check that did or did not happen)
    pub fn with_occurrence(baby_id: Uuid, occurred_at: DateTime<Utc>, happened: bool) -> Self {
        Self {
            baby_id,
            occurred_at,
            quantity: None,
            happened: Some(happened),
        }
    }

    /// Whether this record contributes to event counts
    pub fn is_counted(&self) -> bool {
        self.happened != Some(false)
    }

    /// Quantity with absent, negative or non-finite values treated as zero
    pub fn quantity_or_zero(&self) -> f64 {
        self.quantity
            .filter(|q| q.is_finite() && *q >= 0.0)
            .unwrap_or(0.0)
    }
}

/// Half-open `[start, end)` interval of instants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

/// Events and quantities inside one day window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub event_count: u32,
    pub quantity_total: f64,
}

/// Events and quantities over the whole history
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalAggregate {
    pub count: u32,
    pub quantity_total: f64,
}

/// Baby the report is built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BabyProfile {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
}

/// Percentile of one measured (or derived) metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: MetricType,
    /// Value that was scored (kg, cm, or kg/m²)
    pub value: f64,
    pub percentile: PercentileResult,
}

/// Percentiles for every metric available in the latest measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthReport {
    pub measured_at: Option<DateTime<Utc>>,
    pub age_months: u32,
    pub weight: Option<MetricScore>,
    pub height: Option<MetricScore>,
    pub bmi: Option<MetricScore>,
}

impl GrowthReport {
    /// Scored metrics in weight, height, BMI order
    pub fn scores(&self) -> impl Iterator<Item = &MetricScore> {
        [&self.weight, &self.height, &self.bmi]
            .into_iter()
            .filter_map(Option::as_ref)
    }
}

/// Today's feed volume against the daily target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedTargetProgress {
    pub total_ml: f64,
    pub target_ml: f64,
    /// `round(total / target * 100)`
    pub percentage_of_target: u32,
    pub is_below_target: bool,
}

/// All-time counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeTotals {
    pub feeds: TotalAggregate,
    pub diapers: TotalAggregate,
    pub measurements: u32,
}

/// Read model handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub baby_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub age: AgeBreakdown,
    pub dashboard_age: AgeDisplay,
    pub header_age: AgeDisplay,
    pub today_feeds: DailyAggregate,
    pub feed_target: FeedTargetProgress,
    pub today_diapers: DailyAggregate,
    pub totals: LifetimeTotals,
    pub growth: GrowthReport,
}

/// Round to one decimal place, halves away from zero
pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_age_from_days() {
        let age = AgeBreakdown::from_days(200);
        assert_eq!(age, AgeBreakdown { days: 200, weeks: 28, months: 6 });

        // 30.44 days is not yet a month at 30 days, one month at 31
        assert_eq!(AgeBreakdown::from_days(30).months, 0);
        assert_eq!(AgeBreakdown::from_days(31).months, 1);
    }

    #[test]
    fn test_age_display_units() {
        assert_eq!(AgeBreakdown::from_days(12).dashboard_display(), AgeDisplay::Days(12));
        assert_eq!(AgeBreakdown::from_days(45).dashboard_display(), AgeDisplay::Months(1));
        assert_eq!(AgeBreakdown::from_days(30).header_display(), AgeDisplay::Weeks(4));
        assert_eq!(AgeBreakdown::from_days(65).header_display(), AgeDisplay::Months(2));
    }

    #[test]
    fn test_age_display_serialization() {
        let json = serde_json::to_string(&AgeDisplay::Weeks(3)).unwrap();
        assert_eq!(json, r#"{"unit":"weeks","value":3}"#);
    }

    #[test]
    fn test_status_band_boundaries() {
        assert_eq!(StatusBand::classify(4.9), StatusBand::BelowNormal);
        assert_eq!(StatusBand::classify(5.0), StatusBand::LowNormal);
        assert_eq!(StatusBand::classify(14.9), StatusBand::LowNormal);
        assert_eq!(StatusBand::classify(15.0), StatusBand::Normal);
        assert_eq!(StatusBand::classify(85.0), StatusBand::Normal);
        assert_eq!(StatusBand::classify(85.1), StatusBand::HighNormal);
        assert_eq!(StatusBand::classify(95.0), StatusBand::HighNormal);
        assert_eq!(StatusBand::classify(95.1), StatusBand::AboveNormal);
    }

    #[test]
    fn test_status_band_ordering() {
        assert!(StatusBand::BelowNormal < StatusBand::LowNormal);
        assert!(StatusBand::Normal < StatusBand::HighNormal);
        assert!(StatusBand::HighNormal < StatusBand::AboveNormal);
    }

    #[test]
    fn test_bmi_requires_both_values() {
        let full = Measurement::new(Some(4.0), Some(50.0), at(8));
        assert_eq!(full.bmi(), Some(16.0));

        let weight_only = Measurement::new(Some(4.0), None, at(8));
        assert_eq!(weight_only.bmi(), None);

        let zero_height = Measurement::new(Some(4.0), Some(0.0), at(8));
        assert_eq!(zero_height.bmi(), None);

        let empty = Measurement::new(None, None, at(8));
        assert!(empty.is_empty());
        assert_eq!(empty.value_for(MetricType::Bmi), None);
    }

    #[test]
    fn test_bmi_rounded_to_one_decimal() {
        // 3.8 / 0.52^2 = 14.053...
        let m = Measurement::new(Some(3.8), Some(52.0), at(8));
        assert_eq!(m.bmi(), Some(14.1));
    }

    #[test]
    fn test_event_counting_rule() {
        let baby = Uuid::new_v4();
        assert!(EventRecord::with_quantity(baby, at(1), 120.0).is_counted());
        assert!(EventRecord::with_occurrence(baby, at(1), true).is_counted());
        assert!(!EventRecord::with_occurrence(baby, at(1), false).is_counted());
    }

    #[test]
    fn test_quantity_or_zero() {
        let baby = Uuid::new_v4();
        assert_eq!(EventRecord::with_quantity(baby, at(1), 120.0).quantity_or_zero(), 120.0);
        assert_eq!(EventRecord::with_occurrence(baby, at(1), true).quantity_or_zero(), 0.0);
        assert_eq!(EventRecord::with_quantity(baby, at(1), -50.0).quantity_or_zero(), 0.0);
        assert_eq!(EventRecord::with_quantity(baby, at(1), f64::NAN).quantity_or_zero(), 0.0);
        assert_eq!(EventRecord::with_quantity(baby, at(1), f64::INFINITY).quantity_or_zero(), 0.0);
    }

    #[test]
    fn test_day_window_half_open() {
        let window = DayWindow { start: at(0), end: at(12) };
        assert!(window.contains(&at(0)));
        assert!(window.contains(&at(11)));
        assert!(!window.contains(&at(12)));
    }

    #[test]
    fn test_metric_type_parse() {
        assert_eq!("Weight".parse::<MetricType>(), Ok(MetricType::Weight));
        assert_eq!("bmi".parse::<MetricType>(), Ok(MetricType::Bmi));
        assert!("head".parse::<MetricType>().is_err());
    }
}
