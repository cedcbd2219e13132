//! Reference growth curves
//!
//! A reference curve maps a metric and an age in months to the population median
//! used as the comparison baseline for percentile scoring. Curves are defined over
//! `0..=24` months; ages outside that range are clamped to the nearest boundary.
//!
//! Two providers ship with the crate:
//! - [`SimplifiedCurve`]: linear synthetic medians (the default)
//! - [`TabulatedCurve`]: per-metric tables with linear interpolation, loadable
//!   from JSON so a regional or medical standard can be swapped in

use crate::error::InsightsError;
use crate::types::MetricType;
use serde::{Deserialize, Serialize};

/// Oldest age (months) covered by reference curves
pub const REFERENCE_MAX_AGE_MONTHS: u32 = 24;

/// Supplies the population median for a metric at a given age
pub trait ReferenceCurveProvider {
    /// Median value of `metric` at `age_months`.
    ///
    /// Must be finite, and non-decreasing in `age_months` over `0..=24`.
    fn median(&self, metric: MetricType, age_months: u32) -> f64;

    /// Human-readable name of the curve set
    fn name(&self) -> &str {
        "custom"
    }
}

impl<P: ReferenceCurveProvider + ?Sized> ReferenceCurveProvider for &P {
    fn median(&self, metric: MetricType, age_months: u32) -> f64 {
        (**self).median(metric, age_months)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: ReferenceCurveProvider + ?Sized> ReferenceCurveProvider for Box<P> {
    fn median(&self, metric: MetricType, age_months: u32) -> f64 {
        (**self).median(metric, age_months)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Clamp an age into the range covered by reference curves
pub fn clamp_age_months(age_months: u32) -> u32 {
    age_months.min(REFERENCE_MAX_AGE_MONTHS)
}

/// Synthetic linear curve.
///
/// - weight: `3.0 + 0.5 * months` kg
/// - height: `50.0 + 2.5 * months` cm
/// - BMI: flat `15.0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifiedCurve;

impl ReferenceCurveProvider for SimplifiedCurve {
    fn median(&self, metric: MetricType, age_months: u32) -> f64 {
        let months = clamp_age_months(age_months) as f64;
        match metric {
            MetricType::Weight => 3.0 + months * 0.5,
            MetricType::Height => 50.0 + months * 2.5,
            MetricType::Bmi => 15.0,
        }
    }

    fn name(&self) -> &str {
        "simplified"
    }
}

/// One `(age, median)` point of a tabulated curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub age_months: f64,
    pub median: f64,
}

impl CurvePoint {
    pub fn new(age_months: f64, median: f64) -> Self {
        Self { age_months, median }
    }
}

/// Reference curve backed by per-metric point tables.
///
/// Medians between points are linearly interpolated; ages before the first or
/// after the last point take that point's median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveTable")]
pub struct TabulatedCurve {
    name: String,
    weight: Vec<CurvePoint>,
    height: Vec<CurvePoint>,
    bmi: Vec<CurvePoint>,
}

/// Unvalidated wire form of a [`TabulatedCurve`]
#[derive(Deserialize)]
struct CurveTable {
    #[serde(default = "default_table_name")]
    name: String,
    weight: Vec<CurvePoint>,
    height: Vec<CurvePoint>,
    bmi: Vec<CurvePoint>,
}

fn default_table_name() -> String {
    "tabulated".to_string()
}

impl TryFrom<CurveTable> for TabulatedCurve {
    type Error = InsightsError;

    fn try_from(table: CurveTable) -> Result<Self, Self::Error> {
        TabulatedCurve::new(table.name, table.weight, table.height, table.bmi)
    }
}

impl TabulatedCurve {
    /// Build a curve, validating every table
    pub fn new(
        name: impl Into<String>,
        weight: Vec<CurvePoint>,
        height: Vec<CurvePoint>,
        bmi: Vec<CurvePoint>,
    ) -> Result<Self, InsightsError> {
        validate_points(MetricType::Weight, &weight)?;
        validate_points(MetricType::Height, &height)?;
        validate_points(MetricType::Bmi, &bmi)?;

        Ok(Self {
            name: name.into(),
            weight,
            height,
            bmi,
        })
    }

    /// Sample another provider at every whole month of the covered range
    pub fn from_provider<P: ReferenceCurveProvider>(
        name: impl Into<String>,
        provider: &P,
    ) -> Result<Self, InsightsError> {
        let sample = |metric: MetricType| -> Vec<CurvePoint> {
            (0..=REFERENCE_MAX_AGE_MONTHS)
                .map(|month| CurvePoint::new(month as f64, provider.median(metric, month)))
                .collect()
        };

        Self::new(
            name,
            sample(MetricType::Weight),
            sample(MetricType::Height),
            sample(MetricType::Bmi),
        )
    }

    /// Load and validate a curve from JSON
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        let table: CurveTable = serde_json::from_str(json)?;
        table.try_into()
    }

    /// Serialize the curve to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Points backing a metric
    pub fn points(&self, metric: MetricType) -> &[CurvePoint] {
        match metric {
            MetricType::Weight => &self.weight,
            MetricType::Height => &self.height,
            MetricType::Bmi => &self.bmi,
        }
    }

    fn interpolate(points: &[CurvePoint], age: f64) -> f64 {
        // Tables are validated non-empty
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return f64::NAN,
        };

        if age <= first.age_months {
            return first.median;
        }
        if age >= last.age_months {
            return last.median;
        }

        points
            .windows(2)
            .find(|pair| age >= pair[0].age_months && age <= pair[1].age_months)
            .map(|pair| {
                let (lo, hi) = (pair[0], pair[1]);
                let t = (age - lo.age_months) / (hi.age_months - lo.age_months);
                lo.median + t * (hi.median - lo.median)
            })
            .unwrap_or(last.median)
    }
}

impl ReferenceCurveProvider for TabulatedCurve {
    fn median(&self, metric: MetricType, age_months: u32) -> f64 {
        let age = clamp_age_months(age_months) as f64;
        Self::interpolate(self.points(metric), age)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn validate_points(metric: MetricType, points: &[CurvePoint]) -> Result<(), InsightsError> {
    let invalid = |reason: String| -> Result<(), InsightsError> {
        tracing::warn!(metric = metric.as_str(), %reason, "rejecting reference table");
        Err(InsightsError::InvalidReferenceCurve(format!(
            "{} table: {}",
            metric.as_str(),
            reason
        )))
    };

    if points.is_empty() {
        return invalid("no points".to_string());
    }

    for (index, point) in points.iter().enumerate() {
        if !point.age_months.is_finite() || !point.median.is_finite() {
            return invalid(format!("point {} is not finite", index));
        }
        if point.age_months < 0.0 {
            return invalid(format!("point {} has a negative age", index));
        }
        if point.median < 0.0 {
            return invalid(format!("point {} has a negative median", index));
        }
    }

    for (index, pair) in points.windows(2).enumerate() {
        if pair[1].age_months <= pair[0].age_months {
            return invalid(format!("ages not strictly increasing at point {}", index + 1));
        }
        if pair[1].median < pair[0].median {
            return invalid(format!("median decreases at point {}", index + 1));
        }
    }

    Ok(())
}
