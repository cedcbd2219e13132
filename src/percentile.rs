//! Percentile scoring
//!
//! Scores a weight, height or BMI value against a reference curve and classifies
//! the result into a [`StatusBand`].
//!
//! The percentile is a linear proxy, not a z-score transform:
//!
//! ```text
//! raw = 50 + (value - median) * sensitivity
//! percentile = round1(clamp(raw, 1, 99))
//! ```

use crate::config::check_positive;
use crate::error::InsightsError;
use crate::reference::{clamp_age_months, ReferenceCurveProvider, SimplifiedCurve};
use crate::types::{
    round_one_decimal, Measurement, MetricScore, MetricType, PercentileResult, StatusBand,
};

/// Percentile points per unit of deviation from the median
pub const DEFAULT_SENSITIVITY: f64 = 10.0;

/// Lowest percentile ever reported
pub const MIN_PERCENTILE: f64 = 1.0;

/// Highest percentile ever reported
pub const MAX_PERCENTILE: f64 = 99.0;

/// Scores measurements against a reference curve
#[derive(Debug, Clone)]
pub struct PercentileScorer<P = SimplifiedCurve> {
    provider: P,
    sensitivity: f64,
}

impl Default for PercentileScorer<SimplifiedCurve> {
    fn default() -> Self {
        Self::new(SimplifiedCurve)
    }
}

impl<P: ReferenceCurveProvider> PercentileScorer<P> {
    /// Create a scorer with the default sensitivity
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }

    /// Create a scorer with a custom sensitivity.
    ///
    /// Fails with [`InsightsError::InvalidConfig`] unless the sensitivity is
    /// finite and strictly positive.
    pub fn with_sensitivity(provider: P, sensitivity: f64) -> Result<Self, InsightsError> {
        check_positive("sensitivity", sensitivity)?;
        Ok(Self {
            provider,
            sensitivity,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) -> Result<(), InsightsError> {
        check_positive("sensitivity", sensitivity)?;
        self.sensitivity = sensitivity;
        Ok(())
    }

    /// Score `value` for `metric` at `age_months`.
    ///
    /// Fails with [`InsightsError::InvalidMetricInput`] when the value is not
    /// finite or the reference curve returns an unusable median.
    pub fn score(
        &self,
        metric: MetricType,
        value: f64,
        age_months: u32,
    ) -> Result<PercentileResult, InsightsError> {
        let raw = self.raw_percentile(metric, value, age_months)?;
        if raw.is_nan() {
            return Err(InsightsError::InvalidMetricInput(format!(
                "{} value {} has no defined percentile",
                metric.as_str(),
                value
            )));
        }
        let percentile = round_one_decimal(raw.clamp(MIN_PERCENTILE, MAX_PERCENTILE));

        Ok(PercentileResult {
            value: percentile,
            band: StatusBand::classify(percentile),
        })
    }

    /// Unclamped, unrounded percentile
    pub fn raw_percentile(
        &self,
        metric: MetricType,
        value: f64,
        age_months: u32,
    ) -> Result<f64, InsightsError> {
        if !value.is_finite() {
            tracing::warn!(metric = metric.as_str(), value, "refusing to score non-finite value");
            return Err(InsightsError::InvalidMetricInput(format!(
                "{} value {} is not finite",
                metric.as_str(),
                value
            )));
        }

        let median = self.checked_median(metric, age_months)?;
        Ok(50.0 + (value - median) * self.sensitivity)
    }

    /// Score every metric present in a measurement.
    ///
    /// Absent metrics are skipped, and BMI is scored only when both weight and
    /// height are present. An empty measurement yields no scores.
    pub fn score_measurement(
        &self,
        measurement: &Measurement,
        age_months: u32,
    ) -> Result<Vec<MetricScore>, InsightsError> {
        MetricType::ALL
            .iter()
            .filter_map(|&metric| measurement.value_for(metric).map(|value| (metric, value)))
            .map(|(metric, value)| {
                Ok(MetricScore {
                    metric,
                    value,
                    percentile: self.score(metric, value, age_months)?,
                })
            })
            .collect()
    }

    fn checked_median(&self, metric: MetricType, age_months: u32) -> Result<f64, InsightsError> {
        let clamped = clamp_age_months(age_months);
        let median = self.provider.median(metric, clamped);

        let usable = match metric {
            MetricType::Weight | MetricType::Height => median.is_finite() && median >= 0.0,
            MetricType::Bmi => median.is_finite(),
        };

        if !usable {
            tracing::warn!(
                curve = self.provider.name(),
                metric = metric.as_str(),
                age_months = clamped,
                median,
                "reference curve returned an unusable median"
            );
            return Err(InsightsError::InvalidMetricInput(format!(
                "reference curve '{}' returned median {} for {} at {} months",
                self.provider.name(),
                median,
                metric.as_str(),
                clamped
            )));
        }

        Ok(median)
    }
}
