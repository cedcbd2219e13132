//! Insights facade
//!
//! [`InsightsEngine`] composes the age calculator, event aggregator and
//! percentile scorer into the single [`InsightsReport`] read model consumed by
//! the presentation layer. It adds no logic of its own beyond assembling the
//! report and deciding which growth metrics are present.

use crate::age::compute_age;
use crate::aggregate::EventAggregator;
use crate::config::InsightsConfig;
use crate::error::InsightsError;
use crate::percentile::PercentileScorer;
use crate::reference::{ReferenceCurveProvider, SimplifiedCurve};
use crate::types::{
    BabyProfile, EventRecord, FeedTargetProgress, GrowthReport, InsightsReport, LifetimeTotals,
    Measurement, MetricType,
};
use chrono::{DateTime, TimeZone, Utc};

/// Already-fetched history of one baby
#[derive(Debug, Clone, Copy, Default)]
pub struct BabyEvents<'a> {
    /// Feed entries (quantity-bearing)
    pub feeds: &'a [EventRecord],
    /// Diaper entries (boolean-bearing)
    pub diapers: &'a [EventRecord],
    /// Number of growth measurements on record
    pub measurement_count: usize,
}

/// Builds insights reports from already-loaded data
#[derive(Debug, Clone)]
pub struct InsightsEngine<P = SimplifiedCurve> {
    scorer: PercentileScorer<P>,
    config: InsightsConfig,
}

impl Default for InsightsEngine<SimplifiedCurve> {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightsEngine<SimplifiedCurve> {
    /// Engine with the simplified reference curve and default settings
    pub fn new() -> Self {
        Self::with_default_config(SimplifiedCurve)
    }
}

impl<P: ReferenceCurveProvider> InsightsEngine<P> {
    /// Engine with a custom reference curve and settings
    pub fn with_provider(provider: P, config: InsightsConfig) -> Result<Self, InsightsError> {
        config.validate()?;
        Ok(Self {
            scorer: PercentileScorer::with_sensitivity(provider, config.sensitivity)?,
            config,
        })
    }

    /// Engine with a custom reference curve and default settings
    pub fn with_default_config(provider: P) -> Self {
        Self {
            scorer: PercentileScorer::new(provider),
            config: InsightsConfig::default(),
        }
    }

    /// Replace the settings, keeping the reference curve
    pub fn set_config(&mut self, config: InsightsConfig) -> Result<(), InsightsError> {
        config.validate()?;
        self.scorer.set_sensitivity(config.sensitivity)?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub fn scorer(&self) -> &PercentileScorer<P> {
        &self.scorer
    }

    /// Build the insights report for `baby` as of `now`.
    ///
    /// Stages:
    /// 1. Age breakdown from the birth date
    /// 2. Today's feed and diaper aggregates in the caller's time zone
    /// 3. Feed volume against the daily target
    /// 4. Lifetime totals
    /// 5. Percentiles for the metrics present in the latest measurement
    pub fn build_insights<Tz: TimeZone>(
        &self,
        baby: &BabyProfile,
        events: &BabyEvents<'_>,
        latest_measurement: Option<&Measurement>,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<InsightsReport, InsightsError> {
        // Stage 1: Age
        let age = compute_age(baby.date_of_birth, now);

        // Stage 2: Today's aggregates
        let today_feeds = EventAggregator::aggregate_today(events.feeds, now, tz);
        let today_diapers = EventAggregator::aggregate_today(events.diapers, now, tz);

        // Stage 3: Feed target
        let feed_target = self.feed_target_progress(today_feeds.quantity_total);

        // Stage 4: Lifetime totals
        let totals = LifetimeTotals {
            feeds: EventAggregator::aggregate_all(events.feeds),
            diapers: EventAggregator::aggregate_all(events.diapers),
            measurements: u32::try_from(events.measurement_count).unwrap_or(u32::MAX),
        };

        // Stage 5: Growth percentiles
        let growth = self.growth_report(latest_measurement, age.months)?;

        tracing::debug!(
            baby_id = %baby.id,
            age_days = age.days,
            today_feeds = today_feeds.event_count,
            today_diapers = today_diapers.event_count,
            scored_metrics = growth.scores().count(),
            "built insights report"
        );

        Ok(InsightsReport {
            baby_id: baby.id,
            generated_at: now,
            age,
            dashboard_age: age.dashboard_display(),
            header_age: age.header_display(),
            today_feeds,
            feed_target,
            today_diapers,
            totals,
            growth,
        })
    }

    /// Compare a feed volume against the configured daily target
    pub fn feed_target_progress(&self, total_ml: f64) -> FeedTargetProgress {
        let target_ml = self.config.daily_feed_target_ml;
        let percentage = (total_ml / target_ml * 100.0).round();
        // Float to int casts saturate
        let percentage_of_target = percentage as u32;

        FeedTargetProgress {
            total_ml,
            target_ml,
            percentage_of_target,
            is_below_target: percentage_of_target < 100,
        }
    }

    /// Score the metrics present in `measurement` at `age_months`.
    ///
    /// No measurement, or an empty one, yields a report with no scores.
    pub fn growth_report(
        &self,
        measurement: Option<&Measurement>,
        age_months: u32,
    ) -> Result<GrowthReport, InsightsError> {
        let mut report = GrowthReport {
            measured_at: measurement.map(|m| m.taken_at),
            age_months,
            ..GrowthReport::default()
        };

        let Some(measurement) = measurement else {
            return Ok(report);
        };

        for score in self.scorer.score_measurement(measurement, age_months)? {
            match score.metric {
                MetricType::Weight => report.weight = Some(score),
                MetricType::Height => report.height = Some(score),
                MetricType::Bmi => report.bmi = Some(score),
            }
        }

        Ok(report)
    }
}
