//! End-to-end checks of the public engine API

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use growth_insights::types::{
    AgeBreakdown, AgeDisplay, BabyProfile, EventRecord, Measurement, MetricType, StatusBand,
};
use growth_insights::{
    compute_age, snapshot_to_insights, BabyEvents, InsightsEngine, PercentileScorer,
};

fn baby(date_of_birth: NaiveDate) -> BabyProfile {
    BabyProfile {
        id: Uuid::from_u128(0x0b_ab1e),
        name: "Noor".to_string(),
        date_of_birth,
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 19, 15, 30, 0).unwrap()
}

#[test]
fn age_of_two_hundred_days() {
    let birth = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(
        compute_age(birth, now()),
        AgeBreakdown {
            days: 200,
            weeks: 28,
            months: 6
        }
    );
}

#[test]
fn todays_feeds_against_default_target() {
    let profile = baby(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let today = |hour| Utc.with_ymd_and_hms(2024, 7, 19, hour, 0, 0).unwrap();
    let feeds = vec![
        EventRecord::with_quantity(profile.id, today(6), 120.0),
        EventRecord::with_quantity(profile.id, today(10), 180.0),
        EventRecord::with_quantity(profile.id, today(6) - Duration::days(1), 200.0),
    ];
    let events = BabyEvents {
        feeds: &feeds,
        ..Default::default()
    };

    let report = InsightsEngine::new()
        .build_insights(&profile, &events, None, now(), &Utc)
        .unwrap();

    assert_eq!(report.today_feeds.event_count, 2);
    assert_eq!(report.today_feeds.quantity_total, 300.0);
    assert_eq!(report.feed_target.percentage_of_target, 40);
    assert!(report.feed_target.is_below_target);
    assert_eq!(report.totals.feeds.count, 3);
    assert_eq!(report.totals.feeds.quantity_total, 500.0);
}

#[test]
fn newborn_weight_scored_against_curve() {
    let scorer = PercentileScorer::default();
    let result = scorer.score(MetricType::Weight, 3.8, 0).unwrap();
    assert_eq!(result.value, 58.0);
    assert_eq!(result.band, StatusBand::Normal);
}

#[test]
fn newborn_full_report() {
    let profile = baby(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap());
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    let at = |day, hour, min| Utc.with_ymd_and_hms(2024, 7, day, hour, min, 0).unwrap();
    let diapers = vec![
        EventRecord::with_occurrence(profile.id, at(19, 7, 0), true),
        EventRecord::with_occurrence(profile.id, at(19, 9, 0), false),
        // 23:30 local on the 18th
        EventRecord::with_occurrence(profile.id, at(18, 21, 30), true),
    ];
    let measurement = Measurement::new(
        Some(3.8),
        None,
        Utc.with_ymd_and_hms(2024, 7, 12, 9, 0, 0).unwrap(),
    );
    let events = BabyEvents {
        diapers: &diapers,
        measurement_count: 1,
        ..Default::default()
    };

    let report = InsightsEngine::new()
        .build_insights(&profile, &events, Some(&measurement), now(), &tz)
        .unwrap();

    assert_eq!(report.age.days, 9);
    assert_eq!(report.dashboard_age, AgeDisplay::Days(9));
    assert_eq!(report.header_age, AgeDisplay::Weeks(1));
    assert_eq!(report.today_diapers.event_count, 1);
    assert_eq!(report.totals.diapers.count, 2);
    assert_eq!(report.totals.measurements, 1);

    let weight = report.growth.weight.unwrap();
    assert_eq!(weight.percentile.value, 58.0);
    assert_eq!(weight.percentile.band, StatusBand::Normal);
    assert_eq!(report.growth.height, None);
    assert_eq!(report.growth.bmi, None);
}

#[test]
fn snapshot_json_end_to_end() {
    let snapshot = r#"{
        "schema_version": "baby.snapshot.v1",
        "baby": { "id": "5f1c7e0a-2b7d-4c1e-9a0f-6d3b8e2a4c10", "name": "Noor", "date_of_birth": "2024-01-01" },
        "feeds": [
            { "id": "a0000000-0000-4000-8000-000000000001", "baby_id": "5f1c7e0a-2b7d-4c1e-9a0f-6d3b8e2a4c10",
              "date_time": "2024-07-19T08:00:00Z", "quantity": 300, "feed_type": "Bottle" }
        ],
        "poops": [
            { "id": "a0000000-0000-4000-8000-000000000002", "baby_id": "5f1c7e0a-2b7d-4c1e-9a0f-6d3b8e2a4c10",
              "date_time": "2024-07-19T09:00:00Z", "occurred": true, "colour": "Yellow" }
        ],
        "measurements": [
            { "id": "a0000000-0000-4000-8000-000000000003", "baby_id": "5f1c7e0a-2b7d-4c1e-9a0f-6d3b8e2a4c10",
              "date_time": "2024-07-01T09:00:00Z", "weight_kg": 7.0, "height_cm": 65.0 }
        ]
    }"#;

    let first = snapshot_to_insights(snapshot, now(), 0).unwrap();
    let second = snapshot_to_insights(snapshot, now(), 0).unwrap();
    assert_eq!(first, second);

    let report: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(report["age"]["months"], 6);
    assert_eq!(report["feed_target"]["percentage_of_target"], 40);
    assert_eq!(report["today_diapers"]["event_count"], 1);
    // Medians at 6 months: 6.0 kg, 65.0 cm
    assert_eq!(report["growth"]["weight"]["percentile"]["value"], 60.0);
    assert_eq!(report["growth"]["height"]["percentile"]["value"], 50.0);
    assert_eq!(report["growth"]["bmi"]["metric"], "bmi");
}
