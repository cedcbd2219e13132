//! baby.snapshot.v1 row definitions
//!
//! Row shapes mirror the hosted store's tables (`babies`, `feed_entries`,
//! `poop_entries`, `measurements`). A [`BabySnapshot`] bundles one baby with
//! every row fetched for it, which is the unit the CLI and FFI surfaces accept.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current snapshot schema version
pub const SCHEMA_VERSION: &str = "baby.snapshot.v1";

/// Row of the `babies` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BabyRow {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// Kind of feed recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedType {
    Breast,
    Bottle,
    Formula,
    Solid,
    /// Free-text feed types written by older clients
    #[serde(untagged)]
    Other(String),
}

/// Row of the `feed_entries` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRow {
    pub id: Uuid,
    pub baby_id: Uuid,
    pub date_time: DateTime<Utc>,
    /// Volume in milliliters
    pub quantity: f64,
    pub feed_type: FeedType,
    #[serde(default)]
    pub fed_by: String,
}

/// Row of the `poop_entries` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaperRow {
    pub id: Uuid,
    pub baby_id: Uuid,
    pub date_time: DateTime<Utc>,
    /// False when the check found nothing
    #[serde(default = "default_occurred")]
    pub occurred: bool,
    #[serde(default)]
    pub colour: String,
}

fn default_occurred() -> bool {
    true
}

/// Row of the `measurements` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub id: Uuid,
    pub baby_id: Uuid,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One baby and every row fetched for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BabySnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub baby: BabyRow,
    #[serde(default)]
    pub feeds: Vec<FeedRow>,
    #[serde(default, alias = "poops")]
    pub diapers: Vec<DiaperRow>,
    #[serde(default)]
    pub measurements: Vec<MeasurementRow>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl BabySnapshot {
    /// Empty snapshot for a baby
    pub fn new(baby: BabyRow) -> Self {
        Self {
            schema_version: default_schema_version(),
            baby,
            feeds: Vec::new(),
            diapers: Vec::new(),
            measurements: Vec::new(),
        }
    }

    /// Validate the snapshot, returning a description of the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema version '{}', expected '{}'",
                self.schema_version, SCHEMA_VERSION
            ));
        }

        if self.baby.name.trim().is_empty() {
            return Err("baby name is empty".to_string());
        }

        let baby_id = self.baby.id;

        for feed in &self.feeds {
            if feed.baby_id != baby_id {
                return Err(format!("feed {} belongs to baby {}", feed.id, feed.baby_id));
            }
            if !feed.quantity.is_finite() || feed.quantity < 0.0 {
                return Err(format!("feed {} has invalid quantity {}", feed.id, feed.quantity));
            }
        }

        for diaper in &self.diapers {
            if diaper.baby_id != baby_id {
                return Err(format!(
                    "diaper entry {} belongs to baby {}",
                    diaper.id, diaper.baby_id
                ));
            }
        }

        for measurement in &self.measurements {
            if measurement.baby_id != baby_id {
                return Err(format!(
                    "measurement {} belongs to baby {}",
                    measurement.id, measurement.baby_id
                ));
            }
            for (field, value) in [
                ("weight_kg", measurement.weight_kg),
                ("height_cm", measurement.height_cm),
            ] {
                if let Some(v) = value {
                    if !v.is_finite() || v <= 0.0 {
                        return Err(format!(
                            "measurement {} has invalid {} {}",
                            measurement.id, field, v
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
