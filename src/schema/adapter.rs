//! Adapter for converting baby.snapshot.v1 rows into engine inputs
//!
//! Feed and diaper rows are mapped onto the uniform [`EventRecord`] shape and
//! measurement rows onto [`Measurement`].

use crate::error::InsightsError;
use crate::schema::rows::*;
use crate::types::{BabyProfile, EventRecord, Measurement};
use serde::de::DeserializeOwned;

/// Adapter for converting rows to engine inputs
pub struct RowAdapter;

impl RowAdapter {
    /// Parse and validate a snapshot document
    pub fn parse_snapshot(json: &str) -> Result<BabySnapshot, InsightsError> {
        let snapshot: BabySnapshot = serde_json::from_str(json)?;
        snapshot
            .validate()
            .map_err(|e| InsightsError::ParseError(format!("Invalid snapshot: {}", e)))?;
        Ok(snapshot)
    }

    /// Parse a JSON array of rows
    pub fn parse_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, InsightsError> {
        let rows: Vec<T> = serde_json::from_str(json)?;
        Ok(rows)
    }

    /// Parse NDJSON (newline-delimited JSON) rows
    pub fn parse_ndjson<T: DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, InsightsError> {
        let mut rows = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(trimmed) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    return Err(InsightsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(rows)
    }

    /// Profile of the snapshot's baby
    pub fn profile(baby: &BabyRow) -> BabyProfile {
        BabyProfile {
            id: baby.id,
            name: baby.name.clone(),
            date_of_birth: baby.date_of_birth,
        }
    }

    /// Feed rows as quantity-bearing records
    pub fn feed_events(rows: &[FeedRow]) -> Vec<EventRecord> {
        rows.iter()
            .map(|row| EventRecord::with_quantity(row.baby_id, row.date_time, row.quantity))
            .collect()
    }

    /// Diaper rows as boolean-bearing records
    pub fn diaper_events(rows: &[DiaperRow]) -> Vec<EventRecord> {
        rows.iter()
            .map(|row| EventRecord::with_occurrence(row.baby_id, row.date_time, row.occurred))
            .collect()
    }

    /// Measurement rows as measurements
    pub fn measurements(rows: &[MeasurementRow]) -> Vec<Measurement> {
        rows.iter()
            .map(|row| Measurement::new(row.weight_kg, row.height_cm, row.date_time))
            .collect()
    }

    /// Most recent measurement.
    ///
    /// Rows taken at the same instant resolve to the one with more values
    /// recorded, then to the later row.
    pub fn latest_measurement(measurements: &[Measurement]) -> Option<&Measurement> {
        measurements.iter().max_by_key(|m| {
            let recorded = m.weight_kg.is_some() as u8 + m.height_cm.is_some() as u8;
            (m.taken_at, recorded)
        })
    }
}
