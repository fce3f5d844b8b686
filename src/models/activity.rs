// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized activity records.
//!
//! One [`Activity`] is one row in the flat activity table: the subset of a
//! Strava activity the rest of the pipeline actually consumes, keyed by the
//! upstream activity ID.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Activity type string Strava uses for runs.
pub const ACTIVITY_TYPE_RUN: &str = "Run";

/// One normalized activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Strava activity ID (primary key)
    pub id: u64,
    /// Activity title as entered by the athlete
    pub name: String,
    /// Activity type ("Run", "Ride", "Hike", ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Start of the activity in the athlete's local wall-clock time
    pub start_time_local: NaiveDateTime,
    /// Distance in meters
    pub distance_m: f64,
    /// Moving time in seconds
    pub moving_time_s: u64,
    /// Elapsed time in seconds
    pub elapsed_time_s: u64,
    /// Total elevation gain in meters
    pub elevation_gain_m: f64,
}

impl Activity {
    /// Whether this activity is a run (the only type the aggregation covers).
    pub fn is_run(&self) -> bool {
        self.kind == ACTIVITY_TYPE_RUN
    }

    /// Distance in kilometers.
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Average moving pace in seconds per kilometer.
    ///
    /// Returns `0.0` for zero-distance activities (e.g. treadmill entries
    /// with no GPS distance) instead of dividing by zero.
    pub fn pace_s_per_km(&self) -> f64 {
        let km = self.distance_km();
        if km > 0.0 {
            self.moving_time_s as f64 / km
        } else {
            0.0
        }
    }

    /// Local wall-clock time at which the moving portion ended.
    pub fn end_time_local(&self) -> NaiveDateTime {
        self.start_time_local + chrono::Duration::seconds(self.moving_time_s as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_activity(kind: &str, distance_m: f64, moving_time_s: u64) -> Activity {
        Activity {
            id: 1001,
            name: "Morning Run".to_string(),
            kind: kind.to_string(),
            start_time_local: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(6, 30, 0)
                .unwrap(),
            distance_m,
            moving_time_s,
            elapsed_time_s: moving_time_s + 60,
            elevation_gain_m: 12.0,
        }
    }

    #[test]
    fn test_run_type_detection() {
        assert!(make_activity("Run", 5000.0, 1500).is_run());
        assert!(!make_activity("Ride", 5000.0, 1500).is_run());
        assert!(!make_activity("run", 5000.0, 1500).is_run());
    }

    #[test]
    fn test_pace_for_ordinary_run() {
        // 5 km in 25 minutes is 5:00 min/km.
        let activity = make_activity("Run", 5000.0, 1500);
        assert!((activity.pace_s_per_km() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_pace_guard_for_zero_distance() {
        let activity = make_activity("Run", 0.0, 1500);
        assert_eq!(activity.pace_s_per_km(), 0.0);
    }

    #[test]
    fn test_end_time_adds_moving_time() {
        let activity = make_activity("Run", 5000.0, 1500);
        assert_eq!(activity.end_time_local().to_string(), "2024-05-01 06:55:00");
    }

    #[test]
    fn test_csv_row_round_trips() {
        let activity = make_activity("Run", 5000.0, 1500);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&activity).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with(
            "id,name,type,start_time_local,distance_m,moving_time_s,elapsed_time_s,elevation_gain_m"
        ));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let parsed: Activity = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed, activity);
    }
}
