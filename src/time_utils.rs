// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for parsing and formatting times and paces.

use chrono::NaiveDateTime;

/// Parse a Strava-style local timestamp such as `2024-05-01T06:30:00Z`.
///
/// Strava's `start_date_local` carries a `Z` suffix even though the value is
/// wall-clock time at the activity's location, so the suffix is dropped
/// rather than interpreted as UTC.
pub fn parse_local_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let trimmed = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
}

/// Format a pace in seconds per kilometer as `M:SS`.
///
/// Fractional seconds are truncated. A zero pace (the guard value for
/// zero-distance activities) renders as `0:00`.
pub fn format_pace(pace_s_per_km: f64) -> String {
    let total = if pace_s_per_km.is_finite() && pace_s_per_km > 0.0 {
        pace_s_per_km as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a duration in seconds as `HH:MM:SS`.
pub fn format_hms(total_secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}
