// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{NaiveDate, NaiveDateTime};
use geo::LineString;

use runatlas::config::Config;
use runatlas::models::GeocodeResult;
use runatlas::services::strava::{StravaActivitySummary, StravaMap};
use runatlas::services::Geocoder;
use runatlas::store::{ActivityStore, StateCache, TrackStore};

/// Central Copenhagen, on the 5-decimal grid so polyline encoding is exact.
#[allow(dead_code)]
pub const COPENHAGEN: (f64, f64) = (55.6761, 12.5683);

/// Central Aarhus, likewise grid-aligned.
#[allow(dead_code)]
pub const AARHUS: (f64, f64) = (56.1629, 10.2039);

/// Create a fresh data directory plus a config rooted in it.
#[allow(dead_code)]
pub fn test_env() -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = Config::for_data_dir(dir.path());
    (dir, config)
}

/// Open the activity and track stores for a test config.
#[allow(dead_code)]
pub fn open_stores(config: &Config) -> (ActivityStore, TrackStore) {
    (
        ActivityStore::open(config.activities_csv()).expect("Failed to open activity store"),
        TrackStore::open(config.tracks_dir()).expect("Failed to open track store"),
    )
}

/// The state cache for a test config.
#[allow(dead_code)]
pub fn state_cache(config: &Config) -> StateCache {
    StateCache::new(config.state_path())
}

/// Local start time on day `day` of May 2024.
#[allow(dead_code)]
pub fn start_on_day(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .expect("Invalid test day")
        .and_hms_opt(6, 30, 0)
        .expect("Invalid test time")
}

/// Encode a three-point track whose midpoint is exactly `(lat, lon)`.
///
/// The engine resolves a track by its midpoint, so seeding the geocode cache
/// at `(lat, lon)` makes this track resolvable offline.
#[allow(dead_code)]
pub fn encoded_track_at(lat: f64, lon: f64) -> String {
    let line = LineString::from(vec![
        (lon - 0.001, lat - 0.001),
        (lon, lat),
        (lon + 0.001, lat + 0.001),
    ]);
    polyline::encode_coordinates(line, 5).expect("Failed to encode test polyline")
}

/// Build a Strava list-endpoint summary for a run on day `day` of May 2024.
#[allow(dead_code)]
pub fn run_summary(id: u64, day: u32, distance_m: f64, encoded: Option<&str>) -> StravaActivitySummary {
    summary_of_kind("Run", id, day, distance_m, encoded)
}

/// Build a Strava list-endpoint summary of an arbitrary activity type.
#[allow(dead_code)]
pub fn summary_of_kind(
    kind: &str,
    id: u64,
    day: u32,
    distance_m: f64,
    encoded: Option<&str>,
) -> StravaActivitySummary {
    StravaActivitySummary {
        id,
        name: format!("{kind} {id}"),
        kind: kind.to_string(),
        start_date_local: format!("2024-05-{day:02}T06:30:00Z"),
        distance: distance_m,
        moving_time: 1500,
        elapsed_time: 1560,
        total_elevation_gain: 12.0,
        map: encoded.map(|e| StravaMap {
            summary_polyline: Some(e.to_string()),
        }),
    }
}

/// Create an offline geocoder pre-seeded with the given coordinate locations.
#[allow(dead_code)]
pub fn seeded_geocoder(config: &Config, seeds: &[((f64, f64), (&str, &str))]) -> Geocoder {
    let mut geocoder = Geocoder::offline(config.geocode_cache_path());
    for &((lat, lon), (city, country)) in seeds {
        geocoder.insert(lat, lon, GeocodeResult::new(Some(city), Some(country)));
    }
    geocoder
}
