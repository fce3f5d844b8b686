// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decoded GPS tracks.
//!
//! A [`Track`] is the decoded point sequence of one activity's summary
//! polyline. Decoding happens once, at sync time; afterwards tracks live as
//! GPX files and are read back without touching the encoded form again.

use geo::LineString;
use serde::{Deserialize, Serialize};

/// Error decoding an encoded polyline.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed polyline: {0}")]
    Malformed(String),
}

/// One geographic point of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
}

/// The ordered point sequence of one activity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { points }
    }

    /// Decode a Google encoded polyline (Strava format, precision 5).
    ///
    /// An empty input decodes to an empty track; callers treat that the same
    /// as a missing polyline and store nothing.
    pub fn from_polyline(encoded: &str) -> Result<Self, DecodeError> {
        let line = polyline::decode_polyline(encoded, 5)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Ok(Self::from_line_string(&line))
    }

    pub fn from_line_string(line: &LineString<f64>) -> Self {
        let points = line
            .coords()
            .map(|c| TrackPoint { lat: c.y, lon: c.x })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Representative point for reverse geocoding.
    ///
    /// The middle of the point sequence sits on the route proper; the first
    /// fix of a recording is often still settling next to a building.
    pub fn midpoint(&self) -> Option<TrackPoint> {
        self.points.get(self.points.len() / 2).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Canonical example from the polyline format docs:
    // (38.5, -120.2), (40.7, -120.95), (43.252, -126.453)
    const SAMPLE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn test_decodes_sample_polyline() {
        let track = Track::from_polyline(SAMPLE).unwrap();
        assert_eq!(track.len(), 3);
        assert!((track.points()[0].lat - 38.5).abs() < 1e-9);
        assert!((track.points()[0].lon - -120.2).abs() < 1e-9);
        assert!((track.points()[2].lat - 43.252).abs() < 1e-9);
        assert!((track.points()[2].lon - -126.453).abs() < 1e-9);
    }

    #[test]
    fn test_empty_polyline_decodes_to_empty_track() {
        let track = Track::from_polyline("").unwrap();
        assert!(track.is_empty());
        assert_eq!(track.midpoint(), None);
    }

    #[test]
    fn test_malformed_polyline_is_an_error() {
        assert!(Track::from_polyline("invalid!!!").is_err());
    }

    #[test]
    fn test_midpoint_picks_middle_of_sequence() {
        let odd = Track::new(
            (0..5)
                .map(|i| TrackPoint {
                    lat: i as f64,
                    lon: 0.0,
                })
                .collect(),
        );
        assert_eq!(odd.midpoint().unwrap().lat, 2.0);

        let even = Track::new(
            (0..4)
                .map(|i| TrackPoint {
                    lat: i as f64,
                    lon: 0.0,
                })
                .collect(),
        );
        assert_eq!(even.midpoint().unwrap().lat, 2.0);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let line = LineString::from(vec![(12.5683, 55.6761), (12.5700, 55.6800)]);
        let encoded = polyline::encode_coordinates(line, 5).unwrap();
        let track = Track::from_polyline(&encoded).unwrap();
        assert_eq!(track.len(), 2);
        assert!((track.points()[0].lat - 55.6761).abs() < 1e-5);
        assert!((track.points()[0].lon - 12.5683).abs() < 1e-5);
    }
}
