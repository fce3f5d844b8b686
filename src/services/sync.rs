// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync: mirror the Strava history into the local stores.
//!
//! A sync fetches the complete activity list, replaces the CSV table with
//! the normalized rows, and decodes a GPX track for every activity that has
//! a summary polyline and no stored track yet. Fetch errors abort before
//! anything local is touched; per-activity problems (unparseable fields,
//! undecodable polylines) skip that activity and leave the rest of the sync
//! intact.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Activity, Track};
use crate::services::strava::{StravaActivitySummary, StravaClient};
use crate::store::{ActivityStore, TrackStore};
use crate::time_utils::parse_local_timestamp;

/// What one sync did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Activities returned by Strava
    pub fetched: usize,
    /// Rows written to the activity table
    pub stored: usize,
    /// Tracks decoded and stored for the first time
    pub new_tracks: usize,
    /// Summaries dropped because a field would not parse
    pub invalid_records: usize,
    /// Polylines that failed to decode (retried on the next sync)
    pub decode_failures: usize,
}

/// Fetch the full history and apply it to the stores.
pub async fn sync(
    client: &StravaClient,
    activities: &mut ActivityStore,
    tracks: &mut TrackStore,
) -> Result<SyncReport> {
    let summaries = client.fetch_all_activities().await?;
    apply_fetched(summaries, activities, tracks)
}

/// Apply an already-fetched batch of summaries to the stores.
///
/// An empty batch leaves the existing table untouched: a full history
/// fetch returning nothing is far more likely to be an upstream hiccup
/// than a genuinely emptied account, and a re-sync repairs it either way.
pub fn apply_fetched(
    summaries: Vec<StravaActivitySummary>,
    activities: &mut ActivityStore,
    tracks: &mut TrackStore,
) -> Result<SyncReport> {
    let mut report = SyncReport {
        fetched: summaries.len(),
        ..SyncReport::default()
    };

    if summaries.is_empty() {
        warn!(
            existing = activities.len(),
            "Strava returned no activities, keeping existing table"
        );
        return Ok(report);
    }

    let mut normalized = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        match normalize(summary) {
            Ok(activity) => normalized.push(activity),
            Err(e) => {
                warn!(id = summary.id, error = %e, "Skipping activity with unparseable fields");
                report.invalid_records += 1;
            }
        }
    }

    report.stored = normalized.len();
    activities.replace_all(normalized)?;

    for summary in &summaries {
        if !activities.contains(summary.id) {
            continue;
        }
        let Some(encoded) = summary.summary_polyline() else {
            continue;
        };
        if encoded.is_empty() || tracks.contains(summary.id) {
            continue;
        }

        match Track::from_polyline(encoded) {
            Ok(track) if track.is_empty() => {
                debug!(id = summary.id, "Polyline decoded to no points, nothing to store");
            }
            Ok(track) => {
                if tracks.insert(summary.id, &track)? {
                    report.new_tracks += 1;
                }
            }
            Err(e) => {
                warn!(id = summary.id, error = %e, "Failed to decode polyline, will retry next sync");
                report.decode_failures += 1;
            }
        }
    }

    info!(
        fetched = report.fetched,
        stored = report.stored,
        new_tracks = report.new_tracks,
        invalid_records = report.invalid_records,
        decode_failures = report.decode_failures,
        "Sync applied"
    );
    Ok(report)
}

/// Turn a Strava summary into a table row.
fn normalize(summary: &StravaActivitySummary) -> std::result::Result<Activity, chrono::ParseError> {
    Ok(Activity {
        id: summary.id,
        name: summary.name.clone(),
        kind: summary.kind.clone(),
        start_time_local: parse_local_timestamp(&summary.start_date_local)?,
        distance_m: summary.distance,
        moving_time_s: summary.moving_time,
        elapsed_time_s: summary.elapsed_time,
        elevation_gain_m: summary.total_elevation_gain,
    })
}
