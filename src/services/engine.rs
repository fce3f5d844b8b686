// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The incremental aggregation engine.
//!
//! One pass loads the persisted state, selects the runs that have a stored
//! track but no folded-in contribution yet, resolves each one's midpoint to
//! a city and country, folds it into the rollups, rebuilds the
//! chronological run numbering, and persists the result. Activities whose
//! geocode fails are deferred: they stay out of `processed_ids` and are
//! picked up again on the next pass.
//!
//! Passes are idempotent. Running the engine twice over the same inputs
//! leaves the persisted state byte for byte unchanged.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::AggregationState;
use crate::services::geocoder::Geocoder;
use crate::store::{ActivityStore, StateCache, TrackStore};

/// What one engine pass did.
#[derive(Debug)]
pub struct EngineOutcome {
    /// The state as persisted at the end of the pass
    pub state: AggregationState,
    /// Runs newly folded into the totals
    pub processed: usize,
    /// Runs left unprocessed because geocoding failed
    pub deferred: usize,
    /// Runs left unprocessed because the stored track was unusable
    pub skipped: usize,
}

/// Incremental aggregation over the local stores.
pub struct AggregationEngine<'a> {
    activities: &'a ActivityStore,
    tracks: &'a TrackStore,
    geocoder: &'a mut Geocoder,
    cache: &'a StateCache,
}

impl<'a> AggregationEngine<'a> {
    pub fn new(
        activities: &'a ActivityStore,
        tracks: &'a TrackStore,
        geocoder: &'a mut Geocoder,
        cache: &'a StateCache,
    ) -> Self {
        Self {
            activities,
            tracks,
            geocoder,
            cache,
        }
    }

    /// Run one incremental pass on top of the persisted state.
    pub async fn run(&mut self) -> Result<EngineOutcome> {
        let state = self.cache.load_or_default();
        self.run_from(state).await
    }

    /// Discard the persisted state and re-aggregate everything.
    ///
    /// The geocode cache is kept, so a rebuild is cheap: it replays the fold
    /// without repeating the network lookups.
    pub async fn rebuild(&mut self) -> Result<EngineOutcome> {
        info!("Rebuilding aggregation state from scratch");
        self.cache.reset()?;
        self.run_from(AggregationState::default()).await
    }

    async fn run_from(&mut self, mut state: AggregationState) -> Result<EngineOutcome> {
        let delta = self.select_delta(&state);
        debug!(candidates = delta.len(), "Selected unprocessed runs");

        let mut processed = 0usize;
        let mut deferred = 0usize;
        let mut skipped = 0usize;

        for id in delta {
            let Some(activity) = self.activities.get(id) else {
                continue;
            };

            let track = match self.tracks.read(id) {
                Ok(track) => track,
                Err(e) => {
                    warn!(id, error = %e, "Stored track unreadable, skipping");
                    skipped += 1;
                    continue;
                }
            };
            let Some(midpoint) = track.midpoint() else {
                warn!(id, "Stored track has no points, skipping");
                skipped += 1;
                continue;
            };

            match self.geocoder.resolve(midpoint.lat, midpoint.lon).await {
                Ok(location) => {
                    if state.record_run(activity, &location) {
                        processed += 1;
                    }
                }
                Err(e) => {
                    warn!(id, error = %e, "Geocoding failed, deferring run");
                    deferred += 1;
                }
            }
        }

        self.reconcile(&mut state);
        self.cache.save(&state)?;

        info!(
            processed,
            deferred,
            skipped,
            total_processed = state.processed_ids.len(),
            runs = state.run_sequence.len(),
            "Aggregation pass complete"
        );

        Ok(EngineOutcome {
            state,
            processed,
            deferred,
            skipped,
        })
    }

    /// Runs with a stored track whose contribution is not folded in yet,
    /// in ascending ID order.
    fn select_delta(&self, state: &AggregationState) -> Vec<u64> {
        self.activities
            .iter()
            .filter(|a| a.is_run() && self.tracks.contains(a.id) && !state.is_processed(a.id))
            .map(|a| a.id)
            .collect()
    }

    /// Rebuild the run numbering over every run with a stored track.
    ///
    /// Numbering is independent of geocoding: a deferred run still holds its
    /// chronological slot, so its number does not change once its location
    /// resolves.
    fn reconcile(&self, state: &mut AggregationState) {
        let runs = self
            .activities
            .iter()
            .filter(|a| a.is_run() && self.tracks.contains(a.id))
            .map(|a| (a.id, a.start_time_local))
            .collect();
        state.reconcile_run_sequence(runs);
    }
}
