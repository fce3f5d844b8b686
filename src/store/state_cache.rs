// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence for the aggregation state.
//!
//! The state lives in one JSON document. Because [`AggregationState`] uses
//! ordered collections throughout, saving the same logical state always
//! produces the same bytes, which makes "nothing changed" runs visible as
//! unchanged files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::AggregationState;
use crate::store::{write_json_atomic, StoreError};

/// Handle on the aggregation state file.
pub struct StateCache {
    path: PathBuf,
}

impl StateCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the persisted state. `Ok(None)` if no state has been saved yet;
    /// an unreadable or unparseable file is an error.
    pub fn load(&self) -> Result<Option<AggregationState>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the persisted state, recovering from a missing or corrupt file
    /// by starting over from the empty state. Recovery costs one full
    /// re-aggregation pass, never lost data: every input is still on disk.
    pub fn load_or_default(&self) -> AggregationState {
        match self.load() {
            Ok(Some(state)) => {
                debug!(
                    path = %self.path.display(),
                    processed = state.processed_ids.len(),
                    "Loaded aggregation state"
                );
                state
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No aggregation state yet, starting empty");
                AggregationState::default()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Aggregation state unreadable, rebuilding from empty"
                );
                AggregationState::default()
            }
        }
    }

    /// Persist `state` atomically.
    pub fn save(&self, state: &AggregationState) -> Result<(), StoreError> {
        write_json_atomic(&self.path, state)?;
        debug!(
            path = %self.path.display(),
            processed = state.processed_ids.len(),
            "Saved aggregation state"
        );
        Ok(())
    }

    /// Delete the persisted state so the next pass starts from scratch.
    pub fn reset(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, GeocodeResult};
    use chrono::NaiveDate;

    fn sample_state() -> AggregationState {
        let mut state = AggregationState::default();
        let activity = Activity {
            id: 11,
            name: "Harbor Loop".to_string(),
            kind: "Run".to_string(),
            start_time_local: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            distance_m: 7123.4,
            moving_time_s: 2400,
            elapsed_time_s: 2500,
            elevation_gain_m: 31.0,
        };
        state.record_run(
            &activity,
            &GeocodeResult::new(Some("Copenhagen"), Some("Denmark")),
        );
        state.reconcile_run_sequence(vec![(11, activity.start_time_local)]);
        state
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StateCache::new(dir.path().join("state.json"));
        assert!(cache.load().unwrap().is_none());
        assert_eq!(cache.load_or_default(), AggregationState::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StateCache::new(dir.path().join("state.json"));

        let state = sample_state();
        cache.save(&state).unwrap();
        assert_eq!(cache.load().unwrap().unwrap(), state);
    }

    #[test]
    fn test_reload_and_resave_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let cache = StateCache::new(&path);

        cache.save(&sample_state()).unwrap();
        let first = std::fs::read(&path).unwrap();

        let reloaded = cache.load().unwrap().unwrap();
        cache.save(&reloaded).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_file_errors_on_load_but_recovers_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let cache = StateCache::new(&path);
        assert!(cache.load().is_err());
        assert_eq!(cache.load_or_default(), AggregationState::default());
    }

    #[test]
    fn test_reset_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let cache = StateCache::new(&path);

        cache.save(&sample_state()).unwrap();
        cache.reset().unwrap();
        assert!(!path.exists());

        // Resetting twice is fine.
        cache.reset().unwrap();
    }
}
