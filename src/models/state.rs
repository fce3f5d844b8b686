// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted aggregation state.
//!
//! [`AggregationState`] is the engine's cache: everything derived from
//! already-processed runs, written back after each engine pass so the next
//! pass only has to look at new activities. All collections are ordered so
//! the serialized form is byte-identical across runs with the same content.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Activity, GeocodeResult};

/// Accumulated totals for one rollup key (a city or a country).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RollupTotals {
    /// Total distance in kilometers
    pub distance_km: f64,
    /// Number of runs contributing to the total
    pub run_count: u32,
}

impl RollupTotals {
    fn add_run(&mut self, distance_km: f64) {
        self.distance_km += distance_km;
        self.run_count += 1;
    }
}

/// Everything the aggregation engine has derived so far.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationState {
    /// IDs of activities whose contribution is already folded in
    #[serde(default)]
    pub processed_ids: BTreeSet<u64>,
    /// Distance and run count per city name
    #[serde(default)]
    pub city_totals: BTreeMap<String, RollupTotals>,
    /// Distance and run count per country name
    #[serde(default)]
    pub country_totals: BTreeMap<String, RollupTotals>,
    /// Run activity IDs in chronological order (run number = index + 1)
    #[serde(default)]
    pub run_sequence: Vec<u64>,
}

impl AggregationState {
    pub fn is_processed(&self, id: u64) -> bool {
        self.processed_ids.contains(&id)
    }

    /// Fold one resolved run into the rollups.
    ///
    /// Returns `true` if the run was new and the totals changed, `false` if
    /// the ID was already processed (in which case nothing is touched, so
    /// replaying the same run is harmless).
    pub fn record_run(&mut self, activity: &Activity, location: &GeocodeResult) -> bool {
        if !self.processed_ids.insert(activity.id) {
            return false;
        }

        let km = activity.distance_km();
        if let Some(city) = &location.city {
            self.city_totals.entry(city.clone()).or_default().add_run(km);
        }
        if let Some(country) = &location.country {
            self.country_totals
                .entry(country.clone())
                .or_default()
                .add_run(km);
        }
        true
    }

    /// Rebuild the chronological run numbering from scratch.
    ///
    /// `runs` holds `(id, start_time_local)` for every run that belongs in
    /// the sequence. Ordering is by start time, ties broken by ID, so a
    /// backfilled older run shifts every later run's number up by one.
    pub fn reconcile_run_sequence(&mut self, mut runs: Vec<(u64, NaiveDateTime)>) {
        runs.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        self.run_sequence = runs.into_iter().map(|(id, _)| id).collect();
    }

    /// 1-based run number of an activity, if it is in the sequence.
    pub fn run_number(&self, id: u64) -> Option<usize> {
        self.run_sequence.iter().position(|&r| r == id).map(|i| i + 1)
    }
}
