// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data model types shared across the pipeline.

pub mod activity;
pub mod geocode;
pub mod state;
pub mod track;

pub use activity::{Activity, ACTIVITY_TYPE_RUN};
pub use geocode::GeocodeResult;
pub use state::{AggregationState, RollupTotals};
pub use track::{DecodeError, Track, TrackPoint};
