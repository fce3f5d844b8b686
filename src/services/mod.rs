// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service layer: the Strava client, sync, geocoding, aggregation, export.

pub mod engine;
pub mod export;
pub mod geocoder;
pub mod strava;
pub mod sync;

pub use engine::{AggregationEngine, EngineOutcome};
pub use export::Exporter;
pub use geocoder::Geocoder;
pub use strava::StravaClient;
pub use sync::SyncReport;
