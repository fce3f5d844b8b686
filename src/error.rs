// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Each layer defines its own error enum (`FetchError`, `ResolutionError`,
//! `StoreError`, ...); this module folds them into one `AppError` for the
//! pipeline entry points. Per-activity failures inside the aggregation
//! engine are logged and skipped rather than surfaced here.

use crate::config::ConfigError;
use crate::services::geocoder::ResolutionError;
use crate::services::strava::FetchError;
use crate::store::StoreError;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Strava API error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] ResolutionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AppError>;
