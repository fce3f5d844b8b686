// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flat-file storage.
//!
//! Everything the pipeline persists lives under one data directory as plain
//! files: a CSV activity table, one GPX file per track, and JSON documents
//! for the geocode cache and the aggregation state. Writes that replace an
//! existing file go through a temp-file-then-rename step so a crash never
//! leaves a half-written file behind.

use std::path::{Path, PathBuf};

use serde::Serialize;

pub mod activities;
pub mod state_cache;
pub mod tracks;

pub use activities::ActivityStore;
pub use state_cache::StateCache;
pub use tracks::TrackStore;

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GPX error: {0}")]
    Gpx(String),
}

/// Write `bytes` to `path` atomically: write a `.tmp` sibling, then rename
/// over the destination. Creates the parent directory if needed.
pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

/// Serialize `value` as pretty-printed JSON and write it atomically.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let contents = serde_json::to_string_pretty(value)?;
    write_bytes_atomic(path, contents.as_bytes())?;
    Ok(())
}
