// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The flat CSV activity table.
//!
//! One row per activity, keyed by Strava ID, headers matching the
//! [`Activity`] field names. The whole table is replaced on every sync;
//! there is no row-level update path.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::Activity;
use crate::store::{write_bytes_atomic, StoreError};

/// In-memory view of the activity table, backed by one CSV file.
pub struct ActivityStore {
    path: PathBuf,
    by_id: BTreeMap<u64, Activity>,
}

impl ActivityStore {
    /// Open the table at `path`, loading every row. A missing file is an
    /// empty table; a malformed row is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut by_id = BTreeMap::new();

        match std::fs::File::open(&path) {
            Ok(file) => {
                let mut reader = csv::Reader::from_reader(file);
                for row in reader.deserialize() {
                    let activity: Activity = row?;
                    by_id.insert(activity.id, activity);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        debug!(path = %path.display(), rows = by_id.len(), "Loaded activity table");
        Ok(Self { path, by_id })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Activity> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// All activities in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.by_id.values()
    }

    /// Replace the whole table with `activities` and persist it.
    ///
    /// Later entries win on duplicate IDs. The file is written atomically,
    /// and the in-memory view only changes once the write succeeded.
    pub fn replace_all(&mut self, activities: Vec<Activity>) -> Result<(), StoreError> {
        let mut by_id = BTreeMap::new();
        for activity in activities {
            by_id.insert(activity.id, activity);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for activity in by_id.values() {
            writer.serialize(activity)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;
        write_bytes_atomic(&self.path, &bytes)?;

        debug!(path = %self.path.display(), rows = by_id.len(), "Replaced activity table");
        self.by_id = by_id;
        Ok(())
    }
}
