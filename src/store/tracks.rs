// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-activity GPX track files.
//!
//! Each stored track is one file named `{activity_id}.gpx` in the tracks
//! directory. Files are written once and never rewritten: a summary
//! polyline does not change after upload, so an existing file is always
//! current. The store scans the directory a single time on open and answers
//! existence checks from that index.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::{Track, TrackPoint};
use crate::store::StoreError;

/// Index over the GPX files in one directory.
pub struct TrackStore {
    dir: PathBuf,
    known_ids: BTreeSet<u64>,
}

impl TrackStore {
    /// Open the store at `dir`, creating the directory if needed, and build
    /// the ID index from the filenames present. Files that do not look like
    /// `{id}.gpx` are ignored.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let mut known_ids = BTreeSet::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".gpx") {
                if let Ok(id) = stem.parse::<u64>() {
                    known_ids.insert(id);
                }
            }
        }

        debug!(dir = %dir.display(), tracks = known_ids.len(), "Indexed track store");
        Ok(Self { dir, known_ids })
    }

    pub fn len(&self) -> usize {
        self.known_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_ids.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.known_ids.contains(&id)
    }

    /// Stored activity IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.known_ids.iter().copied()
    }

    fn path_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.gpx"))
    }

    /// Store a track for `id` unless one already exists.
    ///
    /// Returns `true` if a new file was written, `false` if the ID was
    /// already present (the existing file is left untouched).
    pub fn insert(&mut self, id: u64, track: &Track) -> Result<bool, StoreError> {
        if self.known_ids.contains(&id) {
            return Ok(false);
        }
        std::fs::write(self.path_for(id), render_gpx(id, track))?;
        self.known_ids.insert(id);
        Ok(true)
    }

    /// Read the track stored for `id` back into point form.
    pub fn read(&self, id: u64) -> Result<Track, StoreError> {
        let file = std::fs::File::open(self.path_for(id))?;
        let gpx_data = gpx::read(std::io::BufReader::new(file))
            .map_err(|e| StoreError::Gpx(format!("{id}.gpx: {e}")))?;

        let mut points = Vec::new();
        for track in gpx_data.tracks {
            for segment in track.segments {
                for waypoint in segment.points {
                    points.push(TrackPoint {
                        lat: waypoint.point().y(),
                        lon: waypoint.point().x(),
                    });
                }
            }
        }
        Ok(Track::new(points))
    }
}

/// Render a track as a minimal GPX 1.1 document.
///
/// Coordinates are written with `{}` formatting, which round-trips `f64`
/// exactly, so a read-back track matches the decoded original bit for bit.
fn render_gpx(id: u64, track: &Track) -> String {
    let mut gpx = String::new();
    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="runatlas">"#);
    gpx.push('\n');
    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{id}</name>\n"));
    gpx.push_str("    <trkseg>\n");
    for point in track.points() {
        gpx.push_str(&format!(
            "      <trkpt lat=\"{}\" lon=\"{}\"/>\n",
            point.lat, point.lon
        ));
    }
    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");
    gpx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track() -> Track {
        Track::new(vec![
            TrackPoint {
                lat: 55.6761,
                lon: 12.5683,
            },
            TrackPoint {
                lat: 55.68014,
                lon: 12.57005,
            },
            TrackPoint {
                lat: 55.6837,
                lon: 12.5716,
            },
        ])
    }

    #[test]
    fn test_insert_then_read_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrackStore::open(dir.path()).unwrap();

        assert!(store.insert(42, &sample_track()).unwrap());
        assert!(store.contains(42));
        assert_eq!(store.read(42).unwrap(), sample_track());
    }

    #[test]
    fn test_insert_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrackStore::open(dir.path()).unwrap();

        assert!(store.insert(42, &sample_track()).unwrap());
        let different = Track::new(vec![TrackPoint { lat: 1.0, lon: 2.0 }]);
        assert!(!store.insert(42, &different).unwrap());

        // First write wins.
        assert_eq!(store.read(42).unwrap(), sample_track());
    }

    #[test]
    fn test_reopening_indexes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = TrackStore::open(dir.path()).unwrap();
            store.insert(7, &sample_track()).unwrap();
            store.insert(3, &sample_track()).unwrap();
        }

        let store = TrackStore::open(dir.path()).unwrap();
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![3, 7]);
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        std::fs::write(dir.path().join("abc.gpx"), "not an id").unwrap();

        let store = TrackStore::open(dir.path()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_unparseable_gpx_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("5.gpx"), "<gpx><oops").unwrap();

        let store = TrackStore::open(dir.path()).unwrap();
        assert!(store.contains(5));
        assert!(matches!(store.read(5), Err(StoreError::Gpx(_))));
    }
}
