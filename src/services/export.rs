// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static site export.
//!
//! Renders the persisted state into three standalone HTML documents: a
//! Leaflet map with every numbered run's route, a city/country leaderboard,
//! and a sortable reverse-chronological run table. The exporter is a pure
//! view over `(activity table, track store, aggregation state)`; it never
//! mutates any of them, so it can be re-run at any time.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Activity, AggregationState, RollupTotals};
use crate::store::{write_bytes_atomic, ActivityStore, TrackStore};
use crate::time_utils::{format_hms, format_pace};

/// Map fallback view when there are no tracks to frame: central Copenhagen.
const DEFAULT_CENTER: (f64, f64) = (55.6761, 12.5683);
const DEFAULT_ZOOM: u32 = 11;

const MAP_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
  <title>Activity Map</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    html, body, #map { height: 100%; margin: 0; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
"#;

const MAP_TAIL: &str = r#"    const map = L.map('map');
    L.tileLayer('https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png', {
      maxZoom: 20,
      attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors &copy; <a href="https://carto.com/attributions">CARTO</a>'
    }).addTo(map);

    const bounds = [];
    for (const track of tracks) {
      L.polyline(track.points, {color: 'red', weight: 2.5, opacity: 1.0})
        .bindTooltip(track.tooltip)
        .addTo(map);
      bounds.push(...track.points);
    }
    if (bounds.length > 0) {
      map.fitBounds(bounds);
    } else {
      map.setView(center, zoom);
    }
  </script>
</body>
</html>
"#;

const DOC_STYLE: &str = r#"    body { font-family: Arial, sans-serif; color: #333; }
    table { width: 100%; border-collapse: collapse; margin: 20px 0; }
    th, td { padding: 12px; border: 1px solid #ddd; text-align: left; }
    th { background-color: #f4f4f4; cursor: pointer; }
    th.sort-asc::after { content: " \2191"; }
    th.sort-desc::after { content: " \2193"; }
    tr:nth-child(even) { background-color: #f9f9f9; }
    h2 { margin-top: 24px; }
"#;

/// Column sorter for the run table. Each header carries a `data-type`
/// attribute so dates and `M:SS` paces compare as values, not strings.
const SORT_SCRIPT: &str = r#"    document.addEventListener('DOMContentLoaded', () => {
      const cell = (row, idx) => row.children[idx].innerText;
      const comparer = (idx, asc, type) => (a, b) => {
        let v1 = cell(asc ? a : b, idx);
        let v2 = cell(asc ? b : a, idx);
        if (type === 'date') {
          v1 = new Date(v1);
          v2 = new Date(v2);
        } else if (type === 'pace') {
          const [m1, s1] = v1.split(':');
          const [m2, s2] = v2.split(':');
          v1 = parseInt(m1) * 60 + parseInt(s1);
          v2 = parseInt(m2) * 60 + parseInt(s2);
        } else if (!isNaN(v1) && !isNaN(v2)) {
          v1 = parseFloat(v1);
          v2 = parseFloat(v2);
        }
        return v1 > v2 ? 1 : v1 < v2 ? -1 : 0;
      };

      document.querySelectorAll('th').forEach(th => th.addEventListener('click', () => {
        const table = th.closest('table');
        const idx = Array.from(th.parentNode.children).indexOf(th);
        th.asc = !th.asc;
        Array.from(table.querySelectorAll('tr:nth-child(n+2)'))
          .sort(comparer(idx, th.asc, th.getAttribute('data-type')))
          .forEach(tr => table.appendChild(tr));
        document.querySelectorAll('th').forEach(h => h.classList.remove('sort-asc', 'sort-desc'));
        th.classList.add(th.asc ? 'sort-asc' : 'sort-desc');
      }));
    });
"#;

/// Renders the exported documents from the persisted stores and state.
pub struct Exporter<'a> {
    activities: &'a ActivityStore,
    tracks: &'a TrackStore,
    state: &'a AggregationState,
}

impl<'a> Exporter<'a> {
    pub fn new(
        activities: &'a ActivityStore,
        tracks: &'a TrackStore,
        state: &'a AggregationState,
    ) -> Self {
        Self {
            activities,
            tracks,
            state,
        }
    }

    /// Write all three documents under `site_dir`.
    pub fn write_all(&self, site_dir: &Path) -> Result<()> {
        write_bytes_atomic(
            &site_dir.join("activity_map.html"),
            self.map_document().as_bytes(),
        )?;
        write_bytes_atomic(
            &site_dir.join("leaderboard.html"),
            self.leaderboard_document().as_bytes(),
        )?;
        write_bytes_atomic(
            &site_dir.join("runs_list.html"),
            self.runs_document().as_bytes(),
        )?;

        info!(dir = %site_dir.display(), "Wrote site documents");
        Ok(())
    }

    /// The route-overlay map: one red polyline per numbered run, with a
    /// tooltip of run number, date, distance and pace.
    pub fn map_document(&self) -> String {
        let mut track_literals = Vec::new();
        for (number, activity) in self.numbered_runs() {
            let track = match self.tracks.read(activity.id) {
                Ok(track) => track,
                Err(e) => {
                    warn!(id = activity.id, error = %e, "Leaving unreadable track off the map");
                    continue;
                }
            };
            if track.is_empty() {
                continue;
            }

            let points: Vec<serde_json::Value> = track
                .points()
                .iter()
                .map(|p| serde_json::json!([p.lat, p.lon]))
                .collect();
            let tooltip = format!(
                "Run #{}<br>Date: {}<br>Total Distance: {:.3} km<br>Pace: {} min/km",
                number,
                activity.start_time_local.format("%Y-%m-%d"),
                activity.distance_km(),
                format_pace(activity.pace_s_per_km()),
            );
            track_literals.push(serde_json::json!({"points": points, "tooltip": tooltip}));
        }

        let mut html = String::from(MAP_HEAD);
        html.push_str("    const tracks = ");
        html.push_str(&serde_json::Value::Array(track_literals).to_string());
        html.push_str(";\n");
        html.push_str(&format!(
            "    const center = [{}, {}];\n    const zoom = {};\n",
            DEFAULT_CENTER.0, DEFAULT_CENTER.1, DEFAULT_ZOOM
        ));
        html.push_str(MAP_TAIL);
        html
    }

    /// The city and country leaderboard, ranked by total distance.
    pub fn leaderboard_document(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\"/>\n  <title>Leaderboard</title>\n  <style>\n",
        );
        html.push_str(DOC_STYLE);
        html.push_str("  </style>\n</head>\n<body>\n  <div class=\"city-stats\">\n");

        html.push_str("    <h2>City Statistics</h2>\n");
        for (rank, name, totals) in ranked(&self.state.city_totals) {
            html.push_str(&leaderboard_line(rank, name, totals));
        }

        html.push_str("    <br><br>\n    <h2>Country Statistics</h2>\n");
        for (rank, name, totals) in ranked(&self.state.country_totals) {
            html.push_str(&leaderboard_line(rank, name, totals));
        }

        html.push_str("  </div>\n</body>\n</html>\n");
        html
    }

    /// The reverse-chronological run table with sortable columns.
    pub fn runs_document(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\"/>\n  <title>Runs</title>\n  <style>\n",
        );
        html.push_str(DOC_STYLE);
        html.push_str("  </style>\n  <script>\n");
        html.push_str(SORT_SCRIPT);
        html.push_str("  </script>\n</head>\n<body>\n  <table>\n");
        html.push_str(
            "    <tr>\n      <th data-type=\"number\">Run Number</th>\n      <th data-type=\"date\">Date</th>\n      <th data-type=\"text\">Time</th>\n      <th data-type=\"number\">Distance (km)</th>\n      <th data-type=\"pace\">Average Pace (min/km)</th>\n    </tr>\n",
        );

        let mut rows: Vec<(usize, &Activity)> = self.numbered_runs().collect();
        rows.reverse();
        for (number, activity) in rows {
            html.push_str(&format!(
                "    <tr>\n      <td>{}</td>\n      <td>{}</td>\n      <td>{}</td>\n      <td>{:.3}</td>\n      <td>{} min/km</td>\n    </tr>\n",
                number,
                activity.start_time_local.format("%Y-%m-%d"),
                time_cell(activity),
                activity.distance_km(),
                format_pace(activity.pace_s_per_km()),
            ));
        }

        html.push_str("  </table>\n</body>\n</html>\n");
        html
    }

    /// `(run number, activity)` pairs in chronological order, skipping any
    /// sequence entry whose table row has disappeared.
    fn numbered_runs(&self) -> impl Iterator<Item = (usize, &Activity)> {
        self.state
            .run_sequence
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| Some((idx + 1, self.activities.get(*id)?)))
    }
}

fn time_cell(activity: &Activity) -> String {
    format!(
        "{} - {} (Time: {})",
        activity.start_time_local.format("%H:%M:%S"),
        activity.end_time_local().format("%H:%M:%S"),
        format_hms(activity.moving_time_s)
    )
}

fn leaderboard_line(rank: usize, name: &str, totals: &RollupTotals) -> String {
    format!(
        "    <p>{rank}. <strong>{}</strong>: {:.3} km ({} Runs)</p>\n",
        escape_html(name),
        totals.distance_km,
        totals.run_count
    )
}

/// Rollup entries ranked by distance descending; equal distances keep their
/// alphabetical order so the output is deterministic.
fn ranked(totals: &BTreeMap<String, RollupTotals>) -> impl Iterator<Item = (usize, &str, &RollupTotals)> {
    let mut entries: Vec<_> = totals.iter().collect();
    entries.sort_by(|a, b| {
        b.1.distance_km
            .partial_cmp(&a.1.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, (name, totals))| (idx + 1, name.as_str(), totals))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
