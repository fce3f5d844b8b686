// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything lives under one data directory (default `data/`): the
//! activity table, the per-activity GPX tracks, the two persisted caches,
//! and the rendered site documents. Strava credentials are optional as a
//! group so that offline commands (`export`, `--offline` runs) work
//! without them.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Nominatim's usage policy allows at most one request per second.
const MIN_GEOCODE_INTERVAL_MS: u64 = 1000;

/// Strava OAuth credentials (client + refresh token).
#[derive(Debug, Clone)]
pub struct StravaCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth credentials; `None` when none of the variables are set.
    pub strava: Option<StravaCredentials>,
    /// Root directory for all persisted data.
    pub data_dir: PathBuf,
    /// Base URL of the reverse-geocoding service.
    pub nominatim_base_url: String,
    /// User-Agent sent to the geocoding service (required by its policy).
    pub geocoder_user_agent: String,
    /// Minimum interval between external geocoding calls.
    pub geocode_min_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let data_dir = env::var("RUNATLAS_DATA_DIR").unwrap_or_else(|_| "data".to_string());

        let interval_ms = env::var("GEOCODE_MIN_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(MIN_GEOCODE_INTERVAL_MS);
        let interval_ms = if interval_ms < MIN_GEOCODE_INTERVAL_MS {
            tracing::warn!(
                configured_ms = interval_ms,
                "GEOCODE_MIN_INTERVAL_MS below the provider minimum, clamping to 1000"
            );
            MIN_GEOCODE_INTERVAL_MS
        } else {
            interval_ms
        };

        Ok(Self {
            strava: strava_credentials_from_env()?,
            data_dir: PathBuf::from(data_dir),
            nominatim_base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| format!("runatlas/{}", env!("CARGO_PKG_VERSION"))),
            geocode_min_interval: Duration::from_millis(interval_ms),
        })
    }

    /// Offline configuration rooted at the given data directory.
    ///
    /// Used by tests and by embedders that manage credentials themselves.
    pub fn for_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            strava: None,
            data_dir: data_dir.as_ref().to_path_buf(),
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent: format!("runatlas/{}", env!("CARGO_PKG_VERSION")),
            geocode_min_interval: Duration::from_millis(MIN_GEOCODE_INTERVAL_MS),
        }
    }

    /// Strava credentials or a typed error naming the first missing variable.
    pub fn require_strava(&self) -> Result<&StravaCredentials, ConfigError> {
        self.strava
            .as_ref()
            .ok_or(ConfigError::Missing("STRAVA_CLIENT_ID"))
    }

    // ─── Data Layout ─────────────────────────────────────────────

    /// Flat activity table, one CSV row per activity.
    pub fn activities_csv(&self) -> PathBuf {
        self.data_dir.join("activities.csv")
    }

    /// Directory of per-activity GPX track files.
    pub fn tracks_dir(&self) -> PathBuf {
        self.data_dir.join("tracks")
    }

    /// Persisted reverse-geocoding cache.
    pub fn geocode_cache_path(&self) -> PathBuf {
        self.data_dir.join("geocode_cache.json")
    }

    /// Persisted aggregation state.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("aggregation_state.json")
    }

    /// Output directory for the rendered HTML documents.
    pub fn site_dir(&self) -> PathBuf {
        self.data_dir.join("site")
    }
}

/// Read the Strava credential group from the environment.
///
/// All three variables are required together: none set means offline mode,
/// a partial set is a configuration mistake and fails loudly.
fn strava_credentials_from_env() -> Result<Option<StravaCredentials>, ConfigError> {
    let client_id = env::var("STRAVA_CLIENT_ID").ok();
    let client_secret = env::var("STRAVA_CLIENT_SECRET").ok();
    let refresh_token = env::var("STRAVA_REFRESH_TOKEN").ok();

    match (client_id, client_secret, refresh_token) {
        (None, None, None) => Ok(None),
        (Some(id), Some(secret), Some(token)) => Ok(Some(StravaCredentials {
            client_id: id.trim().to_string(),
            client_secret: secret.trim().to_string(),
            refresh_token: token.trim().to_string(),
        })),
        (id, secret, _) => {
            let missing = if id.is_none() {
                "STRAVA_CLIENT_ID"
            } else if secret.is_none() {
                "STRAVA_CLIENT_SECRET"
            } else {
                "STRAVA_REFRESH_TOKEN"
            };
            Err(ConfigError::Missing(missing))
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
