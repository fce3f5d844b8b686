// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reverse geocoding against Nominatim, with a persistent cache.
//!
//! Every successful lookup (including "no city, no country" results for
//! remote coordinates) is cached under the rounded coordinate and written to
//! disk immediately, so an interrupted run never repeats a lookup it already
//! paid for. Failed lookups are not cached and surface as
//! [`ResolutionError`] for the caller to defer.
//!
//! Nominatim's public instance allows at most **1 request per second**; the
//! geocoder enforces the configured minimum interval between requests.
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::GeocodeResult;
use crate::store::{write_json_atomic, StoreError};

/// Error resolving a coordinate to a location.
///
/// A resolution failure defers the affected activity; it stays unprocessed
/// and is retried on the next engine pass.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Nominatim returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to parse Nominatim response: {0}")]
    Parse(String),

    #[error("Failed to persist geocode cache: {0}")]
    Cache(#[from] StoreError),

    #[error("No cached location for {0} and geocoding is offline")]
    Offline(String),
}

/// Reverse geocoder with a write-through disk cache.
pub struct Geocoder {
    cache: BTreeMap<String, GeocodeResult>,
    cache_path: PathBuf,
    /// `None` in offline mode: cache hits only, misses error out.
    client: Option<reqwest::Client>,
    base_url: String,
    user_agent: String,
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Geocoder {
    /// Create an online geocoder, loading any existing cache from
    /// `cache_path`.
    pub fn new(
        cache_path: PathBuf,
        base_url: String,
        user_agent: String,
        min_interval: Duration,
    ) -> Self {
        Self {
            cache: load_cache(&cache_path),
            cache_path,
            client: Some(reqwest::Client::new()),
            base_url,
            user_agent,
            min_interval,
            last_request: None,
        }
    }

    /// Create an offline geocoder that only answers from the cache.
    pub fn offline(cache_path: PathBuf) -> Self {
        Self {
            cache: load_cache(&cache_path),
            cache_path,
            client: None,
            base_url: String::new(),
            user_agent: String::new(),
            min_interval: Duration::ZERO,
            last_request: None,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Seed a cache entry directly, without a network lookup.
    pub fn insert(&mut self, lat: f64, lon: f64, result: GeocodeResult) {
        self.cache.insert(cache_key(lat, lon), result);
    }

    /// Resolve a coordinate to city and country.
    ///
    /// Cache hits return immediately. Misses go to Nominatim (respecting the
    /// rate limit), and the new entry is cached and persisted before the
    /// result is returned.
    pub async fn resolve(&mut self, lat: f64, lon: f64) -> Result<GeocodeResult, ResolutionError> {
        let key = cache_key(lat, lon);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let Some(client) = self.client.clone() else {
            return Err(ResolutionError::Offline(key));
        };

        self.throttle().await;

        let response = client
            .get(format!("{}/reverse", self.base_url))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!("Nominatim rate limit hit (429)");
            }
            return Err(ResolutionError::Status(status));
        }

        let body: serde_json::Value = response.json().await?;
        let result = parse_reverse_response(&body)?;

        debug!(%key, city = ?result.city, country = ?result.country, "Resolved new location");
        self.cache.insert(key, result.clone());
        self.save_cache()?;
        Ok(result)
    }

    /// Sleep long enough to honor the minimum interval between requests.
    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let next_allowed = last + self.min_interval;
            if next_allowed > Instant::now() {
                tokio::time::sleep_until(next_allowed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    fn save_cache(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.cache_path, &self.cache)
    }
}

/// Cache key: coordinates rounded to 5 decimal places (about one meter).
fn cache_key(lat: f64, lon: f64) -> String {
    format!("{lat:.5},{lon:.5}")
}

fn load_cache(path: &Path) -> BTreeMap<String, GeocodeResult> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Geocode cache unreadable, starting empty");
                BTreeMap::new()
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Geocode cache unreadable, starting empty");
            BTreeMap::new()
        }
    }
}

/// Parse a Nominatim reverse-geocoding response.
///
/// City falls back through `city`, `town`, `village`, so smaller places
/// still land under a sensible name. A body with an `error` key is how
/// Nominatim reports "nothing here" (e.g. open water); that is a successful
/// empty result, not a failure.
fn parse_reverse_response(body: &serde_json::Value) -> Result<GeocodeResult, ResolutionError> {
    if body.get("error").is_some() {
        return Ok(GeocodeResult::default());
    }

    let Some(address) = body.get("address") else {
        return Err(ResolutionError::Parse(
            "response has neither address nor error".to_string(),
        ));
    };

    let city = ["city", "town", "village"]
        .iter()
        .find_map(|key| address[*key].as_str())
        .map(String::from);
    let country = address["country"].as_str().map(String::from);

    Ok(GeocodeResult { city, country })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_rounds_to_five_decimals() {
        assert_eq!(cache_key(55.676112, 12.568337), "55.67611,12.56834");
        assert_eq!(cache_key(55.0, -122.5), "55.00000,-122.50000");
    }

    #[test]
    fn test_parses_city_level_address() {
        let body = serde_json::json!({
            "address": {
                "road": "Langelinie",
                "city": "Copenhagen",
                "country": "Denmark",
                "country_code": "dk"
            }
        });
        let result = parse_reverse_response(&body).unwrap();
        assert_eq!(result.city.as_deref(), Some("Copenhagen"));
        assert_eq!(result.country.as_deref(), Some("Denmark"));
    }

    #[test]
    fn test_falls_back_to_town_then_village() {
        let town = serde_json::json!({
            "address": {"town": "Hillerød", "country": "Denmark"}
        });
        assert_eq!(
            parse_reverse_response(&town).unwrap().city.as_deref(),
            Some("Hillerød")
        );

        let village = serde_json::json!({
            "address": {"village": "Tisvilde", "country": "Denmark"}
        });
        assert_eq!(
            parse_reverse_response(&village).unwrap().city.as_deref(),
            Some("Tisvilde")
        );
    }

    #[test]
    fn test_country_without_city_is_kept() {
        let body = serde_json::json!({
            "address": {"county": "Highland", "country": "United Kingdom"}
        });
        let result = parse_reverse_response(&body).unwrap();
        assert_eq!(result.city, None);
        assert_eq!(result.country.as_deref(), Some("United Kingdom"));
    }

    #[test]
    fn test_unable_to_geocode_is_an_empty_result() {
        let body = serde_json::json!({"error": "Unable to geocode"});
        assert_eq!(parse_reverse_response(&body).unwrap(), GeocodeResult::default());
    }

    #[test]
    fn test_body_without_address_is_a_parse_error() {
        let body = serde_json::json!({"licence": "ODbL"});
        assert!(matches!(
            parse_reverse_response(&body),
            Err(ResolutionError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_miss_is_an_error_and_hit_is_not() {
        let dir = tempfile::tempdir().unwrap();
        let mut geocoder = Geocoder::offline(dir.path().join("geocode_cache.json"));

        assert!(matches!(
            geocoder.resolve(55.6761, 12.5683).await,
            Err(ResolutionError::Offline(_))
        ));

        geocoder.insert(55.6761, 12.5683, GeocodeResult::new(Some("Copenhagen"), Some("Denmark")));
        let result = geocoder.resolve(55.6761, 12.5683).await.unwrap();
        assert_eq!(result.city.as_deref(), Some("Copenhagen"));
    }

    #[tokio::test]
    async fn test_cache_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geocode_cache.json");

        let mut geocoder = Geocoder::offline(path.clone());
        geocoder.insert(55.6761, 12.5683, GeocodeResult::new(Some("Copenhagen"), Some("Denmark")));
        geocoder.save_cache().unwrap();

        let mut reloaded = Geocoder::offline(path);
        assert_eq!(reloaded.cache_len(), 1);
        let result = reloaded.resolve(55.6761, 12.5683).await.unwrap();
        assert_eq!(result.country.as_deref(), Some("Denmark"));
    }
}
