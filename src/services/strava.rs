// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching the athlete's activity history.
//!
//! Handles:
//! - Token refresh from the long-lived refresh token
//! - Paginated listing of the full activity history
//!
//! This is a single-athlete client: credentials come from the environment
//! and every call is made on behalf of that one athlete.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::StravaCredentials;

/// Activities per page on the list endpoint (Strava's maximum).
const PER_PAGE: u32 = 200;

/// Error talking to the Strava API.
///
/// Any of these aborts the sync before the local stores are touched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Strava returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse Strava response: {0}")]
    Parse(String),
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    credentials: StravaCredentials,
}

impl StravaClient {
    /// Create a new client with OAuth credentials.
    pub fn new(credentials: StravaCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://www.strava.com/api/v3".to_string(),
            token_url: "https://www.strava.com/oauth/token".to_string(),
            credentials,
        }
    }

    /// Exchange the refresh token for a fresh access token.
    pub async fn refresh_access_token(&self) -> Result<String, FetchError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let token: TokenResponse = self.check_response_json(response).await?;
        info!("Strava access token refreshed");
        Ok(token.access_token)
    }

    /// List one page of the athlete's activities, newest first.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
    ) -> Result<Vec<StravaActivitySummary>, FetchError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("page", page.to_string()), ("per_page", PER_PAGE.to_string())])
            .send()
            .await?;

        self.check_response_json(response).await
    }

    /// Fetch the athlete's complete activity history.
    ///
    /// Refreshes the access token, then walks the list endpoint page by page
    /// until an empty page signals the end of the history.
    pub async fn fetch_all_activities(&self) -> Result<Vec<StravaActivitySummary>, FetchError> {
        let access_token = self.refresh_access_token().await?;

        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.list_activities(&access_token, page).await?;
            if batch.is_empty() {
                break;
            }
            debug!(page, count = batch.len(), "Fetched activity page");
            all.extend(batch);
            page += 1;
        }

        info!(total = all.len(), "Fetched full activity history");
        Ok(all)
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Strava rate limit hit (429)");
            }

            return Err(FetchError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Summary activity from the list endpoint.
///
/// Only the fields the pipeline consumes; everything else in the payload is
/// ignored. `start_date_local` stays a raw string here and is parsed during
/// normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivitySummary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_date_local: String,
    pub distance: f64,
    pub moving_time: u64,
    pub elapsed_time: u64,
    pub total_elevation_gain: f64,
    #[serde(default)]
    pub map: Option<StravaMap>,
}

impl StravaActivitySummary {
    /// The encoded summary polyline, if the activity has one.
    pub fn summary_polyline(&self) -> Option<&str> {
        self.map.as_ref()?.summary_polyline.as_deref()
    }
}

/// Activity map data with the summary polyline.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaMap {
    pub summary_polyline: Option<String>,
}
