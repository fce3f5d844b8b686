// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! RunAtlas: a Strava running dashboard built from flat files.
//!
//! The pipeline mirrors the athlete's Strava history into a local CSV table
//! and per-activity GPX tracks, incrementally aggregates runs into per-city
//! and per-country rollups (resolving locations via Nominatim), and renders
//! the result as static HTML documents.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod time_utils;
