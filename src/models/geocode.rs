// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reverse-geocoding results.

use serde::{Deserialize, Serialize};

/// City and country for one coordinate, as reported by Nominatim.
///
/// Either field may be absent: mid-ocean points have neither, and rural
/// points often carry a country but no city-level place. An all-`None`
/// result is still a successful lookup and is cached like any other.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl GeocodeResult {
    pub fn new(city: Option<&str>, country: Option<&str>) -> Self {
        Self {
            city: city.map(str::to_string),
            country: country.map(str::to_string),
        }
    }
}
