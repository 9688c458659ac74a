//! Geocoder adapters.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::GeocodeError;
use crate::model::Coordinates;
use crate::traits::Geocoder;

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("load-planner/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

/// Nominatim-compatible HTTP geocoder (`GET /search?q=..&format=json`).
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    config: GeocoderConfig,
    client: reqwest::blocking::Client,
}

impl HttpGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }
}

impl Geocoder for HttpGeocoder {
    fn geocode(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let places: Vec<SearchResult> = response.json()?;
        match places.into_iter().next() {
            Some(result) => result.coordinates().map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

impl SearchResult {
    fn coordinates(&self) -> Result<Coordinates, GeocodeError> {
        let lat = self
            .lat
            .parse::<f64>()
            .map_err(|_| GeocodeError::Malformed(format!("latitude `{}`", self.lat)))?;
        let lng = self
            .lon
            .parse::<f64>()
            .map_err(|_| GeocodeError::Malformed(format!("longitude `{}`", self.lon)))?;
        Ok(Coordinates::new(lat, lng))
    }
}

/// Fixed lookup table, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, Coordinates>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, place: &str, coordinates: Coordinates) -> Self {
        self.insert(place, coordinates);
        self
    }

    pub fn insert(&mut self, place: &str, coordinates: Coordinates) {
        self.places.insert(normalize(place), coordinates);
    }
}

impl FromIterator<(String, Coordinates)> for StaticGeocoder {
    fn from_iter<I: IntoIterator<Item = (String, Coordinates)>>(iter: I) -> Self {
        let mut geocoder = StaticGeocoder::new();
        for (place, coordinates) in iter {
            geocoder.insert(&place, coordinates);
        }
        geocoder
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        Ok(self.places.get(&normalize(place)).copied())
    }
}

/// Knows no places; sequencing then relies on reference facilities only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn geocode(&self, _place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        Ok(None)
    }
}

fn normalize(place: &str) -> String {
    place.trim().to_lowercase()
}
