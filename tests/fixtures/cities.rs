//! Real city coordinates for realistic test fixtures.
//!
//! Origins are the distribution centres of the Greater Toronto Area;
//! destinations are customer cities around the Great Lakes.

use load_planner::geocode::StaticGeocoder;
use load_planner::model::{Coordinates, Facility, ReferenceData};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

// ============================================================================
// Distribution centres (order origins)
// ============================================================================

pub const TORONTO: Location = Location::new("Toronto, ON", 43.6532, -79.3832);
pub const MISSISSAUGA: Location = Location::new("Mississauga, ON", 43.5890, -79.6441);
pub const BRAMPTON: Location = Location::new("Brampton, ON", 43.7315, -79.7624);

pub const ORIGINS: &[Location] = &[TORONTO, MISSISSAUGA, BRAMPTON];

// ============================================================================
// Customer cities (order destinations)
// ============================================================================

pub const BUFFALO: Location = Location::new("Buffalo, NY", 42.8864, -78.8784);
pub const DETROIT: Location = Location::new("Detroit, MI", 42.3314, -83.0458);
pub const CHICAGO: Location = Location::new("Chicago, IL", 41.8781, -87.6298);
pub const CLEVELAND: Location = Location::new("Cleveland, OH", 41.4993, -81.6944);
pub const MONTREAL: Location = Location::new("Montreal, QC", 45.5017, -73.5673);
pub const OTTAWA: Location = Location::new("Ottawa, ON", 45.4215, -75.6972);
pub const HAMILTON: Location = Location::new("Hamilton, ON", 43.2557, -79.8711);
pub const LONDON_ON: Location = Location::new("London, ON", 42.9849, -81.2453);

pub const DESTINATIONS: &[Location] = &[
    BUFFALO, DETROIT, CHICAGO, CLEVELAND, MONTREAL, OTTAWA, HAMILTON, LONDON_ON,
];

/// Geocoder that knows every fixture city.
pub fn city_geocoder() -> StaticGeocoder {
    ORIGINS
        .iter()
        .chain(DESTINATIONS)
        .map(|location| (location.name.to_string(), location.coordinates()))
        .collect()
}

/// Reference data carrying the origins as facilities, keyed by a short code.
pub fn origin_facilities() -> ReferenceData {
    let codes = ["DC-TOR", "DC-MIS", "DC-BRA"];
    ReferenceData {
        facilities: ORIGINS
            .iter()
            .zip(codes)
            .map(|(location, code)| Facility {
                code: code.to_string(),
                name: location.name.to_string(),
                coordinates: location.coordinates(),
            })
            .collect(),
        products: Vec::new(),
    }
}
