//! Stop sequencing tests with real city coordinates.

mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use fixtures::*;
use load_planner::error::GeocodeError;
use load_planner::geocode::StaticGeocoder;
use load_planner::haversine::HaversineMatrix;
use load_planner::model::{Coordinates, Order, ReferenceData};
use load_planner::retry::RetryPolicy;
use load_planner::sequencer::{Sequencing, StopLocator, sequence_load};
use load_planner::validate::validate_batch;
use load_planner::{DistanceMatrixProvider, Geocoder};

// ============================================================================
// Test Geocoders
// ============================================================================

/// Fails every lookup, counting attempts.
#[derive(Default)]
struct FailingGeocoder {
    attempts: AtomicUsize,
}

impl Geocoder for FailingGeocoder {
    fn geocode(&self, _place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(GeocodeError::Status(503))
    }
}

/// Returns a matrix one row short of the locations asked for.
struct TruncatedMatrix;

impl DistanceMatrixProvider for TruncatedMatrix {
    fn matrix_for(&self, locations: &[Coordinates]) -> Vec<Vec<f64>> {
        let n = locations.len().saturating_sub(1);
        vec![vec![1.0; n]; n]
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn orders(batch: Vec<TestOrder>) -> Vec<Order> {
    validate_batch(&build_all(batch), &ReferenceData::default(), None).orders
}

fn sequence_with<G: Geocoder>(
    geocoder: &G,
    reference: &ReferenceData,
    retry: &RetryPolicy,
    origin: &str,
    batch: Vec<TestOrder>,
) -> Sequencing {
    let locator = StopLocator::new(reference, geocoder, retry);
    sequence_load(origin, orders(batch), &locator, &HaversineMatrix)
}

fn ids(sequencing: &Sequencing) -> Vec<&str> {
    sequencing.orders.iter().map(|o| o.id.as_str()).collect()
}

// ============================================================================
// Nearest neighbor
// ============================================================================

#[test]
fn test_nearest_neighbor_from_toronto() {
    let result = sequence_with(
        &city_geocoder(),
        &ReferenceData::default(),
        &RetryPolicy::none(),
        TORONTO.name,
        vec![
            TestOrder::new("montreal").ships_to(&MONTREAL),
            TestOrder::new("hamilton").ships_to(&HAMILTON),
            TestOrder::new("ottawa").ships_to(&OTTAWA),
        ],
    );

    // Hamilton is next door; Ottawa lies on the way to Montreal.
    assert_eq!(ids(&result), vec!["hamilton", "ottawa", "montreal"]);
    assert!(result.warnings.is_empty());
    let km = result.route_distance_km.unwrap();
    assert!(km > 600.0 && km < 680.0, "unexpected route length {}", km);
}

#[test]
fn test_shared_destination_visited_together() {
    let result = sequence_with(
        &city_geocoder(),
        &ReferenceData::default(),
        &RetryPolicy::none(),
        TORONTO.name,
        vec![
            TestOrder::new("det-1").ships_to(&DETROIT),
            TestOrder::new("lon").ships_to(&LONDON_ON),
            TestOrder::new("det-2").ships_to(&DETROIT).priority("Expedited"),
        ],
    );

    // Same stop: the expedited order is unloaded first.
    assert_eq!(ids(&result), vec!["lon", "det-2", "det-1"]);
}

#[test]
fn test_origin_resolved_from_facility_code() {
    let geocoder = StaticGeocoder::new()
        .with_place(BUFFALO.name, BUFFALO.coordinates())
        .with_place(CLEVELAND.name, CLEVELAND.coordinates());

    let result = sequence_with(
        &geocoder,
        &origin_facilities(),
        &RetryPolicy::none(),
        "DC-TOR",
        vec![
            TestOrder::new("cle").origin("DC-TOR").ships_to(&CLEVELAND),
            TestOrder::new("buf").origin("DC-TOR").ships_to(&BUFFALO),
        ],
    );

    assert_eq!(ids(&result), vec!["buf", "cle"]);
    assert!(result.route_distance_km.is_some());
}

#[test]
fn test_single_stop_needs_no_coordinates() {
    let result = sequence_with(
        &StaticGeocoder::new(),
        &ReferenceData::default(),
        &RetryPolicy::none(),
        "Nowhere",
        vec![
            TestOrder::new("std").destination("Somewhere"),
            TestOrder::new("low").destination("Somewhere").priority("Low"),
            TestOrder::new("exp").destination("somewhere").priority("Expedited"),
        ],
    );

    assert_eq!(ids(&result), vec!["exp", "std", "low"]);
    assert!(result.warnings.is_empty());
    assert!(result.route_distance_km.is_none());
}

// ============================================================================
// Fallback
// ============================================================================

#[test]
fn test_unknown_destination_falls_back_to_input_order() {
    let result = sequence_with(
        &city_geocoder(),
        &ReferenceData::default(),
        &RetryPolicy::none(),
        TORONTO.name,
        vec![
            TestOrder::new("chi").ships_to(&CHICAGO),
            TestOrder::new("mystery").destination("Atlantis"),
            TestOrder::new("buf").ships_to(&BUFFALO),
        ],
    );

    assert_eq!(ids(&result), vec!["chi", "mystery", "buf"]);
    assert!(result.route_distance_km.is_none());
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("Atlantis"));
}

#[test]
fn test_geocoder_failure_retried_then_reported() {
    let geocoder = FailingGeocoder::default();
    let retry = RetryPolicy {
        max_retries: 2,
        initial_backoff_ms: 1,
        backoff_factor: 1,
    };

    let result = sequence_with(
        &geocoder,
        &ReferenceData::default(),
        &retry,
        TORONTO.name,
        vec![
            TestOrder::new("chi").ships_to(&CHICAGO),
            TestOrder::new("buf").ships_to(&BUFFALO),
        ],
    );

    assert_eq!(ids(&result), vec!["chi", "buf"]);
    // Origin plus two destinations, three attempts each.
    assert_eq!(geocoder.attempts.load(Ordering::SeqCst), 9);
    assert_eq!(result.warnings.len(), 3);
    assert!(result.warnings.iter().all(|w| w.contains("503")));
}

#[test]
fn test_misshapen_matrix_falls_back_to_input_order() {
    let geocoder = city_geocoder();
    let reference = ReferenceData::default();
    let retry = RetryPolicy::none();
    let locator = StopLocator::new(&reference, &geocoder, &retry);

    let result = sequence_load(
        TORONTO.name,
        orders(vec![
            TestOrder::new("chi").ships_to(&CHICAGO),
            TestOrder::new("buf").ships_to(&BUFFALO),
        ]),
        &locator,
        &TruncatedMatrix,
    );

    assert_eq!(ids(&result), vec!["chi", "buf"]);
    assert!(result.route_distance_km.is_none());
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("distance matrix"));
}
