//! Stop sequencing within a load.
//!
//! Nearest-neighbor from the origin over straight-line distances. This is
//! a heuristic: it gives a reasonable, deterministic stop order for display
//! and dispatch, not a minimal tour. Distance ties go to the higher
//! priority, then to the earlier input position.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::GeocodeError;
use crate::model::{Coordinates, Order, ReferenceData};
use crate::retry::RetryPolicy;
use crate::traits::{DistanceMatrixProvider, Geocoder};

#[derive(Debug, Clone, PartialEq)]
pub struct Sequencing {
    /// Orders in visiting order.
    pub orders: Vec<Order>,
    /// Origin to last stop, when coordinates were available.
    pub route_distance_km: Option<f64>,
    pub warnings: Vec<String>,
}

/// Resolves places from reference facilities first, then the geocoder.
pub struct StopLocator<'a, G: Geocoder> {
    reference: &'a ReferenceData,
    geocoder: &'a G,
    retry: &'a RetryPolicy,
}

impl<'a, G: Geocoder> StopLocator<'a, G> {
    pub fn new(reference: &'a ReferenceData, geocoder: &'a G, retry: &'a RetryPolicy) -> Self {
        Self {
            reference,
            geocoder,
            retry,
        }
    }

    pub fn locate(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        if let Some(facility) = self.reference.facility(place) {
            return Ok(Some(facility.coordinates));
        }
        self.retry.run("geocode", || self.geocoder.geocode(place))
    }
}

/// Order the stops of one load.
pub fn sequence_load<G, M>(
    origin: &str,
    mut orders: Vec<Order>,
    locator: &StopLocator<'_, G>,
    matrix_provider: &M,
) -> Sequencing
where
    G: Geocoder,
    M: DistanceMatrixProvider,
{
    orders.sort_by_key(|order| order.input_index);

    let mut destinations: Vec<String> = Vec::new();
    let mut destination_index: HashMap<String, usize> = HashMap::new();
    for order in &orders {
        let key = place_key(&order.destination);
        if !destination_index.contains_key(&key) {
            destination_index.insert(key.clone(), destinations.len());
            destinations.push(order.destination.clone());
        }
    }

    if destinations.len() < 2 {
        orders.sort_by_key(|order| (order.priority.rank(), order.input_index));
        return Sequencing {
            orders,
            route_distance_km: None,
            warnings: Vec::new(),
        };
    }

    let mut locations = Vec::with_capacity(destinations.len() + 1);
    let mut warnings = Vec::new();
    for place in std::iter::once(origin).chain(destinations.iter().map(String::as_str)) {
        match locator.locate(place) {
            Ok(Some(coordinates)) => locations.push(coordinates),
            Ok(None) => warnings.push(format!("no coordinates for `{}`; stops kept in input order", place)),
            Err(err) => warnings.push(format!("geocoding `{}` failed: {}; stops kept in input order", place, err)),
        }
    }

    if !warnings.is_empty() {
        for warning in &warnings {
            tracing::warn!(origin, "{}", warning);
        }
        return Sequencing {
            orders,
            route_distance_km: None,
            warnings,
        };
    }

    let matrix = matrix_provider.matrix_for(&locations);
    let size = locations.len();
    if matrix.len() != size || matrix.iter().any(|row| row.len() != size) {
        let warning = format!(
            "distance matrix has {} rows for {} locations; stops kept in input order",
            matrix.len(),
            size
        );
        tracing::warn!(origin, "{}", warning);
        return Sequencing {
            orders,
            route_distance_km: None,
            warnings: vec![warning],
        };
    }
    // Location index of each order: 0 is the origin, destinations follow.
    let stop_of = |order: &Order| destination_index[&place_key(&order.destination)] + 1;

    let mut remaining: Vec<Order> = orders;
    let mut sequence: Vec<Order> = Vec::with_capacity(remaining.len());
    let mut current = 0;
    let mut total_km = 0.0;

    while !remaining.is_empty() {
        let mut best = 0;
        for candidate in 1..remaining.len() {
            let ordering = compare_stops(&remaining[candidate], &remaining[best], |order| {
                matrix[current][stop_of(order)]
            });
            if ordering == Ordering::Less {
                best = candidate;
            }
        }

        let next = remaining.remove(best);
        let stop = stop_of(&next);
        total_km += matrix[current][stop];
        current = stop;
        sequence.push(next);
    }

    tracing::debug!(origin, stops = sequence.len(), route_km = total_km, "sequenced load");

    Sequencing {
        orders: sequence,
        route_distance_km: Some(total_km),
        warnings: Vec::new(),
    }
}

fn compare_stops<F>(a: &Order, b: &Order, distance: F) -> Ordering
where
    F: Fn(&Order) -> f64,
{
    distance(a)
        .total_cmp(&distance(b))
        .then(a.priority.rank().cmp(&b.priority.rank()))
        .then(a.input_index.cmp(&b.input_index))
}

fn place_key(place: &str) -> String {
    place.trim().to_lowercase()
}
