//! Seams to the collaborators around the planner.
//!
//! The planner only needs coordinates for stop sequencing and two
//! idempotent writes for committing loads. Concrete adapters live in
//! `geocode` and `store`; callers may bring their own.

use crate::error::{GeocodeError, PersistenceError};
use crate::model::{Coordinates, Load, OrderStatus};

/// Resolves a place name (city, address or facility code) to coordinates.
///
/// `Ok(None)` means the place is unknown, which is not an error.
/// Implementations that call out over the network must bound each call
/// with a timeout.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Persistence for committed loads.
///
/// Every write is idempotent so that a retried call after a lost response
/// does no harm.
pub trait LoadStore: Send + Sync {
    /// Cheap probe run before a commit; failure aborts the whole run.
    fn health_check(&self) -> Result<(), PersistenceError> {
        Ok(())
    }

    /// First unused sequence number for load numbers starting with
    /// `prefix`. Stores that persist across runs must override this;
    /// the default suits stores that start empty every run.
    fn next_load_sequence(&self, _prefix: &str) -> Result<usize, PersistenceError> {
        Ok(1)
    }

    fn create_load(&self, load: &Load) -> Result<(), PersistenceError>;

    /// Set an order's status. `load_id` is the load the order is assigned
    /// to, `None` when releasing it.
    fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        load_id: Option<&str>,
    ) -> Result<(), PersistenceError>;

    /// Remove a load record created by a commit that is being rolled back.
    fn delete_load(&self, load_id: &str) -> Result<(), PersistenceError>;
}

/// Provides a straight-line distance matrix (kilometres) for a set of
/// locations, indexed by the provided location order.
pub trait DistanceMatrixProvider: Send + Sync {
    fn matrix_for(&self, locations: &[Coordinates]) -> Vec<Vec<f64>>;
}
