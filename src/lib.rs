//! load-planner
//!
//! Consolidates pending shipment orders into truck loads. Orders are
//! validated, grouped by origin and product class, packed first-fit
//! decreasing onto the smallest eligible truck, sequenced nearest-neighbor
//! and scored for utilization and savings. Loads are then committed to a
//! [`LoadStore`], one load at a time with rollback on failure.

pub mod assembler;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geocode;
pub mod grouping;
pub mod haversine;
pub mod model;
pub mod optimizer;
pub mod packer;
pub mod retry;
pub mod scoring;
pub mod sequencer;
pub mod store;
pub mod traits;
pub mod validate;

pub use cancel::CancellationToken;
pub use catalog::{TruckCatalog, TruckType};
pub use config::OptimizerConfig;
pub use error::{OptimizeError, PersistenceError, UnplannableReason, ValidationError};
pub use model::{Load, LoadPlan, PlanSummary, ReferenceData};
pub use optimizer::{OptimizeRequest, Optimizer, optimize};
pub use traits::{DistanceMatrixProvider, Geocoder, LoadStore};
pub use validate::RawOrder;
