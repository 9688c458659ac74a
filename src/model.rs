//! Domain model for load planning.
//!
//! Validated orders flow in, loads and a load plan flow out. Everything
//! here is plain data; the behavior lives in the pipeline modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{UnplannableReason, ValidationError};

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Order priority. Expedited stops are visited first on distance ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Expedited,
    #[default]
    Standard,
    Low,
}

impl Priority {
    /// Parse a priority label, accepting the labels used by order sources.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "expedited" | "high" | "urgent" => Some(Priority::Expedited),
            "standard" | "normal" => Some(Priority::Standard),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Sequencing rank, lower goes first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Expedited => 0,
            Priority::Standard => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Assigned,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "assigned" => Some(OrderStatus::Assigned),
            "in transit" | "in_transit" => Some(OrderStatus::InTransit),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Assigned => "Assigned",
            OrderStatus::InTransit => "In Transit",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

/// Inclusive delivery window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DeliveryWindow {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &DeliveryWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersect(&self, other: &DeliveryWindow) -> Option<DeliveryWindow> {
        if !self.overlaps(other) {
            return None;
        }
        Some(DeliveryWindow {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }
}

/// A validated order, ready for grouping and packing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub order_number: Option<String>,
    pub customer: Option<String>,
    pub origin: String,
    pub destination: String,
    pub weight_lbs: f64,
    pub volume_cuft: f64,
    pub priority: Priority,
    pub delivery_window: Option<DeliveryWindow>,
    pub must_arrive_by: Option<DateTime<Utc>>,
    pub hazmat: bool,
    pub temperature_controlled: bool,
    pub status: OrderStatus,
    /// Position of the source record in the caller's input.
    pub input_index: usize,
}

impl Order {
    /// Hard arrival deadline: explicit deadline, else the window end.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.must_arrive_by
            .or_else(|| self.delivery_window.map(|window| window.end))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub code: String,
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    #[serde(default)]
    pub is_hazmat: bool,
    #[serde(default)]
    pub requires_refrigeration: bool,
}

/// Facility and product metadata supplied alongside the orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub facilities: Vec<Facility>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ReferenceData {
    /// Find a facility by code or name, case-insensitively.
    pub fn facility(&self, place: &str) -> Option<&Facility> {
        let place = place.trim();
        self.facilities.iter().find(|facility| {
            facility.code.eq_ignore_ascii_case(place) || facility.name.eq_ignore_ascii_case(place)
        })
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|product| product.product_id == product_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    Planning,
    Dispatched,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Planning => "Planning",
            LoadStatus::Dispatched => "Dispatched",
            LoadStatus::InTransit => "In Transit",
            LoadStatus::Delivered => "Delivered",
        }
    }
}

/// Which capacity dimension limits a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingConstraint {
    Weight,
    Volume,
}

/// An order as it appears on a load, with its stop position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadOrder {
    pub id: String,
    pub order_number: Option<String>,
    pub customer: Option<String>,
    pub origin: String,
    pub destination: String,
    pub weight_lbs: f64,
    pub volume_cuft: f64,
    pub priority: Priority,
    pub stop_sequence: usize,
    pub status: OrderStatus,
}

impl LoadOrder {
    pub fn from_order(order: &Order, stop_sequence: usize) -> Self {
        Self {
            id: order.id.clone(),
            order_number: order.order_number.clone(),
            customer: order.customer.clone(),
            origin: order.origin.clone(),
            destination: order.destination.clone(),
            weight_lbs: order.weight_lbs,
            volume_cuft: order.volume_cuft,
            priority: order.priority,
            stop_sequence,
            status: order.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    pub load_id: String,
    pub truck_type: String,
    pub origin: String,
    pub orders: Vec<LoadOrder>,
    pub total_weight_lbs: f64,
    pub total_volume_cuft: f64,
    pub utilization_percent: f64,
    pub binding_constraint: BindingConstraint,
    pub savings_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_distance_km: Option<f64>,
    pub must_arrive_by: Option<DateTime<Utc>>,
    pub must_pick_up_by: Option<DateTime<Utc>>,
    pub reasoning: String,
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Load {
    pub fn order_ids(&self) -> impl Iterator<Item = &str> {
        self.orders.iter().map(|order| order.id.as_str())
    }

    pub(crate) fn set_order_status(&mut self, status: OrderStatus) {
        for order in &mut self.orders {
            order.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub total_orders: usize,
    pub total_loads: usize,
    pub avg_utilization: f64,
    pub cost_savings_percent: f64,
}

/// A raw record excluded by validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedOrder {
    pub index: usize,
    pub order_id: Option<String>,
    pub field: &'static str,
    pub reason: String,
    #[serde(skip)]
    pub error: ValidationError,
}

impl SkippedOrder {
    pub fn new(index: usize, order_id: Option<String>, error: ValidationError) -> Self {
        Self {
            index,
            order_id,
            field: error.field(),
            reason: error.to_string(),
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnplannableOrder {
    pub order_id: String,
    pub weight_lbs: f64,
    pub volume_cuft: f64,
    pub reason: UnplannableReason,
}

/// A load whose commit failed; its orders are back to Pending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedLoad {
    pub load: Load,
    pub error: String,
}

/// The result of one planning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadPlan {
    pub summary: PlanSummary,
    pub loads: Vec<Load>,
    pub skipped: Vec<SkippedOrder>,
    pub unplannable: Vec<UnplannableOrder>,
    pub failed_loads: Vec<FailedLoad>,
    pub unprocessed: Vec<String>,
    pub cancelled: bool,
}

impl LoadPlan {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// All order ids placed on committed loads, in plan order.
    pub fn assigned_order_ids(&self) -> Vec<&str> {
        self.loads.iter().flat_map(|load| load.order_ids()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_priority_parse_accepts_source_labels() {
        assert_eq!(Priority::parse("High"), Some(Priority::Expedited));
        assert_eq!(Priority::parse(" normal "), Some(Priority::Standard));
        assert_eq!(Priority::parse("EXPEDITED"), Some(Priority::Expedited));
        assert_eq!(Priority::parse("Low"), Some(Priority::Low));
        assert_eq!(Priority::parse("whenever"), None);
    }

    #[test]
    fn test_window_rejects_inverted() {
        assert!(DeliveryWindow::new(at(10), at(8)).is_none());
        assert!(DeliveryWindow::new(at(8), at(8)).is_some());
    }

    #[test]
    fn test_window_intersection() {
        let a = DeliveryWindow::new(at(8), at(12)).unwrap();
        let b = DeliveryWindow::new(at(10), at(16)).unwrap();
        let c = DeliveryWindow::new(at(13), at(16)).unwrap();

        assert_eq!(a.intersect(&b), DeliveryWindow::new(at(10), at(12)));
        assert!(a.intersect(&c).is_none());
        // Touching windows overlap at the boundary
        let d = DeliveryWindow::new(at(12), at(14)).unwrap();
        assert!(a.overlaps(&d));
    }

    #[test]
    fn test_reference_facility_lookup() {
        let reference = ReferenceData {
            facilities: vec![Facility {
                code: "TOR-DC".into(),
                name: "Toronto, ON".into(),
                coordinates: Coordinates::new(43.6532, -79.3832),
            }],
            products: Vec::new(),
        };
        assert!(reference.facility("tor-dc").is_some());
        assert!(reference.facility("Toronto, ON").is_some());
        assert!(reference.facility("Ottawa, ON").is_none());
    }

    #[test]
    fn test_status_serializes_with_space() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"In Transit\"");
    }
}
