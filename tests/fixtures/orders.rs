//! Builder for raw order records.

use load_planner::RawOrder;

use super::cities::{Location, TORONTO};

/// Builder for test orders with sensible defaults: Pending, Standard,
/// 1,000 lbs and 100 cu.ft from Toronto.
#[derive(Clone, Debug)]
pub struct TestOrder {
    raw: RawOrder,
}

impl TestOrder {
    pub fn new(id: &str) -> Self {
        Self {
            raw: RawOrder {
                id: Some(id.to_string()),
                order_number: Some(format!("ORD-{}", id)),
                customer: Some("Acme Retail".to_string()),
                origin: Some(TORONTO.name.to_string()),
                destination: Some("Chicago, IL".to_string()),
                weight_lbs: Some(1_000.0),
                volume_cuft: Some(100.0),
                priority: Some("Standard".to_string()),
                status: Some("Pending".to_string()),
                ..RawOrder::default()
            },
        }
    }

    pub fn ships_from(mut self, origin: &Location) -> Self {
        self.raw.origin = Some(origin.name.to_string());
        self
    }

    pub fn origin(mut self, origin: &str) -> Self {
        self.raw.origin = Some(origin.to_string());
        self
    }

    pub fn ships_to(mut self, destination: &Location) -> Self {
        self.raw.destination = Some(destination.name.to_string());
        self
    }

    pub fn destination(mut self, destination: &str) -> Self {
        self.raw.destination = Some(destination.to_string());
        self
    }

    pub fn weight(mut self, lbs: f64) -> Self {
        self.raw.weight_lbs = Some(lbs);
        self
    }

    pub fn volume(mut self, cuft: f64) -> Self {
        self.raw.volume_cuft = Some(cuft);
        self
    }

    pub fn priority(mut self, priority: &str) -> Self {
        self.raw.priority = Some(priority.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.raw.status = Some(status.to_string());
        self
    }

    pub fn window(mut self, start: &str, end: &str) -> Self {
        self.raw.delivery_window_start = Some(start.to_string());
        self.raw.delivery_window_end = Some(end.to_string());
        self
    }

    pub fn must_arrive_by(mut self, deadline: &str) -> Self {
        self.raw.must_arrive_by = Some(deadline.to_string());
        self
    }

    pub fn hazmat(mut self) -> Self {
        self.raw.is_hazmat = Some(true);
        self
    }

    pub fn refrigerated(mut self) -> Self {
        self.raw.special_requirements = Some("Temperature Controlled".to_string());
        self
    }

    pub fn without_weight(mut self) -> Self {
        self.raw.weight_lbs = None;
        self
    }

    pub fn build(self) -> RawOrder {
        self.raw
    }
}

pub fn build_all(orders: Vec<TestOrder>) -> Vec<RawOrder> {
    orders.into_iter().map(TestOrder::build).collect()
}
