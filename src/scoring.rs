//! Utilization and consolidation-savings scoring.
//!
//! The savings figures are a fixed business heuristic, not a cost model:
//! each order beyond the first on a truck counts for 15 points, capped at
//! 50. Downstream displays depend on the exact numbers.

use crate::catalog::TruckType;
use crate::model::{BindingConstraint, Load, PlanSummary};

const SAVINGS_PER_EXTRA_STOP: f64 = 15.0;
const SAVINGS_CAP: f64 = 50.0;

/// Percent of the binding capacity used, clamped to [0, 100] and rounded
/// to one decimal.
pub fn utilization_percent(weight_lbs: f64, volume_cuft: f64, truck: &TruckType) -> f64 {
    let (weight_ratio, volume_ratio) = ratios(weight_lbs, volume_cuft, truck);
    round1((weight_ratio.max(volume_ratio) * 100.0).clamp(0.0, 100.0))
}

/// Weight binds on ties.
pub fn binding_constraint(weight_lbs: f64, volume_cuft: f64, truck: &TruckType) -> BindingConstraint {
    let (weight_ratio, volume_ratio) = ratios(weight_lbs, volume_cuft, truck);
    if volume_ratio > weight_ratio {
        BindingConstraint::Volume
    } else {
        BindingConstraint::Weight
    }
}

/// Estimated savings for `orders` consolidated onto one truck versus one
/// truck per order: `min(50, (N - 1) * 15)`.
pub fn savings_percent(orders: usize) -> f64 {
    if orders <= 1 {
        return 0.0;
    }
    ((orders - 1) as f64 * SAVINGS_PER_EXTRA_STOP).min(SAVINGS_CAP)
}

/// Plan-level summary over committed loads.
///
/// `cost_savings_percent` applies the savings heuristic to the average
/// number of orders per load.
pub fn summarize(total_orders: usize, loads: &[Load]) -> PlanSummary {
    if loads.is_empty() {
        return PlanSummary {
            total_orders,
            total_loads: 0,
            avg_utilization: 0.0,
            cost_savings_percent: 0.0,
        };
    }

    let count = loads.len() as f64;
    let avg_utilization = loads.iter().map(|load| load.utilization_percent).sum::<f64>() / count;
    let avg_orders = loads.iter().map(|load| load.orders.len()).sum::<usize>() as f64 / count;
    let cost_savings_percent = ((avg_orders - 1.0) * SAVINGS_PER_EXTRA_STOP).clamp(0.0, SAVINGS_CAP);

    PlanSummary {
        total_orders,
        total_loads: loads.len(),
        avg_utilization: round1(avg_utilization),
        cost_savings_percent: round1(cost_savings_percent),
    }
}

fn ratios(weight_lbs: f64, volume_cuft: f64, truck: &TruckType) -> (f64, f64) {
    (weight_lbs / truck.max_weight_lbs, volume_cuft / truck.max_volume_cuft)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
