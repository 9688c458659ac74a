//! Load packing: first-fit-decreasing over one compatibility group,
//! followed by an optional best-effort compaction pass.

use crate::catalog::{TruckCatalog, TruckType};
use crate::config::OptimizerConfig;
use crate::error::UnplannableReason;
use crate::grouping::OrderGroup;
use crate::model::{DeliveryWindow, Order, UnplannableOrder};
use crate::scoring;

#[derive(Debug, Clone, PartialEq)]
pub struct PackOptions {
    pub min_utilization_percent: f64,
    pub compaction: bool,
    pub respect_delivery_windows: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions::from(&OptimizerConfig::default())
    }
}

impl From<&OptimizerConfig> for PackOptions {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            min_utilization_percent: config.min_utilization_percent,
            compaction: config.compaction,
            respect_delivery_windows: config.respect_delivery_windows,
        }
    }
}

/// A load under construction. Orders are kept in placement order.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedLoad {
    pub truck: TruckType,
    pub orders: Vec<Order>,
    pub total_weight_lbs: f64,
    pub total_volume_cuft: f64,
    /// Intersection of the member orders' delivery windows.
    pub window: Option<DeliveryWindow>,
}

impl PackedLoad {
    fn open(truck: TruckType, order: Order, respect_windows: bool) -> Self {
        let mut load = Self {
            truck,
            orders: Vec::new(),
            total_weight_lbs: 0.0,
            total_volume_cuft: 0.0,
            window: None,
        };
        load.push(order, respect_windows);
        load
    }

    pub fn remaining_weight_lbs(&self) -> f64 {
        self.truck.max_weight_lbs - self.total_weight_lbs
    }

    pub fn remaining_volume_cuft(&self) -> f64 {
        self.truck.max_volume_cuft - self.total_volume_cuft
    }

    pub fn utilization_percent(&self) -> f64 {
        scoring::utilization_percent(self.total_weight_lbs, self.total_volume_cuft, &self.truck)
    }

    fn accepts(&self, order: &Order, respect_windows: bool) -> bool {
        let fits = self.truck.holds(
            self.total_weight_lbs + order.weight_lbs,
            self.total_volume_cuft + order.volume_cuft,
        );
        fits && (!respect_windows || windows_compatible(self.window, order.delivery_window))
    }

    fn push(&mut self, order: Order, respect_windows: bool) {
        self.total_weight_lbs += order.weight_lbs;
        self.total_volume_cuft += order.volume_cuft;
        if respect_windows {
            self.window = merge_windows(self.window, order.delivery_window);
        }
        self.orders.push(order);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPacking {
    pub loads: Vec<PackedLoad>,
    pub unplannable: Vec<UnplannableOrder>,
}

/// Pack one compatibility group.
pub fn pack_group(group: &OrderGroup, catalog: &TruckCatalog, options: &PackOptions) -> GroupPacking {
    let temperature_controlled = group.key.class.temperature_controlled;
    let mut packing = first_fit_decreasing(
        &group.orders,
        catalog,
        temperature_controlled,
        options.respect_delivery_windows,
    );

    if options.compaction && packing.loads.len() > 1 {
        let before = packing.loads.len();
        packing.loads = compact_loads(packing.loads, catalog, temperature_controlled, options);
        if packing.loads.len() < before {
            tracing::debug!(
                group = %group.key,
                before,
                after = packing.loads.len(),
                "compaction merged under-utilized loads"
            );
        }
    }

    tracing::debug!(
        group = %group.key,
        orders = group.orders.len(),
        loads = packing.loads.len(),
        unplannable = packing.unplannable.len(),
        "packed group"
    );
    packing
}

/// First-fit-decreasing: heaviest first (volume breaks ties, then input
/// order), each order into the first open load with room, else a new load
/// on the smallest truck that holds it alone.
pub fn first_fit_decreasing(
    orders: &[Order],
    catalog: &TruckCatalog,
    temperature_controlled: bool,
    respect_windows: bool,
) -> GroupPacking {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    // Stable sort keeps input order on equal weight and volume.
    sorted.sort_by(|a, b| {
        b.weight_lbs
            .total_cmp(&a.weight_lbs)
            .then(b.volume_cuft.total_cmp(&a.volume_cuft))
    });

    let mut packing = GroupPacking::default();

    for order in sorted {
        if let Some(load) = packing
            .loads
            .iter_mut()
            .find(|load| load.accepts(order, respect_windows))
        {
            load.push(order.clone(), respect_windows);
            continue;
        }

        let reason = if !catalog.has_eligible(temperature_controlled) {
            UnplannableReason::NoEligibleTruckType
        } else {
            match catalog.smallest_fitting(order.weight_lbs, order.volume_cuft, temperature_controlled) {
                Some(truck) => {
                    packing
                        .loads
                        .push(PackedLoad::open(truck.clone(), order.clone(), respect_windows));
                    continue;
                }
                None => UnplannableReason::ExceedsMaxCapacity,
            }
        };

        tracing::warn!(
            order_id = %order.id,
            weight_lbs = order.weight_lbs,
            volume_cuft = order.volume_cuft,
            reason = reason.code(),
            "order cannot be planned"
        );
        packing.unplannable.push(UnplannableOrder {
            order_id: order.id.clone(),
            weight_lbs: order.weight_lbs,
            volume_cuft: order.volume_cuft,
            reason,
        });
    }

    packing
}

/// Merge loads below the utilization threshold into sibling loads when a
/// catalog truck holds the combined set. Scans in creation order; the merged
/// load takes the earlier position and the smallest truck that fits.
pub fn compact_loads(
    mut loads: Vec<PackedLoad>,
    catalog: &TruckCatalog,
    temperature_controlled: bool,
    options: &PackOptions,
) -> Vec<PackedLoad> {
    let respect_windows = options.respect_delivery_windows;

    'scan: loop {
        for candidate in 0..loads.len() {
            if loads[candidate].utilization_percent() >= options.min_utilization_percent {
                continue;
            }
            for target in 0..loads.len() {
                if target == candidate {
                    continue;
                }
                let (keep, drop) = (candidate.min(target), candidate.max(target));
                if let Some(merged) =
                    merge_pair(&loads[keep], &loads[drop], catalog, temperature_controlled, respect_windows)
                {
                    loads[keep] = merged;
                    loads.remove(drop);
                    continue 'scan;
                }
            }
        }
        break;
    }

    loads
}

fn merge_pair(
    first: &PackedLoad,
    second: &PackedLoad,
    catalog: &TruckCatalog,
    temperature_controlled: bool,
    respect_windows: bool,
) -> Option<PackedLoad> {
    let window = if respect_windows {
        match (first.window, second.window) {
            (Some(a), Some(b)) => Some(a.intersect(&b)?),
            (a, b) => a.or(b),
        }
    } else {
        None
    };

    let orders: Vec<Order> = first.orders.iter().chain(&second.orders).cloned().collect();
    let total_weight_lbs: f64 = orders.iter().map(|order| order.weight_lbs).sum();
    let total_volume_cuft: f64 = orders.iter().map(|order| order.volume_cuft).sum();
    let truck = catalog.smallest_fitting(total_weight_lbs, total_volume_cuft, temperature_controlled)?;

    Some(PackedLoad {
        truck: truck.clone(),
        orders,
        total_weight_lbs,
        total_volume_cuft,
        window,
    })
}

fn windows_compatible(load: Option<DeliveryWindow>, order: Option<DeliveryWindow>) -> bool {
    match (load, order) {
        (Some(load), Some(order)) => load.overlaps(&order),
        _ => true,
    }
}

fn merge_windows(load: Option<DeliveryWindow>, order: Option<DeliveryWindow>) -> Option<DeliveryWindow> {
    match (load, order) {
        (Some(load), Some(order)) => load.intersect(&order),
        (load, order) => load.or(order),
    }
}
