//! Compatibility grouping.
//!
//! Orders may share a truck only when they leave the same origin facility
//! and belong to the same product class. Groups and their members keep
//! input order so packing stays deterministic.

use std::collections::HashMap;
use std::fmt;

use crate::model::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductClass {
    pub hazmat: bool,
    pub temperature_controlled: bool,
}

impl ProductClass {
    pub fn of(order: &Order) -> Self {
        Self {
            hazmat: order.hazmat,
            temperature_controlled: order.temperature_controlled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub origin: String,
    pub class: ProductClass,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin)?;
        if self.class.hazmat {
            write!(f, " [hazmat]")?;
        }
        if self.class.temperature_controlled {
            write!(f, " [reefer]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderGroup {
    pub key: GroupKey,
    pub orders: Vec<Order>,
}

/// Partition orders into disjoint compatibility groups in one pass.
pub fn group_orders(orders: Vec<Order>) -> Vec<OrderGroup> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<OrderGroup> = Vec::new();

    for order in orders {
        let key = GroupKey {
            origin: order.origin.clone(),
            class: ProductClass::of(&order),
        };
        match index.get(&key) {
            Some(&position) => groups[position].orders.push(order),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(OrderGroup {
                    key,
                    orders: vec![order],
                });
            }
        }
    }

    groups
}
