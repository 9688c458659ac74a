//! Truck types and the catalog used for truck selection.
//!
//! Selection is a bounded match, not a search: candidates are tried in
//! ascending capacity order and the first one that holds the set wins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckType {
    pub name: String,
    pub max_weight_lbs: f64,
    pub max_volume_cuft: f64,
    #[serde(default)]
    pub refrigerated: bool,
}

impl TruckType {
    pub fn new(name: impl Into<String>, max_weight_lbs: f64, max_volume_cuft: f64) -> Self {
        Self {
            name: name.into(),
            max_weight_lbs,
            max_volume_cuft,
            refrigerated: false,
        }
    }

    pub fn refrigerated(mut self) -> Self {
        self.refrigerated = true;
        self
    }

    pub fn holds(&self, weight_lbs: f64, volume_cuft: f64) -> bool {
        weight_lbs <= self.max_weight_lbs && volume_cuft <= self.max_volume_cuft
    }
}

/// Trucks available to a planning run, kept in ascending capacity order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TruckType>", into = "Vec<TruckType>")]
pub struct TruckCatalog {
    trucks: Vec<TruckType>,
}

impl TruckCatalog {
    /// Builds a catalog; trucks are ordered by (weight, volume) capacity,
    /// equal capacities keep their given order.
    pub fn new(mut trucks: Vec<TruckType>) -> Self {
        trucks.sort_by(|a, b| {
            a.max_weight_lbs
                .total_cmp(&b.max_weight_lbs)
                .then(a.max_volume_cuft.total_cmp(&b.max_volume_cuft))
        });
        Self { trucks }
    }

    pub fn trucks(&self) -> &[TruckType] {
        &self.trucks
    }

    pub fn is_empty(&self) -> bool {
        self.trucks.is_empty()
    }

    /// Trucks whose equipment matches the cargo, smallest first.
    pub fn eligible(&self, temperature_controlled: bool) -> impl Iterator<Item = &TruckType> {
        self.trucks
            .iter()
            .filter(move |truck| truck.refrigerated == temperature_controlled)
    }

    pub fn has_eligible(&self, temperature_controlled: bool) -> bool {
        self.eligible(temperature_controlled).next().is_some()
    }

    /// Smallest eligible truck that holds the given totals.
    pub fn smallest_fitting(
        &self,
        weight_lbs: f64,
        volume_cuft: f64,
        temperature_controlled: bool,
    ) -> Option<&TruckType> {
        self.eligible(temperature_controlled)
            .find(|truck| truck.holds(weight_lbs, volume_cuft))
    }
}

impl Default for TruckCatalog {
    fn default() -> Self {
        Self::new(vec![
            TruckType::new("53ft Dry Van", 45_000.0, 3_800.0),
            TruckType::new("48ft Flatbed", 48_000.0, 3_000.0),
            TruckType::new("53ft Refrigerated", 43_500.0, 3_500.0).refrigerated(),
        ])
    }
}

impl From<Vec<TruckType>> for TruckCatalog {
    fn from(trucks: Vec<TruckType>) -> Self {
        Self::new(trucks)
    }
}

impl From<TruckCatalog> for Vec<TruckType> {
    fn from(catalog: TruckCatalog) -> Self {
        catalog.trucks
    }
}
