//! Load store adapters.

use std::collections::HashMap;
use std::env;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PersistenceError};
use crate::model::{Load, OrderStatus};
use crate::traits::LoadStore;

/// Accepts every write and keeps nothing. Used for pure planning runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunStore;

impl LoadStore for DryRunStore {
    fn create_load(&self, _load: &Load) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn update_order_status(
        &self,
        _order_id: &str,
        _status: OrderStatus,
        _load_id: Option<&str>,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn delete_load(&self, _load_id: &str) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAssignment {
    pub status: OrderStatus,
    pub load_id: Option<String>,
}

/// Process-local store, for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    loads: Mutex<HashMap<String, Load>>,
    orders: Mutex<HashMap<String, OrderAssignment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, load_id: &str) -> Option<Load> {
        lock(&self.loads).ok()?.get(load_id).cloned()
    }

    pub fn load_count(&self) -> usize {
        lock(&self.loads).map(|loads| loads.len()).unwrap_or(0)
    }

    pub fn order(&self, order_id: &str) -> Option<OrderAssignment> {
        lock(&self.orders).ok()?.get(order_id).cloned()
    }
}

impl LoadStore for InMemoryStore {
    fn next_load_sequence(&self, prefix: &str) -> Result<usize, PersistenceError> {
        let loads = lock(&self.loads)?;
        Ok(next_sequence(prefix, loads.keys().map(String::as_str)))
    }

    fn create_load(&self, load: &Load) -> Result<(), PersistenceError> {
        lock(&self.loads)?.insert(load.load_id.clone(), load.clone());
        Ok(())
    }

    fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        load_id: Option<&str>,
    ) -> Result<(), PersistenceError> {
        lock(&self.orders)?.insert(
            order_id.to_string(),
            OrderAssignment {
                status,
                load_id: load_id.map(str::to_string),
            },
        );
        Ok(())
    }

    fn delete_load(&self, load_id: &str) -> Result<(), PersistenceError> {
        lock(&self.loads)?.remove(load_id);
        Ok(())
    }
}

/// One past the highest numeric suffix among `numbers` carrying `prefix`.
fn next_sequence<'a>(prefix: &str, numbers: impl IntoIterator<Item = &'a str>) -> usize {
    numbers
        .into_iter()
        .filter_map(|number| number.strip_prefix(prefix)?.parse::<usize>().ok())
        .max()
        .map_or(1, |highest| highest + 1)
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, PersistenceError> {
    mutex
        .lock()
        .map_err(|_| PersistenceError::Unavailable("in-memory store lock poisoned".into()))
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Reads `SUPABASE_URL` and `SUPABASE_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("SUPABASE_URL")
            .map_err(|_| ConfigError::Invalid("SUPABASE_URL is not set".into()))?;
        let api_key = env::var("SUPABASE_KEY")
            .map_err(|_| ConfigError::Invalid("SUPABASE_KEY is not set".into()))?;
        Ok(Self {
            base_url,
            api_key,
            ..Self::default()
        })
    }
}

/// PostgREST (Supabase) adapter over the `loads`, `load_orders` and
/// `orders` tables. Writes are upserts or filtered updates, so they are
/// safe to retry.
#[derive(Debug, Clone)]
pub struct RestStore {
    config: StoreConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct LoadRow<'a> {
    load_number: &'a str,
    truck_type: &'a str,
    origin: &'a str,
    total_weight_lbs: f64,
    total_volume_cuft: f64,
    utilization_percent: f64,
    status: &'static str,
    must_arrive_by_date: Option<DateTime<Utc>>,
    must_pick_up_by_date: Option<DateTime<Utc>>,
    assigned_carrier: &'static str,
}

#[derive(Debug, Serialize)]
struct LoadOrderRow<'a> {
    load_number: &'a str,
    order_id: &'a str,
    sequence_number: usize,
}

#[derive(Debug, Deserialize)]
struct LoadNumberRow {
    load_number: String,
}

#[derive(Debug, Serialize)]
struct OrderUpdate<'a> {
    status: &'static str,
    assigned_load_number: Option<&'a str>,
    planned_to_load_date: Option<DateTime<Utc>>,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table);
        self.client
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    fn upsert<T: Serialize + ?Sized>(&self, table: &str, on_conflict: &str, body: &T) -> Result<(), PersistenceError> {
        let response = self
            .request(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body)
            .send()?;
        check(response)
    }
}

impl LoadStore for RestStore {
    fn health_check(&self) -> Result<(), PersistenceError> {
        let response = self
            .request(Method::GET, "loads")
            .query(&[("select", "load_number"), ("limit", "1")])
            .send()
            .map_err(|err| PersistenceError::Unavailable(err.to_string()))?;
        check(response)
    }

    fn next_load_sequence(&self, prefix: &str) -> Result<usize, PersistenceError> {
        let response = self
            .request(Method::GET, "loads")
            .query(&[("select", "load_number".to_string()), ("load_number", format!("like.{}*", prefix))])
            .send()?;
        let rows: Vec<LoadNumberRow> = successful(response)?.json()?;
        Ok(next_sequence(prefix, rows.iter().map(|row| row.load_number.as_str())))
    }

    fn create_load(&self, load: &Load) -> Result<(), PersistenceError> {
        let row = LoadRow {
            load_number: &load.load_id,
            truck_type: &load.truck_type,
            origin: &load.origin,
            total_weight_lbs: load.total_weight_lbs,
            total_volume_cuft: load.total_volume_cuft,
            utilization_percent: load.utilization_percent,
            status: load.status.as_str(),
            must_arrive_by_date: load.must_arrive_by,
            must_pick_up_by_date: load.must_pick_up_by,
            assigned_carrier: "NONE",
        };
        self.upsert("loads", "load_number", &row)?;

        let stops: Vec<LoadOrderRow<'_>> = load
            .orders
            .iter()
            .map(|order| LoadOrderRow {
                load_number: &load.load_id,
                order_id: &order.id,
                sequence_number: order.stop_sequence,
            })
            .collect();
        if stops.is_empty() {
            return Ok(());
        }
        self.upsert("load_orders", "load_number,order_id", stops.as_slice())
    }

    fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        load_id: Option<&str>,
    ) -> Result<(), PersistenceError> {
        let update = OrderUpdate {
            status: status.as_str(),
            assigned_load_number: load_id,
            planned_to_load_date: load_id.map(|_| Utc::now()),
        };
        let response = self
            .request(Method::PATCH, "orders")
            .query(&[("id", format!("eq.{}", order_id))])
            .header("Prefer", "return=minimal")
            .json(&update)
            .send()?;
        check(response)
    }

    fn delete_load(&self, load_id: &str) -> Result<(), PersistenceError> {
        let filter = [("load_number", format!("eq.{}", load_id))];
        check(self.request(Method::DELETE, "load_orders").query(&filter).send()?)?;
        check(self.request(Method::DELETE, "loads").query(&filter).send()?)
    }
}

fn check(response: Response) -> Result<(), PersistenceError> {
    successful(response).map(|_| ())
}

fn successful(response: Response) -> Result<Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(PersistenceError::Status {
        status: status.as_u16(),
        body,
    })
}
