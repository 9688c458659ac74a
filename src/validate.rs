//! Order validation: raw order records into canonical [`Order`]s.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{DeliveryWindow, Order, OrderStatus, Priority, ReferenceData, SkippedOrder};

const TEMPERATURE_CONTROLLED: &str = "temperature controlled";

/// An order record as delivered by the order source. Every field is
/// optional so that incomplete records reach the validator instead of
/// failing deserialization of the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOrder {
    pub id: Option<String>,
    pub order_number: Option<String>,
    pub customer: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub weight_lbs: Option<f64>,
    pub volume_cuft: Option<f64>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub delivery_window_start: Option<String>,
    pub delivery_window_end: Option<String>,
    #[serde(alias = "must_arrive_by_date")]
    pub must_arrive_by: Option<String>,
    pub product_id: Option<String>,
    pub is_hazmat: Option<bool>,
    pub special_requirements: Option<String>,
    pub assigned_load_number: Option<String>,
    pub planned_to_load_date: Option<String>,
}

impl RawOrder {
    /// Pending and not yet planned onto a load.
    pub fn is_eligible(&self) -> bool {
        let pending = self
            .status
            .as_deref()
            .and_then(OrderStatus::parse)
            .is_some_and(|status| status == OrderStatus::Pending);
        pending && is_blank(&self.assigned_load_number) && is_blank(&self.planned_to_load_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub orders: Vec<Order>,
    pub skipped: Vec<SkippedOrder>,
    /// Eligible records seen, valid or not.
    pub considered: usize,
}

/// Validate one record. `index` is the record's position in the batch.
pub fn validate_order(
    raw: &RawOrder,
    index: usize,
    reference: &ReferenceData,
) -> Result<Order, ValidationError> {
    let id = required_text(&raw.id, "id")?;
    let origin = required_text(&raw.origin, "origin")?;
    let destination = required_text(&raw.destination, "destination")?;
    let weight_lbs = positive(raw.weight_lbs, "weight_lbs")?;
    let volume_cuft = positive(raw.volume_cuft, "volume_cuft")?;

    let priority = match raw.priority.as_deref().filter(|label| !label.trim().is_empty()) {
        Some(label) => {
            Priority::parse(label).ok_or_else(|| ValidationError::UnknownPriority(label.to_string()))?
        }
        None => Priority::default(),
    };

    let delivery_window = delivery_window(&raw.delivery_window_start, &raw.delivery_window_end)?;
    let must_arrive_by = match raw.must_arrive_by.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(value) => Some(parse_timestamp(value).ok_or_else(|| {
            ValidationError::MalformedTimestamp {
                field: "must_arrive_by",
                value: value.to_string(),
            }
        })?),
        None => None,
    };

    let product = raw.product_id.as_deref().and_then(|id| reference.product(id));
    let hazmat = raw.is_hazmat.unwrap_or(false) || product.is_some_and(|p| p.is_hazmat);
    let temperature_controlled = product.is_some_and(|p| p.requires_refrigeration)
        || raw
            .special_requirements
            .as_deref()
            .is_some_and(|text| text.to_ascii_lowercase().contains(TEMPERATURE_CONTROLLED));

    Ok(Order {
        id,
        order_number: raw.order_number.clone(),
        customer: raw.customer.clone(),
        origin,
        destination,
        weight_lbs,
        volume_cuft,
        priority,
        delivery_window,
        must_arrive_by,
        hazmat,
        temperature_controlled,
        status: OrderStatus::Pending,
        input_index: index,
    })
}

/// Validate a batch, silently dropping ineligible records and collecting
/// validation failures. When `selection` is given only those ids are
/// considered.
pub fn validate_batch(
    raws: &[RawOrder],
    reference: &ReferenceData,
    selection: Option<&[String]>,
) -> ValidationOutcome {
    let selected: Option<HashSet<&str>> =
        selection.map(|ids| ids.iter().map(String::as_str).collect());
    let mut seen: HashSet<String> = HashSet::new();
    let mut outcome = ValidationOutcome::default();

    for (index, raw) in raws.iter().enumerate() {
        if !raw.is_eligible() {
            continue;
        }
        if let Some(selected) = &selected {
            let wanted = raw
                .id
                .as_deref()
                .is_some_and(|id| selected.contains(id.trim()));
            if !wanted {
                continue;
            }
        }
        outcome.considered += 1;

        let raw_id = raw
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let result = validate_order(raw, index, reference).and_then(|order| {
            if seen.insert(order.id.clone()) {
                Ok(order)
            } else {
                Err(ValidationError::DuplicateId(order.id))
            }
        });

        match result {
            Ok(order) => outcome.orders.push(order),
            Err(err) => {
                tracing::debug!(index, order_id = ?raw_id, error = %err, "skipping invalid order");
                outcome.skipped.push(SkippedOrder::new(index, raw_id, err));
            }
        }
    }

    outcome
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

fn required_text(value: &Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingField(field))
}

fn positive(value: Option<f64>, field: &'static str) -> Result<f64, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    if !value.is_finite() {
        return Err(ValidationError::NotFinite(field));
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositive { field, value });
    }
    Ok(value)
}

fn delivery_window(
    start: &Option<String>,
    end: &Option<String>,
) -> Result<Option<DeliveryWindow>, ValidationError> {
    let start = start.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let end = end.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match (start, end) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ValidationError::MalformedDeliveryWindow("missing window end".into())),
        (None, Some(_)) => Err(ValidationError::MalformedDeliveryWindow("missing window start".into())),
        (Some(start), Some(end)) => {
            let start_at = parse_timestamp(start).ok_or_else(|| {
                ValidationError::MalformedDeliveryWindow(format!("cannot parse start `{}`", start))
            })?;
            let end_at = parse_timestamp(end).ok_or_else(|| {
                ValidationError::MalformedDeliveryWindow(format!("cannot parse end `{}`", end))
            })?;
            DeliveryWindow::new(start_at, end_at)
                .map(Some)
                .ok_or_else(|| ValidationError::MalformedDeliveryWindow("end before start".into()))
        }
    }
}

/// RFC 3339, or ISO-8601 without offset read as UTC.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
