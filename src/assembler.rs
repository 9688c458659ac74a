//! Load plan assembly and commit.
//!
//! Each load commits on its own: the load record is written, then every
//! order is moved to Assigned. Any failure rolls that load back (orders to
//! Pending, load record removed) and the remaining loads carry on.

use chrono::TimeDelta;

use crate::cancel::CancellationToken;
use crate::error::{OptimizeError, PersistenceError};
use crate::model::{
    FailedLoad, Load, LoadOrder, LoadPlan, LoadStatus, OrderStatus, SkippedOrder, UnplannableOrder,
};
use crate::packer::PackedLoad;
use crate::retry::RetryPolicy;
use crate::scoring;
use crate::sequencer::Sequencing;
use crate::traits::LoadStore;

const REASONING_DESTINATIONS: usize = 3;

/// Load number for the `sequence`-th load under `prefix`, e.g. `LOAD_007`.
pub fn load_number(prefix: &str, sequence: usize) -> String {
    format!("{}{:03}", prefix, sequence)
}

/// Build the plan-facing load from packer and sequencer output. Orders
/// stay Pending until the load is committed.
pub fn build_load(
    load_id: String,
    origin: &str,
    packed: &PackedLoad,
    sequencing: Sequencing,
    pickup_lead_hours: i64,
) -> Load {
    let must_arrive_by = sequencing
        .orders
        .iter()
        .filter_map(|order| order.deadline())
        .min();
    let must_pick_up_by = must_arrive_by.and_then(|deadline| {
        TimeDelta::try_hours(pickup_lead_hours).and_then(|lead| deadline.checked_sub_signed(lead))
    });

    let orders: Vec<LoadOrder> = sequencing
        .orders
        .iter()
        .enumerate()
        .map(|(position, order)| LoadOrder::from_order(order, position + 1))
        .collect();

    let destinations: Vec<&str> = orders.iter().map(|order| order.destination.as_str()).collect();

    Load {
        load_id,
        truck_type: packed.truck.name.clone(),
        origin: origin.to_string(),
        total_weight_lbs: packed.total_weight_lbs,
        total_volume_cuft: packed.total_volume_cuft,
        utilization_percent: scoring::utilization_percent(
            packed.total_weight_lbs,
            packed.total_volume_cuft,
            &packed.truck,
        ),
        binding_constraint: scoring::binding_constraint(
            packed.total_weight_lbs,
            packed.total_volume_cuft,
            &packed.truck,
        ),
        savings_percent: scoring::savings_percent(orders.len()),
        route_distance_km: sequencing.route_distance_km,
        must_arrive_by,
        must_pick_up_by,
        reasoning: reasoning(origin, &destinations),
        status: LoadStatus::Planning,
        warnings: sequencing.warnings,
        orders,
    }
}

fn reasoning(origin: &str, destinations: &[&str]) -> String {
    match destinations {
        [only] => format!("Direct load from {} to {}", origin, only),
        _ => {
            let shown = destinations
                .iter()
                .take(REASONING_DESTINATIONS)
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            let more = if destinations.len() > REASONING_DESTINATIONS { "..." } else { "" };
            format!(
                "Multi-stop load from {} with {} delivery stops: {}{}",
                origin,
                destinations.len(),
                shown,
                more
            )
        }
    }
}

#[derive(Debug, Default)]
pub struct CommitReport {
    pub committed: Vec<Load>,
    pub failed: Vec<FailedLoad>,
    /// Loads left uncommitted because the run was cancelled.
    pub abandoned: Vec<Load>,
}

/// Commit loads in plan order. Only an unreachable store is an error.
///
/// Loads are renumbered from the store's next free sequence for `prefix`
/// so a run never reuses a load number committed by an earlier one.
pub fn commit_loads<S: LoadStore>(
    mut loads: Vec<Load>,
    store: &S,
    prefix: &str,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<CommitReport, OptimizeError> {
    let mut report = CommitReport::default();
    if loads.is_empty() {
        return Ok(report);
    }

    retry
        .run("health_check", || store.health_check())
        .map_err(OptimizeError::PersistenceUnavailable)?;

    let first = retry
        .run("next_load_sequence", || store.next_load_sequence(prefix))
        .map_err(OptimizeError::PersistenceUnavailable)?;
    for (offset, load) in loads.iter_mut().enumerate() {
        load.load_id = load_number(prefix, first + offset);
    }
    tracing::debug!(first = %load_number(prefix, first), loads = loads.len(), "load numbers allocated");

    for mut load in loads {
        if cancel.is_cancelled() {
            report.abandoned.push(load);
            continue;
        }
        match commit_load(&mut load, store, retry) {
            Ok(()) => report.committed.push(load),
            Err(err) => {
                tracing::warn!(load_id = %load.load_id, error = %err, "load commit failed, rolled back");
                report.failed.push(FailedLoad {
                    load,
                    error: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        committed = report.committed.len(),
        failed = report.failed.len(),
        abandoned = report.abandoned.len(),
        "commit finished"
    );
    Ok(report)
}

/// Commit one load atomically from the caller's point of view: on error
/// every order touched is released and the load record removed.
pub fn commit_load<S: LoadStore>(
    load: &mut Load,
    store: &S,
    retry: &RetryPolicy,
) -> Result<(), PersistenceError> {
    if let Err(err) = retry.run("create_load", || store.create_load(load)) {
        // The write may have landed before the error surfaced.
        rollback(&load.load_id, &[], store, retry);
        return Err(err);
    }

    let mut touched: Vec<String> = Vec::with_capacity(load.orders.len());
    for order in &load.orders {
        // A failed update may still have landed, so it is released too.
        touched.push(order.id.clone());
        let result = retry.run("update_order_status", || {
            store.update_order_status(&order.id, OrderStatus::Assigned, Some(&load.load_id))
        });
        if let Err(err) = result {
            rollback(&load.load_id, &touched, store, retry);
            return Err(err);
        }
    }

    load.set_order_status(OrderStatus::Assigned);
    tracing::debug!(load_id = %load.load_id, orders = load.orders.len(), "load committed");
    Ok(())
}

fn rollback<S: LoadStore>(load_id: &str, order_ids: &[String], store: &S, retry: &RetryPolicy) {
    for order_id in order_ids {
        if let Err(err) = retry.run("release_order", || {
            store.update_order_status(order_id, OrderStatus::Pending, None)
        }) {
            tracing::warn!(load_id, order_id = %order_id, error = %err, "cannot release order during rollback");
        }
    }
    if let Err(err) = retry.run("delete_load", || store.delete_load(load_id)) {
        tracing::warn!(load_id, error = %err, "cannot delete load during rollback");
    }
}

/// Diagnostics gathered before commit.
#[derive(Debug, Default)]
pub struct PlanDiagnostics {
    pub considered: usize,
    pub skipped: Vec<SkippedOrder>,
    pub unplannable: Vec<UnplannableOrder>,
    pub unprocessed: Vec<String>,
    pub cancelled: bool,
}

/// Combine commit results and diagnostics into the final plan.
pub fn assemble(diagnostics: PlanDiagnostics, report: CommitReport) -> LoadPlan {
    let PlanDiagnostics {
        considered,
        skipped,
        unplannable,
        mut unprocessed,
        mut cancelled,
    } = diagnostics;

    if !report.abandoned.is_empty() {
        cancelled = true;
        unprocessed.extend(
            report
                .abandoned
                .iter()
                .flat_map(|load| load.order_ids().map(str::to_string)),
        );
    }

    LoadPlan {
        summary: scoring::summarize(considered, &report.committed),
        loads: report.committed,
        skipped,
        unplannable,
        failed_loads: report.failed,
        unprocessed,
        cancelled,
    }
}
