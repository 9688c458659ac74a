//! Planning pipeline: validate, group, pack, sequence, score, commit.
//!
//! Groups are independent, so they are packed and sequenced in parallel on
//! a bounded worker pool. Inside a group everything runs sequentially and
//! results are collected in group order, which keeps output identical
//! across runs for the same input.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Deserialize;

use crate::assembler::{self, CommitReport, PlanDiagnostics};
use crate::cancel::CancellationToken;
use crate::config::OptimizerConfig;
use crate::error::OptimizeError;
use crate::geocode::NoGeocoder;
use crate::grouping::{self, OrderGroup};
use crate::haversine::HaversineMatrix;
use crate::model::{Load, LoadPlan, OrderStatus, ReferenceData, UnplannableOrder};
use crate::packer::{self, PackOptions};
use crate::sequencer::{self, StopLocator};
use crate::traits::{DistanceMatrixProvider, Geocoder, LoadStore};
use crate::validate::{self, RawOrder};

/// Request body accepted by the optimize endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptimizeRequest {
    pub orders: Vec<RawOrder>,
    /// Restrict the run to these order ids.
    pub order_ids: Option<Vec<String>>,
}

impl OptimizeRequest {
    pub fn new(orders: Vec<RawOrder>) -> Self {
        Self {
            orders,
            order_ids: None,
        }
    }
}

pub struct Optimizer<G = NoGeocoder, M = HaversineMatrix> {
    config: OptimizerConfig,
    geocoder: G,
    matrix: M,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            geocoder: NoGeocoder,
            matrix: HaversineMatrix,
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

/// Packed and sequenced loads of one group, before ids are assigned.
enum GroupOutcome {
    Planned {
        origin: String,
        loads: Vec<(packer::PackedLoad, sequencer::Sequencing)>,
        unplannable: Vec<UnplannableOrder>,
    },
    Cancelled {
        order_ids: Vec<String>,
    },
}

impl<G: Geocoder, M: DistanceMatrixProvider> Optimizer<G, M> {
    pub fn with_geocoder<G2: Geocoder>(self, geocoder: G2) -> Optimizer<G2, M> {
        Optimizer {
            config: self.config,
            geocoder,
            matrix: self.matrix,
        }
    }

    pub fn with_matrix<M2: DistanceMatrixProvider>(self, matrix: M2) -> Optimizer<G, M2> {
        Optimizer {
            config: self.config,
            geocoder: self.geocoder,
            matrix,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Plan without persisting. Orders on the returned loads are marked
    /// Assigned, as a commit would.
    pub fn plan(&self, orders: &[RawOrder], reference: &ReferenceData) -> LoadPlan {
        let request = OptimizeRequest::new(orders.to_vec());
        let (diagnostics, mut loads) = self.prepare(&request, reference, &CancellationToken::new());
        for load in &mut loads {
            load.set_order_status(OrderStatus::Assigned);
        }
        let report = CommitReport {
            committed: loads,
            ..CommitReport::default()
        };
        self.finish(diagnostics, report)
    }

    /// Full run: plan, then commit every load to `store`.
    pub fn run<S: LoadStore>(
        &self,
        request: &OptimizeRequest,
        reference: &ReferenceData,
        store: &S,
        cancel: &CancellationToken,
    ) -> Result<LoadPlan, OptimizeError> {
        let (diagnostics, loads) = self.prepare(request, reference, cancel);
        let report = assembler::commit_loads(
            loads,
            store,
            &self.config.load_id_prefix,
            &self.config.retry,
            cancel,
        )?;
        Ok(self.finish(diagnostics, report))
    }

    fn prepare(
        &self,
        request: &OptimizeRequest,
        reference: &ReferenceData,
        cancel: &CancellationToken,
    ) -> (PlanDiagnostics, Vec<Load>) {
        let validation =
            validate::validate_batch(&request.orders, reference, request.order_ids.as_deref());
        tracing::info!(
            records = request.orders.len(),
            considered = validation.considered,
            valid = validation.orders.len(),
            skipped = validation.skipped.len(),
            "planning run started"
        );

        let groups = grouping::group_orders(validation.orders);
        let outcomes = self.plan_groups(&groups, reference, cancel);

        let mut diagnostics = PlanDiagnostics {
            considered: validation.considered,
            skipped: validation.skipped,
            ..PlanDiagnostics::default()
        };
        let mut loads: Vec<Load> = Vec::new();

        for outcome in outcomes {
            match outcome {
                GroupOutcome::Planned {
                    origin,
                    loads: planned,
                    unplannable,
                } => {
                    for (packed, sequencing) in planned {
                        let load_id = assembler::load_number(&self.config.load_id_prefix, loads.len() + 1);
                        loads.push(assembler::build_load(
                            load_id,
                            &origin,
                            &packed,
                            sequencing,
                            self.config.pickup_lead_hours,
                        ));
                    }
                    diagnostics.unplannable.extend(unplannable);
                }
                GroupOutcome::Cancelled { order_ids } => {
                    diagnostics.cancelled = true;
                    diagnostics.unprocessed.extend(order_ids);
                }
            }
        }

        (diagnostics, loads)
    }

    fn finish(&self, diagnostics: PlanDiagnostics, report: CommitReport) -> LoadPlan {
        let plan = assembler::assemble(diagnostics, report);
        tracing::info!(
            loads = plan.summary.total_loads,
            avg_utilization = plan.summary.avg_utilization,
            cost_savings_percent = plan.summary.cost_savings_percent,
            unplannable = plan.unplannable.len(),
            failed_loads = plan.failed_loads.len(),
            cancelled = plan.cancelled,
            "planning run finished"
        );
        plan
    }

    fn plan_groups(
        &self,
        groups: &[OrderGroup],
        reference: &ReferenceData,
        cancel: &CancellationToken,
    ) -> Vec<GroupOutcome> {
        let options = PackOptions::from(&self.config);
        let locator = StopLocator::new(reference, &self.geocoder, &self.config.retry);
        let task = |group: &OrderGroup| self.plan_group(group, &options, &locator, cancel);

        if groups.len() < 2 {
            return groups.iter().map(task).collect();
        }

        match ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallel_groups.max(1))
            .build()
        {
            Ok(pool) => pool.install(|| groups.par_iter().map(task).collect()),
            Err(err) => {
                tracing::warn!(error = %err, "cannot build worker pool, packing groups sequentially");
                groups.iter().map(task).collect()
            }
        }
    }

    fn plan_group(
        &self,
        group: &OrderGroup,
        options: &PackOptions,
        locator: &StopLocator<'_, G>,
        cancel: &CancellationToken,
    ) -> GroupOutcome {
        if cancel.is_cancelled() {
            return GroupOutcome::Cancelled {
                order_ids: group.orders.iter().map(|order| order.id.clone()).collect(),
            };
        }

        let packing = packer::pack_group(group, &self.config.catalog, options);
        let loads = packing
            .loads
            .into_iter()
            .map(|packed| {
                let sequencing =
                    sequencer::sequence_load(&group.key.origin, packed.orders.clone(), locator, &self.matrix);
                (packed, sequencing)
            })
            .collect();

        GroupOutcome::Planned {
            origin: group.key.origin.clone(),
            loads,
            unplannable: packing.unplannable,
        }
    }
}

/// Plan `orders` with the default configuration and no persistence.
pub fn optimize(orders: &[RawOrder], reference: &ReferenceData) -> LoadPlan {
    Optimizer::default().plan(orders, reference)
}
