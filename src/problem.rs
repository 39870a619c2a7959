//! Per-call routing problem: validated parameters, feasible jobs and matrix.
//!
//! [`RoutingProblem::prepare`] is the only step that talks to the distance
//! provider. Once it returns, optimizers run purely in memory.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::error::OptimizeError;
use crate::feasibility::FeasibilityFilter;
use crate::matrix::DistanceMatrix;
use crate::model::{RouteOptimizationParameters, ServiceJob};
use crate::objective::ObjectiveFunction;
use crate::route::{Algorithm, CostHistory, ExcludedJob, OptimizationMetrics, OptimizedRoute, RouteStop};
use crate::traits::DistanceMatrixProvider;

#[derive(Debug, Clone)]
pub struct RoutingProblem<'a> {
    params: &'a RouteOptimizationParameters,
    jobs: Vec<&'a ServiceJob>,
    /// Position in `params.jobs` of each feasible job.
    job_indices: Vec<usize>,
    matrix: DistanceMatrix,
    excluded: Vec<ExcludedJob>,
}

impl<'a> RoutingProblem<'a> {
    /// Validate, filter and build the matrix.
    ///
    /// Fails on invalid parameters or a provider error; never on infeasible
    /// jobs, which are excluded and reported instead.
    #[instrument(skip_all, fields(technician = %params.technician.id, jobs = params.jobs.len()))]
    pub fn prepare<P>(params: &'a RouteOptimizationParameters, provider: &P) -> Result<Self, OptimizeError>
    where
        P: DistanceMatrixProvider + ?Sized,
    {
        params.validate()?;

        let filter = FeasibilityFilter::new(params);
        let skilled = filter.by_skills();
        let locations: Vec<_> = skilled
            .feasible
            .iter()
            .map(|&index| params.jobs[index].location)
            .collect();
        let matrix = DistanceMatrix::build(provider, params.start_location, &locations, params.end_location)?;

        let candidates = skilled.feasible.clone();
        let reachable = filter.by_time_windows(skilled, &matrix);
        let limited = filter.by_stop_limit(reachable);

        let keep = positions_within(&limited.feasible, &candidates);
        let matrix = if keep.len() == candidates.len() {
            matrix
        } else {
            matrix.retain_jobs(&keep)
        };

        Ok(Self {
            params,
            jobs: limited.feasible.iter().map(|&index| &params.jobs[index]).collect(),
            job_indices: limited.feasible,
            matrix,
            excluded: limited.excluded,
        })
    }

    pub fn params(&self) -> &RouteOptimizationParameters {
        self.params
    }

    /// Feasible jobs, in input order.
    pub fn jobs(&self) -> &[&'a ServiceJob] {
        &self.jobs
    }

    /// Caller positions of the feasible jobs, ascending.
    pub fn job_indices(&self) -> &[usize] {
        &self.job_indices
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn excluded(&self) -> &[ExcludedJob] {
        &self.excluded
    }

    pub fn objective(&self) -> ObjectiveFunction<'_> {
        ObjectiveFunction::new(self.params, &self.matrix, &self.jobs)
    }

    pub fn cost(&self, permutation: &[usize]) -> f64 {
        self.objective().cost(permutation)
    }

    pub fn is_cancelled(&self) -> bool {
        self.params.cancellation.is_cancelled()
    }

    /// Feasible jobs in input order.
    pub fn identity(&self) -> Vec<usize> {
        (0..self.jobs.len()).collect()
    }

    /// True when `permutation` visits every feasible job exactly once.
    pub fn is_valid_permutation(&self, permutation: &[usize]) -> bool {
        let mut seen = vec![false; self.jobs.len()];
        permutation.len() == self.jobs.len()
            && permutation
                .iter()
                .all(|&job| job < seen.len() && !std::mem::replace(&mut seen[job], true))
    }

    /// Assemble the caller-facing route for a finished run.
    pub(crate) fn finish(&self, algorithm: Algorithm, permutation: &[usize], run: RunStats) -> OptimizedRoute {
        let objective = self.objective();
        let mut stops = Vec::with_capacity(permutation.len());
        let summary = objective.walk(permutation, |job, leg| {
            stops.push(RouteStop {
                job_id: self.jobs[job].id.clone(),
                job_index: self.job_indices[job],
                arrival: leg.arrival.round() as i32,
                service_start: leg.service_start.round() as i32,
                departure: leg.departure.round() as i32,
                distance_from_previous_km: leg.distance_km,
                travel_secs_from_previous: leg.travel_secs,
            });
        });
        let final_cost = objective.cost_of(&summary);

        let mut warnings: Vec<String> = self
            .excluded
            .iter()
            .map(|excluded| format!("job {} excluded: {}", excluded.job_id, excluded.reason))
            .collect();
        if run.terminated_early {
            warn!(%algorithm, "optimization cancelled, returning best route found so far");
            warnings.push("optimization cancelled before completion".to_string());
        }
        if self.params.respect_time_windows && summary.lateness_secs > 0.0 {
            warnings.push(format!(
                "route misses time windows or working hours by {:.0} minutes",
                summary.lateness_secs / 60.0
            ));
        }

        let elapsed = run.started.elapsed();
        info!(
            %algorithm,
            jobs = permutation.len(),
            excluded = self.excluded.len(),
            cost = final_cost,
            iterations = run.iterations,
            elapsed_ms = elapsed.as_millis() as u64,
            "route optimized"
        );

        OptimizedRoute {
            technician_id: self.params.technician.id.clone(),
            stops,
            total_distance_km: summary.distance_km,
            total_duration: std::time::Duration::from_secs_f64(summary.elapsed_secs.max(0.0)),
            algorithm,
            is_optimal: false,
            iterations: run.iterations,
            metrics: OptimizationMetrics {
                initial_cost: run.initial_cost,
                final_cost,
                cost_history: run.history,
                evaluations: run.evaluations,
                elapsed,
                terminated_early: run.terminated_early,
                excluded_jobs: self.excluded.clone(),
                warnings,
                extras: run.extras,
            },
        }
    }
}

/// Bookkeeping an optimizer hands to [`RoutingProblem::finish`].
#[derive(Debug, Clone)]
pub(crate) struct RunStats {
    pub started: Instant,
    pub initial_cost: f64,
    pub history: CostHistory,
    pub evaluations: usize,
    pub iterations: usize,
    pub terminated_early: bool,
    pub extras: BTreeMap<String, f64>,
}

impl RunStats {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            initial_cost: 0.0,
            history: CostHistory::new(),
            evaluations: 0,
            iterations: 0,
            terminated_early: false,
            extras: BTreeMap::new(),
        }
    }

    pub fn extra(&mut self, key: &str, value: f64) {
        self.extras.insert(key.to_string(), value);
    }
}

/// Positions of each element of `subset` within `within` (both ascending).
fn positions_within(subset: &[usize], within: &[usize]) -> Vec<usize> {
    subset
        .iter()
        .filter_map(|value| within.binary_search(value).ok())
        .collect()
}
