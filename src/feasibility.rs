//! Feasibility filter: drops jobs the technician cannot perform.
//!
//! Exclusions are never silent; each one is reported with its reason and
//! surfaced through the route metrics.

use tracing::warn;

use crate::matrix::{DistanceMatrix, START};
use crate::model::{Objective, RouteOptimizationParameters};
use crate::route::{ExcludedJob, ExclusionReason};

/// Jobs split into feasible (indices into the caller's job list, original
/// order) and excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub feasible: Vec<usize>,
    pub excluded: Vec<ExcludedJob>,
}

impl Partition {
    fn exclude(&mut self, params: &RouteOptimizationParameters, index: usize, reason: ExclusionReason) {
        let job_id = params.jobs[index].id.clone();
        warn!(job_id = %job_id, %reason, "excluding job from route");
        self.excluded.push(ExcludedJob { job_id, reason });
    }
}

pub struct FeasibilityFilter<'a> {
    params: &'a RouteOptimizationParameters,
}

impl<'a> FeasibilityFilter<'a> {
    pub fn new(params: &'a RouteOptimizationParameters) -> Self {
        Self { params }
    }

    /// Keep jobs whose required skills the technician covers.
    ///
    /// A no-op unless `validate_skills` is set.
    pub fn by_skills(&self) -> Partition {
        let mut partition = Partition::default();
        for (index, job) in self.params.jobs.iter().enumerate() {
            if self.params.validate_skills {
                let missing = self.params.technician.missing_skills(job);
                if !missing.is_empty() {
                    partition.exclude(self.params, index, ExclusionReason::MissingSkills { missing });
                    continue;
                }
            }
            partition.feasible.push(index);
        }
        partition
    }

    /// Drop jobs whose window or the working day cannot be met.
    ///
    /// Windowed jobs are walked earliest deadline first (ties in input
    /// order), carrying the clock through travel, waiting and service of the
    /// jobs kept before them. A job whose window has closed by the time the
    /// technician gets there is unreachable. Jobs without a window only need
    /// to fit the working day when driven to directly from the start.
    ///
    /// `matrix` must be indexed by `partition.feasible`. A no-op unless
    /// `respect_time_windows` is set.
    pub fn by_time_windows(&self, partition: Partition, matrix: &DistanceMatrix) -> Partition {
        if !self.params.respect_time_windows {
            return partition;
        }
        let day_start = f64::from(self.params.day_start());
        let day_end = f64::from(self.params.day_end());
        let jobs = &self.params.jobs;

        let mut verdicts: Vec<Option<ExclusionReason>> = vec![None; partition.feasible.len()];

        let mut by_deadline: Vec<usize> = (0..partition.feasible.len())
            .filter(|&pos| jobs[partition.feasible[pos]].time_window.is_some())
            .collect();
        by_deadline.sort_by_key(|&pos| jobs[partition.feasible[pos]].time_window.map(|w| w.end));

        let mut clock = day_start;
        let mut node = START;
        for pos in by_deadline {
            let job = &jobs[partition.feasible[pos]];
            let Some(window) = job.time_window else {
                continue;
            };
            let arrival = clock + matrix.duration(node, DistanceMatrix::job_node(pos));
            if arrival > f64::from(window.end) {
                verdicts[pos] = Some(ExclusionReason::UnreachableTimeWindow);
                continue;
            }
            let service_start = arrival.max(f64::from(window.start));
            if service_start + job.service_seconds() > day_end {
                verdicts[pos] = Some(ExclusionReason::OutsideWorkingHours);
                continue;
            }
            clock = service_start + job.service_seconds();
            node = DistanceMatrix::job_node(pos);
        }

        for (pos, &index) in partition.feasible.iter().enumerate() {
            let job = &jobs[index];
            if job.time_window.is_none() {
                let arrival = day_start + matrix.duration(START, DistanceMatrix::job_node(pos));
                if arrival + job.service_seconds() > day_end {
                    verdicts[pos] = Some(ExclusionReason::OutsideWorkingHours);
                }
            }
        }

        let mut result = Partition {
            feasible: Vec::with_capacity(partition.feasible.len()),
            excluded: partition.excluded,
        };
        for (&index, verdict) in partition.feasible.iter().zip(verdicts) {
            match verdict {
                Some(reason) => result.exclude(self.params, index, reason),
                None => result.feasible.push(index),
            }
        }
        result
    }

    /// Enforce a `MaxStops` constraint.
    ///
    /// Under `MaximizeRevenue` the highest-revenue jobs are kept; otherwise the
    /// first jobs in input order. Kept jobs stay in input order.
    pub fn by_stop_limit(&self, mut partition: Partition) -> Partition {
        let Some(limit) = self.params.max_stops() else {
            return partition;
        };
        if partition.feasible.len() <= limit {
            return partition;
        }

        let mut ranked = partition.feasible.clone();
        if self.params.objective == Objective::MaximizeRevenue {
            let jobs = &self.params.jobs;
            ranked.sort_by(|&a, &b| jobs[b].revenue.total_cmp(&jobs[a].revenue));
        }
        let mut kept = ranked[..limit].to_vec();
        kept.sort_unstable();

        for index in std::mem::take(&mut partition.feasible) {
            if kept.binary_search(&index).is_err() {
                partition.exclude(self.params, index, ExclusionReason::ExceedsStopLimit);
            }
        }
        partition.feasible = kept;
        partition
    }
}
