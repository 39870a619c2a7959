//! Scalar cost of a visiting order.
//!
//! Every objective is expressed as a cost to minimize so the optimizers share a
//! single comparison direction; `MaximizeRevenue` minimizes negated revenue plus
//! a weighted travel cost.

use crate::matrix::{DistanceMatrix, START};
use crate::model::{CostRates, Objective, RouteConstraint, RouteOptimizationParameters, ServiceJob};

/// Timing of a single leg ending at a job or at the end location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Leg {
    pub distance_km: f64,
    pub travel_secs: f64,
    pub arrival: f64,
    pub service_start: f64,
    pub departure: f64,
}

/// Aggregates of one simulated route.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScheduleSummary {
    pub distance_km: f64,
    pub travel_secs: f64,
    pub service_secs: f64,
    pub wait_secs: f64,
    pub lateness_secs: f64,
    pub served_revenue: f64,
    /// From leaving the start to the end of the route.
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectiveFunction<'p> {
    objective: Objective,
    rates: CostRates,
    respect_time_windows: bool,
    day_start: f64,
    day_end: f64,
    max_distance_km: Option<f64>,
    max_duration_minutes: Option<f64>,
    matrix: &'p DistanceMatrix,
    jobs: &'p [&'p ServiceJob],
}

impl<'p> ObjectiveFunction<'p> {
    pub fn new(
        params: &RouteOptimizationParameters,
        matrix: &'p DistanceMatrix,
        jobs: &'p [&'p ServiceJob],
    ) -> Self {
        let mut max_distance_km = None;
        let mut max_duration_minutes = None;
        for constraint in &params.constraints {
            match *constraint {
                RouteConstraint::MaxDistanceKm(limit) => {
                    max_distance_km = Some(max_distance_km.map_or(limit, |m: f64| m.min(limit)));
                }
                RouteConstraint::MaxDurationMinutes(limit) => {
                    max_duration_minutes = Some(max_duration_minutes.map_or(limit, |m: f64| m.min(limit)));
                }
                RouteConstraint::MaxStops(_) => {}
            }
        }
        Self {
            objective: params.objective,
            rates: params.cost_rates,
            respect_time_windows: params.respect_time_windows,
            day_start: f64::from(params.day_start()),
            day_end: f64::from(params.day_end()),
            max_distance_km,
            max_duration_minutes,
            matrix,
            jobs,
        }
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// True when lowering total distance always lowers the cost: the
    /// distance objective with no time windows and no duration cap.
    pub fn is_distance_only(&self) -> bool {
        self.objective == Objective::MinimizeDistance
            && !self.respect_time_windows
            && self.max_duration_minutes.is_none()
    }

    /// Cost of visiting the jobs in `permutation` order. Lower is better.
    pub fn cost(&self, permutation: &[usize]) -> f64 {
        let summary = self.walk(permutation, |_, _| {});
        self.cost_of(&summary)
    }

    /// Cost derived from an already simulated schedule.
    pub fn cost_of(&self, summary: &ScheduleSummary) -> f64 {
        let rates = &self.rates;
        let elapsed_minutes = summary.elapsed_secs / 60.0;
        let base = match self.objective {
            Objective::MinimizeDistance => summary.distance_km,
            Objective::MinimizeTime => elapsed_minutes,
            Objective::MinimizeCost => {
                summary.distance_km * rates.cost_per_km + elapsed_minutes / 60.0 * rates.labor_cost_per_hour
            }
            Objective::MaximizeRevenue => {
                -summary.served_revenue + rates.revenue_travel_weight * rates.cost_per_km * summary.distance_km
            }
        };
        base + self.penalties(summary)
    }

    fn penalties(&self, summary: &ScheduleSummary) -> f64 {
        let mut penalty = summary.lateness_secs / 60.0 * self.rates.lateness_penalty_per_minute;
        if let Some(limit) = self.max_distance_km {
            penalty += (summary.distance_km - limit).max(0.0) * self.rates.constraint_penalty;
        }
        if let Some(limit) = self.max_duration_minutes {
            penalty += (summary.elapsed_secs / 60.0 - limit).max(0.0) * self.rates.constraint_penalty;
        }
        penalty
    }

    /// Greedy score of moving from `from_node` to the job at position `job`.
    ///
    /// Nearest-neighbor construction picks the lowest score; it is the
    /// objective's per-leg proxy.
    pub fn leg_score(&self, from_node: usize, job: usize) -> f64 {
        let to_node = DistanceMatrix::job_node(job);
        let km = self.matrix.distance(from_node, to_node);
        let secs = self.matrix.duration(from_node, to_node);
        let rates = &self.rates;
        match self.objective {
            Objective::MinimizeDistance => km,
            Objective::MinimizeTime => secs / 60.0,
            Objective::MinimizeCost => km * rates.cost_per_km + secs / 3600.0 * rates.labor_cost_per_hour,
            Objective::MaximizeRevenue => {
                rates.revenue_travel_weight * rates.cost_per_km * km - self.jobs[job].revenue
            }
        }
    }

    /// Simulate the route, calling `on_stop(job, leg)` for every visited job.
    pub(crate) fn walk<F>(&self, permutation: &[usize], mut on_stop: F) -> ScheduleSummary
    where
        F: FnMut(usize, &Leg),
    {
        let mut summary = ScheduleSummary::default();
        if permutation.is_empty() {
            return summary;
        }

        let mut time = self.day_start;
        let mut previous = START;
        for &job_pos in permutation {
            let job = self.jobs[job_pos];
            let node = DistanceMatrix::job_node(job_pos);
            let distance_km = self.matrix.distance(previous, node);
            let travel_secs = self.matrix.duration(previous, node);
            let arrival = time + travel_secs;

            let mut service_start = arrival;
            let mut late = 0.0;
            if self.respect_time_windows {
                if let Some(window) = &job.time_window {
                    service_start = arrival.max(f64::from(window.start));
                    late = (service_start - f64::from(window.end)).max(0.0);
                }
            }
            let departure = service_start + job.service_seconds();

            summary.distance_km += distance_km;
            summary.travel_secs += travel_secs;
            summary.service_secs += job.service_seconds();
            summary.wait_secs += service_start - arrival;
            summary.lateness_secs += late;
            if late == 0.0 {
                summary.served_revenue += job.revenue;
            }

            on_stop(
                job_pos,
                &Leg {
                    distance_km,
                    travel_secs,
                    arrival,
                    service_start,
                    departure,
                },
            );
            time = departure;
            previous = node;
        }

        if let Some(end) = self.matrix.end_node() {
            summary.distance_km += self.matrix.distance(previous, end);
            summary.travel_secs += self.matrix.duration(previous, end);
            time += self.matrix.duration(previous, end);
        }
        if self.respect_time_windows {
            summary.lateness_secs += (time - self.day_end).max(0.0);
        }
        summary.elapsed_secs = time - self.day_start;
        summary
    }
}
