//! Optimizer output: ordered stops plus run metrics.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifies which strategy produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    NearestNeighbor,
    TwoOpt,
    Genetic,
    SimulatedAnnealing,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::NearestNeighbor,
        Algorithm::TwoOpt,
        Algorithm::Genetic,
        Algorithm::SimulatedAnnealing,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::NearestNeighbor => "nearest-neighbor",
            Algorithm::TwoOpt => "two-opt",
            Algorithm::Genetic => "genetic",
            Algorithm::SimulatedAnnealing => "simulated-annealing",
        }
    }

    /// Whether repeated runs may differ (absent a fixed seed).
    pub fn is_stochastic(&self) -> bool {
        matches!(self, Algorithm::Genetic | Algorithm::SimulatedAnnealing)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the feasibility filter dropped a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionReason {
    MissingSkills { missing: Vec<String> },
    UnreachableTimeWindow,
    OutsideWorkingHours,
    ExceedsStopLimit,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::MissingSkills { missing } => {
                write!(f, "missing skills: {}", missing.join(", "))
            }
            ExclusionReason::UnreachableTimeWindow => f.write_str("time window cannot be reached"),
            ExclusionReason::OutsideWorkingHours => f.write_str("cannot finish within working hours"),
            ExclusionReason::ExceedsStopLimit => f.write_str("route stop limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedJob {
    pub job_id: String,
    pub reason: ExclusionReason,
}

/// One visited job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub job_id: String,
    /// Position of the job in the caller's job list.
    pub job_index: usize,
    /// Seconds since midnight.
    pub arrival: i32,
    /// When service begins (after any wait for the job window).
    pub service_start: i32,
    pub departure: i32,
    pub distance_from_previous_km: f64,
    pub travel_secs_from_previous: f64,
}

/// Maximum number of samples a [`CostHistory`] retains.
pub const HISTORY_LIMIT: usize = 1024;

/// Best-cost trace with bounded memory.
///
/// Once full, every other sample is dropped and the sampling stride doubles,
/// so long runs keep an evenly thinned trace. The first push and the latest
/// push are always retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostHistory {
    samples: Vec<f64>,
    stride: usize,
    pending: usize,
}

impl Default for CostHistory {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            stride: 1,
            pending: 0,
        }
    }
}

impl CostHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cost: f64) {
        if self.pending > 0 && self.pending < self.stride {
            // Still inside the tail sample's stride: the tail tracks the latest.
            self.pending += 1;
            if let Some(tail) = self.samples.last_mut() {
                *tail = cost;
            }
            return;
        }
        self.pending = 1;
        if self.samples.len() == HISTORY_LIMIT {
            let mut keep = 0;
            self.samples.retain(|_| {
                keep += 1;
                keep % 2 == 1
            });
            self.stride *= 2;
        }
        self.samples.push(cost);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of pushes represented by each retained sample.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.last().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub initial_cost: f64,
    pub final_cost: f64,
    pub cost_history: CostHistory,
    /// Number of objective evaluations.
    pub evaluations: usize,
    pub elapsed: Duration,
    /// Set when a cancellation signal stopped the run early.
    pub terminated_early: bool,
    pub excluded_jobs: Vec<ExcludedJob>,
    pub warnings: Vec<String>,
    /// Algorithm-specific figures (temperatures, accepted moves, ...).
    pub extras: BTreeMap<String, f64>,
}

impl OptimizationMetrics {
    pub fn excluded_count(&self) -> usize {
        self.excluded_jobs.len()
    }

    /// Relative improvement of final over initial cost, in percent.
    pub fn improvement_percent(&self) -> f64 {
        if self.initial_cost == 0.0 {
            0.0
        } else {
            (self.initial_cost - self.final_cost) / self.initial_cost.abs() * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub technician_id: String,
    pub stops: Vec<RouteStop>,
    /// Kilometres, start and return legs included.
    pub total_distance_km: f64,
    /// From leaving the start location to arriving at the end (or leaving the
    /// last job when there is no end location).
    pub total_duration: Duration,
    pub algorithm: Algorithm,
    /// Only exhaustive methods can claim optimality; every strategy here is a
    /// heuristic.
    pub is_optimal: bool,
    pub iterations: usize,
    pub metrics: OptimizationMetrics,
}

impl OptimizedRoute {
    pub fn job_ids(&self) -> Vec<&str> {
        self.stops.iter().map(|stop| stop.job_id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn cost(&self) -> f64 {
        self.metrics.final_cost
    }
}
