//! Precomputed travel matrix shared by every optimizer.
//!
//! Node layout: `0` is the start location, `1..=jobs` are the feasible jobs in
//! input order, and the end location (if any) is the last node. Permutations
//! handed to [`DistanceMatrix::route_cost`] are over job positions
//! (`0..jobs`), not nodes.

use tracing::debug;

use crate::error::OptimizeError;
use crate::model::Coordinate;
use crate::traits::{DistanceMatrixProvider, TravelMatrices};

/// Start node index.
pub const START: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    locations: Vec<Coordinate>,
    distances: Vec<Vec<f64>>,
    durations: Vec<Vec<f64>>,
    job_count: usize,
    has_end: bool,
}

impl DistanceMatrix {
    /// Build the matrix for `start + jobs [+ end]` with a single provider call.
    pub fn build<P: DistanceMatrixProvider + ?Sized>(
        provider: &P,
        start: Coordinate,
        jobs: &[Coordinate],
        end: Option<Coordinate>,
    ) -> Result<Self, OptimizeError> {
        let mut locations = Vec::with_capacity(jobs.len() + 2);
        locations.push(start);
        locations.extend_from_slice(jobs);
        locations.extend(end);

        let matrices = provider.matrices_for(&locations)?;
        Self::from_matrices(locations, matrices, jobs.len(), end.is_some())
    }

    /// Wrap provider output, checking its shape and values.
    ///
    /// The diagonal is forced to zero.
    pub fn from_matrices(
        locations: Vec<Coordinate>,
        matrices: TravelMatrices,
        job_count: usize,
        has_end: bool,
    ) -> Result<Self, OptimizeError> {
        let n = locations.len();
        let expected_nodes = job_count + 1 + usize::from(has_end);
        if n != expected_nodes {
            return Err(OptimizeError::MatrixShape {
                expected: expected_nodes,
                found: format!("{n} locations"),
            });
        }

        let TravelMatrices {
            mut distances_km,
            mut durations_secs,
        } = matrices;
        for (name, matrix) in [("distance", &distances_km), ("duration", &durations_secs)] {
            if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
                return Err(OptimizeError::MatrixShape {
                    expected: n,
                    found: format!("{name} matrix with {} rows", matrix.len()),
                });
            }
        }
        for i in 0..n {
            for j in 0..n {
                let ok = |v: f64| v.is_finite() && v >= 0.0;
                if !ok(distances_km[i][j]) || !ok(durations_secs[i][j]) {
                    return Err(OptimizeError::InvalidMatrixValue { row: i, col: j });
                }
            }
            distances_km[i][i] = 0.0;
            durations_secs[i][i] = 0.0;
        }

        let matrix = Self {
            locations,
            distances: distances_km,
            durations: durations_secs,
            job_count,
            has_end,
        };
        debug!(nodes = n, symmetric = matrix.is_symmetric(), "distance matrix ready");
        Ok(matrix)
    }

    /// Number of nodes (start + jobs + optional end).
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn job_count(&self) -> usize {
        self.job_count
    }

    pub fn locations(&self) -> &[Coordinate] {
        &self.locations
    }

    /// Node index of the job at position `job` in the feasible job list.
    pub const fn job_node(job: usize) -> usize {
        job + 1
    }

    pub fn end_node(&self) -> Option<usize> {
        self.has_end.then(|| self.job_count + 1)
    }

    /// Kilometres from node `i` to node `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[i][j]
    }

    /// Seconds from node `i` to node `j`.
    pub fn duration(&self, i: usize, j: usize) -> f64 {
        self.durations[i][j]
    }

    /// Node pairs traversed by a job permutation, start and end legs included.
    ///
    /// An empty permutation has no legs: the technician stays home.
    pub fn legs<'a>(&'a self, permutation: &'a [usize]) -> impl Iterator<Item = (usize, usize)> + 'a {
        let nodes = permutation.iter().map(|&job| Self::job_node(job));
        let tail = if permutation.is_empty() { None } else { self.end_node() };
        let path: Vec<usize> = std::iter::once(START).chain(nodes).chain(tail).collect();
        let count = if permutation.is_empty() { 0 } else { path.len() - 1 };
        (0..count).map(move |k| (path[k], path[k + 1]))
    }

    /// Sum of leg distances for a visiting order.
    pub fn route_cost(&self, permutation: &[usize]) -> f64 {
        self.legs(permutation).map(|(i, j)| self.distance(i, j)).sum()
    }

    /// Sum of leg travel durations for a visiting order.
    pub fn route_duration(&self, permutation: &[usize]) -> f64 {
        self.legs(permutation).map(|(i, j)| self.duration(i, j)).sum()
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| {
            (i + 1..n).all(|j| {
                self.distances[i][j] == self.distances[j][i] && self.durations[i][j] == self.durations[j][i]
            })
        })
    }

    /// Matrix restricted to the given job positions, kept in the given order.
    pub fn retain_jobs(&self, keep: &[usize]) -> Self {
        let mut nodes = Vec::with_capacity(keep.len() + 2);
        nodes.push(START);
        nodes.extend(keep.iter().map(|&job| Self::job_node(job)));
        nodes.extend(self.end_node());

        let pick = |source: &Vec<Vec<f64>>| -> Vec<Vec<f64>> {
            nodes
                .iter()
                .map(|&i| nodes.iter().map(|&j| source[i][j]).collect())
                .collect()
        };

        Self {
            locations: nodes.iter().map(|&i| self.locations[i]).collect(),
            distances: pick(&self.distances),
            durations: pick(&self.durations),
            job_count: keep.len(),
            has_end: self.has_end,
        }
    }
}
