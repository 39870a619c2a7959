//! Test fixtures for route-optimizer.
//!
//! Provides:
//! - Real Las Vegas / Henderson service sites (from OpenStreetMap)
//! - A predictable Manhattan distance provider and small builders

#![allow(dead_code)]

pub mod las_vegas_locations;

use route_optimizer::model::{Coordinate, ServiceJob, Technician};
use route_optimizer::traits::{DistanceMatrixProvider, TravelMatrices};
use route_optimizer::OptimizeError;

/// Manhattan distance on raw degrees: 1 degree = 1 km, 1 km = 1 minute.
pub struct ManhattanMatrix;

impl DistanceMatrixProvider for ManhattanMatrix {
    fn matrices_for(&self, locations: &[Coordinate]) -> Result<TravelMatrices, OptimizeError> {
        let distances_km: Vec<Vec<f64>> = locations
            .iter()
            .map(|from| {
                locations
                    .iter()
                    .map(|to| (from.latitude - to.latitude).abs() + (from.longitude - to.longitude).abs())
                    .collect()
            })
            .collect();
        let durations_secs = distances_km
            .iter()
            .map(|row| row.iter().map(|km| km * 60.0).collect())
            .collect();
        Ok(TravelMatrices {
            distances_km,
            durations_secs,
        })
    }
}

/// A provider that always fails, standing in for an unreachable routing service.
pub struct FailingMatrix;

impl DistanceMatrixProvider for FailingMatrix {
    fn matrices_for(&self, _locations: &[Coordinate]) -> Result<TravelMatrices, OptimizeError> {
        Err(OptimizeError::Provider {
            message: "routing service unavailable".to_string(),
        })
    }
}

pub fn at(x: f64, y: f64) -> Coordinate {
    Coordinate::new(x, y)
}

pub fn job(id: &str, x: f64, y: f64) -> ServiceJob {
    ServiceJob::new(id, at(x, y))
}

/// Technician at the origin working 08:00-17:00.
pub fn technician(id: &str) -> Technician {
    Technician::new(id, at(0.0, 0.0))
}

pub fn hours(h: i32) -> i32 {
    h * 3600
}

pub fn minutes(m: i32) -> i32 {
    m * 60
}
