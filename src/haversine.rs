//! Straight-line travel estimates for routing without a road network.
//!
//! Distances are great-circle kilometers. Durations assume one constant
//! driving speed, so the matrices are symmetric and need no network access.

use crate::error::OptimizeError;
use crate::model::Coordinate;
use crate::traits::{DistanceMatrixProvider, TravelMatrices};

/// Urban driving speed used when none is configured.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Mean Earth radius.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// [`DistanceMatrixProvider`] backed by [`haversine_km`].
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Constant travel speed, km/h. Must be positive.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    fn travel_secs(&self, km: f64) -> f64 {
        km / self.speed_kmh * 3600.0
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrices_for(&self, locations: &[Coordinate]) -> Result<TravelMatrices, OptimizeError> {
        if !self.speed_kmh.is_finite() || self.speed_kmh <= 0.0 {
            return Err(OptimizeError::config(
                "speed_kmh",
                format!("must be positive, got {}", self.speed_kmh),
            ));
        }

        let size = locations.len();
        let mut distances_km = vec![vec![0.0; size]; size];
        let mut durations_secs = vec![vec![0.0; size]; size];

        // Symmetric, so each pair is evaluated once.
        for (i, &origin) in locations.iter().enumerate() {
            for (j, &dest) in locations.iter().enumerate().skip(i + 1) {
                let km = haversine_km(origin, dest);
                let secs = self.travel_secs(km);
                distances_km[i][j] = km;
                distances_km[j][i] = km;
                durations_secs[i][j] = secs;
                durations_secs[j][i] = secs;
            }
        }

        Ok(TravelMatrices {
            distances_km,
            durations_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRIP: Coordinate = Coordinate::new(36.1147, -115.1728);
    const DOWNTOWN: Coordinate = Coordinate::new(36.1699, -115.1398);
    const HENDERSON: Coordinate = Coordinate::new(36.0395, -114.9817);

    #[test]
    fn test_coincident_points_are_zero_km_apart() {
        assert!(haversine_km(STRIP, STRIP) < 1e-9);
    }

    #[test]
    fn test_vegas_to_los_angeles_is_about_370_km() {
        let km = haversine_km(Coordinate::new(36.17, -115.14), Coordinate::new(34.05, -118.24));
        assert!((350.0..400.0).contains(&km), "got {km}");
    }

    #[test]
    fn test_matrices_have_zero_diagonal_and_are_symmetric() {
        let sites = [STRIP, DOWNTOWN, HENDERSON];
        let matrices = HaversineMatrix::default().matrices_for(&sites).unwrap();

        for i in 0..sites.len() {
            assert_eq!(matrices.distances_km[i][i], 0.0);
            assert_eq!(matrices.durations_secs[i][i], 0.0);
            for j in 0..sites.len() {
                assert_eq!(matrices.distances_km[i][j], matrices.distances_km[j][i]);
                assert_eq!(matrices.durations_secs[i][j], matrices.durations_secs[j][i]);
            }
        }
        assert!(matrices.distances_km[0][1] > 5.0 && matrices.distances_km[0][1] < 8.0);
    }

    #[test]
    fn test_duration_follows_configured_speed() {
        // 10 km at 40 km/h is a quarter hour.
        assert!((HaversineMatrix::new(40.0).travel_secs(10.0) - 900.0).abs() < 1e-9);
        assert!((HaversineMatrix::new(80.0).travel_secs(10.0) - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_speed_is_a_config_error() {
        let err = HaversineMatrix::new(0.0).matrices_for(&[STRIP]).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidConfig { .. }), "{err}");
    }
}
