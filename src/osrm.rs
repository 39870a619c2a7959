//! OSRM HTTP adapter for distance and duration matrices.
//!
//! Uses the `table` service with `annotations=duration,distance`. Large
//! location lists are split into batches of source rows so a single request
//! never grows beyond `batch_size` x N cells.

use std::env;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::OptimizeError;
use crate::model::Coordinate;
use crate::traits::{DistanceMatrixProvider, TravelMatrices};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
    /// Maximum number of source rows requested per table call.
    pub batch_size: usize,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
            batch_size: 100,
        }
    }
}

impl OsrmConfig {
    /// Defaults overridden by `OSRM_BASE_URL`, `OSRM_PROFILE`,
    /// `OSRM_TIMEOUT_SECS` and `OSRM_BATCH_SIZE` when set.
    pub fn from_env() -> Result<Self, OptimizeError> {
        let mut config = Self::default();
        if let Ok(url) = env::var("OSRM_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(profile) = env::var("OSRM_PROFILE") {
            config.profile = profile;
        }
        if let Ok(raw) = env::var("OSRM_TIMEOUT_SECS") {
            config.timeout_secs = raw
                .parse()
                .map_err(|_| OptimizeError::config("OSRM_TIMEOUT_SECS", format!("not an integer: {raw}")))?;
        }
        if let Ok(raw) = env::var("OSRM_BATCH_SIZE") {
            config.batch_size = raw
                .parse()
                .map_err(|_| OptimizeError::config("OSRM_BATCH_SIZE", format!("not an integer: {raw}")))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.batch_size == 0 {
            return Err(OptimizeError::config("batch_size", "must be at least 1"));
        }
        if self.base_url.is_empty() {
            return Err(OptimizeError::config("base_url", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn table_url(&self, coords: &str, sources: &[usize]) -> String {
        let sources = sources
            .iter()
            .map(|index| index.to_string())
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/table/v1/{}/{}?annotations=duration,distance&sources={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords,
            sources
        )
    }

    #[instrument(skip_all, fields(sources = sources.len()))]
    fn fetch_rows(&self, coords: &str, sources: &[usize]) -> Result<TableResponse, OptimizeError> {
        let url = self.table_url(coords, sources);
        debug!(%url, "requesting OSRM table");
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())?;
        Ok(response.json::<TableResponse>()?)
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrices_for(&self, locations: &[Coordinate]) -> Result<TravelMatrices, OptimizeError> {
        let n = locations.len();
        if n == 0 {
            return Ok(TravelMatrices::default());
        }

        // OSRM expects lng,lat.
        let coords = locations
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.longitude, c.latitude))
            .collect::<Vec<_>>()
            .join(";");

        let mut matrices = TravelMatrices {
            distances_km: vec![vec![0.0; n]; n],
            durations_secs: vec![vec![0.0; n]; n],
        };
        let all: Vec<usize> = (0..n).collect();
        for sources in all.chunks(self.config.batch_size) {
            let body = self.fetch_rows(&coords, sources)?;
            apply_table_response(body, sources, n, &mut matrices)?;
        }
        Ok(matrices)
    }
}

/// OSRM Table API response.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    pub code: String,
    pub message: Option<String>,
    /// Seconds; `None` cells mean no route.
    pub durations: Option<Vec<Vec<Option<f64>>>>,
    /// Metres; `None` cells mean no route.
    pub distances: Option<Vec<Vec<Option<f64>>>>,
}

/// Copy the rows of one table response into the full matrices.
///
/// `sources` lists the global row indices the response covers, in order.
pub fn apply_table_response(
    body: TableResponse,
    sources: &[usize],
    n: usize,
    matrices: &mut TravelMatrices,
) -> Result<(), OptimizeError> {
    if body.code != "Ok" {
        return Err(OptimizeError::Provider {
            message: format!(
                "OSRM returned {}: {}",
                body.code,
                body.message.unwrap_or_default()
            ),
        });
    }
    let (Some(durations), Some(distances)) = (body.durations, body.distances) else {
        return Err(OptimizeError::Provider {
            message: "OSRM response is missing duration or distance annotations".to_string(),
        });
    };
    if durations.len() != sources.len() || distances.len() != sources.len() {
        return Err(OptimizeError::MatrixShape {
            expected: n,
            found: format!("{} rows for {} sources", durations.len(), sources.len()),
        });
    }

    for ((&row, duration_row), distance_row) in sources.iter().zip(durations).zip(distances) {
        if duration_row.len() != n || distance_row.len() != n {
            return Err(OptimizeError::MatrixShape {
                expected: n,
                found: format!("row {row} with {} columns", duration_row.len()),
            });
        }
        for (col, (duration, distance)) in duration_row.into_iter().zip(distance_row).enumerate() {
            let (Some(secs), Some(metres)) = (duration, distance) else {
                return Err(OptimizeError::NoRoute { from: row, to: col });
            };
            matrices.durations_secs[row][col] = secs;
            matrices.distances_km[row][col] = metres / 1000.0;
        }
    }
    Ok(())
}
