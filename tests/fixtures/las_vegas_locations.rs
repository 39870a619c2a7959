//! Service sites around Las Vegas / Henderson.
//!
//! Coordinates come from OpenStreetMap and are routable with OSRM Nevada data.

use route_optimizer::model::{Coordinate, ServiceJob};

/// A named service site.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub name: &'static str,
    pub location: Coordinate,
}

impl Site {
    pub const fn new(name: &'static str, latitude: f64, longitude: f64) -> Self {
        Self {
            name,
            location: Coordinate::new(latitude, longitude),
        }
    }

    /// A job at this site, keyed by the site name.
    pub fn job(&self) -> ServiceJob {
        ServiceJob::new(self.name, self.location)
    }
}

// ============================================================================
// Depots (technician start locations)
// ============================================================================

pub const DEPOTS: &[Site] = &[
    Site::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Site::new("MGM Grand", 36.1023654, -115.1688720),
    Site::new("Longhorn Casino", 36.1070664, -115.0591256),
];

// ============================================================================
// Strip
// ============================================================================

pub const STRIP_SITES: &[Site] = &[
    Site::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Site::new("Public House", 36.1219193, -115.1689317),
    Site::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Site::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Site::new("Spago", 36.1139368, -115.1741462),
    Site::new("Grand Lux Cafe", 36.1216416, -115.1685024),
    Site::new("Bacchanal Buffet", 36.1159581, -115.1762929),
    Site::new("Il Fornaio", 36.1024474, -115.1740110),
    Site::new("Charlie Palmer Steak", 36.0910624, -115.1743364),
    Site::new("Pyramid Cafe", 36.0956586, -115.1761902),
];

// ============================================================================
// Henderson / East
// ============================================================================

pub const EAST_SITES: &[Site] = &[
    Site::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Site::new("Islander's Grill", 36.0335058, -114.9856162),
    Site::new("Green Valley Ranch Area", 36.0308, -115.0825),
    Site::new("Sunset Station Area", 36.0614, -115.0631),
    Site::new("Hello Tokyo", 36.1161627, -115.0902096),
    Site::new("Tomo Sushi", 36.0992464, -115.1142123),
    Site::new("Sushi Twister", 36.1007300, -115.0526259),
];

// ============================================================================
// North / South
// ============================================================================

pub const OUTLYING_SITES: &[Site] = &[
    Site::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Site::new("Beers and Bets", 36.1428945, -115.1573836),
    Site::new("Bootlegger Bistro", 36.0492047, -115.1715744),
    Site::new("Budget Suites South", 36.0366259, -115.1713361),
    Site::new("Mikos Izakaya", 36.0429503, -115.1527627),
];

/// Every non-depot site.
pub fn all_sites() -> Vec<Site> {
    let mut all = Vec::with_capacity(STRIP_SITES.len() + EAST_SITES.len() + OUTLYING_SITES.len());
    all.extend_from_slice(STRIP_SITES);
    all.extend_from_slice(EAST_SITES);
    all.extend_from_slice(OUTLYING_SITES);
    all
}

/// Jobs for the first `count` sites.
pub fn sample_jobs(count: usize) -> Vec<ServiceJob> {
    all_sites().iter().take(count).map(Site::job).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_in_vegas_area() {
        for site in all_sites().iter().chain(DEPOTS) {
            let Coordinate { latitude, longitude } = site.location;
            assert!(latitude > 35.9 && latitude < 36.3, "{} lat out of range", site.name);
            assert!(longitude > -115.4 && longitude < -114.8, "{} lng out of range", site.name);
        }
    }
}
