//! Real Las Vegas / Henderson locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. They are routable with the OSRM
//! Nevada extract.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Inspector's office, used as the home base.
pub const HOME_BASE: Location = Location::new("Field Office", 36.1126, -115.1767);

// ============================================================================
// Strip area
// ============================================================================

pub const STRIP_SITES: &[Location] = &[
    Location::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Location::new("SW Steakhouse", 36.1262145, -115.1669146),
    Location::new("Sinatra", 36.1300035, -115.1654850),
    Location::new("Public House", 36.1219193, -115.1689317),
    Location::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Location::new("Yard House", 36.1177147, -115.1691992),
    Location::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Location::new("Spago by Wolfgang Puck", 36.1139368, -115.1741462),
    Location::new("Grand Lux Cafe", 36.1216416, -115.1685024),
    Location::new("Bacchanal Buffet", 36.1159581, -115.1762929),
    Location::new("Il Fornaio", 36.1024474, -115.1740110),
    Location::new("Charlie Palmer Steak", 36.0910624, -115.1743364),
];

// ============================================================================
// Henderson / East Las Vegas
// ============================================================================

pub const HENDERSON_SITES: &[Location] = &[
    Location::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Location::new("Islander's Grill", 36.0335058, -114.9856162),
    Location::new("Naga", 36.0137634, -114.9928676),
    Location::new("RibCage", 35.9949754, -115.0999810),
    Location::new("Buffalo Wild Wings Henderson", 36.0090449, -114.9917034),
    Location::new("Green Valley Ranch Area", 36.0308, -115.0825),
    Location::new("Sunset Station Area", 36.0614, -115.0631),
];

// ============================================================================
// North Las Vegas
// ============================================================================

pub const NORTH_VEGAS_SITES: &[Location] = &[
    Location::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Location::new("Roberto's Taco Shop", 36.1452953, -115.0478347),
    Location::new("Monarca Mexican Restaurant", 36.1440711, -115.0634197),
    Location::new("Pizza Hut North", 36.1443292, -115.0624966),
    Location::new("La Costa del Sol", 36.1470458, -115.0644345),
];

// ============================================================================
// South Strip / Airport
// ============================================================================

pub const SOUTH_STRIP_SITES: &[Location] = &[
    Location::new("Buffalo Wild Wings South", 36.0543044, -115.1714860),
    Location::new("Bootlegger Bistro", 36.0492047, -115.1715744),
    Location::new("Denny's South", 36.0591086, -115.1717250),
    Location::new("kabuki Japanese", 36.0675472, -115.1779391),
    Location::new("Mikos Izakaya", 36.0429503, -115.1527627),
    Location::new("Budget Suites South", 36.0366259, -115.1713361),
];

/// Every site above.
pub fn all_sites() -> Vec<&'static Location> {
    STRIP_SITES
        .iter()
        .chain(HENDERSON_SITES)
        .chain(NORTH_VEGAS_SITES)
        .chain(SOUTH_STRIP_SITES)
        .collect()
}
