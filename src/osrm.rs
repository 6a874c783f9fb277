//! OSRM HTTP adapter for distance tables and route geometry.

use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::model::Coordinate;
use crate::polyline::{OSRM_PRECISION, Polyline};
use crate::traits::{RawTable, RoutingBackend};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 30,
        }
    }
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn table_url(&self, locations: &[Coordinate]) -> String {
        format!(
            "{}/table/v1/{}/{}?annotations=distance,duration",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coordinate_path(locations)
        )
    }

    pub fn route_url(&self, locations: &[Coordinate]) -> String {
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coordinate_path(locations)
        )
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.json::<T>()?)
    }
}

impl RoutingBackend for OsrmClient {
    fn table(&self, locations: &[Coordinate]) -> Result<RawTable, FetchError> {
        if locations.is_empty() {
            return Ok(RawTable {
                distances: Vec::new(),
                durations: Vec::new(),
            });
        }

        debug!(locations = locations.len(), "requesting OSRM table");
        let body: OsrmTableResponse = self.get(self.table_url(locations))?;
        body.into_table(locations.len())
    }

    fn route(&self, locations: &[Coordinate]) -> Result<Polyline, FetchError> {
        if locations.len() < 2 {
            return Ok(Polyline::default());
        }

        let body: OsrmRouteResponse = self.get(self.route_url(locations))?;
        if body.code != "Ok" {
            return Err(FetchError::Code(body.code));
        }
        let geometry = body
            .routes
            .into_iter()
            .next()
            .map(|route| route.geometry)
            .ok_or_else(|| FetchError::Decode("route response without routes".to_string()))?;
        Polyline::decode(&geometry, OSRM_PRECISION)
    }
}

/// `lon,lat` pairs joined by `;`, as OSRM expects.
fn coordinate_path(locations: &[Coordinate]) -> String {
    locations
        .iter()
        .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    fn into_table(self, size: usize) -> Result<RawTable, FetchError> {
        if self.code != "Ok" {
            return Err(FetchError::Code(self.code));
        }
        let (Some(distances), Some(durations)) = (self.distances, self.durations) else {
            return Err(FetchError::Decode("table response without distances or durations".to_string()));
        };
        let square = |rows: &Vec<Vec<Option<f64>>>| rows.len() == size && rows.iter().all(|row| row.len() == size);
        if !square(&distances) || !square(&durations) {
            return Err(FetchError::Decode(format!("table response is not {size}x{size}")));
        }
        Ok(RawTable { distances, durations })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
}
