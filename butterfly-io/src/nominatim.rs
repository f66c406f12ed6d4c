//! Nominatim client: resolves a free-text location to a working-area
//! polygon and an Overpass area id.

use async_trait::async_trait;
use butterfly_common::Error;
use serde::Deserialize;

use crate::retry::{with_retry, RetryPolicy};

const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
/// Offset Nominatim's `osm_id` by to obtain an Overpass area id.
const AREA_ID_OFFSET: u64 = 3_600_000_000;

#[derive(Debug, Clone, Deserialize)]
pub struct NominatimMatch {
    pub osm_id: u64,
    pub geojson: GeoJsonPolygon,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoJsonPolygon {
    #[serde(rename = "type")]
    pub geom_type: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl NominatimMatch {
    /// The Overpass area id derived from this match's `osm_id`.
    pub fn area_id(&self) -> u64 {
        self.osm_id + AREA_ID_OFFSET
    }

    /// The working-area exterior ring, `geojson.coordinates[0]`.
    pub fn working_area_ring(&self) -> &[[f64; 2]] {
        self.coordinates_ring()
    }

    fn coordinates_ring(&self) -> &[[f64; 2]] {
        self.geojson
            .coordinates
            .first()
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[async_trait]
pub trait NominatimClient: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<NominatimMatch>, Error>;
}

pub struct ReqwestNominatimClient {
    client: reqwest::Client,
    endpoint: String,
    retry_policy: RetryPolicy,
}

impl ReqwestNominatimClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: NOMINATIM_ENDPOINT.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl Default for ReqwestNominatimClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NominatimClient for ReqwestNominatimClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<NominatimMatch>, Error> {
        with_retry(self.retry_policy, || async {
            let resp = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("q", query),
                    ("format", "json"),
                    ("polygon", "1"),
                    ("polygon_geojson", "1"),
                    ("limit", &limit.to_string()),
                ])
                .send()
                .await
                .map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        Error::HttpTransient(e.to_string())
                    } else {
                        Error::HttpFailure(e.to_string())
                    }
                })?;

            if resp.status().is_server_error() {
                return Err(Error::HttpTransient(format!(
                    "nominatim returned {}",
                    resp.status()
                )));
            }

            resp.json::<Vec<NominatimMatch>>()
                .await
                .map_err(|e| Error::HttpFailure(e.to_string()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_id_is_offset_osm_id() {
        let m = NominatimMatch {
            osm_id: 123,
            geojson: GeoJsonPolygon {
                geom_type: "Polygon".into(),
                coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]],
            },
        };
        assert_eq!(m.area_id(), 3_600_000_123);
        assert_eq!(m.working_area_ring().len(), 3);
    }
}
