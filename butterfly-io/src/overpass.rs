//! Overpass client: HTTP GET with a single `data` form parameter, JSON
//! response with an `elements` array.

use async_trait::async_trait;
use butterfly_common::Error;
use serde::Deserialize;

use crate::retry::{with_retry, RetryPolicy};

const OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverpassElement {
    Node {
        id: i64,
        lon: f64,
        lat: f64,
        #[serde(default)]
        tags: std::collections::HashMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        geometry: Vec<LonLat>,
        #[serde(default)]
        tags: std::collections::HashMap<String, String>,
    },
    Relation {
        id: i64,
        #[serde(default)]
        tags: std::collections::HashMap<String, String>,
        #[serde(default)]
        members: Vec<RelationMember>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationMember {
    #[serde(rename = "type")]
    pub member_type: String,
    #[serde(rename = "ref")]
    pub member_ref: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Vec<LonLat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// Fetches raw OSM elements from the Overpass endpoint. Implemented as a
/// trait so callers (and tests) can substitute a fake transport.
#[async_trait]
pub trait OverpassClient: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<OverpassResponse, Error>;
}

pub struct ReqwestOverpassClient {
    client: reqwest::Client,
    endpoint: String,
    retry_policy: RetryPolicy,
}

impl ReqwestOverpassClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: OVERPASS_ENDPOINT.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for ReqwestOverpassClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OverpassClient for ReqwestOverpassClient {
    async fn fetch(&self, query: &str) -> Result<OverpassResponse, Error> {
        with_retry(self.retry_policy, || async {
            let resp = self
                .client
                .get(&self.endpoint)
                .query(&[("data", query)])
                .send()
                .await
                .map_err(transient_or_failure)?;

            if resp.status().is_server_error() || resp.status().as_u16() == 429 {
                return Err(Error::HttpTransient(format!(
                    "overpass returned {}",
                    resp.status()
                )));
            }
            if !resp.status().is_success() {
                return Err(Error::HttpFailure(format!(
                    "overpass returned {}",
                    resp.status()
                )));
            }

            resp.json::<OverpassResponse>()
                .await
                .map_err(|e| Error::HttpFailure(e.to_string()))
        })
        .await
    }
}

fn transient_or_failure(err: reqwest::Error) -> Error {
    if err.is_connect() || err.is_timeout() {
        Error::HttpTransient(err.to_string())
    } else {
        Error::HttpFailure(err.to_string())
    }
}
