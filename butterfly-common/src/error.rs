//! Error types shared across the butterfly-osm routing pipeline.

use thiserror::Error;

/// Error kinds surfaced by the routing pipeline.
///
/// `HttpTransient` is produced only inside `butterfly-io`'s retry loop; it is
/// never returned to a facade caller. After the retry budget is exhausted it
/// is converted to `HttpFailure`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("location could not be resolved to an administrative area")]
    LocationUnresolved,

    #[error("OSM data is empty")]
    EmptyOsmData,

    #[error("additional node(s) outside working area: {0:?}")]
    AdditionalNodeOutsideArea(Vec<String>),

    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("transport mode invalid: {0}")]
    TransportModeInvalid(String),

    #[error("isochrone limit: {0}")]
    IsochroneLimit(String),

    #[error("transient HTTP error: {0}")]
    HttpTransient(String),

    #[error("HTTP request failed after retries: {0}")]
    HttpFailure(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
