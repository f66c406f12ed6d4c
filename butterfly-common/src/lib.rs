//! Common utilities for the butterfly-osm toolkit

pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{
    osm_url, refine, AdditionalNode, Coordinate, ElementKind, LineRecord, PointRecord, Topology,
    TransportMode, OSM_BASE_URL,
};