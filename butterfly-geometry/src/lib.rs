//! GeoPrim: geodesic length, projection, interpolation, and hull primitives
//! used throughout the butterfly-osm routing pipeline.

pub mod hull;
pub mod length;
pub mod polygon;
pub mod projection;

pub use butterfly_common::refine;
pub use hull::concave_hull;
pub use length::geodesic_length;
pub use polygon::convert_to_polygon;
pub use projection::{project, Epsg};
