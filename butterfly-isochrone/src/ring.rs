//! Ring differencing ("nesting dolls"): carve each threshold's raw polygon
//! down to the annulus between it and the next-smaller threshold.
//!
//! Grounded on `OsmGtIsochrone.__clean_isochrones` / `__improve_isochrone`:
//! thresholds are walked largest-to-smallest, each ring is the difference
//! against its next-smaller neighbor, improved by re-adding a buffered
//! union of that threshold's own roads and subtracting the water mask, then
//! differenced against everything already emitted. The smallest threshold
//! is handled last against the full accumulator, and is only improved when
//! it's the only threshold present.

use crate::params::Threshold;
use crate::polygon::{self, ROADS_BUFFER_EROSION_DIVISOR};
use butterfly_common::{Coordinate, Error};
use butterfly_geometry::convert_to_polygon;
use geo::{BooleanOps, Geometry, MultiPolygon};

pub const TIME_UNIT: &str = "minutes";
pub const DISTANCE_UNIT: &str = "meters";

#[derive(Debug, Clone)]
pub struct PolygonRecord {
    pub iso_name: f64,
    pub iso_distance: f64,
    pub time_unit: &'static str,
    pub distance_unit: &'static str,
    pub geometry: geo::Polygon<f64>,
}

/// `raw_polygons[i]` is the synthesized (buffered, closed, exterior-only)
/// polygon for `thresholds[i]`'s independently-reached sub-network.
/// `marked_roads[i]` is the geometry of network rows whose final assigned
/// threshold is `thresholds[i]`, used to re-add a threshold's own roads
/// during ring improvement. Both slices are ordered the same as
/// `thresholds`, which must be sorted by distance descending.
pub fn build_rings(
    thresholds: &[Threshold],
    raw_polygons: &[MultiPolygon<f64>],
    marked_roads: &[Vec<Vec<Coordinate>>],
    water_mask: &MultiPolygon<f64>,
) -> Result<Vec<PolygonRecord>, Error> {
    let n = thresholds.len();
    let mut accumulator: MultiPolygon<f64> = MultiPolygon::new(vec![]);
    let mut output = Vec::new();

    for i in 0..n {
        let is_smallest = i == n - 1;
        let mut ring = if is_smallest {
            raw_polygons[i].difference(&accumulator)
        } else {
            raw_polygons[i].difference(&raw_polygons[i + 1])
        };

        if !is_smallest {
            ring = improve(&ring, &marked_roads[i], water_mask);
            if !accumulator.0.is_empty() {
                ring = ring.difference(&accumulator);
            }
            accumulator = accumulator.union(&ring);
        } else if n == 1 {
            ring = improve(&ring, &marked_roads[i], water_mask);
        }

        for part in convert_to_polygon(Geometry::MultiPolygon(ring))? {
            output.push(PolygonRecord {
                iso_name: thresholds[i].time_minutes,
                iso_distance: thresholds[i].distance_meters,
                time_unit: TIME_UNIT,
                distance_unit: DISTANCE_UNIT,
                geometry: part,
            });
        }
    }

    Ok(output)
}

fn improve(ring: &MultiPolygon<f64>, roads: &[Vec<Coordinate>], water_mask: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let roads_buffered = polygon::buffer_lines_union(roads, polygon::PATH_BUFFERED);
    let roads_buffered =
        polygon::morphological_close(&roads_buffered, polygon::PATH_BUFFERED / ROADS_BUFFER_EROSION_DIVISOR, 0.0);
    let without_water = ring.difference(water_mask);
    without_water.union(&roads_buffered)
}
