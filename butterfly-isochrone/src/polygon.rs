//! Polygon synthesis: buffer, union, morphological close, and exterior
//! extraction for one isochrone threshold's reached sub-network.
//!
//! Grounded on `OsmGtIsochrone._compute_isochrone`'s polygon branch: buffer
//! each reached line, union into polygon parts (to keep disconnected
//! sub-networks separate), then dilate-then-erode each part (a closing
//! operation) before taking its exterior ring. Buffer distances use
//! `geo_buffer`, the crate this pack's `other_examples` corpus reaches for
//! polygon buffering — `geo` itself has no buffer operation.
//!
//! The original buffers its network `GeoDataFrame` directly in EPSG:4326
//! (no reprojection — `reprojection` is used only for the bbox, per
//! spec.md §4.1), so these knobs are degree-scale approximations of meter
//! distances rather than a true metric buffer. `DEGREES_PER_METER` is the
//! approximate conversion at mid-latitudes, used so the named constants can
//! stay expressed in meters (matching the original's `path_buffered`
//! naming) while the geometry they're applied to is still EPSG:4326.

use butterfly_common::Coordinate;
use butterfly_geometry::hull::concave_hull;
use geo::{BooleanOps, LineString, MultiPolygon, Polygon};
use geo_buffer::{buffer_multi_polygon, buffer_polygon};

/// Degrees per meter at mid-latitudes (1 degree of longitude/latitude is
/// about 111,320 m). Approximate, not a projection — good enough for the
/// fringe-smoothing buffers, which are small relative to a bbox.
const DEGREES_PER_METER: f64 = 1.0 / 111_320.0;

/// Half-width, in meters, used to fatten reached road lines into a polygon
/// before unioning. Matches the original's `path_buffered` display knob.
pub const PATH_BUFFERED_METERS: f64 = 5.0;
/// Outward buffer distance for the dilate step of the closing operation.
pub const DILATION_METERS: f64 = 25.0;
/// Inward buffer distance for the erode step; kept below `DILATION_METERS`
/// so the operation never shrinks the reached area (closing, not opening).
pub const EROSION_METERS: f64 = 20.0;
/// Divisor applied to `PATH_BUFFERED_METERS` when re-adding a threshold's
/// own roads during ring improvement (`__ROADS_BUFFER_EROSION_DIVISOR`).
pub const ROADS_BUFFER_EROSION_DIVISOR: f64 = 10.0;
/// Alpha for the concave-hull fallback: keeps Delaunay triangles whose
/// circumradius is under ten dilation-widths, loose enough to bridge the
/// gaps a sparse reached-network leaves once it's eroded away to nothing.
const CONCAVE_HULL_ALPHA: f64 = 1.0 / (DILATION_METERS * 10.0 * DEGREES_PER_METER);

/// Degree-scale equivalent of [`PATH_BUFFERED_METERS`], the unit `geo_buffer`
/// actually operates in since the reached network stays in EPSG:4326.
pub const PATH_BUFFERED: f64 = PATH_BUFFERED_METERS * DEGREES_PER_METER;
/// Degree-scale equivalent of [`DILATION_METERS`].
pub const DILATION: f64 = DILATION_METERS * DEGREES_PER_METER;
/// Degree-scale equivalent of [`EROSION_METERS`].
pub const EROSION: f64 = EROSION_METERS * DEGREES_PER_METER;

/// Buffers every line by `width` and unions the result. Distinct connected
/// sub-networks remain as separate polygon parts.
pub fn buffer_lines_union(lines: &[Vec<Coordinate>], width: f64) -> MultiPolygon<f64> {
    lines
        .iter()
        .filter(|coords| coords.len() >= 2)
        .map(|coords| line_buffer(coords, width))
        .fold(MultiPolygon::new(vec![]), |acc, mp| acc.union(&mp))
}

/// Buffers a single line. `geo_buffer` only offsets polygons, so the line
/// is traced there and back into a degenerate zero-area polygon first —
/// its offset approximates a line buffer of the same width.
fn line_buffer(coords: &[Coordinate], width: f64) -> MultiPolygon<f64> {
    let forward: Vec<(f64, f64)> = coords.iter().map(|c| (c.lon, c.lat)).collect();
    let mut ring = forward.clone();
    ring.extend(forward.into_iter().rev());
    let degenerate = Polygon::new(LineString::from(ring), vec![]);
    buffer_polygon(&degenerate, width)
}

/// Dilates then erodes each polygon part (morphological close).
pub fn morphological_close(mp: &MultiPolygon<f64>, dilation: f64, erosion: f64) -> MultiPolygon<f64> {
    let dilated = buffer_multi_polygon(mp, dilation);
    buffer_multi_polygon(&dilated, -erosion)
}

/// Buffers, unions, morphologically closes, and flattens a threshold's
/// reached sub-network into its exterior-only polygon parts. Falls back to
/// a concave hull over the reached network's own vertices when buffering
/// and closing collapses to nothing, e.g. a handful of short, disconnected
/// segments eroded away entirely.
pub fn synthesize(lines: &[Vec<Coordinate>]) -> MultiPolygon<f64> {
    let unioned = buffer_lines_union(lines, PATH_BUFFERED);
    let closed = morphological_close(&unioned, DILATION, EROSION);
    let exterior = exterior_only(&closed);
    if exterior.0.is_empty() {
        return concave_hull_fallback(lines);
    }
    exterior
}

/// Concave hull over every vertex of `lines`, used when [`synthesize`]'s
/// buffer-union-close pipeline yields an empty polygon.
fn concave_hull_fallback(lines: &[Vec<Coordinate>]) -> MultiPolygon<f64> {
    let points: Vec<Coordinate> = lines.iter().flatten().copied().collect();
    if points.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    MultiPolygon::new(vec![concave_hull(&points, CONCAVE_HULL_ALPHA)])
}

/// Replaces each polygon part with a hole-free polygon over its exterior
/// ring only.
pub fn exterior_only(mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(
        mp.iter()
            .map(|p| Polygon::new(p.exterior().clone(), vec![]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffering_a_line_produces_nonempty_area() {
        let coords = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.0)];
        let mp = buffer_lines_union(&[coords], 0.0005);
        assert!(!mp.0.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_polygon() {
        let mp = buffer_lines_union(&[], 1.0);
        assert!(mp.0.is_empty());
    }

    #[test]
    fn named_buffer_constants_stay_degree_scale() {
        // 5 m should land well under a thousandth of a degree, not several
        // whole degrees (which is what applying the raw meter value would do).
        assert!(PATH_BUFFERED < 0.001);
        assert!(DILATION > PATH_BUFFERED);
        assert!(EROSION < DILATION);
    }

    #[test]
    fn concave_hull_fallback_builds_polygon_from_line_vertices() {
        let lines = vec![
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)],
            vec![Coordinate::new(1.0, 1.0), Coordinate::new(0.0, 1.0)],
        ];
        let result = concave_hull_fallback(&lines);
        assert!(!result.0.is_empty());
    }

    #[test]
    fn concave_hull_fallback_of_no_points_is_empty() {
        let result = concave_hull_fallback(&[]);
        assert!(result.0.is_empty());
    }

    #[test]
    fn synthesize_falls_back_when_buffer_union_is_empty() {
        // A single-coordinate line is dropped by `buffer_lines_union`'s
        // `len() >= 2` filter, so the buffer-and-close pipeline produces an
        // empty polygon and `synthesize` must route through the concave-hull
        // fallback rather than returning nothing.
        let lines = vec![
            vec![Coordinate::new(0.0, 0.0)],
            vec![Coordinate::new(1.0, 0.0)],
            vec![Coordinate::new(1.0, 1.0)],
            vec![Coordinate::new(0.0, 1.0)],
        ];
        let result = synthesize(&lines);
        assert!(!result.0.is_empty());
    }

    #[test]
    fn synthesize_of_no_lines_is_empty() {
        let result = synthesize(&[]);
        assert!(result.0.is_empty());
    }

    #[test]
    fn exterior_only_strips_holes() {
        let outer = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0), (1.0, 1.0)]);
        let mp = MultiPolygon::new(vec![Polygon::new(outer, vec![hole])]);
        let cleaned = exterior_only(&mp);
        assert!(cleaned.0[0].interiors().is_empty());
    }
}
