//! Water-area mask: union of closed rings extracted from `natural=water`
//! ways and water-relation members, subtracted from isochrone polygons so
//! isochrones don't cross lakes and rivers.
//!
//! Grounded on `OsmGtIsochrone.__get_water_area_from_osm`, which builds a
//! `Polygon` per way/relation-member ring and `unary_union`s them; callers
//! here hand in already-flattened rings (one per way, one per relation
//! member) rather than raw Overpass elements, keeping this crate decoupered
//! from the HTTP element types.

use butterfly_common::Coordinate;
use geo::{BooleanOps, MultiPolygon, Polygon};

/// Builds the union of water-area rings as a single `MultiPolygon`. Rings
/// with fewer than three points are skipped (they can't form a polygon).
pub fn build_water_mask(rings: &[Vec<Coordinate>]) -> MultiPolygon<f64> {
    let polygons: Vec<Polygon<f64>> = rings
        .iter()
        .filter(|ring| ring.len() >= 3)
        .map(|ring| {
            let coords: Vec<(f64, f64)> = ring.iter().map(|c| (c.lon, c.lat)).collect();
            Polygon::new(coords.into(), vec![])
        })
        .collect();

    polygons.into_iter().fold(MultiPolygon::new(vec![]), |acc, p| {
        acc.union(&MultiPolygon::new(vec![p]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rings_yield_empty_mask() {
        let mask = build_water_mask(&[]);
        assert!(mask.0.is_empty());
    }

    #[test]
    fn single_ring_becomes_one_polygon() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let mask = build_water_mask(&[ring]);
        assert_eq!(mask.0.len(), 1);
    }

    #[test]
    fn degenerate_rings_are_skipped() {
        let ring = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)];
        let mask = build_water_mask(&[ring]);
        assert!(mask.0.is_empty());
    }
}
