//! Geodesic length of routing geometries.

use butterfly_common::Coordinate;
use geo::{GeodesicLength, LineString};

/// Sum, over consecutive coordinate pairs, of the WGS-84 geodesic
/// inverse-distance. 3D coordinates are reduced to 2D before measurement
/// (`Coordinate` is always 2D here); the result is in meters.
///
/// Translation-invariant: reversing the input yields the same length.
pub fn geodesic_length(coords: &[Coordinate]) -> f64 {
    if coords.len() < 2 {
        return 0.0;
    }
    let line: LineString<f64> = coords.iter().map(|c| (c.lon, c.lat)).collect();
    line.geodesic_length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_reversal_invariant() {
        let coords = vec![
            Coordinate::new(4.071149, 46.037603),
            Coordinate::new(4.070917, 46.036995),
            Coordinate::new(4.070796, 46.036609),
        ];
        let forward = geodesic_length(&coords);
        let mut reversed = coords.clone();
        reversed.reverse();
        let backward = geodesic_length(&reversed);
        assert!((forward - backward).abs() < 1e-6);
    }

    #[test]
    fn single_point_has_zero_length() {
        let coords = vec![Coordinate::new(0.0, 0.0)];
        assert_eq!(geodesic_length(&coords), 0.0);
    }
}
