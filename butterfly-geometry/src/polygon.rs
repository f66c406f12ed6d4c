//! Polygon/MultiPolygon normalization.

use butterfly_common::Error;
use geo::{Geometry, Polygon};

/// Normalizes a `Polygon` to a single-element vec and a `MultiPolygon` to
/// its parts. Any other geometry is a fatal contract violation.
pub fn convert_to_polygon(geom: Geometry<f64>) -> Result<Vec<Polygon<f64>>, Error> {
    match geom {
        Geometry::Polygon(p) => Ok(vec![p]),
        Geometry::MultiPolygon(mp) => Ok(mp.into_iter().collect()),
        other => Err(Error::UnsupportedGeometry(format!(
            "expected Polygon or MultiPolygon, got {other:?}"
        ))),
    }
}
