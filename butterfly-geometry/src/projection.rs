//! Projection between EPSG codes, used only to compute metric buffers for
//! the isochrone bounding box. The routing graph itself stays in EPSG:4326.

use butterfly_common::Coordinate;

const EARTH_RADIUS_M: f64 = 6_378_137.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epsg {
    Wgs84,
    WebMercator,
}

/// Identity when `from == to`; otherwise a geographic-to-projected
/// transform between EPSG:4326 (WGS-84) and EPSG:3857 (Web Mercator).
pub fn project(coord: Coordinate, from: Epsg, to: Epsg) -> Coordinate {
    match (from, to) {
        (Epsg::Wgs84, Epsg::Wgs84) | (Epsg::WebMercator, Epsg::WebMercator) => coord,
        (Epsg::Wgs84, Epsg::WebMercator) => {
            let x = coord.lon.to_radians() * EARTH_RADIUS_M;
            let y = (coord.lat.to_radians() / 2.0 + std::f64::consts::FRAC_PI_4)
                .tan()
                .ln()
                * EARTH_RADIUS_M;
            Coordinate::new(x, y)
        }
        (Epsg::WebMercator, Epsg::Wgs84) => {
            let lon = (coord.lon / EARTH_RADIUS_M).to_degrees();
            let lat = (2.0 * (coord.lat / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
                .to_degrees();
            Coordinate::new(lon, lat)
        }
    }
}
