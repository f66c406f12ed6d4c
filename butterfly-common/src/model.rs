//! Shared data types: coordinates, transport mode, and topology tagging.

use serde::{Deserialize, Serialize};

/// The OSM base URL used to derive `osm_url` fields (§3 of the routing spec).
pub const OSM_BASE_URL: &str = "https://www.openstreetmap.org";

/// A `(lon, lat)` pair in EPSG:4326.
///
/// Coordinates are compared and hashed by their raw bit patterns, not by
/// numeric tolerance: OSM coordinates are reused verbatim and
/// midpoint-refinement produces deterministic bit-exact midpoints, so exact
/// equality is both safe and required for intersection detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// WKT representation used as the vertex name in the routing graph.
    pub fn wkt(&self) -> String {
        format!("POINT({} {})", fmt_coord(self.lon), fmt_coord(self.lat))
    }

    fn midpoint(self, other: Coordinate) -> Coordinate {
        Coordinate::new((self.lon + other.lon) / 2.0, (self.lat + other.lat) / 2.0)
    }
}

fn fmt_coord(v: f64) -> String {
    // Full f64 precision, trimmed of a trailing ".0" the way WKT emitters do.
    let s = format!("{v:.15}");
    let s = s.trim_end_matches('0');
    let s = s.trim_end_matches('.');
    s.to_string()
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.lon.to_bits() == other.lon.to_bits() && self.lat.to_bits() == other.lat.to_bits()
    }
}
impl Eq for Coordinate {}

impl std::hash::Hash for Coordinate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.lon.to_bits().hash(state);
        self.lat.to_bits().hash(state);
    }
}

/// Midpoint-refinement interpolation: `refine(coords, n)` inserts the
/// arithmetic midpoint between every adjacent pair, recursively, `n` times.
///
/// `|refine(c, n)| = 2^n * (|c| - 1) + 1`; the original coordinates are
/// preserved as a subsequence; the result is deterministic.
pub fn refine(coords: &[Coordinate], n: u32) -> Vec<Coordinate> {
    if coords.len() < 2 || n == 0 {
        return coords.to_vec();
    }
    let mut current = coords.to_vec();
    for _ in 0..n {
        let mut next = Vec::with_capacity(current.len() * 2 - 1);
        for pair in current.windows(2) {
            next.push(pair[0]);
            next.push(pair[0].midpoint(pair[1]));
        }
        next.push(*current.last().unwrap());
        current = next;
    }
    current
}

/// Transport mode, drives graph directionality and way filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportMode {
    Vehicle,
    Pedestrian,
}

impl TransportMode {
    pub fn is_directed(self) -> bool {
        matches!(self, TransportMode::Vehicle)
    }
}

impl std::str::FromStr for TransportMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vehicle" => Ok(TransportMode::Vehicle),
            "pedestrian" => Ok(TransportMode::Pedestrian),
            other => Err(crate::Error::TransportModeInvalid(other.to_string())),
        }
    }
}

/// Tag attached to every emitted `LineRecord` describing its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    Unchanged,
    Split,
    Added,
}

/// An OSM element kind, used to derive `osm_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    fn as_str(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

pub fn osm_url(kind: ElementKind, osm_id: &str) -> String {
    format!("{OSM_BASE_URL}/{}/{osm_id}", kind.as_str())
}

/// A normalized road/path segment. See §3 of the routing spec for the
/// invariants `topo_uuid` uniqueness relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRecord {
    pub id: String,
    pub geometry: Vec<Coordinate>,
    pub tags: std::collections::HashMap<String, String>,
    pub topology: Topology,
    pub topo_uuid: String,
    pub osm_url: String,
    pub iso_name: Option<f64>,
    pub iso_distance: Option<f64>,
}

impl LineRecord {
    pub fn first(&self) -> Coordinate {
        self.geometry[0]
    }

    pub fn last(&self) -> Coordinate {
        *self.geometry.last().unwrap()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// A single-coordinate record: used for POIs and user-supplied additional
/// nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: String,
    pub geometry: Coordinate,
    pub tags: std::collections::HashMap<String, String>,
    pub topo_uuid: String,
    pub osm_url: String,
}

/// A `PointRecord` that must be spliced into the network as a first-class
/// vertex; fatal if it lies outside the working-area polygon (§4.3).
pub type AdditionalNode = PointRecord;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_length_matches_formula() {
        let coords = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
        ];
        for n in 0..4u32 {
            let r = refine(&coords, n);
            assert_eq!(r.len() as u32, 2u32.pow(n) * (coords.len() as u32 - 1) + 1);
        }
    }

    #[test]
    fn refine_preserves_originals_as_subsequence() {
        let coords = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 2.0),
            Coordinate::new(4.0, 0.0),
        ];
        let r = refine(&coords, 3);
        let mut idx = 0;
        for c in &coords {
            while idx < r.len() && r[idx] != *c {
                idx += 1;
            }
            assert!(idx < r.len(), "original coordinate missing from refine output");
            idx += 1;
        }
    }

    #[test]
    fn coordinate_equality_is_exact() {
        let a = Coordinate::new(1.0, 2.0);
        let b = Coordinate::new(1.0, 2.0);
        assert_eq!(a, b);
        assert_eq!(a.wkt(), b.wkt());
    }

    #[test]
    fn transport_mode_parses() {
        assert!("vehicle".parse::<TransportMode>().unwrap().is_directed());
        assert!(!"pedestrian".parse::<TransportMode>().unwrap().is_directed());
        assert!("car".parse::<TransportMode>().is_err());
    }
}
