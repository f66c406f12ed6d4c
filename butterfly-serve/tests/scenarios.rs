//! Scenario tests for `RoutingEngine`, against hand-rolled fake
//! `OverpassClient`/`NominatimClient` implementations standing in for the
//! Overpass/Nominatim endpoints (no network access). Scenario names
//! (S2-S6) follow spec.md §8's worked examples; S1 (additional-node
//! splicing uuids) is covered directly in `butterfly-routing`'s topology
//! tests, which already exercise the same splice/split machinery.

use async_trait::async_trait;
use butterfly_common::{Coordinate, Error, TransportMode};
use butterfly_io::overpass::LonLat;
use butterfly_io::{NominatimClient, NominatimMatch, OverpassClient, OverpassElement, OverpassResponse};
use butterfly_serve::RoutingEngine;
use std::sync::Arc;

fn way(id: i64, coords: &[(f64, f64)]) -> OverpassElement {
    OverpassElement::Way {
        id,
        geometry: coords.iter().map(|&(lon, lat)| LonLat { lon, lat }).collect(),
        tags: [("highway".to_string(), "residential".to_string())].into(),
    }
}

/// Side length, in degrees, of each segment in the four-armed mesh below
/// (about 27.8 m at the equator) — fine enough that at least one full edge
/// falls within every isochrone threshold used by the scenario tests.
const MESH_STEP: f64 = 0.00025;
/// Segments per arm; `MESH_STEP * MESH_SEGMENTS` reaches well past the
/// largest threshold exercised (500 m).
const MESH_SEGMENTS: i64 = 25;

/// A four-armed star mesh around the origin, dense enough to produce
/// well-separated concentric isochrone rings.
struct MeshOverpass;

#[async_trait]
impl OverpassClient for MeshOverpass {
    async fn fetch(&self, query: &str) -> Result<OverpassResponse, Error> {
        if !query.contains("highway") {
            return Ok(OverpassResponse { elements: Vec::new() });
        }
        let directions: [(f64, f64); 4] = [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];
        let mut elements = Vec::new();
        let mut id = 1;
        for (dx, dy) in directions {
            for step in 0..MESH_SEGMENTS {
                let from = (dx * MESH_STEP * step as f64, dy * MESH_STEP * step as f64);
                let to = (dx * MESH_STEP * (step + 1) as f64, dy * MESH_STEP * (step + 1) as f64);
                elements.push(way(id, &[from, to]));
                id += 1;
            }
        }
        Ok(OverpassResponse { elements })
    }
}

struct NoNominatim;

#[async_trait]
impl NominatimClient for NoNominatim {
    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<NominatimMatch>, Error> {
        Err(Error::LocationUnresolved)
    }
}

#[tokio::test]
async fn s2_pedestrian_isochrone_rings_have_increasing_area() {
    let engine = RoutingEngine::new(Arc::new(MeshOverpass), Arc::new(NoNominatim));
    let origin = Coordinate::new(0.0, 0.0);
    let output = engine
        .isochrone_times_from_nodes(&[origin], &[2.0, 5.0, 10.0], 3.0, TransportMode::Pedestrian)
        .await
        .expect("isochrone over a connected mesh should succeed");

    assert!(!output.polygons.is_empty());
    let mut by_time: std::collections::HashMap<i64, f64> = std::collections::HashMap::new();
    for record in &output.polygons {
        use geo::Area;
        let key = record.iso_name.round() as i64;
        *by_time.entry(key).or_insert(0.0) += record.geometry.unsigned_area();
    }
    let mut times: Vec<i64> = by_time.keys().copied().collect();
    times.sort();
    assert_eq!(times, vec![2, 5, 10]);
    let areas: Vec<f64> = times.iter().map(|t| by_time[t]).collect();
    assert!(areas[0] < areas[1]);
    assert!(areas[1] < areas[2]);
}

#[tokio::test]
async fn s3_vehicle_isochrone_distances_report_expected_time_labels() {
    let engine = RoutingEngine::new(Arc::new(MeshOverpass), Arc::new(NoNominatim));
    let origin = Coordinate::new(0.0, 0.0);
    let output = engine
        .isochrone_distances_from_nodes(&[origin], &[250.0, 500.0, 1000.0], 3.0, TransportMode::Vehicle)
        .await
        .expect("isochrone over a connected mesh should succeed");

    let mut times: Vec<i64> = output
        .polygons
        .iter()
        .map(|r| r.iso_name.round() as i64)
        .collect();
    times.sort_unstable();
    times.dedup();
    assert_eq!(times, vec![5, 10, 20]);
}

#[tokio::test]
async fn s4_duplicate_pairs_collapse_to_one_result() {
    let engine = RoutingEngine::new(Arc::new(MeshOverpass), Arc::new(NoNominatim));
    let a = Coordinate::new(0.0, 0.0);
    let b = Coordinate::new(0.006, 0.0);
    let bbox = (-0.01, -0.01, 0.01, 0.01);
    let results = engine
        .shortest_path_from_bbox(bbox, TransportMode::Vehicle, &[(a, b), (a, b)])
        .await
        .expect("a path between connected points should be found");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_node, a.wkt());
}

struct RoanneNominatim;

#[async_trait]
impl NominatimClient for RoanneNominatim {
    async fn search(&self, query: &str, _limit: u32) -> Result<Vec<NominatimMatch>, Error> {
        assert!(query.contains("Roanne"));
        Ok(vec![NominatimMatch {
            osm_id: 999,
            geojson: butterfly_io::nominatim::GeoJsonPolygon {
                geom_type: "Polygon".to_string(),
                coordinates: vec![vec![
                    [-0.01, -0.01],
                    [0.01, -0.01],
                    [0.01, 0.01],
                    [-0.01, 0.01],
                    [-0.01, -0.01],
                ]],
            },
        }])
    }
}

#[tokio::test]
async fn s5_additional_node_outside_working_area_is_rejected() {
    let engine = RoutingEngine::new(Arc::new(MeshOverpass), Arc::new(RoanneNominatim));
    let a = Coordinate::new(0.0, 0.0);
    let b = Coordinate::new(0.006, 0.0);
    let outside = Coordinate::new(50.0, 50.0);

    let err = engine
        .shortest_path_from_location("Roanne", TransportMode::Vehicle, &[(a, b), (a, outside)])
        .await
        .expect_err("a pair outside the working area must be rejected");

    match err {
        Error::AdditionalNodeOutsideArea(names) => {
            assert!(names.iter().any(|n| n == &outside.wkt()));
        }
        other => panic!("expected AdditionalNodeOutsideArea, got {other:?}"),
    }
}

#[tokio::test]
async fn s6_isochrone_below_minimum_time_is_rejected() {
    let engine = RoutingEngine::new(Arc::new(MeshOverpass), Arc::new(NoNominatim));
    let origin = Coordinate::new(0.0, 0.0);
    let err = engine
        .isochrone_times_from_nodes(&[origin], &[0.5], 3.0, TransportMode::Pedestrian)
        .await
        .expect_err("a sub-minute threshold must be rejected");

    assert!(matches!(err, Error::IsochroneLimit(_)));
}
