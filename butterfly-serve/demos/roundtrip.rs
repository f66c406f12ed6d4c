//! End-to-end demo over a small synthetic OSM fixture: extract roads from
//! a bbox, route between two points, then compute a time isochrone around
//! one of them. No network access — both OSM collaborators are served from
//! an in-memory fixture, grounded on `tools/butterfly-route/src/server.rs`'s
//! demo-fixture convention for exercising a routing stack without a live
//! Overpass/Nominatim endpoint.

use async_trait::async_trait;
use butterfly_common::{Coordinate, Error, TransportMode};
use butterfly_io::overpass::LonLat;
use butterfly_io::{NominatimClient, NominatimMatch, OverpassClient, OverpassElement, OverpassResponse};
use butterfly_serve::RoutingEngine;
use std::sync::Arc;

/// A short residential street, split into two ways so routing has an
/// intermediate vertex to pass through.
struct FixtureOverpass;

#[async_trait]
impl OverpassClient for FixtureOverpass {
    async fn fetch(&self, query: &str) -> Result<OverpassResponse, Error> {
        if !query.contains("highway") {
            return Ok(OverpassResponse { elements: Vec::new() });
        }
        let elements = vec![
            OverpassElement::Way {
                id: 1,
                geometry: vec![LonLat { lon: 0.0, lat: 0.0 }, LonLat { lon: 0.001, lat: 0.0 }],
                tags: [("highway".to_string(), "residential".to_string())].into(),
            },
            OverpassElement::Way {
                id: 2,
                geometry: vec![LonLat { lon: 0.001, lat: 0.0 }, LonLat { lon: 0.002, lat: 0.0 }],
                tags: [("highway".to_string(), "residential".to_string())].into(),
            },
        ];
        Ok(OverpassResponse { elements })
    }
}

/// Unused by this demo (both calls go through the bbox entry points) but
/// still required to construct a `RoutingEngine`.
struct UnreachableNominatim;

#[async_trait]
impl NominatimClient for UnreachableNominatim {
    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<NominatimMatch>, Error> {
        Err(Error::LocationUnresolved)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let engine = RoutingEngine::new(Arc::new(FixtureOverpass), Arc::new(UnreachableNominatim));

    let bbox = (-0.001, -0.001, 0.001, 0.003);
    let roads = engine.roads_from_bbox(bbox, TransportMode::Vehicle).await?;
    println!("roads_from_bbox: {} line(s)", roads.len());

    let start = Coordinate::new(0.0, 0.0);
    let end = Coordinate::new(0.002, 0.0);
    let paths = engine
        .shortest_path_from_bbox(bbox, TransportMode::Vehicle, &[(start, end)])
        .await?;
    for path in &paths {
        println!(
            "shortest_path: {} -> {} via {}",
            path.source_node, path.target_node, path.osm_ids
        );
    }

    let isochrone = engine
        .isochrone_times_from_nodes(&[start], &[5.0], 30.0, TransportMode::Vehicle)
        .await?;
    println!("isochrone_times_from_nodes: {} ring(s)", isochrone.polygons.len());

    Ok(())
}
