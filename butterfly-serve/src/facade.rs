//! `RoutingEngine`: the stateless public facade wiring
//! `butterfly-io` → `butterfly-extract` → `butterfly-routing` →
//! (`ShortestPath` | `butterfly-isochrone`).
//!
//! Grounded on `RouteGraph`/`find_route`'s server-facing shape in
//! `tools/butterfly-route/src/server.rs`, generalized from a single
//! `/route` handler over a preloaded graph to eight stateless entry points
//! that each fetch, build topology, and tear the graph down per request
//! (per spec.md §3's "Lifecycle": no mutation after the facade returns).
//!
//! Each entry point carries a `tracing::instrument` span — the logger is
//! the only process-wide state this workspace keeps (spec.md §9).

use butterfly_common::{Coordinate, Error, PointRecord, TransportMode};
use butterfly_extract::ingest;
use butterfly_geometry::project;
use butterfly_geometry::Epsg;
use butterfly_io::{
    poi_query_area, poi_query_bbox, road_query_area, road_query_bbox, water_area_query_bbox,
    NominatimClient, OverpassClient, OverpassElement,
};
use butterfly_isochrone::{compute_isochrones, thresholds_from_distances, thresholds_from_times, IsochroneOutput};
use butterfly_routing::{build_topology, shortest_paths, PathResult, RoutingGraph, TopologyConfig};
use geo::Polygon;
use std::sync::Arc;

const NOMINATIM_LIMIT: u32 = 1;
const BBOX_BUFFER_TOLERANCE: f64 = 1.3;

pub struct RoutingEngine {
    overpass: Arc<dyn OverpassClient>,
    nominatim: Arc<dyn NominatimClient>,
}

impl RoutingEngine {
    pub fn new(overpass: Arc<dyn OverpassClient>, nominatim: Arc<dyn NominatimClient>) -> Self {
        Self { overpass, nominatim }
    }

    #[tracing::instrument(skip(self))]
    pub async fn roads_from_bbox(
        &self,
        bbox: (f64, f64, f64, f64),
        mode: TransportMode,
    ) -> Result<Vec<butterfly_common::LineRecord>, Error> {
        let query = road_query_bbox(mode, bbox);
        let response = self.overpass.fetch(&query).await?;
        let ingested = ingest(response.elements)?;
        let topo = build_topology(
            ingested.lines,
            Vec::new(),
            None,
            TopologyConfig { mode, interpolate_lines: false },
        )?;
        Ok(topo.lines)
    }

    #[tracing::instrument(skip(self))]
    pub async fn roads_from_location(
        &self,
        location: &str,
        mode: TransportMode,
    ) -> Result<Vec<butterfly_common::LineRecord>, Error> {
        let (area_id, _working_area) = self.resolve_location(location).await?;
        let query = road_query_area(mode, area_id);
        let response = self.overpass.fetch(&query).await?;
        let ingested = ingest(response.elements)?;
        let topo = build_topology(
            ingested.lines,
            Vec::new(),
            None,
            TopologyConfig { mode, interpolate_lines: false },
        )?;
        Ok(topo.lines)
    }

    #[tracing::instrument(skip(self))]
    pub async fn pois_from_bbox(&self, bbox: (f64, f64, f64, f64)) -> Result<Vec<PointRecord>, Error> {
        let query = poi_query_bbox(bbox);
        let response = self.overpass.fetch(&query).await?;
        Ok(ingest(response.elements)?.points)
    }

    #[tracing::instrument(skip(self))]
    pub async fn pois_from_location(&self, location: &str) -> Result<Vec<PointRecord>, Error> {
        let (area_id, _working_area) = self.resolve_location(location).await?;
        let query = poi_query_area(area_id);
        let response = self.overpass.fetch(&query).await?;
        Ok(ingest(response.elements)?.points)
    }

    #[tracing::instrument(skip(self, pairs))]
    pub async fn shortest_path_from_bbox(
        &self,
        bbox: (f64, f64, f64, f64),
        mode: TransportMode,
        pairs: &[(Coordinate, Coordinate)],
    ) -> Result<Vec<PathResult>, Error> {
        let query = road_query_bbox(mode, bbox);
        let response = self.overpass.fetch(&query).await?;
        let ingested = ingest(response.elements)?;
        let additional_nodes = pairs_to_additional_nodes(pairs);
        let topo = build_topology(
            ingested.lines,
            additional_nodes,
            None,
            TopologyConfig { mode, interpolate_lines: false },
        )?;
        let graph = RoutingGraph::build(&topo.lines, mode);
        Ok(shortest_paths(&graph, pairs))
    }

    #[tracing::instrument(skip(self, pairs))]
    pub async fn shortest_path_from_location(
        &self,
        location: &str,
        mode: TransportMode,
        pairs: &[(Coordinate, Coordinate)],
    ) -> Result<Vec<PathResult>, Error> {
        let (area_id, working_area) = self.resolve_location(location).await?;
        let query = road_query_area(mode, area_id);
        let response = self.overpass.fetch(&query).await?;
        let ingested = ingest(response.elements)?;
        let additional_nodes = pairs_to_additional_nodes(pairs);
        let topo = build_topology(
            ingested.lines,
            additional_nodes,
            Some(&working_area),
            TopologyConfig { mode, interpolate_lines: false },
        )?;
        let graph = RoutingGraph::build(&topo.lines, mode);
        Ok(shortest_paths(&graph, pairs))
    }

    #[tracing::instrument(skip(self, origins))]
    pub async fn isochrone_times_from_nodes(
        &self,
        origins: &[Coordinate],
        times_minutes: &[f64],
        speed_kmh: f64,
        mode: TransportMode,
    ) -> Result<IsochroneOutput, Error> {
        let thresholds = thresholds_from_times(times_minutes, speed_kmh)?;
        self.run_isochrone(origins, &thresholds, mode).await
    }

    #[tracing::instrument(skip(self, origins))]
    pub async fn isochrone_distances_from_nodes(
        &self,
        origins: &[Coordinate],
        distances_meters: &[f64],
        speed_kmh: f64,
        mode: TransportMode,
    ) -> Result<IsochroneOutput, Error> {
        let thresholds = thresholds_from_distances(distances_meters, speed_kmh)?;
        self.run_isochrone(origins, &thresholds, mode).await
    }

    async fn run_isochrone(
        &self,
        origins: &[Coordinate],
        thresholds: &[butterfly_isochrone::Threshold],
        mode: TransportMode,
    ) -> Result<IsochroneOutput, Error> {
        let max_distance = thresholds
            .iter()
            .map(|t| t.distance_meters)
            .fold(0.0_f64, f64::max);
        let bbox = buffered_bbox(origins, max_distance * BBOX_BUFFER_TOLERANCE);

        let road_query = road_query_bbox(mode, bbox);
        let water_query = water_area_query_bbox(bbox);
        let (road_response, water_response) =
            tokio::join!(self.overpass.fetch(&road_query), self.overpass.fetch(&water_query));
        let ingested = ingest(road_response?.elements)?;
        let water_elements = water_response?.elements;

        let additional_nodes: Vec<PointRecord> = origins
            .iter()
            .enumerate()
            .map(|(i, c)| PointRecord {
                id: format!("origin_{i}"),
                geometry: *c,
                tags: Default::default(),
                topo_uuid: format!("origin_{i}"),
                osm_url: String::new(),
            })
            .collect();

        let topo = build_topology(
            ingested.lines,
            additional_nodes,
            None,
            TopologyConfig { mode, interpolate_lines: true },
        )?;
        let graph = RoutingGraph::build(&topo.lines, mode);
        let water_mask = water_mask_from_elements(&water_elements, &ingested.water_ways);

        compute_isochrones(&graph, &topo.lines, origins, thresholds, &water_mask)
    }

    async fn resolve_location(&self, location: &str) -> Result<(u64, Polygon<f64>), Error> {
        let matches = self.nominatim.search(location, NOMINATIM_LIMIT).await?;
        let Some(m) = matches.into_iter().next() else {
            return Err(Error::LocationUnresolved);
        };
        let ring: Vec<(f64, f64)> = m.working_area_ring().iter().map(|p| (p[0], p[1])).collect();
        Ok((m.area_id(), Polygon::new(ring.into(), vec![])))
    }
}

fn pairs_to_additional_nodes(pairs: &[(Coordinate, Coordinate)]) -> Vec<PointRecord> {
    let mut nodes = Vec::new();
    for (i, (a, b)) in pairs.iter().enumerate() {
        nodes.push(PointRecord {
            id: format!("sp_{i}_a"),
            geometry: *a,
            tags: Default::default(),
            topo_uuid: format!("sp_{i}_a"),
            osm_url: String::new(),
        });
        nodes.push(PointRecord {
            id: format!("sp_{i}_b"),
            geometry: *b,
            tags: Default::default(),
            topo_uuid: format!("sp_{i}_b"),
            osm_url: String::new(),
        });
    }
    nodes
}

/// Buffers the bbox enclosing `points` by `buffer_meters`, via a round-trip
/// through Web Mercator per spec.md §4.6's bbox setup.
fn buffered_bbox(points: &[Coordinate], buffer_meters: f64) -> (f64, f64, f64, f64) {
    let projected: Vec<Coordinate> = points
        .iter()
        .map(|c| project(*c, Epsg::Wgs84, Epsg::WebMercator))
        .collect();
    let min_x = projected.iter().map(|c| c.lon).fold(f64::INFINITY, f64::min) - buffer_meters;
    let max_x = projected.iter().map(|c| c.lon).fold(f64::NEG_INFINITY, f64::max) + buffer_meters;
    let min_y = projected.iter().map(|c| c.lat).fold(f64::INFINITY, f64::min) - buffer_meters;
    let max_y = projected.iter().map(|c| c.lat).fold(f64::NEG_INFINITY, f64::max) + buffer_meters;

    let sw = project(Coordinate::new(min_x, min_y), Epsg::WebMercator, Epsg::Wgs84);
    let ne = project(Coordinate::new(max_x, max_y), Epsg::WebMercator, Epsg::Wgs84);
    (sw.lat, sw.lon, ne.lat, ne.lon)
}

fn water_mask_from_elements(
    elements: &[OverpassElement],
    water_ways: &[butterfly_common::LineRecord],
) -> geo::MultiPolygon<f64> {
    let mut rings: Vec<Vec<Coordinate>> = water_ways.iter().map(|w| w.geometry.clone()).collect();
    for element in elements {
        if let OverpassElement::Relation { members, .. } = element {
            for member in members {
                let ring: Vec<Coordinate> = member
                    .geometry
                    .iter()
                    .map(|p| Coordinate::new(p.lon, p.lat))
                    .collect();
                rings.push(ring);
            }
        }
    }
    butterfly_isochrone::build_water_mask(&rings)
}
