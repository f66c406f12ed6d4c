//! Isochrone: time/distance threshold conversion, per-threshold reachability
//! marking, and polygon synthesis over an already-built routing graph.
//!
//! This crate is deliberately decoupled from HTTP fetching and topology
//! building (`butterfly-io`, `butterfly-extract`, `TopologyBuilder`): the
//! public facade is responsible for building the buffered bbox, fetching
//! the road network and water areas with the origins spliced in as
//! additional nodes, and handing the resulting `RoutingGraph` and
//! `LineRecord`s in here.

pub mod params;
pub mod polygon;
pub mod reachability;
pub mod ring;
pub mod water;

pub use params::{thresholds_from_distances, thresholds_from_times, Threshold};
pub use ring::{PolygonRecord, DISTANCE_UNIT, TIME_UNIT};
pub use water::build_water_mask;

use butterfly_common::{Coordinate, Error, LineRecord};
use butterfly_routing::RoutingGraph;
use rayon::prelude::*;
use std::collections::HashSet;

#[derive(Debug)]
pub struct IsochroneOutput {
    pub polygons: Vec<PolygonRecord>,
    pub lines: Vec<LineRecord>,
}

/// Runs the full isochrone pipeline over a graph already built from the
/// buffered bbox's road network (with `origins` spliced in as graph
/// vertices). `thresholds` must be sorted by distance descending.
pub fn compute_isochrones(
    graph: &RoutingGraph,
    network_lines: &[LineRecord],
    origins: &[Coordinate],
    thresholds: &[Threshold],
    water_mask: &geo::MultiPolygon<f64>,
) -> Result<IsochroneOutput, Error> {
    if network_lines.is_empty() {
        return Err(Error::EmptyOsmData);
    }

    let origin_indices: Vec<_> = origins
        .iter()
        .filter_map(|o| {
            let vertex = o.wkt();
            let idx = graph.find_vertex(&vertex);
            if idx.is_none() {
                tracing::warn!(%vertex, "isochrone origin missing from graph");
            }
            idx
        })
        .collect();

    let reached_sets: Vec<HashSet<String>> = thresholds
        .par_iter()
        .map(|t| {
            reachability::reached_edge_names(graph, &origin_indices, t.distance_meters)
                .into_iter()
                .collect()
        })
        .collect();

    let mut marked_lines: Vec<LineRecord> = network_lines.to_vec();
    for (threshold, reached) in thresholds.iter().zip(reached_sets.iter()) {
        for line in marked_lines.iter_mut() {
            if reached.contains(&line.topo_uuid) {
                line.iso_name = Some(threshold.time_minutes);
                line.iso_distance = Some(threshold.distance_meters);
            }
        }
    }

    let raw_polygons: Vec<geo::MultiPolygon<f64>> = thresholds
        .iter()
        .zip(reached_sets.iter())
        .map(|(_, reached)| {
            let geoms: Vec<Vec<Coordinate>> = network_lines
                .iter()
                .filter(|l| reached.contains(&l.topo_uuid))
                .map(|l| l.geometry.clone())
                .collect();
            polygon::synthesize(&geoms)
        })
        .collect();

    let marked_roads: Vec<Vec<Vec<Coordinate>>> = thresholds
        .iter()
        .map(|t| {
            marked_lines
                .iter()
                .filter(|l| l.iso_name == Some(t.time_minutes))
                .map(|l| l.geometry.clone())
                .collect()
        })
        .collect();

    let polygons = ring::build_rings(thresholds, &raw_polygons, &marked_roads, water_mask)?;
    let lines = dissolve_lines(marked_lines);

    Ok(IsochroneOutput { polygons, lines })
}

/// Keeps only marked rows, strips the trailing split-index suffix from
/// `topo_uuid` (the dissolve key), and drops exact-geometry duplicates
/// within a `(topo_uuid, iso_name)` group.
fn dissolve_lines(marked_lines: Vec<LineRecord>) -> Vec<LineRecord> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    marked_lines
        .into_iter()
        .filter(|l| l.iso_name.is_some())
        .filter_map(|mut l| {
            l.topo_uuid = base_topo_uuid(&l.topo_uuid);
            let geom_key = l.geometry.iter().map(Coordinate::wkt).collect::<Vec<_>>().join(";");
            let key = (l.topo_uuid.clone(), format!("{:?}", l.iso_name), geom_key);
            if seen.insert(key) {
                Some(l)
            } else {
                None
            }
        })
        .collect()
}

/// Strips a single trailing `_<digits>` suffix, the way `_[0-9]+$` does in
/// the original; direction suffixes (`_forward`/`_backward`) aren't digits
/// and are left intact.
fn base_topo_uuid(topo_uuid: &str) -> String {
    if let Some(pos) = topo_uuid.rfind('_') {
        let (head, tail) = topo_uuid.split_at(pos);
        let digits = &tail[1..];
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return head.to_string();
        }
    }
    topo_uuid.to_string()
}
