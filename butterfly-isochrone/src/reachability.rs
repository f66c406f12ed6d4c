//! Per-threshold reachability marking: bounded Dijkstra from every origin,
//! aggregated into a fringe-filtered edge-name set.
//!
//! Grounded on `OsmGtIsochrone._compute_isochrone`: reachable vertices from
//! every source are pooled (with repeats — a vertex reached by two origins,
//! or whose incident edge has both endpoints reached, counts twice), then
//! edges are kept only if their incidence count exceeds one. This is what
//! drops "fringe" edges reachable at only one endpoint, which would
//! otherwise spike the isochrone boundary.

use butterfly_routing::{reachable_within, RoutingGraph};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Returns the set of edge (`topo_uuid`) names reached by at least two
/// incidences across all origins, for the given bound.
pub fn reached_edge_names(graph: &RoutingGraph, origins: &[NodeIndex], max_dist: f64) -> Vec<String> {
    let mut points_found: Vec<String> = Vec::new();
    for &origin in origins {
        let reached = reachable_within(graph, origin, max_dist);
        for idx in reached {
            if let Some(name) = graph.vertex_name(idx) {
                points_found.push(name);
            }
        }
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for point in &points_found {
        for edge_name in graph.incident_edge_names(point) {
            *counts.entry(edge_name).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use butterfly_common::{Coordinate, LineRecord, Topology, TransportMode};
    use std::collections::HashMap as Map;

    fn line(id: &str, coords: &[(f64, f64)]) -> LineRecord {
        LineRecord {
            id: id.to_string(),
            geometry: coords.iter().map(|&(lon, lat)| Coordinate::new(lon, lat)).collect(),
            tags: Map::new(),
            topology: Topology::Unchanged,
            topo_uuid: id.to_string(),
            osm_url: format!("https://www.openstreetmap.org/way/{id}"),
            iso_name: None,
            iso_distance: None,
        }
    }

    #[test]
    fn chain_reached_from_both_sides_keeps_middle_edges() {
        // A -1- B -1- C -1- D, pedestrian (bidirectional), origin at A.
        let lines = vec![
            line("1", &[(0.0, 0.0), (1.0, 0.0)]),
            line("2", &[(1.0, 0.0), (2.0, 0.0)]),
            line("3", &[(2.0, 0.0), (3.0, 0.0)]),
        ];
        let graph = RoutingGraph::build(&lines, TransportMode::Pedestrian);
        let a = graph.find_vertex(&Coordinate::new(0.0, 0.0).wkt()).unwrap();
        // max_dist covers edge 1 fully but only touches the start of edge 2's far end.
        let names = reached_edge_names(&graph, &[a], 150_000.0);
        assert!(names.contains(&"1".to_string()));
    }

    #[test]
    fn unreached_edges_are_excluded() {
        let lines = vec![line("1", &[(0.0, 0.0), (50.0, 0.0)])];
        let graph = RoutingGraph::build(&lines, TransportMode::Pedestrian);
        let a = graph.find_vertex(&Coordinate::new(0.0, 0.0).wkt()).unwrap();
        let names = reached_edge_names(&graph, &[a], 1.0);
        assert!(names.is_empty());
    }
}
