//! ShortestPath: bounded and unbounded Dijkstra, path reconstruction, and
//! concurrent per-pair dispatch.
//!
//! Grounded on `route.rs`'s nearest-node lookup + `petgraph::algo::dijkstra`
//! pattern, generalized to path reconstruction via predecessor edges and to
//! concurrent dispatch across request pairs via `rayon`.

use crate::graph::RoutingGraph;
use butterfly_common::Coordinate;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct PathResult {
    pub source_node: String,
    pub target_node: String,
    pub osm_ids: String,
    pub osm_urls: String,
    pub geometry: Vec<Coordinate>,
}

/// Runs single-source-single-target Dijkstra for every (source, target)
/// pair, deduplicated by WKT equality, dispatched concurrently. Pairs with
/// `source == target`, an endpoint missing from the graph, or no connecting
/// path are omitted with a warning and produce no output record.
pub fn shortest_paths(graph: &RoutingGraph, pairs: &[(Coordinate, Coordinate)]) -> Vec<PathResult> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let deduped: Vec<(String, String)> = pairs
        .iter()
        .filter_map(|(s, t)| {
            let key = (s.wkt(), t.wkt());
            if key.0 == key.1 {
                tracing::info!(node = %key.0, "skipping shortest-path pair with identical source and target");
                return None;
            }
            if seen.insert(key.clone()) {
                Some(key)
            } else {
                None
            }
        })
        .collect();

    deduped
        .into_par_iter()
        .filter_map(|(source, target)| single_path(graph, &source, &target))
        .collect()
}

fn single_path(graph: &RoutingGraph, source: &str, target: &str) -> Option<PathResult> {
    let Some(start) = graph.find_vertex(source) else {
        tracing::warn!(%source, "source not in graph");
        return None;
    };
    let Some(goal) = graph.find_vertex(target) else {
        tracing::warn!(%target, "target not in graph");
        return None;
    };

    let (dist, predecessor_edge) = dijkstra(graph, start, Some(goal));
    if !dist.contains_key(&goal) {
        tracing::warn!(%source, %target, "no path: graph disconnected");
        return None;
    }

    let mut edge_names = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(&(prev, ref edge_name)) = predecessor_edge.get(&current) else {
            break;
        };
        edge_names.push(edge_name.clone());
        current = prev;
    }
    edge_names.reverse();

    let mut geometry: Vec<Coordinate> = Vec::new();
    let mut osm_ids: Vec<String> = Vec::new();
    let mut osm_urls: Vec<String> = Vec::new();
    for name in &edge_names {
        if let Some(meta) = graph.find_edge(name) {
            if !osm_ids.contains(&meta.line_id) {
                osm_ids.push(meta.line_id.clone());
                osm_urls.push(meta.osm_url.clone());
            }
        }
    }

    // Reconstruct geometry by walking vertices in path order; edge geometry
    // itself isn't stored on the graph, so we merge via endpoint WKTs.
    let mut node = start;
    geometry.push(coord_from_wkt(&vertex_name(graph, node)));
    for name in &edge_names {
        if let Some((from, to)) = graph.edge_endpoints(name) {
            let from_name = vertex_name(graph, node);
            let next = if from == from_name { to } else { from };
            geometry.push(coord_from_wkt(&next));
            if let Some(idx) = graph.find_vertex(&next) {
                node = idx;
            }
        }
    }

    if geometry.first().map(Coordinate::wkt).as_deref() != Some(source) {
        geometry.reverse();
    }

    Some(PathResult {
        source_node: source.to_string(),
        target_node: target.to_string(),
        osm_ids: osm_ids.join(","),
        osm_urls: osm_urls.join(","),
        geometry,
    })
}

fn vertex_name(graph: &RoutingGraph, idx: NodeIndex) -> String {
    graph.inner()[idx].clone()
}

fn coord_from_wkt(wkt: &str) -> Coordinate {
    let inner = wkt.trim_start_matches("POINT(").trim_end_matches(')');
    let mut parts = inner.split_whitespace();
    let lon: f64 = parts.next().unwrap_or("0").parse().unwrap_or(0.0);
    let lat: f64 = parts.next().unwrap_or("0").parse().unwrap_or(0.0);
    Coordinate::new(lon, lat)
}

/// Dijkstra over the graph's edge weights. When `max_dist` is `Some`,
/// expansion stops once cumulative weight exceeds it (bounded Dijkstra,
/// used by the isochrone pipeline); `target` is an optional early-exit.
pub fn dijkstra(
    graph: &RoutingGraph,
    start: NodeIndex,
    target: Option<NodeIndex>,
) -> (HashMap<NodeIndex, f64>, HashMap<NodeIndex, (NodeIndex, String)>) {
    bounded_dijkstra(graph, start, target, None)
}

pub fn bounded_dijkstra(
    graph: &RoutingGraph,
    start: NodeIndex,
    target: Option<NodeIndex>,
    max_dist: Option<f64>,
) -> (HashMap<NodeIndex, f64>, HashMap<NodeIndex, (NodeIndex, String)>) {
    let mut dist: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessor: HashMap<NodeIndex, (NodeIndex, String)> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();

    dist.insert(start, 0.0);
    heap.push(Reverse(HeapEntry(0.0, start)));

    while let Some(Reverse(HeapEntry(d, u))) = heap.pop() {
        if d > *dist.get(&u).unwrap_or(&f64::INFINITY) {
            continue;
        }
        if Some(u) == target {
            break;
        }
        for edge in graph.inner().edges_directed(u, Direction::Outgoing) {
            let v = edge.target();
            let nd = d + edge.weight().weight;
            if let Some(max) = max_dist {
                if nd > max {
                    continue;
                }
            }
            if nd < *dist.get(&v).unwrap_or(&f64::INFINITY) {
                dist.insert(v, nd);
                predecessor.insert(v, (u, edge.weight().name.clone()));
                heap.push(Reverse(HeapEntry(nd, v)));
            }
        }
    }

    (dist, predecessor)
}

/// Wraps `(distance, node)` for the binary heap. Distances in this pipeline
/// are always finite (geodesic lengths), so a total order via `partial_cmp`
/// is safe.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry(f64, NodeIndex);

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.1.index().cmp(&other.1.index()))
    }
}

/// Vertices reachable from `start` within `max_dist` (inclusive), bounded
/// Dijkstra per §4.6.
pub fn reachable_within(graph: &RoutingGraph, start: NodeIndex, max_dist: f64) -> HashSet<NodeIndex> {
    let (dist, _) = bounded_dijkstra(graph, start, None, Some(max_dist));
    dist.into_keys().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use butterfly_common::{LineRecord, Topology, TransportMode};
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

    fn a_b_c_graph() -> RoutingGraph {
        let lines = vec![
            line("1", &[(0.0, 0.0), (1.0, 0.0)]),
            line("2", &[(1.0, 0.0), (2.0, 0.0)]),
        ];
        RoutingGraph::build(&lines, TransportMode::Pedestrian)
    }

    #[test]
    fn finds_path_across_two_edges() {
        let graph = a_b_c_graph();
        let a = Coordinate::new(0.0, 0.0);
        let c = Coordinate::new(2.0, 0.0);
        let results = shortest_paths(&graph, &[(a, c)]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_node, a.wkt());
        assert_eq!(results[0].geometry.first().unwrap().wkt(), a.wkt());
        assert_eq!(results[0].geometry.last().unwrap().wkt(), c.wkt());
    }

    #[test]
    fn duplicate_pairs_collapse_to_one_result() {
        let graph = a_b_c_graph();
        let a = Coordinate::new(0.0, 0.0);
        let c = Coordinate::new(2.0, 0.0);
        let results = shortest_paths(&graph, &[(a, c), (a, c)]);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn identical_source_and_target_is_skipped() {
        let graph = a_b_c_graph();
        let a = Coordinate::new(0.0, 0.0);
        let results = shortest_paths(&graph, &[(a, a)]);
        assert!(results.is_empty());
    }

    #[test]
    fn missing_endpoint_is_omitted() {
        let graph = a_b_c_graph();
        let a = Coordinate::new(0.0, 0.0);
        let nowhere = Coordinate::new(99.0, 99.0);
        let results = shortest_paths(&graph, &[(a, nowhere)]);
        assert!(results.is_empty());
    }
}
