//! Named, weighted multigraph with vertex-name and edge-name indices.
//!
//! Grounded on `RouteGraph` (petgraph `Graph` + `rstar` spatial index,
//! bidirectional-unless-oneway edge insertion), generalized from `i64` OSM
//! node ids to WKT vertex names and from implicit direction to an explicit
//! mode flag (direction expansion already happened upstream in
//! `TopologyBuilder`, so only pedestrian mode needs mirrored arcs here).

use butterfly_common::{Coordinate, Error, LineRecord, TransportMode};
use butterfly_geometry::geodesic_length;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EdgeMeta {
    pub name: String,
    pub weight: f64,
    pub line_id: String,
    pub osm_url: String,
}

pub struct RoutingGraph {
    graph: DiGraph<String, EdgeMeta>,
    vertex_index: HashMap<String, NodeIndex>,
    edge_index: HashMap<String, EdgeIndex>,
    spatial_index: RTree<GeomWithData<[f64; 2], String>>,
}

impl RoutingGraph {
    /// Builds the graph from emitted `LineRecord`s. Vertices are created on
    /// demand from coordinate WKT; an edge whose name already exists is a
    /// no-op (logged).
    pub fn build(lines: &[LineRecord], mode: TransportMode) -> Self {
        let mut graph = DiGraph::new();
        let mut vertex_index: HashMap<String, NodeIndex> = HashMap::new();
        let mut edge_index: HashMap<String, EdgeIndex> = HashMap::new();
        let mut spatial_points: Vec<GeomWithData<[f64; 2], String>> = Vec::new();

        let mut vertex_for = |graph: &mut DiGraph<String, EdgeMeta>,
                               vertex_index: &mut HashMap<String, NodeIndex>,
                               spatial_points: &mut Vec<GeomWithData<[f64; 2], String>>,
                               coord: Coordinate| {
            let name = coord.wkt();
            *vertex_index.entry(name.clone()).or_insert_with(|| {
                spatial_points.push(GeomWithData::new([coord.lon, coord.lat], name.clone()));
                graph.add_node(name)
            })
        };

        for line in lines {
            if edge_index.contains_key(&line.topo_uuid) {
                tracing::warn!(name = %line.topo_uuid, "duplicate edge name, skipping");
                continue;
            }
            let from = vertex_for(&mut graph, &mut vertex_index, &mut spatial_points, line.first());
            let to = vertex_for(&mut graph, &mut vertex_index, &mut spatial_points, line.last());
            let weight = geodesic_length(&line.geometry);
            let meta = EdgeMeta {
                name: line.topo_uuid.clone(),
                weight,
                line_id: line.id.clone(),
                osm_url: line.osm_url.clone(),
            };
            let idx = graph.add_edge(from, to, meta.clone());
            edge_index.insert(line.topo_uuid.clone(), idx);

            if mode == TransportMode::Pedestrian {
                graph.add_edge(to, from, meta);
            }
        }

        let spatial_index = RTree::bulk_load(spatial_points);

        Self {
            graph,
            vertex_index,
            edge_index,
            spatial_index,
        }
    }

    pub fn find_vertex(&self, name: &str) -> Option<NodeIndex> {
        self.vertex_index.get(name).copied()
    }

    pub fn vertex_name(&self, idx: NodeIndex) -> Option<String> {
        self.graph.node_weight(idx).cloned()
    }

    pub fn find_edge(&self, name: &str) -> Option<&EdgeMeta> {
        self.edge_index.get(name).map(|idx| &self.graph[*idx])
    }

    /// All edges incident to `vertex`, regardless of direction.
    pub fn incident_edge_names(&self, vertex: &str) -> Vec<String> {
        let Some(idx) = self.vertex_index.get(vertex) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .edges_directed(*idx, Direction::Outgoing)
            .map(|e| e.weight().name.clone())
            .chain(
                self.graph
                    .edges_directed(*idx, Direction::Incoming)
                    .map(|e| e.weight().name.clone()),
            )
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn edge_endpoints(&self, name: &str) -> Option<(String, String)> {
        let idx = *self.edge_index.get(name)?;
        let (a, b) = self.graph.edge_endpoints(idx)?;
        Some((self.graph[a].clone(), self.graph[b].clone()))
    }

    /// Registers a brand-new vertex not backed by any edge yet. Errors if a
    /// vertex with that name already exists.
    pub fn add_vertex(&mut self, coord: Coordinate) -> Result<NodeIndex, Error> {
        let name = coord.wkt();
        if self.vertex_index.contains_key(&name) {
            return Err(Error::UnsupportedGeometry(format!(
                "vertex {name} already exists"
            )));
        }
        let idx = self.graph.add_node(name.clone());
        self.vertex_index.insert(name.clone(), idx);
        self.spatial_index
            .insert(GeomWithData::new([coord.lon, coord.lat], name));
        Ok(idx)
    }

    pub fn nearest_vertex(&self, coord: Coordinate) -> Option<String> {
        self.spatial_index
            .nearest_neighbor(&[coord.lon, coord.lat])
            .map(|p| p.data.clone())
    }

    pub(crate) fn inner(&self) -> &DiGraph<String, EdgeMeta> {
        &self.graph
    }

    pub(crate) fn vertex_index(&self) -> &HashMap<String, NodeIndex> {
        &self.vertex_index
    }
}
