//! TopologyBuilder, Graph, and ShortestPath: the core routing pipeline.

pub mod graph;
pub mod path;
pub mod topology;

pub use graph::{EdgeMeta, RoutingGraph};
pub use path::{bounded_dijkstra, dijkstra, reachable_within, shortest_paths, PathResult};
pub use topology::{build_topology, TopologyConfig, TopologyOutput, TopologyStats};
