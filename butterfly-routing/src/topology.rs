//! TopologyBuilder: additional-node splicing, intersection detection,
//! splitting, directional expansion, and optional shape refinement.
//!
//! Grounded on `original_source/osmgt/geometry/network_topology.py`'s
//! `NetworkTopology` for phase ordering and constants (R-tree nearest-k=10,
//! refine level 7 for snapping, refine level 4 for shape smoothing).

use butterfly_common::{refine, AdditionalNode, Coordinate, Error, LineRecord, Topology, TransportMode};
use geo::{EuclideanDistance, LineString, Point, Polygon};
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::{HashMap, HashSet};

const NEAREST_LINE_CANDIDATES: usize = 10;
const SNAP_REFINE_LEVEL: u32 = 7;
const SHAPE_REFINE_LEVEL: u32 = 4;

#[derive(Debug, Clone, Copy)]
pub struct TopologyConfig {
    pub mode: TransportMode,
    pub interpolate_lines: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TopologyStats {
    pub to_add: usize,
    pub to_split: usize,
}

#[derive(Debug)]
pub struct TopologyOutput {
    pub lines: Vec<LineRecord>,
    pub stats: TopologyStats,
}

pub fn build_topology(
    lines: Vec<LineRecord>,
    additional_nodes: Vec<AdditionalNode>,
    working_area: Option<&Polygon<f64>>,
    config: TopologyConfig,
) -> Result<TopologyOutput, Error> {
    if lines.is_empty() {
        return Err(Error::EmptyOsmData);
    }

    if let Some(area) = working_area {
        let outside: Vec<String> = additional_nodes
            .iter()
            .filter(|n| !point_in_polygon(n.geometry, area))
            .map(|n| n.geometry.wkt())
            .collect();
        if !outside.is_empty() {
            return Err(Error::AdditionalNodeOutsideArea(outside));
        }
    }

    let (mut all_lines, stats) = splice_additional_nodes(lines, &additional_nodes);

    let intersections = find_intersections(&all_lines);

    let mut split_lines: Vec<LineRecord> = all_lines
        .drain(..)
        .flat_map(|line| split_at_intersections(line, &intersections))
        .collect();

    if config.mode == TransportMode::Vehicle {
        split_lines = split_lines.into_iter().flat_map(expand_direction).collect();
    }

    let output_lines = if config.interpolate_lines {
        split_lines.into_iter().flat_map(refine_shape).collect()
    } else {
        split_lines
    };

    Ok(TopologyOutput {
        lines: output_lines,
        stats,
    })
}

fn point_in_polygon(coord: Coordinate, area: &Polygon<f64>) -> bool {
    use geo::Contains;
    area.contains(&Point::new(coord.lon, coord.lat))
}

struct LineBBox {
    idx: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for LineBBox {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

impl rstar::PointDistance for LineBBox {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = if point[0] < self.min[0] {
            self.min[0] - point[0]
        } else if point[0] > self.max[0] {
            point[0] - self.max[0]
        } else {
            0.0
        };
        let dy = if point[1] < self.min[1] {
            self.min[1] - point[1]
        } else if point[1] > self.max[1] {
            point[1] - self.max[1]
        } else {
            0.0
        };
        dx * dx + dy * dy
    }
}

fn bbox_of(coords: &[Coordinate]) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
    for c in coords {
        min[0] = min[0].min(c.lon);
        min[1] = min[1].min(c.lat);
        max[0] = max[0].max(c.lon);
        max[1] = max[1].max(c.lat);
    }
    (min, max)
}

/// Phase A: for every additional node, choose the nearest line (pre-filtered
/// by R-tree nearest-k=10 on line bounding boxes, short-circuiting to any
/// line the node lies exactly on), group by chosen line, and splice each
/// group's snap points into that line's geometry.
fn splice_additional_nodes(
    mut lines: Vec<LineRecord>,
    nodes: &[AdditionalNode],
) -> (Vec<LineRecord>, TopologyStats) {
    if nodes.is_empty() {
        return (lines, TopologyStats::default());
    }

    let bboxes: Vec<LineBBox> = lines
        .iter()
        .enumerate()
        .map(|(idx, l)| {
            let (min, max) = bbox_of(&l.geometry);
            LineBBox { idx, min, max }
        })
        .collect();
    let bbox_tree: RTree<LineBBox> = RTree::bulk_load(bboxes);

    let mut groups: HashMap<usize, Vec<&AdditionalNode>> = HashMap::new();
    for node in nodes {
        let query = [node.geometry.lon, node.geometry.lat];
        let point = Point::new(node.geometry.lon, node.geometry.lat);

        let mut best: Option<(usize, f64)> = None;
        for candidate in bbox_tree.nearest_neighbor_iter(&query).take(NEAREST_LINE_CANDIDATES) {
            let line_string: LineString<f64> =
                lines[candidate.idx].geometry.iter().map(|c| (c.lon, c.lat)).collect();
            let dist = line_string.euclidean_distance(&point);
            if dist == 0.0 {
                best = Some((candidate.idx, 0.0));
                break;
            }
            match best {
                Some((best_idx, best_dist)) if dist > best_dist
                    || (dist == best_dist && lines[candidate.idx].id >= lines[best_idx].id) => {}
                _ => best = Some((candidate.idx, dist)),
            }
        }
        if let Some((idx, _)) = best {
            groups.entry(idx).or_default().push(node);
        } else {
            tracing::warn!(node = %node.id, "no candidate line found for additional node");
        }
    }

    let results: Vec<(usize, Vec<Coordinate>, Vec<LineRecord>, usize, usize)> = groups
        .into_par_iter()
        .map(|(idx, group_nodes)| {
            let (geometry, connectors, to_add, to_split) = process_group(&lines[idx], &group_nodes);
            (idx, geometry, connectors, to_add, to_split)
        })
        .collect();

    let mut connectors = Vec::new();
    let mut stats = TopologyStats::default();
    for (idx, new_geometry, group_connectors, to_add, to_split) in results {
        lines[idx].geometry = new_geometry;
        connectors.extend(group_connectors);
        stats.to_add += to_add;
        stats.to_split += to_split;
    }

    lines.extend(connectors);
    (lines, stats)
}

fn process_group(
    line: &LineRecord,
    nodes: &[&AdditionalNode],
) -> (Vec<Coordinate>, Vec<LineRecord>, usize, usize) {
    let refined = refine(&line.geometry, SNAP_REFINE_LEVEL);
    let kd_points: Vec<GeomWithData<[f64; 2], usize>> = refined
        .iter()
        .enumerate()
        .map(|(i, c)| GeomWithData::new([c.lon, c.lat], i))
        .collect();
    let kd_tree: RTree<GeomWithData<[f64; 2], usize>> = RTree::bulk_load(kd_points);

    let original_vertices: HashSet<Coordinate> = line.geometry.iter().copied().collect();
    let mut snap_points: HashSet<Coordinate> = HashSet::new();
    let mut connectors = Vec::with_capacity(nodes.len());

    for node in nodes {
        let nearest = kd_tree
            .nearest_neighbor(&[node.geometry.lon, node.geometry.lat])
            .expect("refine(_, n) with n>=1 always yields at least two points");
        let q = refined[nearest.data];
        snap_points.insert(q);
        connectors.push(LineRecord {
            id: format!("added_{}", node.id),
            geometry: vec![node.geometry, q],
            tags: HashMap::new(),
            topology: Topology::Added,
            topo_uuid: format!("added_{}", node.id),
            osm_url: node.osm_url.clone(),
            iso_name: None,
            iso_distance: None,
        });
    }

    let to_split = snap_points.difference(&original_vertices).count();
    let new_geometry: Vec<Coordinate> = refined
        .into_iter()
        .filter(|c| original_vertices.contains(c) || snap_points.contains(c))
        .collect();

    (new_geometry, connectors, nodes.len(), to_split)
}

/// Phase B: any coordinate shared by two or more line geometries (exact
/// equality, no tolerance) is an intersection vertex.
fn find_intersections(lines: &[LineRecord]) -> HashSet<Coordinate> {
    let mut counts: HashMap<Coordinate, usize> = HashMap::new();
    for line in lines {
        for c in &line.geometry {
            *counts.entry(*c).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|&(_, count)| count >= 2)
        .map(|(c, _)| c)
        .collect()
}

/// Phase C: split each line at interior intersection vertices.
fn split_at_intersections(line: LineRecord, intersections: &HashSet<Coordinate>) -> Vec<LineRecord> {
    let coords = &line.geometry;
    if coords.len() < 2 {
        return vec![line];
    }

    let mut segments: Vec<Vec<Coordinate>> = Vec::new();
    let mut current = vec![coords[0]];
    for &c in &coords[1..coords.len() - 1] {
        current.push(c);
        if intersections.contains(&c) {
            segments.push(std::mem::replace(&mut current, vec![c]));
        }
    }
    current.push(*coords.last().unwrap());
    segments.push(current);

    if segments.len() == 1 {
        // Unsplit: keep whatever topology this line already carried in
        // (e.g. `Added` connectors from Phase A), don't reset it.
        vec![line]
    } else {
        segments
            .into_iter()
            .enumerate()
            .map(|(k, geometry)| LineRecord {
                topo_uuid: format!("{}_{}", line.topo_uuid, k),
                geometry,
                topology: Topology::Split,
                id: line.id.clone(),
                tags: line.tags.clone(),
                osm_url: line.osm_url.clone(),
                iso_name: line.iso_name,
                iso_distance: line.iso_distance,
            })
            .collect()
    }
}

/// Phase D: vehicle-mode directional expansion.
fn expand_direction(fragment: LineRecord) -> Vec<LineRecord> {
    let junction_is_roundabout = matches!(
        fragment.tag("junction"),
        Some("roundabout") | Some("jughandle")
    );
    let is_oneway = fragment.tag("oneway") == Some("yes");

    let forward = LineRecord {
        topo_uuid: format!("{}_forward", fragment.topo_uuid),
        ..fragment.clone()
    };

    if junction_is_roundabout || is_oneway {
        return vec![forward];
    }

    let mut backward_geometry = fragment.geometry.clone();
    backward_geometry.reverse();
    let backward = LineRecord {
        topo_uuid: format!("{}_backward", fragment.topo_uuid),
        geometry: backward_geometry,
        ..fragment
    };

    vec![forward, backward]
}

/// Phase E: midpoint-refine a fragment's geometry and slice it into
/// consecutive 2-point LineStrings for finer isochrone buffering. Routing
/// semantics are unchanged because sub-fragments remain chained end-to-end.
fn refine_shape(fragment: LineRecord) -> Vec<LineRecord> {
    let refined = refine(&fragment.geometry, SHAPE_REFINE_LEVEL);
    refined
        .windows(2)
        .enumerate()
        .map(|(i, pair)| LineRecord {
            topo_uuid: format!("{}_{}", fragment.topo_uuid, i),
            geometry: pair.to_vec(),
            id: fragment.id.clone(),
            tags: fragment.tags.clone(),
            topology: fragment.topology,
            osm_url: fragment.osm_url.clone(),
            iso_name: fragment.iso_name,
            iso_distance: fragment.iso_distance,
        })
        .collect()
}
