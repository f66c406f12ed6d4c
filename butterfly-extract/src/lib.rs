//! RawIngest: normalizes decoded Overpass elements into `LineRecord`s,
//! `PointRecord`s, and a water-element partition consumed by the isochrone
//! pipeline's masking step.

use butterfly_common::{osm_url, Coordinate, ElementKind, Error, LineRecord, PointRecord, Topology};
use butterfly_io::OverpassElement;

/// Elements tagged as water bodies, used only for isochrone masking. Ways
/// are normalized the same as roads (closed rings); relations are kept raw
/// since their ring members must be resolved by whoever assembles the
/// water-area polygon.
#[derive(Debug, Default)]
pub struct IngestResult {
    pub lines: Vec<LineRecord>,
    pub points: Vec<PointRecord>,
    pub water_ways: Vec<LineRecord>,
    pub water_relations: Vec<OverpassElement>,
}

fn is_water(tags: &std::collections::HashMap<String, String>) -> bool {
    tags.get("natural").map(|v| v == "water").unwrap_or(false)
        || tags.get("waterway").map(|v| v == "riverbank").unwrap_or(false)
}

/// Partitions and normalizes a decoded Overpass `elements` array. An empty
/// list is fatal (§4.2).
pub fn ingest(elements: Vec<OverpassElement>) -> Result<IngestResult, Error> {
    if elements.is_empty() {
        return Err(Error::EmptyOsmData);
    }

    let mut result = IngestResult::default();

    for element in elements {
        match element {
            OverpassElement::Way { id, geometry, tags } => {
                if geometry.len() < 2 {
                    continue;
                }
                let coords: Vec<Coordinate> =
                    geometry.iter().map(|ll| Coordinate::new(ll.lon, ll.lat)).collect();
                let id_str = id.to_string();
                let record = LineRecord {
                    osm_url: osm_url(ElementKind::Way, &id_str),
                    topo_uuid: id_str.clone(),
                    id: id_str,
                    geometry: coords,
                    topology: Topology::Unchanged,
                    iso_name: None,
                    iso_distance: None,
                    tags: tags.clone(),
                };
                if is_water(&tags) {
                    result.water_ways.push(record);
                } else {
                    result.lines.push(record);
                }
            }
            OverpassElement::Node { id, lon, lat, tags } => {
                let id_str = id.to_string();
                result.points.push(PointRecord {
                    osm_url: osm_url(ElementKind::Node, &id_str),
                    topo_uuid: id_str.clone(),
                    id: id_str,
                    geometry: Coordinate::new(lon, lat),
                    tags,
                });
            }
            relation @ OverpassElement::Relation { .. } => {
                result.water_relations.push(relation);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use butterfly_io::overpass::LonLat;
    use std::collections::HashMap;

    #[test]
    fn empty_elements_is_fatal() {
        let err = ingest(vec![]).unwrap_err();
        assert!(matches!(err, Error::EmptyOsmData));
    }

    #[test]
    fn way_topo_uuid_is_the_osm_id() {
        let elements = vec![OverpassElement::Way {
            id: 10,
            geometry: vec![LonLat { lon: 1.0, lat: 1.0 }, LonLat { lon: 2.0, lat: 2.0 }],
            tags: HashMap::new(),
        }];
        let result = ingest(elements).unwrap();
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].topo_uuid, "10");
    }

    #[test]
    fn water_way_is_partitioned_separately() {
        let mut tags = HashMap::new();
        tags.insert("natural".to_string(), "water".to_string());
        let elements = vec![OverpassElement::Way {
            id: 5,
            geometry: vec![LonLat { lon: 0.0, lat: 0.0 }, LonLat { lon: 1.0, lat: 0.0 }],
            tags,
        }];
        let result = ingest(elements).unwrap();
        assert!(result.lines.is_empty());
        assert_eq!(result.water_ways.len(), 1);
    }
}
