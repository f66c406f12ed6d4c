//! Overpass query fragments: highway filters by transport mode, the POI
//! query, and the water-area mask query. Literal strings grounded on
//! `osmgt/core/global_values.py`'s `network_queries` and `poi_query`.

use butterfly_common::TransportMode;

/// `highway` regex for vehicle-mode extraction. Directed graph; excludes
/// `area=*` elements.
pub const VEHICLE_HIGHWAY_REGEX: &str = "motorway|trunk|primary|secondary|tertiary|unclassified|residential|pedestrian|motorway_link|trunk_link|primary_link|secondary_link|tertiary_link|living_street|service|track|bus_guideway|escape|raceway|road|bridleway|corridor|path";

/// `highway` regex for pedestrian-mode extraction: adds footway classes and
/// drops the vehicle-only link/raceway/escape subset. Undirected graph.
pub const PEDESTRIAN_HIGHWAY_REGEX: &str = "motorway|trunk|primary|secondary|tertiary|unclassified|residential|pedestrian|living_street|service|track|road|bridleway|corridor|path|cycleway|footway|steps";

/// `node[amenity~...]`/`node[shop~.]` POI query body, without bbox/area
/// scoping (that is appended by the caller).
pub const POI_QUERY: &str = "node[amenity~\"^(restaurant|cafe|bar|pub|fast_food|fuel|pharmacy|hospital|clinic|doctors|dentist|bank|atm|post_office|police|fire_station|school|university|library|parking|bicycle_parking|charging_station|car_rental|bus_station|ferry_terminal|theatre|cinema|marketplace|townhall|community_centre|place_of_worship)$\"];node[shop~\".\"];";

pub fn highway_regex(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Vehicle => VEHICLE_HIGHWAY_REGEX,
        TransportMode::Pedestrian => PEDESTRIAN_HIGHWAY_REGEX,
    }
}

/// Builds the `[out:json]` Overpass query for roads within `bbox`
/// (`south,west,north,east`) for the given transport mode.
pub fn road_query_bbox(mode: TransportMode, bbox: (f64, f64, f64, f64)) -> String {
    let (south, west, north, east) = bbox;
    format!(
        "[out:json];(way[\"highway\"~\"{}\"][\"area\"!~\".\"]({south},{west},{north},{east}););out geom;(._;>;);",
        highway_regex(mode)
    )
}

/// Builds the Overpass query for roads within a resolved area id (Nominatim
/// `osm_id + 3_600_000_000`).
pub fn road_query_area(mode: TransportMode, area_id: u64) -> String {
    format!(
        "[out:json];area({area_id})->.searchArea;(way[\"highway\"~\"{}\"][\"area\"!~\".\"](area.searchArea););out geom;(._;>;);",
        highway_regex(mode)
    )
}

/// Builds the Overpass POI query for `bbox`.
pub fn poi_query_bbox(bbox: (f64, f64, f64, f64)) -> String {
    let (south, west, north, east) = bbox;
    let scoped = POI_QUERY.replace(']', &format!("]({south},{west},{north},{east})"));
    format!("[out:json];({scoped});out geom;")
}

/// Builds the Overpass POI query for a resolved area id.
pub fn poi_query_area(area_id: u64) -> String {
    let scoped = POI_QUERY.replace(']', &format!("](area.searchArea)"));
    format!("[out:json];area({area_id})->.searchArea;({scoped});out geom;")
}

/// Builds the Overpass water-area query for `bbox`: natural water bodies
/// and waterway riverbanks, used to mask isochrone polygons.
pub fn water_area_query_bbox(bbox: (f64, f64, f64, f64)) -> String {
    let (south, west, north, east) = bbox;
    format!(
        "[out:json];(way[\"natural\"=\"water\"]({south},{west},{north},{east});relation[\"natural\"=\"water\"]({south},{west},{north},{east});way[\"waterway\"=\"riverbank\"]({south},{west},{north},{east}););out geom;(._;>;);"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_regex_excludes_footway() {
        assert!(!VEHICLE_HIGHWAY_REGEX.contains("footway"));
        assert!(PEDESTRIAN_HIGHWAY_REGEX.contains("footway"));
    }

    #[test]
    fn road_query_embeds_bbox_and_mode() {
        let q = road_query_bbox(TransportMode::Vehicle, (1.0, 2.0, 3.0, 4.0));
        assert!(q.contains("1,2,3,4"));
        assert!(q.contains("motorway"));
    }
}
