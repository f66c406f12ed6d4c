//! HTTP clients for the OSM Overpass and Nominatim endpoints, with the
//! workspace's shared retry policy, kept behind traits so callers can
//! substitute fakes in tests.

pub mod nominatim;
pub mod overpass;
pub mod queries;
pub mod retry;

pub use nominatim::{NominatimClient, NominatimMatch, ReqwestNominatimClient};
pub use overpass::{OverpassClient, OverpassElement, OverpassResponse, ReqwestOverpassClient};
pub use retry::{with_retry, RetryPolicy};

pub use queries::{
    highway_regex, poi_query_area, poi_query_bbox, road_query_area, road_query_bbox,
    water_area_query_bbox,
};
