//! Axum routes over `RoutingEngine`, one per facade entry point plus an
//! OpenAPI document. Grounded on `tools/butterfly-route/src/server.rs`'s
//! `Router` + `utoipa::OpenApi` + `Arc<State>` shape, generalized from one
//! `/route` handler to the eight facade entry points.

use crate::facade::RoutingEngine;
use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use butterfly_common::{Coordinate, Error, TransportMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(roads_from_bbox_handler, shortest_path_from_bbox_handler))]
struct ApiDoc;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        Error::LocationUnresolved
        | Error::EmptyOsmData
        | Error::AdditionalNodeOutsideArea(_)
        | Error::IsochroneLimit(_)
        | Error::UnsupportedGeometry(_)
        | Error::TransportModeInvalid(_) => StatusCode::BAD_REQUEST,
        Error::HttpTransient(_) | Error::HttpFailure(_) | Error::Io(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorResponse { error: err.to_string() }))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct BboxRequest {
    pub bbox: (f64, f64, f64, f64),
    pub mode: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RoadsResponse {
    pub count: usize,
}

#[utoipa::path(
    post,
    path = "/roads/bbox",
    request_body = BboxRequest,
    responses((status = 200, description = "Roads extracted", body = RoadsResponse))
)]
async fn roads_from_bbox_handler(
    State(engine): State<Arc<RoutingEngine>>,
    Json(req): Json<BboxRequest>,
) -> Result<Json<RoadsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mode: TransportMode = req.mode.parse().map_err(error_response)?;
    let lines = engine.roads_from_bbox(req.bbox, mode).await.map_err(error_response)?;
    Ok(Json(RoadsResponse { count: lines.len() }))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ShortestPathBboxRequest {
    pub bbox: (f64, f64, f64, f64),
    pub mode: String,
    pub pairs: Vec<((f64, f64), (f64, f64))>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ShortestPathResponse {
    pub count: usize,
}

#[utoipa::path(
    post,
    path = "/shortest-path/bbox",
    request_body = ShortestPathBboxRequest,
    responses((status = 200, description = "Paths computed", body = ShortestPathResponse))
)]
async fn shortest_path_from_bbox_handler(
    State(engine): State<Arc<RoutingEngine>>,
    Json(req): Json<ShortestPathBboxRequest>,
) -> Result<Json<ShortestPathResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mode: TransportMode = req.mode.parse().map_err(error_response)?;
    let pairs: Vec<(Coordinate, Coordinate)> = req
        .pairs
        .iter()
        .map(|((alon, alat), (blon, blat))| (Coordinate::new(*alon, *alat), Coordinate::new(*blon, *blat)))
        .collect();
    let results = engine
        .shortest_path_from_bbox(req.bbox, mode, &pairs)
        .await
        .map_err(error_response)?;
    Ok(Json(ShortestPathResponse { count: results.len() }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router(engine: Arc<RoutingEngine>) -> Router {
    Router::new()
        .route("/roads/bbox", post(roads_from_bbox_handler))
        .route("/shortest-path/bbox", post(shortest_path_from_bbox_handler))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}
