//! HTTP request handlers for the elevation service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geoelev::{ElevationError, TileInfo};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for elevation endpoint.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ElevationQuery {
    /// Latitude in decimal degrees (-90 to 90).
    pub lat: f64,
    /// Longitude in decimal degrees (-180 to 180).
    pub lon: f64,
}

/// Successful elevation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ElevationResponse {
    /// Elevation in meters. Nodata cells read as sea level (0).
    pub elevation: i32,
    /// Latitude queried.
    pub lat: f64,
    /// Longitude queried.
    pub lon: f64,
    /// Whether the owning tile has no data at this cell.
    pub nodata: bool,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Number of loaded tiles.
    pub tiles: usize,
}

/// Lookup statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of loaded tiles.
    pub tiles: usize,
    /// Total number of coordinate queries.
    pub lookups: u64,
    /// Queries answered with a sample value.
    pub resolved: u64,
    /// Queries that hit a nodata cell.
    pub nodata: u64,
    /// Queries that could not be resolved.
    pub unresolved: u64,
    /// Fraction of unresolved queries (0.0 to 1.0).
    pub unresolved_rate: f64,
}

/// Geographic bounding box in WGS84 degrees.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoundsResponse {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

/// A loaded tile.
#[derive(Debug, Serialize, ToSchema)]
pub struct TileResponse {
    /// Tile identifier.
    pub id: String,
    /// File the tile was loaded from.
    pub source: Option<String>,
    /// Grid width in samples.
    pub width: usize,
    /// Grid height in samples.
    pub height: usize,
    /// Native coordinate reference system.
    pub crs: String,
    /// Lookup strategy: direct, affine or reprojected.
    pub lookup_path: String,
    /// WGS84 coverage.
    pub bounds: BoundsResponse,
}

impl From<TileInfo> for TileResponse {
    fn from(info: TileInfo) -> Self {
        Self {
            id: info.id,
            source: info.source.map(|p| p.display().to_string()),
            width: info.width,
            height: info.height,
            crs: info.crs.to_string(),
            lookup_path: info.lookup_path.to_string(),
            bounds: BoundsResponse {
                north: info.bounds.north,
                south: info.bounds.south,
                west: info.bounds.west,
                east: info.bounds.east,
            },
        }
    }
}

/// Get elevation for given coordinates.
#[utoipa::path(
    get,
    path = "/elevation",
    tag = "elevation",
    params(ElevationQuery),
    responses(
        (status = 200, description = "Elevation found", body = ElevationResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 404, description = "No loaded tile covers the coordinates", body = ErrorResponse),
        (status = 422, description = "Coordinates cannot be mapped into the tile grid", body = ErrorResponse)
    )
)]
pub async fn get_elevation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ElevationQuery>,
) -> Response {
    tracing::debug!(lat = query.lat, lon = query.lon, "Elevation query");

    match state.service.get_elevation(query.lat, query.lon) {
        Ok(sample) => {
            tracing::info!(
                lat = query.lat,
                lon = query.lon,
                elevation = ?sample,
                "Elevation found"
            );
            (
                StatusCode::OK,
                Json(ElevationResponse {
                    elevation: sample.map_or(i32::from(geoelev::SEA_LEVEL), i32::from),
                    lat: query.lat,
                    lon: query.lon,
                    nodata: sample.is_none(),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(query.lat, query.lon, e),
    }
}

/// Add elevations to every position of a GeoJSON geometry.
#[utoipa::path(
    post,
    path = "/elevation",
    tag = "elevation",
    request_body(content = Object, description = "GeoJSON geometry", content_type = "application/json"),
    responses(
        (status = 200, description = "Geometry with elevation as Z coordinate", body = Object),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 404, description = "No loaded tile covers a coordinate", body = ErrorResponse),
        (status = 422, description = "A coordinate cannot be mapped into its tile grid", body = ErrorResponse)
    )
)]
pub async fn post_elevation(
    State(state): State<Arc<AppState>>,
    Json(geometry): Json<Geometry>,
) -> Response {
    match geoelev::geojson::add_elevations_to_geometry(&state.service, geometry) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            tracing::warn!(error = %e, "GeoJSON elevation query failed");
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn status_for(e: &ElevationError) -> StatusCode {
    match e {
        ElevationError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
        ElevationError::NoCoveringTile { .. } => StatusCode::NOT_FOUND,
        ElevationError::OutOfGrid { .. } | ElevationError::Projection { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create an error response for elevation queries.
fn error_response(lat: f64, lon: f64, e: ElevationError) -> Response {
    tracing::warn!(lat = lat, lon = lon, error = %e, "Elevation query failed");

    (
        status_for(&e),
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// List loaded tiles, highest precedence first.
#[utoipa::path(
    get,
    path = "/tiles",
    tag = "system",
    responses((status = 200, description = "Loaded tiles", body = [TileResponse]))
)]
pub async fn list_tiles(State(state): State<Arc<AppState>>) -> Json<Vec<TileResponse>> {
    Json(
        state
            .service
            .tiles()
            .into_iter()
            .map(TileResponse::from)
            .collect(),
    )
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tiles: state.service.tile_count(),
    })
}

/// Get lookup statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Lookup statistics", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.service.stats();

    Json(StatsResponse {
        tiles: stats.tile_count,
        lookups: stats.lookups,
        resolved: stats.resolved,
        nodata: stats.nodata,
        unresolved: stats.unresolved,
        unresolved_rate: stats.unresolved_rate(),
    })
}
