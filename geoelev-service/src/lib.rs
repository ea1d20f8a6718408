//! geoelev Service Library
//!
//! HTTP handlers, router and types for the elevation service.
//! This library is used by both the geoelev-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use geoelev::{BoundingBox, ElevationService, ElevationServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Elevation service with all tiles loaded.
    pub service: ElevationService,
}

// Re-export commonly used types for convenience
pub use handlers::{
    ElevationQuery, ElevationResponse, ErrorResponse, HealthResponse, StatsResponse, TileResponse,
};

/// OpenAPI documentation for the geoelev service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "geoelev Elevation Service",
        version = "0.1.0",
        description = "REST API for querying ground elevation from GeoTIFF and SRTM rasters.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_elevation,
        handlers::post_elevation,
        handlers::list_tiles,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::ElevationQuery,
            handlers::ElevationResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
            handlers::TileResponse,
            handlers::BoundsResponse,
        )
    ),
    tags(
        (name = "elevation", description = "Elevation query endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router with docs, tracing and CORS layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/elevation",
            get(handlers::get_elevation).post(handlers::post_elevation),
        )
        .route("/tiles", get(handlers::list_tiles))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Service configuration from the environment.
///
/// Reads the library's `GEOELEV_*` variables plus `GEOELEV_PRELOAD`. With
/// neither `GEOELEV_DATA_DIR` nor `GEOELEV_TILES` set, the current directory
/// is loaded.
///
/// # Errors
///
/// Any variable that is set but malformed, except `GEOELEV_PRELOAD`, which
/// falls back to loading every tile.
pub fn builder_from_env() -> geoelev::Result<ElevationServiceBuilder> {
    let mut builder = ElevationServiceBuilder::new().with_env()?;
    if !builder.has_tile_source() {
        tracing::warn!("GEOELEV_DATA_DIR and GEOELEV_TILES not set, using current directory");
        builder = builder.data_dir(".");
    }

    if let Ok(preload_val) = std::env::var("GEOELEV_PRELOAD") {
        if let Some(bounds) = parse_preload_bounds(&preload_val) {
            tracing::info!(boxes = bounds.len(), "Restricting directory load");
            builder = builder.preload_bounds(bounds);
        }
    }

    Ok(builder)
}

/// Parse the `GEOELEV_PRELOAD` environment variable value into bounding boxes.
///
/// Supported formats:
/// - `true`, `all`, `1`: preload all tiles (returns `None`)
/// - `south,west,north,east`: single bounding box
/// - `south,west,north,east;south,west,north,east`: multiple bounding boxes
///
/// Malformed boxes are skipped with a warning; if none parse, all tiles are
/// preloaded.
pub fn parse_preload_bounds(value: &str) -> Option<Vec<BoundingBox>> {
    let trimmed = value.trim();

    // Check for "all tiles" keywords
    match trimmed.to_lowercase().as_str() {
        "true" | "all" | "1" => return None,
        _ => {}
    }

    let boxes: Vec<BoundingBox> = trimmed
        .split(';')
        .filter_map(|bbox_str| {
            let parts: Vec<f64> = bbox_str
                .split(',')
                .filter_map(|s| s.trim().parse::<f64>().ok())
                .collect();
            if parts.len() == 4 {
                Some(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
            } else {
                tracing::warn!(
                    bbox = bbox_str,
                    "Invalid bounding box format, expected south,west,north,east"
                );
                None
            }
        })
        .collect();

    if boxes.is_empty() {
        tracing::warn!(
            value = trimmed,
            "Could not parse GEOELEV_PRELOAD value, preloading all tiles"
        );
        None
    } else {
        Some(boxes)
    }
}
