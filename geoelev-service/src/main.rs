//! geoelev Service - HTTP microservice for raster elevation queries.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GEOELEV_DATA_DIR` | Directory of rasters to load | Current directory |
//! | `GEOELEV_TILES` | Explicit tiles, `id=path;id=path` | None |
//! | `GEOELEV_DIRECT_SNAP` | `round` or `truncate` | `round` |
//! | `GEOELEV_REPROJECTED_SNAP` | `round` or `truncate` | `truncate` |
//! | `GEOELEV_PRELOAD` | Bounding boxes limiting the directory load | All tiles |
//! | `GEOELEV_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /elevation?lat=X&lon=Y` - Get elevation at coordinates
//! - `POST /elevation` - Add elevations to a GeoJSON geometry
//! - `GET /tiles` - Loaded tiles and their coverage
//! - `GET /health` - Health check
//! - `GET /stats` - Lookup statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use geoelev_service::{builder_from_env, router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoelev=info,geoelev_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load port from environment (service-specific config)
    let port: u16 = std::env::var("GEOELEV_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // GEOELEV_DATA_DIR, GEOELEV_TILES, snapping and GEOELEV_PRELOAD
    let builder = builder_from_env()?;

    let start = Instant::now();
    let service = builder.build()?;
    tracing::info!(
        tiles = service.tile_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        port = port,
        "Starting geoelev service"
    );

    let app = router(Arc::new(AppState { service }));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
