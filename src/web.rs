use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::{Router, response::Html, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api;
use crate::config::AirMapConfig;
use crate::controller::Controller;
use crate::map::MAPS_ROUTE;

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

/// Index page, API under `/api`, generated maps under [`MAPS_ROUTE`]
pub fn router(controller: Controller, maps_dir: PathBuf, map_file: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let index = INDEX_TEMPLATE.replace("{{MAP_FILE}}", map_file);

    Router::new()
        .route(
            "/",
            get(move || {
                let index = index.clone();
                async move { Html(index) }
            }),
        )
        .nest("/api", api::router())
        .nest_service(MAPS_ROUTE, ServeDir::new(maps_dir))
        .layer(cors)
        .with_state(controller)
}

pub async fn run(config: &AirMapConfig, controller: Controller) -> Result<()> {
    let app = router(
        controller,
        config.map.output_dir.clone(),
        &config.map.file_name,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at {}", config.server.public_url());
    axum::serve(listener, app)
        .await
        .with_context(|| "Web server stopped unexpectedly")?;
    Ok(())
}
