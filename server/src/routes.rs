// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::Path;

use crate::handlers::{self, SharedService};
use axum::{
    Router,
    http::HeaderName,
    routing::{get, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Creates and configures the API router.
pub fn create_router(service: SharedService) -> Router {
    Router::new()
        // `GET /api/tasks` lists (with filters), `POST /api/tasks` creates
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/api/tasks/{id}/complete", put(handlers::complete_task))
        .route("/api/tasks/{id}/incomplete", put(handlers::incomplete_task))
        .route("/api/tasks/{id}/priority", put(handlers::update_priority))
        .route("/api/tasks/{id}/theme", put(handlers::update_theme))
        // Adds the task service to the application state
        .with_state(service)
}

/// Serves the front end: `/` is `index.html`, scripts, stylesheets and
/// other assets come from the `JS`, `CSS` and `assets` subdirectories.
pub fn static_routes(static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/JS", ServeDir::new(static_dir.join("JS")))
        .nest_service("/CSS", ServeDir::new(static_dir.join("CSS")))
        .nest_service("/assets", ServeDir::new(static_dir.join("assets")))
}

/// Full application: API, front end, CORS and request tracing.
pub fn create_app(service: SharedService, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    create_router(service)
        .merge(static_routes(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
