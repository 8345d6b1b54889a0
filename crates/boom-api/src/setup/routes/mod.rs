//! Route configuration and setup.
//!
//! Video routes live under `/api/videos`; health checks in [health](health).

mod health;

use crate::auth::middleware::{auth_middleware, AuthState};
use crate::handlers::{video_engagement, video_get, video_update, video_upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, patch, post},
    Json, Router,
};
use boom_core::Config;
use boom_infra::request_id_middleware;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
        .max(1);
    tracing::info!(
        http_concurrency_limit,
        max_request_body_bytes = config.max_request_body_bytes(),
        "HTTP limits configured"
    );

    build_router(
        state,
        config.max_request_body_bytes(),
        http_concurrency_limit,
    )
}

/// Assemble the router and middleware stack around an already-built state.
pub fn build_router(
    state: Arc<AppState>,
    max_request_body_bytes: usize,
    http_concurrency_limit: usize,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state.security.cors_origins)?;
    let auth_state = Arc::new(AuthState::new(&state.security.jwt_secret));
    let require_auth =
        || axum::middleware::from_fn_with_state(auth_state.clone(), auth_middleware);

    let videos = Router::new()
        .route("/api/videos", get(video_get::list_videos))
        .route(
            "/api/videos/upload",
            post(video_upload::upload_video).route_layer(require_auth()),
        )
        .route(
            "/api/videos/{id}",
            get(video_get::get_video).merge(
                patch(video_update::update_video)
                    .delete(video_update::delete_video)
                    .route_layer(require_auth()),
            ),
        )
        .route(
            "/api/videos/like/{id}",
            post(video_engagement::like_video).route_layer(require_auth()),
        )
        .route("/api/videos/view/{id}", post(video_engagement::view_video))
        .route(
            "/api/videos/{id}/comments",
            post(video_engagement::add_comment).route_layer(require_auth()),
        );

    let app = Router::new()
        .route("/live", get(health::liveness_check))
        .route("/ready", get(health::readiness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::openapi_document()) }),
        )
        .merge(videos)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit.max(1)))
        .layer(RequestBodyLimitLayer::new(max_request_body_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(cors_origins: &[String]) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
