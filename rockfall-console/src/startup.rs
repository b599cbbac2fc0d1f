use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use rockfall_core::middleware::{
    request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    app::{health_check, index},
    auth::{login_handler, logout_handler, refresh_profile_handler, session_handler},
    metrics::metrics,
    views::{dashboard_handler, mine_access_handler},
};
use crate::middleware::guard::view_guard;
use crate::services::metrics::metrics_middleware;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Every dashboard view goes through the same guard.
    let dashboard = Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/dashboard/:view", get(dashboard_handler))
        .route_layer(from_fn_with_state(state.clone(), view_guard));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/session", get(session_handler))
        .route("/session/profile", post(refresh_profile_handler))
        .route("/mines/:mine_id/access", get(mine_access_handler))
        .merge(dashboard)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .with_state(state)
}
