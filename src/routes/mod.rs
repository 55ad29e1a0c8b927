//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Auth endpoints (email callback, session refresh, health) plus whatever
//! page router the host provides, all behind the session guard. Static pages
//! are served from `SITE_DIR` when no page router is supplied.

pub mod auth;
pub mod guard;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::paths::CALLBACK_PATH;
use crate::state::AppState;

pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Full app: auth routes + static site from `config.site_dir`.
pub fn app(state: AppState) -> Router {
    let site = ServeDir::new(&state.config.site_dir).append_index_html_on_directories(true);
    app_with_pages(state, Router::new().fallback_service(site))
}

/// Auth routes merged with a caller-supplied page router, all guarded.
pub fn app_with_pages(state: AppState, pages: Router) -> Router {
    Router::new()
        .route(CALLBACK_PATH, get(auth::callback))
        .route(REFRESH_PATH, get(auth::refresh))
        .route("/healthz", get(healthz))
        .with_state(state.clone())
        .merge(pages)
        .layer(middleware::from_fn_with_state(state, guard::session_guard))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
