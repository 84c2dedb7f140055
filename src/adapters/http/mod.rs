pub mod api;
pub mod error;
pub mod form;
pub mod state;
pub mod templates;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CACHE_CONTROL, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::adapters::http::state::HttpState;
use crate::config::{AppKind, StorageLayout};

/// Router completo según el adaptador configurado.
pub fn router(state: HttpState) -> Router {
    match state.config.app {
        AppKind::Ui => ui_router(state),
        AppKind::Api => api_router(state),
    }
}

/// Páginas HTML para el navegador.
pub fn ui_router(state: HttpState) -> Router {
    let routes = Router::new()
        .route("/", get(ui::homepage))
        .route("/url", get(ui::detect_by_url_page))
        .route("/webcam", get(ui::detect_by_webcam_page))
        .route("/analyze", post(ui::analyze).layer(CorsLayer::very_permissive()));
    finish(routes, state)
}

/// API JSON.
pub fn api_router(state: HttpState) -> Router {
    let routes = Router::new()
        .route("/", get(api::homepage))
        .route("/analyze", post(api::analyze).layer(CorsLayer::very_permissive()));
    finish(routes, state)
}

fn finish(routes: Router<HttpState>, state: HttpState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let statics = static_files(&state.config.layout);

    routes
        .with_state(state)
        .merge(statics)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// `/static/*` servido con `Cache-Control: max-age=1`.
fn static_files(layout: &StorageLayout) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new(&layout.static_dir))
        .layer(SetResponseHeaderLayer::overriding(CACHE_CONTROL, HeaderValue::from_static("max-age=1")))
}
