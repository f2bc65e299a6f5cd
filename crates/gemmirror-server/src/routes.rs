use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::{handlers, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/dependencies", get(handlers::dependencies))
        .route("/api/v1/dependencies.json", get(handlers::dependencies_json))
        .route("/api/v1/add_spec.json", post(handlers::add_spec))
        .route("/api/v1/remove_spec.json", post(handlers::remove_spec))
        .route("/quick/Marshal.4.8/{id}", get(handlers::quick_redirect))
        .route("/fetch/actual/gem/{id}", get(handlers::fetch_redirect))
        .route("/gems/{id}", get(handlers::gem_redirect))
        .route("/specs.4.8.gz", get(handlers::specs_redirect))
        .route("/health", get(handlers::health))
        .layer(Extension(state))
}
