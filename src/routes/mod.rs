pub mod assets;
pub mod auth;
pub mod home;
pub mod media;
pub mod pages;
pub mod posts;
pub mod profile;
pub mod saved;
pub mod upload;
pub mod views;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::auth::guard;
use crate::state::AppState;
use crate::validation::MAX_IMAGE_BYTES;

/// Room for one maximum-size image plus the rest of the form.
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// The whole site.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/unauthorized", get(pages::unauthorized))
        .route("/assets/{*path}", get(assets::serve))
        .route("/storage/{bucket}/{*path}", get(media::serve))
        .merge(auth::router())
        .merge(posts::router())
        .merge(saved::router())
        .merge(profile::router())
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), guard::protect))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
