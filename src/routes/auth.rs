use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    // The JSON exchange is called from the confirmation email's landing page,
    // which may be served from another origin.
    let exchange = Router::new()
        .route("/auth/callback/exchange", get(handlers::callback_exchange))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        .route("/auth/login", get(handlers::login_page).post(handlers::login))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route(
            "/auth/register",
            get(handlers::register_page).post(handlers::register),
        )
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/callback", get(handlers::callback))
        .route(
            "/auth/reset-password",
            get(handlers::reset_password_page).post(handlers::reset_password),
        )
        .merge(exchange)
}
