use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::session::{expires_within, session_cookie};
use crate::extractors::cookie_value;
use crate::state::AppState;

/// Pages that need a signed-in visitor.
const PROTECTED: &[&str] = &["/profile", "/create", "/complete-account"];

/// Pages a signed-in visitor has no business seeing.
const GUEST_ONLY: &[&str] = &["/auth/login", "/auth/register"];

/// Sessions closer than this to expiry are extended on the next request.
const REFRESH_WINDOW_HOURS: i64 = 24;

/// Where to send a request for `path` instead of serving it, if anywhere.
pub fn decide(path: &str, has_session: bool) -> Option<&'static str> {
    if !has_session && PROTECTED.iter().any(|p| path.starts_with(p)) {
        return Some("/auth/login");
    }
    if has_session && GUEST_ONLY.iter().any(|p| path.starts_with(p)) {
        return Some("/");
    }
    None
}

pub async fn protect(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let cookie_name = &state.config.auth.cookie_name;
    let session = match cookie_value(request.headers(), cookie_name) {
        Some(token) => state.auth.get_session(token).await.unwrap_or_else(|e| {
            tracing::error!("Session lookup failed: {}", e);
            None
        }),
        None => None,
    };
    // A recovery session only unlocks the password reset form
    let session = session.filter(|s| !s.recovery);

    if let Some(to) = decide(request.uri().path(), session.is_some()) {
        return Redirect::to(to).into_response();
    }

    let mut response = next.run(request).await;

    let Some(session) = session else {
        return response;
    };
    if !expires_within(&session.expires_at, REFRESH_WINDOW_HOURS) {
        return response;
    }
    match state.auth.refresh_session(&session.access_token).await {
        Ok(refreshed) => {
            let cookie = session_cookie(
                cookie_name,
                &refreshed.access_token,
                state.config.auth.session_hours,
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        Err(e) => tracing::debug!("Session not refreshed: {}", e),
    }
    response
}
