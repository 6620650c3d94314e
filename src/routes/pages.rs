use askama::Template;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::extractors::MaybeUser;
use crate::flash::IncomingFlash;
use crate::routes::views::{render, Layout};

#[derive(Template)]
#[template(path = "pages/unauthorized.html")]
pub struct UnauthorizedTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}

/// GET /unauthorized
pub async fn unauthorized(MaybeUser(user): MaybeUser, flash: IncomingFlash) -> Response {
    render(
        &flash,
        UnauthorizedTemplate {
            layout: Layout::new("غير مصرح", user.as_ref(), &flash),
        },
    )
}

/// Fallback for every unmatched path.
pub async fn not_found(MaybeUser(user): MaybeUser, flash: IncomingFlash) -> Response {
    let mut response = render(
        &flash,
        NotFoundTemplate {
            layout: Layout::new("الصفحة غير موجودة", user.as_ref(), &flash),
        },
    );
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.into_response()
}
