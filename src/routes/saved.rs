use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::flash::{self, Flash, IncomingFlash};
use crate::messages;
use crate::routes::views::{render, Layout, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/saved.html")]
pub struct SavedTemplate {
    pub layout: Layout,
    pub cards: Vec<PostCard>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/saved", get(list))
        .route("/saved/{id}/remove", post(remove))
}

/// GET /saved
async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let Some(user) = user else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let repo = state.repo.as_ref();
    let saved = repo.saved_posts(&user.id).await?;
    let liked = repo.liked_post_ids(&user.id).await?;
    let cards = saved
        .iter()
        .map(|post| {
            PostCard::new(
                post,
                Some(&user),
                liked.contains(&post.id),
                true,
                &state.config.auth.site_url,
            )
        })
        .collect();

    Ok(render(
        &flash,
        SavedTemplate {
            layout: Layout::new("الخواطر المحفوظة", Some(&user), &flash),
            cards,
        },
    ))
}

/// POST /saved/{id}/remove
async fn remove(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/auth/login").into_response();
    };

    match state.repo.set_saved(&user.id, &id, false).await {
        Ok(()) => flash::redirect("/saved", Flash::success(messages::UNSAVED)),
        Err(e) => {
            tracing::error!(post_id = %id, user_id = %user.id, "Unsave failed: {}", e);
            flash::redirect("/saved", Flash::error(messages::UNSAVE_FAILED))
        }
    }
}
