use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::db::models::{Category, NewPost, PostUpdate};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser, ViewerId};
use crate::flash::{self, Flash, IncomingFlash};
use crate::messages;
use crate::posts::{self, Actor, Deletion, InteractionError};
use crate::routes::upload::{store_image, MultipartForm};
use crate::routes::views::{render, Layout, PostCard};
use crate::state::AppState;
use crate::storage::POST_IMAGES;

/// A category choice in the composer and editor.
pub struct CategoryOption {
    pub value: &'static str,
    pub emoji: &'static str,
    pub selected: bool,
}

fn category_options(selected: &str) -> Vec<CategoryOption> {
    Category::ALL
        .into_iter()
        .map(|c| CategoryOption {
            value: c.as_str(),
            emoji: c.emoji(),
            selected: c.as_str() == selected.trim(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "pages/create.html")]
pub struct CreateTemplate {
    pub layout: Layout,
    pub content: String,
    pub categories: Vec<CategoryOption>,
    pub max_chars: usize,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/edit.html")]
pub struct EditTemplate {
    pub layout: Layout,
    pub post_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub categories: Vec<CategoryOption>,
    pub max_chars: usize,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub layout: Layout,
    pub card: PostCard,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", get(create_page).post(create))
        .route("/edit/{id}", get(edit_page).post(edit))
        .route("/post/{id}", get(show))
        .route("/post/{id}/delete", post(delete))
        .route("/post/{id}/like", post(like))
        .route("/post/{id}/save", post(save))
        .route("/post/{id}/view", post(view))
}

fn json_failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// -- Composer --

fn composer(
    flash: &IncomingFlash,
    user: &CurrentUser,
    content: &str,
    category: &str,
    error: Option<&str>,
) -> Response {
    render(
        flash,
        CreateTemplate {
            layout: Layout::new("خاطرة جديدة", Some(user), flash),
            content: content.to_string(),
            categories: category_options(category),
            max_chars: posts::draft::MAX_CONTENT_CHARS,
            error: error.map(str::to_string),
        },
    )
}

/// GET /create
async fn create_page(user: CurrentUser, flash: IncomingFlash) -> Response {
    composer(&flash, &user, "", "", None)
}

/// POST /create
async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = MultipartForm::read(multipart).await?;
    let (content, category) = (form.text("content"), form.text("category"));

    let draft = match posts::compose(content, category) {
        Ok(draft) => draft,
        Err(e) => return Ok(composer(&flash, &user, content, category, Some(e.message()))),
    };

    let image_url = match form.file("image") {
        Some(image) => {
            if let Err(e) = image.validate() {
                return Ok(composer(&flash, &user, content, category, Some(e.message())));
            }
            match store_image(state.store.as_ref(), POST_IMAGES, Some("posts"), &user.id, image)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(user_id = %user.id, "Post image upload failed: {}", e);
                    return Ok(composer(
                        &flash,
                        &user,
                        content,
                        category,
                        Some(messages::IMAGE_UPLOAD_FAILED),
                    ));
                }
            }
        }
        None => None,
    };

    let new_post = NewPost {
        user_id: user.id.clone(),
        content: draft.content,
        category: draft.category,
        image_url,
    };
    match state.repo.insert_post(&new_post).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, user_id = %user.id, "Post published");
            Ok(flash::redirect("/", Flash::success(messages::POST_PUBLISHED)))
        }
        Err(e) => {
            tracing::error!(user_id = %user.id, "Post insert failed: {}", e);
            Ok(composer(
                &flash,
                &user,
                content,
                category,
                Some(messages::POST_PUBLISH_FAILED),
            ))
        }
    }
}

// -- Editor --

/// GET /edit/{id}
async fn edit_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Some(user) = user else {
        return Ok(Redirect::to("/auth/login").into_response());
    };
    let post = state.repo.get_post(&id).await?.ok_or(AppError::NotFound)?;
    let actor = Actor {
        id: &user.id,
        is_owner: user.is_owner,
    };
    if !actor.can_edit(&post) {
        return Ok(flash::redirect(
            "/unauthorized",
            Flash::error(messages::NO_EDIT_PERMISSION),
        ));
    }

    Ok(render(
        &flash,
        EditTemplate {
            layout: Layout::new("تعديل الخاطرة", Some(&user), &flash),
            post_id: post.id,
            content: post.content,
            image_url: post.image_url,
            categories: category_options(post.category.as_deref().unwrap_or("")),
            max_chars: posts::draft::MAX_CONTENT_CHARS,
            error: None,
        },
    ))
}

/// POST /edit/{id}
async fn edit(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let Some(user) = user else {
        return Ok(Redirect::to("/auth/login").into_response());
    };
    let post = state.repo.get_post(&id).await?.ok_or(AppError::NotFound)?;
    let actor = Actor {
        id: &user.id,
        is_owner: user.is_owner,
    };
    if !actor.can_edit(&post) {
        return Ok(flash::redirect(
            "/unauthorized",
            Flash::error(messages::NO_EDIT_PERMISSION),
        ));
    }

    let form = MultipartForm::read(multipart).await?;
    let (content, category) = (form.text("content"), form.text("category"));
    let rerender = |error: &str| {
        render(
            &flash,
            EditTemplate {
                layout: Layout::new("تعديل الخاطرة", Some(&user), &flash),
                post_id: post.id.clone(),
                content: content.to_string(),
                image_url: post.image_url.clone(),
                categories: category_options(category),
                max_chars: posts::draft::MAX_CONTENT_CHARS,
                error: Some(error.to_string()),
            },
        )
    };

    let (content, category) = match posts::revise(content, category) {
        Ok(valid) => valid,
        Err(e) => return Ok(rerender(e.message())),
    };

    let image_url = match form.file("image") {
        Some(image) => {
            if let Err(e) = image.validate() {
                return Ok(rerender(e.message()));
            }
            match store_image(state.store.as_ref(), POST_IMAGES, Some("posts"), &user.id, image)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(post_id = %post.id, "Post image upload failed: {}", e);
                    return Ok(rerender(messages::IMAGE_UPLOAD_FAILED));
                }
            }
        }
        None if form.checked("remove_image") => None,
        None => post.image_url.clone(),
    };

    let update = PostUpdate {
        content,
        category,
        image_url,
    };
    match state.repo.update_post(&post.id, &update).await {
        Ok(()) => Ok(flash::redirect(
            &format!("/post/{}", post.id),
            Flash::success(messages::POST_UPDATED),
        )),
        Err(e) => {
            tracing::error!(post_id = %post.id, "Post update failed: {}", e);
            Ok(rerender(messages::POST_UPDATE_FAILED))
        }
    }
}

// -- Single post --

/// GET /post/{id}
async fn show(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    viewer: ViewerId,
    flash: IncomingFlash,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let repo = state.repo.as_ref();
    let mut post = repo.get_post(&id).await?.ok_or(AppError::NotFound)?;

    match repo.record_view(&viewer.id, &post.id).await {
        Ok(true) => post.views_count += 1,
        Ok(false) => {}
        Err(e) => tracing::warn!(post_id = %post.id, "View not recorded: {}", e),
    }

    let (liked, saved) = match &user {
        Some(u) => (
            repo.is_liked(&u.id, &post.id).await?,
            repo.is_saved(&u.id, &post.id).await?,
        ),
        None => (false, false),
    };

    let card = PostCard::new(
        &post,
        user.as_ref(),
        liked,
        saved,
        &state.config.auth.site_url,
    );
    let page = render(
        &flash,
        PostTemplate {
            layout: Layout::new("خاطرة", user.as_ref(), &flash),
            card,
        },
    );

    if viewer.fresh {
        return Ok((AppendHeaders([(header::SET_COOKIE, viewer.cookie())]), page).into_response());
    }
    Ok(page)
}

/// POST /post/{id}/delete
async fn delete(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/auth/login").into_response();
    };
    let actor = Actor {
        id: &user.id,
        is_owner: user.is_owner,
    };

    match posts::delete_post(state.repo.as_ref(), actor, &id).await {
        Ok(Deletion::ByAuthor) => flash::redirect("/", Flash::success(messages::POST_DELETED)),
        Ok(Deletion::ByModerator) => {
            flash::redirect("/", Flash::success(messages::POST_DELETED_AS_MODERATOR))
        }
        Err(InteractionError::NotFound) => AppError::NotFound.into_response(),
        Err(InteractionError::Forbidden) => flash::redirect(
            &format!("/post/{id}"),
            Flash::error(messages::NO_DELETE_PERMISSION),
        ),
        Err(InteractionError::Repository(e)) => {
            tracing::error!(post_id = %id, "Post delete failed: {}", e);
            flash::redirect(
                &format!("/post/{id}"),
                Flash::error(messages::POST_DELETE_FAILED),
            )
        }
    }
}

// -- JSON interactions --

/// POST /post/{id}/like
async fn like(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = user.ok_or(AppError::LoginRequired(messages::LOGIN_TO_LIKE))?;
    Ok(
        match posts::toggle_like(state.repo.as_ref(), &user.id, &id).await {
            Ok(like) => Json(like).into_response(),
            Err(InteractionError::NotFound) => {
                json_failure(StatusCode::NOT_FOUND, messages::NOT_FOUND)
            }
            Err(e) => {
                tracing::error!(post_id = %id, "Like failed: {}", e);
                json_failure(StatusCode::INTERNAL_SERVER_ERROR, messages::LIKE_FAILED)
            }
        },
    )
}

/// POST /post/{id}/save
async fn save(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = user.ok_or(AppError::LoginRequired(messages::LOGIN_TO_SAVE))?;
    Ok(
        match posts::toggle_save(state.repo.as_ref(), &user.id, &id).await {
            Ok(outcome) => Json(json!({
                "saved": outcome.saved,
                "message": if outcome.saved { messages::SAVED } else { messages::UNSAVED },
            }))
            .into_response(),
            Err(InteractionError::NotFound) => {
                json_failure(StatusCode::NOT_FOUND, messages::NOT_FOUND)
            }
            Err(e) => {
                tracing::error!(post_id = %id, "Save failed: {}", e);
                json_failure(StatusCode::INTERNAL_SERVER_ERROR, messages::SAVE_FAILED)
            }
        },
    )
}

/// POST /post/{id}/view
async fn view(
    State(state): State<AppState>,
    viewer: ViewerId,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let counted = state.repo.record_view(&viewer.id, &id).await?;
    let body = Json(json!({ "counted": counted }));
    if viewer.fresh {
        return Ok((AppendHeaders([(header::SET_COOKIE, viewer.cookie())]), body).into_response());
    }
    Ok(body.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_options_mark_the_selection() {
        let options = category_options("حزين");
        assert_eq!(options.len(), 7);
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(options.iter().any(|o| o.value == "وطني"));
        assert!(category_options("").iter().all(|o| !o.selected));
    }
}
