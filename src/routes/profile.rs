use askama::Template;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::flash::{self, Flash, IncomingFlash};
use crate::messages;
use crate::profile::{self, CompletionErrors, ProfileStats};
use crate::routes::upload::{store_image, MultipartForm};
use crate::routes::views::{format_date, render, Layout, PostCard};
use crate::state::AppState;
use crate::storage::AVATARS;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub initial: String,
    pub is_owner: bool,
    pub joined: String,
    pub stats: ProfileStats,
    pub cards: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "pages/complete_account.html")]
pub struct CompleteAccountTemplate {
    pub layout: Layout,
    pub full_name: String,
    pub phone_number: String,
    pub errors: CompletionErrors,
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(show))
        .route("/profile/edit", post(edit))
        .route("/profile/avatar", post(avatar))
        .route("/complete-account", get(complete_page).post(complete))
}

/// GET /profile
async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let repo = state.repo.as_ref();
    let profile = repo.get_profile(&user.id).await?;
    let posts = repo.posts_by_author(&user.id).await?;
    let liked = repo.liked_post_ids(&user.id).await?;
    let saved = repo.saved_post_ids(&user.id).await?;

    let cards = posts
        .iter()
        .map(|post| {
            PostCard::new(
                post,
                Some(&user),
                liked.contains(&post.id),
                saved.contains(&post.id),
                &state.config.auth.site_url,
            )
        })
        .collect();

    let name = user.display_name().to_string();
    let profile = profile.as_ref();
    Ok(render(
        &flash,
        ProfileTemplate {
            layout: Layout::new("الملف الشخصي", Some(&user), &flash),
            initial: name.chars().next().map(String::from).unwrap_or_default(),
            full_name: name,
            email: user.email.clone(),
            phone_number: profile
                .and_then(|p| p.phone_number.clone())
                .unwrap_or_default(),
            bio: profile.and_then(|p| p.bio.clone()).unwrap_or_default(),
            avatar_url: user.avatar_url.clone(),
            is_owner: user.is_owner,
            joined: profile
                .map(|p| format_date(&p.created_at))
                .unwrap_or_default(),
            stats: ProfileStats::from_posts(&posts),
            cards,
        },
    ))
}

/// POST /profile/edit
async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = MultipartForm::read(multipart).await?;
    let update = match profile::validate_update(
        form.text("full_name"),
        form.text("phone_number"),
        form.text("bio"),
    ) {
        Ok(update) => update,
        Err(e) => return Ok(flash::redirect("/profile", Flash::error(e.message()))),
    };

    Ok(match state.repo.update_profile(&user.id, &update).await {
        Ok(()) => flash::redirect("/profile", Flash::success(messages::PROFILE_UPDATED)),
        Err(e) => {
            tracing::error!(user_id = %user.id, "Profile update failed: {}", e);
            flash::redirect("/profile", Flash::error(messages::PROFILE_UPDATE_FAILED))
        }
    })
}

/// POST /profile/avatar
async fn avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = MultipartForm::read(multipart).await?;
    let Some(image) = form.file("avatar") else {
        return Ok(Redirect::to("/profile").into_response());
    };
    if let Err(e) = image.validate() {
        return Ok(flash::redirect("/profile", Flash::error(e.message())));
    }

    let stored = match store_image(state.store.as_ref(), AVATARS, None, &user.id, image).await {
        Ok(url) => state.repo.set_avatar(&user.id, &url).await.map_err(AppError::from),
        Err(e) => Err(e),
    };

    Ok(match stored {
        Ok(()) => flash::redirect("/profile", Flash::success(messages::AVATAR_UPDATED)),
        Err(e) => {
            tracing::error!(user_id = %user.id, "Avatar upload failed: {}", e);
            flash::redirect("/profile", Flash::error(messages::AVATAR_FAILED))
        }
    })
}

/// GET /complete-account
async fn complete_page(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    if user.profile_completed {
        return Ok(Redirect::to("/").into_response());
    }
    let phone = state
        .repo
        .get_profile(&user.id)
        .await?
        .and_then(|p| p.phone_number)
        .unwrap_or_default();

    Ok(render(
        &flash,
        CompleteAccountTemplate {
            layout: Layout::new("إكمال الحساب", Some(&user), &flash),
            full_name: user.full_name.clone().unwrap_or_default(),
            phone_number: phone,
            errors: CompletionErrors::default(),
            error: None,
        },
    ))
}

/// POST /complete-account
async fn complete(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = MultipartForm::read(multipart).await?;
    let (full_name, phone) = (form.text("full_name"), form.text("phone_number"));
    let rerender = |errors: CompletionErrors, error: Option<&str>| {
        render(
            &flash,
            CompleteAccountTemplate {
                layout: Layout::new("إكمال الحساب", Some(&user), &flash),
                full_name: full_name.to_string(),
                phone_number: phone.to_string(),
                errors,
                error: error.map(str::to_string),
            },
        )
    };

    let completion = match profile::validate_completion(full_name, phone) {
        Ok(completion) => completion,
        Err(errors) => return Ok(rerender(errors, None)),
    };

    let avatar_url = match form.file("avatar") {
        Some(image) => {
            if let Err(e) = image.validate() {
                return Ok(rerender(CompletionErrors::default(), Some(e.message())));
            }
            match store_image(state.store.as_ref(), AVATARS, None, &user.id, image).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(user_id = %user.id, "Avatar upload failed: {}", e);
                    return Ok(rerender(
                        CompletionErrors::default(),
                        Some(messages::AVATAR_FAILED),
                    ));
                }
            }
        }
        None => None,
    };

    match state
        .repo
        .complete_profile(
            &user.id,
            &completion.full_name,
            &completion.phone_number,
            avatar_url.as_deref(),
        )
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "Profile completed");
            Ok(flash::redirect("/", Flash::success(messages::PROFILE_SAVED)))
        }
        Err(e) => {
            tracing::error!(user_id = %user.id, "Profile completion failed: {}", e);
            Ok(rerender(
                CompletionErrors::default(),
                Some(messages::PROFILE_UPDATE_FAILED),
            ))
        }
    }
}
