use serde::Serialize;
use thiserror::Error;

use crate::db::models::Post;
use crate::db::{Repository, RepositoryError};

/// Who is acting on a post.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub id: &'a str,
    pub is_owner: bool,
}

impl Actor<'_> {
    pub fn is_author_of(&self, post: &Post) -> bool {
        post.user_id == self.id
    }

    pub fn can_edit(&self, post: &Post) -> bool {
        self.is_author_of(post)
    }

    pub fn can_delete(&self, post: &Post) -> bool {
        self.is_author_of(post) || self.is_owner
    }
}

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Post not found")]
    NotFound,

    #[error("Not allowed")]
    Forbidden,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn not_found_aware(e: RepositoryError) -> InteractionError {
    match e {
        RepositoryError::NotFound(_) => InteractionError::NotFound,
        other => InteractionError::Repository(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveState {
    pub saved: bool,
}

/// Flip the user's like on a post.
pub async fn toggle_like(
    repo: &dyn Repository,
    user_id: &str,
    post_id: &str,
) -> Result<LikeState, InteractionError> {
    let liked = !repo.is_liked(user_id, post_id).await?;
    let likes_count = repo
        .set_like(user_id, post_id, liked)
        .await
        .map_err(not_found_aware)?;
    Ok(LikeState { liked, likes_count })
}

/// Flip whether the user has saved a post.
pub async fn toggle_save(
    repo: &dyn Repository,
    user_id: &str,
    post_id: &str,
) -> Result<SaveState, InteractionError> {
    let saved = !repo.is_saved(user_id, post_id).await?;
    repo.set_saved(user_id, post_id, saved)
        .await
        .map_err(not_found_aware)?;
    Ok(SaveState { saved })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    ByAuthor,
    ByModerator,
}

/// Delete a post the actor wrote, or any post when the actor is an owner.
pub async fn delete_post(
    repo: &dyn Repository,
    actor: Actor<'_>,
    post_id: &str,
) -> Result<Deletion, InteractionError> {
    let post = repo
        .get_post(post_id)
        .await?
        .ok_or(InteractionError::NotFound)?;
    if !actor.can_delete(&post) {
        return Err(InteractionError::Forbidden);
    }

    repo.delete_post(post_id).await.map_err(not_found_aware)?;

    if actor.is_author_of(&post) {
        tracing::info!(post_id, user_id = actor.id, "Post deleted by author");
        Ok(Deletion::ByAuthor)
    } else {
        tracing::info!(post_id, user_id = actor.id, author = %post.user_id, "Post removed by moderator");
        Ok(Deletion::ByModerator)
    }
}
