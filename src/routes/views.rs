//! View models shared by the page templates.

use askama::Template;
use axum::response::{IntoResponse, Response};

use crate::db::models::{Category, Post};
use crate::extractors::CurrentUser;
use crate::flash::{Flash, IncomingFlash};
use crate::messages::ANONYMOUS_AUTHOR;
use crate::posts::{Actor, ShareLinks};
use crate::routes::home::Html;

const MONTHS: [&str; 12] = [
    "يناير", "فبراير", "مارس", "أبريل", "مايو", "يونيو", "يوليو", "أغسطس", "سبتمبر", "أكتوبر",
    "نوفمبر", "ديسمبر",
];

/// `2024-03-05 10:00:00` → `5 مارس 2024`. Anything unparseable is shown as is.
pub fn format_date(raw: &str) -> String {
    use chrono::Datelike;

    match chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(at) => format!(
            "{} {} {}",
            at.day(),
            MONTHS[at.month0() as usize],
            at.year()
        ),
        Err(_) => raw.to_string(),
    }
}

fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "؟".to_string())
}

/// The signed-in visitor as the navigation bar shows them.
pub struct NavUser {
    pub name: String,
    pub initial: String,
    pub avatar_url: Option<String>,
    pub is_owner: bool,
}

/// Everything `base.html` needs.
pub struct Layout {
    pub title: String,
    pub user: Option<NavUser>,
    pub flash: Option<Flash>,
}

impl Layout {
    pub fn new(title: &str, user: Option<&CurrentUser>, flash: &IncomingFlash) -> Self {
        Self {
            title: title.to_string(),
            user: user.map(|u| NavUser {
                name: u.display_name().to_string(),
                initial: initial(u.display_name()),
                avatar_url: u.avatar_url.clone(),
                is_owner: u.is_owner,
            }),
            flash: flash.0.clone(),
        }
    }

    pub fn guest(title: &str, flash: &IncomingFlash) -> Self {
        Self::new(title, None, flash)
    }

    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Render a page and retire the flash it displayed.
pub fn render<T: Template>(flash: &IncomingFlash, template: T) -> Response {
    flash.consume(Html(template).into_response())
}

/// CSS class for a category badge.
pub fn category_class(category: Option<&str>) -> &'static str {
    match category.and_then(|c| c.parse::<Category>().ok()) {
        Some(Category::Romantic) => "cat-romantic",
        Some(Category::Philosophical) => "cat-philosophical",
        Some(Category::Religious) => "cat-religious",
        Some(Category::Sad) => "cat-sad",
        Some(Category::Sarcastic) => "cat-sarcastic",
        Some(Category::Inspiring) => "cat-inspiring",
        Some(Category::Patriotic) => "cat-patriotic",
        None => "cat-none",
    }
}

/// A post as rendered in a list or on its own page.
pub struct PostCard {
    pub id: String,
    pub content: String,
    pub category: Option<String>,
    pub category_emoji: &'static str,
    pub category_class: &'static str,
    pub image_url: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub author_initial: String,
    pub author_avatar: Option<String>,
    pub author_is_owner: bool,
    pub likes_count: i64,
    pub views_count: i64,
    pub comments_count: i64,
    pub created_label: String,
    pub edited: bool,
    pub liked: bool,
    pub saved: bool,
    pub signed_in: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub share: ShareLinks,
}

impl PostCard {
    pub fn new(
        post: &Post,
        viewer: Option<&CurrentUser>,
        liked: bool,
        saved: bool,
        site_url: &str,
    ) -> Self {
        let actor = viewer.map(|u| Actor {
            id: &u.id,
            is_owner: u.is_owner,
        });
        let author_name = post.author_name().unwrap_or(ANONYMOUS_AUTHOR).to_string();
        let author = post.author.as_ref();
        let category = post.category.as_deref();

        Self {
            id: post.id.clone(),
            content: post.content.clone(),
            category: post.category.clone(),
            category_emoji: category
                .and_then(|c| c.parse::<Category>().ok())
                .map(|c| c.emoji())
                .unwrap_or(""),
            category_class: category_class(category),
            image_url: post.image_url.clone(),
            author_id: post.user_id.clone(),
            author_initial: initial(&author_name),
            author_name,
            author_avatar: author.and_then(|a| a.avatar_url.clone()),
            author_is_owner: author.is_some_and(|a| a.is_owner),
            likes_count: post.likes_count,
            views_count: post.views_count,
            comments_count: post.comments_count,
            created_label: format_date(&post.created_at),
            edited: post.updated_at != post.created_at,
            liked,
            saved,
            signed_in: viewer.is_some(),
            can_edit: actor.is_some_and(|a| a.can_edit(post)),
            can_delete: actor.is_some_and(|a| a.can_delete(post)),
            share: ShareLinks::new(site_url, &post.id, &post.content),
        }
    }
}
