use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::feed::{self, FeedQuery, Sidebars};
use crate::flash::IncomingFlash;
use crate::routes::views::{render, Layout, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub cards: Vec<PostCard>,
    pub search: String,
    pub category: String,
    pub filter_active: bool,
    pub matching: usize,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
    pub sidebars: Sidebars,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Search box input arrives with stray spaces; the feed filter itself
/// takes terms literally.
fn normalized(query: FeedQuery) -> FeedQuery {
    FeedQuery {
        q: query.q.trim().to_string(),
        category: query.category.trim().to_string(),
        page: query.page,
    }
}

fn page_link(query: &FeedQuery, page: usize) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    if !query.q.is_empty() {
        params.append_pair("q", &query.q);
    }
    if !query.category.is_empty() {
        params.append_pair("category", &query.category);
    }
    params.append_pair("page", &page.to_string());
    format!("/?{}", params.finish())
}

pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: IncomingFlash,
    Query(query): Query<FeedQuery>,
) -> AppResult<Response> {
    let query = normalized(query);
    let repo = state.repo.as_ref();
    let feed = feed::load(
        repo,
        user.as_ref().map(|u| u.id.as_str()),
        &query,
        state.config.feed.page_size,
    )
    .await?;

    let active_members = state.auth.count_active_users().await?;
    let sidebars = feed::sidebars(
        repo,
        state.config.feed.top_posts,
        &query.category,
        active_members,
    )
    .await?;

    let cards = feed
        .page
        .items
        .iter()
        .map(|post| {
            PostCard::new(
                post,
                user.as_ref(),
                feed.liked.contains(&post.id),
                feed.saved.contains(&post.id),
                &state.config.auth.site_url,
            )
        })
        .collect();

    let page = &feed.page;
    Ok(render(
        &flash,
        HomeTemplate {
            layout: Layout::new("خواطري", user.as_ref(), &flash),
            cards,
            filter_active: !query.q.is_empty() || !query.category.is_empty(),
            search: query.q.clone(),
            category: query.category.clone(),
            matching: feed.matching,
            total: feed.total,
            page: page.number,
            total_pages: page.total_pages,
            prev_link: page
                .has_previous()
                .then(|| page_link(&query, page.previous())),
            next_link: page.has_next().then(|| page_link(&query, page.next())),
            sidebars,
        },
    ))
}
