//! The home feed: every post in memory, narrowed by search and category,
//! one page at a time, next to the sidebars.

pub mod filter;
pub mod pagination;
pub mod sidebar;

use std::collections::HashSet;

use serde::Deserialize;

use crate::db::models::Post;
use crate::db::{Repository, RepositoryError};

pub use filter::{filter_posts, FeedFilter, Searchable};
pub use pagination::{paginate, Page};
pub use sidebar::{category_tallies, Activity, CategoryTally, TopPost};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    /// Kept as text so `?page=` or `?page=abc` lands on page 1 instead of
    /// failing extraction.
    #[serde(default)]
    pub page: Option<String>,
}

impl FeedQuery {
    /// Requested page, 1 when missing or unparseable. `paginate` clamps the rest.
    pub fn page_number(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

#[derive(Debug)]
pub struct Feed {
    pub page: Page<Post>,
    pub liked: HashSet<String>,
    pub saved: HashSet<String>,
    /// Posts matching the filter, across all pages.
    pub matching: usize,
    pub total: usize,
}

pub async fn load(
    repo: &dyn Repository,
    viewer: Option<&str>,
    query: &FeedQuery,
    page_size: usize,
) -> Result<Feed, RepositoryError> {
    let posts = repo.list_posts().await?;
    let (liked, saved) = match viewer {
        Some(user_id) => (
            repo.liked_post_ids(user_id).await?,
            repo.saved_post_ids(user_id).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let total = posts.len();
    let matching = filter_posts(&posts, &query.q, &query.category);
    let count = matching.len();

    Ok(Feed {
        page: paginate(matching, query.page_number(), page_size),
        liked,
        saved,
        matching: count,
        total,
    })
}

#[derive(Debug)]
pub struct Sidebars {
    pub top_posts: Vec<TopPost>,
    pub categories: Vec<CategoryTally>,
    pub activity: Activity,
}

pub async fn sidebars(
    repo: &dyn Repository,
    top_limit: usize,
    selected_category: &str,
    active_members: usize,
) -> Result<Sidebars, RepositoryError> {
    let top_posts = repo
        .top_posts(top_limit)
        .await?
        .iter()
        .map(TopPost::from)
        .collect();
    let categories = category_tallies(
        repo.count_posts().await?,
        &repo.category_counts().await?,
        selected_category,
    );
    let activity = Activity::new(
        repo.count_posts_since(24).await?,
        repo.count_posts_since(24 * 7).await?,
        active_members,
    );

    Ok(Sidebars {
        top_posts,
        categories,
        activity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> FeedQuery {
        FeedQuery {
            page: page.map(str::to_string),
            ..FeedQuery::default()
        }
    }

    #[test]
    fn page_number_falls_back_to_first_page() {
        assert_eq!(query(None).page_number(), 1);
        assert_eq!(query(Some("")).page_number(), 1);
        assert_eq!(query(Some("abc")).page_number(), 1);
        assert_eq!(query(Some("-2")).page_number(), 1);
        assert_eq!(query(Some("3")).page_number(), 3);
        assert_eq!(query(Some("0")).page_number(), 0);
    }
}
