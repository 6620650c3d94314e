use std::collections::HashMap;

use crate::db::models::{Category, Post};
use crate::messages::ANONYMOUS_AUTHOR;

const TITLE_CHARS: usize = 50;

/// A post as listed in the "most liked" sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct TopPost {
    pub id: String,
    pub title: String,
    pub author: String,
    pub likes: i64,
    pub views: i64,
}

impl From<&Post> for TopPost {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: truncate(&post.content, TITLE_CHARS),
            author: post.author_name().unwrap_or(ANONYMOUS_AUTHOR).to_string(),
            likes: post.likes_count,
            views: post.views_count,
        }
    }
}

/// First `max` characters of `text`, with "..." appended when cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// One row of the category sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTally {
    pub label: &'static str,
    /// Query value; empty for "all".
    pub value: &'static str,
    pub emoji: &'static str,
    pub count: i64,
    pub active: bool,
}

/// "All" followed by every category, each with its post count.
pub fn category_tallies(
    total: i64,
    counts: &HashMap<String, i64>,
    selected: &str,
) -> Vec<CategoryTally> {
    let selected = selected.trim();
    let all = CategoryTally {
        label: "الكل",
        value: "",
        emoji: "🧭",
        count: total,
        active: selected.is_empty(),
    };
    std::iter::once(all)
        .chain(Category::ALL.into_iter().map(|category| CategoryTally {
            label: category.as_str(),
            value: category.as_str(),
            emoji: category.emoji(),
            count: counts.get(category.as_str()).copied().unwrap_or(0),
            active: selected == category.as_str(),
        }))
        .collect()
}

/// Activity numbers shown under the top posts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activity {
    pub last_day: String,
    pub last_week: String,
    pub active_members: String,
}

impl Activity {
    pub fn new(last_day: i64, last_week: i64, active_members: usize) -> Self {
        Self {
            last_day: format_count(last_day),
            last_week: format_count(last_week),
            active_members: format_count(active_members as i64),
        }
    }
}

/// `1234` → `1.2K`; smaller numbers unchanged.
pub fn format_count(n: i64) -> String {
    if n >= 1000 {
        format!("{:.1}K", n as f64 / 1000.0)
    } else {
        n.to_string()
    }
}
