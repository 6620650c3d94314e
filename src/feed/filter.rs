use crate::db::models::Post;

/// What the feed search looks at.
pub trait Searchable {
    fn content(&self) -> &str;
    fn author_name(&self) -> Option<&str>;
    fn category(&self) -> Option<&str>;
}

impl Searchable for Post {
    fn content(&self) -> &str {
        &self.content
    }

    fn author_name(&self) -> Option<&str> {
        Post::author_name(self)
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// A search term and category picked on the feed. Empty means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    search: String,
    category: String,
}

impl FeedFilter {
    pub fn new(search: &str, category: &str) -> Self {
        Self {
            search: search.to_lowercase(),
            category: category.to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || !self.category.is_empty()
    }

    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        let search_ok = self.search.is_empty()
            || item.content().to_lowercase().contains(&self.search)
            || item
                .author_name()
                .is_some_and(|name| name.to_lowercase().contains(&self.search));
        let category_ok =
            self.category.is_empty() || item.category() == Some(self.category.as_str());
        search_ok && category_ok
    }
}

/// Posts matching `search` (in content or author name, ignoring case) and
/// `category`, in their original order.
pub fn filter_posts<T: Searchable + Clone>(posts: &[T], search: &str, category: &str) -> Vec<T> {
    let filter = FeedFilter::new(search, category);
    if !filter.is_active() {
        return posts.to_vec();
    }
    posts.iter().filter(|p| filter.matches(*p)).cloned().collect()
}
