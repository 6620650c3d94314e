use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub profile_completed: bool,
    pub is_owner: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// The author columns embedded in a post row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub views_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<Author>,
}

impl Post {
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.full_name.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: String,
    pub content: String,
    pub category: Option<Category>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub content: String,
    pub category: Category,
    pub image_url: Option<String>,
}

/// Profile row written on sign-up and on the first confirmation callback.
#[derive(Debug, Clone)]
pub struct ProfileSeed {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_owner: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

/// The closed set of post categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Romantic,
    Philosophical,
    Religious,
    Sad,
    Sarcastic,
    Inspiring,
    Patriotic,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Romantic,
        Category::Philosophical,
        Category::Religious,
        Category::Sad,
        Category::Sarcastic,
        Category::Inspiring,
        Category::Patriotic,
    ];

    /// The stored value, which is also the filter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Romantic => "رومانسي",
            Category::Philosophical => "فلسفي",
            Category::Religious => "ديني",
            Category::Sad => "حزين",
            Category::Sarcastic => "ساخر",
            Category::Inspiring => "ملهم",
            Category::Patriotic => "وطني",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Romantic => "💖",
            Category::Philosophical => "🤔",
            Category::Religious => "🙏",
            Category::Sad => "😢",
            Category::Sarcastic => "😄",
            Category::Inspiring => "✨",
            Category::Patriotic => "🇪🇬",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_through_their_labels() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("رياضي".parse::<Category>().is_err());
    }

    #[test]
    fn author_name_reads_embedded_profile() {
        let mut post = Post {
            id: "p".into(),
            user_id: "u".into(),
            content: "hello world".into(),
            category: None,
            image_url: None,
            likes_count: 0,
            comments_count: 0,
            views_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
            author: None,
        };
        assert_eq!(post.author_name(), None);
        post.author = Some(Author {
            id: "u".into(),
            full_name: Some("Test User".into()),
            avatar_url: None,
            is_owner: false,
        });
        assert_eq!(post.author_name(), Some("Test User"));
    }
}
