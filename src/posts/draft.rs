use crate::db::models::Category;
use crate::validation::ValidationError;

pub const MIN_CONTENT_CHARS: usize = 10;
pub const MAX_CONTENT_CHARS: usize = 500;

/// A composer submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub content: String,
    pub category: Option<Category>,
}

fn parse_category(raw: &str) -> Result<Option<Category>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ValidationError::UnknownCategory)
}

fn checked_content(raw: &str) -> Result<String, ValidationError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong);
    }
    Ok(content.to_string())
}

/// New post: trimmed content of 10 to 500 characters, optional category.
pub fn compose(content: &str, category: &str) -> Result<Draft, ValidationError> {
    let content = checked_content(content)?;
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(ValidationError::ContentTooShort);
    }
    Ok(Draft {
        content,
        category: parse_category(category)?,
    })
}

/// Edited post: content and a category are both required.
pub fn revise(content: &str, category: &str) -> Result<(String, Category), ValidationError> {
    let content = checked_content(content)?;
    let category = parse_category(category)?.ok_or(ValidationError::MissingCategory)?;
    Ok((content, category))
}
