//! Profile completion and editing rules.

use crate::db::models::{Post, ProfileUpdate};
use crate::validation::{is_valid_mobile, ValidationError};

const MIN_NAME_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub full_name: String,
    pub phone_number: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompletionErrors {
    pub full_name: Option<&'static str>,
    pub phone_number: Option<&'static str>,
}

fn check_name(full_name: &str) -> Result<String, ValidationError> {
    let name = full_name.trim();
    if name.is_empty() {
        Err(ValidationError::FullNameRequired)
    } else if name.chars().count() < MIN_NAME_CHARS {
        Err(ValidationError::FullNameTooShort)
    } else {
        Ok(name.to_string())
    }
}

/// Both fields are checked so the form can show every problem at once.
pub fn validate_completion(full_name: &str, phone: &str) -> Result<Completion, CompletionErrors> {
    let name = check_name(full_name);
    let phone = phone.trim();
    let phone = if phone.is_empty() {
        Err(ValidationError::PhoneRequired)
    } else if !is_valid_mobile(phone) {
        Err(ValidationError::PhoneInvalid)
    } else {
        Ok(phone.to_string())
    };

    match (name, phone) {
        (Ok(full_name), Ok(phone_number)) => Ok(Completion {
            full_name,
            phone_number,
        }),
        (name, phone) => Err(CompletionErrors {
            full_name: name.err().map(|e| e.message()),
            phone_number: phone.err().map(|e| e.message()),
        }),
    }
}

/// Profile page edit: a name is required, phone and bio may be blank.
pub fn validate_update(
    full_name: &str,
    phone: &str,
    bio: &str,
) -> Result<ProfileUpdate, ValidationError> {
    let full_name = check_name(full_name)?;
    let phone = phone.trim();
    if !phone.is_empty() && !is_valid_mobile(phone) {
        return Err(ValidationError::PhoneInvalid);
    }
    let bio = bio.trim();
    Ok(ProfileUpdate {
        full_name,
        phone_number: (!phone.is_empty()).then(|| phone.to_string()),
        bio: (!bio.is_empty()).then(|| bio.to_string()),
    })
}

/// Totals shown on the profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub posts: usize,
    pub likes: i64,
    pub comments: i64,
}

impl ProfileStats {
    pub fn from_posts(posts: &[Post]) -> Self {
        Self {
            posts: posts.len(),
            likes: posts.iter().map(|p| p.likes_count).sum(),
            comments: posts.iter().map(|p| p.comments_count).sum(),
        }
    }
}
