use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::error::AppError;
use crate::state::AppState;

pub const VIEWER_COOKIE: &str = "khateraty_viewer";

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

/// The signed-in visitor, with the profile fields pages care about.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_owner: bool,
    pub profile_completed: bool,
    pub access_token: String,
}

impl CurrentUser {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

/// Extractor that requires authentication.
/// Returns 401 if no valid session found.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, &state.config.auth.cookie_name)
            .ok_or(AppError::Unauthorized)?;

        let user = state
            .auth
            .get_user(token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let profile = state.repo.get_profile(&user.id).await?;

        let is_owner = profile.as_ref().is_some_and(|p| p.is_owner)
            || state.config.auth.is_owner_email(&user.email);
        Ok(CurrentUser {
            full_name: profile
                .as_ref()
                .and_then(|p| p.full_name.clone())
                .or(user.full_name),
            avatar_url: profile.as_ref().and_then(|p| p.avatar_url.clone()),
            profile_completed: profile.is_some_and(|p| p.profile_completed),
            is_owner,
            id: user.id,
            email: user.email,
            access_token: token.to_string(),
        })
    }
}

/// Optional user extractor: None instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// Identifies a visitor for view counting. Anonymous visitors get a random
/// id that the handler should persist with [`ViewerId::cookie`].
#[derive(Debug, Clone)]
pub struct ViewerId {
    pub id: String,
    pub fresh: bool,
}

impl ViewerId {
    pub fn cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            VIEWER_COOKIE,
            self.id,
            365 * 24 * 3600
        )
    }
}

impl FromRequestParts<AppState> for ViewerId {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let MaybeUser(Some(user)) = MaybeUser::from_request_parts(parts, state).await? {
            return Ok(ViewerId {
                id: user.id,
                fresh: false,
            });
        }
        Ok(match cookie_value(&parts.headers, VIEWER_COOKIE) {
            Some(id) => ViewerId {
                id: id.to_string(),
                fresh: false,
            },
            None => ViewerId {
                id: uuid::Uuid::now_v7().to_string(),
                fresh: true,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_named_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("a=1; khateraty_session=tok; b=2"),
        );
        headers.append(header::COOKIE, HeaderValue::from_static("c=3"));

        assert_eq!(cookie_value(&headers, "khateraty_session"), Some("tok"));
        assert_eq!(cookie_value(&headers, "c"), Some("3"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("khateraty_session="));
        assert_eq!(cookie_value(&headers, "khateraty_session"), None);
    }
}
