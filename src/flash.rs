//! One-shot notifications carried across a redirect in a cookie.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use std::convert::Infallible;

use crate::extractors::cookie_value;

pub const FLASH_COOKIE: &str = "khateraty_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }

    fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("k", self.kind.as_str())
            .append_pair("m", &self.message)
            .finish()
    }

    fn decode(raw: &str) -> Option<Self> {
        let mut kind = None;
        let mut message = None;
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "k" if value == "success" => kind = Some(FlashKind::Success),
                "k" if value == "error" => kind = Some(FlashKind::Error),
                "m" => message = Some(value.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            kind: kind?,
            message: message.filter(|m| !m.is_empty())?,
        })
    }

    pub fn cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=60",
            FLASH_COOKIE,
            self.encode()
        )
    }
}

pub fn clear_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", FLASH_COOKIE)
}

/// Redirect to `to`, showing `flash` on the page that loads next.
pub fn redirect(to: &str, flash: Flash) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, flash.cookie())]),
        Redirect::to(to),
    )
        .into_response()
}

/// The notification left by the previous response, if any.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

impl IncomingFlash {
    /// Attach the cookie removal to `response` when a flash was shown.
    pub fn consume(&self, mut response: Response) -> Response {
        if self.0.is_some() {
            if let Ok(value) = clear_cookie().parse() {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(
            cookie_value(&parts.headers, FLASH_COOKIE).and_then(Flash::decode),
        ))
    }
}
