use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;

use crate::auth::callback::{self, CallbackState};
use crate::auth::provider::SignUpMetadata;
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::db::models::ProfileSeed;
use crate::error::AppResult;
use crate::extractors::cookie_value;
use crate::flash::{self, Flash, IncomingFlash};
use crate::messages;
use crate::routes::views::{render, Layout};
use crate::state::AppState;
use crate::validation::{is_valid_email, ValidationError, MIN_PASSWORD_CHARS};

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub full_name: String,
    pub email: String,
    pub errors: RegisterErrors,
}

#[derive(Template)]
#[template(path = "pages/callback.html")]
pub struct CallbackTemplate {
    pub layout: Layout,
    pub message: String,
}

#[derive(Template)]
#[template(path = "pages/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub layout: Layout,
    pub has_session: bool,
    pub error: Option<String>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    pub terms: Option<String>,
}

#[derive(Deserialize)]
pub struct NewPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct CodeQuery {
    pub code: Option<String>,
}

/// Per-field messages for the registration form.
#[derive(Debug, Default, PartialEq)]
pub struct RegisterErrors {
    pub full_name: Option<&'static str>,
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
    pub confirm_password: Option<&'static str>,
    pub terms: Option<&'static str>,
    pub general: Option<&'static str>,
}

impl RegisterErrors {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RegisterForm {
    pub fn validate(&self) -> RegisterErrors {
        let msg = |e: ValidationError| Some(e.message());
        let mut errors = RegisterErrors::default();

        if self.full_name.trim().is_empty() {
            errors.full_name = msg(ValidationError::FullNameRequired);
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.email = msg(ValidationError::EmailRequired);
        } else if !is_valid_email(email) {
            errors.email = msg(ValidationError::EmailInvalid);
        }

        if self.password.is_empty() {
            errors.password = msg(ValidationError::PasswordRequired);
        } else if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.password = msg(ValidationError::PasswordTooShort);
        }

        if self.confirm_password.is_empty() {
            errors.confirm_password = Some("تأكيد كلمة المرور مطلوب");
        } else if self.password != self.confirm_password {
            errors.confirm_password = msg(ValidationError::PasswordMismatch);
        }

        if self.terms.is_none() {
            errors.terms = msg(ValidationError::TermsNotAccepted);
        }
        errors
    }
}

fn login_page_with(flash: &IncomingFlash, email: String, error: Option<&str>) -> Response {
    render(
        flash,
        LoginTemplate {
            layout: Layout::guest("تسجيل الدخول", flash),
            email,
            error: error.map(str::to_string),
        },
    )
}

fn with_session_cookie(state: &AppState, token: &str, to: &str) -> Response {
    (
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(
                &state.config.auth.cookie_name,
                token,
                state.config.auth.session_hours,
            ),
        )]),
        Redirect::to(to),
    )
        .into_response()
}

// -- Login --

/// GET /auth/login
pub async fn login_page(flash: IncomingFlash) -> Response {
    login_page_with(&flash, String::new(), None)
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let email = form.email.trim().to_string();
    if email.is_empty() {
        return Ok(login_page_with(
            &flash,
            email,
            Some(ValidationError::EmailRequired.message()),
        ));
    }
    if form.password.is_empty() {
        return Ok(login_page_with(
            &flash,
            email,
            Some(ValidationError::PasswordRequired.message()),
        ));
    }

    let session = match state.auth.sign_in(&email, &form.password).await {
        Ok(session) => session,
        Err(e) => {
            tracing::info!("Sign-in rejected: {}", e);
            return Ok(login_page_with(
                &flash,
                email,
                Some(messages::login_error(&e.to_string())),
            ));
        }
    };

    let completed = state
        .repo
        .get_profile(&session.user.id)
        .await?
        .is_some_and(|p| p.profile_completed);
    let to = if completed { "/" } else { "/complete-account" };

    Ok(with_session_cookie(&state, &session.access_token, to))
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let email = form.email.trim().to_string();
    if email.is_empty() {
        return login_page_with(&flash, email, Some(messages::EMAIL_REQUIRED_FOR_RESET));
    }

    let redirect_url = format!(
        "{}/auth/reset-password",
        state.config.auth.site_url.trim_end_matches('/')
    );
    match state.auth.request_password_reset(&email, &redirect_url).await {
        Ok(()) => flash::redirect("/auth/login", Flash::success(messages::RESET_LINK_SENT)),
        Err(e) => {
            tracing::error!("Password reset request failed: {}", e);
            login_page_with(&flash, email, Some(messages::RESET_LINK_FAILED))
        }
    }
}

// -- Registration --

/// GET /auth/register
pub async fn register_page(flash: IncomingFlash) -> Response {
    render(
        &flash,
        RegisterTemplate {
            layout: Layout::guest("إنشاء حساب", &flash),
            full_name: String::new(),
            email: String::new(),
            errors: RegisterErrors::default(),
        },
    )
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Form(form): Form<RegisterForm>,
) -> Response {
    let rerender = |errors: RegisterErrors| {
        render(
            &flash,
            RegisterTemplate {
                layout: Layout::guest("إنشاء حساب", &flash),
                full_name: form.full_name.clone(),
                email: form.email.clone(),
                errors,
            },
        )
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return rerender(errors);
    }

    let full_name = form.full_name.trim().to_string();
    let metadata = SignUpMetadata {
        full_name: Some(full_name.clone()),
    };
    let user = match state.auth.sign_up(&form.email, &form.password, metadata).await {
        Ok(user) => user,
        Err(e) => {
            tracing::info!("Sign-up rejected: {}", e);
            let message = messages::register_error(&e.to_string());
            let errors = if message == messages::ALREADY_REGISTERED {
                RegisterErrors {
                    email: Some(message),
                    ..Default::default()
                }
            } else {
                RegisterErrors {
                    general: Some(message),
                    ..Default::default()
                }
            };
            return rerender(errors);
        }
    };

    let seed = ProfileSeed {
        is_owner: state.config.auth.is_owner_email(&user.email),
        id: user.id,
        email: user.email,
        full_name: Some(full_name),
        avatar_url: None,
    };
    // The confirmation callback upserts the profile again
    if let Err(e) = state.repo.insert_profile(&seed).await {
        tracing::warn!(user_id = %seed.id, "Profile insert after sign-up failed: {}", e);
    }

    flash::redirect("/auth/login", Flash::success(messages::REGISTERED))
}

// -- Sign out --

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = cookie_value(&headers, cookie_name) {
        if let Err(e) = state.auth.sign_out(token).await {
            tracing::error!("Sign-out failed: {}", e);
        }
    }

    let flash = Flash::success(messages::SIGNED_OUT);
    (
        AppendHeaders([
            (header::SET_COOKIE, clear_session_cookie(cookie_name)),
            (header::SET_COOKIE, flash.cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}

// -- Email link callback --

/// GET /auth/callback
pub async fn callback(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Query(query): Query<CodeQuery>,
) -> Response {
    let outcome = callback::complete(
        state.auth.as_ref(),
        state.repo.as_ref(),
        &state.config.auth,
        query.code.as_deref(),
    )
    .await;

    match outcome {
        CallbackState::DoneRedirect { session, to } => {
            let mut response = with_session_cookie(&state, &session.access_token, to);
            if !session.recovery {
                if let Ok(value) = Flash::success(messages::CALLBACK_CONFIRMED).cookie().parse() {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
            response
        }
        CallbackState::Failed { message } => render(
            &flash,
            CallbackTemplate {
                layout: Layout::guest("تفعيل الحساب", &flash),
                message: message.to_string(),
            },
        ),
        pending => {
            tracing::error!(?pending, "Callback stopped before settling");
            render(
                &flash,
                CallbackTemplate {
                    layout: Layout::guest("تفعيل الحساب", &flash),
                    message: messages::CALLBACK_FAILED.to_string(),
                },
            )
        }
    }
}

/// GET /auth/callback/exchange: the callback as JSON for script clients.
pub async fn callback_exchange(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> Response {
    let outcome = callback::complete(
        state.auth.as_ref(),
        state.repo.as_ref(),
        &state.config.auth,
        query.code.as_deref(),
    )
    .await;

    match outcome {
        CallbackState::DoneRedirect { session, to } => {
            let cookie = session_cookie(
                &state.config.auth.cookie_name,
                &session.access_token,
                state.config.auth.session_hours,
            );
            (
                AppendHeaders([(header::SET_COOKIE, cookie)]),
                Json(serde_json::json!({
                    "success": true,
                    "message": "تم تفعيل الحساب بنجاح",
                    "redirect": to,
                    "user": { "id": session.user.id, "email": session.user.email },
                })),
            )
                .into_response()
        }
        CallbackState::Failed { message } => {
            let status = if message == messages::CALLBACK_MISSING_CODE {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(serde_json::json!({ "error": true, "message": message })),
            )
                .into_response()
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": true, "message": messages::GENERIC_ERROR })),
        )
            .into_response(),
    }
}

// -- Password reset --

fn reset_page(flash: &IncomingFlash, has_session: bool, error: Option<&str>) -> Response {
    render(
        flash,
        ResetPasswordTemplate {
            layout: Layout::guest("إعادة تعيين كلمة المرور", flash),
            has_session,
            error: error.map(str::to_string),
        },
    )
}

/// GET /auth/reset-password
///
/// Recovery links point here with `?code=`; the code is traded for a
/// recovery session first.
pub async fn reset_password_page(
    State(state): State<AppState>,
    flash: IncomingFlash,
    headers: HeaderMap,
    Query(query): Query<CodeQuery>,
) -> AppResult<Response> {
    if let Some(code) = query.code.as_deref().filter(|c| !c.trim().is_empty()) {
        return Ok(match state.auth.exchange_code_for_session(code).await {
            Ok(session) => with_session_cookie(&state, &session.access_token, "/auth/reset-password"),
            Err(e) => {
                tracing::info!("Recovery code rejected: {}", e);
                reset_page(&flash, false, Some(messages::callback_error(&e.to_string())))
            }
        });
    }

    let has_session = match cookie_value(&headers, &state.config.auth.cookie_name) {
        Some(token) => state.auth.get_session(token).await?.is_some(),
        None => false,
    };
    Ok(reset_page(&flash, has_session, None))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    flash: IncomingFlash,
    headers: HeaderMap,
    Form(form): Form<NewPasswordForm>,
) -> Response {
    let Some(token) = cookie_value(&headers, &state.config.auth.cookie_name) else {
        return reset_page(&flash, false, Some(messages::CALLBACK_INVALID_LINK));
    };

    let invalid = if form.password.is_empty() {
        Some(ValidationError::PasswordRequired)
    } else if form.password.chars().count() < MIN_PASSWORD_CHARS {
        Some(ValidationError::PasswordTooShort)
    } else if form.password != form.confirm_password {
        Some(ValidationError::PasswordMismatch)
    } else {
        None
    };
    if let Some(e) = invalid {
        return reset_page(&flash, true, Some(e.message()));
    }

    match state.auth.update_password(token, &form.password).await {
        Ok(()) => flash::redirect("/", Flash::success(messages::PASSWORD_UPDATED)),
        Err(e) => {
            tracing::warn!("Password update failed: {}", e);
            reset_page(&flash, true, Some(messages::password_error(&e.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(full_name: &str, email: &str, password: &str, confirm: &str, terms: bool) -> RegisterForm {
        RegisterForm {
            full_name: full_name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
            terms: terms.then(|| "on".to_string()),
        }
    }

    #[test]
    fn valid_registration_has_no_errors() {
        assert!(form("Test User", "t@example.com", "secret1", "secret1", true)
            .validate()
            .is_empty());
    }

    #[test]
    fn every_field_is_checked() {
        let errors = form(" ", "nope", "123", "456", false).validate();
        assert_eq!(errors.full_name, Some("الاسم الكامل مطلوب"));
        assert_eq!(errors.email, Some("البريد الإلكتروني غير صحيح"));
        assert_eq!(
            errors.password,
            Some(ValidationError::PasswordTooShort.message())
        );
        assert_eq!(
            errors.confirm_password,
            Some(ValidationError::PasswordMismatch.message())
        );
        assert!(errors.terms.is_some());
        assert!(errors.general.is_none());
    }

    #[test]
    fn missing_values_use_required_messages() {
        let errors = form("A", "", "", "", true).validate();
        assert_eq!(errors.email, Some(ValidationError::EmailRequired.message()));
        assert_eq!(
            errors.password,
            Some(ValidationError::PasswordRequired.message())
        );
        assert_eq!(errors.confirm_password, Some("تأكيد كلمة المرور مطلوب"));
    }
}
