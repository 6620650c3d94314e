//! Email-link callback.
//!
//! A confirmation or recovery link lands on `/auth/callback?code=...`. The
//! code is traded for a session, the profile row is brought up to date, and
//! the visitor is sent on to wherever their account state says they belong.

use crate::auth::provider::{AuthProvider, Session};
use crate::config::AuthConfig;
use crate::db::models::ProfileSeed;
use crate::db::Repository;
use crate::messages;

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackState {
    AwaitingCode,
    Exchanging { code: String },
    FetchingProfile { session: Session },
    DoneRedirect { session: Session, to: &'static str },
    Failed { message: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackEvent {
    CodeReceived(String),
    CodeMissing,
    Exchanged(Session),
    ExchangeFailed(String),
    ProfileLoaded { completed: bool },
    ProfileFailed(String),
}

impl CallbackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::DoneRedirect { .. } | Self::Failed { .. })
    }
}

pub fn transition(state: CallbackState, event: CallbackEvent) -> CallbackState {
    use CallbackEvent as E;
    use CallbackState as S;

    match (state, event) {
        (S::AwaitingCode, E::CodeReceived(code)) => S::Exchanging { code },
        (S::AwaitingCode, E::CodeMissing) => S::Failed {
            message: messages::CALLBACK_MISSING_CODE,
        },
        (S::Exchanging { .. }, E::Exchanged(session)) if session.recovery => S::DoneRedirect {
            session,
            to: "/auth/reset-password",
        },
        (S::Exchanging { .. }, E::Exchanged(session)) => S::FetchingProfile { session },
        (S::Exchanging { .. }, E::ExchangeFailed(raw)) => S::Failed {
            message: messages::callback_error(&raw),
        },
        (S::FetchingProfile { session }, E::ProfileLoaded { completed }) => S::DoneRedirect {
            session,
            to: if completed { "/" } else { "/complete-account" },
        },
        (S::FetchingProfile { .. }, E::ProfileFailed(_)) => S::Failed {
            message: messages::CALLBACK_FAILED,
        },
        (state, event) => {
            tracing::warn!(?state, ?event, "Unexpected callback event");
            S::Failed {
                message: messages::CALLBACK_FAILED,
            }
        }
    }
}

/// Run the callback for `code` until it settles.
pub async fn complete(
    auth: &dyn AuthProvider,
    repo: &dyn Repository,
    config: &AuthConfig,
    code: Option<&str>,
) -> CallbackState {
    let first = match code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => CallbackEvent::CodeReceived(code.to_string()),
        None => CallbackEvent::CodeMissing,
    };
    let mut state = transition(CallbackState::AwaitingCode, first);

    while !state.is_terminal() {
        let event = match &state {
            CallbackState::Exchanging { code } => {
                match auth.exchange_code_for_session(code).await {
                    Ok(session) => CallbackEvent::Exchanged(session),
                    Err(e) => {
                        tracing::warn!("Code exchange failed: {}", e);
                        CallbackEvent::ExchangeFailed(e.to_string())
                    }
                }
            }
            CallbackState::FetchingProfile { session } => {
                load_profile(repo, config, session).await
            }
            _ => break,
        };
        state = transition(state, event);
    }
    state
}

async fn load_profile(
    repo: &dyn Repository,
    config: &AuthConfig,
    session: &Session,
) -> CallbackEvent {
    let user = &session.user;
    let seed = ProfileSeed {
        id: user.id.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        avatar_url: None,
        is_owner: config.is_owner_email(&user.email),
    };
    if let Err(e) = repo.upsert_profile(&seed).await {
        tracing::error!(user_id = %user.id, "Profile upsert failed: {}", e);
    }

    match repo.get_profile(&user.id).await {
        Ok(Some(profile)) => CallbackEvent::ProfileLoaded {
            completed: profile.profile_completed,
        },
        Ok(None) => CallbackEvent::ProfileFailed(format!("no profile for {}", user.id)),
        Err(e) => {
            tracing::error!(user_id = %user.id, "Profile fetch failed: {}", e);
            CallbackEvent::ProfileFailed(e.to_string())
        }
    }
}
