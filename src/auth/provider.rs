use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// The private identity behind a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub email_confirmed: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
    pub expires_at: String,
    /// Issued from a password-recovery link; only good for setting a new password.
    pub recovery: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SignUpMetadata {
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut { user_id: String },
    TokenRefreshed { user_id: String },
    UserUpdated(AuthUser),
    PasswordRecovery(AuthUser),
}

/// Errors carry the same human-readable messages a hosted auth service
/// would, so callers can match on them when picking what to show.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("User already registered")]
    UserAlreadyRegistered,

    #[error("Unable to validate email address: invalid format")]
    InvalidEmail,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("Email link is invalid or has expired")]
    InvalidCode,

    #[error("Auth session missing")]
    SessionMissing,

    #[error("Error sending email: {0}")]
    Mail(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// The live session behind a token, if any.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError>;

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;

    /// Push the session's expiry out by a full lifetime.
    async fn refresh_session(&self, access_token: &str) -> Result<Session, AuthError>;

    /// Trade a one-time code from an emailed link for a session.
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError>;

    /// Email a recovery link pointing at `redirect_url`. Unknown addresses
    /// succeed without sending anything.
    async fn request_password_reset(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<(), AuthError>;

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), AuthError>;

    /// Members holding at least one live, non-recovery session.
    async fn count_active_users(&self) -> Result<usize, AuthError>;

    /// Auth state change notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
