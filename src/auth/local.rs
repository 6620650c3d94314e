use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tokio::sync::broadcast;

use crate::auth::mailer::{MailMessage, Mailer};
use crate::auth::provider::{AuthError, AuthEvent, AuthProvider, AuthUser, Session, SignUpMetadata};
use crate::auth::session::generate_token;
use crate::config::AuthConfig;
use crate::state::DbPool;
use crate::validation::{is_valid_email, MIN_PASSWORD_CHARS};

const SIGNUP: &str = "signup";
const RECOVERY: &str = "recovery";

/// Hashed in place of a real password when the email is unknown, so a miss
/// costs the same bcrypt work as a hit.
const DUMMY_PASSWORD: &str = "khateraty-no-such-user";

/// Auth backed by the `auth_*` tables of the application database.
pub struct LocalAuthProvider {
    pool: DbPool,
    mailer: Arc<dyn Mailer>,
    events: broadcast::Sender<AuthEvent>,
    session_hours: u64,
    code_hours: u64,
    site_url: String,
    hash_cost: u32,
    dummy_hash: String,
}

impl LocalAuthProvider {
    pub fn new(pool: DbPool, mailer: Arc<dyn Mailer>, config: &AuthConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            pool,
            mailer,
            events,
            session_hours: config.session_hours,
            code_hours: config.confirmation_hours,
            site_url: config.site_url.trim_end_matches('/').to_string(),
            hash_cost: config.hash_cost,
            dummy_hash: bcrypt::hash(DUMMY_PASSWORD, config.hash_cost).unwrap_or_default(),
        }
    }

    fn emit(&self, event: AuthEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuthUser> {
    let confirmed_at: Option<String> = row.get(3)?;
    Ok(AuthUser {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        email_confirmed: confirmed_at.is_some(),
        created_at: row.get(4)?,
    })
}

fn user_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<(AuthUser, String)>, AuthError> {
    let found = conn
        .query_row(
            "SELECT id, email, full_name, email_confirmed_at, created_at, password_hash
             FROM auth_users WHERE email = ?1",
            params![email],
            |row| Ok((user_from_row(row)?, row.get(5)?)),
        )
        .optional()?;
    Ok(found)
}

fn session_by_token(conn: &Connection, token: &str) -> Result<Option<Session>, AuthError> {
    let session = conn
        .query_row(
            "SELECT u.id, u.email, u.full_name, u.email_confirmed_at, u.created_at,
                    s.token, s.expires_at, s.recovery
             FROM auth_sessions s JOIN auth_users u ON u.id = s.user_id
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(Session {
                    user: user_from_row(row)?,
                    access_token: row.get(5)?,
                    expires_at: row.get(6)?,
                    recovery: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(session)
}

fn insert_session(
    conn: &Connection,
    user_id: &str,
    recovery: bool,
    hours: u64,
) -> Result<String, AuthError> {
    let token = generate_token();
    conn.execute(
        "INSERT INTO auth_sessions (token, user_id, recovery, expires_at)
         VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![token, user_id, recovery, format!("+{} hours", hours)],
    )?;
    Ok(token)
}

fn insert_code(
    conn: &Connection,
    user_id: &str,
    kind: &str,
    hours: u64,
) -> Result<String, AuthError> {
    let code = generate_token();
    conn.execute(
        "INSERT INTO auth_codes (code, user_id, kind, expires_at)
         VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![code, user_id, kind, format!("+{} hours", hours)],
    )?;
    Ok(code)
}

fn with_code(url: &str, code: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}code={code}")
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::WeakPassword);
        }

        let conn = self.pool.get()?;
        if user_by_email(&conn, &email)?.is_some() {
            return Err(AuthError::UserAlreadyRegistered);
        }

        let password_hash = bcrypt::hash(password, self.hash_cost)?;
        let id = uuid::Uuid::now_v7().to_string();
        let full_name = metadata
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        conn.execute(
            "INSERT INTO auth_users (id, email, password_hash, full_name) VALUES (?1, ?2, ?3, ?4)",
            params![id, email, password_hash, full_name],
        )?;
        let code = insert_code(&conn, &id, SIGNUP, self.code_hours)?;

        let (user, _) = user_by_email(&conn, &email)?
            .ok_or(AuthError::InvalidCredentials)?;
        drop(conn);

        self.mailer
            .send(MailMessage {
                to: email.clone(),
                subject: "تأكيد حسابك".to_string(),
                link: with_code(&format!("{}/auth/callback", self.site_url), &code),
            })
            .await
            .map_err(AuthError::Mail)?;

        tracing::info!(user_id = %user.id, "User signed up");
        self.emit(AuthEvent::UserUpdated(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let conn = self.pool.get()?;

        let found = user_by_email(&conn, &email)?;
        let password_hash = match &found {
            Some((_, hash)) => hash.as_str(),
            None => self.dummy_hash.as_str(),
        };
        let verified = bcrypt::verify(password, password_hash).unwrap_or(false);
        let Some((user, _)) = found.filter(|_| verified) else {
            return Err(AuthError::InvalidCredentials);
        };
        if !user.email_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        let token = insert_session(&conn, &user.id, false, self.session_hours)?;
        let session = session_by_token(&conn, &token)?.ok_or(AuthError::SessionMissing)?;

        self.emit(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let conn = self.pool.get()?;
        let user_id: Option<String> = conn
            .query_row(
                "SELECT user_id FROM auth_sessions WHERE token = ?1",
                params![access_token],
                |row| row.get(0),
            )
            .optional()?;
        conn.execute(
            "DELETE FROM auth_sessions WHERE token = ?1",
            params![access_token],
        )?;

        if let Some(user_id) = user_id {
            self.emit(AuthEvent::SignedOut { user_id });
        }
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        let conn = self.pool.get()?;
        session_by_token(&conn, access_token)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(self
            .get_session(access_token)
            .await?
            .filter(|s| !s.recovery)
            .map(|s| s.user))
    }

    async fn refresh_session(&self, access_token: &str) -> Result<Session, AuthError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE auth_sessions SET expires_at = datetime('now', ?2)
             WHERE token = ?1 AND expires_at > datetime('now')",
            params![access_token, format!("+{} hours", self.session_hours)],
        )?;
        if rows == 0 {
            return Err(AuthError::SessionMissing);
        }
        let session =
            session_by_token(&conn, access_token)?.ok_or(AuthError::SessionMissing)?;

        self.emit(AuthEvent::TokenRefreshed {
            user_id: session.user.id.clone(),
        });
        Ok(session)
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (user_id, kind): (String, String) = tx
            .query_row(
                "SELECT user_id, kind FROM auth_codes
                 WHERE code = ?1 AND used_at IS NULL AND expires_at > datetime('now')",
                params![code.trim()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or(AuthError::InvalidCode)?;

        tx.execute(
            "UPDATE auth_codes SET used_at = datetime('now') WHERE code = ?1",
            params![code.trim()],
        )?;
        // Following either kind of link proves the address belongs to the user
        tx.execute(
            "UPDATE auth_users SET email_confirmed_at = COALESCE(email_confirmed_at, datetime('now')),
               updated_at = datetime('now')
             WHERE id = ?1",
            params![user_id],
        )?;

        let recovery = kind == RECOVERY;
        let token = insert_session(&tx, &user_id, recovery, self.session_hours)?;
        let session = session_by_token(&tx, &token)?.ok_or(AuthError::SessionMissing)?;
        tx.commit()?;

        if recovery {
            self.emit(AuthEvent::PasswordRecovery(session.user.clone()));
        } else {
            tracing::info!(user_id = %session.user.id, "Email confirmed");
            self.emit(AuthEvent::SignedIn(session.user.clone()));
        }
        Ok(session)
    }

    async fn request_password_reset(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let conn = self.pool.get()?;
        let Some((user, _)) = user_by_email(&conn, &email)? else {
            tracing::debug!("Password reset requested for unknown address");
            return Ok(());
        };
        let code = insert_code(&conn, &user.id, RECOVERY, self.code_hours)?;
        drop(conn);

        self.mailer
            .send(MailMessage {
                to: user.email,
                subject: "إعادة تعيين كلمة المرور".to_string(),
                link: with_code(redirect_url, &code),
            })
            .await
            .map_err(AuthError::Mail)
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::WeakPassword);
        }
        let conn = self.pool.get()?;
        let session = session_by_token(&conn, access_token)?.ok_or(AuthError::SessionMissing)?;

        let password_hash = bcrypt::hash(password, self.hash_cost)?;
        conn.execute(
            "UPDATE auth_users SET password_hash = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![session.user.id, password_hash],
        )?;
        // A recovery session becomes an ordinary one once the password is set
        conn.execute(
            "UPDATE auth_sessions SET recovery = 0 WHERE token = ?1",
            params![access_token],
        )?;

        self.emit(AuthEvent::UserUpdated(session.user));
        Ok(())
    }

    async fn count_active_users(&self) -> Result<usize, AuthError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM auth_sessions
             WHERE expires_at > datetime('now') AND recovery = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::mailer::MemoryMailer;

    fn provider() -> (tempfile::TempDir, LocalAuthProvider, Arc<MemoryMailer>) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = crate::db::open(&tmp.path().join("auth.db")).unwrap();
        let mailer = Arc::new(MemoryMailer::new());
        let config = AuthConfig {
            hash_cost: 4,
            ..AuthConfig::default()
        };
        let provider = LocalAuthProvider::new(pool, mailer.clone(), &config);
        (tmp, provider, mailer)
    }

    fn code_from(link: &str) -> String {
        link.rsplit_once("code=").unwrap().1.to_string()
    }

    #[tokio::test]
    async fn sign_up_requires_confirmation_before_sign_in() {
        let (_tmp, auth, mailer) = provider();
        let user = auth
            .sign_up(
                "T@Example.com",
                "secret1",
                SignUpMetadata {
                    full_name: Some("Test User".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(user.email, "t@example.com");
        assert!(!user.email_confirmed);

        let err = auth.sign_in("t@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "Email not confirmed");

        let link = mailer.last_link_for("t@example.com").await.unwrap();
        assert!(link.starts_with("http://localhost:3000/auth/callback?code="));
        let session = auth.exchange_code_for_session(&code_from(&link)).await.unwrap();
        assert!(session.user.email_confirmed);
        assert!(!session.recovery);

        let session = auth.sign_in("t@example.com", "secret1").await.unwrap();
        assert_eq!(session.user.full_name.as_deref(), Some("Test User"));
    }

    #[tokio::test]
    async fn codes_are_single_use() {
        let (_tmp, auth, mailer) = provider();
        auth.sign_up("a@b.co", "secret1", SignUpMetadata::default())
            .await
            .unwrap();
        let code = code_from(&mailer.last_link_for("a@b.co").await.unwrap());

        auth.exchange_code_for_session(&code).await.unwrap();
        let err = auth.exchange_code_for_session(&code).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode));
    }

    #[tokio::test]
    async fn duplicate_and_weak_sign_ups_are_rejected() {
        let (_tmp, auth, _mailer) = provider();
        auth.sign_up("a@b.co", "secret1", SignUpMetadata::default())
            .await
            .unwrap();

        let dup = auth
            .sign_up("A@B.co", "secret1", SignUpMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(dup.to_string(), "User already registered");

        let weak = auth
            .sign_up("c@b.co", "12345", SignUpMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(weak, AuthError::WeakPassword));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let (_tmp, auth, _mailer) = provider();
        let err = auth.sign_in("nobody@b.co", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn unknown_emails_are_checked_against_a_real_hash() {
        let (_tmp, auth, _mailer) = provider();
        // Same cost as stored passwords, and never matches
        assert!(auth.dummy_hash.starts_with("$2b$04$"));
        assert_eq!(bcrypt::verify("secret1", &auth.dummy_hash).ok(), Some(false));
        assert_eq!(bcrypt::verify(DUMMY_PASSWORD, &auth.dummy_hash).ok(), Some(true));
    }

    #[tokio::test]
    async fn active_users_count_live_sessions_once() {
        let (_tmp, auth, mailer) = provider();
        for email in ["a@b.co", "c@b.co"] {
            auth.sign_up(email, "secret1", SignUpMetadata::default())
                .await
                .unwrap();
            let code = code_from(&mailer.last_link_for(email).await.unwrap());
            auth.exchange_code_for_session(&code).await.unwrap();
        }
        // A second device for the same member
        let second = auth.sign_in("a@b.co", "secret1").await.unwrap();
        assert_eq!(auth.count_active_users().await.unwrap(), 2);

        auth.sign_out(&second.access_token).await.unwrap();
        assert_eq!(auth.count_active_users().await.unwrap(), 2);

        let conn = auth.pool.get().unwrap();
        conn.execute(
            "UPDATE auth_sessions SET expires_at = datetime('now', '-1 hours')
             WHERE user_id = (SELECT id FROM auth_users WHERE email = 'c@b.co')",
            [],
        )
        .unwrap();
        assert_eq!(auth.count_active_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recovery_sessions_are_not_active_members() {
        let (_tmp, auth, mailer) = provider();
        auth.sign_up("a@b.co", "secret1", SignUpMetadata::default())
            .await
            .unwrap();
        auth.request_password_reset("a@b.co", "http://localhost:3000/auth/reset-password")
            .await
            .unwrap();
        // The recovery link also confirms the address, but opens no ordinary session
        let link = mailer.last_link_for("a@b.co").await.unwrap();
        auth.exchange_code_for_session(&code_from(&link)).await.unwrap();
        assert_eq!(auth.count_active_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sign_out_ends_session_and_notifies() {
        let (_tmp, auth, mailer) = provider();
        auth.sign_up("a@b.co", "secret1", SignUpMetadata::default())
            .await
            .unwrap();
        let code = code_from(&mailer.last_link_for("a@b.co").await.unwrap());
        let session = auth.exchange_code_for_session(&code).await.unwrap();

        let mut events = auth.subscribe();
        auth.sign_out(&session.access_token).await.unwrap();

        assert!(auth.get_session(&session.access_token).await.unwrap().is_none());
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedOut {
                user_id: session.user.id
            }
        );
    }

    #[tokio::test]
    async fn password_recovery_flow() {
        let (_tmp, auth, mailer) = provider();
        auth.sign_up("a@b.co", "secret1", SignUpMetadata::default())
            .await
            .unwrap();
        let code = code_from(&mailer.last_link_for("a@b.co").await.unwrap());
        auth.exchange_code_for_session(&code).await.unwrap();

        auth.request_password_reset("a@b.co", "http://localhost:3000/auth/reset-password")
            .await
            .unwrap();
        auth.request_password_reset("ghost@b.co", "http://localhost:3000/auth/reset-password")
            .await
            .unwrap();
        assert_eq!(mailer.messages().await.len(), 2);

        let link = mailer.last_link_for("a@b.co").await.unwrap();
        let session = auth.exchange_code_for_session(&code_from(&link)).await.unwrap();
        assert!(session.recovery);
        assert!(auth.get_user(&session.access_token).await.unwrap().is_none());

        auth.update_password(&session.access_token, "newsecret")
            .await
            .unwrap();
        assert!(auth.get_user(&session.access_token).await.unwrap().is_some());
        assert!(auth.sign_in("a@b.co", "secret1").await.is_err());
        assert!(auth.sign_in("a@b.co", "newsecret").await.is_ok());
    }

    #[tokio::test]
    async fn refresh_extends_live_sessions_only() {
        let (_tmp, auth, _mailer) = provider();
        assert!(matches!(
            auth.refresh_session("nope").await,
            Err(AuthError::SessionMissing)
        ));
    }
}
