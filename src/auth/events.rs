use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::auth::provider::AuthEvent;

/// Auth activity seen by this process, as told by auth events.
///
/// Only the listener task spawned by [`spawn_listener`] writes to it;
/// everyone else holds a read handle through `AppState`. Who is signed in
/// right now lives in the session table, not here: sessions expire without
/// an event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuthState {
    pub sign_ins: u64,
    pub sign_outs: u64,
    pub refreshes: u64,
    pub recoveries: u64,
    pub updates: u64,
}

impl AuthState {
    pub fn apply(&mut self, event: &AuthEvent) {
        match event {
            AuthEvent::SignedIn(_) => self.sign_ins += 1,
            AuthEvent::SignedOut { .. } => self.sign_outs += 1,
            AuthEvent::TokenRefreshed { .. } => self.refreshes += 1,
            AuthEvent::UserUpdated(_) => self.updates += 1,
            AuthEvent::PasswordRecovery(_) => self.recoveries += 1,
        }
    }

    /// Events seen so far, then start counting afresh.
    pub fn take(&mut self) -> AuthState {
        std::mem::take(self)
    }
}

fn log_event(event: &AuthEvent) {
    match event {
        AuthEvent::SignedIn(user) => tracing::info!(user_id = %user.id, "Signed in"),
        AuthEvent::SignedOut { user_id } => tracing::info!(%user_id, "Signed out"),
        AuthEvent::TokenRefreshed { user_id } => tracing::debug!(%user_id, "Session refreshed"),
        AuthEvent::UserUpdated(user) => tracing::info!(user_id = %user.id, "User updated"),
        AuthEvent::PasswordRecovery(user) => {
            tracing::info!(user_id = %user.id, "Password recovery started")
        }
    }
}

/// Subscribe to auth events and fold each one into `state`.
pub fn spawn_listener(
    mut events: broadcast::Receiver<AuthEvent>,
    state: Arc<RwLock<AuthState>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    log_event(&event);
                    state.write().await.apply(&event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth listener fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::AuthUser;

    fn user(id: &str) -> AuthUser {
        AuthUser {
            id: id.into(),
            email: format!("{id}@example.com"),
            full_name: None,
            email_confirmed: true,
            created_at: "2024-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn events_are_tallied_by_kind() {
        let mut state = AuthState::default();
        state.apply(&AuthEvent::SignedIn(user("a")));
        state.apply(&AuthEvent::SignedIn(user("a")));
        state.apply(&AuthEvent::SignedOut {
            user_id: "a".into(),
        });
        state.apply(&AuthEvent::PasswordRecovery(user("b")));
        state.apply(&AuthEvent::UserUpdated(user("b")));
        state.apply(&AuthEvent::TokenRefreshed {
            user_id: "a".into(),
        });

        assert_eq!(
            state,
            AuthState {
                sign_ins: 2,
                sign_outs: 1,
                refreshes: 1,
                recoveries: 1,
                updates: 1,
            }
        );
    }

    #[test]
    fn take_resets_the_tally() {
        let mut state = AuthState::default();
        state.apply(&AuthEvent::SignedIn(user("a")));

        assert_eq!(state.take().sign_ins, 1);
        assert_eq!(state, AuthState::default());
    }

    #[tokio::test]
    async fn listener_applies_broadcast_events() {
        let (tx, rx) = broadcast::channel(8);
        let state = Arc::new(RwLock::new(AuthState::default()));
        let handle = spawn_listener(rx, state.clone());

        tx.send(AuthEvent::SignedIn(user("a"))).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(state.read().await.sign_ins, 1);
    }
}
