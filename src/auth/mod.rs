pub mod callback;
pub mod events;
pub mod guard;
pub mod handlers;
pub mod local;
pub mod mailer;
pub mod provider;
pub mod session;

pub use events::{spawn_listener, AuthState};
pub use local::LocalAuthProvider;
pub use mailer::{LogMailer, Mailer, MemoryMailer};
pub use provider::{AuthError, AuthEvent, AuthProvider, AuthUser, Session, SignUpMetadata};
