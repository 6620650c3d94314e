use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::RwLock;

use crate::auth::{AuthProvider, AuthState, LocalAuthProvider, Mailer};
use crate::config::Config;
use crate::db::{Repository, SqliteRepository};
use crate::storage::{LocalObjectStore, ObjectStore};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: Arc<dyn AuthProvider>,
    pub repo: Arc<dyn Repository>,
    pub store: Arc<dyn ObjectStore>,
    pub auth_state: Arc<RwLock<AuthState>>,
}

impl AppState {
    /// Wire the local auth, data and storage backends onto one database.
    pub fn new(config: Config, pool: DbPool, mailer: Arc<dyn Mailer>) -> Self {
        let auth = LocalAuthProvider::new(pool.clone(), mailer, &config.auth);
        let store = LocalObjectStore::new(config.storage_path(), config.storage.public_base.clone());
        Self {
            auth: Arc::new(auth),
            repo: Arc::new(SqliteRepository::new(pool)),
            store: Arc::new(store),
            auth_state: Arc::new(RwLock::new(AuthState::default())),
            config,
        }
    }
}
