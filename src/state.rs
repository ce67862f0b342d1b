use std::sync::Arc;
use crate::config::Config;
use crate::error::Result;
use crate::services::{auth, profile::ProfileSchema, session::SessionManager};
use crate::store::Store;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The key/value store.
    pub store: Store,
    /// The application's configuration.
    pub config: Config,
    /// Issues and checks session tokens.
    pub sessions: SessionManager,
    /// The profile field schema.
    pub schema: Arc<ProfileSchema>,
}

impl AppState {
    /// Creates a new `AppState`, connecting to the configured store.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = Store::connect(config.redis_url.as_deref()).await?;
        Self::with_store(config, store).await
    }

    /// Creates a new `AppState` on top of an existing store.
    pub async fn with_store(config: &Config, store: Store) -> Result<Self> {
        let sessions = SessionManager::new(config, store.clone())?;
        tracing::info!("✅ Session manager initialized");

        auth::seed_demo_account(&store, config).await?;

        Ok(AppState {
            store,
            config: config.clone(),
            sessions,
            schema: Arc::new(ProfileSchema::standard()),
        })
    }
}
