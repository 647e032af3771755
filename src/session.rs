//! Per-invocation store handles.
//!
//! A [`Session`] opens the document store once, after configuration has been
//! validated, and releases it explicitly with [`Session::close`]. Commands
//! receive the session instead of reaching for process-wide clients.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::pipeline::Pipeline;
use crate::relay;
use crate::store::sqlite::SqliteStore;

pub struct Session {
    config: Config,
    store: Arc<SqliteStore>,
}

impl Session {
    /// Connect to the document store and make sure its schema exists.
    ///
    /// Fails with [`crate::error::ConfigError::Missing`] when no store URL is
    /// configured.
    pub async fn open(config: Config) -> Result<Self> {
        let url = config.store_url()?.to_string();
        let pool = db::connect(&url).await?;
        migrate::run_migrations(&pool).await?;
        debug!(store = %url, "session opened");
        Ok(Self {
            config,
            store: Arc::new(SqliteStore::new(pool)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<SqliteStore> {
        Arc::clone(&self.store)
    }

    /// Build the orchestrator over this session's store.
    ///
    /// Requires the LLM API key unless the provider is disabled.
    pub fn pipeline(&self) -> Result<Pipeline> {
        self.config.require_api_key()?;
        let client = relay::create_client(&self.config.llm)?;
        Ok(Pipeline::new(
            self.store(),
            client,
            Duration::from_secs(self.config.llm.timeout_secs),
            Duration::from_secs(self.config.store.timeout_secs),
        ))
    }

    pub async fn close(self) {
        self.store.close().await;
        debug!("session closed");
    }
}
