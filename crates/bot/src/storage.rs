//! User/email storage backends.
//!
//! One capability trait, two implementations: an in-process map for
//! single-instance deployments and a Redis-backed store for anything that
//! must survive a restart. The backend is chosen once at startup from the
//! config file.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use crate::config::RedisConfig;

/// Maps a chat-user identifier to a registered email address.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl DataStore for Box<dyn DataStore> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
}

/// Ephemeral store, gone when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Redis-backed store.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Opens a client for the configured Redis instance. Connections are
    /// established lazily per operation.
    pub fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url())?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DataStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}
