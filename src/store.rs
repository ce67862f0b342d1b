use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// Version stamped on every persisted record.
pub const SCHEMA_VERSION: u32 = 1;

/// Fixed key identifiers for per-user records.
pub mod keys {
    use uuid::Uuid;

    pub fn auth_token(user_id: &Uuid) -> String {
        format!("authToken:{}", user_id)
    }

    pub fn user_data(user_id: &Uuid) -> String {
        format!("userData:{}", user_id)
    }

    pub fn session_data(user_id: &Uuid) -> String {
        format!("sessionData:{}", user_id)
    }

    pub fn profile_data(user_id: &Uuid) -> String {
        format!("profileData:{}", user_id)
    }

    pub fn resume_data(user_id: &Uuid) -> String {
        format!("resumeData:{}", user_id)
    }

    pub fn account(email: &str) -> String {
        format!("account:{}", email.trim().to_lowercase())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    schema_version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    schema_version: u32,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// A key/value store holding schema-versioned JSON records.
#[derive(Clone)]
pub enum Store {
    /// Process-local map, used for development and tests.
    Memory(Arc<RwLock<HashMap<String, String>>>),
    /// Redis-backed store.
    Redis(ConnectionManager),
}

impl Store {
    /// Creates an empty in-memory store.
    pub fn memory() -> Self {
        Store::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Connects to Redis when a URL is given, otherwise falls back to memory.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - The optional URL of the Redis server.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Store`.
    pub async fn connect(redis_url: Option<&str>) -> Result<Self> {
        match redis_url {
            Some(url) => {
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                tracing::info!("✅ Redis Connection Manager initialized");
                Ok(Store::Redis(manager))
            }
            None => {
                tracing::info!("✅ In-memory store initialized");
                Ok(Store::memory())
            }
        }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        match self {
            Store::Memory(map) => Ok(map.read().await.get(key).cloned()),
            Store::Redis(manager) => {
                let mut con = manager.clone();
                Ok(con.get::<_, Option<String>>(key).await?)
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<()> {
        match self {
            Store::Memory(map) => {
                map.write().await.insert(key.to_string(), value);
                Ok(())
            }
            Store::Redis(manager) => {
                let mut con = manager.clone();
                let _: () = con.set(key, value).await?;
                Ok(())
            }
        }
    }

    /// Returns whether a record exists under `key`.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Reads and decodes the record stored under `key`.
    ///
    /// Records written under another schema version, or that fail to decode,
    /// read as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };

        let header: EnvelopeHeader = match sonic_rs::from_str(&raw) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!("❌ Unreadable record at {}: {}", key, e);
                return Ok(None);
            }
        };

        if header.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                "❌ Record at {} has schema version {} (expected {})",
                key,
                header.schema_version,
                SCHEMA_VERSION
            );
            return Ok(None);
        }

        match sonic_rs::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) => Ok(Some(envelope.data)),
            Err(e) => {
                tracing::warn!("❌ Invalid record JSON at {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Encodes `value` in a versioned envelope and stores it under `key`.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = sonic_rs::to_string(&EnvelopeRef {
            schema_version: SCHEMA_VERSION,
            data: value,
        })?;
        self.set_raw(key, json).await
    }

    /// Removes every listed key. Missing keys are ignored.
    pub async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        match self {
            Store::Memory(map) => {
                let mut map = map.write().await;
                for key in keys {
                    map.remove(key);
                }
                Ok(())
            }
            Store::Redis(manager) => {
                let mut con = manager.clone();
                let _: () = con.del(keys.to_vec()).await?;
                Ok(())
            }
        }
    }

    /// Removes the token, identity and session records of a user.
    pub async fn clear_session(&self, user_id: &Uuid) -> Result<()> {
        self.delete(&[
            keys::auth_token(user_id),
            keys::user_data(user_id),
            keys::session_data(user_id),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        text: String,
    }

    #[tokio::test]
    async fn stores_records_in_versioned_envelope() {
        let store = Store::memory();
        let note = Note { text: "hello".to_string() };
        store.put("note", &note).await.unwrap();

        let Store::Memory(map) = &store else { unreachable!() };
        let raw = map.read().await.get("note").cloned().unwrap();
        assert!(raw.contains("\"schema_version\":1"));

        let loaded: Option<Note> = store.get("note").await.unwrap();
        assert_eq!(loaded, Some(note));
    }

    #[tokio::test]
    async fn unknown_schema_version_reads_as_absent() {
        let store = Store::memory();
        store
            .set_raw("note", r#"{"schema_version":99,"data":{"text":"old"}}"#.to_string())
            .await
            .unwrap();

        let loaded: Option<Note> = store.get("note").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn corrupt_record_reads_as_absent() {
        let store = Store::memory();
        store.set_raw("note", "not json".to_string()).await.unwrap();

        let loaded: Option<Note> = store.get("note").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn clear_session_is_idempotent() {
        let store = Store::memory();
        let user_id = Uuid::new_v4();
        store.put(&keys::auth_token(&user_id), &"token").await.unwrap();
        store.put(&keys::profile_data(&user_id), &"profile").await.unwrap();

        store.clear_session(&user_id).await.unwrap();
        store.clear_session(&user_id).await.unwrap();

        assert!(!store.contains(&keys::auth_token(&user_id)).await.unwrap());
        assert!(store.contains(&keys::profile_data(&user_id)).await.unwrap());
    }
}
