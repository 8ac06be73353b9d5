//! Durable storage abstraction.
//!
//! `spec.md` §1/§4.4 treats persistence as "an opaque per-actor durable
//! map": each `RoomActor` owns one key ("room") under its own namespace,
//! and the `IndexActor` owns a handful of its own keys (`rooms`, `queues`,
//! `estimate_anchor_<timeControl>`). This mirrors the teacher's
//! `GameDatabase` trait + `InMemoryDatabase` + `DatabaseConfig` factory
//! shape, but narrowed from a rich room-CRUD API down to the generic
//! get/put map the spec actually calls for.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One actor's exclusive durable namespace: `get`/`put` by key, as the spec
/// describes (`get('room')`, `put('room', ...)`).
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<Value>>;
    async fn put_raw(&self, key: &str, value: Value) -> Result<()>;
    async fn delete_raw(&self, key: &str) -> Result<()>;
}

/// Object-safe variant used wherever a `dyn Store` is held (e.g. the room
/// registry); the generic `get`/`put` helpers live on `StoreExt` below
/// (blanket-implemented for `?Sized`) so they stay usable on trait objects.
pub type DynStore = Arc<dyn Store>;

/// Typed convenience helpers layered on top of the object-safe `Store`
/// trait; split out (and blanket-implemented for `?Sized`) so they remain
/// callable through a `dyn Store` / `DynStore`.
#[async_trait]
pub trait StoreExt: Store {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    async fn put<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        self.put_raw(key, serde_json::to_value(value)?).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// In-memory backend, the only one this crate ships — same stance the
/// teacher takes with `DatabaseConfig::InMemory` being the sole variant.
#[derive(Default)]
pub struct InMemoryStore {
    data: DashMap<String, Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.get(key).map(|v| v.clone()))
    }

    async fn put_raw(&self, key: &str, value: Value) -> Result<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_raw(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}

/// Factory mirroring the teacher's `create_database`/`DatabaseConfig`
/// split, kept even though only one backend exists today so a future
/// backend (sled, Redis, a DO-style KV) slots in without touching callers.
#[derive(Debug, Clone, Default)]
pub enum StoreConfig {
    #[default]
    InMemory,
}

pub fn create_store(config: &StoreConfig) -> DynStore {
    match config {
        StoreConfig::InMemory => Arc::new(InMemoryStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreExt as _;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        n: i64,
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryStore::new();
        store.put("room", &Sample { n: 7 }).await.unwrap();
        let loaded: Option<Sample> = store.get("room").await.unwrap();
        assert_eq!(loaded, Some(Sample { n: 7 }));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = InMemoryStore::new();
        let loaded: Option<Sample> = store.get("missing").await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let store = InMemoryStore::new();
        store.put("room", &Sample { n: 1 }).await.unwrap();
        store.delete_raw("room").await.unwrap();
        let loaded: Option<Sample> = store.get("room").await.unwrap();
        assert_eq!(loaded, None);
    }
}
