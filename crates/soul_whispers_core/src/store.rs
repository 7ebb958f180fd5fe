//! crates/soul_whispers_core/src/store.rs
//!
//! Favorites and profile persistence on top of the `KeyValueStore` port.
//!
//! Both records are plain JSON. Reads default silently to empty/absent on missing or
//! unparseable data; writes replace the whole record.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Reflection, SavedEntry, UserProfile};
use crate::ports::{KeyValueStore, PortError, PortResult};

pub const FAVORITES_KEY: &str = "sw_favorites";
pub const PROFILE_KEY: &str = "sw_user";

//=========================================================================================
// Favorites
//=========================================================================================

/// Saved reflections, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    entries: Vec<SavedEntry>,
}

/// Outcome of toggling the heart on a reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Added(String),
    Removed(usize),
}

impl Favorites {
    pub fn new(entries: Vec<SavedEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SavedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.entries.iter().any(|e| e.reflection.title == title)
    }

    pub fn get(&self, id: &str) -> Option<&SavedEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Removes every entry titled like `reflection`, or saves it at the front.
    ///
    /// Identity is the title: two different reflections with the same title are
    /// treated as one favorite.
    pub fn toggle(&mut self, reflection: &Reflection, now: DateTime<Utc>) -> Toggled {
        if self.contains_title(&reflection.title) {
            let before = self.entries.len();
            self.entries.retain(|e| e.reflection.title != reflection.title);
            return Toggled::Removed(before - self.entries.len());
        }
        let entry = SavedEntry::new(reflection.clone(), now);
        let id = entry.id.clone();
        self.entries.insert(0, entry);
        Toggled::Added(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }
}

//=========================================================================================
// Loading and persisting
//=========================================================================================

/// What survives a reload for one client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalState {
    pub favorites: Favorites,
    pub profile: Option<UserProfile>,
}

pub async fn load_local_state(store: &dyn KeyValueStore, client_id: Uuid) -> LocalState {
    let favorites = read_record::<Vec<SavedEntry>>(store, client_id, FAVORITES_KEY)
        .await
        .unwrap_or_default();
    let profile = read_record::<UserProfile>(store, client_id, PROFILE_KEY).await;
    LocalState {
        favorites: Favorites::new(favorites),
        profile,
    }
}

async fn read_record<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    client_id: Uuid,
    key: &str,
) -> Option<T> {
    let raw = match store.get(client_id, key).await {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(%client_id, key, "Failed to read record, using default: {}", e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%client_id, key, "Ignoring unparseable record: {}", e);
            None
        }
    }
}

pub async fn save_favorites(
    store: &dyn KeyValueStore,
    client_id: Uuid,
    entries: &[SavedEntry],
) -> PortResult<()> {
    let json = serde_json::to_string(entries).map_err(|e| PortError::Unexpected(e.to_string()))?;
    store.put(client_id, FAVORITES_KEY, &json).await
}

/// Writes the profile when signed in and removes the record when signed out.
pub async fn save_profile(
    store: &dyn KeyValueStore,
    client_id: Uuid,
    profile: Option<&UserProfile>,
) -> PortResult<()> {
    match profile {
        Some(profile) => {
            let json =
                serde_json::to_string(profile).map_err(|e| PortError::Unexpected(e.to_string()))?;
            store.put(client_id, PROFILE_KEY, &json).await
        }
        None => store.remove(client_id, PROFILE_KEY).await,
    }
}

//=========================================================================================
// In-memory store
//=========================================================================================

/// A `KeyValueStore` that lives for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    records: Mutex<HashMap<(Uuid, String), String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<std::sync::MutexGuard<'_, HashMap<(Uuid, String), String>>> {
        self.records
            .lock()
            .map_err(|_| PortError::Unexpected("record store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, client_id: Uuid, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock()?.get(&(client_id, key.to_string())).cloned())
    }

    async fn put(&self, client_id: Uuid, key: &str, value: &str) -> PortResult<()> {
        self.lock()?
            .insert((client_id, key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, client_id: Uuid, key: &str) -> PortResult<()> {
        self.lock()?.remove(&(client_id, key.to_string()));
        Ok(())
    }
}
