//! Key-value persistence adapter.
//!
//! Every collection owns one string key and rewrites the whole JSON document
//! after each mutation. There is no cross-key atomicity: writing several keys
//! is several independent calls, and a failure partway leaves a mixed state.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;

use crate::error::{TrackerError, TrackerResult};

/// Storage keys, compatible with documents written by the browser tracker.
pub mod keys {
    pub const PLAYER_STATS: &str = "playerStats";
    pub const OBJECTIVES: &str = "objectives";
    pub const MISSIONS: &str = "missions";
    pub const GUIDES: &str = "guides";
    pub const INVENTORY: &str = "inventory";
    pub const MISSION_CATEGORIES: &str = "missionCategories";
    pub const GUIDE_CATEGORIES: &str = "guideCategories";
    pub const QUICK_MISSIONS: &str = "quickMissions";
    pub const GAME_PROFILES: &str = "gameProfiles";
    pub const CURRENT_PROFILE_ID: &str = "currentProfileId";
    pub const SESSION_PROFILES: &str = "sessionProfiles";
    pub const ACTIVE_SESSION_PROFILE_ID: &str = "activeSessionProfileId";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,
    #[error("write to `{key}` rejected: {reason}")]
    WriteRejected { key: String, reason: String },
}

/// Trait for abstracting the persistent string store.
/// Platform-specific implementations should provide this.
pub trait KeyValueStore {
    /// Read the raw document stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write (for example on quota).
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str);
}

/// In-memory store shared between clones, used by tests and the tester CLI.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once the total stored bytes would exceed `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Rc::default(),
            quota: Some(bytes),
        }
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::WriteRejected {
                    key: key.to_string(),
                    reason: format!("quota of {limit} bytes exceeded ({needed} needed)"),
                });
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Decode `key`, distinguishing an absent document from a malformed one.
///
/// # Errors
///
/// Returns [`TrackerError::MalformedData`] when the stored text is not valid
/// JSON for `T`.
pub fn read_json<T, S>(store: &S, key: &str) -> TrackerResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| TrackerError::malformed(format!("document `{key}`"), err))
}

/// Decode `key`, treating absent and malformed documents as `T::default()`.
/// The malformed case is logged; it never reaches the caller.
pub fn load_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    load_json_or(store, key, T::default)
}

/// Like [`load_json`] with an explicit fallback.
pub fn load_json_or<T, S, F>(store: &S, key: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
    F: FnOnce() -> T,
{
    match read_json(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => fallback(),
        Err(err) => {
            log::warn!("discarding {err}; starting from an empty document");
            fallback()
        }
    }
}

/// Encode `value` and write it under `key`.
///
/// # Errors
///
/// Returns [`TrackerError::Storage`] if the backend rejects the write.
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> TrackerResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)
        .map_err(|err| TrackerError::malformed(format!("encoding of `{key}`"), err))?;
    store.set(key, &raw).map_err(|err| {
        log::error!("write to `{key}` failed: {err}");
        TrackerError::from(err)
    })
}

/// Write a raw pointer value (an id) or clear it.
///
/// # Errors
///
/// Returns [`TrackerError::Storage`] if the backend rejects the write.
pub fn save_pointer<S>(store: &S, key: &str, value: Option<&str>) -> TrackerResult<()>
where
    S: KeyValueStore + ?Sized,
{
    match value {
        Some(id) => store.set(key, id).map_err(TrackerError::from),
        None => {
            store.remove(key);
            Ok(())
        }
    }
}
