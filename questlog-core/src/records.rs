//! Shared record plumbing: ids, timestamps, locations and the generic
//! load-mutate-save collection every domain list is built on.
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};
use crate::player::PlayerStats;
use crate::storage::{self, KeyValueStore};

pub type Timestamp = DateTime<Utc>;

#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Fresh record id.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Where in the game world a record takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A record stored in a [`Collection`].
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Human label used in errors and logs.
    const KIND: &'static str;
    const STORAGE_KEY: &'static str;

    fn id(&self) -> &str;

    /// Advisory expiry; nothing purges expired records.
    fn expires_at(&self) -> Option<Timestamp> {
        None
    }

    /// Stamp the last-modified time.
    fn touch(&mut self, _at: Timestamp) {}
}

/// Flip a derived completion flag, stamping or clearing its timestamp.
pub(crate) fn settle_completion(
    completed: &mut bool,
    completed_at: &mut Option<Timestamp>,
    done: bool,
    at: Timestamp,
) {
    if done && !*completed {
        *completed = true;
        *completed_at = Some(at);
    } else if !done && *completed {
        *completed = false;
        *completed_at = None;
    }
}

/// Ordered list of records persisted as one JSON array under
/// [`Record::STORAGE_KEY`]. Every mutation rewrites the whole document.
///
/// All mutations commit in the same order: validate, update memory, then
/// write. Validation failures leave memory untouched (edits run on a draft
/// copy). A rejected write leaves memory ahead of storage, and the next
/// successful write of the same key catches it up.
#[derive(Debug, Clone)]
pub struct Collection<T, S> {
    items: Vec<T>,
    store: S,
}

impl<T: Record, S: KeyValueStore> Collection<T, S> {
    /// Read the collection; absent or malformed documents start empty.
    pub fn open(store: S) -> Self {
        let items = storage::load_json(&store, T::STORAGE_KEY);
        Self { items, store }
    }

    /// Re-read from storage, discarding the in-memory copy.
    pub fn reload(&mut self) {
        self.items = storage::load_json(&self.store, T::STORAGE_KEY);
    }

    #[must_use]
    pub fn list(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records whose `expires_at` lies before `at`.
    #[must_use]
    pub fn expired(&self, at: Timestamp) -> Vec<&T> {
        self.items
            .iter()
            .filter(|item| item.expires_at().is_some_and(|exp| exp <= at))
            .collect()
    }

    /// Delete a record. References held elsewhere are left dangling.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage error. After a
    /// storage error the record is already gone from memory.
    pub fn remove(&mut self, id: &str) -> TrackerResult<T> {
        let idx = self.position(id)?;
        let removed = self.items.remove(idx);
        log::debug!("removed {} `{id}`", T::KIND);
        self.persist()?;
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub fn persist(&self) -> TrackerResult<()> {
        storage::save_json(&self.store, T::STORAGE_KEY, &self.items)
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn replace_all(&mut self, items: Vec<T>) -> TrackerResult<()> {
        self.items = items;
        self.persist()
    }

    pub(crate) fn position(&self, id: &str) -> TrackerResult<usize> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| TrackerError::not_found(T::KIND, id))
    }

    pub(crate) fn require(&self, id: &str) -> TrackerResult<&T> {
        self.get(id).ok_or_else(|| TrackerError::not_found(T::KIND, id))
    }

    /// Append an already validated record. On a storage error the record
    /// stays in memory.
    pub(crate) fn insert(&mut self, record: T) -> TrackerResult<String> {
        let id = record.id().to_string();
        self.items.push(record);
        log::debug!("added {} `{id}`", T::KIND);
        self.persist()?;
        Ok(id)
    }

    /// Run `edit` against a draft copy; the record is only replaced when the
    /// edit succeeds, so a failed edit leaves no partial mutation behind.
    pub(crate) fn modify<R>(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut T) -> TrackerResult<R>,
    ) -> TrackerResult<R> {
        let idx = self.position(id)?;
        let mut draft = self.items[idx].clone();
        let out = edit(&mut draft)?;
        draft.touch(now());
        self.items[idx] = draft;
        self.persist()?;
        Ok(out)
    }

    /// Like [`Collection::modify`], with a scratch copy of the player stats
    /// that is committed only alongside the record.
    pub(crate) fn modify_rewarding<R>(
        &mut self,
        id: &str,
        stats: &mut PlayerStats,
        edit: impl FnOnce(&mut T, &mut PlayerStats) -> TrackerResult<R>,
    ) -> TrackerResult<R> {
        let idx = self.position(id)?;
        let mut draft = self.items[idx].clone();
        let mut scratch = stats.clone();
        let out = edit(&mut draft, &mut scratch)?;
        draft.touch(now());
        self.items[idx] = draft;
        *stats = scratch;
        self.persist()?;
        Ok(out)
    }
}
