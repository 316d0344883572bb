//! `localStorage` backend for the tracker.

use questlog_core::{KeyValueStore, StorageError, Tracker};
use web_sys::Storage;

use crate::dom;

#[derive(Debug, thiserror::Error)]
pub enum BrowserStorageError {
    #[error("localStorage unavailable: {0}")]
    Unavailable(String),
}

/// Browser `localStorage` as a [`KeyValueStore`]. Clones share the same
/// underlying storage area.
#[derive(Debug, Clone)]
pub struct BrowserStorage {
    storage: Storage,
}

impl BrowserStorage {
    /// # Errors
    /// Returns an error when `localStorage` is disabled or there is no window.
    pub fn open() -> Result<Self, BrowserStorageError> {
        dom::local_storage()
            .map(|storage| Self { storage })
            .map_err(|err| BrowserStorageError::Unavailable(dom::js_error_message(&err)))
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("read of `{key}` failed: {}", dom::js_error_message(&err));
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| StorageError::WriteRejected {
                key: key.to_string(),
                reason: dom::js_error_message(&err),
            })
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.storage.remove_item(key) {
            log::warn!("remove of `{key}` failed: {}", dom::js_error_message(&err));
        }
    }
}

/// Open a tracker over the page's `localStorage`.
///
/// # Errors
/// Returns an error when `localStorage` is unavailable.
pub fn open_tracker() -> Result<Tracker<BrowserStorage>, BrowserStorageError> {
    BrowserStorage::open().map(Tracker::open)
}
