//! Session profiles ("content packs"): named, colored id-sets over
//! objectives, missions and guides, with at most one active at a time.
use serde::{Deserialize, Serialize};

use crate::error::{TrackerResult, require_name};
use crate::records::{Collection, Record, Timestamp, new_id, now};
use crate::storage::{self, KeyValueStore, keys};

pub const DEFAULT_PROFILE_COLOR: &str = "#3b82f6";

fn default_color() -> String {
    DEFAULT_PROFILE_COLOR.to_string()
}

/// Which id-set of a profile an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Objective,
    Mission,
    Guide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub objective_ids: Vec<String>,
    #[serde(default)]
    pub mission_ids: Vec<String>,
    #[serde(default)]
    pub guide_ids: Vec<String>,
}

impl Record for SessionProfile {
    const KIND: &'static str = "session profile";
    const STORAGE_KEY: &'static str = keys::SESSION_PROFILES;

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

impl SessionProfile {
    #[must_use]
    pub fn ids(&self, kind: ContentKind) -> &[String] {
        match kind {
            ContentKind::Objective => &self.objective_ids,
            ContentKind::Mission => &self.mission_ids,
            ContentKind::Guide => &self.guide_ids,
        }
    }

    fn ids_mut(&mut self, kind: ContentKind) -> &mut Vec<String> {
        match kind {
            ContentKind::Objective => &mut self.objective_ids,
            ContentKind::Mission => &mut self.mission_ids,
            ContentKind::Guide => &mut self.guide_ids,
        }
    }

    #[must_use]
    pub fn contains(&self, kind: ContentKind, item_id: &str) -> bool {
        self.ids(kind).iter().any(|id| id == item_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_objectives: usize,
    pub total_missions: usize,
    pub total_guides: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SessionProfilePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
}

/// Registry of session profiles plus the active-profile pointer.
///
/// Only the active id is held; the profile itself is looked up on every
/// read, so membership changes are visible through [`Self::active`] at once.
#[derive(Debug, Clone)]
pub struct SessionProfiles<S> {
    profiles: Collection<SessionProfile, S>,
    active_id: Option<String>,
}

impl<S: KeyValueStore> SessionProfiles<S> {
    pub fn open(store: S) -> Self {
        let mut manager = Self {
            profiles: Collection::open(store),
            active_id: None,
        };
        manager.load_active();
        manager
    }

    pub fn reload(&mut self) {
        self.profiles.reload();
        self.load_active();
    }

    fn load_active(&mut self) {
        let store = self.profiles.store();
        self.active_id = store
            .get(keys::ACTIVE_SESSION_PROFILE_ID)
            .filter(|id| !id.is_empty());
        if let Some(id) = &self.active_id
            && self.profiles.get(id).is_none()
        {
            log::warn!("dropping unknown active session profile `{id}`");
            store.remove(keys::ACTIVE_SESSION_PROFILE_ID);
            self.active_id = None;
        }
    }

    #[must_use]
    pub fn list(&self) -> &[SessionProfile] {
        self.profiles.list()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SessionProfile> {
        self.profiles.get(id)
    }

    #[must_use]
    pub fn active(&self) -> Option<&SessionProfile> {
        self.active_id.as_deref().and_then(|id| self.profiles.get(id))
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active().map(|profile| profile.id.as_str())
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn create(
        &mut self,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
    ) -> TrackerResult<String> {
        require_name("profile name", name)?;
        let at = now();
        self.profiles.insert(SessionProfile {
            id: new_id(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            color: color
                .filter(|c| !c.trim().is_empty())
                .map_or_else(default_color, str::to_string),
            created_at: at,
            updated_at: at,
            objective_ids: Vec::new(),
            mission_ids: Vec::new(),
            guide_ids: Vec::new(),
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn update(&mut self, id: &str, patch: SessionProfilePatch) -> TrackerResult<()> {
        self.profiles.modify(id, |profile| {
            if let Some(name) = patch.name {
                require_name("profile name", &name)?;
                profile.name = name.trim().to_string();
            }
            if let Some(description) = patch.description {
                profile.description = description;
            }
            if let Some(color) = patch.color {
                profile.color = color;
            }
            Ok(())
        })
    }

    /// Delete a profile, deactivating it first if it was active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn delete(&mut self, id: &str) -> TrackerResult<()> {
        self.profiles.remove(id)?;
        if self.active_id.as_deref() == Some(id) {
            self.set_active(None)?;
        }
        Ok(())
    }

    /// Switch the active profile, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown profile, or a storage error.
    pub fn set_active(&mut self, id: Option<&str>) -> TrackerResult<()> {
        if let Some(id) = id {
            self.profiles.require(id)?;
        }
        storage::save_pointer(self.profiles.store(), keys::ACTIVE_SESSION_PROFILE_ID, id)?;
        self.active_id = id.map(str::to_string);
        log::debug!("active session profile: {:?}", self.active_id);
        Ok(())
    }

    /// Add an item id to a profile. Returns `false` if it was already there.
    /// The id is not checked against its collection.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown profile, or a storage error.
    pub fn add_content(
        &mut self,
        profile_id: &str,
        kind: ContentKind,
        item_id: &str,
    ) -> TrackerResult<bool> {
        if self.profiles.require(profile_id)?.contains(kind, item_id) {
            return Ok(false);
        }
        self.profiles.modify(profile_id, |profile| {
            profile.ids_mut(kind).push(item_id.to_string());
            Ok(true)
        })
    }

    /// Remove an item id from a profile. Returns `false` if it was absent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown profile, or a storage error.
    pub fn remove_content(
        &mut self,
        profile_id: &str,
        kind: ContentKind,
        item_id: &str,
    ) -> TrackerResult<bool> {
        if !self.profiles.require(profile_id)?.contains(kind, item_id) {
            return Ok(false);
        }
        self.profiles.modify(profile_id, |profile| {
            profile.ids_mut(kind).retain(|id| id != item_id);
            Ok(true)
        })
    }

    /// Membership counts; an unknown profile counts as empty.
    #[must_use]
    pub fn stats(&self, profile_id: &str) -> ProfileStats {
        self.profiles
            .get(profile_id)
            .map(|profile| ProfileStats {
                total_objectives: profile.objective_ids.len(),
                total_missions: profile.mission_ids.len(),
                total_guides: profile.guide_ids.len(),
            })
            .unwrap_or_default()
    }

    /// The records visible under the active profile: all of them when no
    /// profile is active, otherwise those whose id the profile lists.
    #[must_use]
    pub fn scope<'a, T: Record>(&self, kind: ContentKind, records: &'a [T]) -> Vec<&'a T> {
        match self.active() {
            None => records.iter().collect(),
            Some(profile) => records
                .iter()
                .filter(|record| profile.contains(kind, record.id()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_color_and_trims_name() {
        let mut profiles = SessionProfiles::open(MemoryStore::new());
        let id = profiles.create("  Build A ", None, None).unwrap();
        let profile = profiles.get(&id).unwrap();
        assert_eq!(profile.name, "Build A");
        assert_eq!(profile.color, DEFAULT_PROFILE_COLOR);
        assert!(profiles.create("", None, None).is_err());
    }

    #[test]
    fn membership_is_idempotent_and_visible_through_active() {
        let mut profiles = SessionProfiles::open(MemoryStore::new());
        let id = profiles.create("Raid Night", None, Some("#ff0000")).unwrap();
        profiles.set_active(Some(id.as_str())).unwrap();
        assert!(profiles.add_content(&id, ContentKind::Mission, "m-1").unwrap());
        assert!(!profiles.add_content(&id, ContentKind::Mission, "m-1").unwrap());
        assert_eq!(profiles.active().unwrap().mission_ids, vec!["m-1".to_string()]);
        assert!(profiles.remove_content(&id, ContentKind::Mission, "m-1").unwrap());
        assert!(!profiles.remove_content(&id, ContentKind::Mission, "m-1").unwrap());
        assert!(profiles.active().unwrap().mission_ids.is_empty());
    }

    #[test]
    fn stats_are_zero_for_unknown_profiles() {
        let profiles = SessionProfiles::open(MemoryStore::new());
        assert_eq!(profiles.stats("ghost"), ProfileStats::default());
    }

    #[test]
    fn deleting_active_profile_clears_pointer() {
        let store = MemoryStore::new();
        let mut profiles = SessionProfiles::open(store.clone());
        let id = profiles.create("Temp", None, None).unwrap();
        profiles.set_active(Some(id.as_str())).unwrap();
        assert!(store.contains(keys::ACTIVE_SESSION_PROFILE_ID));
        profiles.delete(&id).unwrap();
        assert!(profiles.active().is_none());
        assert!(!store.contains(keys::ACTIVE_SESSION_PROFILE_ID));
        // The emptied registry is still written out.
        assert_eq!(store.get(keys::SESSION_PROFILES).as_deref(), Some("[]"));
    }

    #[test]
    fn unknown_active_pointer_is_dropped_on_open() {
        let store = MemoryStore::new();
        store.set(keys::ACTIVE_SESSION_PROFILE_ID, "stale").unwrap();
        let profiles = SessionProfiles::open(store.clone());
        assert!(profiles.active().is_none());
        assert!(!store.contains(keys::ACTIVE_SESSION_PROFILE_ID));
    }

    #[test]
    fn activating_unknown_profile_fails() {
        let mut profiles = SessionProfiles::open(MemoryStore::new());
        assert!(profiles.set_active(Some("ghost")).unwrap_err().is_not_found());
        assert!(profiles.set_active(None).is_ok());
    }
}
