//! Game profiles: whole-tracker save states.
//!
//! A profile embeds a copy of every live document (player stats, the four
//! domain collections and both category registries). Loading one writes those
//! documents back over the live keys; callers must then re-read every
//! collection, which [`ReloadRequired`] signals.
use serde::{Deserialize, Serialize};

use crate::categories::{DEFAULT_GUIDE_CATEGORIES, DEFAULT_MISSION_CATEGORIES, load_names};
use crate::error::{TrackerError, TrackerResult, require_name};
use crate::guides::Guide;
use crate::inventory::InventoryItem;
use crate::missions::Mission;
use crate::objectives::Objective;
use crate::player::PlayerStats;
use crate::records::{Collection, Record, Timestamp, new_id, now};
use crate::storage::{self, KeyValueStore, keys};

/// Newest save-state layout this build reads and the one it writes.
pub const SCHEMA_VERSION: u32 = 1;

const fn schema_v1() -> u32 {
    1
}

fn default_mission_categories() -> Vec<String> {
    DEFAULT_MISSION_CATEGORIES.iter().map(|c| (*c).to_string()).collect()
}

fn default_guide_categories() -> Vec<String> {
    DEFAULT_GUIDE_CATEGORIES.iter().map(|c| (*c).to_string()).collect()
}

/// Every live document a save state captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveData {
    #[serde(default)]
    pub player_stats: PlayerStats,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub missions: Vec<Mission>,
    #[serde(default)]
    pub guides: Vec<Guide>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default = "default_mission_categories")]
    pub mission_categories: Vec<String>,
    #[serde(default = "default_guide_categories")]
    pub guide_categories: Vec<String>,
}

impl Default for LiveData {
    fn default() -> Self {
        Self {
            player_stats: PlayerStats::default(),
            objectives: Vec::new(),
            missions: Vec::new(),
            guides: Vec::new(),
            inventory: Vec::new(),
            mission_categories: default_mission_categories(),
            guide_categories: default_guide_categories(),
        }
    }
}

impl LiveData {
    /// Snapshot the live keys. Unreadable documents read as empty.
    pub fn read<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut player_stats: PlayerStats = storage::load_json(store, keys::PLAYER_STATS);
        player_stats.sanitize();
        Self {
            player_stats,
            objectives: storage::load_json(store, keys::OBJECTIVES),
            missions: storage::load_json(store, keys::MISSIONS),
            guides: storage::load_json(store, keys::GUIDES),
            inventory: storage::load_json(store, keys::INVENTORY),
            mission_categories: load_names(
                store,
                keys::MISSION_CATEGORIES,
                &DEFAULT_MISSION_CATEGORIES,
            ),
            guide_categories: load_names(store, keys::GUIDE_CATEGORIES, &DEFAULT_GUIDE_CATEGORIES),
        }
    }

    /// Overwrite the live keys. Each key is an independent write; a failure
    /// part way leaves the earlier keys already replaced.
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered.
    pub fn write<S: KeyValueStore + ?Sized>(&self, store: &S) -> TrackerResult<()> {
        storage::save_json(store, keys::PLAYER_STATS, &self.player_stats)?;
        storage::save_json(store, keys::OBJECTIVES, &self.objectives)?;
        storage::save_json(store, keys::MISSIONS, &self.missions)?;
        storage::save_json(store, keys::GUIDES, &self.guides)?;
        storage::save_json(store, keys::INVENTORY, &self.inventory)?;
        storage::save_json(store, keys::MISSION_CATEGORIES, &self.mission_categories)?;
        storage::save_json(store, keys::GUIDE_CATEGORIES, &self.guide_categories)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProfile {
    #[serde(default = "schema_v1")]
    pub schema_version: u32,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_played_at: Timestamp,
    #[serde(flatten)]
    pub data: LiveData,
    #[serde(default)]
    pub total_play_time: u64,
    #[serde(default)]
    pub total_objectives: usize,
    #[serde(default)]
    pub completed_objectives: usize,
    #[serde(default)]
    pub total_missions: usize,
    #[serde(default)]
    pub completed_missions: usize,
}

impl Record for GameProfile {
    const KIND: &'static str = "game profile";
    const STORAGE_KEY: &'static str = keys::GAME_PROFILES;

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

impl GameProfile {
    /// Recompute the summary counters from the embedded data.
    fn refresh_totals(&mut self) {
        self.total_objectives = self.data.objectives.len();
        self.completed_objectives = self.data.objectives.iter().filter(|o| o.completed).count();
        self.total_missions = self.data.missions.len();
        self.completed_missions = self.data.missions.iter().filter(|m| m.completed).count();
    }
}

/// Returned by [`GameProfiles::load`]: the live keys changed underneath every
/// open collection, which must re-read before its next use.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "collections hold stale data until they are reloaded"]
pub struct ReloadRequired {
    pub profile_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct GameProfilePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub total_play_time: Option<u64>,
}

/// Save-state registry plus the current-profile pointer.
#[derive(Debug, Clone)]
pub struct GameProfiles<S> {
    profiles: Collection<GameProfile, S>,
    current_id: Option<String>,
}

impl<S: KeyValueStore> GameProfiles<S> {
    pub fn open(store: S) -> Self {
        let mut manager = Self {
            profiles: Collection::open(store),
            current_id: None,
        };
        manager.load_current();
        manager
    }

    pub fn reload(&mut self) {
        self.profiles.reload();
        self.load_current();
    }

    fn load_current(&mut self) {
        self.current_id = self
            .profiles
            .store()
            .get(keys::CURRENT_PROFILE_ID)
            .filter(|id| self.profiles.get(id).is_some());
    }

    #[must_use]
    pub fn list(&self) -> &[GameProfile] {
        self.profiles.list()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GameProfile> {
        self.profiles.get(id)
    }

    #[must_use]
    pub fn current(&self) -> Option<&GameProfile> {
        self.current_id.as_deref().and_then(|id| self.profiles.get(id))
    }

    /// Snapshot the live data into a new profile, which becomes current.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn create(&mut self, name: &str, description: Option<&str>) -> TrackerResult<String> {
        require_name("profile name", name)?;
        let at = now();
        let mut profile = GameProfile {
            schema_version: SCHEMA_VERSION,
            id: new_id(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            created_at: at,
            updated_at: at,
            last_played_at: at,
            data: LiveData::read(self.profiles.store()),
            total_play_time: 0,
            total_objectives: 0,
            completed_objectives: 0,
            total_missions: 0,
            completed_missions: 0,
        };
        profile.refresh_totals();
        let id = self.profiles.insert(profile)?;
        self.set_current(Some(id.as_str()))?;
        log::info!("created game profile `{name}`");
        Ok(id)
    }

    /// Write a profile's snapshot over the live keys and make it current.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching anything for an unknown id, or a
    /// storage error from any of the writes.
    pub fn load(&mut self, id: &str) -> TrackerResult<ReloadRequired> {
        let data = self.profiles.require(id)?.data.clone();
        data.write(self.profiles.store())?;
        self.profiles.modify(id, |profile| {
            profile.last_played_at = now();
            Ok(())
        })?;
        self.set_current(Some(id))?;
        log::info!("loaded game profile `{id}`");
        Ok(ReloadRequired {
            profile_id: id.to_string(),
        })
    }

    /// Re-snapshot the live data into an existing profile.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn save(&mut self, id: &str) -> TrackerResult<()> {
        let data = LiveData::read(self.profiles.store());
        self.profiles.modify(id, |profile| {
            profile.data = data;
            profile.last_played_at = now();
            profile.refresh_totals();
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` when no profile is current, or a storage error.
    pub fn save_current(&mut self) -> TrackerResult<()> {
        let id = self
            .current_id
            .clone()
            .ok_or_else(|| TrackerError::not_found(GameProfile::KIND, "<current>"))?;
        self.save(&id)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn update(&mut self, id: &str, patch: GameProfilePatch) -> TrackerResult<()> {
        self.profiles.modify(id, |profile| {
            if let Some(name) = patch.name {
                require_name("profile name", &name)?;
                profile.name = name.trim().to_string();
            }
            if let Some(description) = patch.description {
                profile.description = description;
            }
            if let Some(play_time) = patch.total_play_time {
                profile.total_play_time = play_time;
            }
            Ok(())
        })
    }

    /// Delete a profile. Deleting the current profile clears the pointer but
    /// leaves the live data it loaded in place.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn delete(&mut self, id: &str) -> TrackerResult<()> {
        self.profiles.remove(id)?;
        if self.current_id.as_deref() == Some(id) {
            self.set_current(None)?;
        }
        Ok(())
    }

    /// Deep-copy a profile under a new name. The current pointer is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn duplicate(&mut self, id: &str, new_name: &str) -> TrackerResult<String> {
        require_name("profile name", new_name)?;
        let at = now();
        let mut copy = self.profiles.require(id)?.clone();
        copy.id = new_id();
        copy.name = new_name.trim().to_string();
        copy.created_at = at;
        copy.updated_at = at;
        copy.last_played_at = at;
        self.profiles.insert(copy)
    }

    /// Pretty-printed JSON document for download.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn export(&self, id: &str) -> TrackerResult<String> {
        let profile = self.profiles.require(id)?;
        serde_json::to_string_pretty(profile)
            .map_err(|err| TrackerError::malformed("profile export", err))
    }

    /// Download name for a profile export: the profile name with every
    /// non-alphanumeric character replaced by `_`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn export_file_name(&self, id: &str) -> TrackerResult<String> {
        let profile = self.profiles.require(id)?;
        let stem: String = profile
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Ok(format!("{stem}_profile.json"))
    }

    /// Add a profile from an exported document under a fresh id and
    /// timestamps. Totals are recomputed rather than trusted.
    ///
    /// # Errors
    ///
    /// Returns `MalformedData` for unparseable input, `UnsupportedSchema` for
    /// a newer layout, a validation error for a blank name, or a storage
    /// error. Nothing is changed on error.
    pub fn import(&mut self, document: &str) -> TrackerResult<String> {
        let mut profile = parse_document(document)?;
        let at = now();
        profile.schema_version = SCHEMA_VERSION;
        profile.id = new_id();
        profile.created_at = at;
        profile.updated_at = at;
        profile.last_played_at = at;
        profile.data.player_stats.sanitize();
        profile.refresh_totals();
        let name = profile.name.clone();
        let id = self.profiles.insert(profile)?;
        log::info!("imported game profile `{name}`");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown profile, or a storage error.
    pub fn set_current(&mut self, id: Option<&str>) -> TrackerResult<()> {
        if let Some(id) = id {
            self.profiles.require(id)?;
        }
        storage::save_pointer(self.profiles.store(), keys::CURRENT_PROFILE_ID, id)?;
        self.current_id = id.map(str::to_string);
        Ok(())
    }
}

/// Decode and validate an exported profile document.
///
/// # Errors
///
/// Returns `MalformedData`, `UnsupportedSchema`, or a validation error for a
/// blank profile name.
pub fn parse_document(document: &str) -> TrackerResult<GameProfile> {
    let raw: serde_json::Value = serde_json::from_str(document)
        .map_err(|err| TrackerError::malformed("save-state document", err))?;
    let found = raw
        .get("schemaVersion")
        .and_then(serde_json::Value::as_u64)
        .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX));
    if found > SCHEMA_VERSION {
        return Err(TrackerError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    let profile: GameProfile = serde_json::from_value(raw)
        .map_err(|err| TrackerError::malformed("save-state document", err))?;
    require_name("profile name", &profile.name)?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objectives::{NewObjective, Objectives};
    use crate::storage::MemoryStore;

    fn seeded() -> (MemoryStore, GameProfiles<MemoryStore>) {
        let store = MemoryStore::new();
        let mut objectives = Objectives::open(store.clone());
        let mut stats = PlayerStats::default();
        let id = objectives.add(NewObjective::new("Find the map")).unwrap();
        objectives.add(NewObjective::new("Cross the river")).unwrap();
        objectives.complete(&id, &mut stats).unwrap();
        storage::save_json(&store, keys::PLAYER_STATS, &stats).unwrap();
        let profiles = GameProfiles::open(store.clone());
        (store, profiles)
    }

    #[test]
    fn create_snapshots_live_data_and_becomes_current() {
        let (store, mut profiles) = seeded();
        let id = profiles.create("Run 1", None).unwrap();
        let profile = profiles.get(&id).unwrap();
        assert_eq!(profile.total_objectives, 2);
        assert_eq!(profile.completed_objectives, 1);
        assert_eq!(profile.data.player_stats.xp, 100);
        assert_eq!(profile.data.mission_categories.len(), 6);
        assert_eq!(profiles.current().map(|p| p.id.as_str()), Some(id.as_str()));
        assert_eq!(store.get(keys::CURRENT_PROFILE_ID), Some(id));
    }

    #[test]
    fn load_restores_snapshot_over_live_keys() {
        let (store, mut profiles) = seeded();
        let id = profiles.create("Run 1", None).unwrap();
        let mut objectives = Objectives::open(store.clone());
        objectives.add(NewObjective::new("Mutation")).unwrap();
        assert_eq!(Objectives::open(store.clone()).len(), 3);

        let signal = profiles.load(&id).unwrap();
        assert_eq!(signal.profile_id, id);
        objectives.reload();
        assert_eq!(objectives.len(), 2);
        assert!(objectives.list().iter().all(|o| o.name != "Mutation"));
    }

    #[test]
    fn load_of_unknown_profile_changes_nothing() {
        let (store, mut profiles) = seeded();
        let before = store.get(keys::OBJECTIVES);
        assert!(profiles.load("ghost").unwrap_err().is_not_found());
        assert_eq!(store.get(keys::OBJECTIVES), before);
        assert!(profiles.current().is_none());
    }

    #[test]
    fn save_recomputes_totals_from_live_data() {
        let (store, mut profiles) = seeded();
        let id = profiles.create("Run 1", None).unwrap();
        let mut objectives = Objectives::open(store);
        let mut stats = PlayerStats::default();
        let open = objectives.list()[1].id.clone();
        objectives.complete(&open, &mut stats).unwrap();
        profiles.save_current().unwrap();
        assert_eq!(profiles.get(&id).unwrap().completed_objectives, 2);
    }

    #[test]
    fn save_without_current_is_not_found() {
        let (_, mut profiles) = seeded();
        assert!(profiles.save_current().unwrap_err().is_not_found());
    }

    #[test]
    fn export_import_round_trip_keeps_data() {
        let (_, mut profiles) = seeded();
        let id = profiles.create("Run 1", Some("first try")).unwrap();
        let document = profiles.export(&id).unwrap();
        let copy = profiles.import(&document).unwrap();
        assert_ne!(copy, id);
        let (original, imported) = (profiles.get(&id).unwrap(), profiles.get(&copy).unwrap());
        assert_eq!(original.data, imported.data);
        assert_eq!(original.name, imported.name);
        // Import never switches the current profile.
        assert_eq!(profiles.current().map(|p| p.id.clone()), Some(id));
    }

    #[test]
    fn malformed_and_future_documents_are_rejected() {
        let (_, mut profiles) = seeded();
        assert!(matches!(
            profiles.import("{ nope"),
            Err(TrackerError::MalformedData { .. })
        ));
        assert!(matches!(
            profiles.import(r#"{"schemaVersion": 9, "name": "Future"}"#),
            Err(TrackerError::UnsupportedSchema { found: 9, .. })
        ));
        assert!(matches!(
            profiles.import(r#"{"name": "No timestamps"}"#),
            Err(TrackerError::MalformedData { .. })
        ));
        assert!(profiles.list().is_empty());
    }

    #[test]
    fn deleting_current_keeps_live_data() {
        let (store, mut profiles) = seeded();
        let id = profiles.create("Run 1", None).unwrap();
        profiles.delete(&id).unwrap();
        assert!(profiles.current().is_none());
        assert!(store.get(keys::CURRENT_PROFILE_ID).is_none());
        assert_eq!(Objectives::open(store).len(), 2);
    }

    #[test]
    fn duplicate_leaves_current_alone() {
        let (_, mut profiles) = seeded();
        let id = profiles.create("Run 1", None).unwrap();
        let copy = profiles.duplicate(&id, "Run 1 (alt)").unwrap();
        assert_eq!(profiles.get(&copy).unwrap().data, profiles.get(&id).unwrap().data);
        assert_eq!(profiles.current().map(|p| p.id.clone()), Some(id));
    }

    #[test]
    fn export_file_names_are_sanitized() {
        let (_, mut profiles) = seeded();
        let id = profiles.create("Hard mode: run #2", None).unwrap();
        assert_eq!(
            profiles.export_file_name(&id).unwrap(),
            "Hard_mode__run__2_profile.json"
        );
    }
}
