//! Questlog Core
//!
//! Platform-agnostic data layer for the Questlog game-progress tracker.
//! Every collection is a JSON document under a fixed key of a
//! [`KeyValueStore`]; the browser shell supplies local storage and tests use
//! [`MemoryStore`].

pub mod categories;
pub mod error;
pub mod game_profiles;
pub mod guides;
pub mod inventory;
pub mod missions;
pub mod objectives;
pub mod player;
pub mod quick_missions;
pub mod records;
pub mod rewards;
pub mod session_profiles;
pub mod stats;
pub mod storage;
pub mod tracker;

// Re-export commonly used types
pub use categories::{CategoryRegistry, DEFAULT_GUIDE_CATEGORIES, DEFAULT_MISSION_CATEGORIES};
pub use error::{TrackerError, TrackerResult};
pub use game_profiles::{
    GameProfile, GameProfilePatch, GameProfiles, LiveData, ReloadRequired, SCHEMA_VERSION,
    parse_document,
};
pub use guides::{Guide, GuidePatch, GuideProgress, GuideStep, Guides, NewGuide, NewGuideStep};
pub use inventory::{Inventory, InventoryItem, ItemKind, ItemPatch, NewItem};
pub use missions::{Mission, MissionCompletion, MissionKind, MissionPatch, Missions, NewMission};
pub use objectives::{
    NewObjective, NewPhase, NewSubObjective, Objective, ObjectiveKind, ObjectivePatch,
    ObjectivePhase, Objectives, Repetition, SubObjective,
};
pub use player::{Player, PlayerStats};
pub use quick_missions::{QuickMission, QuickMissions, QuickObjective, QuickPhase};
pub use records::{Collection, Location, Record, Timestamp};
pub use rewards::{Reward, RewardGrant, RewardKind, RewardPolicy, Rewarded};
pub use session_profiles::{
    ContentKind, ProfileStats, SessionProfile, SessionProfilePatch, SessionProfiles,
};
pub use stats::{CollectionSummary, DashboardStats, ObjectiveProgress};
pub use storage::{KeyValueStore, MemoryStore, StorageError, keys};
pub use tracker::Tracker;
