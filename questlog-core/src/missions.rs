//! Missions group objectives under a category and carry bonus rewards.
use serde::{Deserialize, Serialize};

use crate::error::{TrackerResult, require_name};
use crate::inventory::NewItem;
use crate::player::PlayerStats;
use crate::records::{Collection, Location, Record, Timestamp, new_id, now};
use crate::rewards::{Reward, RewardGrant, RewardPolicy, Rewarded, apply_completion_reward};
use crate::storage::{KeyValueStore, keys};

pub const DEFAULT_MISSION_XP: u32 = 500;

fn default_mission_xp() -> RewardPolicy {
    RewardPolicy::on_completion(DEFAULT_MISSION_XP)
}

/// Category for stored records written without one.
pub const DEFAULT_MISSION_CATEGORY: &str = "Generic";

fn default_mission_category() -> String {
    DEFAULT_MISSION_CATEGORY.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissionKind {
    Kill,
    Dungeon,
    Resource,
    Collection,
    Achievement,
    Custom,
    #[default]
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: MissionKind,
    #[serde(default = "default_mission_category")]
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_mission_xp")]
    pub xp_reward: RewardPolicy,
    #[serde(default)]
    pub gold_reward: RewardPolicy,
    #[serde(default)]
    pub total_gold_earned: u64,
    /// Weak references into the objective list; misses are tolerated.
    #[serde(default)]
    pub objective_ids: Vec<String>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl Record for Mission {
    const KIND: &'static str = "mission";
    const STORAGE_KEY: &'static str = keys::MISSIONS;

    fn id(&self) -> &str {
        &self.id
    }

    fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

impl Rewarded for Mission {
    fn gold_reward(&self) -> RewardPolicy {
        self.gold_reward
    }

    fn xp_reward(&self) -> RewardPolicy {
        self.xp_reward
    }

    fn total_gold_earned_mut(&mut self) -> &mut u64 {
        &mut self.total_gold_earned
    }
}

/// Everything a mission completion produced that other collections act on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MissionCompletion {
    pub grant: RewardGrant,
    pub objective_ids: Vec<String>,
    /// Non-XP rewards, to be stacked into the inventory.
    pub item_rewards: Vec<NewItem>,
}

#[derive(Debug, Clone)]
pub struct NewMission {
    pub name: String,
    pub description: String,
    pub kind: MissionKind,
    pub category: String,
    pub xp_reward: RewardPolicy,
    pub gold_reward: RewardPolicy,
    pub objective_ids: Vec<String>,
    pub rewards: Vec<Reward>,
    pub location: Option<Location>,
    pub image_url: Option<String>,
    pub expires_at: Option<Timestamp>,
}

impl NewMission {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: MissionKind::default(),
            category: category.into(),
            xp_reward: default_mission_xp(),
            gold_reward: RewardPolicy::NONE,
            objective_ids: Vec::new(),
            rewards: Vec::new(),
            location: None,
            image_url: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: MissionKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn with_gold(mut self, policy: RewardPolicy) -> Self {
        self.gold_reward = policy;
        self
    }

    #[must_use]
    pub const fn with_xp(mut self, policy: RewardPolicy) -> Self {
        self.xp_reward = policy;
        self
    }

    #[must_use]
    pub fn with_objective(mut self, objective_id: impl Into<String>) -> Self {
        self.objective_ids.push(objective_id.into());
        self
    }

    #[must_use]
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.rewards.push(reward);
        self
    }

    fn build(self, at: Timestamp) -> TrackerResult<Mission> {
        require_name("mission name", &self.name)?;
        require_name("mission category", &self.category)?;
        Ok(Mission {
            id: new_id(),
            name: self.name,
            description: self.description,
            kind: self.kind,
            category: self.category.trim().to_string(),
            completed: false,
            xp_reward: self.xp_reward,
            gold_reward: self.gold_reward,
            total_gold_earned: 0,
            objective_ids: self.objective_ids,
            rewards: self.rewards,
            location: self.location,
            image_url: self.image_url,
            created_at: at,
            updated_at: at,
            completed_at: None,
            expires_at: self.expires_at,
        })
    }
}

/// Partial update. Attached rewards are not editable; see
/// [`Collection::add_reward`].
#[derive(Debug, Clone, Default)]
pub struct MissionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<MissionKind>,
    pub category: Option<String>,
    pub xp_reward: Option<RewardPolicy>,
    pub gold_reward: Option<RewardPolicy>,
    pub objective_ids: Option<Vec<String>>,
    pub location: Option<Option<Location>>,
    pub image_url: Option<Option<String>>,
    pub expires_at: Option<Option<Timestamp>>,
}

impl MissionPatch {
    fn apply(self, mission: &mut Mission) -> TrackerResult<()> {
        if let Some(name) = self.name {
            require_name("mission name", &name)?;
            mission.name = name;
        }
        if let Some(category) = self.category {
            require_name("mission category", &category)?;
            mission.category = category.trim().to_string();
        }
        if let Some(description) = self.description {
            mission.description = description;
        }
        if let Some(kind) = self.kind {
            mission.kind = kind;
        }
        if let Some(xp) = self.xp_reward {
            mission.xp_reward = xp;
        }
        if let Some(gold) = self.gold_reward {
            mission.gold_reward = gold;
        }
        if let Some(ids) = self.objective_ids {
            mission.objective_ids = ids;
        }
        if let Some(location) = self.location {
            mission.location = location;
        }
        if let Some(image_url) = self.image_url {
            mission.image_url = image_url;
        }
        if let Some(expires_at) = self.expires_at {
            mission.expires_at = expires_at;
        }
        Ok(())
    }
}

pub type Missions<S> = Collection<Mission, S>;

impl<S: KeyValueStore> Collection<Mission, S> {
    /// # Errors
    ///
    /// Returns a validation error for a blank name or category, or a storage
    /// error.
    pub fn add(&mut self, mission: NewMission) -> TrackerResult<String> {
        self.insert(mission.build(now())?)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn update(&mut self, id: &str, patch: MissionPatch) -> TrackerResult<()> {
        self.modify(id, |mission| patch.apply(mission))
    }

    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn add_reward(&mut self, id: &str, reward: Reward) -> TrackerResult<()> {
        self.modify(id, |mission| {
            mission.rewards.push(reward);
            Ok(())
        })
    }

    /// Reference an objective. Linking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn link_objective(&mut self, id: &str, objective_id: &str) -> TrackerResult<()> {
        self.modify(id, |mission| {
            if !mission.objective_ids.iter().any(|known| known == objective_id) {
                mission.objective_ids.push(objective_id.to_string());
            }
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn unlink_objective(&mut self, id: &str, objective_id: &str) -> TrackerResult<()> {
        self.modify(id, |mission| {
            mission.objective_ids.retain(|known| known != objective_id);
            Ok(())
        })
    }

    /// Mark a mission complete, pay its reward policy and its XP rewards, and
    /// hand back the objectives and items the caller should settle.
    /// Completing an already-completed mission is a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn complete(
        &mut self,
        id: &str,
        stats: &mut PlayerStats,
    ) -> TrackerResult<Option<MissionCompletion>> {
        if self.require(id)?.completed {
            log::debug!("mission `{id}` already completed");
            return Ok(None);
        }
        self.modify_rewarding(id, stats, |mission, stats| {
            mission.completed = true;
            mission.completed_at = Some(now());
            let mut grant = apply_completion_reward(mission, stats);
            let mut item_rewards = Vec::new();
            for reward in &mission.rewards {
                match reward.as_item() {
                    Some(item) => item_rewards.push(item),
                    None => {
                        let xp = u64::from(reward.amount);
                        grant += RewardGrant {
                            gold: 0,
                            xp,
                            levels_gained: stats.add_xp(xp),
                        };
                    }
                }
            }
            log::info!("mission `{}` completed", mission.name);
            Ok(Some(MissionCompletion {
                grant,
                objective_ids: mission.objective_ids.clone(),
                item_rewards,
            }))
        })
    }

    #[must_use]
    pub fn in_category(&self, category: &str) -> Vec<&Mission> {
        self.list()
            .iter()
            .filter(|mission| mission.category == category)
            .collect()
    }
}

impl Mission {
    /// Referenced objective ids for which `exists` returns false.
    pub fn dangling_objectives<'a>(
        &'a self,
        exists: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.objective_ids
            .iter()
            .map(String::as_str)
            .filter(move |id| !exists(*id))
    }
}
