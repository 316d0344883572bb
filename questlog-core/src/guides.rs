//! Guides: ordered walkthroughs whose steps point at missions.
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult, require_name};
use crate::player::PlayerStats;
use crate::records::{Collection, Location, Record, Timestamp, new_id, now};
use crate::rewards::{RewardGrant, RewardPolicy, Rewarded, apply_completion_reward};
use crate::storage::{KeyValueStore, keys};

pub const DEFAULT_GUIDE_XP: u32 = 1000;

fn default_guide_xp() -> RewardPolicy {
    RewardPolicy::on_completion(DEFAULT_GUIDE_XP)
}

/// Category for stored records written without one.
pub const DEFAULT_GUIDE_CATEGORY: &str = "Beginner";

fn default_guide_category() -> String {
    DEFAULT_GUIDE_CATEGORY.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideStep {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Weak references into the mission list.
    #[serde(default)]
    pub mission_ids: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub gold_reward: RewardPolicy,
    #[serde(default)]
    pub total_gold_earned: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Rewarded for GuideStep {
    fn gold_reward(&self) -> RewardPolicy {
        self.gold_reward
    }

    fn total_gold_earned_mut(&mut self) -> &mut u64 {
        &mut self.total_gold_earned
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_guide_category")]
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_guide_xp")]
    pub xp_reward: RewardPolicy,
    #[serde(default)]
    pub gold_reward: RewardPolicy,
    #[serde(default)]
    pub total_gold_earned: u64,
    #[serde(default)]
    pub steps: Vec<GuideStep>,
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

impl Record for Guide {
    const KIND: &'static str = "guide";
    const STORAGE_KEY: &'static str = keys::GUIDES;

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

impl Rewarded for Guide {
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

impl Guide {
    #[must_use]
    pub fn step(&self, step_id: &str) -> Option<&GuideStep> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    /// `(completed, total)` step counts.
    #[must_use]
    pub fn step_progress(&self) -> (usize, usize) {
        let done = self.steps.iter().filter(|step| step.completed).count();
        (done, self.steps.len())
    }

    fn step_mut(&mut self, step_id: &str) -> TrackerResult<&mut GuideStep> {
        self.steps
            .iter_mut()
            .find(|step| step.id == step_id)
            .ok_or_else(|| TrackerError::not_found("guide step", step_id))
    }

    fn finish_step(step: &mut GuideStep, stats: &mut PlayerStats, progress: &mut GuideProgress) {
        step.completed = true;
        progress.grant += apply_completion_reward(step, stats);
        progress.mission_ids.extend(step.mission_ids.iter().cloned());
    }

    /// Complete the guide itself once no step is left open.
    fn settle(&mut self, stats: &mut PlayerStats, progress: &mut GuideProgress, at: Timestamp) {
        if !self.completed && self.steps.iter().all(|step| step.completed) {
            self.completed = true;
            self.completed_at = Some(at);
            progress.grant += apply_completion_reward(self, stats);
            progress.guide_completed = true;
            log::info!("guide `{}` completed", self.name);
        }
    }
}

/// What a step or guide completion produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuideProgress {
    pub grant: RewardGrant,
    /// Missions referenced by the newly completed steps.
    pub mission_ids: Vec<String>,
    pub guide_completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewGuideStep {
    pub name: String,
    pub description: String,
    pub mission_ids: Vec<String>,
    pub gold_reward: RewardPolicy,
    pub location: Option<Location>,
}

impl NewGuideStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mission(mut self, mission_id: impl Into<String>) -> Self {
        self.mission_ids.push(mission_id.into());
        self
    }

    #[must_use]
    pub const fn with_gold(mut self, policy: RewardPolicy) -> Self {
        self.gold_reward = policy;
        self
    }

    fn build(self) -> TrackerResult<GuideStep> {
        require_name("step name", &self.name)?;
        Ok(GuideStep {
            id: new_id(),
            name: self.name,
            description: self.description,
            mission_ids: self.mission_ids,
            completed: false,
            gold_reward: self.gold_reward,
            total_gold_earned: 0,
            location: self.location,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewGuide {
    pub name: String,
    pub description: String,
    pub category: String,
    pub xp_reward: RewardPolicy,
    pub gold_reward: RewardPolicy,
    pub steps: Vec<NewGuideStep>,
    pub location: Option<Location>,
    pub image_url: Option<String>,
    pub expires_at: Option<Timestamp>,
}

impl NewGuide {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: category.into(),
            xp_reward: default_guide_xp(),
            gold_reward: RewardPolicy::NONE,
            steps: Vec::new(),
            location: None,
            image_url: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_step(mut self, step: NewGuideStep) -> Self {
        self.steps.push(step);
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

    fn build(self, at: Timestamp) -> TrackerResult<Guide> {
        require_name("guide name", &self.name)?;
        require_name("guide category", &self.category)?;
        let steps = self
            .steps
            .into_iter()
            .map(NewGuideStep::build)
            .collect::<TrackerResult<Vec<_>>>()?;
        Ok(Guide {
            id: new_id(),
            name: self.name,
            description: self.description,
            category: self.category.trim().to_string(),
            completed: false,
            xp_reward: self.xp_reward,
            gold_reward: self.gold_reward,
            total_gold_earned: 0,
            steps,
            location: self.location,
            image_url: self.image_url,
            created_at: at,
            updated_at: at,
            completed_at: None,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct GuidePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub xp_reward: Option<RewardPolicy>,
    pub gold_reward: Option<RewardPolicy>,
    pub location: Option<Option<Location>>,
    pub image_url: Option<Option<String>>,
    pub expires_at: Option<Option<Timestamp>>,
}

pub type Guides<S> = Collection<Guide, S>;

impl<S: KeyValueStore> Collection<Guide, S> {
    /// # Errors
    ///
    /// Returns a validation error for a blank name, category or step name,
    /// or a storage error.
    pub fn add(&mut self, guide: NewGuide) -> TrackerResult<String> {
        self.insert(guide.build(now())?)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn update(&mut self, id: &str, patch: GuidePatch) -> TrackerResult<()> {
        self.modify(id, |guide| {
            if let Some(name) = patch.name {
                require_name("guide name", &name)?;
                guide.name = name;
            }
            if let Some(category) = patch.category {
                require_name("guide category", &category)?;
                guide.category = category.trim().to_string();
            }
            if let Some(description) = patch.description {
                guide.description = description;
            }
            if let Some(xp) = patch.xp_reward {
                guide.xp_reward = xp;
            }
            if let Some(gold) = patch.gold_reward {
                guide.gold_reward = gold;
            }
            if let Some(location) = patch.location {
                guide.location = location;
            }
            if let Some(image_url) = patch.image_url {
                guide.image_url = image_url;
            }
            if let Some(expires_at) = patch.expires_at {
                guide.expires_at = expires_at;
            }
            Ok(())
        })
    }

    /// Append a step. A completed guide gains an open step but stays completed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn add_step(&mut self, id: &str, step: NewGuideStep) -> TrackerResult<String> {
        let step = step.build()?;
        let step_id = step.id.clone();
        self.modify(id, |guide| {
            guide.steps.push(step);
            Ok(())
        })?;
        Ok(step_id)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown guide or step, or a storage error.
    pub fn remove_step(&mut self, id: &str, step_id: &str) -> TrackerResult<()> {
        self.modify(id, |guide| {
            let before = guide.steps.len();
            guide.steps.retain(|step| step.id != step_id);
            if guide.steps.len() == before {
                return Err(TrackerError::not_found("guide step", step_id));
            }
            Ok(())
        })
    }

    /// Complete one step, paying its gold, and complete the guide when it was
    /// the last open step. Returns `None` if the step was already complete.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown guide or step, or a storage error.
    pub fn complete_step(
        &mut self,
        id: &str,
        step_id: &str,
        stats: &mut PlayerStats,
    ) -> TrackerResult<Option<GuideProgress>> {
        let guide = self.require(id)?;
        let step = guide
            .step(step_id)
            .ok_or_else(|| TrackerError::not_found("guide step", step_id))?;
        if step.completed {
            return Ok(None);
        }
        self.modify_rewarding(id, stats, |guide, stats| {
            let mut progress = GuideProgress::default();
            Guide::finish_step(guide.step_mut(step_id)?, stats, &mut progress);
            guide.settle(stats, &mut progress, now());
            Ok(Some(progress))
        })
    }

    /// Complete every open step, then the guide. Returns `None` if the guide
    /// was already complete.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn complete(
        &mut self,
        id: &str,
        stats: &mut PlayerStats,
    ) -> TrackerResult<Option<GuideProgress>> {
        if self.require(id)?.completed {
            log::debug!("guide `{id}` already completed");
            return Ok(None);
        }
        self.modify_rewarding(id, stats, |guide, stats| {
            let mut progress = GuideProgress::default();
            for step in guide.steps.iter_mut().filter(|step| !step.completed) {
                Guide::finish_step(step, stats, &mut progress);
            }
            guide.settle(stats, &mut progress, now());
            Ok(Some(progress))
        })
    }
}
