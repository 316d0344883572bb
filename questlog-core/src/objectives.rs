//! Objectives: the smallest trackable goal, optionally broken into phases of
//! measurable sub-objectives.
//!
//! Sub-objective changes cascade upward inside the same operation. A phase is
//! complete when all of its sub-objectives are; the objective completes, and
//! pays its own reward, once every phase is complete.
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult, require_name};
use crate::player::PlayerStats;
use crate::records::{Collection, Location, Record, Timestamp, new_id, now};
use crate::rewards::{
    RewardGrant, RewardPolicy, Rewarded, apply_completion_reward, apply_progress_reward,
};
use crate::storage::{KeyValueStore, keys};

pub const DEFAULT_OBJECTIVE_XP: u32 = 100;
pub const DEFAULT_TARGET_VALUE: u32 = 100;

fn default_objective_xp() -> RewardPolicy {
    RewardPolicy::on_completion(DEFAULT_OBJECTIVE_XP)
}

const fn default_target_value() -> u32 {
    DEFAULT_TARGET_VALUE
}

/// Repeat limits shared by phases and sub-objectives. An infinite loop
/// ignores `max_repetitions`; a missing maximum means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Repetition {
    pub is_repeatable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_repetitions: Option<u32>,
    pub current_repetitions: u32,
    pub is_infinite_loop: bool,
}

impl Repetition {
    #[must_use]
    pub const fn limited(max_repetitions: Option<u32>) -> Self {
        Self {
            is_repeatable: true,
            max_repetitions,
            current_repetitions: 0,
            is_infinite_loop: false,
        }
    }

    #[must_use]
    pub const fn infinite() -> Self {
        Self {
            is_repeatable: true,
            max_repetitions: None,
            current_repetitions: 0,
            is_infinite_loop: true,
        }
    }

    #[must_use]
    pub fn can_repeat(&self) -> bool {
        self.is_repeatable
            && (self.is_infinite_loop
                || self
                    .max_repetitions
                    .is_none_or(|max| self.current_repetitions < max))
    }

    fn record_repeat(&mut self, label: &str, name: &str) -> TrackerResult<u32> {
        if !self.is_repeatable {
            return Err(TrackerError::validation(format!(
                "{label} `{name}` is not repeatable"
            )));
        }
        if !self.can_repeat() {
            return Err(TrackerError::validation(format!(
                "{label} `{name}` reached its repetition limit"
            )));
        }
        self.current_repetitions += 1;
        Ok(self.current_repetitions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    Collection,
    Steps,
    Percentage,
    #[default]
    Custom,
    Kill,
    Resource,
    Dungeon,
    Achievement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubObjective {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub current_value: u32,
    #[serde(default = "default_target_value")]
    pub target_value: u32,
    #[serde(default)]
    pub xp_reward: RewardPolicy,
    #[serde(default)]
    pub gold_reward: RewardPolicy,
    #[serde(default)]
    pub total_gold_earned: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(flatten)]
    pub repetition: Repetition,
}

impl Rewarded for SubObjective {
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectivePhase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub sub_objectives: Vec<SubObjective>,
    #[serde(default)]
    pub xp_reward: RewardPolicy,
    #[serde(default)]
    pub gold_reward: RewardPolicy,
    #[serde(default)]
    pub total_gold_earned: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(flatten)]
    pub repetition: Repetition,
}

impl Rewarded for ObjectivePhase {
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

impl ObjectivePhase {
    fn sub(&self, sub_id: &str) -> TrackerResult<&SubObjective> {
        self.sub_objectives
            .iter()
            .find(|sub| sub.id == sub_id)
            .ok_or_else(|| TrackerError::not_found("sub-objective", sub_id))
    }

    fn sub_mut(&mut self, sub_id: &str) -> TrackerResult<&mut SubObjective> {
        self.sub_objectives
            .iter_mut()
            .find(|sub| sub.id == sub_id)
            .ok_or_else(|| TrackerError::not_found("sub-objective", sub_id))
    }

    fn clear_progress(&mut self) {
        self.completed = false;
        for sub in &mut self.sub_objectives {
            sub.completed = false;
            sub.current_value = 0;
        }
    }

    fn settle(&mut self, stats: &mut PlayerStats) -> RewardGrant {
        let done = self.sub_objectives.iter().all(|sub| sub.completed);
        let grant = if done && !self.completed {
            apply_completion_reward(self, stats)
        } else {
            RewardGrant::default()
        };
        self.completed = done;
        grant
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: ObjectiveKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_objective_xp")]
    pub xp_reward: RewardPolicy,
    #[serde(default)]
    pub gold_reward: RewardPolicy,
    #[serde(default)]
    pub total_gold_earned: u64,
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
    #[serde(default)]
    pub is_repeatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completions: Option<u32>,
    #[serde(default)]
    pub current_completions: u32,
    #[serde(default)]
    pub phases: Vec<ObjectivePhase>,
    #[serde(default)]
    pub current_phase_index: usize,
}

impl Record for Objective {
    const KIND: &'static str = "objective";
    const STORAGE_KEY: &'static str = keys::OBJECTIVES;

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

impl Rewarded for Objective {
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

impl Objective {
    /// `(completed, total)` sub-objective counts across all phases.
    #[must_use]
    pub fn sub_objective_progress(&self) -> (usize, usize) {
        self.phases
            .iter()
            .flat_map(|phase| &phase.sub_objectives)
            .fold((0, 0), |(done, total), sub| {
                (done + usize::from(sub.completed), total + 1)
            })
    }

    #[must_use]
    pub fn current_phase(&self) -> Option<&ObjectivePhase> {
        self.phases.get(self.current_phase_index)
    }

    fn phase_index(&self, phase_id: &str) -> TrackerResult<usize> {
        self.phases
            .iter()
            .position(|phase| phase.id == phase_id)
            .ok_or_else(|| TrackerError::not_found("phase", phase_id))
    }

    fn sub_objective(&self, phase_id: &str, sub_id: &str) -> TrackerResult<&SubObjective> {
        let idx = self.phase_index(phase_id)?;
        self.phases[idx].sub(sub_id)
    }

    fn finish(&mut self, stats: &mut PlayerStats, at: Timestamp) -> RewardGrant {
        self.completed = true;
        self.completed_at = Some(at);
        apply_completion_reward(self, stats)
    }

    /// Re-derive completion after a sub-objective in `phase_idx` changed.
    /// Phases without sub-objectives are complete as soon as anything
    /// settles, and the current phase moves past every completed one.
    fn settle(&mut self, phase_idx: usize, stats: &mut PlayerStats, at: Timestamp) -> RewardGrant {
        let mut grant = self.phases[phase_idx].settle(stats);
        for phase in &mut self.phases {
            if phase.sub_objectives.is_empty() {
                grant += phase.settle(stats);
            }
        }

        while self.current_phase().is_some_and(|phase| phase.completed)
            && self.current_phase_index + 1 < self.phases.len()
        {
            self.current_phase_index += 1;
        }
        if !self.completed && self.phases.iter().all(|phase| phase.completed) {
            grant += self.finish(stats, at);
        }
        grant
    }

    /// Re-derive a phase's flag after progress was cleared, without paying
    /// anything, and make the earliest open phase current.
    fn reopen(&mut self, phase_idx: usize) {
        let phase = &mut self.phases[phase_idx];
        phase.completed =
            !phase.sub_objectives.is_empty() && phase.sub_objectives.iter().all(|sub| sub.completed);
        if !phase.completed {
            self.current_phase_index = self.current_phase_index.min(phase_idx);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSubObjective {
    pub name: String,
    pub description: String,
    pub target_value: Option<u32>,
    pub xp_reward: RewardPolicy,
    pub gold_reward: RewardPolicy,
    pub location: Option<Location>,
    pub repetition: Repetition,
}

impl NewSubObjective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn build(self) -> TrackerResult<SubObjective> {
        require_name("sub-objective name", &self.name)?;
        Ok(SubObjective {
            id: new_id(),
            name: self.name,
            description: self.description,
            completed: false,
            current_value: 0,
            target_value: self.target_value.unwrap_or(DEFAULT_TARGET_VALUE).max(1),
            xp_reward: self.xp_reward,
            gold_reward: self.gold_reward,
            total_gold_earned: 0,
            location: self.location,
            repetition: Repetition {
                current_repetitions: 0,
                ..self.repetition
            },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewPhase {
    pub name: String,
    pub description: String,
    pub xp_reward: RewardPolicy,
    pub gold_reward: RewardPolicy,
    pub location: Option<Location>,
    pub repetition: Repetition,
    pub sub_objectives: Vec<NewSubObjective>,
}

impl NewPhase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sub_objective(mut self, sub: NewSubObjective) -> Self {
        self.sub_objectives.push(sub);
        self
    }

    fn build(self) -> TrackerResult<ObjectivePhase> {
        require_name("phase name", &self.name)?;
        let sub_objectives = self
            .sub_objectives
            .into_iter()
            .map(NewSubObjective::build)
            .collect::<TrackerResult<Vec<_>>>()?;
        Ok(ObjectivePhase {
            id: new_id(),
            name: self.name,
            description: self.description,
            completed: false,
            sub_objectives,
            xp_reward: self.xp_reward,
            gold_reward: self.gold_reward,
            total_gold_earned: 0,
            location: self.location,
            repetition: Repetition {
                current_repetitions: 0,
                ..self.repetition
            },
        })
    }
}

/// Fields for a new objective. Rewards default to 100 XP and no gold.
#[derive(Debug, Clone)]
pub struct NewObjective {
    pub name: String,
    pub description: String,
    pub kind: ObjectiveKind,
    pub category: Option<String>,
    pub xp_reward: RewardPolicy,
    pub gold_reward: RewardPolicy,
    pub location: Option<Location>,
    pub image_url: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub is_repeatable: bool,
    pub max_completions: Option<u32>,
    pub phases: Vec<NewPhase>,
}

impl Default for NewObjective {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            kind: ObjectiveKind::default(),
            category: None,
            xp_reward: default_objective_xp(),
            gold_reward: RewardPolicy::NONE,
            location: None,
            image_url: None,
            expires_at: None,
            is_repeatable: false,
            max_completions: None,
            phases: Vec::new(),
        }
    }
}

impl NewObjective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
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
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_phase(mut self, phase: NewPhase) -> Self {
        self.phases.push(phase);
        self
    }

    #[must_use]
    pub const fn repeatable(mut self, max_completions: Option<u32>) -> Self {
        self.is_repeatable = true;
        self.max_completions = max_completions;
        self
    }

    fn build(self, at: Timestamp) -> TrackerResult<Objective> {
        require_name("objective name", &self.name)?;
        let phases = self
            .phases
            .into_iter()
            .map(NewPhase::build)
            .collect::<TrackerResult<Vec<_>>>()?;
        Ok(Objective {
            id: new_id(),
            name: self.name,
            description: self.description,
            kind: self.kind,
            category: self.category.filter(|c| !c.trim().is_empty()),
            completed: false,
            xp_reward: self.xp_reward,
            gold_reward: self.gold_reward,
            total_gold_earned: 0,
            location: self.location,
            image_url: self.image_url,
            created_at: at,
            updated_at: at,
            completed_at: None,
            expires_at: self.expires_at,
            is_repeatable: self.is_repeatable,
            max_completions: self.max_completions,
            current_completions: 0,
            phases,
            current_phase_index: 0,
        })
    }
}

/// Partial update; nested `Option`s clear optional fields with `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct ObjectivePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ObjectiveKind>,
    pub category: Option<Option<String>>,
    pub xp_reward: Option<RewardPolicy>,
    pub gold_reward: Option<RewardPolicy>,
    pub location: Option<Option<Location>>,
    pub image_url: Option<Option<String>>,
    pub expires_at: Option<Option<Timestamp>>,
    pub is_repeatable: Option<bool>,
    pub max_completions: Option<Option<u32>>,
}

impl ObjectivePatch {
    fn apply(self, objective: &mut Objective) -> TrackerResult<()> {
        if let Some(name) = self.name {
            require_name("objective name", &name)?;
            objective.name = name;
        }
        if let Some(description) = self.description {
            objective.description = description;
        }
        if let Some(kind) = self.kind {
            objective.kind = kind;
        }
        if let Some(category) = self.category {
            objective.category = category;
        }
        if let Some(xp) = self.xp_reward {
            objective.xp_reward = xp;
        }
        if let Some(gold) = self.gold_reward {
            objective.gold_reward = gold;
        }
        if let Some(location) = self.location {
            objective.location = location;
        }
        if let Some(image_url) = self.image_url {
            objective.image_url = image_url;
        }
        if let Some(expires_at) = self.expires_at {
            objective.expires_at = expires_at;
        }
        if let Some(repeatable) = self.is_repeatable {
            objective.is_repeatable = repeatable;
        }
        if let Some(max) = self.max_completions {
            objective.max_completions = max;
        }
        Ok(())
    }
}

pub type Objectives<S> = Collection<Objective, S>;

impl<S: KeyValueStore> Collection<Objective, S> {
    /// # Errors
    ///
    /// Returns a validation error for a blank objective, phase or
    /// sub-objective name, or a storage error.
    pub fn add(&mut self, objective: NewObjective) -> TrackerResult<String> {
        self.insert(objective.build(now())?)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn update(&mut self, id: &str, patch: ObjectivePatch) -> TrackerResult<()> {
        self.modify(id, |objective| patch.apply(objective))
    }

    /// Mark an objective complete and pay its completion reward.
    /// Completing an already-completed objective is a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn complete(
        &mut self,
        id: &str,
        stats: &mut PlayerStats,
    ) -> TrackerResult<Option<RewardGrant>> {
        if self.require(id)?.completed {
            log::debug!("objective `{id}` already completed");
            return Ok(None);
        }
        self.modify_rewarding(id, stats, |objective, stats| {
            Ok(Some(objective.finish(stats, now())))
        })
    }

    /// Complete one sub-objective and cascade into its phase and objective.
    /// Returns `None` if the sub-objective was already complete.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown objective, phase or sub-objective,
    /// or a storage error.
    pub fn complete_sub_objective(
        &mut self,
        id: &str,
        phase_id: &str,
        sub_id: &str,
        stats: &mut PlayerStats,
    ) -> TrackerResult<Option<RewardGrant>> {
        if self.require(id)?.sub_objective(phase_id, sub_id)?.completed {
            return Ok(None);
        }
        self.modify_rewarding(id, stats, |objective, stats| {
            let at = now();
            let idx = objective.phase_index(phase_id)?;
            let sub = objective.phases[idx].sub_mut(sub_id)?;
            sub.completed = true;
            sub.current_value = sub.target_value;
            let mut grant = apply_completion_reward(sub, stats);
            grant += objective.settle(idx, stats, at);
            Ok(Some(grant))
        })
    }

    /// Set a sub-objective's progress. The value is clamped to its target,
    /// per-point rewards are paid on the increase only, and completion is
    /// derived from reaching the target.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown objective, phase or sub-objective,
    /// or a storage error.
    pub fn record_progress(
        &mut self,
        id: &str,
        phase_id: &str,
        sub_id: &str,
        value: u32,
        stats: &mut PlayerStats,
    ) -> TrackerResult<RewardGrant> {
        self.modify_rewarding(id, stats, |objective, stats| {
            let at = now();
            let idx = objective.phase_index(phase_id)?;
            let sub = objective.phases[idx].sub_mut(sub_id)?;
            let value = value.min(sub.target_value);
            let gained = value.saturating_sub(sub.current_value);
            let mut grant = apply_progress_reward(sub, stats, gained);
            sub.current_value = value;
            sub.completed = value >= sub.target_value;
            grant += objective.settle(idx, stats, at);
            Ok(grant)
        })
    }

    /// Move past the current phase without completing it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn advance_phase(&mut self, id: &str) -> TrackerResult<usize> {
        self.modify(id, |objective| {
            if objective.current_phase_index + 1 < objective.phases.len() {
                objective.current_phase_index += 1;
            }
            Ok(objective.current_phase_index)
        })
    }

    /// Complete every open sub-objective of a phase, paying each one's
    /// completion reward, then the phase's own reward and the objective
    /// cascade. Returns `None` if the phase was already complete.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown objective or phase, or a storage
    /// error.
    pub fn complete_phase(
        &mut self,
        id: &str,
        phase_id: &str,
        stats: &mut PlayerStats,
    ) -> TrackerResult<Option<RewardGrant>> {
        let objective = self.require(id)?;
        if objective.phases[objective.phase_index(phase_id)?].completed {
            return Ok(None);
        }
        self.modify_rewarding(id, stats, |objective, stats| {
            let at = now();
            let idx = objective.phase_index(phase_id)?;
            let mut grant = RewardGrant::default();
            for sub in &mut objective.phases[idx].sub_objectives {
                if !sub.completed {
                    sub.completed = true;
                    sub.current_value = sub.target_value;
                    grant += apply_completion_reward(sub, stats);
                }
            }
            grant += objective.settle(idx, stats, at);
            Ok(Some(grant))
        })
    }

    /// Reopen a repeatable phase: its sub-objectives lose their progress and
    /// the phase becomes current again. Earned totals are kept. Returns the
    /// phase's repetition count.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the phase is not repeatable or has
    /// reached its limit, `NotFound`, or a storage error.
    pub fn reset_phase(&mut self, id: &str, phase_id: &str) -> TrackerResult<u32> {
        self.modify(id, |objective| {
            let idx = objective.phase_index(phase_id)?;
            let phase = &mut objective.phases[idx];
            let count = phase.repetition.record_repeat("phase", &phase.name)?;
            phase.clear_progress();
            objective.reopen(idx);
            Ok(count)
        })
    }

    /// Reopen a repeatable sub-objective and re-derive its phase. Earned
    /// totals are kept. Returns the sub-objective's repetition count.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the sub-objective is not repeatable or
    /// has reached its limit, `NotFound`, or a storage error.
    pub fn reset_sub_objective(
        &mut self,
        id: &str,
        phase_id: &str,
        sub_id: &str,
    ) -> TrackerResult<u32> {
        self.modify(id, |objective| {
            let idx = objective.phase_index(phase_id)?;
            let sub = objective.phases[idx].sub_mut(sub_id)?;
            let count = sub.repetition.record_repeat("sub-objective", &sub.name)?;
            sub.completed = false;
            sub.current_value = 0;
            objective.reopen(idx);
            Ok(count)
        })
    }

    /// Restart a repeatable objective. Earned totals are kept.
    /// Returns the new completion count.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the objective is not repeatable or has
    /// reached its completion limit, `NotFound`, or a storage error.
    pub fn reset(&mut self, id: &str) -> TrackerResult<u32> {
        let objective = self.require(id)?;
        if !objective.is_repeatable {
            return Err(TrackerError::validation(format!(
                "objective `{}` is not repeatable",
                objective.name
            )));
        }
        if let Some(max) = objective.max_completions
            && objective.current_completions >= max
        {
            return Err(TrackerError::validation(format!(
                "objective `{}` reached its limit of {max} completions",
                objective.name
            )));
        }
        self.modify(id, |objective| {
            objective.completed = false;
            objective.completed_at = None;
            objective.current_phase_index = 0;
            objective.phases.iter_mut().for_each(ObjectivePhase::clear_progress);
            objective.current_completions += 1;
            Ok(objective.current_completions)
        })
    }

    /// Copy an objective as "<name> (Copy)" with fresh ids and no progress.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn duplicate(&mut self, id: &str) -> TrackerResult<String> {
        let at = now();
        let mut copy = self.require(id)?.clone();
        copy.id = new_id();
        copy.name = format!("{} (Copy)", copy.name);
        copy.completed = false;
        copy.completed_at = None;
        copy.total_gold_earned = 0;
        copy.current_completions = 0;
        copy.current_phase_index = 0;
        copy.created_at = at;
        copy.updated_at = at;
        for phase in &mut copy.phases {
            phase.id = new_id();
            phase.total_gold_earned = 0;
            phase.repetition.current_repetitions = 0;
            phase.clear_progress();
            for sub in &mut phase.sub_objectives {
                sub.id = new_id();
                sub.total_gold_earned = 0;
                sub.repetition.current_repetitions = 0;
            }
        }
        self.insert(copy)
    }

    /// Distinct categories used by objectives, in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for category in self.list().iter().filter_map(|o| o.category.as_deref()) {
            if !seen.iter().any(|known| known == category) {
                seen.push(category.to_string());
            }
        }
        seen
    }
}
