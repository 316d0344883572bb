//! Reward accumulation engine.
//!
//! Completion rewards are granted once per completion; per-point rewards are
//! granted for each unit of measurable progress. Running totals on records
//! only ever grow.
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::error::{TrackerResult, require_name};
use crate::inventory::{ItemKind, NewItem};
use crate::player::PlayerStats;

/// Gold or XP granted by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardPolicy {
    pub per_completion: u32,
    pub per_point: u32,
}

impl RewardPolicy {
    pub const NONE: Self = Self {
        per_completion: 0,
        per_point: 0,
    };

    #[must_use]
    pub const fn on_completion(amount: u32) -> Self {
        Self {
            per_completion: amount,
            per_point: 0,
        }
    }

    #[must_use]
    pub const fn with_per_point(mut self, amount: u32) -> Self {
        self.per_point = amount;
        self
    }

    /// Amount granted for `points` units of progress.
    #[must_use]
    pub fn for_points(self, points: u32) -> u64 {
        u64::from(self.per_point).saturating_mul(u64::from(points))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Item,
    Currency,
    Resource,
    Xp,
}

/// A named bonus attached to a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    #[serde(rename = "type")]
    pub kind: RewardKind,
    pub name: String,
    pub amount: u32,
}

impl Reward {
    /// # Errors
    ///
    /// Returns a validation error for a blank name or a zero amount.
    pub fn new(kind: RewardKind, name: impl Into<String>, amount: u32) -> TrackerResult<Self> {
        let name = name.into();
        require_name("reward name", &name)?;
        if amount == 0 {
            return Err(crate::TrackerError::validation(
                "reward amount must be at least 1",
            ));
        }
        Ok(Self { kind, name, amount })
    }

    /// The inventory entry this reward grants, if it is not an XP reward.
    #[must_use]
    pub fn as_item(&self) -> Option<NewItem> {
        let kind = match self.kind {
            RewardKind::Item => ItemKind::Item,
            RewardKind::Currency => ItemKind::Currency,
            RewardKind::Resource => ItemKind::Resource,
            RewardKind::Xp => return None,
        };
        Some(NewItem::new(self.name.clone(), kind, self.amount))
    }
}

/// Anything that carries reward policies and a gold running total.
pub trait Rewarded {
    fn gold_reward(&self) -> RewardPolicy;

    fn xp_reward(&self) -> RewardPolicy {
        RewardPolicy::NONE
    }

    fn total_gold_earned_mut(&mut self) -> &mut u64;
}

/// What a single operation paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RewardGrant {
    pub gold: u64,
    pub xp: u64,
    pub levels_gained: u32,
}

impl RewardGrant {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.gold == 0 && self.xp == 0
    }
}

impl AddAssign for RewardGrant {
    fn add_assign(&mut self, rhs: Self) {
        self.gold = self.gold.saturating_add(rhs.gold);
        self.xp = self.xp.saturating_add(rhs.xp);
        self.levels_gained = self.levels_gained.saturating_add(rhs.levels_gained);
    }
}

fn pay<R>(record: &mut R, stats: &mut PlayerStats, gold: u64, xp: u64) -> RewardGrant
where
    R: Rewarded + ?Sized,
{
    let total = record.total_gold_earned_mut();
    *total = total.saturating_add(gold);
    stats.add_gold(gold);
    let levels_gained = stats.add_xp(xp);
    RewardGrant {
        gold,
        xp,
        levels_gained,
    }
}

/// Pay a record's per-completion gold and XP into its total and the player.
pub fn apply_completion_reward<R>(record: &mut R, stats: &mut PlayerStats) -> RewardGrant
where
    R: Rewarded + ?Sized,
{
    let gold = u64::from(record.gold_reward().per_completion);
    let xp = u64::from(record.xp_reward().per_completion);
    let grant = pay(record, stats, gold, xp);
    log::debug!("completion reward: {} gold, {} xp", grant.gold, grant.xp);
    grant
}

/// Pay per-point gold and XP for `points` units of new progress.
pub fn apply_progress_reward<R>(record: &mut R, stats: &mut PlayerStats, points: u32) -> RewardGrant
where
    R: Rewarded + ?Sized,
{
    if points == 0 {
        return RewardGrant::default();
    }
    let gold = record.gold_reward().for_points(points);
    let xp = record.xp_reward().for_points(points);
    pay(record, stats, gold, xp)
}
