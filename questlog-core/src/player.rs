//! Player level, XP curve and gold purse.
use serde::{Deserialize, Serialize};

use crate::error::TrackerResult;
use crate::storage::{self, KeyValueStore, keys};

pub const DEFAULT_BASE_XP_PER_LEVEL: u64 = 3000;
pub const DEFAULT_XP_INCREASE_PER_LEVEL: u64 = 500;

/// Progression record for the active save.
///
/// `xp < next_level_xp` holds after every mutation: overflow XP carries into
/// the next level until it drops below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub level: u32,
    pub xp: u64,
    pub next_level_xp: u64,
    pub base_xp_per_level: u64,
    pub xp_increase_per_level: u64,
    pub gold: u64,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            next_level_xp: DEFAULT_BASE_XP_PER_LEVEL,
            base_xp_per_level: DEFAULT_BASE_XP_PER_LEVEL,
            xp_increase_per_level: DEFAULT_XP_INCREASE_PER_LEVEL,
            gold: 0,
        }
    }
}

impl PlayerStats {
    /// XP needed to clear `level` on the given curve. Never zero.
    #[must_use]
    pub fn xp_for_level(level: u32, base: u64, increase: u64) -> u64 {
        let steps = u64::from(level.saturating_sub(1));
        base.saturating_add(increase.saturating_mul(steps)).max(1)
    }

    fn threshold(&self, level: u32) -> u64 {
        Self::xp_for_level(level, self.base_xp_per_level, self.xp_increase_per_level)
    }

    /// Add XP and apply level-ups. Returns the number of levels gained.
    pub fn add_xp(&mut self, amount: u64) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        self.normalize()
    }

    pub fn add_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Spend gold; the purse floors at zero.
    pub fn remove_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_sub(amount);
    }

    /// Change the curve base. `next_level_xp` is recomputed for the current
    /// level, then any XP now above the threshold levels up.
    pub fn set_base_xp_per_level(&mut self, amount: u64) -> u32 {
        self.base_xp_per_level = amount;
        self.next_level_xp = self.threshold(self.level);
        self.normalize()
    }

    pub fn set_xp_increase_per_level(&mut self, amount: u64) -> u32 {
        self.xp_increase_per_level = amount;
        self.next_level_xp = self.threshold(self.level);
        self.normalize()
    }

    /// Percentage of the way to the next level, in `0.0..100.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn level_progress_pct(&self) -> f64 {
        (self.xp as f64 / self.next_level_xp.max(1) as f64) * 100.0
    }

    /// Repair documents written by older builds or edited by hand.
    pub(crate) fn sanitize(&mut self) {
        self.level = self.level.max(1);
        self.next_level_xp = self.next_level_xp.max(1);
        self.normalize();
    }

    fn normalize(&mut self) -> u32 {
        let mut gained = 0;
        while self.xp >= self.next_level_xp {
            self.xp -= self.next_level_xp;
            self.level = self.level.saturating_add(1);
            self.next_level_xp = self.threshold(self.level);
            gained += 1;
        }
        if gained > 0 {
            log::info!("level up: now level {} ({gained} gained)", self.level);
        }
        gained
    }
}

/// Persisted wrapper around the live [`PlayerStats`].
#[derive(Debug, Clone)]
pub struct Player<S> {
    stats: PlayerStats,
    store: S,
}

impl<S: KeyValueStore> Player<S> {
    pub fn open(store: S) -> Self {
        let mut stats: PlayerStats = storage::load_json(&store, keys::PLAYER_STATS);
        stats.sanitize();
        Self { stats, store }
    }

    pub fn reload(&mut self) {
        let mut stats: PlayerStats = storage::load_json(&self.store, keys::PLAYER_STATS);
        stats.sanitize();
        self.stats = stats;
    }

    #[must_use]
    pub const fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut PlayerStats {
        &mut self.stats
    }

    /// # Errors
    ///
    /// Returns an error if the stats cannot be written back to storage.
    pub fn persist(&self) -> TrackerResult<()> {
        storage::save_json(&self.store, keys::PLAYER_STATS, &self.stats)
    }

    /// # Errors
    ///
    /// Returns an error if the stats cannot be written back to storage.
    pub fn add_xp(&mut self, amount: u64) -> TrackerResult<u32> {
        let gained = self.stats.add_xp(amount);
        self.persist()?;
        Ok(gained)
    }

    /// # Errors
    ///
    /// Returns an error if the stats cannot be written back to storage.
    pub fn add_gold(&mut self, amount: u64) -> TrackerResult<()> {
        self.stats.add_gold(amount);
        self.persist()
    }

    /// # Errors
    ///
    /// Returns an error if the stats cannot be written back to storage.
    pub fn remove_gold(&mut self, amount: u64) -> TrackerResult<()> {
        self.stats.remove_gold(amount);
        self.persist()
    }

    /// # Errors
    ///
    /// Returns an error if the stats cannot be written back to storage.
    pub fn set_base_xp_per_level(&mut self, amount: u64) -> TrackerResult<u32> {
        let gained = self.stats.set_base_xp_per_level(amount);
        self.persist()?;
        Ok(gained)
    }

    /// # Errors
    ///
    /// Returns an error if the stats cannot be written back to storage.
    pub fn set_xp_increase_per_level(&mut self, amount: u64) -> TrackerResult<u32> {
        let gained = self.stats.set_xp_increase_per_level(amount);
        self.persist()?;
        Ok(gained)
    }
}
