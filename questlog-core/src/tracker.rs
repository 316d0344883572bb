//! The tracker facade: one instance of every collection over one store.
//!
//! Cross-collection behavior lives here. Collections never reach into each
//! other; completing a mission or a guide step fans out through this type,
//! and the player record is persisted once at the end of each cascade.
use crate::categories::CategoryRegistry;
use crate::error::{TrackerError, TrackerResult};
use crate::game_profiles::GameProfiles;
use crate::guides::{Guide, GuideProgress, Guides, NewGuide};
use crate::inventory::Inventory;
use crate::missions::{Mission, MissionCompletion, Missions, NewMission};
use crate::objectives::{Objective, Objectives};
use crate::player::Player;
use crate::quick_missions::QuickMissions;
use crate::rewards::RewardGrant;
use crate::session_profiles::{ContentKind, SessionProfiles};
use crate::stats::DashboardStats;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone)]
pub struct Tracker<S> {
    store: S,
    player: Player<S>,
    objectives: Objectives<S>,
    missions: Missions<S>,
    guides: Guides<S>,
    inventory: Inventory<S>,
    mission_categories: CategoryRegistry<S>,
    guide_categories: CategoryRegistry<S>,
    quick_missions: QuickMissions<S>,
    session_profiles: SessionProfiles<S>,
    game_profiles: GameProfiles<S>,
}

impl<S: KeyValueStore + Clone> Tracker<S> {
    pub fn open(store: S) -> Self {
        Self {
            player: Player::open(store.clone()),
            objectives: Objectives::open(store.clone()),
            missions: Missions::open(store.clone()),
            guides: Guides::open(store.clone()),
            inventory: Inventory::open(store.clone()),
            mission_categories: CategoryRegistry::missions(store.clone()),
            guide_categories: CategoryRegistry::guides(store.clone()),
            quick_missions: QuickMissions::open(store.clone()),
            session_profiles: SessionProfiles::open(store.clone()),
            game_profiles: GameProfiles::open(store.clone()),
            store,
        }
    }

    /// Re-read every document from the store.
    pub fn reload(&mut self) {
        self.player.reload();
        self.objectives.reload();
        self.missions.reload();
        self.guides.reload();
        self.inventory.reload();
        self.mission_categories.reload();
        self.guide_categories.reload();
        self.quick_missions.reload();
        self.session_profiles.reload();
        self.game_profiles.reload();
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn player(&self) -> &Player<S> {
        &self.player
    }

    pub const fn player_mut(&mut self) -> &mut Player<S> {
        &mut self.player
    }

    pub const fn objectives(&self) -> &Objectives<S> {
        &self.objectives
    }

    pub const fn objectives_mut(&mut self) -> &mut Objectives<S> {
        &mut self.objectives
    }

    pub const fn missions(&self) -> &Missions<S> {
        &self.missions
    }

    pub const fn missions_mut(&mut self) -> &mut Missions<S> {
        &mut self.missions
    }

    pub const fn guides(&self) -> &Guides<S> {
        &self.guides
    }

    pub const fn guides_mut(&mut self) -> &mut Guides<S> {
        &mut self.guides
    }

    pub const fn inventory(&self) -> &Inventory<S> {
        &self.inventory
    }

    pub const fn inventory_mut(&mut self) -> &mut Inventory<S> {
        &mut self.inventory
    }

    pub const fn mission_categories(&self) -> &CategoryRegistry<S> {
        &self.mission_categories
    }

    pub const fn guide_categories(&self) -> &CategoryRegistry<S> {
        &self.guide_categories
    }

    pub const fn quick_missions(&self) -> &QuickMissions<S> {
        &self.quick_missions
    }

    pub const fn quick_missions_mut(&mut self) -> &mut QuickMissions<S> {
        &mut self.quick_missions
    }

    pub const fn session_profiles(&self) -> &SessionProfiles<S> {
        &self.session_profiles
    }

    pub const fn session_profiles_mut(&mut self) -> &mut SessionProfiles<S> {
        &mut self.session_profiles
    }

    pub const fn game_profiles(&self) -> &GameProfiles<S> {
        &self.game_profiles
    }

    /// Registry access for update, delete, duplicate, export and import.
    /// Loading goes through [`Tracker::load_game_profile`].
    pub const fn game_profiles_mut(&mut self) -> &mut GameProfiles<S> {
        &mut self.game_profiles
    }

    /// Add a mission and register its category.
    ///
    /// # Errors
    ///
    /// Returns a validation or storage error.
    pub fn add_mission(&mut self, mission: NewMission) -> TrackerResult<String> {
        let id = self.missions.add(mission)?;
        if let Some(category) = self.missions.get(&id).map(|m| m.category.clone()) {
            self.mission_categories.add(&category)?;
        }
        Ok(id)
    }

    /// Add a guide and register its category.
    ///
    /// # Errors
    ///
    /// Returns a validation or storage error.
    pub fn add_guide(&mut self, guide: NewGuide) -> TrackerResult<String> {
        let id = self.guides.add(guide)?;
        if let Some(category) = self.guides.get(&id).map(|g| g.category.clone()) {
            self.guide_categories.add(&category)?;
        }
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn add_mission_category(&mut self, name: &str) -> TrackerResult<bool> {
        self.mission_categories.add(name)
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn add_guide_category(&mut self, name: &str) -> TrackerResult<bool> {
        self.guide_categories.add(name)
    }

    /// Persist the player after a cascade, whether or not it succeeded:
    /// rewards already paid by the inner steps stay paid.
    fn settle_player<T>(&mut self, outcome: TrackerResult<T>) -> TrackerResult<T> {
        self.player.persist()?;
        outcome
    }

    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn complete_objective(&mut self, id: &str) -> TrackerResult<Option<RewardGrant>> {
        let outcome = self.objectives.complete(id, self.player.stats_mut());
        self.settle_player(outcome)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown objective, phase or sub-objective,
    /// or a storage error.
    pub fn complete_sub_objective(
        &mut self,
        id: &str,
        phase_id: &str,
        sub_id: &str,
    ) -> TrackerResult<Option<RewardGrant>> {
        let outcome =
            self.objectives
                .complete_sub_objective(id, phase_id, sub_id, self.player.stats_mut());
        self.settle_player(outcome)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown objective or phase, or a storage
    /// error.
    pub fn complete_phase(
        &mut self,
        id: &str,
        phase_id: &str,
    ) -> TrackerResult<Option<RewardGrant>> {
        let outcome = self
            .objectives
            .complete_phase(id, phase_id, self.player.stats_mut());
        self.settle_player(outcome)
    }

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
    ) -> TrackerResult<RewardGrant> {
        let outcome = self.objectives.record_progress(
            id,
            phase_id,
            sub_id,
            value,
            self.player.stats_mut(),
        );
        self.settle_player(outcome)
    }

    /// Complete a mission: its referenced objectives first (missing ones are
    /// skipped), then the mission's own rewards, then its item rewards into
    /// the inventory. The returned grant covers the whole cascade.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown mission, or a storage error. A
    /// storage error stops the cascade at the step whose write failed; that
    /// step and the ones before it stay applied in memory, and the player
    /// record is still written.
    pub fn complete_mission(&mut self, id: &str) -> TrackerResult<Option<MissionCompletion>> {
        let outcome = self.mission_cascade(id);
        self.settle_player(outcome)
    }

    fn mission_cascade(&mut self, id: &str) -> TrackerResult<Option<MissionCompletion>> {
        let mission = self.missions.require(id)?;
        if mission.completed {
            log::debug!("mission `{id}` already completed");
            return Ok(None);
        }
        let objective_ids = mission.objective_ids.clone();
        let mut grant = RewardGrant::default();
        for objective_id in &objective_ids {
            match self.objectives.complete(objective_id, self.player.stats_mut()) {
                Ok(Some(paid)) => grant += paid,
                Ok(None) => {}
                Err(err) if err.is_not_found() => {
                    log::debug!("mission `{id}` references missing objective `{objective_id}`");
                }
                Err(err) => return Err(err),
            }
        }
        let Some(mut completion) = self.missions.complete(id, self.player.stats_mut())? else {
            return Ok(None);
        };
        for item in &completion.item_rewards {
            self.inventory.stack(item.clone())?;
        }
        completion.grant += grant;
        Ok(Some(completion))
    }

    fn complete_referenced_missions(
        &mut self,
        mission_ids: &[String],
        progress: &mut GuideProgress,
    ) -> TrackerResult<()> {
        for mission_id in mission_ids {
            match self.mission_cascade(mission_id) {
                Ok(Some(done)) => progress.grant += done.grant,
                Ok(None) => {}
                Err(err) if err.is_not_found() => {
                    log::debug!("guide references missing mission `{mission_id}`");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Complete a guide step and the missions it references. Returns `None`
    /// if the step was already complete.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown guide or step, or a storage error.
    pub fn complete_guide_step(
        &mut self,
        guide_id: &str,
        step_id: &str,
    ) -> TrackerResult<Option<GuideProgress>> {
        let outcome = self.guide_step_cascade(guide_id, step_id);
        self.settle_player(outcome)
    }

    fn guide_step_cascade(
        &mut self,
        guide_id: &str,
        step_id: &str,
    ) -> TrackerResult<Option<GuideProgress>> {
        let step = self
            .guides
            .require(guide_id)?
            .step(step_id)
            .ok_or_else(|| TrackerError::not_found("guide step", step_id))?;
        if step.completed {
            return Ok(None);
        }
        let mission_ids = step.mission_ids.clone();
        let mut missions = GuideProgress::default();
        self.complete_referenced_missions(&mission_ids, &mut missions)?;
        let progress = self
            .guides
            .complete_step(guide_id, step_id, self.player.stats_mut())?;
        Ok(progress.map(|mut progress| {
            progress.grant += missions.grant;
            progress
        }))
    }

    /// Complete every open step of a guide, their missions, and the guide.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown guide, or a storage error.
    pub fn complete_guide(&mut self, guide_id: &str) -> TrackerResult<Option<GuideProgress>> {
        let outcome = self.guide_cascade(guide_id);
        self.settle_player(outcome)
    }

    fn guide_cascade(&mut self, guide_id: &str) -> TrackerResult<Option<GuideProgress>> {
        let guide = self.guides.require(guide_id)?;
        if guide.completed {
            return Ok(None);
        }
        let mission_ids: Vec<String> = guide
            .steps
            .iter()
            .filter(|step| !step.completed)
            .flat_map(|step| step.mission_ids.iter().cloned())
            .collect();
        let mut missions = GuideProgress::default();
        self.complete_referenced_missions(&mission_ids, &mut missions)?;
        let progress = self.guides.complete(guide_id, self.player.stats_mut())?;
        Ok(progress.map(|mut progress| {
            progress.grant += missions.grant;
            progress
        }))
    }

    /// Objectives visible under the active session profile.
    #[must_use]
    pub fn visible_objectives(&self) -> Vec<&Objective> {
        self.session_profiles
            .scope(ContentKind::Objective, self.objectives.list())
    }

    #[must_use]
    pub fn visible_missions(&self) -> Vec<&Mission> {
        self.session_profiles
            .scope(ContentKind::Mission, self.missions.list())
    }

    #[must_use]
    pub fn visible_guides(&self) -> Vec<&Guide> {
        self.session_profiles.scope(ContentKind::Guide, self.guides.list())
    }

    /// Snapshot the live data into a new save state.
    ///
    /// # Errors
    ///
    /// Returns a validation or storage error.
    pub fn create_game_profile(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> TrackerResult<String> {
        self.player.persist()?;
        self.game_profiles.create(name, description)
    }

    /// Load a save state and re-read every collection from the store.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown profile, or a storage error. After a
    /// storage error the live keys may be partially replaced; the tracker
    /// still reflects whatever the store now holds.
    pub fn load_game_profile(&mut self, id: &str) -> TrackerResult<()> {
        let outcome = self.game_profiles.load(id);
        self.reload();
        let signal = outcome?;
        log::info!("tracker reloaded from game profile `{}`", signal.profile_id);
        Ok(())
    }

    /// Re-snapshot the live data into the current save state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no profile is current, or a storage error.
    pub fn save_game_profile(&mut self) -> TrackerResult<()> {
        self.player.persist()?;
        self.game_profiles.save_current()
    }

    #[must_use]
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::collect(
            self.player.stats(),
            self.objectives.list(),
            self.missions.list(),
            self.guides.list(),
            self.inventory.list(),
            self.quick_missions.list(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guides::NewGuideStep;
    use crate::inventory::{ItemKind, NewItem};
    use crate::objectives::NewObjective;
    use crate::rewards::{Reward, RewardKind, RewardPolicy};
    use crate::storage::MemoryStore;

    fn tracker() -> Tracker<MemoryStore> {
        Tracker::open(MemoryStore::new())
    }

    #[test]
    fn mission_completion_cascades_into_objectives_and_inventory() {
        let mut t = tracker();
        let wolves = t
            .objectives_mut()
            .add(NewObjective::new("Kill 10 Wolves").with_gold(RewardPolicy::on_completion(10)))
            .unwrap();
        let mission = t
            .add_mission(
                NewMission::new("Clear the Woods", "World Quest")
                    .with_objective(wolves.clone())
                    .with_objective("deleted-objective")
                    .with_gold(RewardPolicy::on_completion(25))
                    .with_reward(Reward::new(RewardKind::Resource, "Wolf Pelt", 3).unwrap()),
            )
            .unwrap();
        t.inventory_mut()
            .add(NewItem::new("wolf pelt", ItemKind::Resource, 1))
            .unwrap();

        let done = t.complete_mission(&mission).unwrap().unwrap();
        assert_eq!(done.grant.gold, 35);
        assert!(t.objectives().get(&wolves).unwrap().completed);
        assert_eq!(t.inventory().find_by_name("Wolf Pelt").unwrap().quantity, 4);
        assert_eq!(t.player().stats().gold, 35);
        assert!(t.complete_mission(&mission).unwrap().is_none());

        // The player record was written back.
        let reopened = Tracker::open(t.store().clone());
        assert_eq!(reopened.player().stats().gold, 35);
    }

    #[test]
    fn new_mission_categories_are_registered() {
        let mut t = tracker();
        t.add_mission(NewMission::new("Tame a Drake", "Mounts")).unwrap();
        assert!(t.mission_categories().contains("Mounts"));
        t.add_guide(NewGuide::new("Mount Guide", "Beginner")).unwrap();
        let count = t
            .guide_categories()
            .names()
            .iter()
            .filter(|n| n.as_str() == "Beginner")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn guide_step_completes_its_missions() {
        let mut t = tracker();
        let mission = t
            .add_mission(
                NewMission::new("Talk to the Elder", "Lore")
                    .with_gold(RewardPolicy::on_completion(4)),
            )
            .unwrap();
        let guide = t
            .add_guide(
                NewGuide::new("Lore Path", "Lore")
                    .with_gold(RewardPolicy::on_completion(6))
                    .with_step(NewGuideStep::new("Elder").with_mission(mission.clone())),
            )
            .unwrap();
        let step = t.guides().get(&guide).unwrap().steps[0].id.clone();
        let progress = t.complete_guide_step(&guide, &step).unwrap().unwrap();
        assert!(progress.guide_completed);
        assert_eq!(progress.grant.gold, 10);
        assert!(t.missions().get(&mission).unwrap().completed);
    }

    #[test]
    fn visible_lists_follow_the_active_profile() {
        let mut t = tracker();
        let m1 = t.add_mission(NewMission::new("M1", "Generic")).unwrap();
        t.add_mission(NewMission::new("M2", "Generic")).unwrap();
        assert_eq!(t.visible_missions().len(), 2);

        let pack = t.session_profiles_mut().create("Build A", None, None).unwrap();
        t.session_profiles_mut()
            .add_content(&pack, ContentKind::Mission, &m1)
            .unwrap();
        t.session_profiles_mut().set_active(Some(pack.as_str())).unwrap();
        let visible: Vec<&str> = t.visible_missions().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(visible, vec![m1.as_str()]);
    }

    #[test]
    fn loading_a_game_profile_reloads_collections() {
        let mut t = tracker();
        t.objectives_mut().add(NewObjective::new("Before")).unwrap();
        let run = t.create_game_profile("Run 1", None).unwrap();
        t.objectives_mut().add(NewObjective::new("After")).unwrap();
        t.player_mut().add_gold(99).unwrap();

        t.load_game_profile(&run).unwrap();
        assert_eq!(t.objectives().len(), 1);
        assert_eq!(t.player().stats().gold, 0);
        assert!(t.load_game_profile("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn dashboard_reflects_live_state() {
        let mut t = tracker();
        let id = t.objectives_mut().add(NewObjective::new("Scout")).unwrap();
        t.complete_objective(&id).unwrap();
        let stats = t.stats();
        assert_eq!(stats.objectives.total, 1);
        assert_eq!(stats.objectives.completed, 1);
        assert_eq!(stats.xp, 100);
    }
}
