//! Lightweight checklists: mission → phase → objective.
//!
//! Completion of phases and missions is derived, never set directly. It is
//! recomputed bottom-up at the end of every mutation, so the stored flags
//! always agree with the leaves.
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult, require_name};
use crate::records::{Collection, Record, Timestamp, new_id, now, settle_completion};
use crate::storage::{KeyValueStore, keys};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickObjective {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickPhase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<QuickObjective>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl QuickPhase {
    fn objective_mut(&mut self, objective_id: &str) -> TrackerResult<&mut QuickObjective> {
        self.objectives
            .iter_mut()
            .find(|objective| objective.id == objective_id)
            .ok_or_else(|| TrackerError::not_found("quick objective", objective_id))
    }

    /// Non-empty and every objective completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickMission {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phases: Vec<QuickPhase>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl Record for QuickMission {
    const KIND: &'static str = "quick mission";
    const STORAGE_KEY: &'static str = keys::QUICK_MISSIONS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl QuickMission {
    fn phase_mut(&mut self, phase_id: &str) -> TrackerResult<&mut QuickPhase> {
        self.phases
            .iter_mut()
            .find(|phase| phase.id == phase_id)
            .ok_or_else(|| TrackerError::not_found("quick phase", phase_id))
    }

    /// Non-empty and every phase done.
    #[must_use]
    pub fn is_done(&self) -> bool {
        !self.phases.is_empty() && self.phases.iter().all(QuickPhase::is_done)
    }

    /// `(completed, total)` objective counts across all phases.
    #[must_use]
    pub fn objective_progress(&self) -> (usize, usize) {
        self.phases
            .iter()
            .flat_map(|phase| &phase.objectives)
            .fold((0, 0), |(done, total), o| (done + usize::from(o.completed), total + 1))
    }

    fn settle(&mut self, at: Timestamp) {
        for phase in &mut self.phases {
            let done = phase.is_done();
            settle_completion(&mut phase.completed, &mut phase.completed_at, done, at);
        }
        let done = self.is_done();
        settle_completion(&mut self.completed, &mut self.completed_at, done, at);
    }
}

pub type QuickMissions<S> = Collection<QuickMission, S>;

impl<S: KeyValueStore> Collection<QuickMission, S> {
    /// Apply `edit` to a mission and re-derive its completion.
    fn edit_tree<R>(
        &mut self,
        mission_id: &str,
        edit: impl FnOnce(&mut QuickMission, Timestamp) -> TrackerResult<R>,
    ) -> TrackerResult<R> {
        self.modify(mission_id, |mission| {
            let at = now();
            let out = edit(mission, at)?;
            mission.settle(at);
            Ok(out)
        })
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn add_mission(&mut self, name: &str, description: &str) -> TrackerResult<String> {
        require_name("quick mission name", name)?;
        self.insert(QuickMission {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
            phases: Vec::new(),
            completed: false,
            created_at: now(),
            completed_at: None,
        })
    }

    /// Adding an empty phase makes a completed mission incomplete again.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn add_phase(
        &mut self,
        mission_id: &str,
        name: &str,
        description: &str,
    ) -> TrackerResult<String> {
        require_name("phase name", name)?;
        self.edit_tree(mission_id, |mission, at| {
            let id = new_id();
            mission.phases.push(QuickPhase {
                id: id.clone(),
                name: name.to_string(),
                description: description.to_string(),
                objectives: Vec::new(),
                completed: false,
                created_at: at,
                completed_at: None,
            });
            Ok(id)
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn add_objective(
        &mut self,
        mission_id: &str,
        phase_id: &str,
        description: &str,
    ) -> TrackerResult<String> {
        require_name("objective description", description)?;
        self.edit_tree(mission_id, |mission, at| {
            let id = new_id();
            mission.phase_mut(phase_id)?.objectives.push(QuickObjective {
                id: id.clone(),
                description: description.to_string(),
                completed: false,
                created_at: at,
                completed_at: None,
            });
            Ok(id)
        })
    }

    /// Flip an objective. Returns its new state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn toggle_objective(
        &mut self,
        mission_id: &str,
        phase_id: &str,
        objective_id: &str,
    ) -> TrackerResult<bool> {
        self.edit_tree(mission_id, |mission, at| {
            let objective = mission.phase_mut(phase_id)?.objective_mut(objective_id)?;
            let done = !objective.completed;
            settle_completion(
                &mut objective.completed,
                &mut objective.completed_at,
                done,
                at,
            );
            Ok(done)
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn edit_mission(
        &mut self,
        mission_id: &str,
        name: &str,
        description: &str,
    ) -> TrackerResult<()> {
        require_name("quick mission name", name)?;
        self.edit_tree(mission_id, |mission, _| {
            mission.name = name.to_string();
            mission.description = description.to_string();
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn edit_phase(
        &mut self,
        mission_id: &str,
        phase_id: &str,
        name: &str,
        description: &str,
    ) -> TrackerResult<()> {
        require_name("phase name", name)?;
        self.edit_tree(mission_id, |mission, _| {
            let phase = mission.phase_mut(phase_id)?;
            phase.name = name.to_string();
            phase.description = description.to_string();
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage error.
    pub fn edit_objective(
        &mut self,
        mission_id: &str,
        phase_id: &str,
        objective_id: &str,
        description: &str,
    ) -> TrackerResult<()> {
        require_name("objective description", description)?;
        self.edit_tree(mission_id, |mission, _| {
            let objective = mission.phase_mut(phase_id)?.objective_mut(objective_id)?;
            objective.description = description.to_string();
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn delete_mission(&mut self, mission_id: &str) -> TrackerResult<()> {
        self.remove(mission_id).map(drop)
    }

    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn delete_phase(&mut self, mission_id: &str, phase_id: &str) -> TrackerResult<()> {
        self.edit_tree(mission_id, |mission, _| {
            let before = mission.phases.len();
            mission.phases.retain(|phase| phase.id != phase_id);
            if mission.phases.len() == before {
                return Err(TrackerError::not_found("quick phase", phase_id));
            }
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn delete_objective(
        &mut self,
        mission_id: &str,
        phase_id: &str,
        objective_id: &str,
    ) -> TrackerResult<()> {
        self.edit_tree(mission_id, |mission, _| {
            let phase = mission.phase_mut(phase_id)?;
            let before = phase.objectives.len();
            phase.objectives.retain(|objective| objective.id != objective_id);
            if phase.objectives.len() == before {
                return Err(TrackerError::not_found("quick objective", objective_id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn single_phase() -> (QuickMissions<MemoryStore>, String, String) {
        let mut quick = QuickMissions::open(MemoryStore::new());
        let mission = quick.add_mission("Chores", "").unwrap();
        let phase = quick.add_phase(&mission, "Morning", "").unwrap();
        (quick, mission, phase)
    }

    #[test]
    fn empty_containers_are_never_complete() {
        let (quick, mission, _) = single_phase();
        let entry = quick.get(&mission).unwrap();
        assert!(!entry.completed);
        assert!(!entry.phases[0].completed);
    }

    #[test]
    fn toggling_last_objective_completes_the_tree() {
        let (mut quick, mission, phase) = single_phase();
        let a = quick.add_objective(&mission, &phase, "Feed the cat").unwrap();
        let b = quick.add_objective(&mission, &phase, "Water plants").unwrap();
        assert!(quick.toggle_objective(&mission, &phase, &a).unwrap());
        assert!(!quick.get(&mission).unwrap().completed);
        quick.toggle_objective(&mission, &phase, &b).unwrap();
        let entry = quick.get(&mission).unwrap();
        assert!(entry.completed);
        assert!(entry.completed_at.is_some());
        assert!(entry.phases[0].completed_at.is_some());

        assert!(!quick.toggle_objective(&mission, &phase, &a).unwrap());
        let entry = quick.get(&mission).unwrap();
        assert!(!entry.completed);
        assert!(entry.completed_at.is_none());
        assert!(entry.phases[0].completed_at.is_none());
    }

    #[test]
    fn structural_edits_rederive_completion() {
        let (mut quick, mission, phase) = single_phase();
        let a = quick.add_objective(&mission, &phase, "Only task").unwrap();
        quick.toggle_objective(&mission, &phase, &a).unwrap();
        assert!(quick.get(&mission).unwrap().completed);

        let extra = quick.add_phase(&mission, "Evening", "").unwrap();
        assert!(!quick.get(&mission).unwrap().completed);
        quick.delete_phase(&mission, &extra).unwrap();
        assert!(quick.get(&mission).unwrap().completed);

        let pending = quick.add_objective(&mission, &phase, "Surprise").unwrap();
        assert!(!quick.get(&mission).unwrap().phases[0].completed);
        quick.delete_objective(&mission, &phase, &pending).unwrap();
        assert!(quick.get(&mission).unwrap().phases[0].completed);

        quick.delete_objective(&mission, &phase, &a).unwrap();
        assert!(!quick.get(&mission).unwrap().completed);
    }

    #[test]
    fn edits_validate_and_report_missing_ids() {
        let (mut quick, mission, phase) = single_phase();
        assert!(quick.edit_mission(&mission, "", "x").is_err());
        quick.edit_phase(&mission, &phase, "Dawn", "early").unwrap();
        assert_eq!(quick.get(&mission).unwrap().phases[0].name, "Dawn");
        let err = quick
            .edit_objective(&mission, &phase, "ghost", "boo")
            .unwrap_err();
        assert!(err.is_not_found());
        quick.delete_mission(&mission).unwrap();
        assert!(quick.is_empty());
    }
}
