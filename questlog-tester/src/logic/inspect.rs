//! Save-file inspection for `--import`.

use anyhow::{Context, Result, ensure};
use questlog_core::{GameProfile, MemoryStore, Tracker, parse_document};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFileSummary {
    pub name: String,
    pub schema_version: u32,
    pub level: u32,
    pub gold: u64,
    pub objectives: usize,
    pub completed_objectives: usize,
    pub missions: usize,
    pub completed_missions: usize,
    pub guides: usize,
    pub inventory_entries: usize,
    pub round_trip_ok: bool,
}

impl SaveFileSummary {
    fn from_profile(profile: &GameProfile, round_trip_ok: bool) -> Self {
        let data = &profile.data;
        Self {
            name: profile.name.clone(),
            schema_version: profile.schema_version,
            level: data.player_stats.level,
            gold: data.player_stats.gold,
            objectives: data.objectives.len(),
            completed_objectives: data.objectives.iter().filter(|o| o.completed).count(),
            missions: data.missions.len(),
            completed_missions: data.missions.iter().filter(|m| m.completed).count(),
            guides: data.guides.len(),
            inventory_entries: data.inventory.len(),
            round_trip_ok,
        }
    }
}

/// Validate a save-state document, import it into a scratch tracker and
/// check that re-exporting preserves its domain data.
pub fn inspect_document(document: &str) -> Result<SaveFileSummary> {
    let parsed = parse_document(document).context("save file rejected")?;

    let mut tracker = Tracker::open(MemoryStore::new());
    let id = tracker.game_profiles_mut().import(document)?;
    let exported = tracker.game_profiles().export(&id)?;
    let reparsed = parse_document(&exported).context("re-export rejected")?;
    let imported = tracker
        .game_profiles()
        .get(&id)
        .context("imported profile missing")?;
    ensure!(imported.name == parsed.name, "import renamed the profile");

    let round_trip_ok = reparsed.data == imported.data;
    Ok(SaveFileSummary::from_profile(imported, round_trip_ok))
}

pub fn inspect_file(path: &Path) -> Result<SaveFileSummary> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    inspect_document(&document).with_context(|| format!("inspecting {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use questlog_core::NewObjective;

    fn exported_profile() -> String {
        let mut tracker = Tracker::open(MemoryStore::new());
        let id = tracker
            .objectives_mut()
            .add(NewObjective::new("Scout"))
            .unwrap();
        tracker.complete_objective(&id).unwrap();
        let run = tracker.create_game_profile("Run 1", None).unwrap();
        tracker.game_profiles().export(&run).unwrap()
    }

    #[test]
    fn summarizes_a_valid_save() {
        let summary = inspect_document(&exported_profile()).unwrap();
        assert_eq!(summary.name, "Run 1");
        assert_eq!(summary.objectives, 1);
        assert_eq!(summary.completed_objectives, 1);
        assert!(summary.round_trip_ok);
    }

    #[test]
    fn rejects_garbage() {
        let err = inspect_document("][").unwrap_err();
        assert!(format!("{err:#}").contains("save file rejected"));
    }
}
