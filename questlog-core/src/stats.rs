//! Derived dashboard figures. Nothing here is persisted.
use serde::Serialize;

use crate::guides::Guide;
use crate::inventory::InventoryItem;
use crate::missions::Mission;
use crate::objectives::Objective;
use crate::player::PlayerStats;
use crate::quick_missions::QuickMission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub total: usize,
    pub completed: usize,
    pub gold_earned: u64,
}

impl CollectionSummary {
    fn tally<'a, T: 'a>(
        records: impl IntoIterator<Item = &'a T>,
        completed: impl Fn(&T) -> bool,
        gold: impl Fn(&T) -> u64,
    ) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, record| {
            acc.total += 1;
            acc.completed += usize::from(completed(record));
            acc.gold_earned = acc.gold_earned.saturating_add(gold(record));
            acc
        })
    }

    /// Completed share in percent; an empty collection reports 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveProgress {
    pub id: String,
    pub name: String,
    pub completed_sub_objectives: usize,
    pub total_sub_objectives: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub level: u32,
    pub xp: u64,
    pub next_level_xp: u64,
    pub level_progress_pct: f64,
    pub gold: u64,
    pub objectives: CollectionSummary,
    pub missions: CollectionSummary,
    pub guides: CollectionSummary,
    pub quick_missions: CollectionSummary,
    pub inventory_entries: usize,
    pub inventory_units: u64,
    pub objective_progress: Vec<ObjectiveProgress>,
}

impl DashboardStats {
    #[must_use]
    pub fn collect(
        player: &PlayerStats,
        objectives: &[Objective],
        missions: &[Mission],
        guides: &[Guide],
        inventory: &[InventoryItem],
        quick_missions: &[QuickMission],
    ) -> Self {
        // Sub-objective gold is paid to the player but tracked on the leaves.
        let objective_gold = |o: &Objective| {
            o.phases.iter().fold(o.total_gold_earned, |sum, phase| {
                phase
                    .sub_objectives
                    .iter()
                    .fold(sum.saturating_add(phase.total_gold_earned), |s, sub| {
                        s.saturating_add(sub.total_gold_earned)
                    })
            })
        };
        let guide_gold = |g: &Guide| {
            g.steps
                .iter()
                .fold(g.total_gold_earned, |sum, step| sum.saturating_add(step.total_gold_earned))
        };
        Self {
            level: player.level,
            xp: player.xp,
            next_level_xp: player.next_level_xp,
            level_progress_pct: player.level_progress_pct(),
            gold: player.gold,
            objectives: CollectionSummary::tally(objectives, |o| o.completed, objective_gold),
            missions: CollectionSummary::tally(missions, |m| m.completed, |m| m.total_gold_earned),
            guides: CollectionSummary::tally(guides, |g| g.completed, guide_gold),
            quick_missions: CollectionSummary::tally(quick_missions, |q| q.completed, |_| 0),
            inventory_entries: inventory.len(),
            inventory_units: inventory.iter().map(|item| u64::from(item.quantity)).sum(),
            objective_progress: objectives
                .iter()
                .filter(|o| !o.phases.is_empty())
                .map(|o| {
                    let (done, total) = o.sub_objective_progress();
                    ObjectiveProgress {
                        id: o.id.clone(),
                        name: o.name.clone(),
                        completed_sub_objectives: done,
                        total_sub_objectives: total,
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_reports_zeros() {
        let stats = DashboardStats::collect(&PlayerStats::default(), &[], &[], &[], &[], &[]);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.objectives, CollectionSummary::default());
        assert!(stats.objective_progress.is_empty());
        assert!(stats.missions.completion_pct().abs() < f64::EPSILON);
    }

    #[test]
    fn completion_pct_uses_totals() {
        let summary = CollectionSummary {
            total: 4,
            completed: 1,
            gold_earned: 0,
        };
        assert!((summary.completion_pct() - 25.0).abs() < f64::EPSILON);
    }
}
