use std::cell::Cell;
use std::rc::Rc;

use questlog_core::{
    KeyValueStore, MemoryStore, NewMission, NewObjective, Reward, RewardKind, RewardPolicy,
    StorageError, Tracker, TrackerError, keys,
};

/// Memory store that rejects writes to one chosen key.
#[derive(Debug, Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    rejected: Rc<Cell<Option<&'static str>>>,
}

impl FlakyStore {
    fn reject(&self, key: Option<&'static str>) {
        self.rejected.set(key);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.rejected.get() == Some(key) {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) {
        self.inner.remove(key);
    }
}

fn wolf_hunt(tracker: &mut Tracker<FlakyStore>) -> (String, String) {
    let wolves = tracker
        .objectives_mut()
        .add(NewObjective::new("Kill 10 Wolves").with_gold(RewardPolicy::on_completion(10)))
        .unwrap();
    let mission = tracker
        .add_mission(
            NewMission::new("Clear the Woods", "World Quest")
                .with_objective(wolves.clone())
                .with_gold(RewardPolicy::on_completion(25))
                .with_reward(Reward::new(RewardKind::Resource, "Wolf Pelt", 3).unwrap()),
        )
        .unwrap();
    (wolves, mission)
}

#[test]
fn mission_cascade_stops_at_the_rejected_write() {
    let store = FlakyStore::default();
    let mut tracker = Tracker::open(store.clone());
    let (wolves, mission) = wolf_hunt(&mut tracker);

    store.reject(Some(keys::MISSIONS));
    let err = tracker.complete_mission(&mission).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Storage(StorageError::WriteRejected { ref key, .. }) if key == keys::MISSIONS
    ));

    // Memory keeps every step up to and including the failed one.
    assert!(tracker.objectives().get(&wolves).unwrap().completed);
    assert!(tracker.missions().get(&mission).unwrap().completed);
    assert_eq!(tracker.player().stats().gold, 35);
    // Item rewards come after the failed step and were never granted.
    assert!(tracker.inventory().find_by_name("Wolf Pelt").is_none());

    // Keys written before the failure are durable; the mission is not.
    let reopened = Tracker::open(store.clone());
    assert!(reopened.objectives().get(&wolves).unwrap().completed);
    assert!(!reopened.missions().get(&mission).unwrap().completed);
    assert_eq!(reopened.player().stats().gold, 35);
}

#[test]
fn next_successful_write_makes_memory_durable() {
    let store = FlakyStore::default();
    let mut tracker = Tracker::open(store.clone());
    let (_, mission) = wolf_hunt(&mut tracker);

    store.reject(Some(keys::MISSIONS));
    assert!(tracker.complete_mission(&mission).is_err());
    assert!(tracker.complete_mission(&mission).unwrap().is_none());

    store.reject(None);
    tracker
        .add_mission(NewMission::new("Skin the Pelts", "Resource"))
        .unwrap();
    let reopened = Tracker::open(store);
    assert!(reopened.missions().get(&mission).unwrap().completed);
    assert_eq!(reopened.missions().len(), 2);
}

#[test]
fn rejected_player_write_keeps_rewards_in_memory() {
    let store = FlakyStore::default();
    let mut tracker = Tracker::open(store.clone());
    let (wolves, _) = wolf_hunt(&mut tracker);

    store.reject(Some(keys::PLAYER_STATS));
    let err = tracker.complete_objective(&wolves).unwrap_err();
    assert!(matches!(err, TrackerError::Storage(_)));
    assert_eq!(tracker.player().stats().gold, 10);

    let reopened = Tracker::open(store);
    assert!(reopened.objectives().get(&wolves).unwrap().completed);
    assert_eq!(reopened.player().stats().gold, 0);
}

#[test]
fn quota_failure_on_add_and_remove_leaves_memory_ahead() {
    let store = MemoryStore::with_quota(2048);
    let mut tracker = Tracker::open(store.clone());
    let scout = tracker.objectives_mut().add(NewObjective::new("Scout")).unwrap();

    let huge = NewObjective {
        description: "x".repeat(4096),
        ..NewObjective::new("Chronicle")
    };
    let err = tracker.objectives_mut().add(huge).unwrap_err();
    assert!(matches!(err, TrackerError::Storage(_)));
    assert_eq!(tracker.objectives().len(), 2);
    assert_eq!(Tracker::open(store.clone()).objectives().len(), 1);

    // Removing the scout still cannot fit the chronicle into the quota.
    assert!(tracker.objectives_mut().remove(&scout).is_err());
    assert_eq!(tracker.objectives().len(), 1);
    assert_eq!(Tracker::open(store).objectives().len(), 1);
}
