use questlog_core::{
    GameProfilePatch, KeyValueStore, MemoryStore, NewMission, NewObjective, RewardPolicy,
    SCHEMA_VERSION, Tracker, TrackerError, keys, parse_document,
};

fn seeded_tracker() -> Tracker<MemoryStore> {
    let mut tracker = Tracker::open(MemoryStore::new());
    let wolves = tracker
        .objectives_mut()
        .add(NewObjective::new("Kill 10 Wolves").with_gold(RewardPolicy::on_completion(10)))
        .unwrap();
    tracker
        .add_mission(NewMission::new("Clear the Woods", "Main Quest").with_objective(wolves))
        .unwrap();
    tracker
}

#[test]
fn loading_run_restores_snapshot_over_later_changes() {
    let mut tracker = seeded_tracker();
    let run = tracker.create_game_profile("Run 1", Some("first try")).unwrap();
    assert_eq!(tracker.game_profiles().current().unwrap().id, run);

    let mission = tracker.missions().list()[0].id.clone();
    tracker.complete_mission(&mission).unwrap();
    tracker.objectives_mut().add(NewObjective::new("Stray")).unwrap();
    assert!(tracker.player().stats().gold > 0);

    tracker.load_game_profile(&run).unwrap();
    assert_eq!(tracker.objectives().len(), 1);
    assert!(!tracker.missions().get(&mission).unwrap().completed);
    assert_eq!(tracker.player().stats().gold, 0);
    assert_eq!(tracker.player().stats().level, 1);

    // A fresh tracker over the same store sees the same thing.
    let reopened = Tracker::open(tracker.store().clone());
    assert_eq!(reopened.objectives().len(), 1);
    assert_eq!(reopened.game_profiles().current().unwrap().id, run);
}

#[test]
fn saving_current_profile_captures_progress() {
    let mut tracker = seeded_tracker();
    let run = tracker.create_game_profile("Run 1", None).unwrap();
    let mission = tracker.missions().list()[0].id.clone();
    tracker.complete_mission(&mission).unwrap();
    tracker.save_game_profile().unwrap();

    let profile = tracker.game_profiles().get(&run).unwrap();
    assert_eq!(profile.completed_missions, 1);
    assert_eq!(profile.completed_objectives, 1);
    assert_eq!(profile.data.player_stats.gold, tracker.player().stats().gold);
}

#[test]
fn saving_without_current_profile_is_not_found() {
    let mut tracker = seeded_tracker();
    let err = tracker.save_game_profile().unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn export_then_import_yields_an_independent_copy() {
    let mut tracker = seeded_tracker();
    let run = tracker.create_game_profile("Run 1: Hardcore!", None).unwrap();
    let document = tracker.game_profiles().export(&run).unwrap();
    assert_eq!(
        tracker.game_profiles().export_file_name(&run).unwrap(),
        "Run_1__Hardcore__profile.json"
    );

    let imported = tracker.game_profiles_mut().import(&document).unwrap();
    assert_ne!(imported, run);
    assert_eq!(tracker.game_profiles().list().len(), 2);
    // Importing never switches the current profile.
    assert_eq!(tracker.game_profiles().current().unwrap().id, run);

    let copy = tracker.game_profiles().get(&imported).unwrap();
    let original = tracker.game_profiles().get(&run).unwrap();
    assert_eq!(copy.name, original.name);
    assert_eq!(copy.data, original.data);
    assert_eq!(copy.schema_version, SCHEMA_VERSION);
}

#[test]
fn malformed_import_leaves_state_untouched() {
    let mut tracker = seeded_tracker();
    tracker.create_game_profile("Run 1", None).unwrap();
    let before = tracker.store().get(keys::GAME_PROFILES);

    let err = tracker.game_profiles_mut().import("{ not json").unwrap_err();
    assert!(matches!(err, TrackerError::MalformedData { .. }));
    let err = tracker.game_profiles_mut().import(r#"{"name": "   "}"#).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::MalformedData { .. } | TrackerError::Validation(_)
    ));

    assert_eq!(tracker.store().get(keys::GAME_PROFILES), before);
    assert_eq!(tracker.game_profiles().list().len(), 1);
}

#[test]
fn newer_schema_is_rejected() {
    let mut tracker = seeded_tracker();
    let run = tracker.create_game_profile("Run 1", None).unwrap();
    let mut value: serde_json::Value =
        serde_json::from_str(&tracker.game_profiles().export(&run).unwrap()).unwrap();
    value["schemaVersion"] = serde_json::json!(SCHEMA_VERSION + 1);

    let err = parse_document(&value.to_string()).unwrap_err();
    assert!(matches!(err, TrackerError::UnsupportedSchema { .. }));
}

#[test]
fn missing_schema_version_reads_as_first_layout() {
    let mut tracker = seeded_tracker();
    let run = tracker.create_game_profile("Legacy", None).unwrap();
    let mut value: serde_json::Value =
        serde_json::from_str(&tracker.game_profiles().export(&run).unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("schemaVersion");

    let profile = parse_document(&value.to_string()).unwrap();
    assert_eq!(profile.schema_version, 1);
    assert_eq!(profile.name, "Legacy");
}

#[test]
fn deleting_current_profile_keeps_live_data() {
    let mut tracker = seeded_tracker();
    let run = tracker.create_game_profile("Run 1", None).unwrap();
    tracker.game_profiles_mut().delete(&run).unwrap();

    assert!(tracker.game_profiles().current().is_none());
    assert!(tracker.store().get(keys::CURRENT_PROFILE_ID).is_none());
    assert_eq!(tracker.objectives().len(), 1);
    assert_eq!(tracker.missions().len(), 1);
}

#[test]
fn duplicate_and_update_keep_current_pointer() {
    let mut tracker = seeded_tracker();
    let run = tracker.create_game_profile("Run 1", None).unwrap();
    let copy = tracker.game_profiles_mut().duplicate(&run, "Run 1 (backup)").unwrap();
    assert_eq!(tracker.game_profiles().current().unwrap().id, run);

    tracker
        .game_profiles_mut()
        .update(
            &copy,
            GameProfilePatch {
                total_play_time: Some(3_600),
                ..GameProfilePatch::default()
            },
        )
        .unwrap();
    let copy = tracker.game_profiles().get(&copy).unwrap();
    assert_eq!(copy.name, "Run 1 (backup)");
    assert_eq!(copy.total_play_time, 3_600);
}
