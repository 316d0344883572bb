use anyhow::{Context, Result, ensure};
use questlog_core::{
    ContentKind, ItemKind, KeyValueStore, MemoryStore, NewGuide, NewGuideStep, NewItem,
    NewMission, NewObjective, PlayerStats, QuickMission, Reward, RewardKind, RewardPolicy, Tracker,
    TrackerError, keys,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fresh state handed to every scenario iteration.
pub struct ScenarioCtx {
    pub seed: u64,
    pub rng: ChaCha8Rng,
    pub tracker: Tracker<MemoryStore>,
}

impl ScenarioCtx {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tracker: Tracker::open(MemoryStore::new()),
        }
    }
}

pub type ScenarioFn = fn(&mut ScenarioCtx) -> Result<()>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            key: "smoke",
            name: "Smoke",
            description: "Create one record of each kind and complete them",
            run: smoke,
        },
        Scenario {
            key: "reward-cascade",
            name: "Reward Cascade",
            description: "Mission completion pays objectives, mission and item rewards once",
            run: reward_cascade,
        },
        Scenario {
            key: "level-curve",
            name: "Level Curve",
            description: "Random XP grants cross exactly the thresholds they pass",
            run: level_curve,
        },
        Scenario {
            key: "quick-missions",
            name: "Quick Missions",
            description: "Random toggles keep phase and mission completion derived",
            run: quick_missions,
        },
        Scenario {
            key: "content-packs",
            name: "Content Packs",
            description: "Active session profile filters every list to its members",
            run: content_packs,
        },
        Scenario {
            key: "save-states",
            name: "Save States",
            description: "Load restores snapshots; export/import round-trips domain data",
            run: save_states,
        },
        Scenario {
            key: "storage-quota",
            name: "Storage Quota",
            description: "Rejected writes surface as storage errors without panicking",
            run: storage_quota,
        },
    ]
}

#[must_use]
pub fn find_scenario(key: &str) -> Option<Scenario> {
    catalog().into_iter().find(|scenario| scenario.key == key)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

fn smoke(ctx: &mut ScenarioCtx) -> Result<()> {
    let t = &mut ctx.tracker;
    let objective = t.objectives_mut().add(NewObjective::new("Scout the Ridge"))?;
    let mission = t.add_mission(
        NewMission::new("Secure the Pass", "Main Quest").with_objective(objective.clone()),
    )?;
    let guide = t.add_guide(
        NewGuide::new("Ridge Walkthrough", "Beginner")
            .with_step(NewGuideStep::new("Take the pass").with_mission(mission.clone())),
    )?;
    t.inventory_mut().add(NewItem::new("Rope", ItemKind::Item, 1))?;

    let progress = t
        .complete_guide(&guide)?
        .context("fresh guide should complete")?;
    ensure!(progress.guide_completed, "guide not marked complete");
    ensure!(
        t.objectives().get(&objective).is_some_and(|o| o.completed),
        "objective not completed through the cascade"
    );
    ensure!(
        t.missions().get(&mission).is_some_and(|m| m.completed),
        "mission not completed through the cascade"
    );
    let stats = t.stats();
    ensure!(stats.objectives.completed == 1, "dashboard objective count");
    ensure!(stats.inventory_units == 1, "dashboard inventory units");
    // 100 + 500 + 1000 default XP
    ensure!(progress.grant.xp == 1_600, "unexpected XP {}", progress.grant.xp);
    Ok(())
}

fn reward_cascade(ctx: &mut ScenarioCtx) -> Result<()> {
    let count = ctx.rng.gen_range(1..6);
    let mut expected_gold = 0_u64;
    let mut objective_ids = Vec::new();
    for n in 0..count {
        let gold: u32 = ctx.rng.gen_range(0..50);
        expected_gold += u64::from(gold);
        let objective =
            NewObjective::new(format!("Objective {n}")).with_gold(RewardPolicy::on_completion(gold));
        objective_ids.push(ctx.tracker.objectives_mut().add(objective)?);
    }
    let mission_gold: u32 = ctx.rng.gen_range(0..200);
    let pelts: u32 = ctx.rng.gen_range(1..10);
    expected_gold += u64::from(mission_gold);

    let mut mission = NewMission::new("Hunt", "Side Quest")
        .with_gold(RewardPolicy::on_completion(mission_gold))
        .with_reward(Reward::new(RewardKind::Resource, "Pelt", pelts)?);
    for id in &objective_ids {
        mission = mission.with_objective(id.clone());
    }
    let mission = ctx.tracker.add_mission(mission)?;

    let done = ctx
        .tracker
        .complete_mission(&mission)?
        .context("mission should complete once")?;
    ensure!(
        done.grant.gold == expected_gold,
        "paid {} gold, expected {expected_gold}",
        done.grant.gold
    );
    ensure!(
        ctx.tracker.player().stats().gold == expected_gold,
        "player gold drifted from the grant"
    );
    let held = ctx
        .tracker
        .inventory()
        .find_by_name("pelt")
        .map_or(0, |item| item.quantity);
    ensure!(held == pelts, "inventory holds {held} pelts, expected {pelts}");

    ensure!(
        ctx.tracker.complete_mission(&mission)?.is_none(),
        "second completion paid again"
    );
    ensure!(
        ctx.tracker.player().stats().gold == expected_gold,
        "second completion changed gold"
    );
    Ok(())
}

fn level_curve(ctx: &mut ScenarioCtx) -> Result<()> {
    let base: u64 = ctx.rng.gen_range(50..5_000);
    let increase: u64 = ctx.rng.gen_range(0..1_000);
    let mut stats = PlayerStats {
        next_level_xp: base,
        base_xp_per_level: base,
        xp_increase_per_level: increase,
        ..PlayerStats::default()
    };
    let mut banked = 0_u64;
    for _ in 0..50 {
        let amount: u64 = ctx.rng.gen_range(0..10_000);
        let before = stats.level;
        let gained = stats.add_xp(amount);
        banked += amount;
        ensure!(stats.level == before + gained, "level count mismatch");
        ensure!(stats.xp < stats.next_level_xp, "xp left above threshold");
        let spent: u64 = (1..stats.level)
            .map(|level| PlayerStats::xp_for_level(level, base, increase))
            .sum();
        ensure!(spent + stats.xp == banked, "xp lost across level-ups");
    }
    Ok(())
}

fn quick_consistent(mission: &QuickMission) -> bool {
    let phases_ok = mission.phases.iter().all(|phase| {
        let done = !phase.objectives.is_empty() && phase.objectives.iter().all(|o| o.completed);
        phase.completed == done
    });
    let done = !mission.phases.is_empty() && mission.phases.iter().all(|p| p.completed);
    phases_ok && mission.completed == done
}

fn quick_missions(ctx: &mut ScenarioCtx) -> Result<()> {
    let quick = ctx.tracker.quick_missions_mut();
    let mission = quick.add_mission("Chores", "")?;
    let mut leaves = Vec::new();
    for p in 0..ctx.rng.gen_range(1..4) {
        let phase = quick.add_phase(&mission, &format!("Phase {p}"), "")?;
        for o in 0..ctx.rng.gen_range(1..4) {
            let objective = quick.add_objective(&mission, &phase, &format!("Task {o}"))?;
            leaves.push((phase.clone(), objective));
        }
    }
    for _ in 0..100 {
        let (phase, objective) = &leaves[ctx.rng.gen_range(0..leaves.len())];
        quick.toggle_objective(&mission, phase, objective)?;
        let current = quick.get(&mission).context("quick mission vanished")?;
        ensure!(quick_consistent(current), "derived completion drifted");
    }
    Ok(())
}

fn content_packs(ctx: &mut ScenarioCtx) -> Result<()> {
    let mut members = Vec::new();
    let mut all = Vec::new();
    for n in 0..ctx.rng.gen_range(2..10) {
        let id = ctx
            .tracker
            .add_mission(NewMission::new(format!("Mission {n}"), "Generic"))?;
        if ctx.rng.gen_bool(0.5) {
            members.push(id.clone());
        }
        all.push(id);
    }
    let pack = ctx.tracker.session_profiles_mut().create("Build A", None, None)?;
    for id in &members {
        ctx.tracker
            .session_profiles_mut()
            .add_content(&pack, ContentKind::Mission, id)?;
    }
    ctx.tracker.session_profiles_mut().set_active(Some(pack.as_str()))?;

    let visible: Vec<String> = ctx
        .tracker
        .visible_missions()
        .iter()
        .map(|m| m.id.clone())
        .collect();
    ensure!(visible == members, "visible {visible:?} != members {members:?}");

    ctx.tracker.session_profiles_mut().set_active(None)?;
    ensure!(
        ctx.tracker.visible_missions().len() == all.len(),
        "clearing the active profile should show everything"
    );
    Ok(())
}

fn save_states(ctx: &mut ScenarioCtx) -> Result<()> {
    for n in 0..ctx.rng.gen_range(1..5) {
        ctx.tracker
            .objectives_mut()
            .add(NewObjective::new(format!("Objective {n}")))?;
    }
    let snapshot: Vec<String> = ctx
        .tracker
        .objectives()
        .list()
        .iter()
        .map(|o| o.id.clone())
        .collect();
    let run = ctx.tracker.create_game_profile("Run 1", None)?;

    for n in 0..ctx.rng.gen_range(1..5) {
        ctx.tracker
            .objectives_mut()
            .add(NewObjective::new(format!("Later {n}")))?;
    }
    ctx.tracker.player_mut().add_gold(ctx.rng.gen_range(1..1_000))?;

    ctx.tracker.load_game_profile(&run)?;
    let restored: Vec<String> = ctx
        .tracker
        .objectives()
        .list()
        .iter()
        .map(|o| o.id.clone())
        .collect();
    ensure!(restored == snapshot, "load did not restore the snapshot");
    ensure!(ctx.tracker.player().stats().gold == 0, "gold not restored");

    let document = ctx.tracker.game_profiles().export(&run)?;
    let imported = ctx.tracker.game_profiles_mut().import(&document)?;
    let original = ctx.tracker.game_profiles().get(&run).context("original")?;
    let copy = ctx.tracker.game_profiles().get(&imported).context("copy")?;
    ensure!(copy.data == original.data, "import changed domain data");
    ensure!(copy.id != original.id, "import reused the profile id");
    Ok(())
}

fn storage_quota(ctx: &mut ScenarioCtx) -> Result<()> {
    let limit = ctx.rng.gen_range(1_000..4_000);
    let store = MemoryStore::with_quota(limit);
    let mut tracker = Tracker::open(store.clone());
    let mut durable = 0;
    let err = loop {
        match tracker
            .objectives_mut()
            .add(NewObjective::new(format!("Objective {durable}")))
        {
            Ok(_) => durable += 1,
            Err(err) => break err,
        }
        ensure!(durable < 1_000, "quota of {limit} bytes never reached");
    };
    ensure!(
        matches!(err, TrackerError::Storage(_)),
        "expected a storage error, got {err}"
    );
    ensure!(store.get(keys::OBJECTIVES).is_some(), "earlier writes lost");
    let reopened = Tracker::open(store);
    ensure!(
        reopened.objectives().len() == durable,
        "store holds {} objectives, expected {durable}",
        reopened.objectives().len()
    );
    Ok(())
}
