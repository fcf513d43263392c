//! End-to-end scenarios through the public engine API.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chl_core::{DomainEvent, EndCause, Environment, ManualClock, OverridePriority, PlayerId, SessionState};
use chl_rules::{
    ChallengeEngine, ChallengeEntry, GoalPredicate, RulesConfig, RulesError, SettingRange, ShutdownReason,
    default_catalog,
};

fn kill(entity: &str, environment: Environment, killer: &str) -> DomainEvent {
    DomainEvent::EntityEliminated {
        entity: entity.into(),
        environment,
        killer: Some(PlayerId::new(killer)),
    }
}

fn kill_goal(id: &str, entity: &str) -> ChallengeEntry {
    ChallengeEntry::goal(
        id,
        id,
        GoalPredicate::KillEntity {
            entity: entity.into(),
            environment: None,
        },
    )
    .enabled(true)
}

fn empty_engine() -> (ChallengeEngine, ManualClock) {
    let clock = ManualClock::new();
    let engine = ChallengeEngine::new(RulesConfig::default(), Arc::new(clock.clone()));
    (engine, clock)
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn first_matching_goal_ends_the_session() {
    let (mut engine, _) = empty_engine();
    engine.register(kill_goal("goal_a", "wither")).unwrap();
    engine.register(kill_goal("goal_b", "warden")).unwrap();
    engine.start().unwrap();
    assert_eq!(engine.session_state(), SessionState::Running);

    let reached = engine.dispatch(&kill("wither", Environment::Nether, "steve")).unwrap();
    assert_eq!(reached.goal, "goal_a");
    assert_eq!(engine.session_state(), SessionState::Ended);
    assert_eq!(engine.session().end_cause(), Some(EndCause::GoalReached));
    assert_eq!(engine.get("goal_a").unwrap().winner(), Some(&PlayerId::new("steve")));
    assert_eq!(engine.get("goal_b").unwrap().winner(), None);

    assert!(engine.dispatch(&kill("warden", Environment::Overworld, "alex")).is_none());
    assert_eq!(engine.get("goal_b").unwrap().winner(), None);
    assert_eq!(engine.session().end_cause(), Some(EndCause::GoalReached));
}

#[test]
fn first_registered_goal_wins_a_shared_event() {
    let (mut engine, _) = empty_engine();
    engine.register(kill_goal("goal_a", "wither")).unwrap();
    engine.register(kill_goal("goal_b", "wither")).unwrap();
    engine.start().unwrap();

    let reached = engine.dispatch(&kill("wither", Environment::Nether, "steve")).unwrap();
    assert_eq!(reached.goal, "goal_a");
    assert!(engine.get("goal_a").unwrap().goal_state().unwrap().reached);
    assert!(!engine.get("goal_b").unwrap().goal_state().unwrap().reached);
    assert_eq!(engine.get("goal_b").unwrap().winner(), None);
    assert_eq!(engine.session().end_cause(), Some(EndCause::GoalReached));
    assert_eq!(engine.winners(), vec![PlayerId::new("steve")]);
}

#[test]
fn randomizer_layers_come_and_go_with_enable() {
    let (mut engine, _) = empty_engine();
    let domain = strings(&["stone", "dirt", "sand"]);
    let results = strings(&["apple", "stick", "bread"]);
    engine
        .register(ChallengeEntry::randomizer("blocks", "Blocks", domain.clone(), results.clone()))
        .unwrap();
    engine.set_override("stone", strings(&["diamond"]));

    engine.enable("blocks").unwrap();
    let table = engine.overrides();
    assert_eq!(table.count(OverridePriority::Randomizer), 3);
    let mut union: Vec<String> = domain
        .iter()
        .flat_map(|k| table.layer(k, OverridePriority::Randomizer).unwrap().to_vec())
        .collect();
    union.sort();
    let mut expected = results.clone();
    expected.sort();
    assert_eq!(union, expected);
    assert_eq!(engine.resolve("stone"), Some(&["diamond".to_string()][..]));

    engine.disable("blocks").unwrap();
    let table = engine.overrides();
    assert_eq!(table.count(OverridePriority::Randomizer), 0);
    assert_eq!(
        table.layer(&"stone".to_string(), OverridePriority::Explicit),
        Some(&["diamond".to_string()][..])
    );
    assert_eq!(engine.resolve("dirt"), None);
}

#[test]
fn out_of_range_value_is_rejected() {
    let (mut engine, _) = empty_engine();
    engine
        .register(ChallengeEntry::modifier("max_health", "Max Health", SettingRange::new(1, 40), 20))
        .unwrap();

    let err = engine.set_value("max_health", 41).unwrap_err();
    assert_eq!(
        err,
        RulesError::OutOfRange {
            id: "max_health".into(),
            value: 41,
            min: 1,
            max: 40,
        }
    );
    assert_eq!(engine.get("max_health").unwrap().value, 20);
}

#[test]
fn events_outside_a_running_session_never_end_it() {
    let (mut engine, _) = empty_engine();
    engine.register(kill_goal("goal_a", "wither")).unwrap();
    let event = kill("wither", Environment::Nether, "steve");

    assert!(engine.dispatch(&event).is_none());
    assert_eq!(engine.session_state(), SessionState::Idle);

    engine.start().unwrap();
    engine.pause().unwrap();
    assert!(engine.dispatch(&event).is_none());
    assert_eq!(engine.session_state(), SessionState::Paused);
    assert_eq!(engine.get("goal_a").unwrap().winner(), None);

    engine.resume().unwrap();
    assert!(engine.dispatch(&event).is_some());
}

#[test]
fn shutdown_and_restore_round_trip() {
    let clock = ManualClock::new();
    let config = RulesConfig::default().with_seed(7);
    let mut engine = ChallengeEngine::with_catalog(config.clone(), Arc::new(clock.clone()), default_catalog()).unwrap();
    engine.enable("block_randomizer").unwrap();
    engine.set_value("max_health", 10).unwrap();
    engine.start().unwrap();
    clock.advance(Duration::from_secs(300));

    let snapshot = engine.shutdown(ShutdownReason::Normal);
    assert_eq!(engine.overrides().count(OverridePriority::Randomizer), 0);
    let session = snapshot.session.as_deref().expect("normal shutdown keeps the session");

    let mut restored = ChallengeEngine::with_catalog(config, Arc::new(clock.clone()), default_catalog()).unwrap();
    restored.load_settings(Some(&snapshot.settings));
    restored.restore_session(Some(session));

    assert_eq!(restored.get("max_health").unwrap().value, 10);
    assert!(restored.get("block_randomizer").unwrap().enabled);
    assert!(restored.overrides().count(OverridePriority::Randomizer) > 0);
    assert_eq!(restored.session_state(), SessionState::Paused);
    assert_eq!(restored.elapsed(), Duration::from_secs(300));

    clock.advance(Duration::from_secs(60));
    assert_eq!(restored.elapsed(), Duration::from_secs(300));
    restored.resume().unwrap();
    clock.advance(Duration::from_secs(5));
    assert_eq!(restored.elapsed(), Duration::from_secs(305));
}

#[test]
fn reached_goals_survive_shutdown_and_restore() {
    let (mut engine, _) = empty_engine();
    engine.register(kill_goal("goal_a", "wither")).unwrap();
    engine.start().unwrap();
    engine.dispatch(&kill("wither", Environment::Nether, "steve")).unwrap();
    let snapshot = engine.shutdown(ShutdownReason::Normal);

    let (mut restored, _) = empty_engine();
    restored.register(kill_goal("goal_a", "wither")).unwrap();
    restored.load_settings(Some(&snapshot.settings));
    restored.load_gamestate(snapshot.gamestate.as_deref());
    restored.restore_session(snapshot.session.as_deref());

    assert_eq!(restored.session_state(), SessionState::Ended);
    assert_eq!(restored.winners(), vec![PlayerId::new("steve")]);
    assert!(restored.dispatch(&kill("wither", Environment::Nether, "alex")).is_none());
}

#[test]
fn resume_on_load_keeps_running_sessions_running() {
    let clock = ManualClock::new();
    let mut engine = ChallengeEngine::new(RulesConfig::default(), Arc::new(clock.clone()));
    engine.start().unwrap();
    clock.advance(Duration::from_secs(12));
    let bytes = engine.session_snapshot().encode();

    let config = RulesConfig::default().with_resume_on_load(true);
    let mut restored = ChallengeEngine::new(config, Arc::new(clock.clone()));
    restored.restore_session(Some(&bytes));
    assert_eq!(restored.session_state(), SessionState::Running);
    clock.advance(Duration::from_secs(3));
    assert_eq!(restored.elapsed(), Duration::from_secs(15));
}

#[test]
fn reset_shutdown_drops_the_session() {
    let (mut engine, _) = empty_engine();
    engine.start().unwrap();
    let snapshot = engine.shutdown(ShutdownReason::Reset);
    assert!(snapshot.session.is_none());
    assert!(snapshot.gamestate.is_none());
    assert!(!snapshot.settings.is_empty());
}

#[test]
fn catalog_registers_cleanly() {
    let (engine, _) = {
        let clock = ManualClock::new();
        let engine =
            ChallengeEngine::with_catalog(RulesConfig::default(), Arc::new(clock.clone()), default_catalog()).unwrap();
        (engine, clock)
    };
    let ids: HashSet<_> = engine.registry().entries().iter().map(|e| e.id.clone()).collect();
    assert!(ids.contains("kill_ender_dragon"));
    assert!(ids.contains("block_randomizer"));
    assert!(engine.overrides().is_empty());
}
