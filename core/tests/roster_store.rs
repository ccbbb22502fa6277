//! Roster store tests.
//!
//! Covers:
//!   1. Worker round trip through SQLite, including tags and enums
//!   2. Upserts bump the record version
//!   3. commit_run applies deltas and persists events and the result
//!   4. A stale version rolls the whole commit back
//!   5. Deactivated workers stay stored but drop out of the next run

use taskalloc_core::{
    config::AllocConfig,
    engine::AllocationEngine,
    error::AllocError,
    event::{AllocEvent, EventLogEntry},
    store::RosterStore,
    task::Task,
    worker::{Role, Seniority, Worker},
};

fn store() -> RosterStore {
    let store = RosterStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn engine(run_id: &str) -> AllocationEngine {
    AllocationEngine::new(run_id.into(), AllocConfig::default()).unwrap()
}

fn seeded(store: &RosterStore) {
    store
        .upsert_worker(
            &Worker::new("a", "Ana Costa", "ana@example.com")
                .with_role(Role::DataScientist)
                .with_skills(["python", "ml"])
                .with_preferences(["data"])
                .with_seniority(Seniority::Senior)
                .with_capacity(40.0, 10.0)
                .with_rating(4.5),
        )
        .unwrap();
    store
        .upsert_worker(&Worker::new("b", "Ben Okafor", "ben@example.com").with_skills(["react"]))
        .unwrap();
}

// ─── Test 1 ──────────────────────────────────────────────────────

#[test]
fn workers_round_trip() {
    let store = store();
    seeded(&store);

    let roster = store.load_roster().unwrap();
    assert_eq!(roster.len(), 2);
    let a = &roster[0];
    assert_eq!(a.id, "a");
    assert_eq!(a.role, Role::DataScientist);
    assert_eq!(a.seniority, Seniority::Senior);
    assert!(a.has_skill("ML"));
    assert!(a.preferences.contains("data"));
    assert_eq!(a.current_workload_hours, 10.0);
    assert_eq!(a.performance_rating, 4.5);
    assert!(a.is_active);
    assert_eq!(store.worker_count().unwrap(), 2);
}

// ─── Test 2 ──────────────────────────────────────────────────────

#[test]
fn upsert_bumps_version() {
    let store = store();
    seeded(&store);
    assert_eq!(store.worker_version("a").unwrap(), Some(0));

    let mut a = store.get_worker("a").unwrap();
    a.skills.insert("sql".into());
    store.upsert_worker(&a).unwrap();

    assert_eq!(store.worker_version("a").unwrap(), Some(1));
    assert!(store.get_worker("a").unwrap().has_skill("sql"));
    assert_eq!(store.worker_version("nobody").unwrap(), None);
    assert!(matches!(
        store.get_worker("nobody"),
        Err(AllocError::WorkerNotFound { .. })
    ));
}

// ─── Test 3 ──────────────────────────────────────────────────────

#[test]
fn commit_applies_deltas_and_persists_run() {
    let store = store();
    seeded(&store);

    let tasks = vec![Task::new("t1", "Churn model", 12).with_skills(["python", "ml"])];
    let run = engine("commit-test").run(&tasks, &store.load_roster().unwrap()).unwrap();
    assert_eq!(run.workload_deltas.len(), 1);

    store.commit_run(&run, "0.1.0-test").unwrap();

    let a = store.get_worker("a").unwrap();
    assert_eq!(a.current_workload_hours, 22.0);
    assert_eq!(a.version, 1);
    assert_eq!(store.committed_hours("a").unwrap(), 12.0);
    assert_eq!(store.worker_version("b").unwrap(), Some(0));

    assert!(store.run_exists("commit-test").unwrap());
    let events = store.events_for_run("commit-test").unwrap();
    assert_eq!(events.len(), run.events.len());
    assert_eq!(events[0].event_type, "run_started");
    assert_eq!(events[0].phase, "engine");
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));

    let saved = store.load_run_result("commit-test").unwrap().unwrap();
    assert_eq!(saved.allocations, run.allocations);
    assert!(store.load_run_result("missing").unwrap().is_none());
}

// ─── Test 4 ──────────────────────────────────────────────────────

#[test]
fn stale_version_rolls_back_the_commit() {
    let store = store();
    seeded(&store);
    let roster = store.load_roster().unwrap();

    let tasks = vec![Task::new("t1", "Feature store", 8).with_skills(["python"])];
    let first = engine("first").run(&tasks, &roster).unwrap();
    let second = engine("second").run(&tasks, &roster).unwrap();

    store.commit_run(&first, "0.1.0-test").unwrap();
    let err = store.commit_run(&second, "0.1.0-test").unwrap_err();
    assert!(
        matches!(err, AllocError::StaleWorkerVersion { expected: 0, actual: 1, .. }),
        "{err}"
    );

    // Nothing from the second run survived.
    assert!(!store.run_exists("second").unwrap());
    assert!(store.events_for_run("second").unwrap().is_empty());
    assert_eq!(store.get_worker("a").unwrap().current_workload_hours, 18.0);

    // Re-running against the fresh roster commits cleanly.
    let retry = engine("second-retry")
        .run(&tasks, &store.load_roster().unwrap())
        .unwrap();
    store.commit_run(&retry, "0.1.0-test").unwrap();
    assert_eq!(store.get_worker("a").unwrap().current_workload_hours, 26.0);
}

#[test]
fn commit_for_unknown_worker_fails() {
    let store = store();
    seeded(&store);

    let outsider = Worker::new("z", "Zed", "z@example.com").with_skills(["python"]);
    let tasks = vec![Task::new("t1", "Job", 4).with_skills(["python"])];
    let run = engine("outsider").run(&tasks, &[outsider]).unwrap();

    assert!(matches!(
        store.commit_run(&run, "0.1.0-test"),
        Err(AllocError::WorkerNotFound { .. })
    ));
    assert!(!store.run_exists("outsider").unwrap());
}

// ─── Test 5 ──────────────────────────────────────────────────────

#[test]
fn deactivated_worker_is_excluded_from_runs() {
    let store = store();
    seeded(&store);
    store.set_worker_active("a", false).unwrap();

    let roster = store.load_roster().unwrap();
    assert_eq!(roster.len(), 2);
    assert!(!roster[0].is_active);

    let tasks = vec![Task::new("t1", "Model", 6).with_skills(["python"])];
    let run = engine("inactive").run(&tasks, &roster).unwrap();
    assert!(run.allocation_for("a").is_none());

    assert!(matches!(
        store.set_worker_active("ghost", true),
        Err(AllocError::WorkerNotFound { .. })
    ));
}

#[test]
fn events_can_be_appended_outside_a_commit() {
    let store = store();
    store.insert_run("manual", "2026-03-02T09:00:00+00:00", "0.1.0-test").unwrap();

    let events = [
        AllocEvent::TaskDropped { task_id: "t9".into(), hours: 50 },
        AllocEvent::ConsolidationCompleted { allocated: 0, dropped: 1, workers_used: 0 },
    ];
    for (seq, event) in events.iter().enumerate() {
        let entry = EventLogEntry::from_event("manual", seq as u64, event).unwrap();
        store.append_event(&entry).unwrap();
    }

    let stored = store.events_for_run("manual").unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].event_type, "task_dropped");
    assert_eq!(stored[1].phase, "optimizer");
    let back: AllocEvent = serde_json::from_str(&stored[0].payload).unwrap();
    assert_eq!(back, events[0]);
}
