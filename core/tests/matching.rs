//! Initial matcher tests.
//!
//! Covers:
//!   1. Availability decides between equally skilled workers
//!   2. Tasks are processed in (priority, complexity) order
//!   3. Score ties go to the lowest worker id
//!   4. The half-hours free-capacity rule
//!   5. Below-threshold tasks come back unallocated, never raised
//!   6. Same inputs, same output
//!   7. Every assignment clears the score threshold across generated rosters

use chrono::{TimeZone, Utc};
use taskalloc_core::{
    allocation::UnallocatedReason,
    config::AllocConfig,
    matcher::{sorted_for_matching, InitialMatcher},
    scenario::ScenarioGenerator,
    task::{Complexity, Priority, Task},
    worker::{Roster, Worker},
};

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn python_dev(id: &str, load: f64) -> Worker {
    Worker::new(id, id.to_uppercase(), format!("{id}@example.com"))
        .with_skills(["Python"])
        .with_capacity(40.0, load)
}

// ─── Test 1 ──────────────────────────────────────────────────────

#[test]
fn idle_worker_beats_loaded_worker() {
    let roster = Roster::new(vec![
        python_dev("a", 0.0),
        Worker::new("b", "B", "b@example.com")
            .with_skills(["Python", "React"])
            .with_capacity(40.0, 35.0),
    ])
    .unwrap();
    let tasks = vec![
        Task::new("t1", "Payments API", 10)
            .with_priority(Priority::High)
            .with_skills(["Python"]),
        Task::new("t2", "Report job", 8)
            .with_priority(Priority::Medium)
            .with_skills(["Python"]),
    ];

    let config = AllocConfig::default();
    let outcome = InitialMatcher::new(&config, start()).run(&tasks, &roster);

    assert_eq!(outcome.workers_used(), 1);
    let a = &outcome.allocations["a"];
    let ids: Vec<&str> = a.task_ids().map(String::as_str).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
    assert_eq!(a.total_estimated_hours, 18);
    assert!(outcome.unallocated.is_empty());
    assert!((outcome.ledger.load("a") - 18.0).abs() < 1e-9);
    assert!((outcome.ledger.load("b") - 35.0).abs() < 1e-9);
}

// ─── Test 2 ──────────────────────────────────────────────────────

#[test]
fn priority_then_complexity_order_is_stable() {
    let tasks = vec![
        Task::new("low", "Low", 1).with_priority(Priority::Low),
        Task::new("med-1", "Med 1", 1),
        Task::new("crit", "Crit", 1).with_priority(Priority::Critical),
        Task::new("med-hard", "Med hard", 1).with_complexity(Complexity::High),
        Task::new("med-2", "Med 2", 1),
    ];
    let order: Vec<&str> = sorted_for_matching(&tasks)
        .into_iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(order, vec!["crit", "med-hard", "med-1", "med-2", "low"]);
}

// ─── Test 3 ──────────────────────────────────────────────────────

#[test]
fn score_ties_go_to_lowest_id() {
    // Input order deliberately reversed; the roster sorts by id.
    let roster = Roster::new(vec![python_dev("w-2", 0.0), python_dev("w-1", 0.0)]).unwrap();
    let tasks = vec![Task::new("t1", "Job", 4).with_skills(["python"])];

    let config = AllocConfig::default();
    let outcome = InitialMatcher::new(&config, start()).run(&tasks, &roster);
    assert_eq!(outcome.assignments[0].worker_id, "w-1");
}

// ─── Test 4 ──────────────────────────────────────────────────────

#[test]
fn worker_needs_half_the_task_hours_free() {
    // 4h free; a 10h task needs 5h free.
    let roster = Roster::new(vec![python_dev("a", 36.0)]).unwrap();
    let tasks = vec![
        Task::new("big", "Big", 10).with_skills(["python"]),
        Task::new("small", "Small", 8).with_skills(["python"]),
    ];

    let config = AllocConfig::default();
    let outcome = InitialMatcher::new(&config, start()).run(&tasks, &roster);

    assert_eq!(outcome.unallocated.len(), 1);
    assert_eq!(outcome.unallocated[0].task.id, "big");
    assert_eq!(outcome.unallocated[0].reason, UnallocatedReason::NoEligibleWorker);
    assert_eq!(outcome.unallocated[0].best_score, None);
    // 8h task needs 4h free: exactly what is left.
    assert_eq!(outcome.assignments.len(), 1);
    assert_eq!(outcome.assignments[0].task_id, "small");
}

// ─── Test 5 ──────────────────────────────────────────────────────

#[test]
fn weak_match_is_returned_unallocated() {
    // No skill overlap (only the seniority bonus), nearly full, rated 0:
    // 0.5 * 0.1 + 0.3 * (4/40) + 0 = 0.08.
    let roster = Roster::new(vec![Worker::new("a", "A", "a@example.com")
        .with_skills(["figma"])
        .with_capacity(40.0, 36.0)
        .with_rating(0.0)])
    .unwrap();
    let tasks = vec![Task::new("t1", "Rust service", 6).with_skills(["rust"])];

    let config = AllocConfig::default();
    let outcome = InitialMatcher::new(&config, start()).run(&tasks, &roster);

    assert!(outcome.allocations.is_empty());
    let miss = &outcome.unallocated[0];
    assert_eq!(miss.reason, UnallocatedReason::BelowScoreThreshold);
    let best = miss.best_score.unwrap();
    assert!((best - 0.08).abs() < 1e-9, "best score was {best}");
}

// ─── Test 6 ──────────────────────────────────────────────────────

#[test]
fn matching_is_idempotent() {
    let roster = Roster::new(vec![
        python_dev("a", 10.0),
        python_dev("b", 0.0),
        Worker::new("c", "C", "c@example.com").with_skills(["react", "css"]),
    ])
    .unwrap();
    let tasks = vec![
        Task::new("t1", "One", 12).with_skills(["python"]),
        Task::new("t2", "Two", 6).with_skills(["react"]),
        Task::new("t3", "Three", 20)
            .with_skills(["python", "react"])
            .with_priority(Priority::High),
    ];

    let config = AllocConfig::default();
    let first = InitialMatcher::new(&config, start()).run(&tasks, &roster);
    let second = InitialMatcher::new(&config, start()).run(&tasks, &roster);

    assert_eq!(first.allocations, second.allocations);
    assert_eq!(first.assignments, second.assignments);
    assert_eq!(first.events, second.events);
}

// ─── Test 7 ──────────────────────────────────────────────────────

#[test]
fn every_assignment_clears_the_score_threshold() {
    let config = AllocConfig::default();
    let threshold = config.scoring.min_allocation_score;
    for seed in [3u64, 17, 42, 512, 2_026] {
        let gen = ScenarioGenerator::new(seed);
        let roster = Roster::new(gen.roster(12)).unwrap();
        let tasks = gen.tasks(40);

        let outcome = InitialMatcher::new(&config, start()).run(&tasks, &roster);

        assert!(!outcome.assignments.is_empty(), "seed {seed} matched nothing");
        for a in &outcome.assignments {
            assert!(
                a.allocation_score > threshold,
                "seed {seed}: {} -> {} scored {}",
                a.task_id,
                a.worker_id,
                a.allocation_score
            );
        }
        assert_eq!(outcome.assignments.len() + outcome.unallocated.len(), tasks.len());
    }
}
