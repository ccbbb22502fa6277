//! Consolidation optimizer tests.
//!
//! Covers:
//!   1. Two workers' matched work folds onto one
//!   2. Hard capacity is never exceeded
//!   3. Tasks that fit nowhere are surfaced, not lost
//!   4. Overbooked matcher work overflows to the rest of the roster;
//!      headcount grows only when the alternative is a drop
//!   5. Cheapest role wins when capacity allows; exact cost ties go to the lowest id
//!   6. Hour totals are wide enough for very large estimates

use chrono::Utc;
use std::collections::BTreeSet;
use taskalloc_core::{
    allocation::{AllocationPhase, UnallocatedReason},
    config::{AllocConfig, CandidatePool},
    engine::AllocationEngine,
    event::AllocEvent,
    matcher::InitialMatcher,
    optimizer::{sorted_for_consolidation, ConsolidationOptimizer},
    scenario::ScenarioGenerator,
    task::{Priority, Task},
    worker::{Role, Roster, Worker},
};

fn python_dev(id: &str, load: f64) -> Worker {
    Worker::new(id, id.to_uppercase(), format!("{id}@example.com"))
        .with_skills(["python"])
        .with_capacity(40.0, load)
}

fn engine() -> AllocationEngine {
    AllocationEngine::new("consolidation-test".into(), AllocConfig::default()).unwrap()
}

// ─── Test 1 ──────────────────────────────────────────────────────

#[test]
fn split_work_is_consolidated_onto_one_worker() {
    let workers = vec![python_dev("a", 0.0), python_dev("b", 0.0)];
    let tasks = vec![
        Task::new("t1", "First", 20).with_skills(["python"]),
        Task::new("t2", "Second", 20).with_skills(["python"]),
    ];

    let run = engine().run(&tasks, &workers).unwrap();

    // The matcher spreads by availability...
    assert_eq!(run.matched.len(), 2);
    assert_eq!(run.summary.workers_after_matching, 2);
    // ...the optimizer packs both onto the lowest-id worker.
    assert_eq!(run.workers_used(), 1);
    let a = run.allocation_for("a").unwrap();
    assert_eq!(a.total_estimated_hours, 40);
    assert!(run.unallocated.is_empty());
}

// ─── Test 2 ──────────────────────────────────────────────────────

#[test]
fn hard_capacity_is_respected() {
    let workers = vec![python_dev("a", 10.0), python_dev("b", 0.0)];
    let tasks: Vec<Task> = (1..=5)
        .map(|n| Task::new(format!("t{n}"), format!("Task {n}"), 12).with_skills(["python"]))
        .collect();

    let run = engine().run(&tasks, &workers).unwrap();

    for alloc in &run.allocations {
        let worker = workers.iter().find(|w| w.id == alloc.worker_id).unwrap();
        let room = worker.capacity_hours_per_week - worker.current_workload_hours;
        assert!(
            alloc.total_estimated_hours as f64 <= room,
            "{} holds {}h with {}h room",
            alloc.worker_id,
            alloc.total_estimated_hours,
            room
        );
    }
}

// ─── Test 3 ──────────────────────────────────────────────────────

#[test]
fn tasks_that_fit_nowhere_are_reported() {
    // Matcher only needs half the hours free; the optimizer needs all of them.
    let roster = Roster::new(vec![python_dev("a", 20.0)]).unwrap();
    let tasks = vec![Task::new("big", "Big", 30).with_skills(["python"])];

    let config = AllocConfig::default();
    let matched = InitialMatcher::new(&config, Utc::now()).run(&tasks, &roster);
    assert_eq!(matched.allocated_count(), 1);

    let ids: BTreeSet<String> = matched.allocations.keys().cloned().collect();
    let outcome = ConsolidationOptimizer::new(&config).run(&matched.flattened_tasks(), &roster, &ids);

    assert!(outcome.allocations.is_empty());
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].phase, AllocationPhase::Consolidation);
    assert_eq!(outcome.dropped[0].reason, UnallocatedReason::CapacityExceeded);

    // Through the engine the drop shows up in `unallocated` too.
    let run = engine()
        .run(&tasks, &[python_dev("a", 20.0)])
        .unwrap();
    assert_eq!(run.summary.allocated_tasks, 0);
    assert_eq!(run.summary.unallocated_tasks, 1);
    assert!(run.workload_deltas.is_empty());
}

// ─── Test 4 ──────────────────────────────────────────────────────

#[test]
fn overbooked_matcher_worker_overflows_to_idle_worker() {
    // The matcher only needs half of t2's hours free, so it stacks 50h on a.
    let workers = vec![
        python_dev("a", 0.0),
        Worker::new("b", "B", "b@example.com").with_skills(["figma"]),
    ];
    let tasks = vec![
        Task::new("t1", "Ingest", 30).with_skills(["python"]),
        Task::new("t2", "Export", 20).with_skills(["python"]),
    ];

    let run = engine().run(&tasks, &workers).unwrap();
    assert_eq!(run.matched.len(), 1);
    assert_eq!(run.matched[0].total_estimated_hours, 50);

    // Hard capacity moves t2 to b instead of dropping it.
    assert!(run.unallocated.is_empty());
    assert_eq!(run.allocation_for("a").unwrap().total_estimated_hours, 30);
    let b = run.allocation_for("b").unwrap();
    let ids: Vec<&str> = b.task_ids().map(String::as_str).collect();
    assert_eq!(ids, vec!["t2"]);
    assert!(run.events.iter().any(|e| matches!(
        e,
        AllocEvent::TaskConsolidated { task_id, overflow: true, .. } if task_id == "t2"
    )));
}

#[test]
fn headcount_grows_only_to_avoid_drops() {
    for seed in [1u64, 7, 42, 1234, 9_999] {
        let gen = ScenarioGenerator::new(seed);
        let workers = gen.roster(8);
        let tasks = gen.tasks(30);

        let run = engine().run(&tasks, &workers).unwrap();
        let overflowed: BTreeSet<&str> = run
            .events
            .iter()
            .filter_map(|e| match e {
                AllocEvent::TaskConsolidated { task_id, overflow: true, .. } => Some(task_id.as_str()),
                _ => None,
            })
            .collect();

        // Workers outside the matcher's set only ever hold overflow tasks.
        let matched: BTreeSet<&str> = run.matched.iter().map(|a| a.worker_id.as_str()).collect();
        for alloc in run.allocations.iter().filter(|a| !matched.contains(a.worker_id.as_str())) {
            for id in alloc.task_ids() {
                assert!(overflowed.contains(id.as_str()), "seed {seed}: {id} on {}", alloc.worker_id);
            }
        }
        if overflowed.is_empty() {
            assert!(
                run.summary.workers_after_consolidation <= run.summary.workers_after_matching,
                "seed {seed}: {} -> {}",
                run.summary.workers_after_matching,
                run.summary.workers_after_consolidation
            );
        }

        // A consolidation drop means no active worker had room left for it.
        for miss in run.unallocated.iter().filter(|u| u.phase == AllocationPhase::Consolidation) {
            for worker in workers.iter().filter(|w| w.is_active) {
                let held = run
                    .allocation_for(&worker.id)
                    .map_or(0.0, |a| a.total_estimated_hours as f64);
                let room = worker.capacity_hours_per_week - worker.current_workload_hours - held;
                assert!(
                    room < miss.task.hours(),
                    "seed {seed}: {} dropped but {} had {room}h",
                    miss.task.id,
                    worker.id
                );
            }
        }
    }
}

// ─── Test 5 ──────────────────────────────────────────────────────

#[test]
fn cheaper_role_takes_the_work() {
    let mut config = AllocConfig::default();
    config.consolidation.candidate_pool = CandidatePool::FullRoster;

    // Architect: 2.0 - 1.0 - 0.1 = 0.9. QA: 0.8 - 1.0 - 0.1 -> floor 0.1.
    let roster = Roster::new(vec![
        Worker::new("arch", "Arch", "arch@example.com")
            .with_role(Role::Architect)
            .with_skills(["python"]),
        Worker::new("qa", "Qa", "qa@example.com")
            .with_role(Role::QaEngineer)
            .with_skills(["python"]),
    ])
    .unwrap();
    let tasks = vec![
        Task::new("t1", "One", 8).with_priority(Priority::High),
        Task::new("t2", "Two", 8),
    ];

    let outcome = ConsolidationOptimizer::new(&config).run(&tasks, &roster, &BTreeSet::new());
    assert_eq!(outcome.allocations.len(), 1);
    assert_eq!(outcome.allocations[0].worker_id, "qa");
    assert!((outcome.cost_scores["arch"] - 0.9).abs() < 1e-9);
    assert!((outcome.cost_scores["qa"] - 0.1).abs() < 1e-9);
}

#[test]
fn consolidation_order_is_priority_then_hours() {
    let tasks = vec![
        Task::new("small", "Small", 2),
        Task::new("big", "Big", 16),
        Task::new("urgent", "Urgent", 1).with_priority(Priority::Critical),
    ];
    let order: Vec<&str> = sorted_for_consolidation(&tasks)
        .into_iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(order, vec!["urgent", "big", "small"]);
}

#[test]
fn equal_costs_go_to_lowest_id() {
    let config = AllocConfig::default();
    let task = [Task::new("t1", "One", 4).with_skills(["python"])];

    // Both idle: 1.0 - 1.0 - 0.1 -> floor 0.1 each, listed out of id order.
    let tied = Roster::new(vec![python_dev("c", 0.0), python_dev("b", 0.0)]).unwrap();
    let outcome = ConsolidationOptimizer::new(&config).run(&task, &tied, &BTreeSet::new());
    assert_eq!(outcome.allocations[0].worker_id, "b");

    // Distinct costs: the cheaper worker wins regardless of id.
    // b: 1.0 - 0.25 - 0.1 = 0.65, c: 1.0 - 0.5 - 0.1 = 0.4.
    let distinct = Roster::new(vec![python_dev("b", 30.0), python_dev("c", 20.0)]).unwrap();
    let outcome = ConsolidationOptimizer::new(&config).run(&task, &distinct, &BTreeSet::new());
    assert_eq!(outcome.allocations[0].worker_id, "c");
    assert!((outcome.cost_scores["c"] - 0.4).abs() < 1e-9);
}

// ─── Test 6 ──────────────────────────────────────────────────────

#[test]
fn huge_estimates_do_not_overflow_totals() {
    let workers = vec![python_dev("a", 0.0).with_capacity(1e12, 0.0)];
    let tasks = vec![
        Task::new("t1", "Archive", 3_000_000_000).with_skills(["python"]),
        Task::new("t2", "Backfill", 3_000_000_000).with_skills(["python"]),
    ];

    let run = engine().run(&tasks, &workers).unwrap();
    assert_eq!(run.matched[0].total_estimated_hours, 6_000_000_000);
    assert_eq!(run.allocations[0].total_estimated_hours, 6_000_000_000);
    assert_eq!(run.summary.total_allocated_hours, 6_000_000_000);
    assert_eq!(run.analysis.timeline.total_estimated_hours, 6_000_000_000);
    assert!((run.workload_deltas[0].hours - 6e9).abs() < 1.0);
}
