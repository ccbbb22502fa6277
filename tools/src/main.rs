//! alloc-runner: headless allocation runner.
//!
//! Usage:
//!   alloc-runner --tasks tasks.json --roster roster.json [--config cfg.json]
//!   alloc-runner --seed 42 --workers 12 --tasks-count 30
//!   alloc-runner --seed 42 --db team.db --commit --json

use anyhow::{bail, Context, Result};
use std::env;
use taskalloc_core::{
    config::AllocConfig,
    engine::{AllocationEngine, AllocationRun},
    scenario::ScenarioGenerator,
    store::RosterStore,
    task::Task,
    worker::Worker,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let worker_count = parse_arg(&args, "--workers", 10usize);
    let task_count = parse_arg(&args, "--tasks-count", 25usize);
    let tasks_path = str_arg(&args, "--tasks");
    let roster_path = str_arg(&args, "--roster");
    let config_path = str_arg(&args, "--config");
    let db = str_arg(&args, "--db");
    let commit = args.iter().any(|a| a == "--commit");
    let json = args.iter().any(|a| a == "--json");

    if commit && db.is_none() {
        bail!("--commit needs --db");
    }

    let config = match config_path {
        Some(path) => AllocConfig::load(path)?,
        None => AllocConfig::default(),
    };

    let generator = ScenarioGenerator::new(seed);
    let tasks: Vec<Task> = match tasks_path {
        Some(path) => read_json(path)?,
        None => generator.tasks(task_count),
    };
    let mut workers: Vec<Worker> = match roster_path {
        Some(path) => read_json(path)?,
        None => generator.roster(worker_count),
    };

    let store = match db {
        Some(path) => {
            let store = RosterStore::open(path)?;
            store.migrate()?;
            if store.worker_count()? == 0 {
                log::info!("Seeding {} worker(s) into {path}", workers.len());
                for worker in &workers {
                    store.upsert_worker(worker)?;
                }
            }
            // The store is authoritative once it holds a roster.
            workers = store.load_roster()?;
            Some(store)
        }
        None => None,
    };

    if !json {
        println!("alloc-runner");
        println!("  tasks:    {}", tasks_path.unwrap_or("(generated)"));
        println!("  roster:   {}", roster_path.unwrap_or("(generated)"));
        println!("  seed:     {seed}");
        println!("  db:       {}", db.unwrap_or("(none)"));
        println!();
    }

    let engine = AllocationEngine::new(AllocationEngine::new_run_id(), config)?;
    let run = engine.run(&tasks, &workers)?;

    if let Some(store) = &store {
        if commit {
            store.commit_run(&run, env!("CARGO_PKG_VERSION"))?;
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_summary(&run, commit);
    }
    Ok(())
}

fn print_summary(run: &AllocationRun, committed: bool) {
    let s = &run.summary;
    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", run.run_id);
    println!("  tasks:           {}", s.total_tasks);
    println!("  allocated:       {} ({:.0}%)", s.allocated_tasks, s.allocation_rate * 100.0);
    println!("  unallocated:     {}", s.unallocated_tasks);
    println!("  hours allocated: {}", s.total_allocated_hours);
    println!(
        "  workers:         {} matched -> {} consolidated",
        s.workers_after_matching, s.workers_after_consolidation
    );
    println!("  avg match score: {:.2}", s.average_allocation_score);
    println!("  avg cost:        {:.2}", s.average_cost_efficiency);
    println!("  committed:       {committed}");

    println!();
    println!("=== ALLOCATIONS ===");
    for a in &run.allocations {
        let ids: Vec<&str> = a.task_ids().map(String::as_str).collect();
        println!(
            "  {:<24} {:>4}h  {}",
            a.worker_name,
            a.total_estimated_hours,
            ids.join(", ")
        );
        println!("      {}", a.reasoning);
    }

    if !run.unallocated.is_empty() {
        println!();
        println!("=== UNALLOCATED ===");
        for u in &run.unallocated {
            let best = u
                .best_score
                .map(|b| format!(" (best score {b:.2})"))
                .unwrap_or_default();
            println!("  {:<10} {:?}: {}{}", u.task.id, u.phase, u.reason.as_str(), best);
        }
    }

    println!();
    println!("=== UTILIZATION ===");
    for u in &run.utilization {
        println!(
            "  {:<24} {:>6.1}/{:<5.1}h  {:>5.1}%  {:?}",
            u.worker_name,
            u.allocated_hours,
            u.total_capacity,
            u.utilization_rate * 100.0,
            u.status
        );
    }

    let t = &run.analysis.timeline;
    println!();
    println!("=== ANALYSIS ===");
    println!("  total hours:     {}", t.total_estimated_hours);
    println!("  est. weeks:      {:.1}", t.estimated_weeks);
    println!("  est. months:     {:.1}", t.estimated_months);
    println!("  critical path:   {:.1} weeks", t.critical_path_weeks);
    let top: Vec<String> = run
        .analysis
        .skill_demand
        .iter()
        .take(5)
        .map(|(skill, n)| format!("{skill} ({n})"))
        .collect();
    println!("  top skills:      {}", top.join(", "));
    if !run.analysis.dangling_dependencies.is_empty() {
        println!(
            "  dangling deps:   {}",
            run.analysis.dangling_dependencies.len()
        );
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Cannot parse {path}"))
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
