//! Seeded synthetic scenarios: a roster plus a task backlog.
//!
//! Same seed, same scenario. Used by the runner's demo mode and by the
//! determinism tests.

use crate::{
    name_generator::NameGenerator,
    rng::{RngBank, StreamRng, StreamSlot},
    task::{Complexity, Priority, Task},
    worker::{Role, Seniority, Worker, DEFAULT_CAPACITY_HOURS},
};

/// Skills each role draws from.
const ROLE_SKILLS: &[(Role, &[&str])] = &[
    (Role::Developer, &["python", "rust", "javascript", "react", "sql", "api"]),
    (Role::Designer, &["figma", "ux", "ui", "prototyping", "css"]),
    (Role::ProductManager, &["roadmap", "analytics", "stakeholders", "ux"]),
    (Role::QaEngineer, &["testing", "automation", "python", "selenium"]),
    (Role::DevopsEngineer, &["kubernetes", "terraform", "aws", "ci", "docker"]),
    (Role::DataScientist, &["python", "ml", "sql", "statistics", "analytics"]),
    (Role::Architect, &["api", "aws", "rust", "sql", "kubernetes"]),
];

struct TaskTemplate {
    category: &'static str,
    subject: &'static str,
    skills: &'static [&'static str],
    hours: (u32, u32),
}

const TASK_TEMPLATES: &[TaskTemplate] = &[
    TaskTemplate { category: "Backend", subject: "api", skills: &["python", "api", "sql"], hours: (6, 24) },
    TaskTemplate { category: "Backend", subject: "service", skills: &["rust", "api"], hours: (8, 32) },
    TaskTemplate { category: "Frontend", subject: "screens", skills: &["javascript", "react", "css"], hours: (4, 20) },
    TaskTemplate { category: "Design", subject: "flows", skills: &["figma", "ux"], hours: (4, 16) },
    TaskTemplate { category: "Infrastructure", subject: "pipeline", skills: &["ci", "docker"], hours: (4, 16) },
    TaskTemplate { category: "Infrastructure", subject: "cluster", skills: &["kubernetes", "terraform", "aws"], hours: (8, 30) },
    TaskTemplate { category: "Data", subject: "model", skills: &["python", "ml", "statistics"], hours: (10, 36) },
    TaskTemplate { category: "Data", subject: "dashboard", skills: &["sql", "analytics"], hours: (4, 12) },
    TaskTemplate { category: "QA", subject: "regression suite", skills: &["testing", "automation"], hours: (4, 18) },
    TaskTemplate { category: "Product", subject: "roadmap", skills: &["roadmap", "stakeholders"], hours: (2, 8) },
];

pub struct ScenarioGenerator {
    bank: RngBank,
}

impl ScenarioGenerator {
    pub fn new(seed: u64) -> Self {
        Self { bank: RngBank::new(seed) }
    }

    pub fn seed(&self) -> u64 {
        self.bank.master_seed()
    }

    /// `count` active workers with ids `w-001`, `w-002`, ...
    pub fn roster(&self, count: usize) -> Vec<Worker> {
        let mut rng = self.bank.for_stream(StreamSlot::Roster);
        let mut load_rng = self.bank.for_stream(StreamSlot::Workload);

        (1..=count)
            .map(|n| {
                let name = NameGenerator::generate_full_name(&mut rng);
                let email = NameGenerator::email_for(&name, n);
                let (role, catalog) = *rng.pick(ROLE_SKILLS).unwrap_or(&ROLE_SKILLS[0]);
                let skill_count = rng.range_u32(2, 4) as usize;
                let skills: Vec<&str> = rng.sample(catalog, skill_count).into_iter().copied().collect();
                let preferences: Vec<&str> = rng.pick(catalog).into_iter().copied().collect();
                let seniority = match rng.next_u64_below(3) {
                    0 => Seniority::Junior,
                    1 => Seniority::Mid,
                    _ => Seniority::Senior,
                };
                let rating = (rng.range_f64(3.0, 5.0) * 10.0).round() / 10.0;
                let workload = load_rng.range_u32(0, 30) as f64;

                Worker::new(format!("w-{:03}", n), name, email)
                    .with_role(role)
                    .with_skills(skills)
                    .with_preferences(preferences)
                    .with_seniority(seniority)
                    .with_capacity(DEFAULT_CAPACITY_HOURS, workload)
                    .with_rating(rating)
            })
            .collect()
    }

    /// `count` tasks with ids `t-001`, `t-002`, ...
    ///
    /// Roughly a quarter of tasks depend on an earlier task.
    pub fn tasks(&self, count: usize) -> Vec<Task> {
        let mut rng = self.bank.for_stream(StreamSlot::Tasks);
        let mut tasks: Vec<Task> = Vec::with_capacity(count);

        for n in 1..=count {
            let Some(template) = rng.pick(TASK_TEMPLATES) else {
                break;
            };
            let title = NameGenerator::generate_task_title(&mut rng, template.subject);
            let hours = rng.range_u32(template.hours.0, template.hours.1);
            let skill_count = rng.range_u32(1, template.skills.len() as u32) as usize;
            let skills: Vec<&str> = rng
                .sample(template.skills, skill_count)
                .into_iter()
                .copied()
                .collect();

            let mut task = Task::new(format!("t-{:03}", n), title, hours)
                .with_category(template.category)
                .with_skills(skills)
                .with_priority(random_priority(&mut rng))
                .with_complexity(random_complexity(&mut rng));
            if n > 1 && rng.chance(0.25) {
                if let Some(earlier) = rng.pick(&tasks) {
                    task = task.with_dependencies([earlier.id.clone()]);
                }
            }
            tasks.push(task);
        }
        tasks
    }
}

fn random_priority(rng: &mut StreamRng) -> Priority {
    let roll = rng.next_f64();
    if roll < 0.2 {
        Priority::Low
    } else if roll < 0.6 {
        Priority::Medium
    } else if roll < 0.9 {
        Priority::High
    } else {
        Priority::Critical
    }
}

fn random_complexity(rng: &mut StreamRng) -> Complexity {
    match rng.next_u64_below(3) {
        0 => Complexity::Low,
        1 => Complexity::Medium,
        _ => Complexity::High,
    }
}
