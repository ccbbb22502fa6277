//! Task allocation and workload optimization engine.
//!
//! A run takes a task backlog and a worker roster, matches tasks to the
//! best-suited workers, then consolidates the matched work onto the
//! cheapest set of workers that can carry it.

pub mod allocation;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod matcher;
pub mod name_generator;
pub mod optimizer;
pub mod quick_assign;
pub mod rng;
pub mod scenario;
pub mod scorer;
pub mod store;
pub mod task;
pub mod types;
pub mod utilization;
pub mod worker;
