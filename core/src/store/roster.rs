use super::RosterStore;
use crate::{
    error::{AllocError, AllocResult},
    worker::{Role, Seniority, Worker},
};
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;

/// A worker row before its JSON and tag columns are decoded.
struct WorkerRow {
    worker_id: String,
    name: String,
    email: String,
    role: String,
    skills: String,
    seniority: String,
    capacity_hours_per_week: f64,
    current_workload_hours: f64,
    preferences: String,
    performance_rating: f64,
    is_active: bool,
    version: i64,
}

impl WorkerRow {
    fn into_worker(self) -> AllocResult<Worker> {
        Ok(Worker {
            id: self.worker_id,
            name: self.name,
            email: self.email,
            role: from_tag::<Role>(&self.role)?,
            skills: serde_json::from_str::<BTreeSet<String>>(&self.skills)?,
            seniority: from_tag::<Seniority>(&self.seniority)?,
            capacity_hours_per_week: self.capacity_hours_per_week,
            current_workload_hours: self.current_workload_hours,
            preferences: serde_json::from_str::<BTreeSet<String>>(&self.preferences)?,
            performance_rating: self.performance_rating,
            is_active: self.is_active,
            version: self.version as u64,
        })
    }
}

impl RosterStore {
    // ── Worker ────────────────────────────────────────────────────

    /// Insert a worker, or replace an existing record and bump its version.
    pub fn upsert_worker(&self, worker: &Worker) -> AllocResult<()> {
        worker.validate()?;
        self.conn.execute(
            "INSERT INTO worker (
                worker_id, name, email, role, skills, seniority,
                capacity_hours_per_week, current_workload_hours, preferences,
                performance_rating, is_active, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(worker_id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role,
                skills = excluded.skills,
                seniority = excluded.seniority,
                capacity_hours_per_week = excluded.capacity_hours_per_week,
                current_workload_hours = excluded.current_workload_hours,
                preferences = excluded.preferences,
                performance_rating = excluded.performance_rating,
                is_active = excluded.is_active,
                version = worker.version + 1",
            params![
                worker.id,
                worker.name,
                worker.email,
                to_tag(&worker.role)?,
                serde_json::to_string(&worker.skills)?,
                to_tag(&worker.seniority)?,
                worker.capacity_hours_per_week,
                worker.current_workload_hours,
                serde_json::to_string(&worker.preferences)?,
                worker.performance_rating,
                if worker.is_active { 1 } else { 0 },
                worker.version as i64,
            ],
        )?;
        Ok(())
    }

    /// Every stored worker, active or not, ordered by id.
    pub fn load_roster(&self) -> AllocResult<Vec<Worker>> {
        let mut stmt = self.conn.prepare(
            "SELECT worker_id, name, email, role, skills, seniority,
                    capacity_hours_per_week, current_workload_hours, preferences,
                    performance_rating, is_active, version
             FROM worker ORDER BY worker_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(WorkerRow {
                    worker_id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    role: row.get(3)?,
                    skills: row.get(4)?,
                    seniority: row.get(5)?,
                    capacity_hours_per_week: row.get(6)?,
                    current_workload_hours: row.get(7)?,
                    preferences: row.get(8)?,
                    performance_rating: row.get(9)?,
                    is_active: row.get::<_, i32>(10)? != 0,
                    version: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(WorkerRow::into_worker).collect()
    }

    pub fn get_worker(&self, worker_id: &str) -> AllocResult<Worker> {
        self.load_roster()?
            .into_iter()
            .find(|w| w.id == worker_id)
            .ok_or_else(|| AllocError::WorkerNotFound {
                worker_id: worker_id.to_string(),
            })
    }

    pub fn worker_version(&self, worker_id: &str) -> AllocResult<Option<u64>> {
        let version = self
            .conn
            .query_row(
                "SELECT version FROM worker WHERE worker_id = ?1",
                params![worker_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(version.map(|v| v as u64))
    }

    pub fn set_worker_active(&self, worker_id: &str, active: bool) -> AllocResult<()> {
        let changed = self.conn.execute(
            "UPDATE worker SET is_active = ?1, version = version + 1 WHERE worker_id = ?2",
            params![if active { 1 } else { 0 }, worker_id],
        )?;
        if changed == 0 {
            return Err(AllocError::WorkerNotFound {
                worker_id: worker_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn worker_count(&self) -> AllocResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM worker", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Serialize a unit enum to its bare serde name ("qa_engineer", not "\"qa_engineer\"").
fn to_tag<T: Serialize>(value: &T) -> AllocResult<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn from_tag<T: DeserializeOwned>(tag: &str) -> AllocResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(tag.to_string()))?)
}
