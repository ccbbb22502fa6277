use super::{append_event_on, RosterStore};
use crate::{
    engine::AllocationRun,
    error::{AllocError, AllocResult},
    event::EventLogEntry,
};
use rusqlite::{params, Connection, OptionalExtension};

impl RosterStore {
    // ── Run ────────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, started_at: &str, version: &str) -> AllocResult<()> {
        insert_run_on(&self.conn, run_id, started_at, version)
    }

    pub fn run_exists(&self, run_id: &str) -> AllocResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM run WHERE run_id = ?1",
                params![run_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn save_run_result(&self, run: &AllocationRun) -> AllocResult<()> {
        save_run_result_on(&self.conn, run)
    }

    pub fn load_run_result(&self, run_id: &str) -> AllocResult<Option<AllocationRun>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT result_json FROM run_result WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(AllocError::from))
            .transpose()
    }

    /// Hours committed to one worker by earlier runs.
    pub fn committed_hours(&self, worker_id: &str) -> AllocResult<f64> {
        let hours = self.conn.query_row(
            "SELECT COALESCE(SUM(hours), 0.0) FROM workload_commit WHERE worker_id = ?1",
            params![worker_id],
            |row| row.get(0),
        )?;
        Ok(hours)
    }

    // ── Commit ─────────────────────────────────────────────────────

    /// Record a finished run and apply its workload deltas, all or nothing.
    ///
    /// Each delta only applies if the worker's stored version still matches
    /// the version the run read. A mismatch means another run committed
    /// first; the whole commit rolls back with `StaleWorkerVersion`.
    pub fn commit_run(&self, run: &AllocationRun, version: &str) -> AllocResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        insert_run_on(&tx, &run.run_id, &run.started_at.to_rfc3339(), version)?;

        for delta in &run.workload_deltas {
            let stored = tx
                .query_row(
                    "SELECT version FROM worker WHERE worker_id = ?1",
                    params![delta.worker_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .ok_or_else(|| AllocError::WorkerNotFound {
                    worker_id: delta.worker_id.clone(),
                })? as u64;
            if stored != delta.expected_version {
                return Err(AllocError::StaleWorkerVersion {
                    worker_id: delta.worker_id.clone(),
                    expected: delta.expected_version,
                    actual: stored,
                });
            }

            tx.execute(
                "UPDATE worker
                 SET current_workload_hours = current_workload_hours + ?1,
                     version = version + 1
                 WHERE worker_id = ?2 AND version = ?3",
                params![delta.hours, delta.worker_id, delta.expected_version as i64],
            )?;
            tx.execute(
                "INSERT INTO workload_commit (run_id, worker_id, hours, version_before)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    run.run_id,
                    delta.worker_id,
                    delta.hours,
                    delta.expected_version as i64
                ],
            )?;
        }

        for (seq, event) in run.events.iter().enumerate() {
            let entry = EventLogEntry::from_event(&run.run_id, seq as u64, event)?;
            append_event_on(&tx, &entry)?;
        }
        save_run_result_on(&tx, run)?;

        tx.execute(
            "UPDATE run SET committed_at = ?1 WHERE run_id = ?2",
            params![chrono::Utc::now().to_rfc3339(), run.run_id],
        )?;
        tx.commit()?;

        log::info!(
            "Committed run {}: {} worker workload(s) updated",
            run.run_id,
            run.workload_deltas.len()
        );
        Ok(())
    }
}

fn insert_run_on(conn: &Connection, run_id: &str, started_at: &str, version: &str) -> AllocResult<()> {
    conn.execute(
        "INSERT INTO run (run_id, started_at, version) VALUES (?1, ?2, ?3)",
        params![run_id, started_at, version],
    )?;
    Ok(())
}

fn save_run_result_on(conn: &Connection, run: &AllocationRun) -> AllocResult<()> {
    conn.execute(
        "INSERT INTO run_result (run_id, result_json) VALUES (?1, ?2)
         ON CONFLICT(run_id) DO UPDATE SET result_json = excluded.result_json",
        params![run.run_id, serde_json::to_string(run)?],
    )?;
    Ok(())
}
