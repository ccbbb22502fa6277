//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine never calls the store; callers load a roster snapshot, run the
//! engine, then hand the finished run to `commit_run`.

use crate::{
    error::AllocResult,
    event::EventLogEntry,
};
use rusqlite::{params, Connection};

mod roster;
mod run;

pub struct RosterStore {
    conn: Connection,
}

impl RosterStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> AllocResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AllocResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> AllocResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_roster.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_runs.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> AllocResult<()> {
        append_event_on(&self.conn, entry)
    }

    pub fn events_for_run(&self, run_id: &str) -> AllocResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, phase, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    seq: row.get::<_, i64>(2)? as u64,
                    phase: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn append_event_on(conn: &Connection, entry: &EventLogEntry) -> AllocResult<()> {
    conn.execute(
        "INSERT INTO event_log (run_id, seq, phase, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.run_id,
            entry.seq as i64,
            entry.phase,
            entry.event_type,
            entry.payload,
        ],
    )?;
    Ok(())
}
