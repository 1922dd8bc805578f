use crate::config::FeedConfig;
use crate::errors::Result;
use crate::models::RunLog;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::sync::{Arc, Mutex};

/// Run-history bookkeeping in a local SQLite file.
pub struct Catalog {
    conn: Arc<Mutex<Connection>>,
}

impl Catalog {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        if let Some(parent) = config.catalog_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&config.catalog_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS run_logs (
                run_id TEXT PRIMARY KEY,
                run_date TEXT NOT NULL,
                started_at INTEGER NOT NULL,
                finished_at INTEGER,
                status TEXT,
                details TEXT
            );",
        )?;
        Ok(())
    }

    pub fn create_run_log(&self, run_id: &str, run_date: NaiveDate) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let started_at = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO run_logs (run_id, run_date, started_at, status, details)
             VALUES (?1, ?2, ?3, 'RUNNING', '')",
            params![run_id, run_date.to_string(), started_at],
        )?;
        Ok(())
    }

    pub fn finish_run_log(&self, run_id: &str, status: &str, details: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let finished_at = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE run_logs SET status = ?1, details = ?2, finished_at = ?3 WHERE run_id = ?4",
            params![status, details, finished_at, run_id],
        )?;
        Ok(())
    }

    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunLog>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT run_id, run_date, started_at, finished_at, status, details
             FROM run_logs ORDER BY started_at DESC, run_id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RunLog {
                run_id: row.get(0)?,
                run_date: row.get(1)?,
                started_at: row.get(2)?,
                finished_at: row.get(3)?,
                status: row.get(4)?,
                details: row.get(5)?,
            })
        })?;

        let mut runs = Vec::new();
        for run in rows {
            runs.push(run?);
        }
        Ok(runs)
    }
}
