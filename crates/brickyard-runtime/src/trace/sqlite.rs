//! SQLite trace sink.

use std::path::Path;

use async_trait::async_trait;
use brickyard_protocols::TraceRecord;
use rusqlite::params;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::TraceSink;
use crate::error::TraceError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS traces (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    mod_component_id TEXT,
    brick_instance_id TEXT,
    brick_id TEXT NOT NULL,
    stage_index INTEGER NOT NULL,
    branches TEXT NOT NULL,
    success INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    record TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_traces_run ON traces(run_id);
CREATE INDEX IF NOT EXISTS idx_traces_instance ON traces(brick_instance_id);
"#;

/// Stores trace records in a local SQLite database.
pub struct SqliteTraceSink {
    conn: Connection,
}

impl SqliteTraceSink {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, TraceError> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    /// Open or create a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let conn = Connection::open(path.as_ref().to_path_buf()).await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, TraceError> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// Records of one run, in append order.
    pub async fn records_for_run(&self, run_id: Uuid) -> Result<Vec<TraceRecord>, TraceError> {
        let run_id = run_id.to_string();
        let rows: Vec<String> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT record FROM traces WHERE run_id = ?1 ORDER BY id")?;
                let rows = stmt
                    .query_map([&run_id], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.iter()
            .map(|row| serde_json::from_str(row).map_err(TraceError::from))
            .collect()
    }

    /// Drop all records of one run.
    pub async fn clear_run(&self, run_id: Uuid) -> Result<usize, TraceError> {
        let run_id = run_id.to_string();
        let deleted = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM traces WHERE run_id = ?1", [&run_id])?))
            .await?;
        Ok(deleted)
    }
}

#[async_trait]
impl TraceSink for SqliteTraceSink {
    async fn append(&self, record: TraceRecord) -> Result<(), TraceError> {
        let json = serde_json::to_string(&record)?;
        let branches = serde_json::to_string(&record.branches)?;
        let run_id = record.run_id.to_string();
        let mod_component_id = record.mod_component_id.map(|id| id.to_string());
        let instance_id = record.brick_instance_id.map(|id| id.to_string());
        let brick_id = record.brick_id.to_string();
        let stage_index = record.stage_index as i64;
        let success = record.is_success();
        let timestamp = record.timestamp.to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO traces (run_id, mod_component_id, brick_instance_id, brick_id,
                     stage_index, branches, success, timestamp, record)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        run_id,
                        mod_component_id,
                        instance_id,
                        brick_id,
                        stage_index,
                        branches,
                        success,
                        timestamp,
                        json
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
