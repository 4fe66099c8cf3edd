//! Trace sinks.
//!
//! The interpreter appends one [`TraceRecord`] per attempted stage. Sinks are
//! write-only from the interpreter's point of view; the read helpers on the
//! concrete sinks exist for tooling and tests.

mod sqlite;

pub use sqlite::SqliteTraceSink;

use async_trait::async_trait;
use brickyard_protocols::TraceRecord;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::TraceError;

/// Append-only destination for trace records.
#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn append(&self, record: TraceRecord) -> Result<(), TraceError>;
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTraceSink;

#[async_trait]
impl TraceSink for NoopTraceSink {
    async fn append(&self, _record: TraceRecord) -> Result<(), TraceError> {
        Ok(())
    }
}

/// Keeps records in memory, in append order.
#[derive(Debug, Default)]
pub struct InMemoryTraceSink {
    records: Mutex<Vec<TraceRecord>>,
}

impl InMemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    pub fn records_for_run(&self, run_id: Uuid) -> Vec<TraceRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.run_id == run_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[async_trait]
impl TraceSink for InMemoryTraceSink {
    async fn append(&self, record: TraceRecord) -> Result<(), TraceError> {
        self.records.lock().push(record);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[tokio::test]
    async fn test_in_memory_keeps_order() {
        let sink = InMemoryTraceSink::new();
        let run = Uuid::new_v4();
        let other = Uuid::new_v4();
        sink.append(record(run, 0)).await.unwrap();
        sink.append(record(other, 0)).await.unwrap();
        sink.append(record(run, 1)).await.unwrap();

        assert_eq!(sink.len(), 3);
        let indexes: Vec<usize> = sink
            .records_for_run(run)
            .iter()
            .map(|r| r.stage_index)
            .collect();
        assert_eq!(indexes, vec![0, 1]);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_noop_accepts_everything() {
        let sink = NoopTraceSink;
        assert!(sink.append(record(Uuid::new_v4(), 0)).await.is_ok());
    }
}
