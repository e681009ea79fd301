//! Internal events for metrics emission.
//!
//! Each event struct represents a measurable occurrence in the pipeline.
//! Events implement the `InternalEvent` trait which emits the corresponding
//! Prometheus metric.

use metrics::{counter, histogram};
use std::time::Duration;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Outcome of processing one entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityStatus {
    Loaded,
    Skipped,
    Failed,
}

impl EntityStatus {
    fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Loaded => "loaded",
            EntityStatus::Skipped => "skipped",
            EntityStatus::Failed => "failed",
        }
    }
}

/// Event emitted when records are fetched from the source.
pub struct RecordsFetched {
    pub entity: &'static str,
    pub count: u64,
}

impl InternalEvent for RecordsFetched {
    fn emit(self) {
        trace!(entity = self.entity, count = self.count, "Records fetched");
        counter!("petrel_records_fetched_total", "entity" => self.entity).increment(self.count);
    }
}

/// Event emitted when a fetch fails and degrades to an empty record set.
pub struct FetchFailed {
    pub model: &'static str,
}

impl InternalEvent for FetchFailed {
    fn emit(self) {
        trace!(model = self.model, "Fetch failed");
        counter!("petrel_fetch_failures_total", "model" => self.model).increment(1);
    }
}

/// Event emitted when a chunk of rows is written to the staging stream.
pub struct StagingChunkFlushed {
    pub rows: u64,
}

impl InternalEvent for StagingChunkFlushed {
    fn emit(self) {
        trace!(rows = self.rows, "Staging chunk flushed");
        counter!("petrel_staging_chunks_total").increment(1);
    }
}

/// Event emitted when a staging object is finalized.
pub struct StagingFileWritten {
    pub bytes: u64,
    pub rows: u64,
}

impl InternalEvent for StagingFileWritten {
    fn emit(self) {
        trace!(bytes = self.bytes, rows = self.rows, "Staging file written");
        counter!("petrel_staging_bytes_total").increment(self.bytes);
        counter!("petrel_staging_rows_total").increment(self.rows);
    }
}

/// Event emitted when the warehouse reports rows loaded into a table.
pub struct RowsLoaded {
    pub entity: &'static str,
    pub count: u64,
}

impl InternalEvent for RowsLoaded {
    fn emit(self) {
        trace!(entity = self.entity, count = self.count, "Rows loaded");
        counter!("petrel_rows_loaded_total", "entity" => self.entity).increment(self.count);
    }
}

/// Event emitted once per entity per run with its final status.
pub struct EntityProcessed {
    pub entity: &'static str,
    pub status: EntityStatus,
}

impl InternalEvent for EntityProcessed {
    fn emit(self) {
        trace!(
            entity = self.entity,
            status = self.status.as_str(),
            "Entity processed"
        );
        counter!(
            "petrel_entities_processed_total",
            "entity" => self.entity,
            "status" => self.status.as_str()
        )
        .increment(1);
    }
}

// ============================================================================
// Histogram events for timing
// ============================================================================

/// Event emitted when a source fetch completes.
pub struct FetchCompleted {
    pub entity: &'static str,
    pub duration: Duration,
}

impl InternalEvent for FetchCompleted {
    fn emit(self) {
        trace!(
            entity = self.entity,
            duration_ms = self.duration.as_millis(),
            "Fetch completed"
        );
        histogram!("petrel_fetch_duration_seconds", "entity" => self.entity)
            .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when staging an entity completes.
pub struct StageCompleted {
    pub entity: &'static str,
    pub duration: Duration,
}

impl InternalEvent for StageCompleted {
    fn emit(self) {
        trace!(
            entity = self.entity,
            duration_ms = self.duration.as_millis(),
            "Stage completed"
        );
        histogram!("petrel_stage_duration_seconds", "entity" => self.entity)
            .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when a warehouse load job completes.
pub struct LoadCompleted {
    pub entity: &'static str,
    pub duration: Duration,
}

impl InternalEvent for LoadCompleted {
    fn emit(self) {
        trace!(
            entity = self.entity,
            duration_ms = self.duration.as_millis(),
            "Load completed"
        );
        histogram!("petrel_load_duration_seconds", "entity" => self.entity)
            .record(self.duration.as_secs_f64());
    }
}
