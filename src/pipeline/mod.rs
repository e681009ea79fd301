//! Main processing pipeline.
//!
//! Runs the entity catalog in order: fetch from the source, flatten the
//! records, stage them to the bucket as NDJSON, then load them into the
//! warehouse. One entity at a time; a staged table is never referenced by
//! more than one in-flight load.

use snafu::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::Config;
use crate::emit;
use crate::error::{LoadSnafu, PipelineError, PipelineStorageSnafu, SourceSnafu, StagingSnafu};
use crate::metrics::events::{
    EntityProcessed, EntityStatus, FetchCompleted, LoadCompleted, RecordsFetched, RowsLoaded,
    StageCompleted,
};
use crate::record::{self, CATALOG, EntitySpec};
use crate::source::OdooClient;
use crate::staging::StagingWriter;
use crate::storage::StorageProvider;
use crate::warehouse::BulkLoader;

/// Statistics about the pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub entities_loaded: usize,
    pub entities_skipped: usize,
    pub records_fetched: usize,
    pub rows_loaded: u64,
    pub bytes_staged: usize,
}

/// Outcome of processing a single entity.
enum EntityOutcome {
    Skipped,
    Loaded { rows: u64 },
}

/// Coordinates one batch run end to end.
pub struct Pipeline {
    source: OdooClient,
    staging: StagingWriter,
    loader: BulkLoader,
    stats: PipelineStats,
}

impl Pipeline {
    /// Create a new pipeline from configuration.
    pub async fn new(config: &Config) -> Result<Self, PipelineError> {
        let storage = StorageProvider::for_url(&config.bigquery.bucket_name)
            .await
            .context(PipelineStorageSnafu)?;
        info!("Staging to {}", storage.canonical_url());

        let source = OdooClient::new(config.odoo.clone()).context(SourceSnafu)?;
        let staging = StagingWriter::new(Arc::new(storage));
        let loader = BulkLoader::new(&config.bigquery).context(LoadSnafu)?;

        Ok(Self {
            source,
            staging,
            loader,
            stats: PipelineStats::default(),
        })
    }

    /// Process every entity in catalog order.
    ///
    /// Fetch errors only skip the affected entity; staging and load errors
    /// abort the run so a partially staged table is never left behind
    /// silently.
    pub async fn run(&mut self) -> Result<PipelineStats, PipelineError> {
        info!("Processing {} entities", CATALOG.len());

        for entity in CATALOG {
            match self.process_entity(entity).await {
                Ok(EntityOutcome::Skipped) => {
                    self.stats.entities_skipped += 1;
                    emit!(EntityProcessed {
                        entity: entity.table,
                        status: EntityStatus::Skipped,
                    });
                }
                Ok(EntityOutcome::Loaded { rows }) => {
                    self.stats.entities_loaded += 1;
                    self.stats.rows_loaded += rows;
                    emit!(EntityProcessed {
                        entity: entity.table,
                        status: EntityStatus::Loaded,
                    });
                }
                Err(error) => {
                    error!("Processing {} failed, aborting run", entity.table);
                    emit!(EntityProcessed {
                        entity: entity.table,
                        status: EntityStatus::Failed,
                    });
                    return Err(error);
                }
            }
        }

        info!(
            "Run complete: {} entities loaded, {} skipped, {} rows loaded",
            self.stats.entities_loaded, self.stats.entities_skipped, self.stats.rows_loaded
        );
        Ok(self.stats.clone())
    }

    async fn process_entity(
        &mut self,
        entity: &'static EntitySpec,
    ) -> Result<EntityOutcome, PipelineError> {
        let fetch_start = Instant::now();
        let records = self.source.fetch(entity).await;
        emit!(FetchCompleted {
            entity: entity.table,
            duration: fetch_start.elapsed(),
        });

        if records.is_empty() {
            info!("No {} records fetched, skipping", entity.table);
            return Ok(EntityOutcome::Skipped);
        }

        self.stats.records_fetched += records.len();
        emit!(RecordsFetched {
            entity: entity.table,
            count: records.len() as u64,
        });
        info!("Fetched {} {} records", records.len(), entity.table);

        let rows = record::flatten_batch(entity, &records);

        let stage_start = Instant::now();
        let staged = self
            .staging
            .stage(&entity.staging_path(), &rows, entity.chunk_size)
            .await
            .context(StagingSnafu)?;
        emit!(StageCompleted {
            entity: entity.table,
            duration: stage_start.elapsed(),
        });
        self.stats.bytes_staged += staged.bytes;

        let load_start = Instant::now();
        let loaded = self
            .loader
            .load(entity.table, &staged.uri, &entity.columns())
            .await
            .context(LoadSnafu)?;
        emit!(LoadCompleted {
            entity: entity.table,
            duration: load_start.elapsed(),
        });
        emit!(RowsLoaded {
            entity: entity.table,
            count: loaded,
        });
        info!("Loaded {} rows into {}", loaded, entity.table);

        Ok(EntityOutcome::Loaded { rows: loaded })
    }
}

/// Run the complete pipeline with the given configuration.
pub async fn run_pipeline(config: Config) -> Result<PipelineStats, PipelineError> {
    let mut pipeline = Pipeline::new(&config).await?;
    pipeline.run().await
}
