//! Staging writer: serializes flattened rows to NDJSON in the staging
//! bucket, in chunks, over a single upload stream per entity.

use object_store::path::Path;
use snafu::prelude::*;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::emit;
use crate::error::{
    ChunkWriteSnafu, InvalidChunkSizeSnafu, SerializeSnafu, StagingError, StreamFinishSnafu,
};
use crate::metrics::events::{StagingChunkFlushed, StagingFileWritten};
use crate::record::FlatRow;
use crate::storage::StorageProviderRef;

/// A staged NDJSON object, ready to be referenced by a load job.
#[derive(Debug, Clone)]
pub struct StagedBlob {
    /// URI under which the warehouse can read the object.
    pub uri: String,
    pub rows: usize,
    pub bytes: usize,
    pub chunks: usize,
}

/// Writes flattened rows to the staging bucket as NDJSON.
#[derive(Debug, Clone)]
pub struct StagingWriter {
    storage: StorageProviderRef,
}

impl StagingWriter {
    pub fn new(storage: StorageProviderRef) -> Self {
        Self { storage }
    }

    /// Serialize `rows` to `path` as NDJSON, `chunk_size` rows per write.
    ///
    /// The whole object goes through one upload stream, so a concurrent
    /// reader never observes a half-written file. On error the stream is
    /// abandoned without cleanup; callers must abort the run before
    /// anything references the path.
    pub async fn stage(
        &self,
        path: &str,
        rows: &[FlatRow],
        chunk_size: usize,
    ) -> Result<StagedBlob, StagingError> {
        ensure!(chunk_size >= 1, InvalidChunkSizeSnafu { chunk_size });

        let path = Path::from(path);
        let mut writer = self.storage.writer(&path);
        let mut buf = Vec::new();
        let mut bytes = 0usize;
        let mut chunks = 0usize;

        for chunk in rows.chunks(chunk_size) {
            buf.clear();
            for row in chunk {
                serde_json::to_writer(&mut buf, row).context(SerializeSnafu)?;
                buf.push(b'\n');
            }
            writer.write_all(&buf).await.context(ChunkWriteSnafu)?;
            bytes += buf.len();
            chunks += 1;
            emit!(StagingChunkFlushed {
                rows: chunk.len() as u64,
            });
            debug!("Wrote chunk {} ({} rows) to {}", chunks, chunk.len(), path);
        }

        writer.shutdown().await.context(StreamFinishSnafu)?;

        let uri = self.storage.source_uri(&path);
        emit!(StagingFileWritten {
            bytes: bytes as u64,
            rows: rows.len() as u64,
        });
        info!(
            "Staged file {}: {} bytes, {} rows, {} chunks",
            uri,
            bytes,
            rows.len(),
            chunks
        );

        Ok(StagedBlob {
            uri,
            rows: rows.len(),
            bytes,
            chunks,
        })
    }
}
