//! petrel: A batch ETL pipeline from Odoo to BigQuery.
//!
//! This library provides components for pulling business records from an
//! Odoo HTTP endpoint, flattening them into warehouse-shaped rows, staging
//! them as NDJSON in Cloud Storage, and loading them into BigQuery with
//! truncate-and-replace semantics.
//!
//! # Example
//!
//! ```ignore
//! use petrel::{Config, run_pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.yaml")?;
//!     let stats = run_pipeline(config).await?;
//!     println!("Loaded {} rows", stats.rows_loaded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod staging;
pub mod storage;
pub mod warehouse;

// Re-export main types
pub use config::Config;
pub use pipeline::{Pipeline, PipelineStats, run_pipeline};
pub use storage::{StorageProvider, StorageProviderRef};
