//! Record transformation: entity catalog, timestamp normalization, and
//! flattening of raw API records into warehouse rows.

pub mod entities;
pub mod flatten;
pub mod timestamp;

pub use entities::{CATALOG, EntitySpec, FieldKind, FieldSpec};
pub use flatten::{FlatRow, flatten_batch, flatten_record};

/// A raw record as returned by the source API.
pub type Record = serde_json::Map<String, serde_json::Value>;
