//! Storage Layer
//!
//! Append-only SQLite persistence for the two relay logs: tuning-parameter
//! submissions and telemetry samples. Each log hands out strictly increasing
//! ids from a durable sequence; "latest" always means the row with the
//! maximum id.

mod model;
mod sqlite;

pub use model::{NewParameters, NewSample, ParameterSet, Sample};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// Input validation errors, rejected before any write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field '{field}' is missing")]
    Missing { field: &'static str },
    #[error("field '{field}' is not numeric")]
    NotNumeric { field: &'static str },
    #[error("field '{field}' must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Append-only log of tuning-parameter submissions.
#[async_trait]
pub trait ParameterLog: Send + Sync {
    /// Validate and append a new parameter set, returning the stored row.
    async fn submit(&self, new: NewParameters) -> Result<ParameterSet, StoreError>;

    /// The max-id parameter set, or `None` while the log is empty.
    async fn latest(&self) -> Result<Option<ParameterSet>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Append-only log of telemetry samples.
#[async_trait]
pub trait TelemetryLog: Send + Sync {
    /// Validate and append a new sample, returning the stored row.
    async fn record(&self, new: NewSample) -> Result<Sample, StoreError>;

    /// The max-id sample, or `None` while the log is empty.
    async fn latest(&self) -> Result<Option<Sample>, StoreError>;

    /// Up to `limit` most-recent-by-id samples, oldest first.
    async fn window(&self, limit: u32) -> Result<Vec<Sample>, StoreError>;

    /// Full ascending history as a lazy stream. Rows are fetched in batches
    /// so an unbounded log never has to fit in memory.
    fn stream_all(&self) -> BoxStream<'static, Result<Sample, StoreError>>;

    async fn count(&self) -> Result<u64, StoreError>;
}
