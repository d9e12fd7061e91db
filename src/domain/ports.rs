use crate::domain::model::{RawRecord, Stage, TransformOutcome};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use serde::Serialize;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human readable location of `path`, used in logs and run summaries.
    fn location(&self, path: &str) -> String;
}

/// Extraction collaborator.
#[async_trait]
pub trait Source: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
}

/// Load collaborator. Returns the location the records were written to.
#[async_trait]
pub trait Sink<T>: Send + Sync
where
    T: Serialize + Send + Sync,
{
    async fn load(&self, records: &[T]) -> Result<String>;
}

#[async_trait]
impl<S: Source + ?Sized> Source for Box<S> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        (**self).extract().await
    }
}

#[async_trait]
impl<T, K> Sink<T> for Box<K>
where
    T: Serialize + Send + Sync,
    K: Sink<T> + ?Sized,
{
    async fn load(&self, records: &[T]) -> Result<String> {
        (**self).load(records).await
    }
}

/// Turns raw records into a fixed-shape output record.
///
/// Implementations are stateless: the same input always yields the same output.
pub trait Transformer: Send + Sync {
    type Output: Serialize + Send + Sync;

    /// Transforms a single record. `index` is its position in the batch and is
    /// carried into any error so the caller can point at the offending record.
    fn transform_record(&self, index: usize, record: &RawRecord) -> Result<Self::Output>;

    /// Transforms a whole batch, preserving order and length. Stops at the first
    /// bad record.
    fn transform(&self, records: &[RawRecord]) -> Result<Vec<Self::Output>> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| self.transform_record(index, record))
            .collect()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Output: Send;

    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    fn transform(&self, data: Vec<RawRecord>) -> Result<TransformOutcome<Self::Output>>;
    async fn load(&self, records: Vec<Self::Output>) -> Result<String>;
}

/// Receives progress reports from the engine. Passed in rather than read from
/// process-wide state so callers and tests can capture what happened.
pub trait Observer: Send + Sync {
    fn stage_started(&self, pipeline: &str, stage: Stage);
    fn stage_completed(&self, pipeline: &str, stage: Stage, count: usize);
    fn record_skipped(&self, pipeline: &str, error: &EtlError);
    fn stage_failed(&self, pipeline: &str, stage: Stage, error: &EtlError);
}
