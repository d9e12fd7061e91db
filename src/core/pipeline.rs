use crate::core::{Pipeline, RawRecord, Sink, Source, TransformOutcome, Transformer};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// What to do with a record the transformer rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OnInvalidRecord {
    /// Fail the run on the first bad record.
    #[default]
    Abort,
    /// Drop the record, report it, keep going.
    Skip,
}

/// A source, a transformer and a sink wired into one pipeline.
pub struct EtlPipeline<Src, T, K> {
    name: String,
    source: Src,
    transformer: T,
    sink: K,
    on_invalid: OnInvalidRecord,
}

impl<Src, T, K> EtlPipeline<Src, T, K>
where
    Src: Source,
    T: Transformer,
    K: Sink<T::Output>,
{
    pub fn new(name: impl Into<String>, source: Src, transformer: T, sink: K) -> Self {
        Self {
            name: name.into(),
            source,
            transformer,
            sink,
            on_invalid: OnInvalidRecord::default(),
        }
    }

    pub fn with_error_policy(mut self, on_invalid: OnInvalidRecord) -> Self {
        self.on_invalid = on_invalid;
        self
    }
}

#[async_trait::async_trait]
impl<Src, T, K> Pipeline for EtlPipeline<Src, T, K>
where
    Src: Source,
    T: Transformer,
    K: Sink<T::Output>,
{
    type Output = T::Output;

    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self) -> Result<Vec<RawRecord>> {
        self.source.extract().await
    }

    fn transform(&self, data: Vec<RawRecord>) -> Result<TransformOutcome<T::Output>> {
        match self.on_invalid {
            OnInvalidRecord::Abort => Ok(TransformOutcome::complete(
                self.transformer.transform(&data)?,
            )),
            OnInvalidRecord::Skip => {
                let mut records = Vec::with_capacity(data.len());
                let mut rejected = Vec::new();
                for (index, record) in data.iter().enumerate() {
                    match self.transformer.transform_record(index, record) {
                        Ok(output) => records.push(output),
                        Err(e) => rejected.push(e),
                    }
                }
                Ok(TransformOutcome { records, rejected })
            }
        }
    }

    async fn load(&self, records: Vec<T::Output>) -> Result<String> {
        self.sink.load(&records).await
    }
}
