use crate::adapters::{ApiSource, JsonFileSink, LocalStorage, TableSink, TableSource};
use crate::config::toml_config::{LoadConfig, PipelineFile, SourceConfig, TransformConfig};
use crate::core::etl::EtlEngine;
use crate::core::pipeline::{EtlPipeline, OnInvalidRecord};
use crate::core::transform::{ProductProjection, RevenueAggregation};
use crate::core::{Observer, RunSummary, Sink, Source, TableRow, Transformer};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;
use std::time::Duration;

/// Validates a pipeline definition, wires its collaborators and runs it once.
pub async fn run_pipeline(
    config: &PipelineFile,
    observer: Arc<dyn Observer>,
) -> Result<RunSummary> {
    config.validate()?;
    tracing::info!(pipeline = config.name(), "Starting pipeline");

    let source = build_source(&config.source);
    let on_invalid = config.error_handling.on_invalid_record;

    match &config.transform {
        TransformConfig::FieldMapping { fields } => {
            let transformer = ProductProjection::new(fields.clone());
            run_with(config, source, transformer, on_invalid, observer).await
        }
        TransformConfig::Aggregation {
            fields,
            volume_bands,
        } => {
            let transformer = RevenueAggregation::new(fields.clone(), volume_bands.clone());
            run_with(config, source, transformer, on_invalid, observer).await
        }
    }
}

fn build_source(config: &SourceConfig) -> Box<dyn Source> {
    match config {
        SourceConfig::Api {
            endpoint,
            timeout_seconds,
        } => {
            let source = ApiSource::new(endpoint.clone());
            match timeout_seconds {
                Some(secs) => Box::new(source.with_timeout(Duration::from_secs(*secs))),
                None => Box::new(source),
            }
        }
        SourceConfig::Tables {
            data_dir,
            sales_table,
            products_table,
            join_key,
        } => Box::new(TableSource::new(
            LocalStorage::new(data_dir),
            sales_table.clone(),
            products_table.clone(),
            join_key.clone(),
        )),
    }
}

fn build_sink<T>(config: &LoadConfig) -> Box<dyn Sink<T>>
where
    T: serde::Serialize + TableRow + Send + Sync + 'static,
{
    match config {
        LoadConfig::Json {
            output_path,
            filename,
        } => Box::new(JsonFileSink::new(
            LocalStorage::new(output_path),
            filename.clone(),
        )),
        LoadConfig::Table {
            output_path,
            table,
            write_mode,
        } => Box::new(TableSink::new(
            LocalStorage::new(output_path),
            table.clone(),
            *write_mode,
        )),
    }
}

async fn run_with<T>(
    config: &PipelineFile,
    source: Box<dyn Source>,
    transformer: T,
    on_invalid: OnInvalidRecord,
    observer: Arc<dyn Observer>,
) -> Result<RunSummary>
where
    T: Transformer + 'static,
    T::Output: TableRow + 'static,
{
    let sink = build_sink::<T::Output>(&config.load);
    let pipeline = EtlPipeline::new(config.name(), source, transformer, sink)
        .with_error_policy(on_invalid);

    EtlEngine::with_observer(pipeline, observer).run().await
}
