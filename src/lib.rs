pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{ApiSource, JsonFileSink, LocalStorage, TableSink, TableSource, WriteMode};
pub use app::run_pipeline;
pub use config::PipelineFile;
pub use crate::core::{
    etl::EtlEngine,
    observer::{RecordingObserver, TracingObserver},
    pipeline::{EtlPipeline, OnInvalidRecord},
    transform::{ProductProjection, RevenueAggregation, VolumeBands, DEFAULT_VOLUME_BANDS},
};
pub use domain::model::{ProductRecord, RawRecord, RunSummary, SalesSummary, VolumeCategory};
pub use utils::error::{EtlError, Result};
