use crate::core::observer::TracingObserver;
use crate::core::{Observer, Pipeline, RunSummary, Stage};
use crate::utils::error::{EtlError, Result};
use chrono::Utc;
use std::sync::Arc;

/// Runs extract, transform and load in order. Any stage failure stops the run
/// before the next stage starts, so a failed extract or transform never reaches
/// the sink.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    observer: Arc<dyn Observer>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::with_observer(pipeline, Arc::new(TracingObserver))
    }

    pub fn with_observer(pipeline: P, observer: Arc<dyn Observer>) -> Self {
        Self { pipeline, observer }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let name = self.pipeline.name();
        let started_at = Utc::now();

        self.observer.stage_started(name, Stage::Extract);
        let raw_data = self
            .pipeline
            .extract()
            .await
            .map_err(|e| self.fail(Stage::Extract, e))?;
        let extracted = raw_data.len();
        self.observer.stage_completed(name, Stage::Extract, extracted);

        self.observer.stage_started(name, Stage::Transform);
        let outcome = self
            .pipeline
            .transform(raw_data)
            .map_err(|e| self.fail(Stage::Transform, e))?;
        for rejected in &outcome.rejected {
            self.observer.record_skipped(name, rejected);
        }
        let transformed = outcome.records.len();
        let skipped = outcome.rejected.len();
        self.observer.stage_completed(name, Stage::Transform, transformed);

        self.observer.stage_started(name, Stage::Load);
        let output = self
            .pipeline
            .load(outcome.records)
            .await
            .map_err(|e| self.fail(Stage::Load, e))?;
        self.observer.stage_completed(name, Stage::Load, transformed);

        Ok(RunSummary {
            pipeline: name.to_string(),
            extracted,
            transformed,
            skipped,
            output,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn fail(&self, stage: Stage, error: EtlError) -> EtlError {
        self.observer.stage_failed(self.pipeline.name(), stage, &error);
        EtlError::stage_failed(stage, error)
    }
}
