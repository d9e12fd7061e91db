use crate::core::{Observer, Stage};
use crate::utils::error::EtlError;
use std::sync::Mutex;

/// Reports pipeline progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn stage_started(&self, pipeline: &str, stage: Stage) {
        tracing::debug!(pipeline, %stage, "stage started");
    }

    fn stage_completed(&self, pipeline: &str, stage: Stage, count: usize) {
        tracing::info!(pipeline, %stage, count, "stage completed");
    }

    fn record_skipped(&self, pipeline: &str, error: &EtlError) {
        match error.record_fault() {
            Some((index, field)) => {
                tracing::warn!(pipeline, index, field, "skipping record: {}", error)
            }
            None => tracing::warn!(pipeline, "skipping record: {}", error),
        }
    }

    fn stage_failed(&self, pipeline: &str, stage: Stage, error: &EtlError) {
        tracing::error!(pipeline, %stage, "stage failed: {}", error);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    Started(Stage),
    Completed(Stage, usize),
    Skipped { index: Option<usize>, message: String },
    Failed(Stage, String),
}

/// Keeps every report in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: ObserverEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Observer for RecordingObserver {
    fn stage_started(&self, _pipeline: &str, stage: Stage) {
        self.push(ObserverEvent::Started(stage));
    }

    fn stage_completed(&self, _pipeline: &str, stage: Stage, count: usize) {
        self.push(ObserverEvent::Completed(stage, count));
    }

    fn record_skipped(&self, _pipeline: &str, error: &EtlError) {
        self.push(ObserverEvent::Skipped {
            index: error.record_fault().map(|(index, _)| index),
            message: error.to_string(),
        });
    }

    fn stage_failed(&self, _pipeline: &str, stage: Stage, error: &EtlError) {
        self.push(ObserverEvent::Failed(stage, error.to_string()));
    }
}
