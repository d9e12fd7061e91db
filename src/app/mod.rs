// Application layer: turns a pipeline definition into a running pipeline.

pub mod runner;

pub use runner::run_pipeline;
