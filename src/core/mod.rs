pub mod etl;
pub mod observer;
pub mod pipeline;
pub mod transform;

pub use crate::domain::model::{
    ProductRecord, RawRecord, RunSummary, SalesSummary, Stage, TableRow, TransformOutcome,
    VolumeCategory,
};
pub use crate::domain::ports::{Observer, Pipeline, Sink, Source, Storage, Transformer};
pub use crate::utils::error::Result;
