// Adapters layer: concrete sources, sinks and storage behind the domain ports.

pub mod http;
pub mod json;
pub mod storage;
pub mod table;

pub use http::ApiSource;
pub use json::JsonFileSink;
pub use storage::LocalStorage;
pub use table::{TableSink, TableSource, WriteMode};
