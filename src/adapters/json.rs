use crate::core::{Sink, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;

const INDENT: &[u8] = b"    ";

/// Serializes `value` as pretty JSON with four-space indentation and no
/// trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes all records as one JSON array into a single file.
pub struct JsonFileSink<S: Storage> {
    storage: S,
    filename: String,
}

impl<S: Storage> JsonFileSink<S> {
    pub fn new(storage: S, filename: impl Into<String>) -> Self {
        Self {
            storage,
            filename: filename.into(),
        }
    }
}

#[async_trait]
impl<S, T> Sink<T> for JsonFileSink<S>
where
    S: Storage,
    T: Serialize + Send + Sync,
{
    async fn load(&self, records: &[T]) -> Result<String> {
        let json_data = to_pretty_json(records)?;

        tracing::debug!(
            "Writing {} records ({} bytes) to {}",
            records.len(),
            json_data.len(),
            self.filename
        );
        self.storage.write_file(&self.filename, &json_data).await?;

        Ok(self.storage.location(&self.filename))
    }
}
