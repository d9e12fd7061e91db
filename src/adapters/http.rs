use crate::core::{RawRecord, Source};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Single GET against a fixed URL that answers with a JSON array of objects.
pub struct ApiSource {
    endpoint: String,
    client: Client,
    timeout: Option<Duration>,
}

impl ApiSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Source for ApiSource {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let mut request = self.client.get(&self.endpoint);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let json_data: Value = response.json().await?;
        let Value::Array(items) = json_data else {
            return Err(EtlError::UnexpectedPayloadError {
                message: format!("expected a JSON array from {}", self.endpoint),
            });
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(obj) => Ok(RawRecord::new(obj)),
                other => Err(EtlError::UnexpectedPayloadError {
                    message: format!("item {} is not an object: {}", index, other),
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_extract_array_keeps_order() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {"id": 2, "name": "Second", "price": 1.5},
                    {"id": 1, "name": "First"}
                ]));
        });

        let source = ApiSource::new(server.url("/products"));
        let records = source.extract().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data.get("id").unwrap().as_i64().unwrap(), 2);
        assert_eq!(records[1].data.get("name").unwrap().as_str().unwrap(), "First");
        let keys: Vec<&String> = records[0].data.keys().collect();
        assert_eq!(keys, ["id", "name", "price"]);
    }

    #[tokio::test]
    async fn test_extract_server_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(500);
        });

        let source = ApiSource::new(server.url("/products"));
        let err = source.extract().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, EtlError::HttpStatusError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_extract_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(serde_json::json!([]));
        });

        let source =
            ApiSource::new(server.url("/slow")).with_timeout(Duration::from_millis(50));
        let err = source.extract().await.unwrap_err();

        assert!(matches!(err, EtlError::ApiError(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_extract_single_object_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"id": 1}));
        });

        let source = ApiSource::new(server.url("/products"));
        let err = source.extract().await.unwrap_err();

        assert!(matches!(err, EtlError::UnexpectedPayloadError { .. }));
    }

    #[tokio::test]
    async fn test_extract_non_object_item_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{"id": 1}, 42]));
        });

        let source = ApiSource::new(server.url("/products"));
        let err = source.extract().await.unwrap_err();

        assert!(err.to_string().contains("item 1 is not an object"));
    }
}
