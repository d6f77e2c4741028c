//! Music service clients used to re-resolve broken artwork.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use thiserror::Error;

use super::models::ExtendedMetadata;
use crate::config::ServiceConfig;

/// Music service client errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Service returned status {0}")]
    Status(u16),
}

/// A music service that can describe its tracks.
pub trait MetadataClient: Send + Sync {
    fn get_extended_metadata(
        &self,
        track_id: &str,
    ) -> BoxFuture<'static, Result<ExtendedMetadata, ServiceError>>;
}

/// Lookup of service clients by service id (`sid`).
pub trait ServiceDirectory: Send + Sync {
    fn get_by_service_id(&self, sid: &str) -> Option<Arc<dyn MetadataClient>>;
}

/// Metadata client talking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMetadataClient {
    /// HTTP client
    client: Client,

    /// Endpoint answering `?id=<track>` with extended metadata
    endpoint: String,

    /// Display name, for logs
    name: String,
}

impl HttpMetadataClient {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
            name: name.into(),
        }
    }

    /// Build the request URL for a track.
    fn build_url(&self, track_id: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}id={}",
            self.endpoint,
            separator,
            urlencoding::encode(track_id)
        )
    }
}

impl MetadataClient for HttpMetadataClient {
    fn get_extended_metadata(
        &self,
        track_id: &str,
    ) -> BoxFuture<'static, Result<ExtendedMetadata, ServiceError>> {
        let client = self.client.clone();
        let url = self.build_url(track_id);
        let name = self.name.clone();

        async move {
            tracing::debug!("Requesting extended metadata from {}: {}", name, url);
            let response = client.get(&url).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ServiceError::Status(status.as_u16()));
            }

            let text = response.text().await?;
            serde_json::from_str(&text).map_err(|e| {
                ServiceError::InvalidResponse(format!(
                    "Failed to parse response: {}. Body: {}",
                    e,
                    body_snippet(&text)
                ))
            })
        }
        .boxed()
    }
}

/// Start of a response body, cut on a character boundary.
fn body_snippet(text: &str) -> String {
    text.chars().take(500).collect()
}

/// Service clients known to this session.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    clients: HashMap<String, Arc<dyn MetadataClient>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP clients for every configured service.
    pub fn from_config(services: &[ServiceConfig], timeout: Duration) -> Self {
        let mut registry = Self::new();
        for service in services {
            registry.register(
                service.sid.clone(),
                Arc::new(HttpMetadataClient::new(
                    service.name.clone(),
                    service.endpoint.clone(),
                    timeout,
                )),
            );
        }
        registry
    }

    pub fn register(&mut self, sid: impl Into<String>, client: Arc<dyn MetadataClient>) {
        self.clients.insert(sid.into(), client);
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}

impl ServiceDirectory for ServiceRegistry {
    fn get_by_service_id(&self, sid: &str) -> Option<Arc<dyn MetadataClient>> {
        self.clients.get(sid).cloned()
    }
}
