//! Connected device, its play queue and the music services it talks to.

pub mod models;
pub mod services;

pub use models::{load_queue, QueueItem};
pub use services::{HttpMetadataClient, MetadataClient, ServiceDirectory, ServiceRegistry};

/// Network address of the currently connected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub host: String,
    pub port: u16,
}

impl DeviceAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL that device-relative artwork paths are resolved against.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
