//! Application configuration management.

use std::path::PathBuf;
use std::time::Duration;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::device::DeviceAddress;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Device whose queue is shown
    #[serde(default)]
    pub device: DeviceConfig,

    /// Album art loading
    #[serde(default)]
    pub art: ArtConfig,

    /// Music services consulted when artwork goes missing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceConfig>,

    /// UI configuration
    #[serde(default)]
    pub ui: UiConfig,
}

/// Connected device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host name or IP address (e.g., "192.168.1.20")
    #[serde(default)]
    pub host: String,

    /// HTTP port of the device
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Album art configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtConfig {
    /// Directory holding bundled assets (`./images/...`, `./svg/...`)
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Timeout for artwork and metadata requests
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Draw thumbnails with terminal graphics (requires sixel/kitty support)
    #[serde(default = "default_true")]
    pub show_thumbnails: bool,
}

/// A music service metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service id as it appears in track URIs (`sid=...`)
    pub sid: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Endpoint answering `?id=<track>` with extended metadata JSON
    pub endpoint: String,
}

/// UI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Queue snapshot opened at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_path: Option<PathBuf>,
}

fn default_port() -> u16 {
    1400
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
        }
    }
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            request_timeout_secs: default_timeout_secs(),
            show_thumbnails: true,
        }
    }
}

impl ArtConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Config {
    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;

        Ok(config_dir.join("sonos-queue-tui").join("config.toml"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file. A missing file yields defaults.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Address of the configured device.
    pub fn device_address(&self) -> DeviceAddress {
        DeviceAddress::new(self.device.host.clone(), self.device.port)
    }

    /// Check if the configuration is usable.
    pub fn is_valid(&self) -> bool {
        let valid_device = !self.device.host.is_empty() && self.device.port != 0;

        let valid_services = self.services.iter().all(|s| {
            !s.sid.is_empty()
                && (s.endpoint.starts_with("http://") || s.endpoint.starts_with("https://"))
        });

        valid_device && valid_services
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [device]
            host = "192.168.1.20"

            [art]
            assets_dir = "/usr/share/sonos-queue-tui"
            request_timeout_secs = 3

            [[services]]
            sid = "9"
            name = "Spotify"
            endpoint = "http://localhost:8080/metadata/9"

            [ui]
            queue_path = "queue.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.device_address(), DeviceAddress::new("192.168.1.20", 1400));
        assert_eq!(config.art.request_timeout(), Duration::from_secs(3));
        assert!(config.art.show_thumbnails);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].name, "Spotify");
        assert_eq!(config.ui.queue_path, Some(PathBuf::from("queue.json")));
        assert!(config.is_valid());
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.device.port, 1400);
        assert_eq!(config.art.assets_dir, PathBuf::from("."));
        assert_eq!(config.art.request_timeout_secs, 10);
        assert!(config.services.is_empty());
        assert!(!config.is_valid());
    }

    #[test]
    fn test_invalid_service_endpoint() {
        let mut config = Config::default();
        config.device.host = String::from("sonos.local");
        assert!(config.is_valid());

        config.services.push(ServiceConfig {
            sid: String::from("9"),
            name: String::new(),
            endpoint: String::from("ftp://nope"),
        });
        assert!(!config.is_valid());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("sonos-queue-tui-{}", std::process::id()))
            .join("config.toml");

        let mut config = Config::default();
        config.device.host = String::from("10.0.0.7");
        config.art.show_thumbnails = false;
        config.ui.queue_path = Some(PathBuf::from("queue.json"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.device_address(), DeviceAddress::new("10.0.0.7", 1400));
        assert!(!loaded.art.show_thumbnails);
        assert_eq!(loaded.ui.queue_path, Some(PathBuf::from("queue.json")));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_from(std::path::Path::new("/nonexistent/config.toml")).unwrap();
        assert!(config.device.host.is_empty());
    }
}
