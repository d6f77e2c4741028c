//! Source descriptors and URL derivation for album art.

use serde::{Deserialize, Serialize};

use crate::device::DeviceAddress;

/// Artwork shown while nothing better is available.
pub const PLACEHOLDER_ART: &str = "images/browse_missing_album_art.png";

/// Artwork reference as handed over by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceDescriptor {
    /// Plain URL or device-relative path
    Url(String),

    /// Structured value whose `_` field carries the URL
    Embedded {
        #[serde(rename = "_", default)]
        url: Option<String>,
    },
}

impl SourceDescriptor {
    /// The raw string form, used as the source-level cache key.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Embedded { .. } => None,
        }
    }
}

impl From<&str> for SourceDescriptor {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

/// Inputs of one album art instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtProps {
    pub src: Option<SourceDescriptor>,
    pub service_id: Option<String>,
    /// Name of the scrolling container the instance lives in
    pub parent_type: String,
}

impl Default for ArtProps {
    fn default() -> Self {
        Self {
            src: None,
            service_id: None,
            parent_type: String::from(DEFAULT_PARENT_TYPE),
        }
    }
}

/// Scroll container used when the caller doesn't name one.
pub const DEFAULT_PARENT_TYPE: &str = "queue";

impl ArtProps {
    #[allow(dead_code)]
    pub fn from_src(src: impl Into<SourceDescriptor>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    #[allow(dead_code)]
    pub fn from_service(service_id: impl Into<String>) -> Self {
        Self {
            service_id: Some(service_id.into()),
            ..Self::default()
        }
    }

    /// Key under which a confirmed URL is also remembered for this source.
    ///
    /// Only set when the plain string is what gets loaded: a service id
    /// puts its logo ahead of it, and the logo must not be remembered
    /// for the string.
    pub fn source_key(&self) -> Option<&str> {
        if self.service_id.is_some() {
            return None;
        }
        self.src.as_ref().and_then(SourceDescriptor::as_key)
    }
}

/// Fixed logo for a music service.
pub fn service_logo_url(service_id: &str) -> String {
    format!("./svg/service_logos/{}.svg", service_id)
}

/// Whether a URL can be fetched as-is.
pub fn is_passthrough(url: &str) -> bool {
    url.starts_with("https://")
        || url.starts_with("http://")
        || url.starts_with("./svg")
        || url.starts_with("./images")
}

/// Pick the candidate URL for a set of props, before any rewriting.
fn candidate_url(props: &ArtProps) -> Option<String> {
    if let Some(SourceDescriptor::Embedded { url: Some(url) }) = &props.src {
        return Some(url.clone());
    }

    if let Some(service_id) = &props.service_id {
        return Some(service_logo_url(service_id));
    }

    match &props.src {
        Some(SourceDescriptor::Url(url)) => Some(url.clone()),
        _ => None,
    }
}

/// Compute the fetchable URL for a set of props.
///
/// Device-relative paths are percent-decoded and rebased onto the
/// connected device. Returns `None` when there is nothing to load.
pub fn derive_url(props: &ArtProps, device: &DeviceAddress) -> Option<String> {
    let url = candidate_url(props).filter(|url| !url.is_empty())?;

    if is_passthrough(&url) {
        return Some(url);
    }

    let decoded = urlencoding::decode(&url)
        .map(|d| d.into_owned())
        .unwrap_or(url);

    Some(format!("{}{}", device.base_url(), decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceAddress {
        DeviceAddress::new("192.168.1.20", 1400)
    }

    #[test]
    fn test_absolute_url_passthrough() {
        let props = ArtProps::from_src("http://host/art.jpg");
        assert_eq!(
            derive_url(&props, &device()).as_deref(),
            Some("http://host/art.jpg")
        );

        let props = ArtProps::from_src("https://cdn.example.com/a.png");
        assert_eq!(
            derive_url(&props, &device()).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_local_asset_passthrough() {
        let props = ArtProps::from_src("./images/radio.png");
        assert_eq!(
            derive_url(&props, &device()).as_deref(),
            Some("./images/radio.png")
        );
    }

    #[test]
    fn test_device_relative_path_is_decoded_and_rebased() {
        let props = ArtProps::from_src("/getaa?s=1&u=x-file%3a%2f%2ftrack.mp3");
        assert_eq!(
            derive_url(&props, &device()).as_deref(),
            Some("http://192.168.1.20:1400/getaa?s=1&u=x-file://track.mp3")
        );
    }

    #[test]
    fn test_embedded_field_wins() {
        let props = ArtProps {
            src: Some(SourceDescriptor::Embedded {
                url: Some(String::from("http://host/embedded.jpg")),
            }),
            service_id: Some(String::from("254")),
            ..ArtProps::default()
        };
        assert_eq!(
            derive_url(&props, &device()).as_deref(),
            Some("http://host/embedded.jpg")
        );
    }

    #[test]
    fn test_service_logo_before_plain_string() {
        let props = ArtProps {
            src: Some(SourceDescriptor::from("http://host/art.jpg")),
            service_id: Some(String::from("9")),
            ..ArtProps::default()
        };
        assert_eq!(
            derive_url(&props, &device()).as_deref(),
            Some("./svg/service_logos/9.svg")
        );
    }

    #[test]
    fn test_nothing_to_load() {
        assert_eq!(derive_url(&ArtProps::default(), &device()), None);

        let props = ArtProps {
            src: Some(SourceDescriptor::Embedded { url: None }),
            ..ArtProps::default()
        };
        assert_eq!(derive_url(&props, &device()), None);
        assert_eq!(derive_url(&ArtProps::from_src(""), &device()), None);
    }

    #[test]
    fn test_source_key_only_for_plain_string_candidates() {
        assert_eq!(
            ArtProps::from_src("/getaa?s=1").source_key(),
            Some("/getaa?s=1")
        );
        assert_eq!(ArtProps::from_service("9").source_key(), None);

        let logo_first = ArtProps {
            src: Some(SourceDescriptor::from("/getaa?s=1")),
            service_id: Some(String::from("9")),
            ..ArtProps::default()
        };
        assert_eq!(logo_first.source_key(), None);
    }

    #[test]
    fn test_descriptor_deserializes_both_shapes() {
        let plain: SourceDescriptor = serde_json::from_str(r#""/getaa?s=1""#).unwrap();
        assert_eq!(plain, SourceDescriptor::from("/getaa?s=1"));

        let embedded: SourceDescriptor =
            serde_json::from_str(r#"{"_": "http://host/a.jpg", "$": {"x": 1}}"#).unwrap();
        assert_eq!(
            embedded,
            SourceDescriptor::Embedded {
                url: Some(String::from("http://host/a.jpg"))
            }
        );
        assert_eq!(embedded.as_key(), None);
    }
}
