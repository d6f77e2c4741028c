//! Queue and metadata models.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::art::SourceDescriptor;

/// Errors while reading a queue snapshot.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("could not read queue file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid queue file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One entry of the device's play queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub title: String,

    /// Artist as reported by the device
    #[serde(default)]
    pub creator: Option<String>,

    #[serde(default)]
    pub album: Option<String>,

    #[serde(default, rename = "albumArtURI")]
    pub album_art_uri: Option<SourceDescriptor>,

    /// Music service the track streams from, if any
    #[serde(default)]
    pub service_id: Option<String>,
}

impl QueueItem {
    pub fn display_creator(&self) -> &str {
        self.creator.as_deref().unwrap_or("Unknown Artist")
    }
}

/// Read a queue snapshot (a JSON array of items).
pub fn load_queue(path: &Path) -> Result<Vec<QueueItem>, QueueError> {
    let contents = std::fs::read_to_string(path)?;
    parse_queue(&contents)
}

pub fn parse_queue(contents: &str) -> Result<Vec<QueueItem>, QueueError> {
    Ok(serde_json::from_str(contents)?)
}

// ============================================================================
// Extended metadata
// ============================================================================

/// Answer of a music service's extended metadata call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedMetadata {
    #[serde(default)]
    pub media_metadata: Option<MediaMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub track_metadata: Option<TrackMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default, rename = "albumArtURI")]
    pub album_art_uri: Option<String>,
}

impl ExtendedMetadata {
    /// `mediaMetadata.trackMetadata.albumArtURI`, if present and non-empty.
    pub fn album_art_uri(&self) -> Option<&str> {
        self.media_metadata
            .as_ref()?
            .track_metadata
            .as_ref()?
            .album_art_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queue() {
        let queue = parse_queue(
            r#"[
                {"title": "Roygbiv", "creator": "Boards of Canada",
                 "albumArtURI": "/getaa?s=1&u=x-file-cifs%3a%2f%2fnas%2froygbiv.mp3"},
                {"title": "Embedded", "albumArtURI": {"_": "http://host/a.jpg"}},
                {"title": "Radio", "serviceId": "254"}
            ]"#,
        )
        .unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue[0].display_creator(), "Boards of Canada");
        assert_eq!(
            queue[0].album_art_uri,
            Some(SourceDescriptor::from(
                "/getaa?s=1&u=x-file-cifs%3a%2f%2fnas%2froygbiv.mp3"
            ))
        );
        assert_eq!(
            queue[1].album_art_uri,
            Some(SourceDescriptor::Embedded {
                url: Some(String::from("http://host/a.jpg"))
            })
        );
        assert_eq!(queue[2].display_creator(), "Unknown Artist");
        assert_eq!(queue[2].service_id.as_deref(), Some("254"));
    }

    #[test]
    fn test_parse_queue_rejects_garbage() {
        assert!(matches!(parse_queue("{"), Err(QueueError::Parse(_))));
    }

    #[test]
    fn test_album_art_uri_path() {
        let metadata: ExtendedMetadata = serde_json::from_str(
            r#"{"mediaMetadata": {"id": "t1", "trackMetadata": {"albumArtURI": "http://cdn/new.jpg"}}}"#,
        )
        .unwrap();
        assert_eq!(metadata.album_art_uri(), Some("http://cdn/new.jpg"));

        let empty: ExtendedMetadata =
            serde_json::from_str(r#"{"mediaMetadata": {"trackMetadata": {}}}"#).unwrap();
        assert_eq!(empty.album_art_uri(), None);
        assert_eq!(ExtendedMetadata::default().album_art_uri(), None);
    }
}
