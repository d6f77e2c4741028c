//! Recovery of a working artwork URL after a 404.
//!
//! Device artwork URLs embed the track URI in their `u` parameter. That
//! URI names the music service (`sid`) and the track, which is enough to
//! ask the service for fresh metadata carrying the current art URL.

use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use thiserror::Error;

use crate::device::ServiceDirectory;

/// Reasons a fallback gives up. None of them are surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackAbort {
    #[error("artwork source is not a URL: {0}")]
    InvalidSource(String),

    #[error("artwork source has no track URI")]
    MissingTrackUri,

    #[error("track URI is not a URL: {0}")]
    InvalidTrackUri(String),

    #[error("track URI has no service id")]
    MissingServiceId,

    #[error("no client for service {0}")]
    UnknownService(String),

    #[error("metadata request failed: {0}")]
    Service(String),

    #[error("metadata carries no album art")]
    MissingAlbumArt,
}

/// What to ask which service for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRequest {
    pub sid: String,
    pub track_id: String,
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Extract the service id and track id from a failing artwork source.
pub fn parse_fallback_source(source: &str) -> Result<FallbackRequest, FallbackAbort> {
    let absolute = if source.starts_with('/') {
        format!("http://localhost{}", source)
    } else {
        source.to_string()
    };

    let outer = Url::parse(&absolute).map_err(|e| FallbackAbort::InvalidSource(e.to_string()))?;
    let track_uri = query_param(&outer, "u").ok_or(FallbackAbort::MissingTrackUri)?;
    let inner =
        Url::parse(&track_uri).map_err(|e| FallbackAbort::InvalidTrackUri(e.to_string()))?;

    let sid = query_param(&inner, "sid")
        .filter(|sid| !sid.is_empty())
        .ok_or(FallbackAbort::MissingServiceId)?;

    let path = inner.path();
    let track_id = urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string())
        .replacen(".mp3", "", 1);

    Ok(FallbackRequest { sid, track_id })
}

/// Ask the track's music service for a replacement artwork URL.
///
/// Parsing and client lookup happen up front; the returned future only
/// performs the metadata call.
pub fn resolve_fallback(
    directory: &dyn ServiceDirectory,
    source: &str,
) -> BoxFuture<'static, Result<String, FallbackAbort>> {
    let request = match parse_fallback_source(source) {
        Ok(request) => request,
        Err(abort) => return futures::future::ready(Err(abort)).boxed(),
    };

    let Some(client) = directory.get_by_service_id(&request.sid) else {
        return futures::future::ready(Err(FallbackAbort::UnknownService(request.sid))).boxed();
    };

    let metadata = client.get_extended_metadata(&request.track_id);
    async move {
        let metadata = metadata
            .await
            .map_err(|e| FallbackAbort::Service(e.to_string()))?;

        metadata
            .album_art_uri()
            .map(str::to_string)
            .ok_or(FallbackAbort::MissingAlbumArt)
    }
    .boxed()
}
