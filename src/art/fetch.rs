//! Artwork fetching with per-URL deduplication.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use image::DynamicImage;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::cache::{CacheKey, ResolvedUrlCache};

/// Why an artwork load failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The asset does not exist (HTTP 404 or missing local file)
    #[error("artwork not found")]
    NotFound,

    /// Anything else: transport, status, decode
    #[error("failed to load artwork: {0}")]
    Load(String),
}

/// Result of loading one URL.
pub type FetchResult = Result<DynamicImage, FetchError>;

/// Loads and decodes the image behind a URL.
pub trait ImageLoader: Send + Sync {
    fn load(&self, url: String) -> BoxFuture<'static, FetchResult>;
}

/// Loader for remote artwork (reqwest) and bundled assets (filesystem).
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: Client,
    assets_dir: PathBuf,
}

impl HttpImageLoader {
    pub fn new(assets_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            assets_dir: assets_dir.into(),
        }
    }
}

impl ImageLoader for HttpImageLoader {
    fn load(&self, url: String) -> BoxFuture<'static, FetchResult> {
        let client = self.client.clone();
        let assets_dir = self.assets_dir.clone();

        async move {
            let bytes = if url.starts_with("http://") || url.starts_with("https://") {
                fetch_remote(&client, &url).await?
            } else {
                read_local(assets_dir.join(url.trim_start_matches("./"))).await?
            };

            image::load_from_memory(&bytes).map_err(|e| FetchError::Load(e.to_string()))
        }
        .boxed()
    }
}

async fn fetch_remote(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Load(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound);
    }
    if !status.is_success() {
        return Err(FetchError::Load(format!("server answered {}", status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Load(e.to_string()))?;
    Ok(bytes.to_vec())
}

async fn read_local(path: PathBuf) -> Result<Vec<u8>, FetchError> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound),
        Err(e) => Err(FetchError::Load(format!("{}: {}", path.display(), e))),
    }
}

/// What happened when a URL was requested.
pub enum FetchTicket {
    /// Already confirmed, nothing to do
    Cached,
    /// A load for this URL is already running
    Joined,
    /// A new load; the caller drives the future and reports back via `complete`
    Started(BoxFuture<'static, FetchResult>),
}

impl std::fmt::Debug for FetchTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cached => write!(f, "Cached"),
            Self::Joined => write!(f, "Joined"),
            Self::Started(_) => write!(f, "Started"),
        }
    }
}

/// Front door for every artwork load.
///
/// Guarantees one load per URL while it is in flight or once it is cached.
pub struct FetchPipeline {
    loader: Arc<dyn ImageLoader>,
    in_flight: HashSet<String>,
    started: usize,
}

impl FetchPipeline {
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            loader,
            in_flight: HashSet::new(),
            started: 0,
        }
    }

    /// Request a URL, starting a load only on a cache miss with nothing in flight.
    pub fn request(&mut self, url: &str, cache: &ResolvedUrlCache) -> FetchTicket {
        if cache.get_url(url).is_some() {
            tracing::debug!("Artwork cache hit: {}", url);
            return FetchTicket::Cached;
        }

        if !self.in_flight.insert(url.to_string()) {
            tracing::debug!("Artwork already in flight: {}", url);
            return FetchTicket::Joined;
        }

        self.started += 1;
        FetchTicket::Started(self.loader.load(url.to_string()))
    }

    /// Record the outcome of a started load.
    pub fn complete(&mut self, url: &str, outcome: &FetchResult, cache: &mut ResolvedUrlCache) {
        self.in_flight.remove(url);

        match outcome {
            Ok(_) => cache.set(CacheKey::url(url), url),
            Err(e) => tracing::warn!("Artwork load failed for {}: {}", url, e),
        }
    }

    #[allow(dead_code)]
    pub fn is_in_flight(&self, url: &str) -> bool {
        self.in_flight.contains(url)
    }

    /// Number of loads actually started.
    pub fn started(&self) -> usize {
        self.started
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory loader with scripted answers and a call counter.
    #[derive(Default)]
    pub struct FakeLoader {
        pub calls: AtomicUsize,
        pub answers: Mutex<HashMap<String, Result<(), FetchError>>>,
    }

    impl FakeLoader {
        pub fn answering(answers: &[(&str, Result<(), FetchError>)]) -> Arc<Self> {
            let loader = Self::default();
            {
                let mut map = loader.answers.lock().unwrap();
                for (url, answer) in answers {
                    map.insert(url.to_string(), answer.clone());
                }
            }
            Arc::new(loader)
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ImageLoader for FakeLoader {
        fn load(&self, url: String) -> BoxFuture<'static, FetchResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self
                .answers
                .lock()
                .unwrap()
                .get(&url)
                .cloned()
                .unwrap_or(Err(FetchError::Load(String::from("unscripted"))));

            async move { answer.map(|_| DynamicImage::new_rgb8(2, 2)) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_in_flight_requests_are_joined() {
        let loader = FakeLoader::answering(&[("http://a/1.jpg", Ok(()))]);
        let mut pipeline = FetchPipeline::new(loader.clone());
        let mut cache = ResolvedUrlCache::new();

        let first = pipeline.request("http://a/1.jpg", &cache);
        let second = pipeline.request("http://a/1.jpg", &cache);
        assert!(matches!(second, FetchTicket::Joined));
        assert!(pipeline.is_in_flight("http://a/1.jpg"));

        let FetchTicket::Started(future) = first else {
            panic!("first request should start a load");
        };
        let outcome = future.await;
        pipeline.complete("http://a/1.jpg", &outcome, &mut cache);

        assert!(!pipeline.is_in_flight("http://a/1.jpg"));
        assert_eq!(cache.get_url("http://a/1.jpg"), Some("http://a/1.jpg"));
        assert_eq!(loader.calls(), 1);
        assert_eq!(pipeline.started(), 1);
    }

    #[tokio::test]
    async fn test_cached_url_is_not_loaded_again() {
        let loader = FakeLoader::answering(&[]);
        let mut pipeline = FetchPipeline::new(loader.clone());
        let mut cache = ResolvedUrlCache::new();
        cache.set(CacheKey::url("http://a/1.jpg"), "http://a/1.jpg");

        for _ in 0..3 {
            assert!(matches!(
                pipeline.request("http://a/1.jpg", &cache),
                FetchTicket::Cached
            ));
        }
        assert_eq!(loader.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached_and_can_be_retried() {
        let loader = FakeLoader::answering(&[("http://a/404.jpg", Err(FetchError::NotFound))]);
        let mut pipeline = FetchPipeline::new(loader.clone());
        let mut cache = ResolvedUrlCache::new();

        let FetchTicket::Started(future) = pipeline.request("http://a/404.jpg", &cache) else {
            panic!("expected a started load");
        };
        let outcome = future.await;
        assert_eq!(outcome.as_ref().err(), Some(&FetchError::NotFound));
        pipeline.complete("http://a/404.jpg", &outcome, &mut cache);

        assert!(cache.is_empty());
        assert!(matches!(
            pipeline.request("http://a/404.jpg", &cache),
            FetchTicket::Started(_)
        ));
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_local_asset_is_not_found() {
        let loader = HttpImageLoader::new("/nonexistent-assets-dir", Duration::from_secs(1));
        let outcome = loader.load(String::from("./images/missing.png")).await;
        assert_eq!(outcome.err(), Some(FetchError::NotFound));
    }
}
