//! Album art loading state machine.
//!
//! One [`AlbumArt`] exists per rendered thumbnail. The host feeds it
//! [`ArtEvent`]s from its own lifecycle (props, visibility, unmount) and
//! from completed async work, and carries out the [`ArtEffect`]s it asks
//! for. Completions are matched against the current target URL, so work
//! started for an input that has since changed is dropped on arrival.

use super::cache::{CacheKey, ResolvedUrlCache};
use super::fallback::FallbackAbort;
use super::fetch::FetchError;
use super::source::{derive_url, ArtProps, PLACEHOLDER_ART};
use crate::device::DeviceAddress;

/// Loading progress of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Something that happened to an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtEvent {
    PropsChanged(ArtProps),
    VisibilityChanged(bool),
    FetchSucceeded { url: String },
    FetchFailed { url: String, error: FetchError },
    FallbackResolved { failed_url: String, url: String },
    FallbackAborted { failed_url: String, reason: FallbackAbort },
    Unmount,
}

/// Work an instance asks its host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtEffect {
    /// Load the URL through the fetch pipeline
    Fetch { url: String },

    /// Look up replacement artwork for a URL that answered 404
    ResolveFallback { failed_url: String, source: String },

    /// Record that a source string is served by `url`
    Remember { source: String, url: String },
}

/// Read-only surroundings of a transition.
#[derive(Debug, Clone, Copy)]
pub struct ArtContext<'a> {
    pub device: &'a DeviceAddress,
    pub cache: &'a ResolvedUrlCache,
}

impl<'a> ArtContext<'a> {
    pub fn new(device: &'a DeviceAddress, cache: &'a ResolvedUrlCache) -> Self {
        Self { device, cache }
    }
}

/// What a thumbnail should show right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtDisplay {
    Image(String),
    Placeholder,
}

impl ArtDisplay {
    #[allow(dead_code)]
    pub fn src(&self) -> &str {
        match self {
            Self::Image(url) => url,
            Self::Placeholder => PLACEHOLDER_ART,
        }
    }
}

/// Visibility-gated, cached, self-healing artwork loader for one thumbnail.
#[derive(Debug, Clone)]
pub struct AlbumArt {
    /// Latest inputs
    props: ArtProps,

    /// Inputs the current target was derived from
    derived_for: Option<ArtProps>,

    /// URL currently being loaded or shown
    target: Option<String>,

    state: LoadState,
    visible: bool,
    mounted: bool,

    /// A metadata fallback was already tried for the current inputs
    fallback_used: bool,

    /// Waiting for a fallback answer
    resolving: bool,
}

impl AlbumArt {
    pub fn new(props: ArtProps) -> Self {
        Self {
            props,
            derived_for: None,
            target: None,
            state: LoadState::Idle,
            visible: false,
            mounted: true,
            fallback_used: false,
            resolving: false,
        }
    }

    pub fn props(&self) -> &ArtProps {
        &self.props
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    #[allow(dead_code)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[allow(dead_code)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[allow(dead_code)]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Apply an event and return the work it requires.
    pub fn handle(&mut self, event: ArtEvent, ctx: &ArtContext<'_>) -> Vec<ArtEffect> {
        if !self.mounted {
            return Vec::new();
        }

        match event {
            ArtEvent::PropsChanged(props) => {
                self.props = props;
                if self.visible {
                    self.sync(ctx)
                } else {
                    if self.state == LoadState::Failed
                        && self.derived_for.as_ref() != Some(&self.props)
                    {
                        self.state = LoadState::Idle;
                    }
                    Vec::new()
                }
            }

            ArtEvent::VisibilityChanged(visible) => {
                self.visible = visible;
                if visible {
                    return self.sync(ctx);
                }

                if self.state == LoadState::Loading {
                    self.state = LoadState::Idle;
                    if self.resolving {
                        // The answer will be dropped, allow another attempt later
                        self.resolving = false;
                        self.fallback_used = false;
                    }
                }
                Vec::new()
            }

            ArtEvent::FetchSucceeded { url } => {
                if !self.awaits_fetch(&url) {
                    return Vec::new();
                }
                self.state = LoadState::Loaded;
                self.remember(&url)
            }

            ArtEvent::FetchFailed { url, error } => {
                if !self.awaits_fetch(&url) {
                    return Vec::new();
                }

                match error {
                    FetchError::NotFound if !self.fallback_used => {
                        self.fallback_used = true;
                        self.resolving = true;
                        let source = self
                            .props
                            .source_key()
                            .map(str::to_string)
                            .unwrap_or_else(|| url.clone());
                        vec![ArtEffect::ResolveFallback {
                            failed_url: url,
                            source,
                        }]
                    }
                    _ => {
                        tracing::debug!("Giving up on artwork {}: {}", url, error);
                        self.state = LoadState::Failed;
                        Vec::new()
                    }
                }
            }

            ArtEvent::FallbackResolved { failed_url, url } => {
                if !self.awaits_fallback(&failed_url) {
                    return Vec::new();
                }
                tracing::info!("Artwork {} replaced by {}", failed_url, url);
                self.resolving = false;
                self.target = Some(url);
                self.start_loading(ctx)
            }

            ArtEvent::FallbackAborted { failed_url, reason } => {
                if !self.awaits_fallback(&failed_url) {
                    return Vec::new();
                }
                tracing::debug!("Artwork fallback for {} aborted: {}", failed_url, reason);
                self.resolving = false;
                self.state = LoadState::Failed;
                Vec::new()
            }

            ArtEvent::Unmount => {
                self.mounted = false;
                self.visible = false;
                self.resolving = false;
                self.target = None;
                self.state = LoadState::Idle;
                Vec::new()
            }
        }
    }

    /// Resolve what to show, given the shared cache.
    ///
    /// An image is only returned once this instance finished loading it.
    pub fn display(&self, cache: &ResolvedUrlCache) -> ArtDisplay {
        if self.state != LoadState::Loaded {
            return ArtDisplay::Placeholder;
        }

        self.target
            .as_deref()
            .and_then(|target| cache.get_url(target))
            .map(|url| ArtDisplay::Image(url.to_string()))
            .unwrap_or(ArtDisplay::Placeholder)
    }

    /// Bring the instance in line with its props. Only called while visible.
    fn sync(&mut self, ctx: &ArtContext<'_>) -> Vec<ArtEffect> {
        if self.derived_for.as_ref() != Some(&self.props) {
            self.derived_for = Some(self.props.clone());
            self.fallback_used = false;
            self.resolving = false;

            // A source already known to be served elsewhere skips straight there
            let remembered = self
                .props
                .source_key()
                .and_then(|source| ctx.cache.get(&CacheKey::source(source)))
                .map(str::to_string);

            self.target = remembered.or_else(|| derive_url(&self.props, ctx.device));
            return match self.target {
                Some(_) => self.start_loading(ctx),
                None => {
                    self.state = LoadState::Loaded;
                    Vec::new()
                }
            };
        }

        if self.state == LoadState::Idle && self.target.is_some() {
            return self.start_loading(ctx);
        }

        Vec::new()
    }

    fn start_loading(&mut self, ctx: &ArtContext<'_>) -> Vec<ArtEffect> {
        let Some(url) = self.target.clone() else {
            return Vec::new();
        };

        if ctx.cache.get_url(&url).is_some() {
            self.state = LoadState::Loaded;
            return self.remember(&url);
        }

        self.state = LoadState::Loading;
        vec![ArtEffect::Fetch { url }]
    }

    fn remember(&self, url: &str) -> Vec<ArtEffect> {
        match self.props.source_key() {
            Some(source) if source != url => vec![ArtEffect::Remember {
                source: source.to_string(),
                url: url.to_string(),
            }],
            _ => Vec::new(),
        }
    }

    fn awaits_fetch(&self, url: &str) -> bool {
        self.visible
            && !self.resolving
            && self.state == LoadState::Loading
            && self.target.as_deref() == Some(url)
    }

    fn awaits_fallback(&self, failed_url: &str) -> bool {
        self.visible
            && self.resolving
            && self.state == LoadState::Loading
            && self.target.as_deref() == Some(failed_url)
    }
}
