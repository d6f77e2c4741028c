//! Lazy, cached album art for list rows.

pub mod album_art;
pub mod cache;
pub mod fallback;
pub mod fetch;
pub mod source;
pub mod visibility;

pub use album_art::{AlbumArt, ArtContext, ArtDisplay, ArtEffect, ArtEvent, LoadState};
pub use cache::{CacheKey, ResolvedUrlCache};
pub use fallback::{resolve_fallback, FallbackAbort};
pub use fetch::{FetchError, FetchPipeline, FetchResult, FetchTicket, HttpImageLoader, ImageLoader};
pub use source::{ArtProps, SourceDescriptor, DEFAULT_PARENT_TYPE, PLACEHOLDER_ART};
pub use visibility::{LineSpan, ObserverHandle, Viewports, VisibilityObserver, MIN_VISIBLE_RATIO};
