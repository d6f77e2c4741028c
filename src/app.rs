//! Main application state and logic.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::art::{
    resolve_fallback, AlbumArt, ArtContext, ArtEffect, ArtEvent, CacheKey, FallbackAbort,
    FetchError, FetchPipeline, FetchTicket, HttpImageLoader, ImageLoader, ObserverHandle, ResolvedUrlCache, Viewports,
    VisibilityObserver, DEFAULT_PARENT_TYPE, MIN_VISIBLE_RATIO,
};
use crate::config::Config;
use crate::device::{load_queue, DeviceAddress, QueueItem, ServiceDirectory, ServiceRegistry};
use crate::ui::{QueueState, ThumbnailStore, CHROME_HEIGHT};

/// Album art of one queue row, keyed by row position.
pub struct ArtRow {
    pub art: AlbumArt,
    pub handle: ObserverHandle,
}

/// Main application state.
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,

    /// Configuration
    pub config: Config,

    /// Device the queue belongs to
    pub device: DeviceAddress,

    /// Queue snapshot to (re)load
    pub queue_path: Option<PathBuf>,

    /// Queue state
    pub queue: QueueState,

    /// Album art per queue row
    pub rows: Vec<ArtRow>,

    /// URLs confirmed to load, shared by every row
    pub cache: ResolvedUrlCache,

    /// Deduplicating artwork loader
    pub pipeline: FetchPipeline,

    /// Music services used to repair broken artwork
    pub services: Arc<dyn ServiceDirectory>,

    /// Row visibility tracking
    pub observer: VisibilityObserver,

    /// Scrollable areas rows are measured against
    pub viewports: Viewports,

    /// Decoded artwork
    pub thumbnails: ThumbnailStore,

    /// Help overlay visible
    pub show_help: bool,

    /// Error message to display
    pub error_message: Option<String>,

    /// Short feedback shown in the status bar
    pub status: Option<String>,

    /// Action sender for async operations
    pub action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        let (_, height) = crossterm::terminal::size().unwrap_or((80, 24));
        let timeout = config.art.request_timeout();

        let loader = Arc::new(HttpImageLoader::new(config.art.assets_dir.clone(), timeout));
        let services = ServiceRegistry::from_config(&config.services, timeout);
        tracing::info!("{} music services configured", services.len());

        Self::with_parts(
            config,
            action_tx,
            loader,
            Arc::new(services),
            height.saturating_sub(CHROME_HEIGHT) as usize,
        )
    }

    /// Create an application around explicit loaders.
    pub fn with_parts(
        config: Config,
        action_tx: mpsc::UnboundedSender<Action>,
        loader: Arc<dyn ImageLoader>,
        services: Arc<dyn ServiceDirectory>,
        page_height: usize,
    ) -> Self {
        let queue = QueueState::new(page_height);
        let mut viewports = Viewports::default();
        viewports.set(DEFAULT_PARENT_TYPE, queue.viewport());

        Self {
            should_quit: false,
            device: config.device_address(),
            queue_path: config.ui.queue_path.clone(),
            thumbnails: ThumbnailStore::new(config.art.show_thumbnails),
            config,
            queue,
            rows: Vec::new(),
            cache: ResolvedUrlCache::new(),
            pipeline: FetchPipeline::new(loader),
            services,
            observer: VisibilityObserver::new(),
            viewports,
            show_help: false,
            error_message: None,
            status: None,
            action_tx,
        }
    }

    /// Initialize the application.
    pub async fn init(&mut self) -> Result<()> {
        if self.config.is_valid() {
            tracing::info!("Showing queue of device {}", self.device.base_url());
        } else {
            self.error_message = Some(String::from(
                "Invalid configuration. Please configure the device host and service endpoints.",
            ));
        }

        // Load initial data
        if self.queue_path.is_some() {
            self.action_tx.send(Action::ReloadQueue)?;
        }

        Ok(())
    }

    /// Handle an action and update state.
    pub async fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }

            Action::Tick => {}

            Action::Resize(_, height) => {
                // Best guess until the next render measures the panel
                self.queue.page_height = height.saturating_sub(CHROME_HEIGHT) as usize;
            }

            // Navigation
            Action::NavigateUp => self.queue.select_previous(),
            Action::NavigateDown => self.queue.select_next(),
            Action::JumpToTop => self.queue.jump_to_top(),
            Action::JumpToBottom => self.queue.jump_to_bottom(),
            Action::ScrollHalfPageDown => self.queue.scroll_half_page_down(),
            Action::ScrollHalfPageUp => self.queue.scroll_half_page_up(),
            Action::MouseScroll(delta) => self.queue.scroll_by(delta as isize),

            // Queue
            Action::Select => {
                if let Some(index) = self.queue.selected {
                    self.queue.current_index = Some(index);
                    let title = self
                        .queue
                        .items
                        .get(index)
                        .map(|item| item.title.clone())
                        .unwrap_or_default();
                    tracing::info!("Going to queue position {}: {}", index + 1, title);
                    self.status = Some(format!("Playing #{} {}", index + 1, title));
                }
            }

            Action::RemoveSelected => {
                if self.queue.remove_selected() {
                    self.sync_rows();
                }
            }

            Action::ReloadQueue => self.load_queue()?,

            Action::QueueLoaded(items) => self.set_queue(items),

            // Album art
            Action::ArtFetched { url, result } => {
                self.pipeline.complete(&url, &result, &mut self.cache);

                let event = match result {
                    Ok(image) => {
                        self.thumbnails.insert(url.clone(), image);
                        ArtEvent::FetchSucceeded { url }
                    }
                    Err(error) => ArtEvent::FetchFailed { url, error },
                };
                for row in 0..self.rows.len() {
                    self.dispatch(row, event.clone());
                }
            }

            Action::FallbackFinished {
                row,
                failed_url,
                result,
            } => {
                let event = match result {
                    Ok(url) => ArtEvent::FallbackResolved { failed_url, url },
                    Err(reason) => ArtEvent::FallbackAborted { failed_url, reason },
                };
                self.dispatch(row, event);
            }

            // Overlays
            Action::ShowHelp => {
                self.show_help = true;
            }

            Action::HideHelp => {
                self.show_help = false;
            }

            Action::Error(msg) => {
                self.error_message = Some(msg);
            }

            Action::ClearError => {
                self.error_message = None;
            }

            Action::None => {}
        }

        self.refresh_visibility();
        Ok(())
    }

    /// Read the queue snapshot and hand it to the event loop.
    fn load_queue(&mut self) -> Result<()> {
        let Some(path) = self.queue_path.clone() else {
            self.status = Some(String::from("No queue file configured"));
            return Ok(());
        };

        match load_queue(&path) {
            Ok(items) => {
                tracing::info!("Loaded {} queue items from {}", items.len(), path.display());
                self.action_tx.send(Action::QueueLoaded(items))?;
            }
            Err(e) => {
                tracing::error!("Failed to load queue {}: {}", path.display(), e);
                self.action_tx
                    .send(Action::Error(format!("Failed to load queue: {}", e)))?;
            }
        }

        Ok(())
    }

    fn set_queue(&mut self, items: Vec<QueueItem>) {
        self.queue.set_items(items);
        self.status = Some(format!(
            "{} tracks, loaded {}",
            self.queue.len(),
            chrono::Local::now().format("%H:%M:%S")
        ));
        self.sync_rows();
    }

    /// Line rows up with queue items: surplus rows unmount, kept rows get
    /// their new props, missing rows mount.
    fn sync_rows(&mut self) {
        while self.rows.len() > self.queue.len() {
            if let Some(mut row) = self.rows.pop() {
                self.observer.unobserve(row.handle);
                let ctx = ArtContext::new(&self.device, &self.cache);
                row.art.handle(ArtEvent::Unmount, &ctx);
            }
        }

        for index in 0..self.rows.len() {
            let props = self.queue.art_props(index);
            if self.rows[index].art.props() != &props {
                self.dispatch(index, ArtEvent::PropsChanged(props));
            }
        }

        self.viewports
            .set(DEFAULT_PARENT_TYPE, self.queue.viewport());
        for index in self.rows.len()..self.queue.len() {
            let props = self.queue.art_props(index);
            let (handle, visible) = self.observer.observe(
                &props.parent_type,
                MIN_VISIBLE_RATIO,
                self.queue.row_span(index),
                &self.viewports,
            );
            self.rows.push(ArtRow {
                art: AlbumArt::new(props),
                handle,
            });
            if visible {
                self.dispatch(index, ArtEvent::VisibilityChanged(true));
            }
        }
    }

    /// Re-measure every row against the current scroll position.
    fn refresh_visibility(&mut self) {
        self.viewports
            .set(DEFAULT_PARENT_TYPE, self.queue.viewport());

        for index in 0..self.rows.len() {
            let span = self.queue.row_span(index);
            let handle = self.rows[index].handle;
            if let Some(visible) = self.observer.update(handle, span, &self.viewports) {
                self.dispatch(index, ArtEvent::VisibilityChanged(visible));
            }
        }
    }

    /// Feed an event to one row and carry out what it asks for.
    fn dispatch(&mut self, index: usize, event: ArtEvent) {
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        let ctx = ArtContext::new(&self.device, &self.cache);
        let effects = row.art.handle(event, &ctx);

        for effect in effects {
            self.apply(index, effect);
        }
    }

    fn apply(&mut self, index: usize, effect: ArtEffect) {
        match effect {
            ArtEffect::Fetch { url } => match self.pipeline.request(&url, &self.cache) {
                FetchTicket::Cached => self.dispatch(index, ArtEvent::FetchSucceeded { url }),
                FetchTicket::Joined => {}
                FetchTicket::Started(load) => {
                    let tx = self.action_tx.clone();
                    tokio::spawn(async move {
                        // A crashed load still has to report, or the row waits forever
                        let result = tokio::spawn(load).await.unwrap_or_else(|e| {
                            Err(FetchError::Load(format!("artwork task failed: {}", e)))
                        });
                        let _ = tx.send(Action::ArtFetched { url, result });
                    });
                }
            },

            ArtEffect::ResolveFallback { failed_url, source } => {
                let resolve = resolve_fallback(self.services.as_ref(), &source);
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = tokio::spawn(resolve).await.unwrap_or_else(|e| {
                        Err(FallbackAbort::Service(format!("metadata task failed: {}", e)))
                    });
                    let _ = tx.send(Action::FallbackFinished {
                        row: index,
                        failed_url,
                        result,
                    });
                });
            }

            ArtEffect::Remember { source, url } => {
                self.cache.set(CacheKey::source(source), url);
            }
        }
    }
}
