//! UI components module.

pub mod album_art;
pub mod queue;

pub use album_art::ThumbnailStore;
pub use queue::{render_queue, QueueState};
