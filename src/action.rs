//! Application actions/events that drive state changes.

use crossterm::event::{KeyCode, KeyModifiers, MouseEventKind};

use crate::art::{FallbackAbort, FetchResult};
use crate::device::QueueItem;

/// Actions that can be dispatched to update application state.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Action {
    // Application lifecycle
    Quit,
    Tick,
    Resize(u16, u16),

    // Navigation
    NavigateUp,
    NavigateDown,
    JumpToTop,
    JumpToBottom,
    ScrollHalfPageDown,
    ScrollHalfPageUp,
    MouseScroll(i16), // positive = down, negative = up

    // Queue
    Select, // Go to the selected track
    RemoveSelected,
    ReloadQueue,
    QueueLoaded(Vec<QueueItem>),

    // Album art
    ArtFetched {
        url: String,
        result: FetchResult,
    },
    FallbackFinished {
        row: usize,
        failed_url: String,
        result: Result<String, FallbackAbort>,
    },

    // Overlays
    ShowHelp,
    HideHelp,

    // Errors
    Error(String),
    ClearError,

    // No-op
    None,
}

/// Rows moved per mouse wheel notch.
const WHEEL_ROWS: i16 = 3;

impl Action {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Map a key press. While help is open, keys only close it.
    pub fn from_key(code: KeyCode, modifiers: KeyModifiers, help_open: bool) -> Self {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        if help_open {
            return match code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Self::HideHelp,
                _ => Self::None,
            };
        }

        match (code, ctrl) {
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), true) => Self::Quit,
            (KeyCode::Char('d'), true) => Self::ScrollHalfPageDown,
            (KeyCode::Char('u'), true) => Self::ScrollHalfPageUp,
            (KeyCode::Up | KeyCode::Char('k'), _) => Self::NavigateUp,
            (KeyCode::Down | KeyCode::Char('j'), _) => Self::NavigateDown,
            (KeyCode::Char('g') | KeyCode::Home, _) => Self::JumpToTop,
            (KeyCode::Char('G') | KeyCode::End, _) => Self::JumpToBottom,
            (KeyCode::Enter, _) => Self::Select,
            (KeyCode::Char('d') | KeyCode::Delete, false) => Self::RemoveSelected,
            (KeyCode::Char('R'), _) => Self::ReloadQueue,
            (KeyCode::Char('?'), _) => Self::ShowHelp,
            (KeyCode::Char('x'), _) => Self::ClearError,
            _ => Self::None,
        }
    }

    /// Map a mouse event. Only the wheel does anything.
    pub fn from_mouse(kind: MouseEventKind) -> Self {
        match kind {
            MouseEventKind::ScrollUp => Self::MouseScroll(-WHEEL_ROWS),
            MouseEventKind::ScrollDown => Self::MouseScroll(WHEEL_ROWS),
            _ => Self::None,
        }
    }
}
