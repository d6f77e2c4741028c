//! Play queue component.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::album_art::{render_album_art, ThumbnailStore};
use crate::app::ArtRow;
use crate::art::{ArtProps, LineSpan, ResolvedUrlCache, DEFAULT_PARENT_TYPE};
use crate::device::QueueItem;

/// Lines taken by one queue row.
pub const ROW_HEIGHT: usize = 2;

/// Columns taken by a row's thumbnail (roughly square at 2 lines).
const THUMB_WIDTH: u16 = 4;

/// Queue state.
#[derive(Debug, Default)]
pub struct QueueState {
    /// Items in the queue
    pub items: Vec<QueueItem>,

    /// Position the device was last told to play
    pub current_index: Option<usize>,

    /// Selected row
    pub selected: Option<usize>,

    /// First row on screen
    pub offset: usize,

    /// Lines available for rows, as of the last render
    pub page_height: usize,
}

impl QueueState {
    pub fn new(page_height: usize) -> Self {
        Self {
            page_height,
            ..Default::default()
        }
    }

    /// Replace the whole queue, keeping the selection in range.
    pub fn set_items(&mut self, items: Vec<QueueItem>) {
        self.items = items;
        if self.items.is_empty() {
            self.selected = None;
            self.current_index = None;
        } else {
            let last = self.items.len() - 1;
            self.selected = Some(self.selected.unwrap_or(0).min(last));
            self.current_index = self.current_index.filter(|&i| i <= last);
        }
        self.ensure_selected_visible();
    }

    /// Remove an item from the queue.
    pub fn remove(&mut self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        self.items.remove(index);

        if let Some(current) = self.current_index {
            if index < current {
                self.current_index = Some(current - 1);
            } else if index == current {
                self.current_index = None;
            }
        }

        if self.items.is_empty() {
            self.selected = None;
        } else if let Some(selected) = self.selected {
            if selected >= self.items.len() {
                self.selected = Some(self.items.len() - 1);
            }
        }
        self.ensure_selected_visible();
    }

    /// Remove the currently selected item.
    /// Returns true if an item was removed.
    pub fn remove_selected(&mut self) -> bool {
        if let Some(index) = self.selected {
            self.remove(index);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inputs of the album art shown on a row.
    ///
    /// The service logo only stands in when the track has no artwork.
    pub fn art_props(&self, index: usize) -> ArtProps {
        let Some(item) = self.items.get(index) else {
            return ArtProps::default();
        };

        ArtProps {
            src: item.album_art_uri.clone(),
            service_id: item
                .service_id
                .clone()
                .filter(|_| item.album_art_uri.is_none()),
            parent_type: String::from(DEFAULT_PARENT_TYPE),
        }
    }

    /// Lines a row occupies in the list's content space.
    pub fn row_span(&self, index: usize) -> LineSpan {
        LineSpan::new(index * ROW_HEIGHT, ROW_HEIGHT)
    }

    /// Lines currently on screen.
    pub fn viewport(&self) -> LineSpan {
        LineSpan::new(self.offset * ROW_HEIGHT, self.page_height)
    }

    fn rows_per_page(&self) -> usize {
        (self.page_height / ROW_HEIGHT).max(1)
    }

    /// Move selection up.
    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
        self.ensure_selected_visible();
    }

    /// Move selection down.
    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.selected = Some(i);
        self.ensure_selected_visible();
    }

    /// Jump to the top of the queue.
    pub fn jump_to_top(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
            self.ensure_selected_visible();
        }
    }

    /// Jump to the bottom of the queue.
    pub fn jump_to_bottom(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
            self.ensure_selected_visible();
        }
    }

    /// Scroll half a page down.
    pub fn scroll_half_page_down(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let half_page = (self.rows_per_page() / 2).max(1);
        let current = self.selected.unwrap_or(0);
        self.selected = Some((current + half_page).min(self.items.len() - 1));
        self.ensure_selected_visible();
    }

    /// Scroll half a page up.
    pub fn scroll_half_page_up(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let half_page = (self.rows_per_page() / 2).max(1);
        let current = self.selected.unwrap_or(0);
        self.selected = Some(current.saturating_sub(half_page));
        self.ensure_selected_visible();
    }

    /// Scroll the view without moving the selection (mouse wheel).
    pub fn scroll_by(&mut self, rows: isize) {
        let max_offset = self.items.len().saturating_sub(self.rows_per_page());
        self.offset = self
            .offset
            .saturating_add_signed(rows)
            .min(max_offset);
    }

    /// Adjust the offset so the selected row is fully on screen.
    pub fn ensure_selected_visible(&mut self) {
        let Some(selected) = self.selected else {
            self.offset = 0;
            return;
        };

        let rows = self.rows_per_page();
        if selected < self.offset {
            self.offset = selected;
        } else if selected >= self.offset + rows {
            self.offset = selected + 1 - rows;
        }
    }
}

/// Render the queue panel.
pub fn render_queue(
    frame: &mut Frame,
    area: Rect,
    state: &mut QueueState,
    rows: &[ArtRow],
    cache: &ResolvedUrlCache,
    thumbnails: &mut ThumbnailStore,
) {
    let title = format!("Queue ({})", state.items.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    state.page_height = inner.height as usize;

    if state.is_empty() {
        let empty = Paragraph::new("Queue is empty").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let mut y = inner.y;
    let bottom = inner.y + inner.height;
    for (index, item) in state.items.iter().enumerate().skip(state.offset) {
        if y >= bottom {
            break;
        }
        let height = (ROW_HEIGHT as u16).min(bottom - y);
        let row_area = Rect::new(inner.x, y, inner.width, height);
        y += height;

        let is_selected = state.selected == Some(index);
        let is_current = state.current_index == Some(index);
        render_queue_item(frame, row_area, item, is_selected, is_current);

        if let Some(row) = rows.get(index) {
            let thumb_area = Rect::new(row_area.x, row_area.y, THUMB_WIDTH.min(row_area.width), height);
            render_album_art(frame, thumb_area, &row.art.display(cache), thumbnails);
        }
    }
}

/// Render the text part of one queue row.
fn render_queue_item(
    frame: &mut Frame,
    area: Rect,
    item: &QueueItem,
    is_selected: bool,
    is_current: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(THUMB_WIDTH + 1), Constraint::Min(1)])
        .split(area);

    let title_style = if is_current {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let prefix = if is_current { "▶ " } else { "" };

    let mut lines = vec![Line::from(vec![
        Span::styled(prefix, title_style),
        Span::styled(item.title.as_str(), title_style),
    ])];
    let mut creator = vec![Span::styled(
        item.display_creator(),
        Style::default().fg(Color::Cyan),
    )];
    if let Some(album) = &item.album {
        creator.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        creator.push(Span::styled(album.as_str(), Style::default().fg(Color::Yellow)));
    }
    lines.push(Line::from(creator));

    let mut paragraph = Paragraph::new(lines);
    if is_selected {
        paragraph = paragraph.style(Style::default().bg(Color::DarkGray));
    }
    frame.render_widget(paragraph, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art::SourceDescriptor;

    fn item(title: &str) -> QueueItem {
        QueueItem {
            title: title.to_string(),
            creator: None,
            album: None,
            album_art_uri: Some(SourceDescriptor::from(format!("http://a/{title}.jpg").as_str())),
            service_id: None,
        }
    }

    fn queue(len: usize, page_height: usize) -> QueueState {
        let mut state = QueueState::new(page_height);
        state.set_items((0..len).map(|i| item(&i.to_string())).collect());
        state
    }

    #[test]
    fn test_selection_keeps_row_on_screen() {
        let mut state = queue(20, 6);
        assert_eq!(state.selected, Some(0));

        for _ in 0..5 {
            state.select_next();
        }
        assert_eq!(state.selected, Some(5));
        assert_eq!(state.offset, 3);
        assert_eq!(state.viewport(), LineSpan::new(6, 6));

        state.jump_to_top();
        assert_eq!(state.offset, 0);

        state.select_previous();
        assert_eq!(state.selected, Some(19));
        assert_eq!(state.offset, 17);
    }

    #[test]
    fn test_scroll_by_is_clamped() {
        let mut state = queue(10, 4);
        state.scroll_by(-3);
        assert_eq!(state.offset, 0);
        state.scroll_by(100);
        assert_eq!(state.offset, 8);
    }

    #[test]
    fn test_remove_adjusts_indices() {
        let mut state = queue(3, 10);
        state.current_index = Some(2);
        state.selected = Some(2);

        state.remove(0);
        assert_eq!(state.current_index, Some(1));
        assert_eq!(state.selected, Some(1));

        assert!(state.remove_selected());
        assert_eq!(state.current_index, None);
        assert_eq!(state.selected, Some(0));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_art_props_prefer_track_art_over_logo() {
        let mut state = QueueState::new(10);
        let mut with_art = item("a");
        with_art.service_id = Some(String::from("9"));
        let mut radio = item("radio");
        radio.album_art_uri = None;
        radio.service_id = Some(String::from("254"));
        state.set_items(vec![with_art, radio]);

        assert_eq!(state.art_props(0).service_id, None);
        assert_eq!(
            state.art_props(0).src,
            Some(SourceDescriptor::from("http://a/a.jpg"))
        );
        assert_eq!(state.art_props(1).service_id.as_deref(), Some("254"));
        assert_eq!(state.art_props(7), ArtProps::default());
    }

    #[test]
    fn test_row_span() {
        let state = queue(3, 10);
        assert_eq!(state.row_span(2), LineSpan::new(4, 2));
    }
}
