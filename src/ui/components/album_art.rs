//! Queue row thumbnails.

use std::collections::HashMap;

use image::{imageops::FilterType, DynamicImage};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol, StatefulImage};

use crate::art::ArtDisplay;

/// A decoded artwork, ready to draw.
pub struct Thumbnail {
    /// Terminal graphics protocol state, when the terminal supports one
    protocol: Option<StatefulProtocol>,

    /// Average color, drawn when graphics are unavailable
    swatch: Color,
}

/// Decoded artwork by confirmed URL.
pub struct ThumbnailStore {
    /// Image picker for terminal graphics
    picker: Option<Picker>,

    thumbnails: HashMap<String, Thumbnail>,
}

impl ThumbnailStore {
    /// Create a store, querying the terminal for graphics support when enabled.
    pub fn new(graphics: bool) -> Self {
        let picker = if graphics {
            Picker::from_query_stdio().ok()
        } else {
            None
        };

        Self {
            picker,
            thumbnails: HashMap::new(),
        }
    }

    pub fn insert(&mut self, url: String, image: DynamicImage) {
        let swatch = average_color(&image);
        let protocol = self
            .picker
            .as_ref()
            .map(|picker| picker.new_resize_protocol(image));

        self.thumbnails.insert(url, Thumbnail { protocol, swatch });
    }

    #[allow(dead_code)]
    pub fn contains(&self, url: &str) -> bool {
        self.thumbnails.contains_key(url)
    }
}

fn average_color(image: &DynamicImage) -> Color {
    let pixel = image.resize_exact(1, 1, FilterType::Triangle).to_rgb8();
    let [r, g, b] = pixel.get_pixel(0, 0).0;
    Color::Rgb(r, g, b)
}

/// Draw one thumbnail cell.
pub fn render_album_art(
    frame: &mut Frame,
    area: Rect,
    display: &ArtDisplay,
    store: &mut ThumbnailStore,
) {
    let thumbnail = match display {
        ArtDisplay::Image(url) => store.thumbnails.get_mut(url),
        ArtDisplay::Placeholder => None,
    };

    match thumbnail {
        Some(Thumbnail {
            protocol: Some(protocol),
            ..
        }) => {
            frame.render_stateful_widget(StatefulImage::default(), area, protocol);
        }
        Some(Thumbnail { swatch, .. }) => {
            frame.render_widget(Paragraph::new("").style(Style::default().bg(*swatch)), area);
        }
        None => {
            let placeholder =
                Paragraph::new(" ♪").style(Style::default().fg(Color::Gray).bg(Color::Black));
            frame.render_widget(placeholder, area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_insert_without_graphics_keeps_swatch() {
        let mut store = ThumbnailStore::new(false);
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([200, 10, 30])));

        store.insert(String::from("http://a/1.jpg"), image);

        assert!(store.contains("http://a/1.jpg"));
        let thumbnail = &store.thumbnails["http://a/1.jpg"];
        assert!(thumbnail.protocol.is_none());
        assert_eq!(thumbnail.swatch, Color::Rgb(200, 10, 30));
    }
}
