//! Viewport intersection tracking for list rows.

use std::collections::HashMap;

/// Fraction of a row that must be on screen for it to count as visible.
pub const MIN_VISIBLE_RATIO: f32 = 0.5;

/// A range of lines in a scrolling container's content space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineSpan {
    pub start: usize,
    pub len: usize,
}

impl LineSpan {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Fraction of `self` that lies inside `viewport`.
    pub fn visible_ratio(&self, viewport: &LineSpan) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        let start = self.start.max(viewport.start);
        let end = self.end().min(viewport.end());
        end.saturating_sub(start) as f32 / self.len as f32
    }
}

/// Visible windows of the scrolling containers, by name.
///
/// The renderer records these every frame.
#[derive(Debug, Default, Clone)]
pub struct Viewports {
    windows: HashMap<String, LineSpan>,
}

impl Viewports {
    pub fn set(&mut self, name: impl Into<String>, window: LineSpan) {
        self.windows.insert(name.into(), window);
    }

    pub fn get(&self, name: &str) -> Option<&LineSpan> {
        self.windows.get(name)
    }
}

/// Handle for one observed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

#[derive(Debug)]
enum Observation {
    Tracked {
        boundary: String,
        threshold: f32,
        visible: bool,
    },
    /// No boundary to measure against; the row is treated as always on screen
    AlwaysVisible,
}

/// Reports when rows cross the visibility threshold of their container.
#[derive(Debug, Default)]
pub struct VisibilityObserver {
    next_id: u64,
    observations: HashMap<ObserverHandle, Observation>,
}

impl VisibilityObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing a row. Returns the handle and the initial visibility.
    ///
    /// A boundary that isn't registered yet degrades to always visible.
    pub fn observe(
        &mut self,
        boundary: &str,
        threshold: f32,
        node: LineSpan,
        viewports: &Viewports,
    ) -> (ObserverHandle, bool) {
        let handle = ObserverHandle(self.next_id);
        self.next_id += 1;

        let (observation, visible) = match viewports.get(boundary) {
            Some(window) => {
                let visible = node.visible_ratio(window) >= threshold;
                (
                    Observation::Tracked {
                        boundary: boundary.to_string(),
                        threshold,
                        visible,
                    },
                    visible,
                )
            }
            None => {
                tracing::debug!(
                    "No viewport named {:?}, treating row as visible",
                    boundary
                );
                (Observation::AlwaysVisible, true)
            }
        };

        self.observations.insert(handle, observation);
        (handle, visible)
    }

    /// Re-measure a row. Returns the new visibility only when it crossed the threshold.
    pub fn update(
        &mut self,
        handle: ObserverHandle,
        node: LineSpan,
        viewports: &Viewports,
    ) -> Option<bool> {
        let Observation::Tracked {
            boundary,
            threshold,
            visible,
        } = self.observations.get_mut(&handle)?
        else {
            return None;
        };

        let now_visible = viewports
            .get(boundary)
            .is_some_and(|window| node.visible_ratio(window) >= *threshold);

        if now_visible == *visible {
            return None;
        }
        *visible = now_visible;
        Some(now_visible)
    }

    /// Stop observing. Safe to call more than once.
    pub fn unobserve(&mut self, handle: ObserverHandle) {
        self.observations.remove(&handle);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.observations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewports(start: usize, len: usize) -> Viewports {
        let mut viewports = Viewports::default();
        viewports.set("queue", LineSpan::new(start, len));
        viewports
    }

    #[test]
    fn test_visible_ratio() {
        let window = LineSpan::new(10, 10);
        assert_eq!(LineSpan::new(12, 2).visible_ratio(&window), 1.0);
        assert_eq!(LineSpan::new(19, 2).visible_ratio(&window), 0.5);
        assert_eq!(LineSpan::new(9, 4).visible_ratio(&window), 0.75);
        assert_eq!(LineSpan::new(20, 2).visible_ratio(&window), 0.0);
        assert_eq!(LineSpan::new(0, 0).visible_ratio(&window), 0.0);
    }

    #[test]
    fn test_reports_only_crossings() {
        let mut observer = VisibilityObserver::new();
        let row = LineSpan::new(8, 2);

        let (handle, visible) = observer.observe("queue", MIN_VISIBLE_RATIO, row, &viewports(0, 10));
        assert!(visible);

        // Half the row still on screen
        assert_eq!(observer.update(handle, row, &viewports(9, 10)), None);
        // Scrolled away
        assert_eq!(observer.update(handle, row, &viewports(10, 10)), Some(false));
        assert_eq!(observer.update(handle, row, &viewports(20, 10)), None);
        // And back
        assert_eq!(observer.update(handle, row, &viewports(0, 10)), Some(true));
    }

    #[test]
    fn test_missing_boundary_degrades_to_visible() {
        let mut observer = VisibilityObserver::new();
        let (handle, visible) = observer.observe(
            "sidebar",
            MIN_VISIBLE_RATIO,
            LineSpan::new(500, 2),
            &viewports(0, 10),
        );

        assert!(visible);
        assert_eq!(observer.update(handle, LineSpan::new(500, 2), &viewports(0, 10)), None);
    }

    #[test]
    fn test_boundary_going_away_hides_rows() {
        let mut observer = VisibilityObserver::new();
        let row = LineSpan::new(0, 2);
        let (handle, _) = observer.observe("queue", MIN_VISIBLE_RATIO, row, &viewports(0, 10));

        assert_eq!(observer.update(handle, row, &Viewports::default()), Some(false));
    }

    #[test]
    fn test_unobserve_is_idempotent_and_silences() {
        let mut observer = VisibilityObserver::new();
        let row = LineSpan::new(0, 2);
        let (handle, _) = observer.observe("queue", MIN_VISIBLE_RATIO, row, &viewports(0, 10));

        observer.unobserve(handle);
        observer.unobserve(handle);

        assert_eq!(observer.len(), 0);
        assert_eq!(observer.update(handle, row, &viewports(50, 10)), None);
    }
}
