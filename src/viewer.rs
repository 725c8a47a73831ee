//! Full-screen, one-at-a-time stepping through a snapshot of the feed.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{MediaError, Result};
use crate::pexels::MediaItem;
use crate::video::{self, VideoSource};
use crate::zoom::ZoomState;

pub const DEFAULT_SWIPE_THRESHOLD: f32 = 100.0;

/// What the feed hands to navigation when a cell is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerRequest {
    pub items: Vec<MediaItem>,
    pub initial_index: usize,
}

/// Fire-and-forget warm-up of an image URL. Failures are the implementor's
/// to log; callers never wait on the result.
pub trait Prefetcher: Send + Sync {
    fn prefetch(&self, url: &str);
}

#[derive(Debug, Default)]
pub struct NoopPrefetcher;

impl Prefetcher for NoopPrefetcher {
    fn prefetch(&self, _url: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Up,
    Down,
}

impl Transition {
    pub fn between(from: usize, to: usize) -> Option<Self> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(Transition::Up),
            std::cmp::Ordering::Less => Some(Transition::Down),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    Moved {
        from: usize,
        to: usize,
        transition: Transition,
    },
    Closed,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub swipe_threshold: f32,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerFrame<'a> {
    pub item: &'a MediaItem,
    pub index: usize,
    pub len: usize,
    pub position_label: String,
    pub image_url: Option<&'a str>,
    pub video: Option<VideoSource>,
    pub is_active: bool,
    pub is_paused: bool,
    pub load_failed: bool,
    pub zoom: ZoomState,
    pub show_reset_zoom: bool,
}

pub struct ViewerController {
    items: Arc<[MediaItem]>,
    index: usize,
    previous_index: Option<usize>,
    paused: bool,
    load_failed: bool,
    zoom: ZoomState,
    closed: bool,
    swipe_threshold: f32,
    prefetcher: Arc<dyn Prefetcher>,
}

impl ViewerController {
    pub fn open(
        items: Vec<MediaItem>,
        initial_index: usize,
        options: ViewerOptions,
        prefetcher: Arc<dyn Prefetcher>,
    ) -> Result<Self> {
        if initial_index >= items.len() {
            return Err(MediaError::IndexOutOfRange {
                index: initial_index,
                len: items.len(),
            });
        }
        let swipe_threshold = if options.swipe_threshold.is_finite() && options.swipe_threshold > 0.0
        {
            options.swipe_threshold
        } else {
            DEFAULT_SWIPE_THRESHOLD
        };
        let viewer = Self {
            items: items.into(),
            index: initial_index,
            previous_index: None,
            paused: false,
            load_failed: false,
            zoom: ZoomState::default(),
            closed: false,
            swipe_threshold,
            prefetcher,
        };
        viewer.preload_neighbors();
        Ok(viewer)
    }

    pub fn from_request(
        request: ViewerRequest,
        options: ViewerOptions,
        prefetcher: Arc<dyn Prefetcher>,
    ) -> Result<Self> {
        Self::open(request.items, request.initial_index, options, prefetcher)
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.previous_index
    }

    pub fn current(&self) -> &MediaItem {
        &self.items[self.index]
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn can_go_next(&self) -> bool {
        self.index + 1 < self.items.len()
    }

    pub fn can_go_previous(&self) -> bool {
        self.index > 0
    }

    pub fn position_label(&self) -> String {
        format!("{} / {}", self.index + 1, self.items.len())
    }

    /// Swiping back past the first item closes; forward past the last does
    /// nothing.
    pub fn advance(&mut self, direction: Direction) -> ViewerAction {
        if self.closed {
            return ViewerAction::Unchanged;
        }
        match direction {
            Direction::Next if self.can_go_next() => self.move_to(self.index + 1),
            Direction::Next => ViewerAction::Unchanged,
            Direction::Previous if self.can_go_previous() => self.move_to(self.index - 1),
            Direction::Previous => self.close(),
        }
    }

    /// Button navigation: never closes.
    pub fn go_to_next(&mut self) -> ViewerAction {
        if self.closed || !self.can_go_next() {
            return ViewerAction::Unchanged;
        }
        self.move_to(self.index + 1)
    }

    pub fn go_to_previous(&mut self) -> ViewerAction {
        if self.closed || !self.can_go_previous() {
            return ViewerAction::Unchanged;
        }
        self.move_to(self.index - 1)
    }

    /// Net vertical displacement at gesture release, screen coordinates
    /// (negative is up).
    pub fn on_vertical_swipe(&mut self, net_dy: f32) -> ViewerAction {
        if !net_dy.is_finite() {
            return ViewerAction::Unchanged;
        }
        if net_dy < -self.swipe_threshold {
            self.advance(Direction::Next)
        } else if net_dy > self.swipe_threshold {
            self.advance(Direction::Previous)
        } else {
            ViewerAction::Unchanged
        }
    }

    pub fn close(&mut self) -> ViewerAction {
        if self.closed {
            return ViewerAction::Unchanged;
        }
        self.closed = true;
        debug!(index = self.index, "viewer closed");
        ViewerAction::Closed
    }

    fn move_to(&mut self, to: usize) -> ViewerAction {
        let from = self.index;
        let Some(transition) = Transition::between(from, to) else {
            return ViewerAction::Unchanged;
        };
        self.previous_index = Some(from);
        self.index = to;
        self.paused = false;
        self.load_failed = false;
        self.zoom.reset();
        self.preload_neighbors();
        ViewerAction::Moved {
            from,
            to,
            transition,
        }
    }

    /// Prefetch the preview image of each existing neighbor. Returns the URLs
    /// requested.
    pub fn preload_neighbors(&self) -> Vec<String> {
        let mut neighbors = Vec::with_capacity(2);
        if self.index > 0 {
            neighbors.push(&self.items[self.index - 1]);
        }
        if let Some(next) = self.items.get(self.index + 1) {
            neighbors.push(next);
        }

        let mut requested = Vec::new();
        for item in neighbors {
            if let Some(url) = item.preview_image_url() {
                self.prefetcher.prefetch(url);
                requested.push(url.to_string());
            }
        }
        requested
    }

    /// Double tap on a video flips pause; photos ignore it.
    pub fn toggle_active_pause(&mut self) -> bool {
        if self.current().is_video() {
            self.paused = !self.paused;
        }
        self.paused
    }

    pub fn on_media_loaded(&mut self) {
        self.load_failed = false;
        if self.current().is_video() {
            self.paused = false;
        }
    }

    pub fn on_media_error(&mut self, reason: &str) {
        warn!(id = self.current().id(), reason, "media failed to load");
        self.load_failed = true;
    }

    pub fn end_pinch(&mut self, factor: f32) {
        if !self.current().is_video() {
            self.zoom.end_pinch(factor);
        }
    }

    pub fn end_pan(&mut self, dx: f32, dy: f32) {
        if !self.current().is_video() {
            self.zoom.end_pan(dx, dy);
        }
    }

    pub fn reset_zoom(&mut self) {
        self.zoom.reset();
    }

    pub fn frame(&self) -> ViewerFrame<'_> {
        let item = self.current();
        ViewerFrame {
            item,
            index: self.index,
            len: self.items.len(),
            position_label: self.position_label(),
            image_url: item.preview_image_url(),
            video: video::playable_source(item),
            is_active: !self.closed,
            is_paused: self.paused,
            load_failed: self.load_failed,
            zoom: self.zoom,
            show_reset_zoom: self.zoom.is_zoomed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{mock_photo, mock_video};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingPrefetcher {
        urls: Mutex<Vec<String>>,
    }

    impl Prefetcher for RecordingPrefetcher {
        fn prefetch(&self, url: &str) {
            self.urls.lock().push(url.to_string());
        }
    }

    fn items() -> Vec<MediaItem> {
        vec![mock_photo(1, "a"), mock_video(2, "b"), mock_photo(3, "c")]
    }

    fn open_at(index: usize) -> (ViewerController, Arc<RecordingPrefetcher>) {
        let prefetcher = Arc::new(RecordingPrefetcher::default());
        let viewer =
            ViewerController::open(items(), index, ViewerOptions::default(), prefetcher.clone())
                .unwrap();
        (viewer, prefetcher)
    }

    #[test]
    fn open_rejects_out_of_range_index() {
        let prefetcher = Arc::new(RecordingPrefetcher::default());
        let err = ViewerController::open(items(), 3, ViewerOptions::default(), prefetcher.clone())
            .err()
            .unwrap();
        assert!(matches!(err, MediaError::IndexOutOfRange { index: 3, len: 3 }));
        assert!(prefetcher.urls.lock().is_empty());

        let empty = ViewerController::open(Vec::new(), 0, ViewerOptions::default(), prefetcher);
        assert!(empty.is_err());
    }

    #[test]
    fn previous_at_start_closes() {
        let (mut viewer, _) = open_at(0);
        assert_eq!(viewer.advance(Direction::Previous), ViewerAction::Closed);
        assert!(viewer.is_closed());
        assert_eq!(viewer.index(), 0);
        assert_eq!(viewer.advance(Direction::Next), ViewerAction::Unchanged);
    }

    #[test]
    fn next_at_end_is_a_no_op() {
        let (mut viewer, _) = open_at(2);
        assert_eq!(viewer.advance(Direction::Next), ViewerAction::Unchanged);
        assert_eq!(viewer.index(), 2);
        assert!(!viewer.is_closed());
    }

    #[test]
    fn moves_report_direction_from_indices() {
        let (mut viewer, _) = open_at(1);
        assert_eq!(
            viewer.advance(Direction::Next),
            ViewerAction::Moved {
                from: 1,
                to: 2,
                transition: Transition::Up
            }
        );
        assert_eq!(viewer.previous_index(), Some(1));
        assert_eq!(
            viewer.advance(Direction::Previous),
            ViewerAction::Moved {
                from: 2,
                to: 1,
                transition: Transition::Down
            }
        );
    }

    #[test]
    fn swipe_maps_to_actions_past_threshold() {
        let (mut viewer, _) = open_at(1);
        assert_eq!(viewer.on_vertical_swipe(-50.0), ViewerAction::Unchanged);
        assert_eq!(viewer.on_vertical_swipe(100.0), ViewerAction::Unchanged);
        assert!(matches!(
            viewer.on_vertical_swipe(-150.0),
            ViewerAction::Moved { to: 2, .. }
        ));
        assert!(matches!(
            viewer.on_vertical_swipe(180.0),
            ViewerAction::Moved { to: 1, .. }
        ));
        viewer.on_vertical_swipe(120.0);
        assert_eq!(viewer.index(), 0);
        assert_eq!(viewer.on_vertical_swipe(120.0), ViewerAction::Closed);
    }

    #[test]
    fn buttons_never_close() {
        let (mut viewer, _) = open_at(0);
        assert!(!viewer.can_go_previous());
        assert_eq!(viewer.go_to_previous(), ViewerAction::Unchanged);
        assert!(!viewer.is_closed());
        viewer.go_to_next();
        viewer.go_to_next();
        assert!(!viewer.can_go_next());
        assert_eq!(viewer.go_to_next(), ViewerAction::Unchanged);
        assert_eq!(viewer.position_label(), "3 / 3");
    }

    #[test]
    fn preloads_both_neighbors() {
        let (mut viewer, prefetcher) = open_at(1);
        assert_eq!(
            *prefetcher.urls.lock(),
            vec![
                "https://images.example.com/photos/1/large2x.jpg".to_string(),
                "https://images.example.com/photos/3/large2x.jpg".to_string(),
            ]
        );

        prefetcher.urls.lock().clear();
        viewer.advance(Direction::Next);
        assert_eq!(
            *prefetcher.urls.lock(),
            vec!["https://videos.example.com/2/picture-0.jpg".to_string()]
        );
    }

    #[test]
    fn video_neighbor_without_pictures_is_skipped() {
        let mut bare = mock_video(8, "bare");
        if let MediaItem::Video(video) = &mut bare {
            video.video_pictures.clear();
        }
        let prefetcher = Arc::new(RecordingPrefetcher::default());
        let viewer = ViewerController::open(
            vec![mock_photo(1, "a"), bare],
            0,
            ViewerOptions::default(),
            prefetcher.clone(),
        )
        .unwrap();
        assert!(viewer.preload_neighbors().is_empty());
        assert!(prefetcher.urls.lock().is_empty());
    }

    #[test]
    fn pause_only_applies_to_videos() {
        let (mut viewer, _) = open_at(0);
        assert!(!viewer.toggle_active_pause());

        viewer.advance(Direction::Next);
        assert!(viewer.toggle_active_pause());
        assert!(viewer.frame().is_paused);
        viewer.on_media_loaded();
        assert!(!viewer.is_paused());

        viewer.toggle_active_pause();
        viewer.advance(Direction::Next);
        assert!(!viewer.is_paused());
    }

    #[test]
    fn zoom_resets_when_cursor_moves() {
        let (mut viewer, _) = open_at(0);
        viewer.end_pinch(2.0);
        viewer.end_pan(12.0, 3.0);
        assert!(viewer.frame().show_reset_zoom);

        viewer.advance(Direction::Next);
        assert_eq!(viewer.zoom(), ZoomState::default());
        viewer.end_pinch(3.0);
        assert_eq!(viewer.zoom(), ZoomState::default());
    }

    #[test]
    fn frame_uses_best_video_source() {
        let (viewer, _) = open_at(1);
        let frame = viewer.frame();
        assert_eq!(frame.position_label, "2 / 3");
        assert_eq!(
            frame.video.map(|source| source.playback_url),
            Some("https://videos.example.com/2/hd.mp4".to_string())
        );
    }

    #[test]
    fn media_errors_stay_on_the_current_frame() {
        let (mut viewer, _) = open_at(0);
        viewer.on_media_error("decode failed");
        assert!(viewer.frame().load_failed);
        viewer.advance(Direction::Next);
        assert!(!viewer.frame().load_failed);
    }
}
