//! Paginated feed state and the grid's preview policy.
//!
//! Loads are single-flight. [`FeedController::begin_load`] hands out a
//! [`LoadTicket`]; only the result carrying the in-flight ticket is applied by
//! [`FeedController::complete_load`], anything else is dropped.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::data::MediaSource;
use crate::error::{MediaError, Result};
use crate::pexels::{MediaItem, MediaPage};
use crate::preview::{PreviewRotation, DEFAULT_ROTATION_INTERVAL};
use crate::video::{self, VideoSource};
use crate::viewer::ViewerRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    request_id: u64,
    page: u32,
}

impl LoadTicket {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Exhausted,
    Unmounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied {
        page: u32,
        received: usize,
        added: usize,
    },
    Skipped(SkipReason),
    /// Result arrived for a ticket that is no longer in flight.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub rotation_interval: Duration,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CellHint<'a> {
    pub item: &'a MediaItem,
    pub thumbnail_url: Option<&'a str>,
    pub preview_source: Option<VideoSource>,
    pub should_preview_play: bool,
}

pub struct FeedController {
    source: Arc<dyn MediaSource>,
    items: Vec<MediaItem>,
    known_ids: HashSet<u64>,
    video_ids: HashSet<u64>,
    page: u32,
    loaded_any: bool,
    has_more: bool,
    in_flight: Option<LoadTicket>,
    next_request_id: u64,
    rotation: PreviewRotation,
    mounted: bool,
}

impl FeedController {
    pub fn new(source: Arc<dyn MediaSource>, options: FeedOptions) -> Self {
        Self {
            source,
            items: Vec::new(),
            known_ids: HashSet::new(),
            video_ids: HashSet::new(),
            page: 1,
            loaded_any: false,
            has_more: true,
            in_flight: None,
            next_request_id: 1,
            rotation: PreviewRotation::new(options.rotation_interval),
            mounted: true,
        }
    }

    pub fn source(&self) -> Arc<dyn MediaSource> {
        self.source.clone()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Last page applied; 1 before anything has loaded.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<LoadTicket> {
        self.in_flight
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn next_page(&self) -> u32 {
        if self.loaded_any {
            self.page.saturating_add(1)
        } else {
            1
        }
    }

    pub fn begin_load(&mut self, page: u32) -> std::result::Result<LoadTicket, SkipReason> {
        if !self.mounted {
            return Err(SkipReason::Unmounted);
        }
        if self.in_flight.is_some() {
            return Err(SkipReason::InFlight);
        }
        let ticket = LoadTicket {
            request_id: self.next_request_id,
            page: page.max(1),
        };
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.in_flight = Some(ticket);
        debug!(page = ticket.page, request_id = ticket.request_id, "feed load started");
        Ok(ticket)
    }

    pub fn begin_load_more(&mut self) -> std::result::Result<LoadTicket, SkipReason> {
        if self.mounted && self.in_flight.is_none() && !self.has_more {
            return Err(SkipReason::Exhausted);
        }
        self.begin_load(self.next_page())
    }

    pub fn begin_refresh(&mut self) -> std::result::Result<LoadTicket, SkipReason> {
        self.begin_load(1)
    }

    /// Apply a fetch result. Errors leave items, cursor and `has_more` as they
    /// were and are returned to the caller.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<MediaPage>,
    ) -> Result<LoadOutcome> {
        if !self.mounted || self.in_flight != Some(ticket) {
            debug!(
                page = ticket.page,
                request_id = ticket.request_id,
                "discarding stale feed response"
            );
            return Ok(LoadOutcome::Discarded);
        }
        self.in_flight = None;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(page = ticket.page, %err, "failed to load media page");
                return Err(err);
            }
        };

        let received = page.media.len();
        let added = if ticket.page == 1 {
            self.replace(page.media)
        } else {
            self.append(page.media)
        };
        self.page = ticket.page;
        self.loaded_any = true;
        self.has_more = received > 0;
        info!(
            page = ticket.page,
            received,
            added,
            total = self.items.len(),
            has_more = self.has_more,
            "media page applied"
        );
        Ok(LoadOutcome::Applied {
            page: ticket.page,
            received,
            added,
        })
    }

    pub fn load_page(&mut self, page: u32) -> Result<LoadOutcome> {
        match self.begin_load(page) {
            Ok(ticket) => self.run(ticket),
            Err(reason) => Ok(LoadOutcome::Skipped(reason)),
        }
    }

    /// No-op while loading or once a page came back empty.
    pub fn load_more(&mut self) -> Result<LoadOutcome> {
        match self.begin_load_more() {
            Ok(ticket) => self.run(ticket),
            Err(reason) => Ok(LoadOutcome::Skipped(reason)),
        }
    }

    pub fn refresh(&mut self) -> Result<LoadOutcome> {
        match self.begin_refresh() {
            Ok(ticket) => self.run(ticket),
            Err(reason) => Ok(LoadOutcome::Skipped(reason)),
        }
    }

    fn run(&mut self, ticket: LoadTicket) -> Result<LoadOutcome> {
        let result = self.source.fetch_page(ticket.page);
        self.complete_load(ticket, result)
    }

    fn replace(&mut self, media: Vec<MediaItem>) -> usize {
        self.items.clear();
        self.known_ids.clear();
        self.video_ids.clear();
        self.rotation.clear();
        self.append(media)
    }

    // Ids already in the feed are skipped so every cell has a unique key.
    fn append(&mut self, media: Vec<MediaItem>) -> usize {
        let mut added = 0;
        for item in media {
            let id = item.id();
            if !self.known_ids.insert(id) {
                debug!(id, "skipping duplicate media id");
                continue;
            }
            if item.is_video() {
                self.video_ids.insert(id);
            }
            self.items.push(item);
            added += 1;
        }
        added
    }

    /// Feed the ids of every visible cell. Only videos compete for preview.
    pub fn on_visibility_set_changed<I>(&mut self, ids: I, now: Instant) -> bool
    where
        I: IntoIterator<Item = u64>,
    {
        if !self.mounted {
            return false;
        }
        let videos: Vec<u64> = ids
            .into_iter()
            .filter(|id| self.video_ids.contains(id))
            .collect();
        self.rotation.set_visible(videos, now)
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.mounted && self.rotation.tick(now)
    }

    pub fn next_rotation(&self) -> Option<Instant> {
        self.rotation.next_deadline()
    }

    pub fn active_preview(&self) -> Option<u64> {
        self.rotation.active()
    }

    pub fn should_preview_play(&self, item: &MediaItem) -> bool {
        item.is_video() && self.rotation.is_active(item.id())
    }

    pub fn cells(&self) -> Vec<CellHint<'_>> {
        self.items
            .iter()
            .map(|item| CellHint {
                item,
                thumbnail_url: item.thumbnail_url(),
                preview_source: video::playable_source(item),
                should_preview_play: self.should_preview_play(item),
            })
            .collect()
    }

    /// Snapshot of the current list for the full-screen viewer.
    pub fn open_viewer(&self, index: usize) -> Result<ViewerRequest> {
        if index >= self.items.len() {
            return Err(MediaError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(ViewerRequest {
            items: self.items.clone(),
            initial_index: index,
        })
    }

    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Stop the rotation and invalidate any in-flight load.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.in_flight = None;
        self.rotation.clear();
    }
}
