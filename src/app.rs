use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{info, warn};

use crate::config;
use crate::data::{self, MediaSource};
use crate::feed::{FeedController, FeedOptions, LoadOutcome, LoadTicket};
use crate::pexels::{self, MediaKind, MediaPage};
use crate::prefetch;
use crate::viewer::{NoopPrefetcher, Prefetcher, ViewerController, ViewerOptions};

/// Cells a freshly mounted grid renders before any scrolling.
const INITIAL_VISIBLE: usize = 12;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pages: u32,
    pub offline: bool,
    pub open: Option<usize>,
    pub config_file: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pages: 1,
            offline: false,
            open: None,
            config_file: None,
        }
    }
}

struct PageResponse {
    ticket: LoadTicket,
    result: crate::error::Result<MediaPage>,
}

pub fn run(options: RunOptions) -> Result<()> {
    let cfg = config::load(config::LoadOptions {
        config_file: options.config_file.clone(),
        env_prefix: None,
    })
    .context("load config")?;

    let online = !options.offline && cfg.pexels.has_credentials();
    let source: Arc<dyn MediaSource> = if online {
        let client = pexels::Client::new(cfg.pexels.client_config()).context("create pexels client")?;
        Arc::new(data::PexelsMediaSource::new(Arc::new(client)))
    } else {
        if !options.offline {
            warn!("no pexels credentials configured; using the offline sample collection");
        }
        Arc::new(data::MockMediaSource::default())
    };

    let mut feed = FeedController::new(
        source,
        FeedOptions {
            rotation_interval: cfg.feed.rotation_interval,
        },
    );

    let wait = cfg.pexels.timeout + Duration::from_secs(5);
    let (tx, rx) = unbounded::<PageResponse>();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for _ in 0..options.pages.max(1) {
        let ticket = match feed.begin_load_more() {
            Ok(ticket) => ticket,
            Err(reason) => {
                info!(?reason, "no further pages requested");
                break;
            }
        };
        spawn_load(feed.source(), ticket, tx.clone());
        match await_page(&mut feed, &rx, wait) {
            Ok(LoadOutcome::Applied { received: 0, .. }) => break,
            Ok(_) => {}
            Err(err) => {
                writeln!(out, "Failed to load media: {err}")?;
                break;
            }
        }
    }

    let visible: Vec<u64> = feed
        .items()
        .iter()
        .take(INITIAL_VISIBLE)
        .map(|item| item.id())
        .collect();
    feed.on_visibility_set_changed(visible, Instant::now());

    writeln!(
        out,
        "{} items across {} page(s){}",
        feed.len(),
        feed.page(),
        if feed.has_more() { "" } else { " (end of collection)" }
    )?;
    for (index, cell) in feed.cells().iter().enumerate() {
        let kind = match cell.item.kind() {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        };
        let marker = if cell.should_preview_play { ">" } else { " " };
        let (width, height) = cell.item.dimensions();
        let source = cell
            .preview_source
            .as_ref()
            .map(|source| format!("  [{}]", source.label()))
            .unwrap_or_default();
        writeln!(
            out,
            "{marker}{index:>4}  {kind}  #{id}  {width}x{height}  {by}  {thumb}{source}",
            id = cell.item.id(),
            by = cell.item.attribution().name,
            thumb = cell.thumbnail_url.unwrap_or("-"),
        )?;
    }

    if let Some(index) = options.open {
        let request = feed.open_viewer(index)?;
        let manager = if online {
            Some(Arc::new(
                prefetch::Manager::new(prefetch::Config {
                    workers: cfg.prefetch.workers,
                    capacity: cfg.prefetch.capacity,
                    ..prefetch::Config::default()
                })
                .context("start prefetcher")?,
            ))
        } else {
            None
        };
        let prefetcher: Arc<dyn Prefetcher> = match &manager {
            Some(manager) => manager.clone(),
            None => Arc::new(NoopPrefetcher),
        };
        let viewer = ViewerController::from_request(
            request,
            ViewerOptions {
                swipe_threshold: cfg.viewer.swipe_threshold,
            },
            prefetcher,
        )?;
        let frame = viewer.frame();
        writeln!(
            out,
            "viewer {}  #{}  {}  {}",
            frame.position_label,
            frame.item.id(),
            frame
                .video
                .as_ref()
                .map(|source| source.playback_url.as_str())
                .or(frame.image_url)
                .unwrap_or("no playable source"),
            frame.item.page_url(),
        )?;
        drop(viewer);

        // Neighbor downloads still running must not hold the process open.
        if let Some(manager) = manager.and_then(|manager| Arc::try_unwrap(manager).ok()) {
            manager.detach();
        }
    }

    feed.unmount();
    Ok(())
}

fn spawn_load(source: Arc<dyn MediaSource>, ticket: LoadTicket, tx: Sender<PageResponse>) {
    thread::spawn(move || {
        let result = source.fetch_page(ticket.page());
        let _ = tx.send(PageResponse { ticket, result });
    });
}

fn await_page(
    feed: &mut FeedController,
    rx: &Receiver<PageResponse>,
    wait: Duration,
) -> Result<LoadOutcome> {
    let deadline = Instant::now() + wait;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Ok(response) = rx.recv_timeout(remaining) else {
            bail!("timed out waiting for page");
        };
        match feed.complete_load(response.ticket, response.result)? {
            LoadOutcome::Discarded => continue,
            outcome => return Ok(outcome),
        }
    }
}
