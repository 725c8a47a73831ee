use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{MediaError, Result};
use crate::pexels::{self, MediaItem, MediaPage};

pub trait MediaSource: Send + Sync {
    fn fetch_page(&self, page: u32) -> Result<MediaPage>;
}

pub struct PexelsMediaSource {
    client: Arc<pexels::Client>,
}

impl PexelsMediaSource {
    pub fn new(client: Arc<pexels::Client>) -> Self {
        Self { client }
    }
}

impl MediaSource for PexelsMediaSource {
    fn fetch_page(&self, page: u32) -> Result<MediaPage> {
        self.client.fetch_page(page)
    }
}

/// Offline collection used when no API key is configured.
pub struct MockMediaSource {
    pages: Vec<Vec<MediaItem>>,
}

impl Default for MockMediaSource {
    fn default() -> Self {
        Self::with_pages(vec![
            vec![
                mock_photo(1, "Harbor at dawn"),
                mock_video(2, "Waves"),
                mock_photo(3, "Pine forest"),
                mock_video(4, "City timelapse"),
            ],
            vec![mock_video(5, "Rain on glass"), mock_photo(6, "Desert road")],
        ])
    }
}

impl MockMediaSource {
    pub fn with_pages(pages: Vec<Vec<MediaItem>>) -> Self {
        Self { pages }
    }
}

impl MediaSource for MockMediaSource {
    fn fetch_page(&self, page: u32) -> Result<MediaPage> {
        let media = page
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
            .cloned()
            .unwrap_or_default();
        let total_results = self.pages.iter().map(Vec::len).sum::<usize>() as u64;
        Ok(MediaPage {
            page,
            per_page: self.pages.first().map(Vec::len).unwrap_or_default() as u32,
            total_results,
            media,
            next_page: None,
            prev_page: None,
        })
    }
}

/// Replays queued responses in order; an empty queue yields an empty page.
#[derive(Default)]
pub struct ScriptedMediaSource {
    responses: Mutex<VecDeque<Result<MediaPage>>>,
    requested: Mutex<Vec<u32>>,
}

impl ScriptedMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, media: Vec<MediaItem>) {
        let page = MediaPage {
            page: 0,
            per_page: media.len() as u32,
            total_results: 0,
            media,
            next_page: None,
            prev_page: None,
        };
        self.responses.lock().push_back(Ok(page));
    }

    pub fn push_error(&self, err: MediaError) {
        self.responses.lock().push_back(Err(err));
    }

    pub fn requested(&self) -> Vec<u32> {
        self.requested.lock().clone()
    }
}

impl MediaSource for ScriptedMediaSource {
    fn fetch_page(&self, page: u32) -> Result<MediaPage> {
        self.requested.lock().push(page);
        match self.responses.lock().pop_front() {
            Some(Ok(mut response)) => {
                response.page = page;
                Ok(response)
            }
            Some(Err(err)) => Err(err),
            None => Ok(MediaPage {
                page,
                per_page: 0,
                total_results: 0,
                media: Vec::new(),
                next_page: None,
                prev_page: None,
            }),
        }
    }
}

pub fn mock_photo(id: u64, title: &str) -> MediaItem {
    let base = format!("https://images.example.com/photos/{id}");
    MediaItem::Photo(pexels::Photo {
        id,
        width: 3000,
        height: 2000,
        url: format!("https://www.example.com/photo/{id}/"),
        user: None,
        photographer: title.to_string(),
        photographer_url: String::new(),
        src: pexels::PhotoSources {
            original: format!("{base}/original.jpg"),
            large2x: format!("{base}/large2x.jpg"),
            large: format!("{base}/large.jpg"),
            medium: format!("{base}/medium.jpg"),
            small: format!("{base}/small.jpg"),
            portrait: format!("{base}/portrait.jpg"),
            landscape: format!("{base}/landscape.jpg"),
            tiny: format!("{base}/tiny.jpg"),
        },
    })
}

pub fn mock_video(id: u64, title: &str) -> MediaItem {
    let base = format!("https://videos.example.com/{id}");
    MediaItem::Video(pexels::Video {
        id,
        width: 1920,
        height: 1080,
        url: format!("https://www.example.com/video/{id}/"),
        user: Some(pexels::Attribution {
            name: title.to_string(),
            url: String::new(),
        }),
        video_files: vec![
            pexels::VideoFile {
                id: id * 10,
                quality: pexels::VideoQuality::Sd,
                file_type: "video/mp4".into(),
                width: Some(960),
                height: Some(540),
                link: format!("{base}/sd.mp4"),
            },
            pexels::VideoFile {
                id: id * 10 + 1,
                quality: pexels::VideoQuality::Hd,
                file_type: "video/mp4".into(),
                width: Some(1920),
                height: Some(1080),
                link: format!("{base}/hd.mp4"),
            },
        ],
        video_pictures: vec![pexels::VideoPicture {
            id: id * 100,
            picture: format!("{base}/picture-0.jpg"),
            nr: 0,
        }],
    })
}
