use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{MediaError, Result};

pub const PEXELS_API_BASE: &str = "https://api.pexels.com/v1";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub api_key: String,
    pub collection_id: String,
    pub base_url: Option<String>,
    pub per_page: Option<u32>,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSources {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub large2x: String,
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub portrait: String,
    #[serde(default)]
    pub landscape: String,
    #[serde(default)]
    pub tiny: String,
}

impl PhotoSources {
    /// Variant shown (and prefetched) by the full-screen viewer.
    pub fn display(&self) -> Option<&str> {
        non_empty(&self.large2x).or_else(|| non_empty(&self.original))
    }

    /// Variant used for grid thumbnails.
    pub fn thumbnail(&self) -> Option<&str> {
        non_empty(&self.medium)
            .or_else(|| non_empty(&self.small))
            .or_else(|| non_empty(&self.tiny))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: Option<Attribution>,
    #[serde(default)]
    pub photographer: String,
    #[serde(default)]
    pub photographer_url: String,
    #[serde(default)]
    pub src: PhotoSources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    Hd,
    Sd,
    #[default]
    #[serde(other)]
    Default,
}

impl VideoQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoQuality::Hd => "hd",
            VideoQuality::Sd => "sd",
            VideoQuality::Default => "default",
        }
    }
}

fn nullable_quality<'de, D>(deserializer: D) -> std::result::Result<VideoQuality, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<VideoQuality>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "nullable_quality")]
    pub quality: VideoQuality,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPicture {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub nr: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: Option<Attribution>,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
    #[serde(default)]
    pub video_pictures: Vec<VideoPicture>,
}

impl Video {
    pub fn first_picture(&self) -> Option<&str> {
        self.video_pictures
            .first()
            .and_then(|picture| non_empty(&picture.picture))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MediaItem {
    Photo(Photo),
    Video(Video),
}

impl MediaItem {
    pub fn id(&self) -> u64 {
        match self {
            MediaItem::Photo(photo) => photo.id,
            MediaItem::Video(video) => video.id,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaItem::Photo(_) => MediaKind::Photo,
            MediaItem::Video(_) => MediaKind::Video,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaItem::Video(_))
    }

    pub fn as_video(&self) -> Option<&Video> {
        match self {
            MediaItem::Video(video) => Some(video),
            MediaItem::Photo(_) => None,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            MediaItem::Photo(photo) => (photo.width, photo.height),
            MediaItem::Video(video) => (video.width, video.height),
        }
    }

    pub fn page_url(&self) -> &str {
        match self {
            MediaItem::Photo(photo) => &photo.url,
            MediaItem::Video(video) => &video.url,
        }
    }

    /// Photos report the photographer in flat fields when `user` is absent.
    pub fn attribution(&self) -> Attribution {
        match self {
            MediaItem::Photo(photo) => photo.user.clone().unwrap_or_else(|| Attribution {
                name: photo.photographer.clone(),
                url: photo.photographer_url.clone(),
            }),
            MediaItem::Video(video) => video.user.clone().unwrap_or_default(),
        }
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        match self {
            MediaItem::Photo(photo) => photo.src.thumbnail(),
            MediaItem::Video(video) => video.first_picture(),
        }
    }

    /// Primary preview image, the one the viewer prefetches for neighbors.
    pub fn preview_image_url(&self) -> Option<&str> {
        match self {
            MediaItem::Photo(photo) => photo.src.display(),
            MediaItem::Video(video) => video.first_picture(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
}

pub struct Client {
    http: HttpClient,
    api_key: String,
    collection_id: String,
    user_agent: String,
    base_url: Url,
    per_page: Option<u32>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(MediaError::Config("pexels api key required".into()));
        }
        if config.collection_id.trim().is_empty() {
            return Err(MediaError::Config("pexels collection id required".into()));
        }

        let raw_base = config.base_url.as_deref().unwrap_or(PEXELS_API_BASE);
        let base_url = Url::parse(raw_base.trim_end_matches('/'))
            .map_err(|err| MediaError::Config(format!("invalid base url {raw_base}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MediaError::Config(format!("invalid base url {raw_base}")));
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()
                .map_err(|err| MediaError::Config(format!("build http client: {err}")))?,
        };

        let user_agent = if config.user_agent.trim().is_empty() {
            format!("mediagrid/{}", crate::VERSION)
        } else {
            config.user_agent
        };

        Ok(Client {
            http,
            api_key: config.api_key.trim().to_string(),
            collection_id: config.collection_id.trim().to_string(),
            user_agent,
            base_url,
            per_page: config.per_page.filter(|n| *n > 0),
        })
    }

    pub fn collection_url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("collections")
                .push(&self.collection_id);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            if let Some(per_page) = self.per_page {
                pairs.append_pair("per_page", &per_page.to_string());
            }
        }
        url
    }

    pub fn fetch_page(&self, page: u32) -> Result<MediaPage> {
        let url = self.collection_url(page);
        debug!(%url, page, "fetching collection page");

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|err| MediaError::Fetch(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            warn!(status = status.as_u16(), page, "collection request failed");
            return Err(match status.as_u16() {
                401 => MediaError::Fetch("pexels: unauthorized".into()),
                403 => MediaError::Fetch("pexels: forbidden".into()),
                429 => MediaError::Fetch(format!("pexels: rate limited: {body}")),
                code => MediaError::Status { status: code, body },
            });
        }

        let body = resp
            .text()
            .map_err(|err| MediaError::Fetch(err.to_string()))?;
        parse_page(&body)
    }
}

pub fn parse_page(body: &str) -> Result<MediaPage> {
    let page: MediaPage = serde_json::from_str(body)?;
    Ok(page)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
