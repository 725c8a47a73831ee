use crate::error::{MediaError, Result};
use crate::pexels::{MediaItem, Video, VideoFile, VideoQuality};

/// Container every playback stack we target can decode.
pub const PREFERRED_CONTAINER: &str = "video/mp4";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoSource {
    pub playback_url: String,
    pub quality: VideoQuality,
    pub file_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl VideoSource {
    fn from_file(file: &VideoFile) -> Self {
        Self {
            playback_url: file.link.trim().to_string(),
            quality: file.quality,
            file_type: file.file_type.clone(),
            width: file.width.filter(|w| *w > 0),
            height: file.height.filter(|h| *h > 0),
        }
    }

    pub fn label(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{} {}x{}", self.quality.as_str(), w, h),
            _ => self.quality.as_str().to_string(),
        }
    }
}

fn quality_rank(quality: VideoQuality) -> u8 {
    match quality {
        VideoQuality::Hd => 2,
        VideoQuality::Sd => 1,
        VideoQuality::Default => 0,
    }
}

fn container_rank(file_type: &str) -> u8 {
    if file_type.trim().eq_ignore_ascii_case(PREFERRED_CONTAINER) {
        1
    } else {
        0
    }
}

/// Highest quality first, then the preferred container; list order breaks ties.
pub fn best_video_file(files: &[VideoFile]) -> Result<&VideoFile> {
    let mut best: Option<&VideoFile> = None;
    for file in files {
        let better = match best {
            None => true,
            Some(current) => {
                let candidate = (quality_rank(file.quality), container_rank(&file.file_type));
                let incumbent = (
                    quality_rank(current.quality),
                    container_rank(&current.file_type),
                );
                candidate > incumbent
            }
        };
        if better {
            best = Some(file);
        }
    }
    best.ok_or(MediaError::NoPlayableSource)
}

pub fn best_source(video: &Video) -> Result<VideoSource> {
    best_video_file(&video.video_files).map(VideoSource::from_file)
}

/// `None` for photos and for videos without a playable file.
pub fn playable_source(item: &MediaItem) -> Option<VideoSource> {
    let video = item.as_video()?;
    match best_source(video) {
        Ok(source) => Some(source),
        Err(err) => {
            tracing::debug!(id = video.id, %err, "video has nothing to play");
            None
        }
    }
}
