use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("fetch failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("no playable source")]
    NoPlayableSource,
    #[error("index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("config: {0}")]
    Config(String),
}

impl MediaError {
    /// Network or non-success status; the user may retry.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, MediaError::Fetch(_) | MediaError::Status { .. })
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self, MediaError::Parse(_))
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MediaError::Parse(err.to_string())
        } else {
            MediaError::Fetch(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MediaError {
    fn from(err: serde_json::Error) -> Self {
        MediaError::Parse(err.to_string())
    }
}

pub type Result<T, E = MediaError> = std::result::Result<T, E>;
