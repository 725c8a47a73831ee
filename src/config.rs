use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pexels::{ClientConfig, PEXELS_API_BASE};

const DEFAULT_ENV_PREFIX: &str = "MEDIAGRID";
const API_KEY_ENV: &str = "PEXELS_API_KEY";
const COLLECTION_ID_ENV: &str = "PEXELS_COLLECTION_ID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub pexels: PexelsConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub prefetch: PrefetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PexelsConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub collection_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            collection_id: String::new(),
            base_url: default_base_url(),
            per_page: 0,
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

impl PexelsConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.collection_id.trim().is_empty()
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_key: self.api_key.clone(),
            collection_id: self.collection_id.clone(),
            base_url: Some(self.base_url.clone()),
            per_page: Some(self.per_page).filter(|n| *n > 0),
            user_agent: self.user_agent.clone(),
            timeout: Some(self.timeout),
            http_client: None,
        }
    }
}

fn default_base_url() -> String {
    PEXELS_API_BASE.to_string()
}

fn default_user_agent() -> String {
    format!("mediagrid/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_rotation_interval", with = "humantime_serde")]
    pub rotation_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            rotation_interval: default_rotation_interval(),
        }
    }
}

fn default_rotation_interval() -> Duration {
    crate::preview::DEFAULT_ROTATION_INTERVAL
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewerConfig {
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: default_swipe_threshold(),
        }
    }
}

fn default_swipe_threshold() -> f32 {
    crate::viewer::DEFAULT_SWIPE_THRESHOLD
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrefetchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            capacity: default_capacity(),
        }
    }
}

fn default_workers() -> usize {
    2
}

fn default_capacity() -> usize {
    16
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.pexels.api_key.is_empty() {
        base.pexels.api_key = other.pexels.api_key;
    }
    if !other.pexels.collection_id.is_empty() {
        base.pexels.collection_id = other.pexels.collection_id;
    }
    if !other.pexels.base_url.is_empty() {
        base.pexels.base_url = other.pexels.base_url;
    }
    if other.pexels.per_page != 0 {
        base.pexels.per_page = other.pexels.per_page;
    }
    if !other.pexels.user_agent.is_empty() {
        base.pexels.user_agent = other.pexels.user_agent;
    }
    if !other.pexels.timeout.is_zero() {
        base.pexels.timeout = other.pexels.timeout;
    }

    if !other.feed.rotation_interval.is_zero() {
        base.feed.rotation_interval = other.feed.rotation_interval;
    }

    if other.viewer.swipe_threshold > 0.0 {
        base.viewer.swipe_threshold = other.viewer.swipe_threshold;
    }

    if other.prefetch.workers != 0 {
        base.prefetch.workers = other.prefetch.workers;
    }
    if other.prefetch.capacity != 0 {
        base.prefetch.capacity = other.prefetch.capacity;
    }

    base
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        } else if key == API_KEY_ENV {
            map.entry("pexels.api_key".into()).or_insert(value);
        } else if key == COLLECTION_ID_ENV {
            map.entry("pexels.collection_id".into()).or_insert(value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "pexels.api_key" => cfg.pexels.api_key = value,
        "pexels.collection_id" => cfg.pexels.collection_id = value,
        "pexels.base_url" => cfg.pexels.base_url = value,
        "pexels.user_agent" => cfg.pexels.user_agent = value,
        "pexels.per_page" => {
            if let Ok(parsed) = value.parse::<u32>() {
                cfg.pexels.per_page = parsed;
            }
        }
        "pexels.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.pexels.timeout = duration;
            }
        }
        "feed.rotation_interval" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                if !duration.is_zero() {
                    cfg.feed.rotation_interval = duration;
                }
            }
        }
        "viewer.swipe_threshold" => {
            if let Ok(parsed) = value.parse::<f32>() {
                if parsed > 0.0 {
                    cfg.viewer.swipe_threshold = parsed;
                }
            }
        }
        "prefetch.workers" => {
            if let Ok(parsed) = value.parse::<usize>() {
                cfg.prefetch.workers = parsed;
            }
        }
        "prefetch.capacity" => {
            if let Ok(parsed) = value.parse::<usize>() {
                cfg.prefetch.capacity = parsed;
            }
        }
        _ => {}
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mediagrid").join("config.yaml"))
}
