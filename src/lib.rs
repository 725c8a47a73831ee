#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod feed;
pub mod pexels;
pub mod prefetch;
pub mod preview;
pub mod video;
pub mod viewer;
pub mod zoom;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{run, RunOptions};
pub use error::MediaError;
