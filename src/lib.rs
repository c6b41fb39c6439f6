//! Channel Transcripts - A Rust CLI tool for collecting the captions of a whole channel
//!
//! This library lists every public video of a YouTube channel, fetches the best available
//! caption track for each one and writes all of them into a single text file headed by
//! the video titles.

pub mod captions;
pub mod channel;
pub mod cli;
pub mod collector;
pub mod config;
pub mod output;
pub mod utils;

pub use captions::{CaptionSource, FetchError, TrackKind, TrackPreference, TranscriptFetcher};
pub use channel::{ChannelLister, ListingApi, VideoEntry, VideoPage};
pub use cli::Cli;
pub use collector::{ChannelTranscriptCollector, RunOutput, RunSummary, TranscriptResult};
pub use config::Config;

/// Result type used throughout the library
pub type Result<T, E = CollectorError> = std::result::Result<T, E>;

/// Channel-level failures. Any of these aborts the run before output is written.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    #[error("API key rejected: {0}")]
    Auth(String),

    #[error("Channel not found: {0}")]
    NotFound(String),

    #[error("Transient failure: {0}")]
    Transient(String),
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the API key
        let err = err.without_url();
        if err.is_timeout() {
            CollectorError::Transient(format!("request timed out: {}", err))
        } else {
            CollectorError::Transient(err.to_string())
        }
    }
}
