use futures_util::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::Duration;

use crate::captions::{CaptionSource, FetchError, TranscriptFetcher};
use crate::channel::{ChannelLister, ListingApi, VideoEntry};
use crate::Result;

/// Upper bound on overlapping transcript fetches
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Transcript outcome for one listed video
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    pub video: VideoEntry,

    /// The transcript text, or why there is none
    pub outcome: std::result::Result<String, FetchError>,
}

impl TranscriptResult {
    pub fn obtained(video: VideoEntry, text: impl Into<String>) -> Self {
        Self {
            video,
            outcome: Ok(text.into()),
        }
    }

    pub fn missing(video: VideoEntry, reason: FetchError) -> Self {
        Self {
            video,
            outcome: Err(reason),
        }
    }

    /// Transcript text, absent when no caption track could be retrieved
    pub fn text(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }
}

/// Every listed video with its transcript outcome, in listing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub results: Vec<TranscriptResult>,
}

impl RunOutput {
    pub fn new(results: Vec<TranscriptResult>) -> Self {
        Self { results }
    }

    pub fn summary(&self) -> RunSummary {
        let skipped: Vec<SkippedVideo> = self
            .results
            .iter()
            .filter_map(|result| {
                result.outcome.as_ref().err().map(|reason| SkippedVideo {
                    video_id: result.video.id.clone(),
                    title: result.video.title.clone(),
                    reason: reason.to_string(),
                })
            })
            .collect();

        RunSummary {
            total: self.results.len(),
            obtained: self.results.len() - skipped.len(),
            missing: skipped.len(),
            skipped,
        }
    }
}

/// A video that ended up without a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVideo {
    pub video_id: String,
    pub title: String,
    pub reason: String,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub obtained: usize,
    pub missing: usize,
    pub skipped: Vec<SkippedVideo>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={}, obtained={}, missing={}",
            self.total, self.obtained, self.missing
        )
    }
}

/// Lists a channel and fetches a transcript for every video on it
pub struct ChannelTranscriptCollector<A, S> {
    lister: ChannelLister<A>,
    fetcher: TranscriptFetcher<S>,
    channel_id: String,
    concurrency: usize,
    show_progress: bool,
}

impl<A: ListingApi, S: CaptionSource> ChannelTranscriptCollector<A, S> {
    pub fn new(
        lister: ChannelLister<A>,
        fetcher: TranscriptFetcher<S>,
        channel_id: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        let clamped = concurrency.clamp(1, MAX_CONCURRENT_FETCHES);
        if clamped != concurrency {
            tracing::warn!(
                "Concurrent fetches clamped from {} to {} (allowed 1-{})",
                concurrency,
                clamped,
                MAX_CONCURRENT_FETCHES
            );
        }

        Self {
            lister,
            fetcher,
            channel_id: channel_id.into(),
            concurrency: clamped,
            show_progress: false,
        }
    }

    /// Show a progress spinner on stderr while running
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Collect the transcripts of every listed video.
    ///
    /// Fails only when the channel cannot be listed; per-video failures are kept in the
    /// returned results. Results come back in listing order even when fetches overlap.
    pub async fn run(&self) -> Result<RunOutput> {
        tracing::info!(
            "Collecting transcripts for channel {} ({} concurrent fetches)",
            self.channel_id,
            self.concurrency
        );

        let progress = self.progress_bar();
        let this = self;
        let bar = &progress;

        let collected = self
            .lister
            .videos(&self.channel_id)
            .map_ok(move |video| this.collect_one(video, bar))
            .try_buffered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await;

        match collected {
            Ok(results) => {
                progress.finish_with_message(format!("Processed {} videos", results.len()));
                Ok(RunOutput::new(results))
            }
            Err(e) => {
                progress.abandon_with_message("Listing failed");
                tracing::error!("Could not list channel {}: {}", self.channel_id, e);
                Err(e)
            }
        }
    }

    async fn collect_one(&self, video: VideoEntry, progress: &ProgressBar) -> Result<TranscriptResult> {
        let outcome = self.fetcher.fetch(&video.id).await;

        match &outcome {
            Ok(text) => tracing::info!("Saved transcript for: {} ({} chars)", video.title, text.len()),
            Err(FetchError::NoCaptionsAvailable) => {
                tracing::info!("Skipped {} ({}): no transcript", video.title, video.id)
            }
            Err(e) => tracing::warn!("Skipped {} ({}): {}", video.title, video.id, e),
        }

        progress.inc(1);
        progress.set_message(video.title.clone());

        Ok(TranscriptResult { video, outcome })
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} videos {msg}")
        {
            progress.set_style(style);
        }
        progress.enable_steady_tick(Duration::from_millis(120));
        progress
    }
}
