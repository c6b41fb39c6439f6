use async_trait::async_trait;

pub mod ytdlp;

/// Per-video failures. None of these stop the run.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("no captions available")]
    NoCaptionsAvailable,

    #[error("video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("transient failure: {0}")]
    Transient(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the API key
        let err = err.without_url();
        if err.is_timeout() {
            FetchError::Transient(format!("request timed out: {}", err))
        } else {
            FetchError::Transient(err.to_string())
        }
    }
}

/// How a caption track was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Authored by a person
    Manual,
    /// Generated by speech recognition
    AutoGenerated,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Manual => "manual",
            TrackKind::AutoGenerated => "auto-generated",
        }
    }
}

/// A caption track offered for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    /// Language code as reported by the platform (`en`, `en-US`, `en-orig`, ...)
    pub language: String,

    pub kind: TrackKind,

    /// Display name of the track, if any
    pub name: Option<String>,

    /// Where the track's payload can be downloaded
    pub url: String,
}

impl CaptionTrack {
    /// Whether this track is in the given language or one of its regional variants
    pub fn matches_language(&self, language: &str) -> bool {
        let code = self.language.to_lowercase();
        let wanted = language.to_lowercase();
        code == wanted || code.starts_with(&format!("{}-", wanted))
    }
}

/// A single timed caption line
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionCue {
    pub start_ms: u64,
    pub text: String,
}

/// One entry of the track selection policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPreference {
    pub kind: TrackKind,
    pub language: String,
}

impl TrackPreference {
    pub fn new(kind: TrackKind, language: impl Into<String>) -> Self {
        Self {
            kind,
            language: language.into(),
        }
    }

    /// Manual tracks in every requested language first, then auto-generated ones.
    ///
    /// A person-authored track in any acceptable language beats a machine transcript.
    pub fn default_order(languages: &[String]) -> Vec<TrackPreference> {
        [TrackKind::Manual, TrackKind::AutoGenerated]
            .into_iter()
            .flat_map(|kind| {
                languages
                    .iter()
                    .map(move |lang| TrackPreference::new(kind, lang.as_str()))
            })
            .collect()
    }

    fn accepts(&self, track: &CaptionTrack) -> bool {
        track.kind == self.kind && track.matches_language(&self.language)
    }
}

/// Pick the first track satisfying the earliest preference
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    preferences: &[TrackPreference],
) -> Option<&'a CaptionTrack> {
    preferences
        .iter()
        .find_map(|pref| tracks.iter().find(|track| pref.accepts(track)))
}

/// Join cue texts into one block, dropping timing and empty cues
pub fn cues_to_text(cues: &[CaptionCue]) -> String {
    cues.iter()
        .map(|cue| cue.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Source of caption tracks for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// List every caption track the video offers
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, FetchError>;

    /// Download and decode one track
    async fn download(&self, track: &CaptionTrack) -> Result<Vec<CaptionCue>, FetchError>;
}

/// Fetches the best available transcript of a video
pub struct TranscriptFetcher<S> {
    source: S,
    preferences: Vec<TrackPreference>,
}

impl<S: CaptionSource> TranscriptFetcher<S> {
    pub fn new(source: S, preferences: Vec<TrackPreference>) -> Self {
        Self {
            source,
            preferences,
        }
    }

    /// Fetch the transcript of a video as plain text
    pub async fn fetch(&self, video_id: &str) -> Result<String, FetchError> {
        let tracks = self.source.list_tracks(video_id).await?;
        tracing::debug!("Video {} offers {} caption tracks", video_id, tracks.len());

        let track = select_track(&tracks, &self.preferences).ok_or(FetchError::NoCaptionsAvailable)?;
        tracing::debug!(
            "Using {} track '{}' for {}",
            track.kind.as_str(),
            track.language,
            video_id
        );

        let cues = self.source.download(track).await?;
        let text = cues_to_text(&cues);

        if text.is_empty() {
            return Err(FetchError::NoCaptionsAvailable);
        }

        Ok(text)
    }
}
