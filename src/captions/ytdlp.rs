use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{CaptionCue, CaptionSource, CaptionTrack, FetchError, TrackKind};

/// Caption payload format requested from the platform
const CAPTION_FORMAT: &str = "json3";

/// yt-dlp error fragments meaning the video itself cannot be watched
const UNAVAILABLE_MARKERS: &[&str] = &[
    "private video",
    "video unavailable",
    "has been removed",
    "this video is not available",
    "confirm your age",
    "age-restricted",
    "in your country",
    "members-only",
    "join this channel",
];

// json3 caption payload

#[derive(Debug, Deserialize)]
struct Json3Payload {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Caption source backed by yt-dlp metadata and direct caption downloads
pub struct YtDlpCaptionSource {
    yt_dlp_path: String,
    client: Client,
    timeout: Duration,
}

impl YtDlpCaptionSource {
    pub fn new(yt_dlp_path: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            yt_dlp_path: yt_dlp_path.into(),
            client,
            timeout,
        })
    }

    fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }

    /// Get video metadata using yt-dlp
    async fn get_video_info(&self, video_id: &str) -> Result<Value, FetchError> {
        let url = Self::watch_url(video_id);
        tracing::debug!("Reading caption metadata for: {}", url);

        let run = Command::new(&self.yt_dlp_path)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                "--ignore-no-formats-error",
                url.as_str(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                FetchError::Transient(format!("yt-dlp timed out after {:?}", self.timeout))
            })?
            .map_err(|e| FetchError::Transient(format!("failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_ytdlp_failure(&stderr));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::Transient(format!("unreadable yt-dlp output: {}", e)))
    }
}

#[async_trait]
impl CaptionSource for YtDlpCaptionSource {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, FetchError> {
        let info = self.get_video_info(video_id).await?;
        Ok(parse_tracks(&info))
    }

    async fn download(&self, track: &CaptionTrack) -> Result<Vec<CaptionCue>, FetchError> {
        let response = self.client.get(&track.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Transient(format!(
                "caption download failed: HTTP {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_json3(&body)
    }
}

/// Collect the json3 tracks from yt-dlp's `subtitles` and `automatic_captions` maps
pub fn parse_tracks(info: &Value) -> Vec<CaptionTrack> {
    let mut tracks = Vec::new();

    for (field, kind) in [
        ("subtitles", TrackKind::Manual),
        ("automatic_captions", TrackKind::AutoGenerated),
    ] {
        let Some(languages) = info[field].as_object() else {
            continue;
        };

        for (language, formats) in languages {
            // Chat replays are exposed as a subtitle track
            if language == "live_chat" {
                continue;
            }

            let entry = formats.as_array().and_then(|formats| {
                formats
                    .iter()
                    .find(|f| f["ext"].as_str() == Some(CAPTION_FORMAT))
            });

            if let Some(url) = entry.and_then(|f| f["url"].as_str()) {
                tracks.push(CaptionTrack {
                    language: language.clone(),
                    kind,
                    name: entry.and_then(|f| f["name"].as_str()).map(|s| s.to_string()),
                    url: url.to_string(),
                });
            }
        }
    }

    tracks
}

/// Decode a json3 caption payload into cues
pub fn parse_json3(body: &str) -> Result<Vec<CaptionCue>, FetchError> {
    let payload: Json3Payload = serde_json::from_str(body)
        .map_err(|e| FetchError::Transient(format!("malformed caption payload: {}", e)))?;

    Ok(payload
        .events
        .into_iter()
        .filter(|event| !event.segs.is_empty())
        .map(|event| CaptionCue {
            start_ms: event.t_start_ms,
            text: event.segs.into_iter().map(|s| s.utf8).collect::<String>(),
        })
        .collect())
}

fn classify_ytdlp_failure(stderr: &str) -> FetchError {
    let lower = stderr.to_lowercase();
    let detail = stderr
        .lines()
        .find(|line| line.contains("ERROR"))
        .unwrap_or_else(|| stderr.trim())
        .to_string();

    if UNAVAILABLE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        FetchError::VideoUnavailable(detail)
    } else {
        FetchError::Transient(format!("yt-dlp failed: {}", detail))
    }
}
