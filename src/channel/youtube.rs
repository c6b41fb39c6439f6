use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{ListingApi, VideoEntry, VideoPage};
use crate::{CollectorError, Result};

/// YouTube Data API v3 base URL
pub const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Error reasons that mean the key itself is unusable
const AUTH_REASONS: &[&str] = &[
    "keyInvalid",
    "keyExpired",
    "forbidden",
    "accessNotConfigured",
    "ipRefererBlocked",
    "API_KEY_INVALID",
];

// Response types for the Data API

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
    status: Option<PlaylistItemStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    kind: String,
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemStatus {
    privacy_status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    reason: String,
}

/// Listing client for the YouTube Data API, authenticated with a static key
pub struct YoutubeDataApi {
    api_key: String,
    base_url: String,
    client: Client,
}

impl YoutubeDataApi {
    /// Create a client against the public API endpoint
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, API_BASE_URL, timeout)
    }

    /// Create a client against a custom endpoint
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build an endpoint URL with the key and the given query parameters
    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, resource))
            .map_err(|e| CollectorError::Transient(format!("invalid API URL: {}", e)))?;

        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("key", &self.api_key);

        Ok(url)
    }

    /// GET a resource and decode it, mapping API errors onto the collector taxonomy
    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", redact_key(&url));

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CollectorError::Transient(format!("malformed API response: {}", e)))
    }
}

#[async_trait]
impl ListingApi for YoutubeDataApi {
    async fn uploads_playlist(&self, channel_id: &str) -> Result<String> {
        let url = self.endpoint("channels", &[("part", "contentDetails"), ("id", channel_id)])?;
        let response: ChannelListResponse = self.get(url).await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.content_details.related_playlists.uploads)
            .ok_or_else(|| CollectorError::NotFound(channel_id.to_string()))
    }

    async fn fetch_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<VideoPage> {
        let max_results = page_size.to_string();
        let mut params = vec![
            ("part", "snippet,status"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token.as_deref() {
            params.push(("pageToken", token));
        }

        let url = self.endpoint("playlistItems", &params)?;
        let response: PlaylistItemListResponse = match self.get(url).await {
            Ok(response) => response,
            // A channel that never uploaded has no uploads playlist to list
            Err(CollectorError::NotFound(_)) if page_token.is_none() => {
                tracing::debug!("Uploads playlist {} does not exist, treating as empty", playlist_id);
                return Ok(VideoPage::default());
            }
            Err(e) => return Err(e),
        };

        let videos = response
            .items
            .into_iter()
            .filter_map(|item| {
                let public = item
                    .status
                    .as_ref()
                    .map_or(true, |s| s.privacy_status == "public");
                if !public || item.snippet.resource_id.kind != "youtube#video" {
                    tracing::debug!("Skipping non-public item: {}", item.snippet.title);
                    return None;
                }

                item.snippet
                    .resource_id
                    .video_id
                    .map(|id| VideoEntry::new(id, item.snippet.title))
            })
            .collect();

        Ok(VideoPage {
            videos,
            next_page_token: response.next_page_token,
        })
    }
}

/// Map a failed API response onto the collector error taxonomy
fn classify_error(status: StatusCode, body: &str) -> CollectorError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("HTTP {}", status));
    let reasons: Vec<&str> = parsed
        .as_ref()
        .map(|e| e.error.errors.iter().map(|d| d.reason.as_str()).collect())
        .unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED
        || reasons.iter().any(|r| AUTH_REASONS.contains(r))
    {
        return CollectorError::Auth(message);
    }

    if status == StatusCode::NOT_FOUND {
        return CollectorError::NotFound(message);
    }

    CollectorError::Transient(format!("HTTP {}: {}", status.as_u16(), message))
}

/// Render a request URL for logs without the API key
fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
