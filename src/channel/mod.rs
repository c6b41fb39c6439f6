use async_trait::async_trait;
use futures_util::stream::{self, Stream, TryStreamExt};

pub mod youtube;

use crate::{CollectorError, Result};

/// Largest page the listing API hands out per call
pub const MAX_PAGE_SIZE: u32 = 50;

/// A public video of the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    /// Opaque platform identifier
    pub id: String,

    /// Human-readable title
    pub title: String,
}

impl VideoEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// One page of a listing call
#[derive(Debug, Clone, Default)]
pub struct VideoPage {
    pub videos: Vec<VideoEntry>,

    /// Continuation token, absent on the last page
    pub next_page_token: Option<String>,
}

/// Paginated listing endpoint of the video platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingApi: Send + Sync {
    /// Resolve a channel to the playlist holding all of its uploads
    async fn uploads_playlist(&self, channel_id: &str) -> Result<String>;

    /// Fetch one page of the uploads playlist
    async fn fetch_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<VideoPage>;
}

/// Where the lister is in the page sequence
enum Cursor {
    Start,
    Next { playlist_id: String, token: String },
    Done,
}

/// Turns the paginated listing API into a lazy stream of videos
pub struct ChannelLister<A> {
    api: A,
    page_size: u32,
}

impl<A: ListingApi> ChannelLister<A> {
    pub fn new(api: A, page_size: u32) -> Self {
        let clamped = page_size.clamp(1, MAX_PAGE_SIZE);
        if clamped != page_size {
            tracing::warn!(
                "Page size clamped from {} to {} (API allows 1-{})",
                page_size,
                clamped,
                MAX_PAGE_SIZE
            );
        }

        Self {
            api,
            page_size: clamped,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Stream every public video of the channel in listing order.
    ///
    /// Pages are only requested as the stream is polled. The stream ends after the first
    /// page that carries no continuation token, and yields an error (then stops) if a
    /// listing call fails.
    pub fn videos<'a>(
        &'a self,
        channel_id: &'a str,
    ) -> impl Stream<Item = Result<VideoEntry>> + Send + 'a {
        stream::try_unfold(Cursor::Start, move |cursor| async move {
            let (playlist_id, token) = match cursor {
                Cursor::Done => return Ok(None),
                Cursor::Start => {
                    let playlist_id = self.api.uploads_playlist(channel_id).await?;
                    tracing::debug!("Channel {} uploads playlist: {}", channel_id, playlist_id);
                    (playlist_id, None)
                }
                Cursor::Next { playlist_id, token } => (playlist_id, Some(token)),
            };

            let page = self
                .api
                .fetch_page(&playlist_id, token, self.page_size)
                .await?;
            tracing::debug!(
                "Fetched page with {} videos (more: {})",
                page.videos.len(),
                page.next_page_token.is_some()
            );

            let next = match page.next_page_token {
                Some(token) if !token.is_empty() => Cursor::Next { playlist_id, token },
                _ => Cursor::Done,
            };

            let videos = stream::iter(page.videos.into_iter().map(Ok::<_, CollectorError>));
            Ok::<_, CollectorError>(Some((videos, next)))
        })
        .try_flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[&str], next: Option<&str>) -> VideoPage {
        VideoPage {
            videos: ids
                .iter()
                .map(|id| VideoEntry::new(*id, format!("Title {}", id)))
                .collect(),
            next_page_token: next.map(|t| t.to_string()),
        }
    }

    #[tokio::test]
    async fn follows_continuation_tokens_until_absent() {
        let mut api = MockListingApi::new();
        api.expect_uploads_playlist()
            .withf(|id| id == "UCchannel")
            .times(1)
            .returning(|_| Ok("UUchannel".to_string()));
        api.expect_fetch_page()
            .times(3)
            .returning(|playlist, token, size| {
                assert_eq!(playlist, "UUchannel");
                assert_eq!(size, 2);
                match token.as_deref() {
                    None => Ok(page(&["a", "b"], Some("p2"))),
                    Some("p2") => Ok(page(&["c", "d"], Some("p3"))),
                    Some("p3") => Ok(page(&["e"], None)),
                    other => panic!("unexpected token {:?}", other),
                }
            });

        let lister = ChannelLister::new(api, 2);
        let videos: Vec<VideoEntry> = lister.videos("UCchannel").try_collect().await.unwrap();

        let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn empty_channel_yields_nothing() {
        let mut api = MockListingApi::new();
        api.expect_uploads_playlist()
            .returning(|_| Ok("UUempty".to_string()));
        api.expect_fetch_page()
            .times(1)
            .returning(|_, _, _| Ok(VideoPage::default()));

        let lister = ChannelLister::new(api, 50);
        let videos: Vec<VideoEntry> = lister.videos("UCempty").try_collect().await.unwrap();
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn empty_token_ends_pagination() {
        let mut api = MockListingApi::new();
        api.expect_uploads_playlist()
            .returning(|_| Ok("UUx".to_string()));
        api.expect_fetch_page()
            .times(1)
            .returning(|_, _, _| Ok(page(&["a"], Some(""))));

        let lister = ChannelLister::new(api, 50);
        let videos: Vec<VideoEntry> = lister.videos("UCx").try_collect().await.unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[tokio::test]
    async fn unresolved_channel_is_not_found() {
        let mut api = MockListingApi::new();
        api.expect_uploads_playlist()
            .returning(|id| Err(CollectorError::NotFound(id.to_string())));
        api.expect_fetch_page().never();

        let lister = ChannelLister::new(api, 50);
        let err = lister
            .videos("UCmissing")
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert_eq!(err, CollectorError::NotFound("UCmissing".to_string()));
    }

    #[tokio::test]
    async fn failure_on_later_page_surfaces_after_earlier_videos() {
        let mut api = MockListingApi::new();
        api.expect_uploads_playlist()
            .returning(|_| Ok("UUx".to_string()));
        api.expect_fetch_page().returning(|_, token, _| match token {
            None => Ok(page(&["a"], Some("p2"))),
            Some(_) => Err(CollectorError::Transient("connection reset".to_string())),
        });

        let lister = ChannelLister::new(api, 50);
        let items: Vec<Result<VideoEntry>> = futures_util::StreamExt::collect(lister.videos("UCx")).await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(CollectorError::Transient(_))));
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(ChannelLister::new(MockListingApi::new(), 500).page_size(), 50);
        assert_eq!(ChannelLister::new(MockListingApi::new(), 0).page_size(), 1);
        assert_eq!(ChannelLister::new(MockListingApi::new(), 25).page_size(), 25);
    }
}
