#![forbid(unsafe_code)]

//! Enumerates a channel's uploads playlist, newest first.

use log::{debug, info};
use serde::Deserialize;

use crate::api::{ApiTransport, DataApi};
use crate::channel::ChannelListResponse;
use crate::error::{CollectorError, Result};

/// Largest page `playlistItems.list` will return.
pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    snippet: Option<PlaylistSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    #[serde(default)]
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    video_id: Option<String>,
}

impl PlaylistItem {
    fn into_video_id(self) -> Option<String> {
        self.snippet?
            .resource_id?
            .video_id
            .filter(|id| !id.is_empty())
    }
}

impl<T: ApiTransport> DataApi<T> {
    /// Looks up the playlist that holds every upload of `channel_id`.
    pub fn uploads_playlist_id(&self, channel_id: &str) -> Result<String> {
        let response: ChannelListResponse =
            self.get_as("channels", &[("part", "contentDetails"), ("id", channel_id)])?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| CollectorError::NotFound(format!("no channel found with id {channel_id}")))?;

        item.content_details
            .and_then(|details| details.related_playlists)
            .and_then(|playlists| playlists.uploads)
            .filter(|uploads| !uploads.is_empty())
            .ok_or_else(|| {
                CollectorError::NotFound(format!("channel {channel_id} has no uploads playlist"))
            })
    }

    /// Lists video ids uploaded by `channel_id`, newest first.
    ///
    /// With `max_results`, stops requesting pages as soon as enough ids have
    /// been collected and returns exactly that many. `Some(0)` means no limit.
    pub fn list_video_ids(&self, channel_id: &str, max_results: Option<usize>) -> Result<Vec<String>> {
        let limit = max_results.filter(|&limit| limit > 0);
        let playlist_id = self.uploads_playlist_id(channel_id)?;
        debug!("uploads playlist for {channel_id} is {playlist_id}");

        let page_size = PAGE_SIZE.to_string();
        let mut video_ids = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params = vec![
                ("part", "snippet"),
                ("playlistId", playlist_id.as_str()),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let page: PlaylistItemsPage = self.get_as("playlistItems", &params)?;
            pages += 1;

            for item in page.items {
                let Some(video_id) = item.into_video_id() else {
                    debug!("skipping playlist item without a video id");
                    continue;
                };
                video_ids.push(video_id);

                if let Some(limit) = limit
                    && video_ids.len() >= limit
                {
                    video_ids.truncate(limit);
                    info!("Collected {limit} video ids after {pages} page(s)");
                    return Ok(video_ids);
                }
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("Collected {} video ids after {pages} page(s)", video_ids.len());
        Ok(video_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{FakeTransport, fake_api};
    use serde_json::{Value, json};
    use std::time::{Duration, Instant};

    const CHANNEL_ID: &str = "UC-lHJZR3Gqxm24_Vd_AJ5Yw";
    const UPLOADS_ID: &str = "UU-lHJZR3Gqxm24_Vd_AJ5Yw";

    fn uploads_response() -> Value {
        json!({
            "items": [{
                "id": CHANNEL_ID,
                "contentDetails": {"relatedPlaylists": {"uploads": UPLOADS_ID}}
            }]
        })
    }

    fn page(ids: &[&str], next: Option<&str>) -> Value {
        let items: Vec<Value> = ids
            .iter()
            .map(|id| json!({"snippet": {"resourceId": {"kind": "youtube#video", "videoId": id}}}))
            .collect();
        match next {
            Some(token) => json!({"items": items, "nextPageToken": token}),
            None => json!({"items": items}),
        }
    }

    #[test]
    fn walks_every_page_in_order() {
        let api = fake_api(
            FakeTransport::new()
                .respond("channels", uploads_response())
                .respond("playlistItems", page(&["v5", "v4"], Some("p2")))
                .respond("playlistItems", page(&["v3", "v2"], Some("p3")))
                .respond("playlistItems", page(&["v1"], None)),
        );

        let ids = api.list_video_ids(CHANNEL_ID, None).unwrap();
        assert_eq!(ids, vec!["v5", "v4", "v3", "v2", "v1"]);

        let pages = api.transport().calls_to("playlistItems");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].param("pageToken"), None);
        assert_eq!(pages[1].param("pageToken"), Some("p2"));
        assert_eq!(pages[2].param("pageToken"), Some("p3"));
        assert!(pages.iter().all(|call| call.param("maxResults") == Some("50")));
        assert!(pages.iter().all(|call| call.param("playlistId") == Some(UPLOADS_ID)));
    }

    #[test]
    fn waits_after_lookup_and_every_page() {
        let delay = Duration::from_millis(20);
        let api = fake_api(
            FakeTransport::new()
                .respond("channels", uploads_response())
                .respond("playlistItems", page(&["v3", "v2"], Some("p2")))
                .respond("playlistItems", page(&["v1"], None)),
        )
        .with_delay(delay);

        let started = Instant::now();
        let ids = api.list_video_ids(CHANNEL_ID, None).unwrap();
        assert_eq!(ids.len(), 3);
        assert!(started.elapsed() >= delay * 3);
    }

    #[test]
    fn stops_paging_once_limit_is_reached() {
        let api = fake_api(
            FakeTransport::new()
                .respond("channels", uploads_response())
                .respond("playlistItems", page(&["v5", "v4", "v3"], Some("p2")))
                .respond("playlistItems", page(&["v2", "v1"], None)),
        );

        let ids = api.list_video_ids(CHANNEL_ID, Some(2)).unwrap();
        assert_eq!(ids, vec!["v5", "v4"]);
        assert_eq!(api.transport().calls_to("playlistItems").len(), 1);
    }

    #[test]
    fn limit_spanning_pages_returns_exact_prefix() {
        let api = fake_api(
            FakeTransport::new()
                .respond("channels", uploads_response())
                .respond("playlistItems", page(&["v5", "v4"], Some("p2")))
                .respond("playlistItems", page(&["v3", "v2"], Some("p3")))
                .respond("playlistItems", page(&["v1"], None)),
        );

        let ids = api.list_video_ids(CHANNEL_ID, Some(3)).unwrap();
        assert_eq!(ids, vec!["v5", "v4", "v3"]);
        assert_eq!(api.transport().calls_to("playlistItems").len(), 2);
    }

    #[test]
    fn zero_limit_means_everything() {
        let api = fake_api(
            FakeTransport::new()
                .respond("channels", uploads_response())
                .respond("playlistItems", page(&["v2", "v1"], None)),
        );
        assert_eq!(api.list_video_ids(CHANNEL_ID, Some(0)).unwrap(), vec!["v2", "v1"]);
    }

    #[test]
    fn uploads_lookup_queries_content_details() {
        let api = fake_api(FakeTransport::new().respond("channels", uploads_response()));
        assert_eq!(api.uploads_playlist_id(CHANNEL_ID).unwrap(), UPLOADS_ID);

        let calls = api.transport().calls();
        assert_eq!(calls[0].param("part"), Some("contentDetails"));
        assert_eq!(calls[0].param("id"), Some(CHANNEL_ID));
    }

    #[test]
    fn missing_channel_is_not_found() {
        let api = fake_api(FakeTransport::new().respond("channels", json!({"items": []})));
        let err = api.list_video_ids(CHANNEL_ID, None).unwrap_err();
        assert!(matches!(err, CollectorError::NotFound(_)));
        assert!(api.transport().calls_to("playlistItems").is_empty());
    }

    #[test]
    fn channel_without_uploads_is_not_found() {
        let api = fake_api(
            FakeTransport::new().respond("channels", json!({"items": [{"id": CHANNEL_ID}]})),
        );
        let err = api.uploads_playlist_id(CHANNEL_ID).unwrap_err();
        assert!(err.to_string().contains("no uploads playlist"));
    }

    #[test]
    fn page_failure_discards_partial_results() {
        let api = fake_api(
            FakeTransport::new()
                .respond("channels", uploads_response())
                .respond("playlistItems", page(&["v3", "v2"], Some("p2")))
                .fail("playlistItems", "HTTP 500"),
        );
        let err = api.list_video_ids(CHANNEL_ID, None).unwrap_err();
        assert!(matches!(err, CollectorError::Transport { .. }));
    }

    #[test]
    fn items_without_video_ids_are_ignored() {
        let api = fake_api(
            FakeTransport::new()
                .respond("channels", uploads_response())
                .respond(
                    "playlistItems",
                    json!({"items": [{"snippet": {}}, {"snippet": {"resourceId": {"videoId": "v1"}}}]}),
                ),
        );
        assert_eq!(api.list_video_ids(CHANNEL_ID, None).unwrap(), vec!["v1"]);
    }
}
