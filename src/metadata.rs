#![forbid(unsafe_code)]

//! Bulk retrieval of per-video metadata.
//!
//! The Data API accepts up to fifty ids per `videos.list` call, so ids are
//! fetched in consecutive batches. Missing facets or fields fall back to
//! defaults instead of failing; videos the API no longer returns (deleted or
//! made private since enumeration) simply have no entry in the result.

use std::collections::HashMap;

use log::{debug, info};
use serde::Deserialize;

use crate::api::{ApiTransport, DataApi};
use crate::error::Result;

pub const BATCH_SIZE: usize = 50;
pub const UNKNOWN_TITLE: &str = "Unknown Title";
const METADATA_PARTS: &str = "snippet,contentDetails,statistics";

/// Descriptive fields rendered into each transcript document.
///
/// Counts stay strings because that is how the API reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub channel_title: String,
    /// ISO-8601 duration such as `PT1H2M3S`.
    pub duration: String,
    pub view_count: String,
    pub like_count: String,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_owned(),
            description: String::new(),
            published_at: String::new(),
            channel_title: String::new(),
            duration: String::new(),
            view_count: "0".to_owned(),
            like_count: "0".to_owned(),
        }
    }
}

pub type MetadataMap = HashMap<String, VideoMetadata>;

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    channel_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

impl From<VideoItem> for VideoMetadata {
    fn from(item: VideoItem) -> Self {
        let defaults = VideoMetadata::default();
        Self {
            title: item.snippet.title.unwrap_or(defaults.title),
            description: item.snippet.description.unwrap_or(defaults.description),
            published_at: item.snippet.published_at.unwrap_or(defaults.published_at),
            channel_title: item.snippet.channel_title.unwrap_or(defaults.channel_title),
            duration: item.content_details.duration.unwrap_or(defaults.duration),
            view_count: item.statistics.view_count.unwrap_or(defaults.view_count),
            like_count: item.statistics.like_count.unwrap_or(defaults.like_count),
        }
    }
}

impl<T: ApiTransport> DataApi<T> {
    /// Fetches metadata for `video_ids`, one request per batch of
    /// [`BATCH_SIZE`]. A failed batch aborts the whole fetch.
    pub fn fetch_metadata(&self, video_ids: &[String]) -> Result<MetadataMap> {
        let mut metadata = MetadataMap::with_capacity(video_ids.len());

        for (index, batch) in video_ids.chunks(BATCH_SIZE).enumerate() {
            let ids = batch.join(",");
            debug!("metadata batch {} ({} ids)", index + 1, batch.len());

            let response: VideoListResponse =
                self.get_as("videos", &[("part", METADATA_PARTS), ("id", ids.as_str())])?;

            for item in response.items {
                if item.id.is_empty() {
                    continue;
                }
                let video_id = item.id.clone();
                metadata.insert(video_id, VideoMetadata::from(item));
            }
        }

        info!(
            "Retrieved metadata for {} of {} videos",
            metadata.len(),
            video_ids.len()
        );
        Ok(metadata)
    }
}
