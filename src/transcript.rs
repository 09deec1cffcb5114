#![forbid(unsafe_code)]

//! Per-video transcript retrieval.
//!
//! A missing transcript is an expected, per-video outcome: every failure is
//! reported as [`TranscriptUnavailable`] and the caller records it and moves
//! on.

use log::warn;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::error::CollectorError;

/// One caption entry, in track order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLine {
    pub text: String,
}

#[derive(Debug, Clone, Error)]
#[error("no transcript for {video_id}: {reason}")]
pub struct TranscriptUnavailable {
    pub video_id: String,
    pub reason: String,
}

impl TranscriptUnavailable {
    pub fn new(video_id: &str, reason: impl Into<String>) -> Self {
        Self {
            video_id: video_id.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Source of caption tracks.
///
/// `languages` is an ordered preference list handed to the provider as is;
/// `None` asks for whichever track the video has.
pub trait TranscriptProvider {
    fn fetch_lines(
        &self,
        video_id: &str,
        languages: Option<&[String]>,
    ) -> Result<Vec<CaptionLine>, TranscriptUnavailable>;
}

/// Fetches the caption track for `video_id` and joins its lines with `\n`.
///
/// An empty track counts as unavailable so that "no transcript" never turns
/// into an empty document.
pub fn fetch_transcript<P>(
    provider: &P,
    video_id: &str,
    languages: Option<&[String]>,
) -> Result<String, TranscriptUnavailable>
where
    P: TranscriptProvider + ?Sized,
{
    let result = provider.fetch_lines(video_id, languages).and_then(|lines| {
        if lines.is_empty() {
            return Err(TranscriptUnavailable::new(video_id, "caption track is empty"));
        }
        Ok(join_lines(&lines))
    });

    if let Err(err) = &result {
        warn!("{err}");
    }
    result
}

pub fn join_lines(lines: &[CaptionLine]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// [`TranscriptProvider`] backed by `yt-transcript-rs`.
///
/// The library is async; requests are driven one at a time on a private
/// current-thread runtime. Without a language preference the video's track
/// list is fetched first and the first listed track is used, manual tracks
/// ahead of generated ones.
pub struct YouTubeTranscripts {
    api: YouTubeTranscriptApi,
    runtime: Runtime,
}

impl YouTubeTranscripts {
    pub fn new() -> Result<Self, CollectorError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| CollectorError::TranscriptClient(err.to_string()))?;
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|err| CollectorError::TranscriptClient(err.to_string()))?;
        Ok(Self { api, runtime })
    }

    fn first_available_language(&self, video_id: &str) -> Result<String, TranscriptUnavailable> {
        let tracks = self
            .runtime
            .block_on(self.api.list_transcripts(video_id))
            .map_err(|err| TranscriptUnavailable::new(video_id, err.to_string()))?;

        let first = tracks
            .transcripts()
            .next()
            .map(|track| track.language_code().to_owned());
        first.ok_or_else(|| TranscriptUnavailable::new(video_id, "video has no caption tracks"))
    }
}

impl TranscriptProvider for YouTubeTranscripts {
    fn fetch_lines(
        &self,
        video_id: &str,
        languages: Option<&[String]>,
    ) -> Result<Vec<CaptionLine>, TranscriptUnavailable> {
        let preferred: Vec<String> = match languages {
            Some(codes) if !codes.is_empty() => codes.to_vec(),
            _ => vec![self.first_available_language(video_id)?],
        };
        let preferred: Vec<&str> = preferred.iter().map(String::as_str).collect();

        let fetched = self
            .runtime
            .block_on(self.api.fetch_transcript(video_id, &preferred, false))
            .map_err(|err| TranscriptUnavailable::new(video_id, err.to_string()))?;

        Ok(fetched
            .snippets
            .into_iter()
            .map(|snippet| CaptionLine { text: snippet.text })
            .collect())
    }
}
