#![forbid(unsafe_code)]

//! Channel-to-transcript pipeline: resolve the channel, enumerate its
//! uploads, fetch metadata in bulk, then fetch and save each transcript in
//! order.
//!
//! Every video ends in exactly one of three states. It is skipped when its
//! document already exists (and skipping is enabled), downloaded when a
//! transcript was saved, or failed when no transcript could be fetched.
//! Failures never stop the loop; errors before the loop and filesystem
//! errors while saving abort the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::Serialize;

use crate::api::{ApiTransport, DataApi, pause};
use crate::error::{CollectorError, Result};
use crate::metadata::{MetadataMap, VideoMetadata};
use crate::storage::{document_path, save_transcript};
use crate::transcript::{TranscriptProvider, TranscriptUnavailable, fetch_transcript};

pub const DEFAULT_OUTPUT_DIR: &str = "transcriptions";
pub const DEFAULT_TRANSCRIPT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    /// Upper bound on enumerated videos; `None` processes the whole channel.
    pub max_videos: Option<usize>,
    pub languages: Option<Vec<String>>,
    pub skip_existing: bool,
    /// Pause after each transcript fetch, successful or not.
    pub transcript_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_videos: None,
            languages: None,
            skip_existing: true,
            transcript_delay: DEFAULT_TRANSCRIPT_DELAY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub total_videos: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_videos: Vec<String>,
}

/// Terminal state of one video within a run.
#[derive(Debug)]
pub enum VideoOutcome {
    Skipped,
    Downloaded(PathBuf),
    Failed(TranscriptUnavailable),
}

impl RunStatistics {
    fn new(total_videos: usize) -> Self {
        Self {
            total_videos,
            ..Self::default()
        }
    }

    pub fn record(&mut self, video_id: &str, outcome: &VideoOutcome) {
        match outcome {
            VideoOutcome::Skipped => self.skipped += 1,
            VideoOutcome::Downloaded(_) => self.downloaded += 1,
            VideoOutcome::Failed(_) => {
                self.failed += 1;
                self.failed_videos.push(video_id.to_owned());
            }
        }
    }
}

/// Everything a caller needs to report on a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub channel_id: String,
    pub statistics: RunStatistics,
    /// `(video id, title)` for each failed video, in failure order. The title
    /// falls back to the id when no metadata was returned.
    pub failed_titles: Vec<(String, String)>,
}

fn display_title<'a>(video_id: &'a str, metadata: Option<&'a VideoMetadata>) -> &'a str {
    metadata.map_or(video_id, |meta| meta.title.as_str())
}

/// Handles one video: skip, or fetch + pause + save.
pub fn process_video<P>(
    video_id: &str,
    metadata: Option<&VideoMetadata>,
    provider: &P,
    options: &RunOptions,
) -> Result<VideoOutcome>
where
    P: TranscriptProvider + ?Sized,
{
    let path = document_path(&options.output_dir, video_id);
    if options.skip_existing && path.exists() {
        return Ok(VideoOutcome::Skipped);
    }

    let transcript = fetch_transcript(provider, video_id, options.languages.as_deref());
    pause(options.transcript_delay);

    match transcript {
        Ok(text) => {
            let saved = save_transcript(video_id, &text, &options.output_dir, metadata)?;
            Ok(VideoOutcome::Downloaded(saved))
        }
        Err(reason) => Ok(VideoOutcome::Failed(reason)),
    }
}

/// Runs the pipeline over already enumerated `video_ids`.
pub fn collect_videos<P>(
    video_ids: &[String],
    metadata: &MetadataMap,
    provider: &P,
    options: &RunOptions,
) -> Result<(RunStatistics, Vec<(String, String)>)>
where
    P: TranscriptProvider + ?Sized,
{
    let total = video_ids.len();
    let mut stats = RunStatistics::new(total);
    let mut failed_titles = Vec::new();

    for (index, video_id) in video_ids.iter().enumerate() {
        let meta = metadata.get(video_id);
        let title = display_title(video_id, meta);
        let outcome = process_video(video_id, meta, provider, options)?;

        match &outcome {
            VideoOutcome::Skipped => {
                info!("[{}/{total}] Skipping {title} ({video_id}): already saved", index + 1)
            }
            VideoOutcome::Downloaded(path) => {
                info!("[{}/{total}] Saved {title} to {}", index + 1, path.display())
            }
            VideoOutcome::Failed(_) => {
                info!("[{}/{total}] No transcript for {title} ({video_id})", index + 1);
                failed_titles.push((video_id.clone(), title.to_owned()));
            }
        }
        stats.record(video_id, &outcome);
    }

    Ok((stats, failed_titles))
}

fn ensure_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|err| CollectorError::io(path, err))
}

/// Collects every transcript of `channel_ref` into `options.output_dir`.
pub fn run<T, P>(
    api: &DataApi<T>,
    provider: &P,
    channel_ref: &str,
    options: &RunOptions,
) -> Result<RunReport>
where
    T: ApiTransport,
    P: TranscriptProvider + ?Sized,
{
    ensure_output_dir(&options.output_dir)?;

    let channel_id = api.resolve_channel_id(channel_ref)?;
    info!("Fetching video ids for channel {channel_id}");
    let video_ids = api.list_video_ids(&channel_id, options.max_videos)?;
    info!("Found {} videos", video_ids.len());

    info!("Fetching video metadata");
    let metadata = api.fetch_metadata(&video_ids)?;

    let (statistics, failed_titles) = collect_videos(&video_ids, &metadata, provider, options)?;

    Ok(RunReport {
        channel_id,
        statistics,
        failed_titles,
    })
}
