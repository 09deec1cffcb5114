#![forbid(unsafe_code)]

//! Command-line helper that downloads the transcript of every video a channel
//! has published and writes one Markdown file per video.
//!
//! Configuration comes from flags first, then the environment, then a `.env`
//! file in the working directory. Re-running against the same output directory
//! only fetches videos that do not have a document yet.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::warn;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use yt_transcripts::{RunReport, RunStatistics};
use yt_transcripts::api::{DataApi, UreqTransport};
use yt_transcripts::config::{CollectorConfig, ConfigOverrides, resolve_collector_config};
use yt_transcripts::transcript::YouTubeTranscripts;

#[derive(Debug, Parser)]
#[command(
    name = "collect_transcripts",
    version,
    about = "Download transcripts for every video of a YouTube channel"
)]
struct Cli {
    /// Channel id, @handle, username or channel URL. Defaults to
    /// YOUTUBE_CHANNEL_ID.
    channel: Option<String>,

    /// Directory that receives one <video_id>.md per video.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Only process the newest N videos.
    #[arg(long, value_name = "N")]
    max_videos: Option<usize>,

    /// Preferred transcript language, in order. Repeat or comma-separate.
    #[arg(long = "language", value_name = "CODE", value_delimiter = ',')]
    languages: Vec<String>,

    /// Fetch transcripts again even when a document already exists.
    #[arg(long)]
    no_skip_existing: bool,

    /// Seconds to wait after each Data API request.
    #[arg(long, value_name = "SECS")]
    api_delay: Option<f64>,

    /// Seconds to wait after each transcript fetch.
    #[arg(long, value_name = "SECS")]
    transcript_delay: Option<f64>,

    /// Read settings from this file instead of ./.env.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Also write the run statistics as JSON to this path.
    #[arg(long, value_name = "PATH")]
    summary_file: Option<PathBuf>,

    /// Log every request.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            channel: self.channel.clone(),
            output_dir: self.output_dir.clone(),
            max_videos: self.max_videos,
            languages: (!self.languages.is_empty()).then(|| self.languages.clone()),
            api_delay: self.api_delay,
            transcript_delay: self.transcript_delay,
            skip_existing: self.no_skip_existing.then_some(false),
            env_path: self.env_file.clone(),
        }
    }
}

#[derive(Serialize)]
struct FailedVideo<'a> {
    video_id: &'a str,
    title: &'a str,
}

/// Run statistics plus the titles of failed videos.
#[derive(Serialize)]
struct RunSummary<'a> {
    channel_id: &'a str,
    #[serde(flatten)]
    statistics: &'a RunStatistics,
    failed_titles: Vec<FailedVideo<'a>>,
}

impl<'a> From<&'a RunReport> for RunSummary<'a> {
    fn from(report: &'a RunReport) -> Self {
        Self {
            channel_id: &report.channel_id,
            statistics: &report.statistics,
            failed_titles: report
                .failed_titles
                .iter()
                .map(|(video_id, title)| FailedVideo { video_id, title })
                .collect(),
        }
    }
}

/// Writes the summary next to its final path and renames it into place so a
/// reader never sees a half-written file.
fn write_summary(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let payload = serde_json::to_vec_pretty(&RunSummary::from(report))
        .context("serializing run summary")?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload).with_context(|| format!("writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

fn failed_lines(report: &RunReport) -> Vec<String> {
    report
        .failed_titles
        .iter()
        .map(|(video_id, title)| format!("{title} ({video_id})"))
        .collect()
}

fn print_banner(config: &CollectorConfig) {
    println!("===================================");
    println!("YouTube Transcript Collector");
    println!("===================================");
    println!("Channel: {}", config.channel);
    println!("Output directory: {}", config.output_dir.display());
    if let Some(limit) = config.max_videos {
        println!("Max videos: {limit}");
    }
    if let Some(languages) = &config.languages {
        println!("Languages: {}", languages.join(", "));
    }
    println!();
}

fn print_summary(report: &RunReport) {
    let stats = &report.statistics;
    println!();
    println!("===================================");
    println!("Download summary");
    println!("===================================");
    println!("Total videos: {:>6}", stats.total_videos);
    println!("Downloaded:   {:>6}", stats.downloaded);
    println!("Skipped:      {:>6}", stats.skipped);
    println!("Failed:       {:>6}", stats.failed);

    let failed = failed_lines(report);
    if !failed.is_empty() {
        println!();
        println!("Failed videos:");
        for line in failed {
            println!("  - {line}");
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_collector_config(cli.overrides()).context("loading configuration")?;
    let api = DataApi::new(UreqTransport::new(), config.api_key.clone()).with_delay(config.api_delay);
    let transcripts = YouTubeTranscripts::new()?;
    let options = config.run_options();

    print_banner(&config);

    let report = yt_transcripts::run(&api, &transcripts, &config.channel, &options)
        .with_context(|| format!("collecting transcripts for {}", config.channel))?;

    print_summary(&report);

    if let Some(path) = &cli.summary_file
        && let Err(err) = write_summary(path, &report)
    {
        warn!("could not write summary file {}: {err:#}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    fn sample_report() -> RunReport {
        RunReport {
            channel_id: "UC-lHJZR3Gqxm24_Vd_AJ5Yw".into(),
            statistics: RunStatistics {
                total_videos: 4,
                downloaded: 2,
                skipped: 1,
                failed: 1,
                failed_videos: vec!["xyz".into()],
            },
            failed_titles: vec![("xyz".into(), "Live stream".into())],
        }
    }

    #[test]
    fn cli_defaults_leave_config_untouched() {
        let cli = Cli::try_parse_from(["collect_transcripts"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.channel.is_none());
        assert!(overrides.languages.is_none());
        assert!(overrides.skip_existing.is_none());
        assert!(overrides.max_videos.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn cli_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "collect_transcripts",
            "https://www.youtube.com/@creator",
            "--output-dir",
            "/srv/transcripts",
            "--max-videos",
            "10",
            "--language",
            "en,es",
            "--language",
            "de",
            "--no-skip-existing",
            "--api-delay",
            "0.5",
            "--transcript-delay=0",
            "--env-file",
            "custom.env",
        ])
        .unwrap();
        let overrides = cli.overrides();

        assert_eq!(
            overrides.channel.as_deref(),
            Some("https://www.youtube.com/@creator")
        );
        assert_eq!(overrides.output_dir, Some(PathBuf::from("/srv/transcripts")));
        assert_eq!(overrides.max_videos, Some(10));
        assert_eq!(
            overrides.languages,
            Some(vec!["en".to_string(), "es".to_string(), "de".to_string()])
        );
        assert_eq!(overrides.skip_existing, Some(false));
        assert_eq!(overrides.api_delay, Some(0.5));
        assert_eq!(overrides.transcript_delay, Some(0.0));
        assert_eq!(overrides.env_path, Some(PathBuf::from("custom.env")));
    }

    #[test]
    fn cli_rejects_non_numeric_limits() {
        assert!(Cli::try_parse_from(["collect_transcripts", "--max-videos", "all"]).is_err());
    }

    #[test]
    fn failed_lines_show_title_and_id() {
        assert_eq!(failed_lines(&sample_report()), vec!["Live stream (xyz)"]);
    }

    #[test]
    fn summary_file_is_written_atomically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("run.json");

        write_summary(&path, &sample_report()).unwrap();

        assert!(!path.with_extension("tmp").exists());
        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["total_videos"], 4);
        assert_eq!(value["downloaded"], 2);
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["channel_id"], "UC-lHJZR3Gqxm24_Vd_AJ5Yw");
        assert_eq!(value["failed_videos"], serde_json::json!(["xyz"]));
        assert_eq!(value["failed_titles"][0]["video_id"], "xyz");
        assert_eq!(value["failed_titles"][0]["title"], "Live stream");
    }
}
