#![forbid(unsafe_code)]

//! One Markdown document per video, named after the video id.
//!
//! The path is a pure function of the id, which is what lets a later run
//! detect finished videos by checking for the file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CollectorError, Result};
use crate::metadata::VideoMetadata;

pub const DOCUMENT_EXTENSION: &str = "md";
const TRANSCRIPT_MARKER: &str = "---\n\n## Transcript\n\n";

pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub fn document_path(output_dir: &Path, video_id: &str) -> PathBuf {
    output_dir.join(format!("{video_id}.{DOCUMENT_EXTENSION}"))
}

/// Flattens a metadata value onto one line.
fn one_line(value: &str) -> String {
    value.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

/// Quotes every description line so no header line can read as the
/// transcript marker.
fn quote_block(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_owned()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the document body: title, id and URL, the non-empty metadata
/// fields, the quoted description, then the transcript after a horizontal
/// rule.
pub fn render_document(
    video_id: &str,
    transcript: &str,
    metadata: Option<&VideoMetadata>,
) -> String {
    let title = metadata.map_or_else(|| video_id.to_owned(), |meta| one_line(&meta.title));

    let mut doc = String::with_capacity(transcript.len() + 512);
    doc.push_str(&format!("# {title}\n\n"));
    doc.push_str(&format!("**Video ID:** {video_id}\n\n"));
    doc.push_str(&format!("**Video URL:** {}\n\n", video_url(video_id)));

    if let Some(meta) = metadata {
        let fields = [
            ("Channel", &meta.channel_title),
            ("Published", &meta.published_at),
            ("Duration", &meta.duration),
            ("Views", &meta.view_count),
        ];
        for (label, value) in fields {
            if !value.is_empty() {
                doc.push_str(&format!("**{label}:** {}\n\n", one_line(value)));
            }
        }
        if !meta.description.is_empty() {
            doc.push_str("## Description\n\n");
            doc.push_str(&quote_block(&meta.description));
            doc.push_str("\n\n");
        }
    }

    doc.push_str(TRANSCRIPT_MARKER);
    doc.push_str(transcript);
    doc
}

/// Writes the document for `video_id` into `output_dir`, creating the
/// directory when needed and replacing any existing file.
pub fn save_transcript(
    video_id: &str,
    transcript: &str,
    output_dir: &Path,
    metadata: Option<&VideoMetadata>,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|err| CollectorError::io(output_dir, err))?;

    let path = document_path(output_dir, video_id);
    let doc = render_document(video_id, transcript, metadata);
    fs::write(&path, doc).map_err(|err| CollectorError::io(&path, err))?;
    Ok(path)
}

/// Fields recovered from a saved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub title: String,
    pub video_id: String,
    pub transcript: String,
}

/// Reads back a document produced by [`render_document`]. Returns `None` when
/// the text does not have the expected layout.
pub fn parse_document(text: &str) -> Option<ParsedDocument> {
    let (header, transcript) = text.split_once(&format!("\n{TRANSCRIPT_MARKER}"))?;

    let mut lines = header.lines();
    let title = lines.next()?.strip_prefix("# ")?.to_owned();
    let video_id = lines
        .find_map(|line| line.strip_prefix("**Video ID:** "))?
        .to_owned();

    Some(ParsedDocument {
        title,
        video_id,
        transcript: transcript.to_owned(),
    })
}
