#![forbid(unsafe_code)]

//! Collector settings from CLI overrides, the process environment and a
//! `.env` file, in that order of precedence.

use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::collector::{DEFAULT_OUTPUT_DIR, RunOptions};
use crate::error::{CollectorError, Result};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_API_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_TRANSCRIPT_DELAY_SECS: f64 = 0.5;

pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const CHANNEL_VAR: &str = "YOUTUBE_CHANNEL_ID";
const OUTPUT_DIR_VAR: &str = "TRANSCRIPTS_DIR";
const MAX_VIDEOS_VAR: &str = "MAX_VIDEOS";
const LANGUAGES_VAR: &str = "TRANSCRIPT_LANGUAGES";
const API_DELAY_VAR: &str = "API_DELAY_SECS";
const TRANSCRIPT_DELAY_VAR: &str = "TRANSCRIPT_DELAY_SECS";
const SKIP_EXISTING_VAR: &str = "SKIP_EXISTING";

#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub api_key: String,
    pub channel: String,
    pub output_dir: PathBuf,
    pub max_videos: Option<usize>,
    pub languages: Option<Vec<String>>,
    pub api_delay: Duration,
    pub transcript_delay: Duration,
    pub skip_existing: bool,
}

impl CollectorConfig {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            output_dir: self.output_dir.clone(),
            max_videos: self.max_videos,
            languages: self.languages.clone(),
            skip_existing: self.skip_existing,
            transcript_delay: self.transcript_delay,
        }
    }
}

/// Values supplied on the command line. They win over the environment and
/// the `.env` file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub channel: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_videos: Option<usize>,
    pub languages: Option<Vec<String>>,
    pub api_delay: Option<f64>,
    pub transcript_delay: Option<f64>,
    pub skip_existing: Option<bool>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_collector_config(overrides: ConfigOverrides) -> Result<CollectorConfig> {
    let env_path = overrides
        .env_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(&env_path)?;
    build_config_with_overrides(&file_vars, process_env, overrides)
}

#[cfg(test)]
fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<CollectorConfig> {
    build_config_with_overrides(file_vars, env_lookup, ConfigOverrides::default())
}

fn build_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
) -> Result<CollectorConfig> {
    let lookup = |key: &str| lookup_value(key, file_vars, &env_lookup);

    let api_key = lookup(API_KEY_VAR).ok_or_else(|| missing(API_KEY_VAR))?;
    let channel = overrides
        .channel
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| lookup(CHANNEL_VAR))
        .ok_or_else(|| missing(CHANNEL_VAR))?;

    let output_dir = overrides
        .output_dir
        .or_else(|| lookup(OUTPUT_DIR_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let max_videos = match overrides.max_videos {
        Some(value) => Some(value),
        None => lookup(MAX_VIDEOS_VAR)
            .map(|value| parse_number::<usize>(MAX_VIDEOS_VAR, &value))
            .transpose()?,
    }
    .filter(|&limit| limit > 0);

    let languages = overrides
        .languages
        .filter(|codes| !codes.is_empty())
        .or_else(|| lookup(LANGUAGES_VAR).map(|value| split_languages(&value)))
        .filter(|codes| !codes.is_empty());

    let api_delay = resolve_delay(
        API_DELAY_VAR,
        overrides.api_delay,
        lookup(API_DELAY_VAR),
        DEFAULT_API_DELAY_SECS,
    )?;
    let transcript_delay = resolve_delay(
        TRANSCRIPT_DELAY_VAR,
        overrides.transcript_delay,
        lookup(TRANSCRIPT_DELAY_VAR),
        DEFAULT_TRANSCRIPT_DELAY_SECS,
    )?;

    let skip_existing = match overrides.skip_existing {
        Some(value) => value,
        None => lookup(SKIP_EXISTING_VAR)
            .map(|value| parse_bool(SKIP_EXISTING_VAR, &value))
            .transpose()?
            .unwrap_or(true),
    };

    Ok(CollectorConfig {
        api_key,
        channel,
        output_dir,
        max_videos,
        languages,
        api_delay,
        transcript_delay,
        skip_existing,
    })
}

fn missing(key: &str) -> CollectorError {
    CollectorError::Configuration(format!(
        "{key} not set; export it or add it to your {DEFAULT_ENV_PATH} file"
    ))
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .parse::<N>()
        .map_err(|_| CollectorError::Configuration(format!("{key} is not a valid number: {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CollectorError::Configuration(format!(
            "{key} must be true or false, got {value:?}"
        ))),
    }
}

fn resolve_delay(
    key: &str,
    override_secs: Option<f64>,
    raw: Option<String>,
    default_secs: f64,
) -> Result<Duration> {
    let secs = match (override_secs, raw) {
        (Some(secs), _) => secs,
        (None, Some(raw)) => parse_number::<f64>(key, &raw)?,
        (None, None) => default_secs,
    };
    if !secs.is_finite() || secs < 0.0 {
        return Err(CollectorError::Configuration(format!(
            "{key} must be a non-negative number of seconds, got {secs}"
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

pub fn split_languages(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok().as_deref().and_then(non_blank)
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| file_vars.get(key).and_then(|value| non_blank(value)))
}

/// Strips one pair of matching single or double quotes.
fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}

/// Splits a `KEY=value` line, or `export KEY=value`. Comments, blank lines
/// and lines without `=` yield `None`.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_owned(), unquote(value.trim()).to_owned()))
}

/// Reads a `.env` file into a map. A file that does not exist is treated as
/// empty.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(err) => {
            return Err(CollectorError::Configuration(format!(
                "reading {}: {err}",
                path.display()
            )));
        }
    };
    Ok(content.lines().filter_map(parse_env_line).collect())
}
