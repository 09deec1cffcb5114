#![forbid(unsafe_code)]

//! Collects the transcript of every video a YouTube channel has published
//! and stores each one as a Markdown document.

pub mod api;
pub mod channel;
pub mod collector;
pub mod config;
pub mod error;
pub mod metadata;
pub mod storage;
pub mod transcript;
pub mod videos;

pub use collector::{RunOptions, RunReport, RunStatistics, run};
pub use error::CollectorError;
