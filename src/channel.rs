#![forbid(unsafe_code)]

//! Turns whatever the user typed (channel id, `@handle`, legacy username or a
//! channel URL) into a canonical `UC...` channel id.

use log::{debug, info};
use serde::Deserialize;

use crate::api::{ApiTransport, DataApi};
use crate::error::{CollectorError, Result};

const CHANNEL_ID_PREFIX: &str = "UC";
const CHANNEL_ID_LEN: usize = 24;

/// Body of `channels.list`, shared with the uploads lookup.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelItem {
    pub id: String,
    #[serde(default)]
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelContentDetails {
    #[serde(default)]
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RelatedPlaylists {
    pub uploads: Option<String>,
}

/// What a channel reference reduces to before any network lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Already canonical.
    Id(String),
    /// `@handle`, stored without the `@`.
    Handle(String),
    /// Legacy username or custom URL name.
    Name(String),
}

pub fn is_channel_id(value: &str) -> bool {
    value.starts_with(CHANNEL_ID_PREFIX) && value.len() == CHANNEL_ID_LEN
}

fn is_url(value: &str) -> bool {
    value.contains("youtube.com") || value.contains("youtu.be")
}

/// Returns the path segment following the last `marker`, without any query
/// string, fragment or trailing path.
fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = url.rsplit_once(marker)?;
    let end = rest.find(['?', '/', '#']).unwrap_or(rest.len());
    let segment = &rest[..end];
    (!segment.is_empty()).then_some(segment)
}

/// Classifies a raw channel reference. Pure; never touches the network.
pub fn parse_channel_ref(identifier: &str) -> ChannelRef {
    let identifier = identifier.trim();
    if is_channel_id(identifier) {
        return ChannelRef::Id(identifier.to_owned());
    }

    let mut value = identifier.to_owned();
    if is_url(identifier) {
        if let Some(segment) = segment_after(identifier, "/channel/") {
            if is_channel_id(segment) {
                return ChannelRef::Id(segment.to_owned());
            }
            value = segment.to_owned();
        } else if let Some(segment) = segment_after(identifier, "/c/")
            .or_else(|| segment_after(identifier, "/user/"))
        {
            value = segment.to_owned();
        } else if let Some(segment) = segment_after(identifier, "/@") {
            value = format!("@{segment}");
        }
    }

    match value.strip_prefix('@') {
        Some(handle) => ChannelRef::Handle(handle.to_owned()),
        None => ChannelRef::Name(value),
    }
}

impl<T: ApiTransport> DataApi<T> {
    /// Resolves `identifier` to a canonical channel id.
    ///
    /// Handles are looked up with `forHandle` first and `forUsername` second;
    /// plain names the other way round. Canonical ids return immediately.
    pub fn resolve_channel_id(&self, identifier: &str) -> Result<String> {
        let lookups = match parse_channel_ref(identifier) {
            ChannelRef::Id(id) => return Ok(id),
            ChannelRef::Handle(handle) => [("forHandle", handle.clone()), ("forUsername", handle)],
            ChannelRef::Name(name) => [("forUsername", name.clone()), ("forHandle", name)],
        };

        if lookups[0].1.is_empty() {
            return Err(CollectorError::NotFound(format!(
                "channel reference {identifier:?} is empty"
            )));
        }

        for (param, value) in &lookups {
            let response: ChannelListResponse =
                self.get_as("channels", &[("part", "id"), (*param, value.as_str())])?;
            if let Some(item) = response.items.into_iter().next() {
                info!("Resolved {identifier} to channel {}", item.id);
                return Ok(item.id);
            }
            debug!("no channel matched {param}={value}");
        }

        Err(CollectorError::NotFound(format!(
            "channel not found for identifier {identifier}; expected a channel id, @handle, username or channel URL"
        )))
    }
}
