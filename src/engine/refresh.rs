// Metadata fetches: server settings and the channel list.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::transport::traits::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Settings,
    Channels,
}

impl MetadataKind {
    pub fn path(self) -> &'static str {
        match self {
            MetadataKind::Settings => "/settings/",
            MetadataKind::Channels => "/channels/",
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataKind::Settings => f.write_str("settings"),
            MetadataKind::Channels => f.write_str("channels"),
        }
    }
}

pub struct MetadataRefresher;

impl MetadataRefresher {
    /// Fetch one metadata set. The caller decides where the snapshot goes.
    pub async fn fetch(
        transport: &dyn Transport,
        kind: MetadataKind,
        token: &str,
    ) -> Result<Map<String, Value>> {
        let reply = transport.post_form(kind.path(), &[("sid", token)]).await?;
        Ok(reply.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_paths() {
        assert_eq!(MetadataKind::Settings.path(), "/settings/");
        assert_eq!(MetadataKind::Channels.path(), "/channels/");
        assert_eq!(MetadataKind::Channels.to_string(), "channels");
    }
}
