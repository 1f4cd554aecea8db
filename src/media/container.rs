use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// Containers the server can wrap a live stream in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    /// HTTP adaptive streaming, served from the API port.
    Hls,
    /// Raw RTSP transport, served from the RTSP port.
    Rtsp,
}

impl VideoContainer {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoContainer::Hls => "hls",
            VideoContainer::Rtsp => "rtsp",
        }
    }

    /// Build the playback URL for a token issued by `/get_video`.
    pub fn playback_url(self, host: &str, http_port: u16, rtsp_port: u16, token: &str) -> String {
        match self {
            VideoContainer::Hls => format!("https://{}:{}/hls/{}/master.m3u8", host, http_port, token),
            VideoContainer::Rtsp => format!("rtsp://{}:{}/{}", host, rtsp_port, token),
        }
    }
}

impl FromStr for VideoContainer {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hls" => Ok(VideoContainer::Hls),
            "rtsp" => Ok(VideoContainer::Rtsp),
            _ => Err(ClientError::UnsupportedContainer(s.to_string())),
        }
    }
}

impl fmt::Display for VideoContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
