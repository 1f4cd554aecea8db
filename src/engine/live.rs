// Live data operations: screenshots, thumbnails and playback URLs, all behind the request gate.

use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use super::session::SessionEngine;
use crate::config::STREAM_AUDIO_CODEC;
use crate::error::{ClientError, Result};
use crate::media::container::VideoContainer;
use crate::media::image::{detect_image, ImageFormat};
use crate::transport::traits::Reply;

#[derive(Debug, Deserialize)]
struct VideoTokenReply {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Image by content type; untyped payloads are sniffed.
fn is_image_payload(reply: &Reply) -> bool {
    if reply.is_image() {
        return true;
    }
    match reply.content_type.as_deref() {
        None | Some("application/octet-stream") => {
            detect_image(&reply.body) != ImageFormat::Unknown
        }
        Some(_) => false,
    }
}

impl SessionEngine {
    /// Still image of a channel, falling back to its thumbnail when the
    /// server answers with something other than an image.
    pub async fn get_screenshot(&self, server: &str, channel: &str) -> Result<Bytes> {
        let token = self.gate()?;
        let reply = self
            .transport()
            .get(
                "/screenshot",
                &[("sid", token.as_str()), ("server", server), ("channel", channel)],
            )
            .await?;

        if is_image_payload(&reply) {
            return Ok(reply.body);
        }

        debug!(
            "screenshot for channel={} returned {:?}, falling back to thumbnail",
            channel, reply.content_type
        );
        self.get_thumbnail(server, channel).await
    }

    pub async fn get_thumbnail(&self, server: &str, channel: &str) -> Result<Bytes> {
        let token = self.gate()?;
        let reply = self
            .transport()
            .get(
                "/thumbnail",
                &[("sid", token.as_str()), ("server", server), ("channel", channel)],
            )
            .await?;
        Ok(reply.body)
    }

    /// Resolve a playback URL for a channel stream.
    ///
    /// `container` must name one of [`VideoContainer`]; anything else fails
    /// with [`ClientError::UnsupportedContainer`] before a request is made.
    pub async fn get_stream_url(
        &self,
        server: &str,
        channel: &str,
        container: &str,
        stream: &str,
    ) -> Result<String> {
        let token = self.gate()?;
        let container: VideoContainer = container.parse()?;
        self.resolve_stream_url(&token, server, channel, container, stream)
            .await
    }

    async fn resolve_stream_url(
        &self,
        token: &str,
        server: &str,
        channel: &str,
        container: VideoContainer,
        stream: &str,
    ) -> Result<String> {
        let reply = self
            .transport()
            .get(
                "/get_video",
                &[
                    ("sid", token),
                    ("server", server),
                    ("channel", channel),
                    ("stream", stream),
                    ("container", container.as_str()),
                    ("audio", STREAM_AUDIO_CODEC),
                ],
            )
            .await?;
        let data: VideoTokenReply = reply.json()?;

        let video_token = match data.token {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(ClientError::Rejected {
                    operation: "get_video",
                    code: data.error_code.unwrap_or_else(|| "missing token".to_string()),
                })
            }
        };

        let options = self.options();
        Ok(container.playback_url(
            &options.host,
            options.http_port,
            options.rtsp_port,
            &video_token,
        ))
    }
}
