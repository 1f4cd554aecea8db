use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::de::DeserializeOwned;

/// Byte stream of a large download, yielded chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Reply {
    pub fn new(content_type: Option<String>, body: Bytes) -> Self {
        Self { content_type, body }
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Whether the payload is an image (any `image/*` content type).
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Reply>;
    async fn post_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<Reply>;
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Reply>;
    async fn get_stream(&self, path: &str, query: &[(&str, &str)]) -> Result<ByteStream>;
}
