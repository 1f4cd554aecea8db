use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{header, Client, Proxy, RequestBuilder, Response};
use tracing::{debug, warn};

use super::traits::{ByteStream, Reply, Transport};
use crate::config::ConnectionOptions;

/// `reqwest` transport for the vendor API.
///
/// Peer verification is disabled because the servers ship self-signed
/// certificates.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(options: &ConnectionOptions, timeout: Duration) -> Result<Self> {
        Self::with_base_url(options.base_url(), options.proxy.as_deref(), timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout);
        if let Some(proxy_url) = proxy {
            debug!("using proxy: {}", proxy_url);
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| anyhow!("invalid proxy url {}: {}", proxy_url, e))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build()?;

        debug!("http transport created, base url: {}", base_url);
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, req: RequestBuilder, path: &str) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!("http {} status={}", path, status.as_u16());
        if !status.is_success() {
            warn!("http {} failed status={}", path, status.as_u16());
            return Err(anyhow!("{} failed: HTTP {}", path, status.as_u16()));
        }
        Ok(resp)
    }

    async fn into_reply(resp: Response) -> Result<Reply> {
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?;
        Ok(Reply::new(content_type, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Reply> {
        let req = self.client.post(self.url(path)).form(form);
        let resp = self.send(req, path).await?;
        Self::into_reply(resp).await
    }

    async fn post_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<Reply> {
        let req = self.client.post(self.url(path)).query(query).json(body);
        let resp = self.send(req, path).await?;
        Self::into_reply(resp).await
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Reply> {
        let req = self.client.get(self.url(path)).query(query);
        let resp = self.send(req, path).await?;
        Self::into_reply(resp).await
    }

    async fn get_stream(&self, path: &str, query: &[(&str, &str)]) -> Result<ByteStream> {
        let req = self.client.get(self.url(path)).query(query);
        let resp = self.send(req, path).await?;
        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from));
        Ok(stream.boxed())
    }
}
