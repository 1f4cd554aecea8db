// In-memory transport answering vendor endpoints from a script.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;

use trassir_client::transport::traits::{ByteStream, Reply, Transport};
use trassir_client::{ConnectionOptions, SessionEngine, SessionTimings};

#[derive(Clone)]
pub enum Scripted {
    Json(Value),
    Raw { content_type: String, body: Vec<u8> },
    Chunks(Vec<Vec<u8>>),
    Fail(String),
    Delayed(Duration, Box<Scripted>),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    defaults: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport for a server that accepts the login and serves metadata.
    pub fn healthy_server(sid: &str) -> Arc<Self> {
        let transport = Self::new();
        transport.set_default("/login", Scripted::Json(serde_json::json!({"success": 1, "sid": sid})));
        transport.set_default("/settings/", Scripted::Json(serde_json::json!({"name": "nvr-1"})));
        transport.set_default(
            "/channels/",
            Scripted::Json(serde_json::json!({"channels": [{"guid": "c1", "name": "Gate"}]})),
        );
        transport.set_default("/health", Scripted::Json(serde_json::json!({"success": 1})));
        transport
    }

    /// Answer the next call to `path` with `response`, ahead of the default.
    pub fn push(&self, path: &str, response: Scripted) {
        self.queued
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn set_default(&self, path: &str, response: Scripted) {
        self.defaults.lock().insert(path.to_string(), response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.path == path).count()
    }

    pub fn last_call_to(&self, path: &str) -> Option<Call> {
        self.calls.lock().iter().rev().find(|c| c.path == path).cloned()
    }

    async fn respond(
        &self,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Scripted> {
        self.calls.lock().push(Call {
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
        });

        let next = self
            .queued
            .lock()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        let mut scripted = match next {
            Some(s) => s,
            None => self
                .defaults
                .lock()
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("no scripted response for {}", path))?,
        };

        while let Scripted::Delayed(delay, inner) = scripted {
            tokio::time::sleep(delay).await;
            scripted = *inner;
        }
        if let Scripted::Fail(msg) = scripted {
            return Err(anyhow!(msg));
        }
        Ok(scripted)
    }

    fn into_reply(scripted: Scripted) -> Reply {
        match scripted {
            Scripted::Json(v) => Reply::new(
                Some("application/json".to_string()),
                Bytes::from(serde_json::to_vec(&v).unwrap()),
            ),
            Scripted::Raw { content_type, body } => Reply::new(Some(content_type), Bytes::from(body)),
            Scripted::Chunks(chunks) => Reply::new(None, Bytes::from(chunks.concat())),
            Scripted::Fail(_) | Scripted::Delayed(..) => unreachable!("resolved in respond"),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Reply> {
        let scripted = self.respond(path, form, None).await?;
        Ok(Self::into_reply(scripted))
    }

    async fn post_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<Reply> {
        let scripted = self.respond(path, query, Some(body)).await?;
        Ok(Self::into_reply(scripted))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Reply> {
        let scripted = self.respond(path, query, None).await?;
        Ok(Self::into_reply(scripted))
    }

    async fn get_stream(&self, path: &str, query: &[(&str, &str)]) -> Result<ByteStream> {
        let chunks = match self.respond(path, query, None).await? {
            Scripted::Chunks(chunks) => chunks,
            other => vec![Self::into_reply(other).body.to_vec()],
        };
        let stream = futures_util::stream::iter(
            chunks.into_iter().map(|c| Ok::<_, anyhow::Error>(Bytes::from(c))),
        );
        Ok(stream.boxed())
    }
}

pub fn test_options() -> ConnectionOptions {
    ConnectionOptions::new("h", 443, 554, "admin", "secret")
}

pub fn engine_with(transport: Arc<ScriptedTransport>) -> Arc<SessionEngine> {
    SessionEngine::with_transport(test_options(), SessionTimings::default(), transport)
}

/// Let virtual time pass so spawned timers and retries run.
pub async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}
