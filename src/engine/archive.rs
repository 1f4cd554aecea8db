// Archive export: submit a server-side export task, then download its result in one buffer.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::auth::is_success;
use super::session::SessionEngine;
use crate::error::{ClientError, Result};

/// Body of `/jit-export-create-task`.
#[derive(Debug, Serialize, PartialEq)]
pub struct ExportRequest {
    pub resource_guid: String,
    /// Microseconds since the epoch, whole-second resolution.
    pub start_ts: i64,
    pub end_ts: i64,
    pub is_hardware: u8,
    pub prefer_substream: u8,
}

impl ExportRequest {
    pub fn new(channel: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(ClientError::TaskSubmissionFailure(format!(
                "empty time range {} .. {}",
                start, end
            )));
        }
        Ok(Self {
            resource_guid: channel.to_string(),
            start_ts: to_micros(start),
            end_ts: to_micros(end),
            is_hardware: 0,
            prefer_substream: 0,
        })
    }
}

/// Truncates to whole seconds before scaling.
fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp() * 1_000_000
}

#[derive(Debug, Deserialize)]
struct ExportTaskReply {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    task_id: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
}

impl SessionEngine {
    /// Export and download a recorded segment of `channel`.
    ///
    /// Each phase passes the request gate on its own; a session lost between
    /// them fails the download with `NotAuthorized`.
    pub async fn download_archive(
        &self,
        channel: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Bytes> {
        let task_id = self.create_export_task(channel, start, end).await?;
        self.download_export(&task_id).await
    }

    pub async fn create_export_task(
        &self,
        channel: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String> {
        let token = self.gate()?;
        let request = ExportRequest::new(channel, start, end)?;
        let body = serde_json::to_value(&request)?;

        let reply = self
            .transport()
            .post_json("/jit-export-create-task", &[("sid", token.as_str())], &body)
            .await?;
        let data: ExportTaskReply = reply.json()?;

        if !is_success(&data.success) {
            return Err(ClientError::TaskSubmissionFailure(
                data.error_code.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        let task_id = match data.task_id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ClientError::TaskSubmissionFailure(
                    "reply carried no task_id".to_string(),
                ))
            }
        };
        info!("export task {} created for channel={}", task_id, channel);
        Ok(task_id)
    }

    pub async fn download_export(&self, task_id: &str) -> Result<Bytes> {
        let token = self.gate()?;
        let mut stream = self
            .transport()
            .get_stream(
                "/jit-export-download",
                &[("sid", token.as_str()), ("task_id", task_id)],
            )
            .await?;

        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }

        debug!("export task {} downloaded ({} bytes)", task_id, buf.len());
        Ok(buf.freeze())
    }
}
