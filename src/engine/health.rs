// Session probe: classifies a `/health` reply as alive, lost or failed.

use serde_json::Value;

use crate::config::NO_SESSION_ERROR_CODE;
use crate::error::{ClientError, Result};
use crate::transport::traits::Transport;

#[derive(Debug)]
pub enum ProbeOutcome {
    Alive,
    /// The server no longer knows the sid.
    SessionLost,
    Failed(ClientError),
}

pub struct HealthMonitor;

impl HealthMonitor {
    pub async fn probe(transport: &dyn Transport, token: &str) -> Result<Value> {
        let reply = transport.post_form("/health", &[("sid", token)]).await?;
        Ok(reply.json()?)
    }

    pub fn classify(result: Result<Value>) -> ProbeOutcome {
        match result {
            Ok(data) => {
                let code = data.get("error_code").and_then(Value::as_str);
                if code == Some(NO_SESSION_ERROR_CODE) {
                    ProbeOutcome::SessionLost
                } else {
                    ProbeOutcome::Alive
                }
            }
            Err(e) => ProbeOutcome::Failed(e),
        }
    }
}
