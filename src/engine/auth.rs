// Login against the vendor API: one attempt, no retry, no state mutation.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::transport::traits::Transport;

#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    help: Option<String>,
}

/// The server reports success as `1`, occasionally as `true`.
pub(crate) fn is_success(flag: &Value) -> bool {
    flag.as_i64() == Some(1) || flag.as_bool() == Some(true)
}

pub struct Authenticator;

impl Authenticator {
    /// POST `/login` and return the issued sid.
    pub async fn authenticate(
        transport: &dyn Transport,
        login: &str,
        password: &str,
    ) -> Result<String> {
        let reply = transport
            .post_form("/login", &[("username", login), ("password", password)])
            .await?;
        let data: LoginReply = reply.json()?;

        if !is_success(&data.success) {
            return Err(ClientError::AuthenticationFailure {
                code: data.error_code.unwrap_or_else(|| "unknown".to_string()),
                message: data.help.unwrap_or_default(),
            });
        }

        match data.sid {
            Some(sid) if !sid.is_empty() => {
                debug!("login accepted for user={}", login);
                Ok(sid)
            }
            _ => Err(ClientError::AuthenticationFailure {
                code: "missing_sid".to_string(),
                message: "login reply carried no session id".to_string(),
            }),
        }
    }
}
