use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Seconds between two session probes once the health timer is armed.
pub const HEALTH_INTERVAL_SECS: u64 = 20;

/// Seconds between two refreshes of the settings or the channel list.
pub const METADATA_REFRESH_SECS: u64 = 300;

/// Fixed backoff in seconds before a failed authentication is retried.
pub const AUTH_RETRY_DELAY_SECS: u64 = 10;

/// Per-request timeout applied by the HTTP transport.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Error code the server puts in a probe reply once the sid is gone.
pub const NO_SESSION_ERROR_CODE: &str = "no session";

/// Audio codec requested alongside every live stream.
pub const STREAM_AUDIO_CODEC: &str = "pcmu";

/// Stable key identifying one logical server connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to reach and log into one server.
///
/// Accepts both snake_case keys and the camelCase `httpPort` / `rtspPort`
/// spelling used by server lists.
#[derive(Clone, Deserialize)]
pub struct ConnectionOptions {
    pub host: String,
    #[serde(alias = "httpPort")]
    pub http_port: u16,
    #[serde(alias = "rtspPort")]
    pub rtsp_port: u16,
    pub login: String,
    pub password: String,
    /// HTTP proxy all requests are tunnelled through.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Explicit identity; derived from host, port and login when absent.
    #[serde(default)]
    pub id: Option<String>,
}

impl ConnectionOptions {
    pub fn new(
        host: impl Into<String>,
        http_port: u16,
        rtsp_port: u16,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            http_port,
            rtsp_port,
            login: login.into(),
            password: password.into(),
            proxy: None,
            id: None,
        }
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Identity used to deduplicate clients. Deterministic across restarts.
    pub fn identity(&self) -> ConnectionId {
        match &self.id {
            Some(id) => ConnectionId::new(id.clone()),
            None => ConnectionId::new(format!(
                "{}@{}:{}",
                self.login, self.host, self.http_port
            )),
        }
    }

    /// Base URL of the vendor HTTP API.
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.http_port)
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("host", &self.host)
            .field("http_port", &self.http_port)
            .field("rtsp_port", &self.rtsp_port)
            .field("login", &self.login)
            .field("proxy", &self.proxy)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Schedule of the engine's background work.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionTimings {
    pub health_interval_secs: u64,
    pub settings_refresh_secs: u64,
    pub channels_refresh_secs: u64,
    pub retry_delay_secs: u64,
    pub request_timeout_secs: u64,
}

impl SessionTimings {
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn settings_refresh(&self) -> Duration {
        Duration::from_secs(self.settings_refresh_secs)
    }

    pub fn channels_refresh(&self) -> Duration {
        Duration::from_secs(self.channels_refresh_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            health_interval_secs: HEALTH_INTERVAL_SECS,
            settings_refresh_secs: METADATA_REFRESH_SECS,
            channels_refresh_secs: METADATA_REFRESH_SECS,
            retry_delay_secs: AUTH_RETRY_DELAY_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}
