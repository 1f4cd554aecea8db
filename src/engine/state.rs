// Session state and the request gate every data operation passes through.

use serde_json::{Map, Value};

use crate::error::{ClientError, Result};

/// Authentication phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Authenticating,
    Authenticated,
    AuthFailed,
}

impl Phase {
    pub fn is_authenticated(self) -> bool {
        self == Phase::Authenticated
    }
}

pub struct SessionState {
    token: Option<String>,
    settings: Map<String, Value>,
    channels: Map<String, Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            token: None,
            settings: Map::new(),
            channels: Map::new(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replace the token after a successful login.
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    pub fn channels(&self) -> &Map<String, Value> {
        &self.channels
    }

    /// Overwrite the settings snapshot wholesale.
    pub fn replace_settings(&mut self, settings: Map<String, Value>) {
        self.settings = settings;
    }

    /// Overwrite the channel list wholesale.
    pub fn replace_channels(&mut self, channels: Map<String, Value>) {
        self.channels = channels;
    }

    /// The request gate: yields the token only while the session is usable.
    pub fn gate(&self, phase: Phase) -> Result<String> {
        match (phase, &self.token) {
            (Phase::Authenticated, Some(token)) => Ok(token.clone()),
            _ => Err(ClientError::NotAuthorized),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
