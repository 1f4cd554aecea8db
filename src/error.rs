use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the credentials or refused the login.
    #[error("authentication failed: {code} - {message}")]
    AuthenticationFailure { code: String, message: String },

    /// A gated operation was attempted without a usable session.
    #[error("not authorized")]
    NotAuthorized,

    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),

    #[error("unsupported video container: {0}")]
    UnsupportedContainer(String),

    /// The server refused to create an archive export task.
    #[error("archive export task rejected: {0}")]
    TaskSubmissionFailure(String),

    /// A data request came back with an error code instead of a payload.
    #[error("{operation} rejected by server: {code}")]
    Rejected { operation: &'static str, code: String },

    #[error("invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, ClientError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::AuthenticationFailure {
            code: "bad_creds".to_string(),
            message: "wrong password".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "authentication failed: bad_creds - wrong password"
        );
        assert_eq!(
            ClientError::UnsupportedContainer("flv".into()).to_string(),
            "unsupported video container: flv"
        );
    }

    #[test]
    fn test_error_from_anyhow_is_transport() {
        let err: ClientError = anyhow::anyhow!("connection refused").into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(!err.is_not_authorized());
        assert!(ClientError::NotAuthorized.is_not_authorized());
    }
}
