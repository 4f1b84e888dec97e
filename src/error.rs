use thiserror::Error;

/// Faults raised by a [`Transport`](crate::transport::Transport) while talking to the device.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("timed out after {0:?} waiting for the device prompt")]
    Timeout(std::time::Duration),

    #[error("not connected to the device")]
    Disconnected,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The device answered with one of the configured error banners.
    #[error("device reported an error: {0}")]
    ErrorBanner(String),

    #[error("login failed: {0}")]
    Auth(String),
}

impl TransportError {
    /// Faults after which the session is unusable and must be re-established.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Disconnected | TransportError::Io(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Transport(TransportError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("device rejected control of {key}: {response:?}")]
    Rejected { key: String, response: String },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("no snapshot has been produced yet")]
    NotReady,

    #[error("failed to format command template {template:?}: {reason}")]
    Template { template: String, reason: String },
}

impl From<TransportError> for BridgeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Auth(msg) => BridgeError::Auth(msg),
            other => BridgeError::Transport(other),
        }
    }
}
