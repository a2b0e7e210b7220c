use thiserror::Error;

/// Network-level failure. HTTP 4xx/5xx are not errors, they are results;
/// only transport failures (DNS, refused connection, timeout, cancellation)
/// appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("scan cancelled")]
    Cancelled,
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("probe '{probe}' failed: {message}")]
    Probe {
        probe: &'static str,
        message: String,
    },

    #[error("aggregation failed: {0}")]
    Aggregation(String),
}
