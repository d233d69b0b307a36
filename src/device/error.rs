use thiserror::Error;

/// Failure talking to a terminal.
///
/// A terminal answering "unknown command" is *not* an error; see
/// [`DeviceReply::UnknownCommand`](super::protocol::DeviceReply::UnknownCommand).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Rejected before any network I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Timeout, refused connection, DNS failure.
    #[error("connection to {address} failed: {details}")]
    ConnectionFailed { address: String, details: String },

    /// The terminal answered, but not with a usable reply. `details` holds the raw body.
    #[error("device returned {status}: {details}")]
    DeviceError { status: u16, details: String },
}

impl ProtocolError {
    /// Code used in the terminal-style error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::InvalidRequest(_) => "missing_ip",
            ProtocolError::ConnectionFailed { .. } => "connection_failed",
            ProtocolError::DeviceError { .. } => "device_error",
        }
    }

    pub fn details(&self) -> String {
        match self {
            ProtocolError::InvalidRequest(msg) => msg.clone(),
            ProtocolError::ConnectionFailed { details, .. } => details.clone(),
            ProtocolError::DeviceError { details, .. } => details.clone(),
        }
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
