//! Error taxonomy for a single command exchange.
//!
//! Every [`ClientError`] is terminal for the run and maps to a process exit
//! code via [`ClientError::exit_code`].
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 1    | connection failure / invalid target       |
//! | 2    | envelope could not be built or serialized |
//! | 3    | timeout or no response                    |
//! | 4    | response frame violated the protocol      |

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The target could not be turned into a `ws://` / `wss://` URL.
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Connecting or the WebSocket handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Command arguments could not be encoded as a valid envelope.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// No response frame arrived inside the wait window.
    #[error("no response within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The server closed the connection before sending anything.
    #[error("connection closed before a response arrived")]
    NoResponse,

    /// The response frame was not valid UTF-8 text.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Writing the response to stdout failed.
    #[error("failed to write response: {0}")]
    Output(#[from] std::io::Error),
}

impl ClientError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::InvalidTarget { .. }
            | ClientError::Connection(_)
            | ClientError::Output(_) => 1,
            ClientError::Serialization(_) => 2,
            ClientError::Timeout(_) | ClientError::NoResponse => 3,
            ClientError::Protocol(_) => 4,
        }
    }

    pub(crate) fn serialization(err: impl std::fmt::Display) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::serialization(err)
    }
}
