//! The command envelope: the single JSON object sent to the server.
//!
//! ```json
//! {"type":"cli","command":"open-project","id":"test1234","args":{"name":"Place1"}}
//! ```
//!
//! `id` and `args` are omitted when absent. `args` is present exactly when the
//! command requires parameters; [`Envelope::build`] enforces that.

use serde::Serialize;
use serde_json::{Map, Value};

use super::command::Command;
use crate::error::ClientError;

/// Value of the `type` field for every envelope this client sends.
pub const ENVELOPE_TYPE: &str = "cli";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, Value>>,
}

impl Envelope {
    /// Build an envelope for `command`, validating `args` against the
    /// command's requirements.
    ///
    /// Fails with [`ClientError::Serialization`] when a required key is
    /// missing or when arguments are given to a command that takes none.
    pub fn build(
        command: Command,
        id: Option<String>,
        args: Map<String, Value>,
    ) -> Result<Self, ClientError> {
        let id = id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let args = if command.takes_args() {
            for key in command.required_args() {
                match args.get(*key) {
                    None | Some(Value::Null) => {
                        return Err(ClientError::Serialization(format!(
                            "command '{command}' requires argument '{key}'"
                        )));
                    }
                    Some(Value::String(s)) if s.trim().is_empty() => {
                        return Err(ClientError::Serialization(format!(
                            "argument '{key}' for '{command}' cannot be empty"
                        )));
                    }
                    Some(_) => {}
                }
            }
            Some(args)
        } else {
            if let Some(key) = args.keys().next() {
                return Err(ClientError::Serialization(format!(
                    "command '{command}' takes no arguments (got '{key}')"
                )));
            }
            None
        };

        Ok(Self {
            kind: ENVELOPE_TYPE.to_string(),
            command,
            id,
            args,
        })
    }

    /// Compact JSON text, ready to go out as one text frame.
    pub fn to_frame(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }
}
