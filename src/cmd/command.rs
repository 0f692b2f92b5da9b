/*!
Command enum for the `--command` flag.

Variants:
  open-project  (requires `name`)
  close-project
  status

Helpers:
  - as_str()
  - required_args()
  - takes_args()
*/

use serde::Serialize;
use std::fmt;

/// The closed set of commands the project server understands.
#[derive(clap::ValueEnum, Serialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// Open a project by name
    OpenProject,
    /// Close the currently open project
    CloseProject,
    /// Query server status
    Status,
}

impl Command {
    /// Wire name, as it appears in the envelope's `command` field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Command::OpenProject => "open-project",
            Command::CloseProject => "close-project",
            Command::Status => "status",
        }
    }

    /// Argument keys that must be present in `args`.
    pub const fn required_args(&self) -> &'static [&'static str] {
        match self {
            Command::OpenProject => &["name"],
            Command::CloseProject | Command::Status => &[],
        }
    }

    /// Whether the envelope for this command carries an `args` object at all.
    pub const fn takes_args(&self) -> bool {
        !self.required_args().is_empty()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* --------------------------------- Tests ---------------------------------- */
