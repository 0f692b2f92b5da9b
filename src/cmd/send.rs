/*!
`send.rs`

Builds the command envelope from the CLI flags and performs the single
request/response exchange.

Flow:
  1. Collect arguments and build the envelope (no network I/O yet)
  2. --dry-run: print the envelope and stop
  3. Resolve the target (--url > --host/--port > COMMAND_CLIENT_URL > default)
  4. Exchange one frame each way, bounded by --timeout
  5. Print the response verbatim
*/

use clap::Args;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::command::Command;
use super::envelope::Envelope;
use super::params::{ArgSources, collect_args};
use crate::error::ClientError;
use crate::ws::{self, DEFAULT_URL, TargetSpec};

/// Environment fallback for the target endpoint.
pub const TARGET_ENV: &str = "COMMAND_CLIENT_URL";

const DEFAULT_PORT: u16 = 5000;

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Command to send
    #[arg(short, long, value_enum, ignore_case = true)]
    pub command: Command,

    /// Correlation token echoed in the envelope's `id` field
    #[arg(long, value_name = "TOKEN")]
    pub id: Option<String>,

    /// Project name (shorthand for --arg name=NAME)
    #[arg(short, long)]
    pub name: Option<String>,

    /// String argument (KEY=VALUE), repeatable
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Typed JSON argument (KEY=JSON), repeatable
    #[arg(long = "arg-json", value_name = "KEY=JSON")]
    pub json_args: Vec<String>,

    /// Load arguments from a JSON or YAML object; flags override file entries
    #[arg(long = "args-file", value_name = "PATH")]
    pub args_file: Option<String>,

    /// Full endpoint URL (ws:// or wss://). Overrides --host/--port
    #[arg(long, conflicts_with_all = ["host", "port", "tls", "path"])]
    pub url: Option<String>,

    /// Server host
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Connect with wss:// when building the URL from --host/--port
    #[arg(long)]
    pub tls: bool,

    /// Request path appended to --host/--port
    #[arg(long)]
    pub path: Option<String>,

    /// Seconds to wait for the connection and for the response
    #[arg(long, value_name = "SECS", default_value_t = 10.0)]
    pub timeout: f64,

    /// Print the envelope instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl SendArgs {
    /// Wait window. Non-finite or non-positive values are a usage mistake and
    /// fall back to the default.
    pub fn wait(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(10))
    }

    /// Resolve the endpoint: --url, then --host/--port, then the env var,
    /// then the default.
    pub fn target(&self, env_url: Option<String>) -> Result<TargetSpec, ClientError> {
        if let Some(url) = &self.url {
            return ws::parse_target(url);
        }
        if self.host.is_some() || self.port.is_some() || self.tls || self.path.is_some() {
            return ws::from_host_port(
                self.host.as_deref().unwrap_or("localhost"),
                self.port.unwrap_or(DEFAULT_PORT),
                self.tls,
                self.path.as_deref(),
            );
        }
        match env_url.filter(|s| !s.trim().is_empty()) {
            Some(url) => ws::parse_target(&url),
            None => ws::parse_target(DEFAULT_URL),
        }
    }

    pub fn envelope(&self) -> Result<Envelope, ClientError> {
        let args = collect_args(&ArgSources {
            name: self.name.as_deref(),
            pairs: &self.args,
            json_pairs: &self.json_args,
            file: self.args_file.as_deref(),
        })?;
        Envelope::build(self.command, self.id.clone(), args)
    }
}

pub fn execute_send(args: SendArgs) -> Result<(), ClientError> {
    // Serialization problems surface before any connection attempt.
    let envelope = args.envelope()?;
    let frame = envelope.to_frame()?;

    if args.dry_run {
        debug!("dry run, not connecting");
        return write_stdout(&frame);
    }

    let target = args.target(std::env::var(TARGET_ENV).ok())?;
    let wait = args.wait();
    info!(command = %envelope.command, target = %target, "sending command");

    let response = ws::exchange(&target, frame, wait)?;
    debug!(bytes = response.len(), "response received");

    write_stdout(&response)
}

fn write_stdout(text: &str) -> Result<(), ClientError> {
    let mut out = io::stdout().lock();
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}
