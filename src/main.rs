use clap::Parser;
use std::process::ExitCode;

mod cmd;
mod error;
mod utils;
mod ws;

use cmd::SendArgs;

/// command-client - send one command envelope to the project server
///
///   command-client --command <open-project|close-project|status> [--id TOKEN] [--name NAME]
///                  [--url ws://... | --host HOST --port PORT [--tls] [--path P]]
///
/// Envelope:
///   {"type":"cli","command":"open-project","id":"test1234","args":{"name":"Place1"}}
///
/// Target resolution:
///   --url > --host/--port > COMMAND_CLIENT_URL env > ws://localhost:5000
///
/// Exit codes:
///   0 success, 1 connection failure, 2 serialization failure,
///   3 timeout / no response, 4 protocol error
///
/// Examples:
///   command-client -c status
///   command-client -c open-project --id test1234 --name Place1
///   command-client -c close-project --id test1234 --url ws://localhost:5000
#[derive(Parser, Debug)]
#[command(
    name = "command-client",
    version,
    author,
    about = "One-shot WebSocket command client for the project server",
    propagate_version = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    send: SendArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    match cmd::execute_send(cli.send) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
