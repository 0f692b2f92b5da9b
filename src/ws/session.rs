//! One connection, one request frame, one response frame.
//!
//! DISCONNECTED -> CONNECTING -> CONNECTED -> SENT -> AWAITING_RESPONSE -> RECEIVED -> CLOSED
//!
//! Any step may jump to FAILED and then CLOSED. The socket is closed on every
//! path once it has been opened.

use std::fmt;
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info};

use super::TargetSpec;
use crate::error::ClientError;

/// Upper bound for the closing handshake; the result is discarded anyway.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected,
    Sent,
    AwaitingResponse,
    Received,
    Failed,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Disconnected => "DISCONNECTED",
            Phase::Connecting => "CONNECTING",
            Phase::Connected => "CONNECTED",
            Phase::Sent => "SENT",
            Phase::AwaitingResponse => "AWAITING_RESPONSE",
            Phase::Received => "RECEIVED",
            Phase::Failed => "FAILED",
            Phase::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// Records the current phase and logs each transition.
#[derive(Debug)]
pub struct PhaseTracker {
    current: Phase,
    history: Vec<Phase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: Phase::Disconnected,
            history: vec![Phase::Disconnected],
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    pub fn advance(&mut self, next: Phase) {
        debug!(from = %self.current, to = %next, "phase");
        self.current = next;
        self.history.push(next);
    }

    /// Move to FAILED, noting where the failure happened.
    pub fn fail(&mut self, err: &ClientError) {
        debug!(phase = %self.current, error = %err, "exchange failed");
        self.advance(Phase::Failed);
    }
}

/// Blocking entry point: runs the exchange on a current-thread runtime.
pub fn exchange(target: &TargetSpec, frame: String, wait: Duration) -> Result<String, ClientError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ClientError::Connection(format!("failed to start I/O runtime: {e}")))?;
    let mut tracker = PhaseTracker::new();
    let result = rt.block_on(exchange_async(target, frame, wait, &mut tracker));
    debug!(
        phase = %tracker.current(),
        transitions = tracker.history().len(),
        "exchange finished"
    );
    result
}

/// Connect, send `frame`, wait at most `wait` for one response, close.
pub async fn exchange_async(
    target: &TargetSpec,
    frame: String,
    wait: Duration,
    tracker: &mut PhaseTracker,
) -> Result<String, ClientError> {
    tracker.advance(Phase::Connecting);
    info!(url = %target, tls = target.is_tls(), "connecting");
    debug!(original = target.original(), "resolved target");

    let connected = match timeout(wait, connect_async(target.url().as_str())).await {
        Ok(Ok((ws, _resp))) => Ok(ws),
        Ok(Err(e)) => Err(ClientError::Connection(e.to_string())),
        // Accepted but silent during the handshake: no response, not a refusal.
        Err(_) => Err(ClientError::Timeout(wait)),
    };
    let mut ws = match connected {
        Ok(ws) => ws,
        Err(e) => {
            tracker.fail(&e);
            tracker.advance(Phase::Closed);
            return Err(e);
        }
    };
    tracker.advance(Phase::Connected);

    let outcome = send_and_await(&mut ws, frame, wait, tracker).await;
    match &outcome {
        Ok(_) => tracker.advance(Phase::Received),
        Err(e) => tracker.fail(e),
    }

    match timeout(CLOSE_GRACE, ws.close(None)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "close handshake incomplete"),
        Err(_) => debug!("close handshake timed out"),
    }
    tracker.advance(Phase::Closed);

    outcome
}

async fn send_and_await<S>(
    ws: &mut S,
    frame: String,
    wait: Duration,
    tracker: &mut PhaseTracker,
) -> Result<String, ClientError>
where
    S: futures_util::Sink<Message, Error = WsError>
        + Stream<Item = Result<Message, WsError>>
        + Unpin,
{
    debug!(bytes = frame.len(), "sending envelope");
    ws.send(Message::text(frame))
        .await
        .map_err(|e| ClientError::Connection(format!("send failed: {e}")))?;
    tracker.advance(Phase::Sent);

    tracker.advance(Phase::AwaitingResponse);
    match timeout(wait, next_response(ws)).await {
        Ok(res) => res,
        Err(_) => Err(ClientError::Timeout(wait)),
    }
}

/// Read frames until one carries a response. Control frames are skipped.
pub async fn next_response<S>(ws: &mut S) -> Result<String, ClientError>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(msg) = ws.next().await {
        match msg.map_err(read_error)? {
            Message::Text(text) => return Ok(text.as_str().to_owned()),
            Message::Binary(bytes) => {
                return String::from_utf8(bytes.to_vec()).map_err(|e| {
                    ClientError::Protocol(format!("binary frame is not valid UTF-8: {e}"))
                });
            }
            Message::Close(frame) => {
                debug!(?frame, "server closed the connection");
                return Err(ClientError::NoResponse);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        }
    }
    Err(ClientError::NoResponse)
}

fn read_error(err: WsError) -> ClientError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => ClientError::NoResponse,
        WsError::Io(e) => ClientError::Connection(format!("read failed: {e}")),
        other => ClientError::Protocol(other.to_string()),
    }
}
