//! Live diagnostics streams.
//!
//! A stream is one spawned task that owns its own [`LineFramer`] and
//! cancellation token. It reads chunks from the transport, frames them into
//! lines, parses each line and hands every record to a
//! [`DiagnosticsHandler`] as soon as its newline arrives.
//!
//! ```text
//!  Idle ──▶ Opening ──▶ Streaming ──┬──▶ Closed     (end of body)
//!              │            │       ├──▶ Cancelled  (token fired)
//!              └────────────┴───────┴──▶ Errored    (transport failure)
//! ```
//!
//! Cancellation is checked at both suspension points (the connection
//! handshake and every chunk read). Records already decoded from a received
//! chunk are still delivered; nothing is delivered after the task ends.

use std::future::Future;

use fleetwatch_types::DiagnosticsUpdate;
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::framing::LineFramer;
use crate::record::parse_record;
use crate::ClientError;

/// Receives the output of a diagnostics stream.
///
/// Both methods run on the stream's task, synchronously inside the decode
/// loop, so records arrive in wire order. `on_error` is called at most once
/// and never for a cancelled stream.
pub trait DiagnosticsHandler: Send + 'static {
    /// A complete record was decoded.
    fn on_diagnostics(&mut self, update: DiagnosticsUpdate);

    /// The transport failed; the stream has stopped.
    fn on_error(&mut self, error: ClientError);
}

/// A [`DiagnosticsHandler`] built from two closures. See [`handler_fn`].
pub struct FnHandler<D, E> {
    on_data: D,
    on_error: E,
}

/// Build a handler from a record callback and an error callback.
///
/// ```
/// use fleetwatch_client::handler_fn;
///
/// let handler = handler_fn(
///     |update| println!("cpu {}", update.diagnostics.cpu_usage),
///     |error| eprintln!("stream failed: {error}"),
/// );
/// # let _ = handler;
/// ```
pub fn handler_fn<D, E>(on_data: D, on_error: E) -> FnHandler<D, E>
where
    D: FnMut(DiagnosticsUpdate) + Send + 'static,
    E: FnMut(ClientError) + Send + 'static,
{
    FnHandler { on_data, on_error }
}

impl<D, E> DiagnosticsHandler for FnHandler<D, E>
where
    D: FnMut(DiagnosticsUpdate) + Send + 'static,
    E: FnMut(ClientError) + Send + 'static,
{
    fn on_diagnostics(&mut self, update: DiagnosticsUpdate) {
        (self.on_data)(update)
    }

    fn on_error(&mut self, error: ClientError) {
        (self.on_error)(error)
    }
}

/// Lifecycle of a diagnostics stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, task not yet running.
    Idle,
    /// Waiting for the connection handshake.
    Opening,
    /// Reading chunks.
    Streaming,
    /// The server ended the body.
    Closed,
    /// The stream was cancelled by the caller.
    Cancelled,
    /// The transport failed; the error was reported.
    Errored,
}

impl StreamState {
    /// Whether no further chunks will be processed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Closed | StreamState::Cancelled | StreamState::Errored
        )
    }
}

/// How a stream task finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Closed,
    Cancelled,
    Errored,
}

impl From<StreamEnd> for StreamState {
    fn from(end: StreamEnd) -> Self {
        match end {
            StreamEnd::Closed => StreamState::Closed,
            StreamEnd::Cancelled => StreamState::Cancelled,
            StreamEnd::Errored => StreamState::Errored,
        }
    }
}

/// Cloneable cancel function for a running stream.
#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    /// Abort the stream. Idempotent; never reported as an error.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Handle to a running diagnostics stream.
///
/// Dropping the handle does not stop the stream; call [`cancel`](Self::cancel)
/// or keep a [`CancelHandle`] for that.
#[derive(Debug)]
pub struct DiagnosticsStream {
    device_id: String,
    cancel: CancelHandle,
    state: watch::Receiver<StreamState>,
    task: JoinHandle<StreamEnd>,
}

impl DiagnosticsStream {
    /// Spawn a stream task over an arbitrary transport.
    ///
    /// `connect` performs the handshake and yields the body as a stream of
    /// byte chunks. [`FleetClient::stream_diagnostics`](crate::FleetClient::stream_diagnostics)
    /// uses this with an HTTP response body. Must be called inside a tokio
    /// runtime.
    pub fn spawn<C, S, B, H>(device_id: impl Into<String>, connect: C, handler: H) -> Self
    where
        C: Future<Output = Result<S, ClientError>> + Send + 'static,
        S: Stream<Item = Result<B, ClientError>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        H: DiagnosticsHandler,
    {
        let device_id = device_id.into();
        let token = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(StreamState::Idle);

        let task = tokio::spawn(run_stream(
            device_id.clone(),
            connect,
            handler,
            token.clone(),
            state_tx,
        ));

        Self {
            device_id,
            cancel: CancelHandle(token),
            state: state_rx,
            task,
        }
    }

    /// The device this stream reads from.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Abort the stream.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A cancel function that can outlive or be moved away from this handle.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Watch channel that follows state transitions.
    pub fn state_changes(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the stream task to finish.
    pub async fn join(self) -> StreamEnd {
        match self.task.await {
            Ok(end) => end,
            Err(e) if e.is_cancelled() => StreamEnd::Cancelled,
            Err(e) => {
                warn!("Diagnostics stream for {} panicked: {}", self.device_id, e);
                StreamEnd::Errored
            }
        }
    }
}

async fn run_stream<C, S, B, H>(
    device_id: String,
    connect: C,
    mut handler: H,
    token: CancellationToken,
    state: watch::Sender<StreamState>,
) -> StreamEnd
where
    C: Future<Output = Result<S, ClientError>> + Send,
    S: Stream<Item = Result<B, ClientError>> + Send,
    B: AsRef<[u8]>,
    H: DiagnosticsHandler,
{
    let end = pump(&device_id, connect, &mut handler, &token, &state).await;
    state.send_replace(end.into());
    info!("Diagnostics stream for {} ended: {:?}", device_id, end);
    end
}

async fn pump<C, S, B, H>(
    device_id: &str,
    connect: C,
    handler: &mut H,
    token: &CancellationToken,
    state: &watch::Sender<StreamState>,
) -> StreamEnd
where
    C: Future<Output = Result<S, ClientError>>,
    S: Stream<Item = Result<B, ClientError>>,
    B: AsRef<[u8]>,
    H: DiagnosticsHandler,
{
    state.send_replace(StreamState::Opening);

    let connected = tokio::select! {
        biased;
        _ = token.cancelled() => return StreamEnd::Cancelled,
        result = connect => result,
    };

    let chunks = match connected {
        Ok(chunks) => chunks,
        Err(error) => return report(handler, token, error),
    };

    state.send_replace(StreamState::Streaming);
    debug!("Diagnostics stream for {} connected", device_id);

    let mut chunks = std::pin::pin!(chunks);
    let mut framer = LineFramer::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return StreamEnd::Cancelled,
            next = chunks.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                for line in framer.push(chunk.as_ref()) {
                    emit(device_id, handler, &line);
                }
            }
            Some(Err(error)) => return report(handler, token, error),
            None => {
                let discarded = framer.finish();
                if discarded > 0 {
                    debug!(
                        "Discarding {} bytes of unterminated data at end of stream for {}",
                        discarded, device_id
                    );
                }
                return StreamEnd::Closed;
            }
        }
    }
}

fn emit<H: DiagnosticsHandler>(device_id: &str, handler: &mut H, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    match parse_record(line) {
        Ok(update) => handler.on_diagnostics(update),
        Err(e) => warn!(
            "Failed to parse stream line for {}: {} (line: {})",
            device_id, e, line
        ),
    }
}

// A failure observed after cancellation is the abort itself, not an error.
fn report<H: DiagnosticsHandler>(
    handler: &mut H,
    token: &CancellationToken,
    error: ClientError,
) -> StreamEnd {
    if token.is_cancelled() {
        return StreamEnd::Cancelled;
    }
    handler.on_error(error);
    StreamEnd::Errored
}
