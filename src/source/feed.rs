//! Channel bridge from stream tasks to the store owner.
//!
//! Stream handlers run on their own tasks; the store is owned by a single
//! task and must not be shared. A [`DiagnosticsFeed`] hands every stream a
//! [`ChannelHandler`] that forwards records and errors over an unbounded
//! channel, preserving per-stream order, and the owner drains the feed.

use fleetwatch_client::{ClientError, DiagnosticsHandler, DiagnosticsUpdate};
use tokio::sync::mpsc;

/// Something a diagnostics stream produced.
#[derive(Debug)]
pub enum FeedEvent {
    /// A record arrived for `device_id`.
    Diagnostics {
        device_id: String,
        update: DiagnosticsUpdate,
    },
    /// The stream for `device_id` failed and has stopped.
    Failed {
        device_id: String,
        error: ClientError,
    },
}

impl FeedEvent {
    pub fn device_id(&self) -> &str {
        match self {
            FeedEvent::Diagnostics { device_id, .. } | FeedEvent::Failed { device_id, .. } => {
                device_id
            }
        }
    }
}

/// Receiving end shared by any number of streams.
///
/// # Example
///
/// ```
/// use fleetwatch::source::{DiagnosticsFeed, FeedEvent};
/// use fleetwatch_client::{DiagnosticsHandler, DiagnosticsUpdate};
///
/// let mut feed = DiagnosticsFeed::new();
/// let mut handler = feed.handler("edge-01");
/// handler.on_diagnostics(DiagnosticsUpdate::default());
///
/// assert!(matches!(feed.poll(), Some(FeedEvent::Diagnostics { .. })));
/// assert!(feed.poll().is_none());
/// ```
#[derive(Debug)]
pub struct DiagnosticsFeed {
    sender: mpsc::UnboundedSender<FeedEvent>,
    receiver: mpsc::UnboundedReceiver<FeedEvent>,
}

impl Default for DiagnosticsFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsFeed {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// A handler that tags everything it forwards with `device_id`.
    pub fn handler(&self, device_id: impl Into<String>) -> ChannelHandler {
        ChannelHandler {
            device_id: device_id.into(),
            sender: self.sender.clone(),
        }
    }

    /// Take the next event without waiting.
    pub fn poll(&mut self) -> Option<FeedEvent> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next event.
    ///
    /// The feed holds a sender itself, so this only returns `None` if the
    /// channel is closed, which does not happen while the feed is alive.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.receiver.recv().await
    }
}

/// [`DiagnosticsHandler`] that forwards into a [`DiagnosticsFeed`].
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    device_id: String,
    sender: mpsc::UnboundedSender<FeedEvent>,
}

impl DiagnosticsHandler for ChannelHandler {
    fn on_diagnostics(&mut self, update: DiagnosticsUpdate) {
        // A dropped feed means nobody is interested anymore.
        let _ = self.sender.send(FeedEvent::Diagnostics {
            device_id: self.device_id.clone(),
            update,
        });
    }

    fn on_error(&mut self, error: ClientError) {
        let _ = self.sender.send(FeedEvent::Failed {
            device_id: self.device_id.clone(),
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_client::{DiagnosticsStream, StreamEnd};
    use futures_util::stream;

    fn update(cpu: f64) -> DiagnosticsUpdate {
        let mut update = DiagnosticsUpdate::default();
        update.diagnostics.cpu_usage = cpu;
        update
    }

    #[test]
    fn test_events_keep_order_and_device() {
        let mut feed = DiagnosticsFeed::new();
        let mut a = feed.handler("a");
        let mut b = feed.handler("b");

        a.on_diagnostics(update(1.0));
        b.on_diagnostics(update(2.0));
        a.on_error(ClientError::Timeout);

        let first = feed.poll().unwrap();
        assert_eq!(first.device_id(), "a");
        assert!(matches!(first, FeedEvent::Diagnostics { ref update, .. } if update.diagnostics.cpu_usage == 1.0));

        assert_eq!(feed.poll().unwrap().device_id(), "b");
        assert!(matches!(
            feed.poll(),
            Some(FeedEvent::Failed { error: ClientError::Timeout, .. })
        ));
        assert!(feed.poll().is_none());
    }

    #[test]
    fn test_handler_outlives_feed() {
        let feed = DiagnosticsFeed::new();
        let mut handler = feed.handler("a");
        drop(feed);
        handler.on_diagnostics(update(1.0));
    }

    #[tokio::test]
    async fn test_feed_from_stream() {
        let mut feed = DiagnosticsFeed::new();
        let body = stream::iter(vec![
            Ok::<_, ClientError>(b"{\"cpu_usage\":1}\n{\"cpu_us".to_vec()),
            Ok(b"age\":2}\n".to_vec()),
        ]);

        let stream = DiagnosticsStream::spawn("edge-01", async move { Ok(body) }, feed.handler("edge-01"));
        assert_eq!(stream.join().await, StreamEnd::Closed);

        let mut cpu = Vec::new();
        while let Some(FeedEvent::Diagnostics { update, .. }) = feed.poll() {
            cpu.push(update.diagnostics.cpu_usage);
        }
        assert_eq!(cpu, vec![1.0, 2.0]);
    }
}
