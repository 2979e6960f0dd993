//! Inputs that feed the store.
//!
//! Diagnostics streams run as independent tasks (see
//! [`fleetwatch_client::DiagnosticsStream`]); this module carries their output
//! back to the task that owns the [`DeviceStore`](crate::store::DeviceStore).

mod feed;

pub use feed::{ChannelHandler, DiagnosticsFeed, FeedEvent};
