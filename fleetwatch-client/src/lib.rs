//! # fleetwatch-client
//!
//! REST and streaming client for the fleet monitoring backend.
//!
//! - [`FleetClient`]: device registry calls and diagnostics streams
//! - [`DiagnosticsStream`]: a cancellable per-device stream task that frames
//!   newline-delimited JSON and calls a [`DiagnosticsHandler`] once per record
//! - [`LineFramer`] / [`parse_record`]: the framing and decoding steps, usable
//!   on their own
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleetwatch_client::{handler_fn, FleetClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FleetClient::builder()
//!         .endpoint("http://localhost:8080")
//!         .build()?;
//!
//!     for device in client.list_devices().await? {
//!         println!("{} at {}", device.device_id, device.address());
//!     }
//!
//!     let stream = client.stream_diagnostics(
//!         "edge-01",
//!         handler_fn(
//!             |update| println!("cpu {:.1}%", update.diagnostics.cpu_usage),
//!             |error| eprintln!("stream failed: {error}"),
//!         ),
//!     );
//!
//!     tokio::signal::ctrl_c().await?;
//!     stream.cancel();
//!     stream.join().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod framing;
pub mod record;
pub mod stream;

pub use client::{FleetClient, FleetClientBuilder};
pub use error::{ClientError, RecordError};
pub use framing::LineFramer;
pub use record::parse_record;
pub use stream::{
    handler_fn, CancelHandle, DiagnosticsHandler, DiagnosticsStream, FnHandler, StreamEnd,
    StreamState,
};

// Re-export types for convenience
pub use fleetwatch_types::{
    Device, DeviceStatus, Diagnostics, DiagnosticsSample, DiagnosticsUpdate, Protocol,
    RegisterDevice,
};
