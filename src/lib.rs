//! # fleetwatch
//!
//! A command-line monitor and library for a fleet of networked devices.
//!
//! Devices are listed, registered and updated through the backend's REST API,
//! and each device can be followed through its live diagnostics stream. The
//! stream output lands in a [`DeviceStore`], which keeps the latest snapshot
//! and a bounded sample history per device.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          Application                           │
//! │  ┌──────────────────┐   ┌─────────┐   ┌─────────┐   ┌────────┐ │
//! │  │ DiagnosticsStream│──▶│ source  │──▶│  store  │──▶│ render │ │
//! │  │  (one per device)│   │ (feed)  │   │         │   │        │ │
//! │  └──────────────────┘   └─────────┘   └─────────┘   └────────┘ │
//! │           ▲                                ▲                   │
//! │           └──────────── app ───────────────┘                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: owns the client, the store, and the running streams
//! - **[`source`]**: carries stream output back to the store owner
//! - **[`store`]**: devices, selection, latest diagnostics and [`SampleHistory`]
//! - **[`render`]**: plain-text tables, sample lines and sparklines
//! - **[`config`]**: layered [`Settings`]
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! fleetwatch devices
//! fleetwatch register edge-01 --host 10.0.0.4 --port 8080 --protocol http-stream
//! fleetwatch set-status edge-01 maintenance
//! fleetwatch --endpoint http://monitor.local:8080 watch edge-01 edge-02
//! ```
//!
//! ### As a library
//!
//! ```
//! use fleetwatch::{DeviceStore, Diagnostics};
//!
//! let mut store = DeviceStore::new();
//! let diagnostics = Diagnostics {
//!     cpu_usage: 42.0,
//!     memory_usage: 7.0,
//!     ..Diagnostics::default()
//! };
//! store.add_diagnostic_data("edge-01", diagnostics);
//!
//! assert_eq!(store.history("edge-01").map(|h| h.len()), Some(1));
//! ```

pub mod app;
pub mod config;
pub mod render;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use fleetwatch_client::{
    Device, DeviceStatus, Diagnostics, DiagnosticsSample, DiagnosticsUpdate, FleetClient,
    Protocol,
};
pub use source::{DiagnosticsFeed, FeedEvent};
pub use store::{DeviceStore, SampleHistory, MAX_HISTORY_SIZE};
