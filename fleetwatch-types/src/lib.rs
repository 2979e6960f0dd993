//! # fleetwatch-types
//!
//! Wire data model shared by the fleetwatch client and store.
//!
//! ## Types
//!
//! - [`Device`]: a registered device as returned by `GET /v1/devices`
//! - [`Diagnostics`]: a point-in-time health snapshot for one device
//! - [`DiagnosticsUpdate`]: one decoded record of the diagnostics stream
//! - [`DiagnosticsSample`]: the `(timestamp, cpu, memory)` triple kept in history
//! - [`DeviceStatus`] / [`Protocol`]: closed enumerations with an explicit
//!   `Unspecified` member
//!
//! ## Features
//!
//! - `serde`: JSON (de)serialization matching the backend's wire format
//!
//! ## Example
//!
//! ```rust
//! use fleetwatch_types::{DeviceStatus, Diagnostics, DiagnosticsSample};
//!
//! let diagnostics = Diagnostics {
//!     cpu_usage: 42.0,
//!     memory_usage: 7.5,
//!     device_status: DeviceStatus::Healthy,
//!     ..Default::default()
//! };
//!
//! let sample = DiagnosticsSample::from_diagnostics(&diagnostics, 1_703_160_000_000);
//! assert_eq!(sample.cpu, 42.0);
//! ```

mod device;
mod diagnostics;
mod status;

pub use device::*;
pub use diagnostics::*;
pub use status::*;

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
