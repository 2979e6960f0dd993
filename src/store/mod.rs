//! In-memory state backing the views.
//!
//! ## Submodules
//!
//! - [`device_store`]: the [`DeviceStore`] (device list, selection, latest
//!   snapshot per device)
//! - [`history`]: the bounded per-device [`SampleHistory`]
//!
//! ## Data Flow
//!
//! ```text
//! DiagnosticsUpdate (from a stream)
//!        │
//!        ▼
//! DeviceStore::add_diagnostic_data()
//!        │
//!        ├──▶ latest Diagnostics (overwritten)
//!        │
//!        └──▶ SampleHistory::push() (FIFO, 50 samples)
//! ```

pub mod device_store;
pub mod history;

pub use device_store::DeviceStore;
pub use history::{SampleHistory, MAX_HISTORY_SIZE};
