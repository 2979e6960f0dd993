//! Observable store of devices and their diagnostics.

use std::collections::{HashMap, HashSet};

use fleetwatch_types::{
    current_timestamp_ms, Device, DeviceStatus, Diagnostics, DiagnosticsSample,
};
use tokio::sync::watch;

use super::history::SampleHistory;

/// Single source of truth for the device list, the focused device, and the
/// latest diagnostics and sample history of each device.
///
/// Every mutator is synchronous and bumps a revision counter published on a
/// watch channel, so readers can treat "revision changed" as "store changed".
/// Inputs are not validated.
#[derive(Debug)]
pub struct DeviceStore {
    devices: Vec<Device>,
    selected_device_id: Option<String>,
    diagnostics: HashMap<String, Diagnostics>,
    history: HashMap<String, SampleHistory>,
    revision: watch::Sender<u64>,
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            devices: Vec::new(),
            selected_device_id: None,
            diagnostics: HashMap::new(),
            history: HashMap::new(),
            revision,
        }
    }

    /// Subscribe to change notifications. The value is the store revision.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Replace the full device collection (last write wins).
    ///
    /// Diagnostics and history of devices missing from `devices` are dropped.
    pub fn set_devices(&mut self, devices: Vec<Device>) {
        let listed: HashSet<&str> = devices.iter().map(|d| d.device_id.as_str()).collect();
        self.diagnostics.retain(|id, _| listed.contains(id.as_str()));
        self.history.retain(|id, _| listed.contains(id.as_str()));
        self.devices = devices;
        self.bump();
    }

    /// Focus a device. The id does not have to be known.
    pub fn select_device(&mut self, device_id: impl Into<String>) {
        self.selected_device_id = Some(device_id.into());
        self.bump();
    }

    pub fn clear_selection(&mut self) {
        self.selected_device_id = None;
        self.bump();
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected_device_id.as_deref()
    }

    /// The focused device, looked up by id in the current list.
    pub fn selected_device(&self) -> Option<&Device> {
        self.selected_device_id
            .as_deref()
            .and_then(|id| self.device(id))
    }

    /// Record a diagnostics snapshot received now.
    pub fn add_diagnostic_data(&mut self, device_id: &str, diagnostics: Diagnostics) {
        self.add_diagnostic_data_at(device_id, diagnostics, current_timestamp_ms());
    }

    /// Record a diagnostics snapshot with an explicit timestamp.
    ///
    /// Overwrites the latest snapshot, appends a `(timestamp, cpu, memory)`
    /// sample and evicts the oldest sample past the history bound. Identical
    /// consecutive snapshots are not deduplicated.
    pub fn add_diagnostic_data_at(
        &mut self,
        device_id: &str,
        diagnostics: Diagnostics,
        timestamp_ms: u64,
    ) {
        let sample = DiagnosticsSample::from_diagnostics(&diagnostics, timestamp_ms);
        self.history
            .entry(device_id.to_string())
            .or_default()
            .push(sample);
        self.diagnostics.insert(device_id.to_string(), diagnostics);
        self.bump();
    }

    /// Apply a status change to a listed device.
    ///
    /// Returns false if the device is not in the current list.
    pub fn set_device_status(&mut self, device_id: &str, status: DeviceStatus) -> bool {
        let Some(device) = self.devices.iter_mut().find(|d| d.device_id == device_id) else {
            return false;
        };
        device.device_status = status;
        self.bump();
        true
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    /// Latest snapshot of a device.
    pub fn diagnostics(&self, device_id: &str) -> Option<&Diagnostics> {
        self.diagnostics.get(device_id)
    }

    /// Sample history of a device.
    pub fn history(&self, device_id: &str) -> Option<&SampleHistory> {
        self.history.get(device_id)
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}
