//! Application state: the client, the store, and the running streams.

use std::path::Path;

use anyhow::{Context, Result};
use fleetwatch_client::{
    ClientError, Device, DeviceStatus, DiagnosticsStream, FleetClient, RegisterDevice,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::source::{DiagnosticsFeed, FeedEvent};
use crate::store::DeviceStore;

/// Owns the [`DeviceStore`] and everything that writes to it.
///
/// Stream output arrives through the [`DiagnosticsFeed`] and is applied with
/// [`App::apply`] on the owning task, so the store is never shared.
pub struct App {
    client: FleetClient,
    pub store: DeviceStore,
    feed: DiagnosticsFeed,
    streams: Vec<DiagnosticsStream>,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(client: FleetClient) -> Self {
        Self {
            client,
            store: DeviceStore::new(),
            feed: DiagnosticsFeed::new(),
            streams: Vec::new(),
            last_error: None,
        }
    }

    pub fn client(&self) -> &FleetClient {
        &self.client
    }

    /// Reload the device list from the backend.
    pub async fn refresh_devices(&mut self) -> Result<()> {
        let devices = self
            .client
            .list_devices()
            .await
            .context("failed to list devices")?;
        self.store.set_devices(devices);
        Ok(())
    }

    /// Register a device and add (or replace) it in the local list.
    pub async fn register(&mut self, request: &RegisterDevice) -> Result<Device> {
        let device = self
            .client
            .register_device(request)
            .await
            .with_context(|| format!("failed to register {}", request.device_id))?;

        let mut devices = self.store.devices().to_vec();
        match devices.iter_mut().find(|d| d.device_id == device.device_id) {
            Some(existing) => *existing = device.clone(),
            None => devices.push(device.clone()),
        }
        self.store.set_devices(devices);
        Ok(device)
    }

    /// Change a device's status on the backend, then locally.
    pub async fn update_status(&mut self, device_id: &str, status: DeviceStatus) -> Result<()> {
        self.client
            .update_device(device_id, status)
            .await
            .with_context(|| format!("failed to set status of {device_id}"))?;

        if !self.store.set_device_status(device_id, status) {
            debug!("{} is not in the local device list", device_id);
        }
        Ok(())
    }

    /// Start streaming diagnostics of `device_id` into the store.
    ///
    /// The first watched device becomes the selected one.
    pub fn watch(&mut self, device_id: &str) {
        if self.store.selected_device_id().is_none() {
            self.store.select_device(device_id);
        }

        let handler = self.feed.handler(device_id);
        self.streams
            .push(self.client.stream_diagnostics(device_id, handler));
    }

    pub fn streams(&self) -> &[DiagnosticsStream] {
        &self.streams
    }

    /// True once every started stream has ended (or none was started).
    pub fn all_streams_finished(&self) -> bool {
        self.streams.iter().all(DiagnosticsStream::is_finished)
    }

    /// Cancel every stream and wait for their tasks to end.
    pub async fn stop_all(&mut self) {
        for stream in &self.streams {
            stream.cancel();
        }
        for stream in self.streams.drain(..) {
            let device_id = stream.device_id().to_string();
            let end = stream.join().await;
            debug!("Stream {} ended: {:?}", device_id, end);
        }
    }

    /// Wait for the next stream event.
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.feed.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn poll_event(&mut self) -> Option<FeedEvent> {
        self.feed.poll()
    }

    /// Apply everything already queued without waiting. Returns the count.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.poll_event() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply one stream event to the store.
    pub fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Diagnostics { device_id, update } => {
                self.store
                    .add_diagnostic_data(&device_id, update.diagnostics);
            }
            FeedEvent::Failed { device_id, error } => {
                match &error {
                    ClientError::NotFound(_) => warn!("Device {} not found", device_id),
                    other => warn!("Stream for {} failed: {}", device_id, other),
                }
                self.last_error = Some(format!("{device_id}: {error}"));
            }
        }
    }

    /// Snapshot of the store as JSON.
    pub fn export_json(&self) -> serde_json::Value {
        let devices: Vec<serde_json::Value> = self
            .store
            .devices()
            .iter()
            .map(|d| {
                json!({
                    "device": d,
                    "diagnostics": self.store.diagnostics(&d.device_id),
                    "history": self.store.history(&d.device_id).map(|h| h.to_vec()),
                })
            })
            .collect();

        // Watched devices that the list does not contain.
        let unlisted: Vec<serde_json::Value> = self
            .streams
            .iter()
            .map(DiagnosticsStream::device_id)
            .filter(|id| self.store.device(id).is_none())
            .map(|id| {
                json!({
                    "device_id": id,
                    "diagnostics": self.store.diagnostics(id),
                    "history": self.store.history(id).map(|h| h.to_vec()),
                })
            })
            .collect();

        json!({
            "endpoint": self.client.endpoint().as_str(),
            "selected_device_id": self.store.selected_device_id(),
            "devices": devices,
            "unlisted": unlisted,
            "last_error": self.last_error,
        })
    }

    /// Write [`App::export_json`] to `path`, pretty-printed.
    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.export_json())?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Exported state to {}", path.display());
        Ok(())
    }
}
