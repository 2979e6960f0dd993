//! Diagnostics snapshots and the samples derived from them.

use chrono::{DateTime, Utc};

use crate::{Device, DeviceStatus};

/// A point-in-time health snapshot for one device.
///
/// A new snapshot replaces the previous one for its device; snapshots are
/// never merged field by field.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Diagnostics {
    pub hardware_version: String,
    pub software_version: String,
    pub firmware_version: String,

    /// CPU usage in percent (0-100).
    pub cpu_usage: f64,

    /// Memory usage in percent (0-100).
    pub memory_usage: f64,

    pub device_status: DeviceStatus,

    /// Integrity checksum computed by the device.
    pub checksum: String,
}

/// One decoded record of a diagnostics stream.
///
/// The backend may send the diagnostics alone or accompanied by the device
/// they belong to and the time they were taken.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiagnosticsUpdate {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub device: Option<Device>,

    pub diagnostics: Diagnostics,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DiagnosticsUpdate {
    /// Wrap a bare snapshot.
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            device: None,
            diagnostics,
            updated_at: None,
        }
    }
}

impl From<Diagnostics> for DiagnosticsUpdate {
    fn from(diagnostics: Diagnostics) -> Self {
        Self::new(diagnostics)
    }
}

/// A lightweight history entry extracted from a diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosticsSample {
    /// Unix timestamp in milliseconds when the sample was recorded.
    pub timestamp_ms: u64,
    pub cpu: f64,
    pub memory: f64,
}

impl DiagnosticsSample {
    /// Derive a sample from a snapshot at the given time.
    pub fn from_diagnostics(diagnostics: &Diagnostics, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            cpu: diagnostics.cpu_usage,
            memory: diagnostics.memory_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_diagnostics() {
        let diagnostics = Diagnostics {
            cpu_usage: 12.5,
            memory_usage: 80.0,
            ..Default::default()
        };

        let sample = DiagnosticsSample::from_diagnostics(&diagnostics, 1000);
        assert_eq!(sample.timestamp_ms, 1000);
        assert_eq!(sample.cpu, 12.5);
        assert_eq!(sample.memory, 80.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_diagnostics_decode() {
        let diagnostics: Diagnostics = serde_json::from_str(r#"{"cpu_usage":1}"#).unwrap();
        assert_eq!(diagnostics.cpu_usage, 1.0);
        assert_eq!(diagnostics.memory_usage, 0.0);
        assert_eq!(diagnostics.device_status, DeviceStatus::Unspecified);
        assert!(diagnostics.checksum.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_update_decode() {
        let json = r#"{
            "device": {"device_id": "edge-01"},
            "diagnostics": {"cpu_usage": 3.5, "device_status": "DEVICE_STATUS_HEALTHY"},
            "updated_at": "2024-05-01T10:00:00.250Z"
        }"#;

        let update: DiagnosticsUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.device.unwrap().device_id, "edge-01");
        assert_eq!(update.diagnostics.cpu_usage, 3.5);
        assert_eq!(update.diagnostics.device_status, DeviceStatus::Healthy);
        assert!(update.updated_at.is_some());
    }
}
