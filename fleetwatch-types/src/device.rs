//! Registered devices and the request bodies that create or update them.

use chrono::{DateTime, Utc};

use crate::{DeviceStatus, Protocol};

/// A device registered with the monitoring backend.
///
/// Every field defaults when absent so that partially populated backend
/// responses still decode.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Device {
    /// Backend-assigned record id.
    pub id: String,

    /// Unique device identifier, used as the key everywhere else.
    pub device_id: String,

    pub alias: String,
    pub host: String,

    #[cfg_attr(feature = "serde", serde(deserialize_with = "lenient_port::deserialize"))]
    pub port: u32,

    /// Port of the device's HTTP gateway.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "lenient_port::deserialize"))]
    pub port_gateway: u32,

    pub architecture: String,
    pub os: String,
    pub supported_protocols: Vec<Protocol>,

    /// Last status assigned through an update call.
    pub device_status: DeviceStatus,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub created_at: Option<DateTime<Utc>>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Create a device with only its identifier set.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ..Default::default()
        }
    }

    /// Display name: the alias if set, otherwise the device id.
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.device_id
        } else {
            &self.alias
        }
    }

    /// `host:port` of the device.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the device advertises the given protocol.
    pub fn supports(&self, protocol: Protocol) -> bool {
        self.supported_protocols.contains(&protocol)
    }
}

/// Body of `POST /v1/devices/{device_id}`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterDevice {
    pub device_id: String,
    pub alias: String,
    pub host: String,
    pub port: u32,
    pub port_gateway: u32,
    pub protocol: Protocol,
}

/// Body of `PATCH /v1/devices/{device_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceStatusUpdate {
    pub device_status: DeviceStatus,
}

// 64-bit integers may arrive as JSON strings.
#[cfg(feature = "serde")]
mod lenient_port {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Null(()),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) if s.trim().is_empty() => 0,
            Raw::Text(s) => s.trim().parse::<u64>().map_err(D::Error::custom)?,
            Raw::Null(()) => 0,
        };
        u32::try_from(value).map_err(|_| D::Error::custom(format!("port {value} out of range")))
    }
}
