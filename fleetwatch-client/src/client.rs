//! REST client for the monitoring backend.
//!
//! ## Endpoints
//!
//! | Call | Request |
//! |------|---------|
//! | [`FleetClient::list_devices`] | `GET /v1/devices` |
//! | [`FleetClient::register_device`] | `POST /v1/devices/{device_id}` |
//! | [`FleetClient::update_device`] | `PATCH /v1/devices/{device_id}` |
//! | [`FleetClient::stream_diagnostics`] | `GET /v1/diagnostics/{device_id}/stream` |
//!
//! The request/response calls carry a per-request timeout. The diagnostics
//! stream does not: a stalled stream waits until it is cancelled.

use std::time::Duration;

use fleetwatch_types::{Device, DeviceStatus, DeviceStatusUpdate, RegisterDevice};
use futures_util::TryStreamExt;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::stream::{DiagnosticsHandler, DiagnosticsStream};
use crate::ClientError;

const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the device registry and diagnostics streams.
#[derive(Debug, Clone)]
pub struct FleetClient {
    client: Client,
    endpoint: Url,
    request_timeout: Duration,
}

impl FleetClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> FleetClientBuilder {
        FleetClientBuilder::default()
    }

    /// The base URL requests are made against.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// List all registered devices.
    pub async fn list_devices(&self) -> Result<Vec<Device>, ClientError> {
        let url = self.url(&["v1", "devices"])?;

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = check_status(response, "device list").await?;

        let list: ListDevicesResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        debug!("Listed {} devices", list.devices.len());
        Ok(list.devices)
    }

    /// Register a device and return the stored record.
    pub async fn register_device(&self, request: &RegisterDevice) -> Result<Device, ClientError> {
        let url = self.url(&["v1", "devices", &request.device_id])?;

        let response = self
            .client
            .post(url)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;
        let response = check_status(response, &request.device_id).await?;

        let registered: RegisterDeviceResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        let device = registered
            .device
            .ok_or_else(|| ClientError::Parse("response has no device".to_string()))?;
        info!("Registered device {}", device.device_id);
        Ok(device)
    }

    /// Set the status of a device.
    pub async fn update_device(
        &self,
        device_id: &str,
        status: DeviceStatus,
    ) -> Result<(), ClientError> {
        let url = self.url(&["v1", "devices", device_id])?;

        let response = self
            .client
            .patch(url)
            .timeout(self.request_timeout)
            .json(&DeviceStatusUpdate {
                device_status: status,
            })
            .send()
            .await?;
        check_status(response, device_id).await?;

        info!("Updated device {} to {}", device_id, status);
        Ok(())
    }

    /// Open the live diagnostics stream of a device.
    ///
    /// Returns immediately; the connection is made on the spawned stream
    /// task. Connection failures and non-success statuses reach
    /// `handler.on_error`. The device id is not checked locally. Opening a
    /// second stream for the same device is allowed and fully independent.
    pub fn stream_diagnostics<H>(&self, device_id: &str, handler: H) -> DiagnosticsStream
    where
        H: DiagnosticsHandler,
    {
        let client = self.client.clone();
        let url = self.url(&["v1", "diagnostics", device_id, "stream"]);
        let target = device_id.to_string();

        let connect = async move {
            let url = url?;
            info!("Opening diagnostics stream {}", url);
            let response = client.get(url).send().await?;
            let response = check_status(response, &target).await?;
            Ok::<_, ClientError>(response.bytes_stream().map_err(ClientError::from))
        };

        DiagnosticsStream::spawn(device_id, connect, handler)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Builder for [`FleetClient`].
#[derive(Debug, Default)]
pub struct FleetClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl FleetClientBuilder {
    /// Set the backend base URL (e.g. "http://localhost:8080").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the timeout of request/response calls (default: 10 seconds).
    ///
    /// Does not apply to diagnostics streams.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<FleetClient, ClientError> {
        let raw = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint =
            Url::parse(&raw).map_err(|e| ClientError::Endpoint(format!("{raw}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::Endpoint(raw));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(FleetClient {
            client,
            endpoint,
            request_timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

async fn check_status(response: Response, subject: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(subject.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Response of `GET /v1/devices`.
#[derive(Debug, Deserialize)]
struct ListDevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

/// Response of `POST /v1/devices/{device_id}`.
#[derive(Debug, Deserialize)]
struct RegisterDeviceResponse {
    #[serde(default)]
    device: Option<Device>,
}
