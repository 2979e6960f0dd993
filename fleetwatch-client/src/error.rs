//! Error types for the REST and streaming client.

use thiserror::Error;

/// Errors surfaced by [`FleetClient`](crate::FleetClient) calls and by the
/// error callback of a diagnostics stream.
///
/// Cancelling a stream is never reported as an error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The device or resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The response body broke off or could not be read.
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// The configured endpoint is not a usable base URL.
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else if err.is_body() {
            ClientError::Body(err.to_string())
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

/// A stream line that could not be decoded into a diagnostics record.
///
/// These are recovered locally: the line is dropped and the stream goes on.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = ClientError::Status {
            status: 503,
            body: "device unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Server returned status 503: device unavailable"
        );
    }

    #[test]
    fn test_record_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("NOT-JSON").unwrap_err();
        let err = RecordError::from(json_err);
        assert!(err.to_string().starts_with("invalid JSON"));
    }
}
