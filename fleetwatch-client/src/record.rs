//! Decoding of a single diagnostics stream line.
//!
//! Accepted shapes, all on one line:
//!
//! ```text
//! {"cpu_usage": 12.5, "memory_usage": 40, ...}                 bare snapshot
//! {"device": {...}, "diagnostics": {...}, "updated_at": "..."}  response
//! {"result": <either of the above>}                             envelope
//! ```

use fleetwatch_types::{Diagnostics, DiagnosticsUpdate};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::RecordError;

const ENVELOPE_FIELD: &str = "result";
const DIAGNOSTICS_FIELD: &str = "diagnostics";

/// Parse one non-blank stream line into a diagnostics update.
///
/// # Example
///
/// ```
/// use fleetwatch_client::parse_record;
///
/// let update = parse_record(r#"{"result":{"cpu_usage":42,"memory_usage":7}}"#).unwrap();
/// assert_eq!(update.diagnostics.cpu_usage, 42.0);
/// assert_eq!(update.diagnostics.memory_usage, 7.0);
/// ```
pub fn parse_record(line: &str) -> Result<DiagnosticsUpdate, RecordError> {
    let object = match serde_json::from_str::<Value>(line)? {
        Value::Object(object) => object,
        other => return Err(RecordError::NotAnObject(kind_of(&other))),
    };

    let mut payload = unwrap_envelope(object);
    let device = take_field(&mut payload, "device")?;
    let updated_at = take_field(&mut payload, "updated_at")?;

    let diagnostics: Diagnostics = match payload.remove(DIAGNOSTICS_FIELD) {
        Some(Value::Object(nested)) => serde_json::from_value(Value::Object(nested))?,
        _ => serde_json::from_value(Value::Object(payload))?,
    };

    Ok(DiagnosticsUpdate {
        device,
        diagnostics,
        updated_at,
    })
}

// Only an object-valued `result` is treated as an envelope.
fn unwrap_envelope(mut object: Map<String, Value>) -> Map<String, Value> {
    match object.remove(ENVELOPE_FIELD) {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            object.insert(ENVELOPE_FIELD.to_string(), other);
            object
        }
        None => object,
    }
}

fn take_field<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>, RecordError> {
    match object.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_types::DeviceStatus;

    #[test]
    fn test_bare_snapshot() {
        let update = parse_record(
            r#"{"hardware_version":"hw-2","cpu_usage":55.5,"memory_usage":12,"device_status":"DEVICE_STATUS_DEGRADED","checksum":"ab12"}"#,
        )
        .unwrap();

        assert!(update.device.is_none());
        assert!(update.updated_at.is_none());
        assert_eq!(update.diagnostics.hardware_version, "hw-2");
        assert_eq!(update.diagnostics.cpu_usage, 55.5);
        assert_eq!(update.diagnostics.memory_usage, 12.0);
        assert_eq!(update.diagnostics.device_status, DeviceStatus::Degraded);
        assert_eq!(update.diagnostics.checksum, "ab12");
    }

    #[test]
    fn test_envelope_is_unwrapped() {
        let update = parse_record(r#"{"result":{"cpu_usage":1,"memory_usage":2}}"#).unwrap();
        assert_eq!(update.diagnostics.cpu_usage, 1.0);
        assert_eq!(update.diagnostics.memory_usage, 2.0);
    }

    #[test]
    fn test_envelope_around_response() {
        let line = r#"{"result":{"device":{"device_id":"edge-01","port":8080},"diagnostics":{"cpu_usage":9},"updated_at":"2024-05-01T10:00:00Z"}}"#;
        let update = parse_record(line).unwrap();

        let device = update.device.unwrap();
        assert_eq!(device.device_id, "edge-01");
        assert_eq!(device.port, 8080);
        assert_eq!(update.diagnostics.cpu_usage, 9.0);
        assert!(update.updated_at.is_some());
    }

    #[test]
    fn test_non_object_result_is_not_an_envelope() {
        let update = parse_record(r#"{"result":null,"cpu_usage":4}"#).unwrap();
        assert_eq!(update.diagnostics.cpu_usage, 4.0);
    }

    #[test]
    fn test_unknown_status_is_unspecified() {
        let update = parse_record(r#"{"device_status":"DEVICE_STATUS_ON_FIRE"}"#).unwrap();
        assert_eq!(update.diagnostics.device_status, DeviceStatus::Unspecified);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            parse_record("NOT-JSON"),
            Err(RecordError::Json(_))
        ));
        assert!(matches!(
            parse_record("[1,2]"),
            Err(RecordError::NotAnObject("an array"))
        ));
        assert!(matches!(
            parse_record(r#"{"cpu_usage":"high"}"#),
            Err(RecordError::Json(_))
        ));
    }
}
