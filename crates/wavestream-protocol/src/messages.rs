//! Wire message types.
//!
//! This module defines everything the server puts on the wire:
//! - REST: the device listing returned by `/v1/get_devices`
//! - WebSocket: sample frames and the error frame
//!
//! Messages are serialized as JSON; samples may also go out as CSV lines
//! (see [`crate::codec`]).

use serde::{Deserialize, Serialize};
use wavestream_core::{round_millis, Color, DeviceDescriptor, DeviceRegistry, SignalType};

/// Error text sent when a command names no known device.
pub const NO_VALID_IDENTIFIERS: &str = "No valid UUIDs provided";

// ============================================================================
// Device Listing (REST)
// ============================================================================

/// One entry of the device listing.
///
/// The signal type is deliberately not part of the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    #[serde(rename = "UUID")]
    pub uuid: String,
    pub color: Color,
}

impl From<&DeviceDescriptor> for DeviceSummary {
    fn from(device: &DeviceDescriptor) -> Self {
        Self {
            uuid: device.identifier.clone(),
            color: device.color,
        }
    }
}

/// Response body for `GET /v1/get_devices`.
///
/// # Example
/// ```json
/// {
///   "datastreams": [
///     { "UUID": "1002345", "color": { "r": 0, "g": 0, "b": 255 } },
///     { "UUID": "299345", "color": { "r": 255, "g": 0, "b": 0 } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceListing {
    pub datastreams: Vec<DeviceSummary>,
}

impl DeviceListing {
    /// Snapshot of the registry in registry order.
    pub fn from_registry(registry: &DeviceRegistry) -> Self {
        Self {
            datastreams: registry.list().iter().map(DeviceSummary::from).collect(),
        }
    }
}

// ============================================================================
// Samples (WebSocket)
// ============================================================================

/// Current wall-clock time in seconds since the Unix epoch, millisecond
/// resolution.
pub fn unix_seconds_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// One sample per selected device, all taken at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    /// Values in session order.
    pub values: Vec<f64>,
}

impl SampleRow {
    /// Evaluate every signal at `timestamp`.
    pub fn at(timestamp: f64, signals: &[SignalType]) -> Self {
        Self {
            timestamp,
            values: signals.iter().map(|s| s.emitted_sample(timestamp)).collect(),
        }
    }
}

/// JSON sample frame.
///
/// `data` always holds exactly one row; the nesting is part of the wire
/// format clients parse.
///
/// # Example
/// ```json
/// {
///   "timestamp": 1729333333.123,
///   "datastreams": ["1002345", "299345"],
///   "data": [[0.105, 1.0]]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFrame {
    pub timestamp: f64,
    pub datastreams: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

impl SampleFrame {
    pub fn new(row: &SampleRow, datastreams: &[String]) -> Self {
        Self {
            timestamp: round_millis(row.timestamp),
            datastreams: datastreams.to_vec(),
            data: vec![row.values.clone()],
        }
    }
}

/// Error frame sent back on the streaming channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// The error for a command that matched no registered device.
    pub fn no_valid_identifiers() -> Self {
        Self::new(NO_VALID_IDENTIFIERS)
    }
}

// ============================================================================
// Unified Message Enum
// ============================================================================

/// JSON messages the server sends over the streaming channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Periodic sample frame.
    Sample(SampleFrame),

    /// Rejected subscription command.
    Error(ErrorMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_omits_signal_type() {
        let listing = DeviceListing::from_registry(&DeviceRegistry::demo());
        let json = serde_json::to_value(&listing).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "datastreams": [
                    { "UUID": "1002345", "color": { "r": 0, "g": 0, "b": 255 } },
                    { "UUID": "299345", "color": { "r": 255, "g": 0, "b": 0 } }
                ]
            })
        );
        assert!(!serde_json::to_string(&listing).unwrap().contains("type"));
    }

    #[test]
    fn test_listing_matches_registry_of_any_size() {
        for size in 0..5 {
            let devices = (0..size)
                .map(|i| {
                    DeviceDescriptor::new(
                        format!("dev-{i}"),
                        Color::new(i as u8, 0, 0),
                        if i % 2 == 0 { SignalType::Sine } else { SignalType::Square },
                    )
                })
                .collect();
            let registry = DeviceRegistry::new(devices).unwrap();
            let listing = DeviceListing::from_registry(&registry);

            assert_eq!(listing.datastreams.len(), size);
            for (summary, device) in listing.datastreams.iter().zip(registry.list()) {
                assert_eq!(summary.uuid, device.identifier);
                assert_eq!(summary.color, device.color);
            }
        }
    }

    #[test]
    fn test_sample_row_follows_signal_order() {
        let row = SampleRow::at(15.0, &[SignalType::Square, SignalType::Sine]);
        assert_eq!(row.timestamp, 15.0);
        assert_eq!(row.values, vec![1.0, 1.0]);

        let row = SampleRow::at(45.0, &[SignalType::Sine, SignalType::Square]);
        assert_eq!(row.values, vec![-1.0, -1.0]);
    }

    #[test]
    fn test_sample_frame_shape() {
        let row = SampleRow {
            timestamp: 1_729_333_333.123_4,
            values: vec![0.105, -1.0],
        };
        let ids = vec!["1002345".to_string(), "299345".to_string()];
        let frame = SampleFrame::new(&row, &ids);

        assert_eq!(frame.timestamp, 1_729_333_333.123);
        assert_eq!(frame.datastreams, ids);
        assert_eq!(frame.data.len(), 1);
        assert_eq!(frame.data[0], vec![0.105, -1.0]);
    }

    #[test]
    fn test_wall_clock_seconds() {
        let before = unix_seconds_now();
        let after = unix_seconds_now();

        // Seconds since the epoch with millisecond resolution.
        assert!(before > 1_600_000_000.0);
        assert!(after >= before);
        let millis = before * 1000.0;
        assert!((millis - millis.round()).abs() < 1e-3);
    }

    #[test]
    fn test_error_message() {
        let json = serde_json::to_string(&ErrorMessage::no_valid_identifiers()).unwrap();
        assert_eq!(json, r#"{"error":"No valid UUIDs provided"}"#);
    }

    #[test]
    fn test_server_message_untagged() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"error":"No valid UUIDs provided"}"#).unwrap();
        assert_eq!(msg, ServerMessage::Error(ErrorMessage::no_valid_identifiers()));

        let msg: ServerMessage = serde_json::from_str(
            r#"{"timestamp":1.5,"datastreams":["1002345"],"data":[[0.5]]}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::Sample(frame) => assert_eq!(frame.data, vec![vec![0.5]]),
            _ => panic!("Expected Sample"),
        }
    }
}
