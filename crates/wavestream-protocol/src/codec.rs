//! Sample encoders for the streaming channel.
//!
//! Samples go out either as a JSON [`SampleFrame`] or as a bare CSV line.
//! Sessions with any other output format encode nothing.

use crate::command::OutputFormat;
use crate::messages::{ErrorMessage, SampleFrame, SampleRow, ServerMessage};
use thiserror::Error;

/// Errors that can occur during message encoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization failed.
    #[error("Failed to serialize message: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Encode a server message to a JSON string for WebSocket transmission.
pub fn encode_server_message(msg: &ServerMessage) -> Result<String, CodecError> {
    serde_json::to_string(msg).map_err(CodecError::from)
}

/// Encode the error frame.
pub fn encode_error(error: &ErrorMessage) -> Result<String, CodecError> {
    encode_server_message(&ServerMessage::Error(error.clone()))
}

/// Encode one row as a JSON sample frame.
pub fn encode_json(row: &SampleRow, datastreams: &[String]) -> Result<String, CodecError> {
    encode_server_message(&ServerMessage::Sample(SampleFrame::new(row, datastreams)))
}

/// Encode one row as `timestamp,value1,value2,...`.
///
/// No header, no trailing delimiter and no newline. The timestamp is
/// rounded to millis like the JSON frame.
pub fn encode_csv(row: &SampleRow) -> String {
    let frame_timestamp = wavestream_core::round_millis(row.timestamp);
    std::iter::once(frame_timestamp)
        .chain(row.values.iter().copied())
        .map(format_number)
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode one row in the session's output format.
///
/// Returns `Ok(None)` for formats that produce no output.
pub fn encode_sample(
    row: &SampleRow,
    datastreams: &[String],
    format: &OutputFormat,
) -> Result<Option<String>, CodecError> {
    match format {
        OutputFormat::Json => encode_json(row, datastreams).map(Some),
        OutputFormat::Csv => Ok(Some(encode_csv(row))),
        OutputFormat::Other(_) => Ok(None),
    }
}

// Shortest round-trip form, whole numbers without a trailing ".0".
fn format_number(value: f64) -> String {
    format!("{}", value + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_row() -> SampleRow {
        SampleRow {
            timestamp: 1_729_333_333.123_4,
            values: vec![0.105, -1.0],
        }
    }

    fn demo_ids() -> Vec<String> {
        vec!["1002345".to_string(), "299345".to_string()]
    }

    #[test]
    fn test_encode_json_frame() {
        let json = encode_json(&demo_row(), &demo_ids()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["timestamp"], 1_729_333_333.123);
        assert_eq!(value["datastreams"], serde_json::json!(["1002345", "299345"]));
        assert_eq!(value["data"].as_array().unwrap().len(), 1);
        assert_eq!(value["data"][0], serde_json::json!([0.105, -1.0]));
    }

    #[test]
    fn test_encode_csv_line() {
        let csv = encode_csv(&demo_row());
        assert_eq!(csv, "1729333333.123,0.105,-1");
        assert!(!csv.ends_with(','));
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_csv_field_count() {
        for n in 0..5 {
            let row = SampleRow {
                timestamp: 12.5,
                values: vec![1.0; n],
            };
            let csv = encode_csv(&row);
            assert_eq!(csv.split(',').count(), 1 + n);
            assert!(!csv.contains("timestamp"));
        }
    }

    #[test]
    fn test_csv_number_format() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_encode_sample_by_format() {
        let row = demo_row();
        let ids = demo_ids();

        let json = encode_sample(&row, &ids, &OutputFormat::Json).unwrap();
        assert!(json.unwrap().starts_with('{'));

        let csv = encode_sample(&row, &ids, &OutputFormat::Csv).unwrap();
        assert_eq!(csv.as_deref(), Some("1729333333.123,0.105,-1"));

        let other = encode_sample(&row, &ids, &OutputFormat::Other("xml".into())).unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_encode_error() {
        let json = encode_error(&ErrorMessage::no_valid_identifiers()).unwrap();
        assert_eq!(json, r#"{"error":"No valid UUIDs provided"}"#);
    }
}
