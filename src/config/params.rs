//! Stream parameter translation from loose configuration records
//!
//! Applications describe a stream direction as a table of named integer
//! fields. Everything is validated here, on the control thread, before any
//! driver-facing value exists: a half-built parameter set never reaches
//! the native layer.

use crate::driver::StreamParams;
use crate::error::{BridgeError, Result};
use toml::value::Table;
use toml::Value;

/// Pull one required non-negative integer field out of a record
fn required_field(table: &Table, key: &str) -> Result<u32> {
    let value = table
        .get(key)
        .ok_or_else(|| BridgeError::config(format!("missing required field '{}'", key)))?;
    let raw = value
        .as_integer()
        .ok_or_else(|| BridgeError::config(format!("field '{}' must be an integer", key)))?;
    u32::try_from(raw)
        .map_err(|_| BridgeError::config(format!("field '{}' must be a non-negative integer", key)))
}

/// Translate a configuration record into driver stream parameters.
///
/// Requires the integer fields `device_id`, `channels` and
/// `first_channel`; `channels` must be positive.
pub fn from_table(table: &Table) -> Result<StreamParams> {
    let device_id = required_field(table, "device_id")?;
    let channels = required_field(table, "channels")?;
    let first_channel = required_field(table, "first_channel")?;

    if channels == 0 {
        return Err(BridgeError::config("field 'channels' must be positive"));
    }

    Ok(StreamParams {
        device_id,
        channels,
        first_channel,
    })
}

/// Translate a whole configuration value, which must be a table
pub fn from_value(value: &Value) -> Result<StreamParams> {
    let table = value
        .as_table()
        .ok_or_else(|| BridgeError::config("stream parameters must be a table"))?;
    from_table(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(device_id: i64, channels: i64, first_channel: i64) -> Table {
        let mut table = Table::new();
        table.insert("device_id".to_string(), Value::Integer(device_id));
        table.insert("channels".to_string(), Value::Integer(channels));
        table.insert("first_channel".to_string(), Value::Integer(first_channel));
        table
    }

    #[test]
    fn test_valid_record_echoes_fields() {
        let params = from_table(&record(3, 2, 1)).unwrap();
        assert_eq!(params.device_id, 3);
        assert_eq!(params.channels, 2);
        assert_eq!(params.first_channel, 1);
    }

    #[test]
    fn test_missing_field_fails() {
        for key in ["device_id", "channels", "first_channel"] {
            let mut table = record(0, 2, 0);
            table.remove(key);
            let err = from_table(&table).unwrap_err();
            assert!(matches!(err, BridgeError::Configuration(_)));
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn test_non_integer_field_fails() {
        let mut table = record(0, 2, 0);
        table.insert(
            "channels".to_string(),
            Value::String("stereo".to_string()),
        );
        let err = from_table(&table).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_negative_field_fails() {
        let err = from_table(&record(-1, 2, 0)).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_zero_channels_fails() {
        let err = from_table(&record(0, 0, 0)).unwrap_err();
        assert!(err.to_string().contains("channels"));
    }

    #[test]
    fn test_from_value_requires_table() {
        let err = from_value(&Value::Integer(1)).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
        assert!(from_value(&Value::Table(record(0, 1, 0))).is_ok());
    }
}
