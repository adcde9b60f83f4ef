//! Output formatting for human and JSON modes.

use highwater::{CellRecord, Error};
use serde_json::json;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of a command, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Value { key: String, value: i64 },
    Record { key: String, record: Option<CellRecord> },
}

pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match (output, mode) {
        (Output::Value { value, .. }, OutputMode::Human) => value.to_string(),
        (Output::Value { key, value }, OutputMode::Json) => {
            json!({ "key": key, "value": value }).to_string()
        }
        (Output::Record { record: None, .. }, OutputMode::Human) => "(nil)".to_string(),
        (Output::Record { record: Some(r), .. }, OutputMode::Human) => format!(
            "value: {}\nversion: {}\nupdated_at: {}",
            r.value, r.version, r.updated_at
        ),
        (Output::Record { key, record }, OutputMode::Json) => match record {
            Some(r) => json!({
                "key": key,
                "value": r.value,
                "version": r.version,
                "updated_at": r.updated_at,
            })
            .to_string(),
            None => json!({ "key": key, "value": null }).to_string(),
        },
    }
}

pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Human => format!("(error) {}", err),
        OutputMode::Json => json!({
            "error": err.to_string(),
            "not_initialized": err.is_not_initialized(),
            "retryable": err.is_retryable(),
        })
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_output() {
        let out = Output::Value {
            key: "k".into(),
            value: -3,
        };
        assert_eq!(format_output(&out, OutputMode::Human), "-3");
        let parsed: serde_json::Value =
            serde_json::from_str(&format_output(&out, OutputMode::Json)).unwrap();
        assert_eq!(parsed["key"], "k");
        assert_eq!(parsed["value"], -3);
    }

    #[test]
    fn test_missing_record_output() {
        let out = Output::Record {
            key: "k".into(),
            record: None,
        };
        assert_eq!(format_output(&out, OutputMode::Human), "(nil)");
        let parsed: serde_json::Value =
            serde_json::from_str(&format_output(&out, OutputMode::Json)).unwrap();
        assert!(parsed["value"].is_null());
    }

    #[test]
    fn test_record_output() {
        let out = Output::Record {
            key: "k".into(),
            record: Some(CellRecord::with_version(9, 3, 1_700_000_000_000)),
        };
        assert_eq!(
            format_output(&out, OutputMode::Human),
            "value: 9\nversion: 3\nupdated_at: 1700000000000"
        );
        let parsed: serde_json::Value =
            serde_json::from_str(&format_output(&out, OutputMode::Json)).unwrap();
        assert_eq!(parsed["version"], 3);
    }

    #[test]
    fn test_error_output() {
        let err = Error::NotInitialized("k".into());
        assert_eq!(
            format_error(&err, OutputMode::Human),
            "(error) cell not initialized: k"
        );
        let parsed: serde_json::Value =
            serde_json::from_str(&format_error(&err, OutputMode::Json)).unwrap();
        assert_eq!(parsed["not_initialized"], true);
    }
}
