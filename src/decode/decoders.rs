//! Decoder implementations
//!
//! Each decoder handles a specific body layout.

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::Value;

// ============================================================================
// JSON Decoder
// ============================================================================

/// Whole-document JSON decoder
///
/// An array yields one record per element, anything else yields itself.
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))?;

        match value {
            Value::Array(arr) => Ok(arr),
            other => Ok(vec![other]),
        }
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON object per line)
#[derive(Debug, Clone, Default)]
pub struct JsonlDecoder;

impl JsonlDecoder {
    /// Create a new JSONL decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonlDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let mut records = Vec::new();

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| {
                Error::decode(format!("Failed to parse JSONL at line {}: {e}", line_num + 1))
            })?;

            records.push(value);
        }

        Ok(records)
    }
}

// ============================================================================
// Auto Decoder
// ============================================================================

/// Tries the body as one JSON document, then as JSON Lines
#[derive(Debug, Clone, Default)]
pub struct AutoJsonDecoder {
    json: JsonDecoder,
    jsonl: JsonlDecoder,
}

impl AutoJsonDecoder {
    /// Create a new auto-detecting decoder
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordDecoder for AutoJsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        match self.json.decode(body) {
            Ok(records) => Ok(records),
            // Multi-line logs fail whole-document parsing with trailing characters
            Err(_) => self.jsonl.decode(body),
        }
    }
}
