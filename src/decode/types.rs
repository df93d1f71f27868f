//! Decoder types and traits
//!
//! Defines the core decoder abstractions.

use super::decoders::{AutoJsonDecoder, JsonDecoder, JsonlDecoder};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Layout of the JSON inside one input object
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DecoderFormat {
    /// Whole-document JSON first, JSON Lines as fallback (default)
    #[default]
    Auto,
    /// A single JSON object or an array of objects
    Json,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
}

impl DecoderFormat {
    /// Build the decoder for this format
    pub fn decoder(self) -> Box<dyn RecordDecoder> {
        match self {
            DecoderFormat::Auto => Box::new(AutoJsonDecoder::new()),
            DecoderFormat::Json => Box::new(JsonDecoder::new()),
            DecoderFormat::Jsonl => Box::new(JsonlDecoder::new()),
        }
    }
}

/// Trait for decoding an object body into records
pub trait RecordDecoder: Send + Sync {
    /// Decode the body into a list of records
    fn decode(&self, body: &str) -> Result<Vec<Value>>;
}
