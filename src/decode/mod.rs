//! Record decoder module
//!
//! Supports: JSON documents, JSON Lines, and auto-detection between the two
//!
//! # Overview
//!
//! Every input object fetched from storage is decoded into a list of JSON
//! records before it is converted to Arrow. Catalog files usually hold one
//! object per file, event logs one object per line.

mod decoders;
mod types;

pub use decoders::{AutoJsonDecoder, JsonDecoder, JsonlDecoder};
pub use types::{DecoderFormat, RecordDecoder};
