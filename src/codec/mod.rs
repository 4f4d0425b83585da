//! Codec module - payload serialization for handler arguments and results.
//!
//! - [`JsonCodec`] - JSON via `serde_json` (socket.io text payloads)
//! - [`MsgPackCodec`] - MessagePack via `rmp-serde` (binary payloads)
//!
//! Codecs are marker structs with static methods. [`PayloadFormat`] picks one
//! at runtime so channels and handlers can share a single setting.
//!
//! # Example
//!
//! ```
//! use sockwire::codec::{JsonCodec, PayloadFormat};
//!
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! assert_eq!(&encoded[..], br#""hello""#);
//!
//! let decoded: String = PayloadFormat::Json.decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod json;
mod msgpack;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encoding used for message payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadFormat {
    /// JSON text.
    #[default]
    Json,
    /// MessagePack, structs as maps.
    MsgPack,
}

impl PayloadFormat {
    /// Encode a value into payload bytes.
    pub fn encode<T: Serialize>(self, value: &T) -> Result<Bytes> {
        match self {
            PayloadFormat::Json => JsonCodec::encode(value),
            PayloadFormat::MsgPack => MsgPackCodec::encode(value).map(Bytes::from),
        }
    }

    /// Decode payload bytes into `T`.
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            PayloadFormat::Json => JsonCodec::decode(bytes),
            PayloadFormat::MsgPack => MsgPackCodec::decode(bytes),
        }
    }
}
