//! JSON value codec.

use bytes::Bytes;

use kvhub_core::result::AppResult;
use kvhub_core::traits::codec::Codec;

/// Encodes values as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &serde_json::Value) -> AppResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode(&self, bytes: &[u8]) -> AppResult<serde_json::Value> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
