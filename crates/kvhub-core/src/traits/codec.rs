//! Value codec trait.

use bytes::Bytes;

use crate::result::AppResult;

/// Encodes structured values to bytes and back.
///
/// Values pass through [`serde_json::Value`] so the trait stays object safe
/// and a client can hold any codec behind `Arc<dyn Codec>`.
pub trait Codec: Send + Sync + std::fmt::Debug + 'static {
    /// Short name used in logs (e.g. `"json"`).
    fn name(&self) -> &'static str;

    /// Encode a value to bytes.
    fn encode(&self, value: &serde_json::Value) -> AppResult<Bytes>;

    /// Decode bytes into a value.
    fn decode(&self, bytes: &[u8]) -> AppResult<serde_json::Value>;
}
