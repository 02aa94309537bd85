// `{"data": ...}` wrapper used by every request and response body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The wire envelope around every payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Serialize a request body. `None` produces no body.
pub fn encode<B: Serialize + ?Sized>(body: Option<&B>) -> Result<Option<Vec<u8>>, serde_json::Error> {
    body.map(serde_json::to_vec).transpose()
}

/// Strip the envelope and decode `data` straight into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice::<Envelope<T>>(bytes).map(|env| env.data)
}

/// Strip the envelope but leave `data` untyped, for callers that must
/// inspect the payload before choosing a target type.
pub fn decode_raw(bytes: &[u8]) -> Result<serde_json::Value, serde_json::Error> {
    decode(bytes)
}
