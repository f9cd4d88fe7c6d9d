//! Pluggable message codecs keyed by content type
//!
//! A [`Codec`] turns the dynamic message form ([`serde_json::Value`]) into
//! bytes and back. Typed callers go through `encode` and `decode` on
//! `dyn Codec`, which bridge any serde type to the dynamic form.
//!
//! ## Usage
//!
//! ```ignore
//! use grpc_options::codec::{Codec, JsonCodec};
//!
//! let codec: &dyn Codec = &JsonCodec;
//! let bytes = codec.encode(&task)?;
//! let task_back: Task = codec.decode(&bytes)?;
//! ```

use crate::error::CodecError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Content type -> codec; at most one codec per content type
pub type CodecTable = HashMap<String, Arc<dyn Codec>>;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_GRPC_JSON: &str = "application/grpc+json";

/// Encode/decode capability for one wire format
pub trait Codec: Send + Sync + Debug {
  /// Short name used in logs and errors
  fn name(&self) -> &'static str;

  fn marshal(&self, message: &Value) -> Result<Vec<u8>, CodecError>;

  fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError>;
}

impl<'a> dyn Codec + 'a {
  /// Encode any serializable message
  pub fn encode<T: Serialize>(&self, message: &T) -> Result<Vec<u8>, CodecError> {
    let value = serde_json::to_value(message).map_err(|source| CodecError::Encode {
      codec: self.name(),
      source,
    })?;
    self.marshal(&value)
  }

  /// Decode bytes into a typed message
  pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
    let value = self.unmarshal(data)?;
    serde_json::from_value(value).map_err(|source| CodecError::Decode {
      codec: self.name(),
      source,
    })
  }
}

/// JSON wire format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
  fn name(&self) -> &'static str {
    "json"
  }

  fn marshal(&self, message: &Value) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(message).map_err(|source| CodecError::Encode {
      codec: self.name(),
      source,
    })
  }

  fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError> {
    serde_json::from_slice(data).map_err(|source| CodecError::Decode {
      codec: self.name(),
      source,
    })
  }
}

/// Codecs the transport falls back to when no override is registered
pub fn default_codecs() -> CodecTable {
  let json: Arc<dyn Codec> = Arc::new(JsonCodec);
  let mut table = CodecTable::new();
  table.insert(CONTENT_TYPE_JSON.to_string(), json.clone());
  table.insert(CONTENT_TYPE_GRPC_JSON.to_string(), json);
  table
}
