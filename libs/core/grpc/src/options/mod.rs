//! Client configuration object and the deferred options that build it
//!
//! A client is configured by listing [`ClientOption`] values; each one is a
//! mutation applied to a shared [`ClientOptions`] strictly in list order.
//! Core fields live directly on the struct. Transport-specific settings ride
//! in the typed [`Context`] side-channel (see [`transport`]).
//!
//! ## Publication
//!
//! Options are applied by a single caller, synchronously, before the finished
//! `ClientOptions` is handed to the transport layer. After that hand-off the
//! object is read-only; readers may share it behind an `Arc` without locking.
//!
//! ## Example
//! ```ignore
//! use grpc_options::{ClientOptions, options};
//! use std::time::Duration;
//!
//! let opts = ClientOptions::new([
//!     options::request_timeout(Duration::from_secs(120)),
//!     options::retries(3),
//!     options::codec("application/grpc+json", Arc::new(JsonCodec))?,
//! ]);
//! ```

pub mod env;
pub mod transport;

use crate::context::Context;
use crate::error::{GrpcError, GrpcResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use transport::{
  auth_tls, codec, codecs, custom_dialer, dialer, proxy_dialer, resolve_codec, tls_auth,
};

pub const DEFAULT_CONTENT_TYPE: &str = crate::codec::CONTENT_TYPE_JSON;
pub const DEFAULT_POOL_SIZE: usize = 1;
pub const DEFAULT_POOL_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRIES: u32 = 1;

/// Per-call settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOptions {
  pub dial_timeout: Duration,
  pub request_timeout: Duration,
  pub retries: u32,
}

impl Default for CallOptions {
  fn default() -> Self {
    Self {
      dial_timeout: DEFAULT_DIAL_TIMEOUT,
      request_timeout: DEFAULT_REQUEST_TIMEOUT,
      retries: DEFAULT_RETRIES,
    }
  }
}

/// Generic client configuration shared by every transport
#[derive(Debug, Clone)]
pub struct ClientOptions {
  /// Content type used to pick a codec for outgoing requests
  pub content_type: String,
  pub pool_size: usize,
  pub pool_ttl: Duration,
  pub call: CallOptions,
  /// Side-channel for settings unknown to this struct; absent until an
  /// option first writes to it
  pub context: Option<Context>,
}

impl Default for ClientOptions {
  fn default() -> Self {
    Self {
      content_type: DEFAULT_CONTENT_TYPE.to_string(),
      pool_size: DEFAULT_POOL_SIZE,
      pool_ttl: DEFAULT_POOL_TTL,
      call: CallOptions::default(),
      context: None,
    }
  }
}

impl ClientOptions {
  /// Build options from defaults by applying `options` in order
  pub fn new(options: impl IntoIterator<Item = ClientOption>) -> Self {
    let mut opts = Self::default();
    opts.apply(options);
    opts
  }

  /// Apply further options in order
  pub fn apply(&mut self, options: impl IntoIterator<Item = ClientOption>) -> &mut Self {
    for option in options {
      option.apply(self);
    }
    self
  }

  /// Side-channel, created empty on first use
  pub fn context_mut(&mut self) -> &mut Context {
    self.context.get_or_insert_with(Context::new)
  }

  /// Read-only side-channel access; `None` when nothing has been attached
  pub fn context(&self) -> Option<&Context> {
    self.context.as_ref()
  }
}

/// A deferred mutation of [`ClientOptions`]
///
/// Options are cheap to clone and may be applied any number of times.
#[derive(Clone)]
pub struct ClientOption(Arc<dyn Fn(&mut ClientOptions) + Send + Sync>);

impl ClientOption {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(&mut ClientOptions) + Send + Sync + 'static,
  {
    Self(Arc::new(f))
  }

  pub fn apply(&self, options: &mut ClientOptions) {
    (self.0)(options)
  }
}

impl fmt::Debug for ClientOption {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ClientOption")
  }
}

/// Default content type for requests
///
/// Rejects an empty content type.
pub fn content_type(content_type: impl Into<String>) -> GrpcResult<ClientOption> {
  let content_type = content_type.into();
  if content_type.is_empty() {
    return Err(GrpcError::InvalidArgument(
      "content type must not be empty".to_string(),
    ));
  }
  Ok(ClientOption::new(move |o| o.content_type = content_type.clone()))
}

/// Connection pool size
pub fn pool_size(size: usize) -> ClientOption {
  ClientOption::new(move |o| o.pool_size = size)
}

/// How long pooled connections are kept
pub fn pool_ttl(ttl: Duration) -> ClientOption {
  ClientOption::new(move |o| o.pool_ttl = ttl)
}

/// Timeout handed to the dialer when a connection is established
pub fn dial_timeout(timeout: Duration) -> ClientOption {
  ClientOption::new(move |o| o.call.dial_timeout = timeout)
}

/// Timeout for individual RPCs
pub fn request_timeout(timeout: Duration) -> ClientOption {
  ClientOption::new(move |o| o.call.request_timeout = timeout)
}

/// Number of times the transport may retry a call
pub fn retries(retries: u32) -> ClientOption {
  ClientOption::new(move |o| o.call.retries = retries)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_options() {
    let opts = ClientOptions::default();
    assert_eq!(opts.content_type, "application/json");
    assert_eq!(opts.pool_size, 1);
    assert_eq!(opts.pool_ttl, Duration::from_secs(60));
    assert_eq!(opts.call.dial_timeout, Duration::from_secs(5));
    assert_eq!(opts.call.request_timeout, Duration::from_secs(30));
    assert_eq!(opts.call.retries, 1);
    assert!(opts.context.is_none());
  }

  #[test]
  fn test_zero_options_leave_context_absent() {
    let opts = ClientOptions::new([]);
    assert!(opts.context().is_none());
  }

  #[test]
  fn test_core_options_do_not_touch_context() {
    let opts = ClientOptions::new([
      content_type("application/grpc+json").unwrap(),
      pool_size(8),
      pool_ttl(Duration::from_secs(5)),
      dial_timeout(Duration::from_secs(1)),
      request_timeout(Duration::from_secs(120)),
      retries(3),
    ]);

    assert_eq!(opts.content_type, "application/grpc+json");
    assert_eq!(opts.pool_size, 8);
    assert_eq!(opts.pool_ttl, Duration::from_secs(5));
    assert_eq!(
      opts.call,
      CallOptions {
        dial_timeout: Duration::from_secs(1),
        request_timeout: Duration::from_secs(120),
        retries: 3,
      }
    );
    assert!(opts.context.is_none());
  }

  #[test]
  fn test_options_apply_in_order() {
    let opts = ClientOptions::new([retries(2), retries(5), pool_size(3), pool_size(4)]);
    assert_eq!(opts.call.retries, 5);
    assert_eq!(opts.pool_size, 4);
  }

  #[test]
  fn test_apply_on_existing_options() {
    let mut opts = ClientOptions::new([retries(2)]);
    opts.apply([pool_size(10)]);
    assert_eq!(opts.call.retries, 2);
    assert_eq!(opts.pool_size, 10);
  }

  #[test]
  fn test_empty_content_type_rejected() {
    let err = content_type("").unwrap_err();
    assert!(matches!(err, GrpcError::InvalidArgument(_)));
  }

  #[test]
  fn test_context_mut_is_lazy_and_idempotent() {
    let mut opts = ClientOptions::default();
    assert!(opts.context.is_none());

    opts.context_mut();
    assert!(opts.context.as_ref().is_some_and(Context::is_empty));

    // Second call must not replace the existing bag
    struct Marker;
    impl crate::context::ContextKey for Marker {
      type Value = u8;
    }
    opts.context_mut().insert::<Marker>(1);
    opts.context_mut();
    assert_eq!(opts.context().and_then(|c| c.get::<Marker>()), Some(&1));
  }
}
