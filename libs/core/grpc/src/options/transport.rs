//! gRPC transport options carried in the [`Context`](crate::context::Context)
//! side-channel
//!
//! Each concern owns a private marker key, so nothing outside this module can
//! read or clobber these entries except through the accessors below. An
//! absent entry means "use the transport default": the built-in codecs, the
//! system TLS posture, the plain TCP dialer.
//!
//! ## Example
//! ```ignore
//! use grpc_options::{ClientOptions, options};
//! use tonic::transport::ClientTlsConfig;
//!
//! let opts = ClientOptions::new([
//!     options::codec("application/grpc+json", Arc::new(JsonCodec))?,
//!     options::auth_tls(ClientTlsConfig::new().domain_name("tasks.internal")),
//!     options::proxy_dialer("egress-proxy:3128")?,
//! ]);
//!
//! let tls = options::tls_auth(&opts);
//! ```

use super::{ClientOption, ClientOptions};
use crate::codec::{Codec, CodecTable, default_codecs};
use crate::context::ContextKey;
use crate::dialer::{BoxConnection, DialFuture, Dialer, dial_tcp};
use crate::error::{DialError, GrpcError, GrpcResult};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::ClientTlsConfig;

struct CodecsKey;
struct TlsAuthKey;
struct DialerKey;

impl ContextKey for CodecsKey {
  type Value = CodecTable;
}

impl ContextKey for TlsAuthKey {
  type Value = Arc<ClientTlsConfig>;
}

impl ContextKey for DialerKey {
  type Value = Dialer;
}

/// Register `codec` for `content_type`
///
/// Registration merges into the existing table: codecs for other content
/// types are kept, and only an entry for the same content type is replaced.
///
/// Rejects an empty content type.
pub fn codec(content_type: impl Into<String>, codec: Arc<dyn Codec>) -> GrpcResult<ClientOption> {
  let content_type = content_type.into();
  if content_type.is_empty() {
    return Err(GrpcError::InvalidArgument(
      "codec content type must not be empty".to_string(),
    ));
  }

  Ok(ClientOption::new(move |o| {
    let ctx = o.context_mut();
    // Read-modify-write: the key itself is last-write-wins
    let mut table = ctx.get::<CodecsKey>().cloned().unwrap_or_default();
    table.insert(content_type.clone(), codec.clone());
    tracing::debug!(
      target: "grpc_options",
      content_type = %content_type,
      codec = codec.name(),
      registered = table.len(),
      "Registered codec"
    );
    ctx.insert::<CodecsKey>(table);
  }))
}

/// Use `config` to authenticate the connection with TLS
///
/// Last applied wins.
pub fn auth_tls(config: impl Into<Arc<ClientTlsConfig>>) -> ClientOption {
  let config = config.into();
  ClientOption::new(move |o| {
    tracing::debug!(target: "grpc_options", "Set TLS auth");
    o.context_mut().insert::<TlsAuthKey>(config.clone());
  })
}

/// Establish connections with `dial` instead of the default TCP dialer
///
/// `dial` receives the target address and the dial timeout. Last applied
/// wins, whether set here or through [`proxy_dialer`].
///
/// ## Example
/// ```ignore
/// let opt = options::dialer(|addr, timeout| async move {
///     let stream = dial_tcp(&addr, timeout).await?;
///     Ok(Box::new(stream) as BoxConnection)
/// });
/// ```
pub fn dialer<F, Fut>(dial: F) -> ClientOption
where
  F: Fn(String, Duration) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<BoxConnection, DialError>> + Send + 'static,
{
  let dial: Dialer = Arc::new(move |addr: String, timeout: Duration| -> DialFuture {
    dial(addr, timeout).boxed()
  });
  ClientOption::new(move |o| {
    tracing::debug!(target: "grpc_options", "Set custom dialer");
    o.context_mut().insert::<DialerKey>(dial.clone());
  })
}

/// Route every connection through `proxy_addr`
///
/// The generated dialer ignores the requested address and opens a TCP
/// connection to the proxy within the dial timeout.
///
/// Rejects an empty proxy address.
pub fn proxy_dialer(proxy_addr: impl Into<String>) -> GrpcResult<ClientOption> {
  let proxy_addr: Arc<str> = Arc::from(proxy_addr.into());
  if proxy_addr.is_empty() {
    return Err(GrpcError::InvalidArgument(
      "proxy address must not be empty".to_string(),
    ));
  }

  Ok(dialer(move |addr, timeout| {
    let proxy_addr = proxy_addr.clone();
    async move {
      tracing::debug!(
        target: "grpc_options",
        requested = %addr,
        proxy = %proxy_addr,
        "Dialing through proxy"
      );
      let stream = dial_tcp(&proxy_addr, timeout).await?;
      Ok::<_, DialError>(Box::new(stream) as BoxConnection)
    }
  }))
}

/// Codecs registered through [`codec`]
pub fn codecs(options: &ClientOptions) -> Option<&CodecTable> {
  options.context()?.get::<CodecsKey>()
}

/// TLS configuration set through [`auth_tls`]
pub fn tls_auth(options: &ClientOptions) -> Option<&Arc<ClientTlsConfig>> {
  options.context()?.get::<TlsAuthKey>()
}

/// Dialer set through [`dialer`] or [`proxy_dialer`]
pub fn custom_dialer(options: &ClientOptions) -> Option<&Dialer> {
  options.context()?.get::<DialerKey>()
}

/// Codec for `content_type`: a registered override first, then the built-in
/// defaults
pub fn resolve_codec(options: &ClientOptions, content_type: &str) -> GrpcResult<Arc<dyn Codec>> {
  if let Some(codec) = codecs(options).and_then(|table| table.get(content_type)) {
    return Ok(codec.clone());
  }

  default_codecs()
    .remove(content_type)
    .ok_or_else(|| GrpcError::UnsupportedContentType(content_type.to_string()))
}
