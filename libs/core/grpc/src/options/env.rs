//! Client options loaded from environment variables.

use super::{
  ClientOption, ClientOptions, DEFAULT_CONTENT_TYPE, DEFAULT_DIAL_TIMEOUT, DEFAULT_POOL_SIZE,
  DEFAULT_POOL_TTL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRIES, content_type, dial_timeout,
  pool_size, pool_ttl, proxy_dialer, request_timeout, retries,
};
use crate::error::{GrpcError, GrpcResult};
use std::env::{self, VarError};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_CONTENT_TYPE: &str = "GRPC_CLIENT_CONTENT_TYPE";
pub const ENV_POOL_SIZE: &str = "GRPC_CLIENT_POOL_SIZE";
pub const ENV_POOL_TTL_SECS: &str = "GRPC_CLIENT_POOL_TTL_SECS";
pub const ENV_DIAL_TIMEOUT_SECS: &str = "GRPC_CLIENT_DIAL_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "GRPC_CLIENT_REQUEST_TIMEOUT_SECS";
pub const ENV_RETRIES: &str = "GRPC_CLIENT_RETRIES";
pub const ENV_PROXY: &str = "GRPC_CLIENT_PROXY";

impl ClientOptions {
  /// Load configuration from environment variables.
  ///
  /// Reads:
  /// - `GRPC_CLIENT_CONTENT_TYPE` (default: application/json)
  /// - `GRPC_CLIENT_POOL_SIZE` (default: 1)
  /// - `GRPC_CLIENT_POOL_TTL_SECS` (default: 60)
  /// - `GRPC_CLIENT_DIAL_TIMEOUT_SECS` (default: 5)
  /// - `GRPC_CLIENT_REQUEST_TIMEOUT_SECS` (default: 30)
  /// - `GRPC_CLIENT_RETRIES` (default: 1)
  /// - `GRPC_CLIENT_PROXY` (optional, routes every dial through this address)
  ///
  /// Unset variables fall back to defaults; values that fail to parse are
  /// reported as [`GrpcError::InvalidConfig`].
  pub fn from_env() -> GrpcResult<Self> {
    Ok(Self::new(options_from_env()?))
  }
}

/// The options [`ClientOptions::from_env`] applies, for callers that want to
/// append their own before building
pub fn options_from_env() -> GrpcResult<Vec<ClientOption>> {
  let mut options = vec![
    content_type(env_or_default(ENV_CONTENT_TYPE, DEFAULT_CONTENT_TYPE)?)
      .map_err(|e| invalid(ENV_CONTENT_TYPE, e))?,
    pool_size(env_parse(ENV_POOL_SIZE, DEFAULT_POOL_SIZE)?),
    pool_ttl(env_secs(ENV_POOL_TTL_SECS, DEFAULT_POOL_TTL)?),
    dial_timeout(env_secs(ENV_DIAL_TIMEOUT_SECS, DEFAULT_DIAL_TIMEOUT)?),
    request_timeout(env_secs(ENV_REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT)?),
    retries(env_parse(ENV_RETRIES, DEFAULT_RETRIES)?),
  ];

  if let Some(proxy) = env_var(ENV_PROXY)? {
    options.push(proxy_dialer(proxy).map_err(|e| invalid(ENV_PROXY, e))?);
  }

  tracing::debug!(target: "grpc_options", count = options.len(), "Loaded client options from environment");
  Ok(options)
}

/// Helper to load an environment variable with a default value
///
/// Only an unset variable falls back to `default`; a value that is not valid
/// UTF-8 is reported as [`GrpcError::InvalidConfig`].
pub fn env_or_default(key: &str, default: &str) -> GrpcResult<String> {
  Ok(env_var(key)?.unwrap_or_else(|| default.to_string()))
}

fn env_var(key: &str) -> GrpcResult<Option<String>> {
  match env::var(key) {
    Ok(raw) => Ok(Some(raw)),
    Err(VarError::NotPresent) => Ok(None),
    Err(e @ VarError::NotUnicode(_)) => Err(GrpcError::InvalidConfig {
      key: key.to_string(),
      details: e.to_string(),
    }),
  }
}

fn env_parse<T>(key: &str, default: T) -> GrpcResult<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env_var(key)? {
    Some(raw) => raw.trim().parse().map_err(|e: T::Err| GrpcError::InvalidConfig {
      key: key.to_string(),
      details: format!("'{raw}': {e}"),
    }),
    None => Ok(default),
  }
}

fn env_secs(key: &str, default: Duration) -> GrpcResult<Duration> {
  env_parse(key, default.as_secs()).map(Duration::from_secs)
}

fn invalid(key: &str, err: GrpcError) -> GrpcError {
  GrpcError::InvalidConfig {
    key: key.to_string(),
    details: err.to_string(),
  }
}
