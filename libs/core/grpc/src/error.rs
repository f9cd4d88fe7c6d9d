use std::io;
use std::time::Duration;
use thiserror::Error;

pub type GrpcResult<T> = Result<T, GrpcError>;

/// Errors that can occur while building client options or consuming them
#[derive(Error, Debug)]
pub enum GrpcError {
  /// Invalid URI provided for an endpoint
  #[error("Invalid URI: {0}")]
  InvalidUri(#[from] tonic::transport::Error),

  /// Failed to establish a channel
  #[error("Connection failed: {0}")]
  ConnectionFailed(tonic::transport::Error),

  /// An option constructor was given an argument it cannot accept
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  /// An environment variable could not be parsed
  #[error("Invalid configuration for '{key}': {details}")]
  InvalidConfig { key: String, details: String },

  /// No codec registered or built in for the content type
  #[error("Unsupported content type: {0}")]
  UnsupportedContentType(String),

  /// The TLS side-channel setting was rejected by the transport
  #[error("Invalid TLS configuration: {0}")]
  Tls(tonic::transport::Error),

  #[error(transparent)]
  Dial(#[from] DialError),

  #[error(transparent)]
  Codec(#[from] CodecError),
}

/// Connection-establishment failures reported by a dialer
#[derive(Error, Debug)]
pub enum DialError {
  #[error("Dial to {addr} timed out after {timeout:?}")]
  Timeout { addr: String, timeout: Duration },

  #[error("Connection to {addr} refused: {source}")]
  Refused {
    addr: String,
    #[source]
    source: io::Error,
  },

  #[error("Network unreachable for {addr}: {source}")]
  Unreachable {
    addr: String,
    #[source]
    source: io::Error,
  },

  #[error("Failed to connect to {addr}: {source}")]
  Io {
    addr: String,
    #[source]
    source: io::Error,
  },
}

impl DialError {
  /// Classify an I/O error returned by the underlying connect call
  pub fn from_io(addr: impl Into<String>, timeout: Duration, source: io::Error) -> Self {
    let addr = addr.into();
    match source.kind() {
      io::ErrorKind::TimedOut => DialError::Timeout { addr, timeout },
      io::ErrorKind::ConnectionRefused => DialError::Refused { addr, source },
      io::ErrorKind::NetworkUnreachable | io::ErrorKind::HostUnreachable => {
        DialError::Unreachable { addr, source }
      }
      _ => DialError::Io { addr, source },
    }
  }

  /// Address the dial was attempted against
  pub fn addr(&self) -> &str {
    match self {
      DialError::Timeout { addr, .. }
      | DialError::Refused { addr, .. }
      | DialError::Unreachable { addr, .. }
      | DialError::Io { addr, .. } => addr,
    }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, DialError::Timeout { .. })
  }
}

/// Failures while encoding or decoding a message with a codec
#[derive(Error, Debug)]
pub enum CodecError {
  #[error("{codec} codec failed to encode message: {source}")]
  Encode {
    codec: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("{codec} codec failed to decode message: {source}")]
  Decode {
    codec: &'static str,
    #[source]
    source: serde_json::Error,
  },
}

// Implement conversion to tonic::Status so transport code can bubble errors up
impl From<GrpcError> for tonic::Status {
  fn from(err: GrpcError) -> Self {
    match err {
      GrpcError::InvalidUri(_)
      | GrpcError::InvalidArgument(_)
      | GrpcError::InvalidConfig { .. }
      | GrpcError::UnsupportedContentType(_)
      | GrpcError::Tls(_) => tonic::Status::invalid_argument(err.to_string()),
      GrpcError::ConnectionFailed(_) | GrpcError::Dial(_) => tonic::Status::unavailable(err.to_string()),
      GrpcError::Codec(_) => tonic::Status::internal(err.to_string()),
    }
  }
}
