//! Connection establishment used by custom and proxy dialers

use crate::error::DialError;
use futures::future::BoxFuture;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Any bidirectional byte stream a dialer can hand to the transport
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

pub type BoxConnection = Box<dyn Connection>;

pub type DialFuture = BoxFuture<'static, Result<BoxConnection, DialError>>;

/// `(address, timeout) -> connection`, invoked by the transport at connect time
pub type Dialer = Arc<dyn Fn(String, Duration) -> DialFuture + Send + Sync>;

/// Open a TCP connection to `addr`, giving up once `timeout` has elapsed
///
/// The returned future never outlives `timeout`: a connect still pending at
/// the deadline is dropped and reported as [`DialError::Timeout`].
///
/// ## Example
/// ```ignore
/// use grpc_options::dialer::dial_tcp;
/// use std::time::Duration;
///
/// let stream = dial_tcp("127.0.0.1:50051", Duration::from_secs(2)).await?;
/// ```
pub async fn dial_tcp(addr: &str, timeout: Duration) -> Result<TcpStream, DialError> {
  tracing::debug!(target: "grpc_options", addr = %addr, ?timeout, "Dialing TCP");
  with_dial_timeout(addr, timeout, TcpStream::connect(addr)).await
}

/// Bound `connect` by `timeout` and classify its failure
///
/// Any connect future works here, so custom dialers get the same timeout and
/// error semantics as [`dial_tcp`].
pub async fn with_dial_timeout<F, T>(addr: &str, timeout: Duration, connect: F) -> Result<T, DialError>
where
  F: Future<Output = io::Result<T>>,
{
  let result = match tokio::time::timeout(timeout, connect).await {
    Ok(Ok(conn)) => Ok(conn),
    Ok(Err(source)) => Err(DialError::from_io(addr, timeout, source)),
    Err(_elapsed) => Err(DialError::Timeout {
      addr: addr.to_string(),
      timeout,
    }),
  };

  if let Err(e) = &result {
    tracing::warn!(target: "grpc_options", addr = %addr, error = %e, "Dial failed");
  }

  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Instant;
  use tokio::net::TcpListener;

  #[tokio::test]
  async fn test_dial_tcp_connects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let (dialed, accepted) = tokio::join!(
      dial_tcp(&addr, Duration::from_secs(2)),
      listener.accept()
    );

    let stream = dialed.unwrap();
    let (_, peer) = accepted.unwrap();
    assert_eq!(stream.local_addr().unwrap(), peer);
  }

  #[tokio::test]
  async fn test_dial_tcp_no_listener_fails_within_timeout() {
    // Grab a free port, then close it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let timeout = Duration::from_secs(2);
    let started = Instant::now();
    let err = dial_tcp(&addr, timeout).await.unwrap_err();

    assert!(started.elapsed() < timeout + Duration::from_millis(500));
    assert_eq!(err.addr(), addr);
  }

  #[tokio::test(start_paused = true)]
  async fn test_with_dial_timeout_gives_up_at_deadline() {
    let timeout = Duration::from_secs(2);
    let started = tokio::time::Instant::now();

    let err = with_dial_timeout(
      "stalled:50051",
      timeout,
      std::future::pending::<io::Result<()>>(),
    )
    .await
    .unwrap_err();

    let elapsed = started.elapsed();
    assert!(err.is_timeout());
    assert_eq!(err.addr(), "stalled:50051");
    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + Duration::from_millis(100));
  }

  #[tokio::test]
  async fn test_with_dial_timeout_classifies_io_errors() {
    let err = with_dial_timeout("db:5432", Duration::from_secs(2), async {
      Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionRefused))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, DialError::Refused { .. }));
  }
}
