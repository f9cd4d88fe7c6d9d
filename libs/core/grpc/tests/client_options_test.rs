//! End-to-end tests for client option construction
//!
//! These tests go through the public API only:
//! - Building options from a caller-supplied list
//! - Reading side-channel entries back the way a transport would
//! - Dialing through the configured dialer
//! - Connecting a channel through a proxy taken from the environment
//! - Encoding a message with the resolved codec

use grpc_options::options::{self, custom_dialer, resolve_codec, tls_auth};
use grpc_options::{BoxConnection, ClientOptions, DialError, JsonCodec, create_channel, endpoint};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tonic::transport::ClientTlsConfig;

#[tokio::test]
async fn test_transport_reads_back_everything_the_caller_set() {
  let proxy = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let proxy_addr = proxy.local_addr().unwrap().to_string();

  let opts = ClientOptions::new([
    options::content_type("application/grpc+json").unwrap(),
    options::dial_timeout(Duration::from_secs(2)),
    options::codec("application/grpc+json", Arc::new(JsonCodec)).unwrap(),
    options::auth_tls(ClientTlsConfig::new().domain_name("tasks.internal")),
    options::proxy_dialer(proxy_addr).unwrap(),
  ]);

  // Codec
  let codec = resolve_codec(&opts, &opts.content_type).unwrap();
  let bytes = codec.encode(&json!({ "title": "ship it" })).unwrap();
  assert_eq!(bytes, br#"{"title":"ship it"}"#.to_vec());

  // TLS
  assert!(tls_auth(&opts).is_some());

  // Dialer: bytes written on the dialed connection arrive at the proxy
  let dial = custom_dialer(&opts).unwrap().clone();
  let timeout = opts.call.dial_timeout;
  let (dialed, accepted) = tokio::join!(
    dial("tasks.internal:50051".to_string(), timeout),
    proxy.accept()
  );

  let mut conn: BoxConnection = match dialed {
    Ok(conn) => conn,
    Err(e) => panic!("dial through proxy failed: {e}"),
  };
  let (mut server_side, _) = accepted.unwrap();

  conn.write_all(b"ping").await.unwrap();
  let mut buf = [0u8; 4];
  server_side.read_exact(&mut buf).await.unwrap();
  assert_eq!(&buf, b"ping");
}

#[tokio::test]
async fn test_custom_dialer_receives_requested_address_and_timeout() {
  let opts = ClientOptions::new([
    options::dial_timeout(Duration::from_millis(750)),
    options::dialer(|addr, timeout| async move {
      Err::<BoxConnection, _>(DialError::Timeout { addr, timeout })
    }),
  ]);

  let dial = custom_dialer(&opts).unwrap();
  let err = dial("users:50051".to_string(), opts.call.dial_timeout)
    .await
    .err()
    .unwrap();

  match err {
    DialError::Timeout { addr, timeout } => {
      assert_eq!(addr, "users:50051");
      assert_eq!(timeout, Duration::from_millis(750));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_finished_options_are_shareable_across_threads() {
  let opts = Arc::new(ClientOptions::new([
    options::codec("application/grpc+json", Arc::new(JsonCodec)).unwrap(),
    options::retries(3),
  ]));

  let handles: Vec<_> = (0..4)
    .map(|_| {
      let opts = Arc::clone(&opts);
      std::thread::spawn(move || {
        let codec = resolve_codec(&opts, "application/grpc+json").unwrap();
        (codec.name(), opts.call.retries)
      })
    })
    .collect();

  for handle in handles {
    assert_eq!(handle.join().unwrap(), ("json", 3));
  }
}

#[test]
fn test_endpoint_from_options() {
  let opts = ClientOptions::new([options::request_timeout(Duration::from_secs(10))]);
  let endpoint = endpoint("http://127.0.0.1:50051", &opts).unwrap();
  assert_eq!(endpoint.uri().port_u16(), Some(50051));
}

#[tokio::test]
async fn test_channel_from_env_proxy_connects_through_proxy() {
  let proxy = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let proxy_addr = proxy.local_addr().unwrap().to_string();

  let opts = temp_env::with_var("GRPC_CLIENT_PROXY", Some(&proxy_addr), || {
    ClientOptions::from_env().unwrap()
  });

  let connecting =
    tokio::spawn(async move { create_channel("http://tasks.internal:50051", &opts).await });

  let accepted = tokio::time::timeout(Duration::from_secs(5), proxy.accept()).await;
  connecting.abort();

  assert!(matches!(accepted, Ok(Ok(_))));
}
