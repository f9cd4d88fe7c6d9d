use crate::dialer::{BoxConnection, Dialer};
use crate::error::{DialError, GrpcError, GrpcResult};
use crate::options::{ClientOptions, custom_dialer, tls_auth};
use futures::FutureExt;
use futures::future::BoxFuture;
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::{Service, service_fn};

type ConnectorFuture = BoxFuture<'static, Result<TokioIo<BoxConnection>, DialError>>;

/// Builds a tonic endpoint from finished client options
///
/// Applies:
/// - Connect timeout: `call.dial_timeout`
/// - Request timeout: `call.request_timeout`
/// - TLS: the [`auth_tls`](crate::options::auth_tls) side-channel entry, when set
///
/// Without a TLS entry the endpoint keeps tonic's default posture. The dialer
/// entry cannot live on an `Endpoint`; use [`create_channel`] or
/// [`create_channel_lazy`] to connect through it. Codec entries are read by
/// the caller through [`resolve_codec`](crate::options::resolve_codec).
///
/// ## Example
/// ```ignore
/// use grpc_options::{ClientOptions, channel::endpoint, options};
/// use tonic::transport::ClientTlsConfig;
///
/// let opts = ClientOptions::new([
///     options::auth_tls(ClientTlsConfig::new().domain_name("tasks.internal")),
/// ]);
/// let endpoint = endpoint("https://tasks.internal:50051", &opts)?;
/// ```
pub fn endpoint(addr: impl Into<String>, options: &ClientOptions) -> GrpcResult<Endpoint> {
  let addr_string = addr.into();

  let mut endpoint = Endpoint::from_shared(addr_string.clone()).map_err(|e| {
    tracing::error!(target: "grpc_options", addr = %addr_string, error = ?e, "Invalid URI");
    GrpcError::InvalidUri(e)
  })?;

  endpoint = endpoint
    .connect_timeout(options.call.dial_timeout)
    .timeout(options.call.request_timeout);

  let tls = tls_auth(options);
  if let Some(tls) = tls {
    endpoint = endpoint.tls_config((**tls).clone()).map_err(|e| {
      tracing::error!(target: "grpc_options", addr = %addr_string, error = ?e, "TLS config rejected");
      GrpcError::Tls(e)
    })?;
  }

  tracing::debug!(
    target: "grpc_options",
    addr = %addr_string,
    tls = tls.is_some(),
    "Built gRPC endpoint"
  );

  Ok(endpoint)
}

/// Connects a gRPC channel using every transport setting in `options`
///
/// Builds the [`endpoint`], then connects through the custom dialer when one
/// is set (including [`proxy_dialer`](crate::options::proxy_dialer)). The
/// dialer receives the URI authority as its address and `call.dial_timeout`.
/// Without a dialer tonic's own TCP connector is used.
///
/// ## Example
/// ```ignore
/// use grpc_options::{ClientOptions, channel::create_channel, options};
/// use rpc::tasks::tasks_service_client::TasksServiceClient;
///
/// let opts = ClientOptions::new([options::proxy_dialer("egress-proxy:3128")?]);
/// let channel = create_channel("http://tasks.internal:50051", &opts).await?;
/// let client = TasksServiceClient::new(channel);
/// ```
pub async fn create_channel(addr: impl Into<String>, options: &ClientOptions) -> GrpcResult<Channel> {
  let addr_string = addr.into();
  let endpoint = endpoint(addr_string.clone(), options)?;

  let result = match custom_dialer(options) {
    Some(dial) => {
      tracing::debug!(target: "grpc_options", addr = %addr_string, "Connecting through custom dialer");
      endpoint
        .connect_with_connector(connector(dial.clone(), options.call.dial_timeout))
        .await
    }
    None => endpoint.connect().await,
  };

  result.map_err(|e| {
    tracing::error!(
      target: "grpc_options",
      addr = %addr_string,
      error = ?e,
      "Failed to connect to gRPC service"
    );
    GrpcError::ConnectionFailed(e)
  })
}

/// Creates a channel that connects on first request
///
/// Same dialer handling as [`create_channel`], without waiting for the
/// connection.
pub fn create_channel_lazy(addr: impl Into<String>, options: &ClientOptions) -> GrpcResult<Channel> {
  let endpoint = endpoint(addr, options)?;

  Ok(match custom_dialer(options) {
    Some(dial) => {
      endpoint.connect_with_connector_lazy(connector(dial.clone(), options.call.dial_timeout))
    }
    None => endpoint.connect_lazy(),
  })
}

/// Adapts a [`Dialer`] to the connector service tonic expects
fn connector(
  dial: Dialer,
  timeout: Duration,
) -> impl Service<Uri, Response = TokioIo<BoxConnection>, Error = DialError, Future = ConnectorFuture>
+ Send
+ 'static {
  service_fn(move |uri: Uri| -> ConnectorFuture {
    let dial = dial.clone();
    async move {
      let conn = dial(dial_target(&uri), timeout).await?;
      Ok(TokioIo::new(conn))
    }
    .boxed()
  })
}

/// `host:port` for a URI, filling in the scheme's default port
fn dial_target(uri: &Uri) -> String {
  let host = uri.host().unwrap_or_default();
  let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
    Some("https") => 443,
    _ => 80,
  });
  format!("{host}:{port}")
}
