//! # gRPC Client Options
//!
//! Functional options for configuring gRPC clients, with a typed side-channel
//! for transport settings the core configuration does not know about.
//!
//! A client is configured from a list of [`ClientOption`] values applied in
//! order to a [`ClientOptions`]. Core fields (content type, pool, timeouts,
//! retries) live on the struct itself; transport concerns ride in its
//! [`Context`], keyed by private marker types so independent modules never
//! collide.
//!
//! ## Features
//!
//! - **Codecs**: register a codec per content type; registrations merge
//! - **TLS auth**: attach a `ClientTlsConfig` for the transport to use
//! - **Dialers**: swap connection establishment, or route everything through
//!   a fixed proxy endpoint
//! - **Environment config**: build options from `GRPC_CLIENT_*` variables
//!
//! ## Quick Start
//!
//! ### Basic Usage
//! ```ignore
//! use grpc_options::{ClientOptions, JsonCodec, options};
//! use std::sync::Arc;
//!
//! let opts = ClientOptions::new([
//!     options::codec("application/grpc+json", Arc::new(JsonCodec))?,
//!     options::proxy_dialer("egress-proxy:3128")?,
//! ]);
//! ```
//!
//! ### Reading options back in the transport
//! ```ignore
//! use grpc_options::{channel::create_channel, options};
//!
//! let codec = options::resolve_codec(&opts, &opts.content_type)?;
//! // Applies timeouts and TLS, and connects through the dialer entry when set
//! let channel = create_channel("https://tasks.internal:50051", &opts).await?;
//! ```
//!
//! ### From the environment
//! ```ignore
//! let opts = ClientOptions::from_env()?;
//! ```

pub mod channel;
pub mod codec;
pub mod context;
pub mod dialer;
pub mod error;
pub mod options;

// Re-export main types and functions for convenience
pub use channel::{create_channel, create_channel_lazy, endpoint};
pub use codec::{Codec, CodecTable, JsonCodec, default_codecs};
pub use context::{Context, ContextKey};
pub use dialer::{BoxConnection, Connection, DialFuture, Dialer, dial_tcp, with_dial_timeout};
pub use error::{CodecError, DialError, GrpcError, GrpcResult};
pub use options::{CallOptions, ClientOption, ClientOptions};
