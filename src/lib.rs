#![forbid(unsafe_code)]

//! # reconnecting-stream
//!
//! A self-healing wrapper around a bidirectional RPC stream: exponential
//! backoff, transparent restart, and observable lifecycle events.
//!
//! The wrapper owns a caller-supplied [`Endpoint`] — an opaque, bidirectional,
//! ordered transport channel — and, on the first `send`/`receive` failure,
//! transparently tears it down and rebuilds it through a caller-supplied
//! [`StreamFactory`] with exponential backoff between attempts. Callers see a
//! handful of `async fn`s that either succeed or fail with a small, closed
//! [`StreamError`] taxonomy; they never see a raw transport error or have to
//! reconnect by hand.
//!
//! ## Quick start
//!
//! ```rust
//! use reconnecting_stream::{Endpoint, RestartConfig, RestartableBidiStream};
//! use async_trait::async_trait;
//! use std::io;
//! use tokio_util::sync::CancellationToken;
//!
//! struct EchoEndpoint;
//!
//! #[async_trait]
//! impl Endpoint for EchoEndpoint {
//!     type Req = String;
//!     type Res = String;
//!     type Error = io::Error;
//!
//!     async fn send(&self, _msg: &String) -> Result<(), io::Error> {
//!         Ok(())
//!     }
//!     async fn receive(&self) -> Result<String, io::Error> {
//!         Ok("pong".to_string())
//!     }
//!     async fn half_close_send(&self) -> Result<(), io::Error> {
//!         Ok(())
//!     }
//!     async fn half_close_receive(&self) -> Result<(), io::Error> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RestartConfig::defaults("echo");
//!     let stream = RestartableBidiStream::construct(
//!         CancellationToken::new(),
//!         |_scope: CancellationToken| async { Some(EchoEndpoint) },
//!         config,
//!         "echo",
//!     )
//!     .await?;
//!
//!     stream.send("ping".to_string()).await?;
//!     let reply = stream.receive().await?;
//!     assert_eq!(reply, "pong");
//!
//!     stream.close().await?;
//!     Ok(())
//! }
//! ```

mod backoff;
mod config;
mod endpoint;
mod error;
mod factory;
mod sleeper;
mod stream;

pub use backoff::Backoff;
pub use config::{RestartConfig, RestartConfigBuilder};
pub use endpoint::Endpoint;
pub use error::{ConfigError, StreamError};
pub use factory::StreamFactory;
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use stream::{RestartableBidiStream, StreamState};

pub mod prelude;
