//! Convenient re-exports for common `reconnecting-stream` types.
pub use crate::{
    Backoff, ConfigError, Endpoint, RestartConfig, RestartConfigBuilder, RestartableBidiStream,
    Sleeper, StreamError, StreamFactory, StreamState,
};
