//! The transport-level bidi channel the wrapper owns and replaces on failure.

use async_trait::async_trait;

/// A live bidirectional transport channel carrying ordered request/response
/// messages. Entirely opaque to the wrapper beyond these four operations —
/// framing, wire format, and RPC schema are the transport's concern.
///
/// Implementations are owned by exactly one [`crate::RestartableBidiStream`] at
/// a time; the wrapper never exposes a reference to callers.
#[async_trait]
pub trait Endpoint: Send + Sync {
    type Req: Send + Sync;
    type Res: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Takes `msg` by reference, not by value: the wrapper retains ownership of
    /// the request so it can retry the same message on a freshly-restarted
    /// endpoint without requiring `Req: Clone`.
    async fn send(&self, msg: &Self::Req) -> Result<(), Self::Error>;
    async fn receive(&self) -> Result<Self::Res, Self::Error>;
    async fn half_close_send(&self) -> Result<(), Self::Error>;
    async fn half_close_receive(&self) -> Result<(), Self::Error>;
}
