//! Caller-supplied endpoint constructor.

use crate::endpoint::Endpoint;
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Constructs fresh [`Endpoint`]s. Invoked with the wrapper's own cancellation
/// scope — not the caller's — so that closing the wrapper terminates any
/// in-flight connect attempt.
///
/// Returning `None` signals a *construction* failure ("could not build an
/// endpoint right now") and causes the restart loop to continue, subject to
/// backoff and `max_attempts`. It is distinct from the triggering error that
/// started the restart: that error is tracked separately as `last_error` and
/// is what eventually surfaces in [`crate::StreamError::RestartExhausted`].
///
/// The wrapper never invokes the factory concurrently: it holds exclusive
/// lifecycle access across every call.
#[async_trait]
pub trait StreamFactory: Send + Sync {
    type Endpoint: Endpoint;

    async fn connect(&self, scope: CancellationToken) -> Option<Self::Endpoint>;
}

#[async_trait]
impl<F, Fut, Ep> StreamFactory for F
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Ep>> + Send,
    Ep: Endpoint,
{
    type Endpoint = Ep;

    async fn connect(&self, scope: CancellationToken) -> Option<Ep> {
        (self)(scope).await
    }
}
