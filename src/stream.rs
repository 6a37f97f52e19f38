//! The restart state machine: owns the current endpoint, serialises lifecycle
//! transitions, and transparently re-creates the endpoint on failure.

use crate::config::RestartConfig;
use crate::endpoint::Endpoint;
use crate::error::StreamError;
use crate::factory::StreamFactory;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

type Err<F> = <<F as StreamFactory>::Endpoint as Endpoint>::Error;
type Req<F> = <<F as StreamFactory>::Endpoint as Endpoint>::Req;
type Res<F> = <<F as StreamFactory>::Endpoint as Endpoint>::Res;

/// Diagnostic snapshot of the restart loop, exposed by [`RestartableBidiStream::state`]
/// for logging and tests. This is not the control-flow representation — that's the
/// lock-guarded [`Inner`] below — it only names where an observer would place the
/// wrapper among `Open`/`Restarting`/`Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Restarting,
    Closed,
}

struct Inner<F: StreamFactory> {
    endpoint: Option<Arc<F::Endpoint>>,
    closed: bool,
    restarting: bool,
    retry_count: u64,
    last_error: Option<Arc<Err<F>>>,
}

/// A bidi RPC stream that survives transient transport failures, remote
/// restarts, and network partitions by transparently re-creating its endpoint
/// with exponential backoff.
///
/// Internal state lives behind a single `tokio::sync::RwLock`: shared access
/// for snapshotting the endpoint and reading counters, exclusive access for the
/// entire restart protocol (including its backoff wait and factory call — both
/// `.await` points, which is why this needs a `tokio` lock rather than a `std`
/// one). The lock is never held across a transport `send`/`receive`; it *is*
/// held across the restart protocol's sleep and factory call, serialising
/// restarts so only one reconnect happens at a time.
pub struct RestartableBidiStream<F: StreamFactory> {
    name: String,
    config: RestartConfig<Err<F>>,
    factory: F,
    scope: CancellationToken,
    state: RwLock<Inner<F>>,
}

impl<F> RestartableBidiStream<F>
where
    F: StreamFactory,
{
    /// Build a wrapper around one initial endpoint. Fails only if the factory's
    /// single construction call returns the no-endpoint sentinel, in which case
    /// the derived scope is cancelled before the error is returned.
    pub async fn construct(
        parent_scope: CancellationToken,
        factory: F,
        config: RestartConfig<Err<F>>,
        name: impl Into<String>,
    ) -> Result<Self, StreamError<Err<F>>> {
        let name = name.into();
        let scope = parent_scope.child_token();

        let endpoint = match factory.connect(scope.clone()).await {
            Some(endpoint) => endpoint,
            None => {
                scope.cancel();
                return Err(StreamError::ConstructionFailed);
            }
        };

        tracing::info!(stream = %name, "bidi stream constructed");

        Ok(Self {
            name,
            config,
            factory,
            scope,
            state: RwLock::new(Inner {
                endpoint: Some(Arc::new(endpoint)),
                closed: false,
                restarting: false,
                retry_count: 0,
                last_error: None,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of restart attempts made so far (successful or not). Monotonically
    /// non-decreasing for the life of the wrapper.
    pub async fn retry_count(&self) -> u64 {
        self.state.read().await.retry_count
    }

    /// The error that most recently *triggered* a restart — not necessarily the
    /// most recent error returned to a caller.
    pub async fn last_error(&self) -> Option<Arc<Err<F>>> {
        self.state.read().await.last_error.clone()
    }

    pub async fn state(&self) -> StreamState {
        let inner = self.state.read().await;
        if inner.closed {
            StreamState::Closed
        } else if inner.restarting {
            StreamState::Restarting
        } else {
            StreamState::Open
        }
    }

    /// Deliver `msg` on the live endpoint. On transient failure, transparently
    /// restarts and retries exactly once on the new endpoint.
    pub async fn send(&self, msg: Req<F>) -> Result<(), StreamError<Err<F>>> {
        let endpoint = self.snapshot_endpoint().await?;
        match endpoint.send(&msg).await {
            Ok(()) => Ok(()),
            Err(cause) => {
                self.restart(&endpoint, cause).await?;
                let endpoint = self.snapshot_endpoint().await?;
                endpoint.send(&msg).await.map_err(StreamError::Operation)
            }
        }
    }

    /// Return the next message from the live endpoint. On transient failure,
    /// transparently restarts and retries exactly once on the new endpoint.
    pub async fn receive(&self) -> Result<Res<F>, StreamError<Err<F>>> {
        let endpoint = self.snapshot_endpoint().await?;
        match endpoint.receive().await {
            Ok(res) => Ok(res),
            Err(cause) => {
                self.restart(&endpoint, cause).await?;
                let endpoint = self.snapshot_endpoint().await?;
                endpoint.receive().await.map_err(StreamError::Operation)
            }
        }
    }

    /// Half-close the request side of the live endpoint. No restart on failure;
    /// a no-op if the wrapper has no live endpoint (i.e. it is closed).
    pub async fn half_close_send(&self) -> Result<(), StreamError<Err<F>>> {
        match self.current_endpoint().await {
            Some(endpoint) => endpoint.half_close_send().await.map_err(StreamError::Operation),
            None => Ok(()),
        }
    }

    /// Half-close the response side of the live endpoint. No restart on failure;
    /// a no-op if the wrapper has no live endpoint (i.e. it is closed).
    pub async fn half_close_receive(&self) -> Result<(), StreamError<Err<F>>> {
        match self.current_endpoint().await {
            Some(endpoint) => endpoint.half_close_receive().await.map_err(StreamError::Operation),
            None => Ok(()),
        }
    }

    /// Idempotent. Sets `closed`, cancels the derived scope, and half-closes
    /// both directions of the live endpoint. Never fails.
    ///
    /// The scope is cancelled *before* the write lock is acquired: a restart
    /// that is mid-backoff holds the write lock for the whole protocol, so
    /// cancelling first is what lets `close()` interrupt it promptly instead of
    /// blocking until the restart loop gives up on its own.
    pub async fn close(&self) -> Result<(), StreamError<Err<F>>> {
        self.scope.cancel();
        let mut inner = self.state.write().await;
        if inner.closed {
            return Ok(());
        }
        inner.closed = true;
        inner.restarting = false;
        if let Some(endpoint) = inner.endpoint.take() {
            let _ = endpoint.half_close_send().await;
            let _ = endpoint.half_close_receive().await;
        }
        tracing::info!(stream = %self.name, "bidi stream closed");
        Ok(())
    }

    async fn current_endpoint(&self) -> Option<Arc<F::Endpoint>> {
        self.state.read().await.endpoint.clone()
    }

    async fn snapshot_endpoint(&self) -> Result<Arc<F::Endpoint>, StreamError<Err<F>>> {
        let inner = self.state.read().await;
        if inner.closed {
            return Err(StreamError::AlreadyClosed);
        }
        Ok(inner
            .endpoint
            .clone()
            .expect("an open (non-closed) stream always holds a live endpoint"))
    }

    /// The restart protocol of §4.4.3: runs under exclusive lifecycle access for
    /// its backoff sleep and factory call, which is what serialises concurrent
    /// restarts. The lock is dropped around every observer callback, though —
    /// callbacks are caller code, and a callback that calls back into this
    /// wrapper (`retry_count`, `last_error`, `close`) would deadlock against its
    /// own still-held write guard otherwise. The `restarting` flag, not lock
    /// possession, is what keeps a second concurrent caller from starting a
    /// duplicate reconnect during one of these windows: it's set before the
    /// first drop and only cleared by the same call that set it.
    ///
    /// `failed_endpoint` is the snapshot the caller observed failing. If, by the
    /// time exclusive access is acquired, the live endpoint is no longer that
    /// snapshot, another concurrent caller has already driven a restart to
    /// completion — this call returns immediately without touching the factory
    /// again, satisfying §5's "only one reconnect at a time" race guarantee.
    async fn restart(
        &self,
        failed_endpoint: &Arc<F::Endpoint>,
        triggering_error: Err<F>,
    ) -> Result<(), StreamError<Err<F>>> {
        let mut inner = self.state.write().await;
        if inner.closed {
            return Err(StreamError::AlreadyClosed);
        }

        if inner.restarting {
            // Someone else is already driving a restart for this endpoint,
            // possibly in one of the lock-free windows below. Don't race it.
            return Ok(());
        }

        if !inner.endpoint.as_ref().is_some_and(|live| Arc::ptr_eq(live, failed_endpoint)) {
            return Ok(());
        }

        let triggering_error = Arc::new(triggering_error);
        inner.last_error = Some(triggering_error.clone());
        inner.restarting = true;

        let mut wait = self.config.backoff.initial();
        let mut attempt: usize = 0;

        loop {
            if self.config.max_attempts > 0 && attempt >= self.config.max_attempts {
                inner.restarting = false;
                drop(inner);

                tracing::warn!(
                    stream = %self.name,
                    attempts = attempt,
                    error = %triggering_error,
                    "bidi stream restart exhausted"
                );
                if let Some(on_exhausted) = &self.config.on_exhausted {
                    on_exhausted(triggering_error.as_ref());
                }

                return Err(StreamError::RestartExhausted {
                    attempts: attempt,
                    cause: triggering_error,
                });
            }

            attempt += 1;
            inner.retry_count += 1;
            drop(inner);

            tracing::debug!(
                stream = %self.name,
                attempt,
                error = %triggering_error,
                "restarting bidi stream"
            );
            if let Some(on_attempt) = &self.config.on_attempt {
                on_attempt(attempt, triggering_error.as_ref());
            }

            // Re-acquire before the cancellable sleep: holding the lock from
            // here through the factory call below is what serialises this
            // restart against any other concurrent one.
            inner = self.state.write().await;

            tokio::select! {
                _ = self.config.sleeper.sleep(wait) => {}
                _ = self.scope.cancelled() => {
                    inner.restarting = false;
                    return Err(StreamError::Cancelled);
                }
            }

            match self.factory.connect(self.scope.clone()).await {
                Some(new_endpoint) => {
                    if let Some(old) = inner.endpoint.take() {
                        let _ = old.half_close_send().await;
                        let _ = old.half_close_receive().await;
                    }
                    inner.endpoint = Some(Arc::new(new_endpoint));
                    inner.restarting = false;
                    drop(inner);

                    tracing::info!(stream = %self.name, attempt, "bidi stream restarted");
                    if let Some(on_success) = &self.config.on_success {
                        on_success(attempt);
                    }

                    return Ok(());
                }
                None => {
                    wait = self.config.backoff.next(wait);
                }
            }
        }
    }
}
