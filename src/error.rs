//! Error taxonomy for the restartable bidi stream.
//!
//! `transport-failure` and `construction-failure` never escape this crate: they
//! are always resolved by a restart or rolled up into [`StreamError::RestartExhausted`].
//! Only `cancelled`, `restart-exhausted`, and `already-closed` are surfaced to callers,
//! plus whatever `E` the retried operation itself returns.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Errors a [`crate::RestartableBidiStream`] can surface to its caller.
///
/// `E` is the transport's own error type, returned by `send`/`receive`/`half_close_*`
/// on the [`crate::Endpoint`] trait. `RestartExhausted` carries the cause as `Arc<E>`
/// rather than `E` so this type doesn't need to require `E: Clone` — the same `Arc`
/// backs both this error and [`crate::RestartableBidiStream::last_error`].
#[derive(Debug)]
pub enum StreamError<E> {
    /// An operation was attempted after [`crate::RestartableBidiStream::close`] was
    /// called. Treated by convention as an end-of-stream marker.
    AlreadyClosed,
    /// The restart loop was cancelled (wrapper or parent scope) before an endpoint
    /// could be adopted.
    Cancelled,
    /// `max_attempts` restart attempts were made without adopting a new endpoint.
    /// `attempts` is the number of attempts consumed, `cause` the error that
    /// originally triggered the restart.
    RestartExhausted { attempts: usize, cause: Arc<E> },
    /// The retried operation on the freshly-adopted endpoint itself failed. This is
    /// surfaced verbatim — the wrapper does not restart a second time within one call.
    Operation(E),
    /// [`crate::RestartableBidiStream::construct`]'s single factory call returned the
    /// no-endpoint sentinel. Unlike restart exhaustion, there is no triggering error to
    /// carry — the stream was never open.
    ConstructionFailed,
}

impl<E: Clone> Clone for StreamError<E> {
    fn clone(&self) -> Self {
        match self {
            Self::AlreadyClosed => Self::AlreadyClosed,
            Self::Cancelled => Self::Cancelled,
            Self::RestartExhausted { attempts, cause } => {
                Self::RestartExhausted { attempts: *attempts, cause: cause.clone() }
            }
            Self::Operation(e) => Self::Operation(e.clone()),
            Self::ConstructionFailed => Self::ConstructionFailed,
        }
    }
}

impl<E: PartialEq> PartialEq for StreamError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AlreadyClosed, Self::AlreadyClosed) => true,
            (Self::Cancelled, Self::Cancelled) => true,
            (
                Self::RestartExhausted { attempts: a1, cause: c1 },
                Self::RestartExhausted { attempts: a2, cause: c2 },
            ) => a1 == a2 && c1 == c2,
            (Self::Operation(e1), Self::Operation(e2)) => e1 == e2,
            (Self::ConstructionFailed, Self::ConstructionFailed) => true,
            _ => false,
        }
    }
}

impl<E: Eq> Eq for StreamError<E> {}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyClosed => write!(f, "stream is closed"),
            Self::Cancelled => write!(f, "restart cancelled"),
            Self::RestartExhausted { attempts, cause } => {
                write!(f, "restart exhausted after {} attempts, last error: {}", attempts, cause)
            }
            Self::Operation(e) => write!(f, "{}", e),
            Self::ConstructionFailed => write!(f, "failed to construct initial endpoint"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for StreamError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RestartExhausted { cause, .. } => Some(cause.as_ref()),
            Self::Operation(e) => Some(e),
            Self::AlreadyClosed | Self::Cancelled | Self::ConstructionFailed => None,
        }
    }
}

impl<E> StreamError<E> {
    pub fn is_already_closed(&self) -> bool {
        matches!(self, Self::AlreadyClosed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_restart_exhausted(&self) -> bool {
        matches!(self, Self::RestartExhausted { .. })
    }

    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    pub fn is_construction_failed(&self) -> bool {
        matches!(self, Self::ConstructionFailed)
    }

    /// Unwrap the carried transport error, if this is an [`StreamError::Operation`].
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::AlreadyClosed
            | Self::Cancelled
            | Self::RestartExhausted { .. }
            | Self::ConstructionFailed => None,
        }
    }

    /// Borrow the triggering cause, if this is a [`StreamError::RestartExhausted`].
    pub fn cause(&self) -> Option<&Arc<E>> {
        match self {
            Self::RestartExhausted { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Errors from [`crate::RestartConfigBuilder::build`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `initial_backoff` must be > 0.
    #[error("initial_backoff must be > 0")]
    ZeroInitialBackoff,
    /// `max_backoff` must be > 0.
    #[error("max_backoff must be > 0")]
    ZeroMaxBackoff,
    /// `max_backoff` must be >= `initial_backoff`.
    #[error("max_backoff ({max:?}) must be >= initial_backoff ({initial:?})")]
    MaxBelowInitial { initial: Duration, max: Duration },
    /// `multiplier` must be >= 1.0.
    #[error("multiplier must be >= 1.0 (got {0})")]
    MultiplierBelowOne(f64),
}
