//! Tunables and observer hooks for the restart loop.

use crate::backoff::Backoff;
use crate::error::ConfigError;
use crate::sleeper::{Sleeper, TokioSleeper};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type OnAttempt<E> = Arc<dyn Fn(usize, &E) + Send + Sync>;
type OnSuccess = Arc<dyn Fn(usize) + Send + Sync>;
type OnExhausted<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Immutable bundle of restart tunables and observer callbacks, captured by a
/// [`crate::RestartableBidiStream`] at construction time.
///
/// Build one with [`RestartConfig::builder`], or use [`RestartConfig::defaults`]
/// for production-ready logging callbacks.
#[derive(Clone)]
pub struct RestartConfig<E> {
    pub(crate) max_attempts: usize,
    pub(crate) backoff: Backoff,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) on_attempt: Option<OnAttempt<E>>,
    pub(crate) on_success: Option<OnSuccess>,
    pub(crate) on_exhausted: Option<OnExhausted<E>>,
}

impl<E> fmt::Debug for RestartConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestartConfig")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("on_attempt", &self.on_attempt.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_exhausted", &self.on_exhausted.is_some())
            .finish()
    }
}

impl<E> RestartConfig<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn builder() -> RestartConfigBuilder<E> {
        RestartConfigBuilder::new()
    }

    /// Unbounded attempts, 100ms/30s/2.0 backoff, and callbacks that emit
    /// structured `tracing` events tagged with `name`.
    pub fn defaults(name: impl Into<String>) -> Self {
        let name = name.into();
        let on_attempt_name = name.clone();
        let on_success_name = name.clone();
        let on_exhausted_name = name;
        Self::builder()
            .on_attempt(move |attempt, err| {
                tracing::debug!(
                    stream = %on_attempt_name,
                    attempt,
                    error = %err,
                    "restarting bidi stream"
                );
            })
            .on_success(move |attempt| {
                tracing::info!(stream = %on_success_name, attempt, "bidi stream restarted");
            })
            .on_exhausted(move |err| {
                tracing::warn!(
                    stream = %on_exhausted_name,
                    error = %err,
                    "bidi stream restart exhausted"
                );
            })
            .build()
            .expect("default restart config is always valid")
    }
}

/// Fallible builder for [`RestartConfig`]; mirrors the validation style used
/// elsewhere in this crate's family (reject invalid tunables, never panic).
pub struct RestartConfigBuilder<E> {
    max_attempts: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    sleeper: Arc<dyn Sleeper>,
    on_attempt: Option<OnAttempt<E>>,
    on_success: Option<OnSuccess>,
    on_exhausted: Option<OnExhausted<E>>,
}

impl<E> Default for RestartConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RestartConfigBuilder<E> {
    pub fn new() -> Self {
        Self {
            max_attempts: 0,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
            sleeper: Arc::new(TokioSleeper),
            on_attempt: None,
            on_success: None,
            on_exhausted: None,
        }
    }

    /// 0 means unbounded (the default).
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Swap the sleeper used for the backoff wait. Tests use
    /// [`crate::sleeper::InstantSleeper`] or [`crate::sleeper::TrackingSleeper`]
    /// to avoid real time delays.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn on_attempt<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, &E) + Send + Sync + 'static,
    {
        self.on_attempt = Some(Arc::new(f));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.on_exhausted = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<RestartConfig<E>, ConfigError> {
        if self.initial_backoff.is_zero() {
            return Err(ConfigError::ZeroInitialBackoff);
        }
        if self.max_backoff.is_zero() {
            return Err(ConfigError::ZeroMaxBackoff);
        }
        if self.max_backoff < self.initial_backoff {
            return Err(ConfigError::MaxBelowInitial {
                initial: self.initial_backoff,
                max: self.max_backoff,
            });
        }
        if self.multiplier < 1.0 {
            return Err(ConfigError::MultiplierBelowOne(self.multiplier));
        }
        Ok(RestartConfig {
            max_attempts: self.max_attempts,
            backoff: Backoff::new(self.initial_backoff, self.max_backoff, self.multiplier),
            sleeper: self.sleeper,
            on_attempt: self.on_attempt,
            on_success: self.on_success,
            on_exhausted: self.on_exhausted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn io_err() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "boom")
    }

    #[test]
    fn defaults_are_unbounded_with_standard_backoff() {
        let config: RestartConfig<io::Error> =
            RestartConfig::builder().build().expect("valid config");
        assert_eq!(config.max_attempts, 0);
        assert_eq!(config.backoff.initial(), Duration::from_millis(100));
    }

    #[test]
    fn rejects_zero_initial_backoff() {
        let result: Result<RestartConfig<io::Error>, _> =
            RestartConfig::builder().initial_backoff(Duration::ZERO).build();
        assert_eq!(result.unwrap_err(), ConfigError::ZeroInitialBackoff);
    }

    #[test]
    fn rejects_zero_max_backoff() {
        let result: Result<RestartConfig<io::Error>, _> =
            RestartConfig::builder().max_backoff(Duration::ZERO).build();
        assert_eq!(result.unwrap_err(), ConfigError::ZeroMaxBackoff);
    }

    #[test]
    fn rejects_max_below_initial() {
        let result: Result<RestartConfig<io::Error>, _> = RestartConfig::builder()
            .initial_backoff(Duration::from_secs(10))
            .max_backoff(Duration::from_secs(1))
            .build();
        assert!(matches!(result, Err(ConfigError::MaxBelowInitial { .. })));
    }

    #[test]
    fn rejects_multiplier_below_one() {
        let result: Result<RestartConfig<io::Error>, _> =
            RestartConfig::builder().multiplier(0.5).build();
        assert_eq!(result.unwrap_err(), ConfigError::MultiplierBelowOne(0.5));
    }

    #[test]
    fn callbacks_are_optional() {
        let config: RestartConfig<io::Error> =
            RestartConfig::builder().build().expect("valid config");
        assert!(config.on_attempt.is_none());
        assert!(config.on_success.is_none());
        assert!(config.on_exhausted.is_none());
    }

    #[test]
    fn callbacks_fire_when_invoked_directly() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let config: RestartConfig<io::Error> = RestartConfig::builder()
            .on_attempt(move |attempt, _err| {
                attempts_clone.fetch_add(attempt, Ordering::SeqCst);
            })
            .build()
            .expect("valid config");
        (config.on_attempt.as_ref().unwrap())(3, &io_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
