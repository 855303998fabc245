use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards calls to the payment provider. After `failure_threshold`
// consecutive failures the breaker opens and calls fail fast until
// `open_for` has elapsed. Half-open admits one probe at a time; a probe
// that never reports back stops blocking others after another `open_for`.
// `success_threshold` successful probes close it again.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding used by the metrics registry.
    pub fn as_gauge(self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// How long to stay open before probing
    pub open_for: Duration,
    /// Successes needed to close from half-open
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_for: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
    probe_started: Option<Instant>,
}

#[derive(Clone, Debug)]
pub struct CircuitBreaker {
    inner: Arc<Mutex<BreakerState>>,
    config: CircuitBreakerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    CircuitOpen,
    #[error("{0}")]
    OperationFailed(E),
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                probe_started: None,
            })),
            config,
        }
    }

    /// Execute `operation` unless the breaker is open. `counts_as_failure`
    /// decides whether an error trips the breaker; a declined card should not,
    /// an unreachable provider should.
    pub async fn call<Fut, T, E>(
        &self,
        operation: Fut,
        counts_as_failure: impl Fn(&E) -> bool,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        {
            let mut inner = self.inner.lock().await;
            match inner.state {
                CircuitState::Closed => {}
                CircuitState::Open => match inner.opened_at {
                    Some(opened_at) if opened_at.elapsed() >= self.config.open_for => {
                        tracing::info!("Circuit breaker transitioning to HalfOpen");
                        inner.state = CircuitState::HalfOpen;
                        inner.success_count = 0;
                        inner.probe_started = Some(Instant::now());
                    }
                    _ => return Err(CircuitBreakerError::CircuitOpen),
                },
                CircuitState::HalfOpen => match inner.probe_started {
                    Some(started) if started.elapsed() < self.config.open_for => {
                        return Err(CircuitBreakerError::CircuitOpen);
                    }
                    _ => inner.probe_started = Some(Instant::now()),
                },
            }
        }

        match operation.await {
            Ok(result) => {
                self.record_success().await;
                Ok(result)
            }
            Err(err) => {
                if counts_as_failure(&err) {
                    self.record_failure().await;
                } else {
                    self.record_success().await;
                }
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    async fn record_success(&self) {
        let mut inner = self.inner.lock().await;

        match inner.state {
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                inner.probe_started = None;
                if inner.success_count >= self.config.success_threshold {
                    tracing::info!(successes = inner.success_count, "Circuit breaker closing");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.failure_count += 1;

        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                tracing::warn!(failures = inner.failure_count, "Circuit breaker opening");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                tracing::warn!("Failure during half-open, reopening circuit");
                inner.state = CircuitState::Open;
                inner.success_count = 0;
                inner.probe_started = None;
                inner.opened_at = Some(Instant::now());
            }
            _ => {}
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }
}
