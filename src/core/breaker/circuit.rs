//! Per-system circuit breaker

use super::config::CircuitBreakerConfig;
use super::state::{CircuitState, StateData, StateTransition};
use crate::domain::{GatewayError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, info, warn};

/// Point-in-time view of a breaker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub transition_count: u64,
}

/// Fault-isolation state machine for one downstream system
///
/// `closed -> open` after `failure_threshold` consecutive failures,
/// `open -> half_open` once `reset_timeout` has passed since the last failure,
/// then a single trial call decides between `closed` and `open`.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<StateData>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        debug!(
            breaker = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_ms = config.reset_timeout.as_millis() as u64,
            "Creating circuit breaker"
        );

        Self {
            name,
            config,
            state: Mutex::new(StateData::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state; an open circuit whose timeout has passed reports `half_open`
    pub fn state(&self) -> CircuitState {
        let mut state = self.state.lock();
        self.maybe_half_open(&mut state);
        state.state
    }

    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }

    /// Runs `operation` if the circuit admits it
    ///
    /// # Errors
    ///
    /// [`GatewayError::CircuitOpen`] without calling `operation` while the
    /// circuit is open or a half-open trial is already running. Errors from
    /// `operation` are recorded and returned unchanged.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let permit = self.acquire()?;
        let result = operation().await;

        match &result {
            Ok(_) => permit.succeed(),
            Err(e) => permit.fail(e),
        }

        result
    }

    /// Snapshot for health reporting
    pub fn stats(&self) -> CircuitBreakerStats {
        let mut state = self.state.lock();
        self.maybe_half_open(&mut state);
        CircuitBreakerStats {
            name: self.name.clone(),
            state: state.state,
            failure_count: state.failure_count,
            last_failure_time: state.last_failure_at,
            transition_count: state.transition_count,
        }
    }

    /// Forces the circuit closed
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.state != CircuitState::Closed {
            let transition = state.transition_to(CircuitState::Closed, "manual reset");
            self.log_transition(&transition);
        }
        state.failure_count = 0;
    }

    fn acquire(&self) -> Result<CallPermit<'_>> {
        let mut state = self.state.lock();
        self.maybe_half_open(&mut state);

        match state.state {
            CircuitState::Closed => Ok(CallPermit::new(self, false)),
            CircuitState::Open => {
                debug!(breaker = %self.name, "Circuit open, rejecting call");
                Err(GatewayError::CircuitOpen(self.name.clone()))
            }
            CircuitState::HalfOpen if state.trial_in_flight => {
                debug!(breaker = %self.name, "Half-open trial in flight, rejecting call");
                Err(GatewayError::CircuitOpen(self.name.clone()))
            }
            CircuitState::HalfOpen => {
                state.trial_in_flight = true;
                Ok(CallPermit::new(self, true))
            }
        }
    }

    fn maybe_half_open(&self, state: &mut StateData) {
        if state.reset_timeout_elapsed(self.config.reset_timeout) {
            let transition = state.transition_to(CircuitState::HalfOpen, "reset timeout elapsed");
            self.log_transition(&transition);
        }
    }

    fn on_success(&self, trial: bool) {
        let mut state = self.state.lock();
        state.failure_count = 0;

        if trial && state.state == CircuitState::HalfOpen {
            let transition = state.transition_to(CircuitState::Closed, "trial call succeeded");
            self.log_transition(&transition);
        }
    }

    fn on_failure(&self, trial: bool, error: &GatewayError) {
        let mut state = self.state.lock();
        state.record_failure();

        warn!(
            breaker = %self.name,
            state = %state.state,
            failure_count = state.failure_count,
            error = %error,
            "Call through circuit breaker failed"
        );

        match state.state {
            CircuitState::HalfOpen if trial => {
                let transition = state.transition_to(CircuitState::Open, "trial call failed");
                self.log_transition(&transition);
            }
            CircuitState::Closed if state.failure_count >= self.config.failure_threshold => {
                let transition =
                    state.transition_to(CircuitState::Open, "failure threshold reached");
                self.log_transition(&transition);
            }
            _ => {}
        }
    }

    fn release_trial(&self) {
        let mut state = self.state.lock();
        if state.state == CircuitState::HalfOpen {
            state.trial_in_flight = false;
            info!(breaker = %self.name, "Half-open trial cancelled, slot released");
        }
    }

    fn log_transition(&self, transition: &StateTransition) {
        crate::log_breaker_transition!(
            self.name,
            transition.from,
            transition.to,
            transition.failure_count
        );
        debug!(breaker = %self.name, reason = transition.reason, "Transition reason");
    }
}

/// Admission to one call; a trial permit dropped unfinished frees the trial slot
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    finished: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            finished: false,
        }
    }

    fn succeed(mut self) {
        self.finished = true;
        self.breaker.on_success(self.trial);
    }

    fn fail(mut self, error: &GatewayError) {
        self.finished = true;
        self.breaker.on_failure(self.trial, error);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.finished {
            self.breaker.release_trial();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn breaker(threshold: u32, reset_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig::new(threshold, Duration::from_millis(reset_ms)),
        )
    }

    async fn fail(b: &CircuitBreaker) -> Result<()> {
        b.execute(|| async { Err::<(), _>(GatewayError::adapter("test", "boom")) })
            .await
    }

    async fn succeed(b: &CircuitBreaker) -> Result<u32> {
        b.execute(|| async { Ok(7) }).await
    }

    #[tokio::test]
    async fn test_opens_after_threshold() {
        let b = breaker(3, 60_000);
        for _ in 0..2 {
            assert!(matches!(fail(&b).await, Err(GatewayError::Adapter { .. })));
            assert_eq!(b.state(), CircuitState::Closed);
        }
        fail(&b).await.unwrap_err();
        assert_eq!(b.state(), CircuitState::Open);
        assert_eq!(b.failure_count(), 3);
    }

    #[tokio::test]
    async fn test_open_rejects_without_calling() {
        let b = breaker(1, 60_000);
        fail(&b).await.unwrap_err();

        let calls = AtomicUsize::new(0);
        let result = b
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(GatewayError::CircuitOpen(ref n)) if n == "test"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let b = breaker(3, 60_000);
        fail(&b).await.unwrap_err();
        fail(&b).await.unwrap_err();
        assert_eq!(succeed(&b).await.unwrap(), 7);
        assert_eq!(b.failure_count(), 0);

        fail(&b).await.unwrap_err();
        fail(&b).await.unwrap_err();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_trial_success_closes() {
        let b = breaker(1, 20);
        fail(&b).await.unwrap_err();
        assert_eq!(b.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(b.state(), CircuitState::HalfOpen);

        succeed(&b).await.unwrap();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_half_open_trial_failure_reopens() {
        let b = breaker(3, 20);
        for _ in 0..3 {
            fail(&b).await.unwrap_err();
        }

        tokio::time::sleep(Duration::from_millis(40)).await;
        fail(&b).await.unwrap_err();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(matches!(succeed(&b).await, Err(GatewayError::CircuitOpen(_))));
    }

    #[tokio::test]
    async fn test_single_trial_in_half_open() {
        let b = Arc::new(breaker(1, 20));
        fail(&b).await.unwrap_err();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let trial = {
            let b = Arc::clone(&b);
            tokio::spawn(async move {
                b.execute(|| async move {
                    let _ = release_rx.await;
                    Ok(())
                })
                .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(succeed(&b).await, Err(GatewayError::CircuitOpen(_))));

        release_tx.send(()).unwrap();
        trial.await.unwrap().unwrap();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_cancelled_trial_releases_slot() {
        let b = breaker(1, 20);
        fail(&b).await.unwrap_err();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let pending = b.execute(|| std::future::pending::<Result<()>>());
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert_eq!(b.state(), CircuitState::HalfOpen);

        succeed(&b).await.unwrap();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_stats_and_reset() {
        let b = breaker(1, 60_000);
        fail(&b).await.unwrap_err();

        let stats = b.stats();
        assert_eq!(stats.state, CircuitState::Open);
        assert_eq!(stats.failure_count, 1);
        assert!(stats.last_failure_time.is_some());

        b.reset();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.failure_count(), 0);
    }
}
