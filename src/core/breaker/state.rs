//! Circuit breaker state machine data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow through; consecutive failures are counted
    Closed,
    /// Calls are rejected without reaching the downstream system
    Open,
    /// One trial call is allowed to probe recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// A state change and why it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: CircuitState,
    pub to: CircuitState,
    pub failure_count: u32,
    pub reason: &'static str,
}

/// Mutable breaker state; always accessed under the breaker's lock
#[derive(Debug, Clone)]
pub(crate) struct StateData {
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<Instant>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub trial_in_flight: bool,
    pub transition_count: u64,
}

impl StateData {
    pub fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            last_failure_at: None,
            trial_in_flight: false,
            transition_count: 0,
        }
    }

    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_time = Some(Instant::now());
        self.last_failure_at = Some(Utc::now());
    }

    /// Open long enough that a trial call may go through
    pub fn reset_timeout_elapsed(&self, reset_timeout: Duration) -> bool {
        self.state == CircuitState::Open
            && self
                .last_failure_time
                .map_or(true, |at| at.elapsed() > reset_timeout)
    }

    pub fn transition_to(&mut self, to: CircuitState, reason: &'static str) -> StateTransition {
        let transition = StateTransition {
            from: self.state,
            to,
            failure_count: self.failure_count,
            reason,
        };

        self.state = to;
        self.transition_count += 1;
        self.trial_in_flight = false;
        if to == CircuitState::Closed {
            self.failure_count = 0;
        }

        transition
    }
}
