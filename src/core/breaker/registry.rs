//! One circuit breaker per downstream system

use super::circuit::{CircuitBreaker, CircuitBreakerStats};
use super::config::CircuitBreakerConfig;
use super::state::CircuitState;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Summary of every breaker's state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryHealth {
    pub total: usize,
    pub closed: usize,
    pub open: usize,
    pub half_open: usize,
    /// No circuit is open
    pub healthy: bool,
}

/// Lazily creates and holds breakers keyed by system id
///
/// Breakers live for the lifetime of the registry; their state is never
/// persisted.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            config,
        }
    }

    /// The breaker for `system_id`, created on first use
    pub fn get_or_create(&self, system_id: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(system_id) {
            return Arc::clone(existing.value());
        }

        self.breakers
            .entry(system_id.to_string())
            .or_insert_with(|| {
                info!(system_id = %system_id, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(system_id, self.config))
            })
            .clone()
    }

    pub fn get(&self, system_id: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(system_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Stats for every breaker, ordered by system id
    pub fn stats(&self) -> Vec<CircuitBreakerStats> {
        let mut stats: Vec<_> = self.breakers.iter().map(|e| e.value().stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    pub fn health(&self) -> RegistryHealth {
        let mut health = RegistryHealth::default();

        for entry in self.breakers.iter() {
            match entry.value().state() {
                CircuitState::Closed => health.closed += 1,
                CircuitState::Open => health.open += 1,
                CircuitState::HalfOpen => health.half_open += 1,
            }
        }

        health.total = health.closed + health.open + health.half_open;
        health.healthy = health.open == 0;
        health
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
