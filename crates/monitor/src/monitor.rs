//! Scheduled consistency checks.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::MonitorError;

/// A named, read-only consistency predicate.
///
/// Returns true when the invariant holds. Checks observe the store; they
/// never repair it.
#[async_trait]
pub trait ConsistencyCheck: Send + Sync {
    /// The check name, used as the key in result maps and metrics.
    fn name(&self) -> &str;

    /// Evaluates the check.
    async fn evaluate(&self) -> Result<bool, MonitorError>;
}

/// Adapts an async closure into a [`ConsistencyCheck`].
pub struct FnCheck<F> {
    name: String,
    predicate: F,
}

impl<F> FnCheck<F>
where
    F: Fn() -> BoxFuture<'static, Result<bool, MonitorError>> + Send + Sync,
{
    /// Creates a named check from an async predicate.
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

#[async_trait]
impl<F> ConsistencyCheck for FnCheck<F>
where
    F: Fn() -> BoxFuture<'static, Result<bool, MonitorError>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self) -> Result<bool, MonitorError> {
        (self.predicate)().await
    }
}

/// Runs registered checks and keeps the result of the latest run.
///
/// A check that returns an error counts as failed; one broken check never
/// stops the others from running.
pub struct ConsistencyMonitor {
    checks: Vec<Arc<dyn ConsistencyCheck>>,
    last_results: RwLock<HashMap<String, bool>>,
}

impl ConsistencyMonitor {
    /// Creates a monitor with no checks registered.
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            last_results: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a check.
    pub fn register_check(mut self, check: Arc<dyn ConsistencyCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Runs every registered check once and returns the pass/fail map.
    #[tracing::instrument(skip(self))]
    pub async fn run_checks(&self) -> HashMap<String, bool> {
        let mut results = HashMap::new();

        for check in &self.checks {
            let passed = match check.evaluate().await {
                Ok(passed) => passed,
                Err(error) => {
                    tracing::warn!(check = check.name(), %error, "consistency check errored");
                    false
                }
            };

            if !passed {
                tracing::warn!(check = check.name(), "consistency check failed");
            }
            metrics::gauge!("consistency_check_passed", "check" => check.name().to_string())
                .set(if passed { 1.0 } else { 0.0 });
            results.insert(check.name().to_string(), passed);
        }

        metrics::counter!("consistency_check_runs").increment(1);
        *self.last_results.write().unwrap() = results.clone();
        results
    }

    /// Returns the results of the most recent run. Empty before the first.
    pub fn last_results(&self) -> HashMap<String, bool> {
        self.last_results.read().unwrap().clone()
    }

    /// Runs the checks on a fixed period until the task is cancelled.
    pub async fn run_on_interval(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.run_checks().await;
        }
    }
}

impl Default for ConsistencyMonitor {
    fn default() -> Self {
        Self::new()
    }
}
