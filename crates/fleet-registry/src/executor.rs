//! ActionExecutor — drives a created action to a terminal outcome.
//!
//! Stand-in for real device dispatch: each spawned task marks its
//! action `Running`, sleeps for a random interval to model execution
//! latency, then reports a weighted-random success or failure back into
//! the store. Exactly one task runs per action; it is launched at
//! creation time and never retried, cancelled, or re-entered.
//!
//! A production replacement would dispatch to a real device channel in
//! place of the sleep; the store's status-report entry point is the
//! boundary where that plugs in.

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::RegistryStore;
use crate::types::ActionStatus;

/// Spawns one detached execution task per created action.
#[derive(Clone)]
pub struct ActionExecutor {
    store: RegistryStore,
    delay_min: Duration,
    delay_max: Duration,
    success_rate: f64,
}

impl ActionExecutor {
    /// Create an executor with the default 10–20s delay and 80%
    /// success rate.
    pub fn new(store: RegistryStore) -> Self {
        Self {
            store,
            delay_min: Duration::from_secs(10),
            delay_max: Duration::from_secs(20),
            success_rate: 0.8,
        }
    }

    /// Set the simulated execution delay range (inclusive).
    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.delay_min = min;
        self.delay_max = max.max(min);
        self
    }

    /// Set the probability of a successful outcome, clamped to [0, 1].
    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Launch the execution task for a created action.
    ///
    /// Returns immediately; the task reports `Running` right away and a
    /// terminal status after the simulated delay. All sleeping happens
    /// outside the store lock.
    pub fn spawn(&self, action_id: String) -> JoinHandle<()> {
        let store = self.store.clone();
        let (delay_min, delay_max) = (self.delay_min, self.delay_max);
        let success_rate = self.success_rate;

        tokio::spawn(async move {
            store.update_action_status(&action_id, ActionStatus::Running, "running");

            let delay = rand::thread_rng().gen_range(delay_min..=delay_max);
            debug!(%action_id, ?delay, "action execution started");
            tokio::time::sleep(delay).await;

            let succeeded = rand::thread_rng().gen_bool(success_rate);
            if succeeded {
                store.update_action_status(&action_id, ActionStatus::Completed, "completed");
            } else {
                store.update_action_status(&action_id, ActionStatus::Failed, "failed");
            }
            info!(%action_id, succeeded, "action execution finished");
        })
    }
}
