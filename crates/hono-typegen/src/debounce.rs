// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Debounced regeneration trigger.
//!
//! A two-state machine: **Idle** (no pending timer) and **Armed** (a timer is
//! counting down the quiet period). Every qualifying event cancels the pending
//! timer and arms a new one, so a continuous burst never fires until the
//! stream has been quiet for the full period. On expiry exactly one trigger
//! fires and the controller returns to Idle.
//!
//! One controller is shared by every watched directory, so simultaneous events
//! across directories coalesce into a single trigger.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Observable state of a [`DebounceController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No timer pending.
    Idle,
    /// A timer is counting down to a trigger.
    Armed,
}

#[derive(Default)]
struct Timer {
    pending: Option<JoinHandle<()>>,
    // Bumped on every arm/cancel; a waking timer only fires if it is still current
    generation: u64,
}

/// Coalesces bursts of events into one trigger after a quiet period.
pub struct DebounceController {
    quiet_period: Duration,
    timer: Arc<Mutex<Timer>>,
    on_fire: Arc<dyn Fn() + Send + Sync>,
}

impl DebounceController {
    /// Creates an idle controller that calls `on_fire` after each quiet period.
    pub fn new<F>(quiet_period: Duration, on_fire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            quiet_period,
            timer: Arc::new(Mutex::new(Timer::default())),
            on_fire: Arc::new(on_fire),
        }
    }

    /// Configured quiet period.
    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Records a qualifying event, (re)arming the timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn notify(&self) {
        let mut timer = lock(&self.timer);
        if let Some(handle) = timer.pending.take() {
            handle.abort();
        }
        timer.generation += 1;

        let generation = timer.generation;
        let shared = Arc::clone(&self.timer);
        let on_fire = Arc::clone(&self.on_fire);
        let quiet_period = self.quiet_period;

        timer.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            {
                let mut timer = lock(&shared);
                if timer.generation != generation {
                    return;
                }
                timer.pending = None;
            }
            tracing::debug!("Quiet period of {:?} elapsed, triggering", quiet_period);
            on_fire();
        }));
    }

    /// Cancels a pending timer. Returns true if one was armed.
    pub fn cancel(&self) -> bool {
        let mut timer = lock(&self.timer);
        timer.generation += 1;
        match timer.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Current state.
    pub fn state(&self) -> DebounceState {
        if lock(&self.timer).pending.is_some() {
            DebounceState::Armed
        } else {
            DebounceState::Idle
        }
    }
}

impl Drop for DebounceController {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(timer: &Mutex<Timer>) -> MutexGuard<'_, Timer> {
    timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
