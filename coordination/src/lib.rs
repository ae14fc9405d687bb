#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single coordination point shared by every actor of a match.
//!
//! One mutex guards the whole [`GameState`] together with the recorded
//! outcome, one condition variable wakes sleeping actors, and an atomic flag
//! lets actors observe shutdown without taking the lock. The flag is only
//! written while the lock is held, so an actor that checked it inside
//! [`Coordinator::run_exclusive`] can never mutate the board after the match
//! ended.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use cops_and_robbers_core::{MatchOutcome, Resolution};
use cops_and_robbers_world::GameState;
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug)]
struct Shared {
    state: GameState,
    outcome: Option<MatchOutcome>,
}

/// Lock, condition signal and running flag for one match.
#[derive(Debug)]
pub struct Coordinator {
    shared: Mutex<Shared>,
    signal: Condvar,
    running: AtomicBool,
}

impl Coordinator {
    /// Takes ownership of the initial state; the match starts running.
    #[must_use]
    pub fn new(state: GameState) -> Self {
        Self {
            shared: Mutex::new(Shared {
                state,
                outcome: None,
            }),
            signal: Condvar::new(),
            running: AtomicBool::new(true),
        }
    }

    /// Reports whether the match is still in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Terminal outcome, once one has been recorded.
    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.shared.lock().outcome
    }

    /// Runs `operation` against the game state as one indivisible step.
    ///
    /// Returns `None` without running `operation` when the match has already
    /// ended. A terminal outcome reported by the result concludes the match
    /// before the lock is released.
    pub fn run_exclusive<R, F>(&self, operation: F) -> Option<R>
    where
        R: Resolution,
        F: FnOnce(&mut GameState) -> R,
    {
        let mut shared = self.shared.lock();
        if !self.is_running() {
            return None;
        }

        let result = operation(&mut shared.state);
        if let Some(outcome) = result.outcome() {
            let _ = self.conclude_locked(&mut shared, outcome);
        }
        Some(result)
    }

    /// Reads the game state under the lock, also after the match ended.
    pub fn read_exclusive<R, F>(&self, operation: F) -> R
    where
        F: FnOnce(&GameState) -> R,
    {
        let shared = self.shared.lock();
        operation(&shared.state)
    }

    /// Sleeps for up to `duration`, waking early on shutdown.
    ///
    /// Returns `true` while the match is still running and `false` once it
    /// has ended, immediately if it had ended before the call.
    pub fn wait_tick(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut shared = self.shared.lock();
        while self.is_running() {
            if self.signal.wait_until(&mut shared, deadline).timed_out() {
                break;
            }
        }
        self.is_running()
    }

    /// Stops the match and wakes every waiting actor.
    ///
    /// Idempotent; returns `true` only for the call that stopped the match.
    pub fn signal_shutdown(&self) -> bool {
        let _shared = self.shared.lock();
        let stopped = self.stop();
        if stopped {
            info!("shutdown signalled");
        }
        stopped
    }

    /// Records `outcome` and stops the match.
    ///
    /// Only the first terminal outcome is kept; returns whether this call
    /// recorded it.
    pub fn conclude(&self, outcome: MatchOutcome) -> bool {
        let mut shared = self.shared.lock();
        self.conclude_locked(&mut shared, outcome)
    }

    /// Consumes the coordinator, returning the final state and outcome.
    #[must_use]
    pub fn into_parts(self) -> (GameState, Option<MatchOutcome>) {
        let shared = self.shared.into_inner();
        (shared.state, shared.outcome)
    }

    fn conclude_locked(&self, shared: &mut MutexGuard<'_, Shared>, outcome: MatchOutcome) -> bool {
        if !self.stop() {
            debug!(?outcome, "ignoring outcome after shutdown");
            return false;
        }
        shared.outcome = Some(outcome);
        info!(?outcome, "match concluded");
        true
    }

    fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if was_running {
            let _ = self.signal.notify_all();
        }
        was_running
    }
}
