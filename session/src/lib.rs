#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Runs one match: the renderer, the evader and every pursuer on their own
//! named threads around a shared [`Coordinator`].
//!
//! An actor that fails or panics stops the whole match so the others wind
//! down. Errors are returned to the caller; panics are resumed on it once
//! every thread has been joined.

use std::{
    any::Any,
    panic,
    thread::{self, Scope, ScopedJoinHandle},
};

use anyhow::Result;
use cops_and_robbers_coordination::Coordinator;
use cops_and_robbers_core::{ConfigError, GameConfig, MatchOutcome};
use cops_and_robbers_rendering::FrameSink;
use cops_and_robbers_system_evasion::InputSource;
use cops_and_robbers_system_pursuit::Pursuer;
use cops_and_robbers_world::GameState;
use tracing::{error, info};

/// What a finished match leaves behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchReport {
    /// Terminal outcome; `None` when the player quit.
    pub outcome: Option<MatchOutcome>,
    /// Board as it was when the last actor stopped.
    pub state: GameState,
}

/// A prepared match waiting to be played.
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    coordinator: Coordinator,
}

impl Session {
    /// Prepares a match on `state` using the intervals of `config`.
    pub fn new(config: GameConfig, state: GameState) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            coordinator: Coordinator::new(state),
        })
    }

    /// Configuration the match runs with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Plays the match to completion and reports how it ended.
    ///
    /// Blocks until every actor thread has stopped.
    pub fn play<I, S>(self, input: &mut I, sink: &mut S) -> Result<MatchReport>
    where
        I: InputSource + Send + ?Sized,
        S: FrameSink + Send + ?Sized,
    {
        let Self {
            config,
            coordinator,
        } = self;
        let pursuers: Vec<Pursuer> = coordinator.read_exclusive(|state| {
            state
                .cop_ids()
                .map(|cop| Pursuer::from_config(cop, &config))
                .collect()
        });
        info!(cops = pursuers.len(), "match started");

        let render_interval = config.render_interval();
        let input_interval = config.input_interval();
        let pursuit_interval = config.pursuit_interval();
        let shared = &coordinator;
        let joined = thread::scope(|scope| -> Result<Vec<Joined>> {
            let mut actors = Vec::with_capacity(pursuers.len() + 2);
            actors.push(spawn_actor(scope, "renderer".to_owned(), shared, move || {
                cops_and_robbers_rendering::run(shared, sink, render_interval)
            })?);
            actors.push(spawn_actor(scope, "evader".to_owned(), shared, move || {
                cops_and_robbers_system_evasion::run(shared, input, input_interval)
            })?);
            for pursuer in pursuers {
                let name = format!("pursuer-{}", pursuer.cop().get());
                actors.push(spawn_actor(scope, name, shared, move || {
                    pursuer.run(shared, pursuit_interval);
                    Ok(())
                })?);
            }

            Ok(actors
                .into_iter()
                .map(|(name, handle)| (name, handle.join()))
                .collect())
        })?;

        let mut failure: Option<anyhow::Error> = None;
        let mut panicked: Option<Box<dyn Any + Send>> = None;
        for (name, result) in joined {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    if failure.is_none() {
                        failure = Some(error.context(format!("{name} failed")));
                    }
                }
                Err(payload) => {
                    error!(actor = %name, "actor panicked");
                    if panicked.is_none() {
                        panicked = Some(payload);
                    }
                }
            }
        }
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        if let Some(error) = failure {
            return Err(error);
        }

        let (state, outcome) = coordinator.into_parts();
        match outcome {
            Some(outcome) => info!(?outcome, "match finished"),
            None => info!("match abandoned"),
        }
        Ok(MatchReport { outcome, state })
    }
}

type Joined = (String, thread::Result<Result<()>>);

type Actor<'scope> = (String, ScopedJoinHandle<'scope, Result<()>>);

fn spawn_actor<'scope, 'env, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: String,
    coordinator: &'env Coordinator,
    body: F,
) -> Result<Actor<'scope>>
where
    F: FnOnce() -> Result<()> + Send + 'scope,
{
    let actor = name.clone();
    let spawned = thread::Builder::new()
        .name(name.clone())
        .spawn_scoped(scope, move || {
            let _guard = ShutdownOnPanic { coordinator };
            let result = body();
            if let Err(error) = &result {
                error!(%actor, "actor failed: {error:#}");
                let _ = coordinator.signal_shutdown();
            }
            result
        });

    match spawned {
        Ok(handle) => Ok((name, handle)),
        Err(error) => {
            let _ = coordinator.signal_shutdown();
            Err(anyhow::Error::new(error).context(format!("failed to spawn {name} thread")))
        }
    }
}

struct ShutdownOnPanic<'a> {
    coordinator: &'a Coordinator,
}

impl Drop for ShutdownOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let _ = self.coordinator.signal_shutdown();
        }
    }
}
