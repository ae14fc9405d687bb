#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Evader controller: turns keystrokes into robber moves.
//!
//! Waiting for input and applying it are two separate phases. The keystroke
//! read happens outside the shared lock; the resulting move is applied as one
//! exclusive section through the coordinator.

use std::{collections::VecDeque, thread, time::Duration};

use anyhow::{Context, Result};
use cops_and_robbers_coordination::Coordinator;
use cops_and_robbers_core::{Cell, Direction, MoveOutcome};
use cops_and_robbers_world::{query, GameState};
use tracing::{debug, info};

/// Single key press delivered by an input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keystroke {
    /// A printable character.
    Char(char),
    /// Arrow key pointing in a direction.
    Arrow(Direction),
    /// Escape key.
    Escape,
    /// Ctrl-C while the terminal is in raw mode.
    Interrupt,
    /// Any key without a mapping.
    Other,
}

/// What the player asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Step the robber one cell.
    Move(Direction),
    /// Abandon the match.
    Quit,
}

impl Intent {
    /// Maps a keystroke to an intent; unmapped keys yield `None`.
    ///
    /// WASD, vi keys and arrows move; `q`, Escape and Ctrl-C quit.
    #[must_use]
    pub fn from_keystroke(keystroke: Keystroke) -> Option<Self> {
        match keystroke {
            Keystroke::Arrow(direction) => Some(Self::Move(direction)),
            Keystroke::Escape | Keystroke::Interrupt => Some(Self::Quit),
            Keystroke::Char(character) => match character.to_ascii_lowercase() {
                'w' | 'k' => Some(Self::Move(Direction::Up)),
                's' | 'j' => Some(Self::Move(Direction::Down)),
                'a' | 'h' => Some(Self::Move(Direction::Left)),
                'd' | 'l' => Some(Self::Move(Direction::Right)),
                'q' => Some(Self::Quit),
                _ => None,
            },
            Keystroke::Other => None,
        }
    }
}

/// Blocking source of keystrokes.
pub trait InputSource {
    /// Waits up to `timeout` for the next keystroke.
    fn next_keystroke(&mut self, timeout: Duration) -> Result<Option<Keystroke>>;
}

/// Replays a fixed list of keystrokes, then idles or quits.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    keys: VecDeque<Keystroke>,
    pacing: Duration,
    quit_when_exhausted: bool,
}

impl ScriptedInput {
    /// Creates a script that idles once every keystroke was delivered.
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Keystroke>,
    {
        Self {
            keys: keys.into_iter().collect(),
            pacing: Duration::ZERO,
            quit_when_exhausted: false,
        }
    }

    /// Waits `pacing` before delivering each keystroke.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Delivers Escape once the script runs out.
    #[must_use]
    pub fn quit_when_exhausted(mut self) -> Self {
        self.quit_when_exhausted = true;
        self
    }
}

impl InputSource for ScriptedInput {
    fn next_keystroke(&mut self, timeout: Duration) -> Result<Option<Keystroke>> {
        match self.keys.pop_front() {
            Some(keystroke) => {
                if !self.pacing.is_zero() {
                    thread::sleep(self.pacing);
                }
                Ok(Some(keystroke))
            }
            None if self.quit_when_exhausted => Ok(Some(Keystroke::Escape)),
            None => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// Applies one robber step in `direction`.
///
/// Off-board and wall destinations are rejected without mutation. Walking
/// into a cop is a capture and leaves the robber in place; so is finishing a
/// step inside any cop's reach. Picking up the last money cell wins the
/// match unless that step also ends within reach of a cop.
pub fn attempt_move(state: &mut GameState, direction: Direction) -> MoveOutcome {
    let Some(destination) = state.robber().step(direction) else {
        return MoveOutcome::Rejected;
    };

    match state.grid().try_get(destination) {
        Err(_) | Ok(Cell::Wall) => MoveOutcome::Rejected,
        Ok(Cell::Cop) => MoveOutcome::Captured,
        Ok(Cell::Money) => {
            let _ = state.relocate_robber(destination);
            let remaining = state.collect_money();
            if query::robber_cornered(state) {
                MoveOutcome::Captured
            } else if remaining == 0 {
                MoveOutcome::Escaped
            } else {
                MoveOutcome::Collected { remaining }
            }
        }
        Ok(Cell::Empty) => {
            let _ = state.relocate_robber(destination);
            if query::robber_cornered(state) {
                MoveOutcome::Captured
            } else {
                MoveOutcome::Moved
            }
        }
        Ok(Cell::Robber) => MoveOutcome::Blocked,
    }
}

/// Reads keystrokes and applies them until the match ends or the player quits.
///
/// Each read waits at most `poll_interval` so shutdown is noticed promptly.
pub fn run<I>(coordinator: &Coordinator, input: &mut I, poll_interval: Duration) -> Result<()>
where
    I: InputSource + ?Sized,
{
    info!("evader started");
    while coordinator.is_running() {
        let Some(keystroke) = input
            .next_keystroke(poll_interval)
            .context("failed to read keystroke")?
        else {
            continue;
        };

        match Intent::from_keystroke(keystroke) {
            Some(Intent::Move(direction)) => {
                let Some(outcome) =
                    coordinator.run_exclusive(|state| attempt_move(state, direction))
                else {
                    break;
                };
                match outcome {
                    MoveOutcome::Rejected | MoveOutcome::Blocked => {
                        debug!(?direction, ?outcome, "move refused");
                    }
                    MoveOutcome::Moved => debug!(?direction, "robber moved"),
                    MoveOutcome::Collected { remaining } => {
                        info!(remaining, "money collected");
                    }
                    MoveOutcome::Escaped => info!("last money collected"),
                    MoveOutcome::Captured => info!("robber ran into a cop"),
                }
            }
            Some(Intent::Quit) => {
                if coordinator.signal_shutdown() {
                    info!("player quit");
                }
                break;
            }
            None => debug!(?keystroke, "ignored keystroke"),
        }
    }
    debug!("evader stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_case_insensitively() {
        assert_eq!(
            Intent::from_keystroke(Keystroke::Char('W')),
            Some(Intent::Move(Direction::Up))
        );
        assert_eq!(
            Intent::from_keystroke(Keystroke::Char('a')),
            Some(Intent::Move(Direction::Left))
        );
        assert_eq!(
            Intent::from_keystroke(Keystroke::Char('j')),
            Some(Intent::Move(Direction::Down))
        );
        assert_eq!(
            Intent::from_keystroke(Keystroke::Char('L')),
            Some(Intent::Move(Direction::Right))
        );
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(Intent::from_keystroke(Keystroke::Char('x')), None);
        assert_eq!(Intent::from_keystroke(Keystroke::Char(' ')), None);
        assert_eq!(Intent::from_keystroke(Keystroke::Other), None);
    }

    #[test]
    fn quit_keys_map_to_quit() {
        for keystroke in [
            Keystroke::Char('q'),
            Keystroke::Escape,
            Keystroke::Interrupt,
        ] {
            assert_eq!(Intent::from_keystroke(keystroke), Some(Intent::Quit));
        }
    }

    #[test]
    fn scripted_input_replays_then_idles() {
        let mut input = ScriptedInput::new([Keystroke::Char('d')]);
        assert_eq!(
            input.next_keystroke(Duration::ZERO).expect("read"),
            Some(Keystroke::Char('d'))
        );
        assert_eq!(input.next_keystroke(Duration::ZERO).expect("read"), None);
    }

    #[test]
    fn scripted_input_can_quit_when_exhausted() {
        let mut input = ScriptedInput::new([]).quit_when_exhausted();
        assert_eq!(
            input.next_keystroke(Duration::ZERO).expect("read"),
            Some(Keystroke::Escape)
        );
    }
}
