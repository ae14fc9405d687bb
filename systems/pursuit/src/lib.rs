#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuer agents: one per cop, each deciding and executing a move on its
//! own schedule.
//!
//! Every tick runs as a single exclusive section: capture check, decision and
//! move execution observe and mutate the same snapshot of the board. Cops
//! capture diagonally (any Moore neighbour) but only ever walk
//! orthogonally.

use std::time::Duration;

use cops_and_robbers_coordination::Coordinator;
use cops_and_robbers_core::{Cell, CellCoord, CopId, Direction, GameConfig, PursuitStep};
use cops_and_robbers_world::{GameState, Grid};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

const SEED_SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

/// Decision-making state of a single cop.
#[derive(Debug)]
pub struct Pursuer<R = ChaCha8Rng> {
    cop: CopId,
    chase_threshold: u32,
    rng: R,
}

impl Pursuer<ChaCha8Rng> {
    /// Creates the agent for `cop` using the configured threshold and seed.
    ///
    /// With a seed every cop gets its own reproducible stream; without one
    /// the stream is drawn from OS entropy.
    #[must_use]
    pub fn from_config(cop: CopId, config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                let spread = (u64::from(cop.get()) + 1).wrapping_mul(SEED_SPREAD);
                ChaCha8Rng::seed_from_u64(seed ^ spread)
            }
            None => ChaCha8Rng::from_entropy(),
        };
        Self::new(cop, config.chase_threshold, rng)
    }
}

impl<R: Rng> Pursuer<R> {
    /// Creates an agent for `cop` drawing wander moves from `rng`.
    pub fn new(cop: CopId, chase_threshold: u32, rng: R) -> Self {
        Self {
            cop,
            chase_threshold,
            rng,
        }
    }

    /// Cop controlled by this agent.
    #[must_use]
    pub const fn cop(&self) -> CopId {
        self.cop
    }

    /// Runs one decide-and-move step against `state`.
    ///
    /// Callers must hold exclusive access for the whole call.
    pub fn tick(&mut self, state: &mut GameState) -> PursuitStep {
        let Some(position) = state.cop(self.cop) else {
            return PursuitStep::Held;
        };

        match self.decide(state, position) {
            Decision::Capture => PursuitStep::Captured,
            Decision::Hold => PursuitStep::Held,
            Decision::MoveTo(to) => {
                if state.relocate_cop(self.cop, to) {
                    PursuitStep::Advanced { from: position, to }
                } else {
                    PursuitStep::Held
                }
            }
        }
    }

    /// Ticks every `interval` until the match ends.
    pub fn run(mut self, coordinator: &Coordinator, interval: Duration) {
        info!(cop = self.cop.get(), "pursuer started");
        while coordinator.wait_tick(interval) {
            match coordinator.run_exclusive(|state| self.tick(state)) {
                Some(PursuitStep::Captured) => {
                    info!(cop = self.cop.get(), "robber captured");
                    break;
                }
                Some(PursuitStep::Advanced { from, to }) => {
                    debug!(cop = self.cop.get(), ?from, ?to, "pursuer advanced");
                }
                Some(PursuitStep::Held) => {}
                None => break,
            }
        }
        debug!(cop = self.cop.get(), "pursuer stopped");
    }

    fn decide(&mut self, state: &GameState, position: CellCoord) -> Decision {
        let robber = state.robber();
        if position.is_within_reach(robber) {
            return Decision::Capture;
        }

        let next = if position.manhattan_distance(robber) < self.chase_threshold {
            chase_step(state.grid(), position, robber)
        } else {
            wander_step(state.grid(), position, &mut self.rng)
        };
        next.map_or(Decision::Hold, Decision::MoveTo)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decision {
    Capture,
    Hold,
    MoveTo(CellCoord),
}

/// Picks the orthogonal step that strictly shortens the Manhattan distance
/// to `target` the most.
///
/// Ties go to the first candidate in [`Direction::ALL`] order. Returns `None`
/// when no legal step gets closer.
#[must_use]
pub fn chase_step(grid: &Grid, from: CellCoord, target: CellCoord) -> Option<CellCoord> {
    let current_distance = from.manhattan_distance(target);
    let mut best: Option<Candidate> = None;

    for cell in legal_steps(grid, from) {
        let distance = cell.manhattan_distance(target);
        if distance >= current_distance {
            continue;
        }

        let candidate = Candidate { cell, distance };
        best = Some(match best {
            Some(existing) if !candidate.is_better_than(existing) => existing,
            _ => candidate,
        });
    }

    best.map(|candidate| candidate.cell)
}

/// Picks a legal orthogonal step uniformly at random.
pub fn wander_step<R>(grid: &Grid, from: CellCoord, rng: &mut R) -> Option<CellCoord>
where
    R: Rng + ?Sized,
{
    let steps: Vec<CellCoord> = legal_steps(grid, from).collect();
    steps.choose(rng).copied()
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cell: CellCoord,
    distance: u32,
}

impl Candidate {
    fn is_better_than(self, other: Candidate) -> bool {
        self.distance < other.distance
    }
}

fn legal_steps(grid: &Grid, from: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
    Direction::ALL
        .into_iter()
        .filter_map(move |direction| from.step(direction))
        .filter(|cell| can_enter(grid, *cell))
}

fn can_enter(grid: &Grid, cell: CellCoord) -> bool {
    match grid.try_get(cell) {
        Ok(Cell::Empty) => true,
        Ok(Cell::Wall | Cell::Money | Cell::Cop | Cell::Robber) | Err(_) => false,
    }
}
