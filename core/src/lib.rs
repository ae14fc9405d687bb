#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Cops and Robbers engine.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the actor coordinator, the pursuit and evasion systems, and the adapters.
//! Cells are tagged variants rather than character codes, coordinates are
//! unsigned so negative indices cannot be expressed, and every actor step
//! reports its result as a value that the coordinator can inspect for a
//! terminal [`MatchOutcome`] while it still holds the shared lock.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest board edge the engine accepts.
pub const MIN_BOARD_SIZE: u32 = 15;

/// Occupant tag of a single grid location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Nothing occupies the cell.
    #[default]
    Empty,
    /// Immutable obstacle painted during map generation.
    Wall,
    /// Resource the robber collects.
    Money,
    /// Cell occupied by one pursuer.
    Cop,
    /// Cell occupied by the evader.
    Robber,
}

/// Cardinal movement directions shared by cops and the robber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in the fixed order used for deterministic tie-breaks.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Location of a single grid cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row().abs_diff(other.row()) + self.column().abs_diff(other.column())
    }

    /// Reports whether `other` is this cell or one of its eight Moore neighbours.
    #[must_use]
    pub fn is_within_reach(self, other: CellCoord) -> bool {
        self.row().abs_diff(other.row()) <= 1 && self.column().abs_diff(other.column()) <= 1
    }

    /// Returns the neighbouring cell in `direction`.
    ///
    /// Steps that would produce a negative index yield `None`; steps past the
    /// far edge are left for the grid's bounds check.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (row, column) = match direction {
            Direction::Up => (self.row.checked_sub(1)?, self.column),
            Direction::Down => (self.row.checked_add(1)?, self.column),
            Direction::Left => (self.row, self.column.checked_sub(1)?),
            Direction::Right => (self.row, self.column.checked_add(1)?),
        };
        Some(Self::new(row, column))
    }
}

/// Unique identifier assigned to a cop at placement time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CopId(u32);

impl CopId {
    /// Creates a new cop identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Terminal result of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    /// A cop reached the robber.
    Captured,
    /// The robber collected every money cell.
    Escaped,
}

impl MatchOutcome {
    /// Banner shown to the player once the match is over.
    #[must_use]
    pub const fn banner(self) -> &'static str {
        match self {
            Self::Captured => "BUSTED! The cops caught you.",
            Self::Escaped => "You got away with all the money!",
        }
    }
}

/// Result of a single pursuer tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PursuitStep {
    /// The robber was within reach; the match ends.
    Captured,
    /// The cop moved between two cells.
    Advanced {
        /// Cell the cop occupied before moving.
        from: CellCoord,
        /// Cell the cop occupies after moving.
        to: CellCoord,
    },
    /// The cop stayed in place.
    Held,
}

/// Result of applying one evader move intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Destination was outside the board or a wall; nothing changed.
    Rejected,
    /// The robber moved onto an empty cell.
    Moved,
    /// The robber picked up money and some remains.
    Collected {
        /// Money cells still on the board.
        remaining: u32,
    },
    /// The robber picked up the last money cell.
    Escaped,
    /// The robber walked into a cop or ended its step within a cop's reach.
    Captured,
    /// Destination held something the robber cannot enter; nothing changed.
    Blocked,
}

/// Values produced inside an exclusive section that may end the match.
pub trait Resolution {
    /// Terminal outcome reported by the value, if any.
    fn outcome(&self) -> Option<MatchOutcome>;
}

impl Resolution for () {
    fn outcome(&self) -> Option<MatchOutcome> {
        None
    }
}

impl Resolution for Option<MatchOutcome> {
    fn outcome(&self) -> Option<MatchOutcome> {
        *self
    }
}

impl Resolution for PursuitStep {
    fn outcome(&self) -> Option<MatchOutcome> {
        match self {
            Self::Captured => Some(MatchOutcome::Captured),
            Self::Advanced { .. } | Self::Held => None,
        }
    }
}

impl Resolution for MoveOutcome {
    fn outcome(&self) -> Option<MatchOutcome> {
        match self {
            Self::Captured => Some(MatchOutcome::Captured),
            Self::Escaped => Some(MatchOutcome::Escaped),
            Self::Rejected | Self::Moved | Self::Collected { .. } | Self::Blocked => None,
        }
    }
}

/// Tunable parameters of a match.
///
/// Durations are stored in milliseconds so the structure maps directly onto
/// configuration files; use the accessor methods for [`Duration`] values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Edge length of the square board.
    pub board_size: u32,
    /// Number of autonomous pursuers.
    pub cop_count: u32,
    /// Interval between rendered frames.
    pub render_interval_ms: u64,
    /// Longest time the evader waits for a keystroke before rechecking shutdown.
    pub input_interval_ms: u64,
    /// Interval between pursuer decisions.
    pub pursuit_interval_ms: u64,
    /// Manhattan distance below which cops chase instead of wander.
    pub chase_threshold: u32,
    /// Seed for reproducible maps and cop behaviour; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 20,
            cop_count: 3,
            render_interval_ms: 100,
            input_interval_ms: 50,
            pursuit_interval_ms: 1_000,
            chase_threshold: 5,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Checks board size, cop count and intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size < MIN_BOARD_SIZE {
            return Err(ConfigError::BoardTooSmall {
                size: self.board_size,
            });
        }

        let cells = u64::from(self.board_size) * u64::from(self.board_size);
        if u64::from(self.cop_count) >= cells.saturating_sub(1) {
            return Err(ConfigError::TooManyCops {
                cops: self.cop_count,
                size: self.board_size,
            });
        }

        for (name, value) in [
            ("render", self.render_interval_ms),
            ("input", self.input_interval_ms),
            ("pursuit", self.pursuit_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }

        Ok(())
    }

    /// Number of money cells scattered at the start of a match.
    ///
    /// Larger boards carry more money and every cop removes two cells' worth,
    /// with a floor of one.
    #[must_use]
    pub fn money_count(&self) -> u32 {
        let area = self.board_size.saturating_mul(self.board_size);
        (area / 20)
            .saturating_sub(self.cop_count.saturating_mul(2))
            .max(1)
    }

    /// Interval between rendered frames.
    #[must_use]
    pub const fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    /// Keystroke poll timeout used by the evader.
    #[must_use]
    pub const fn input_interval(&self) -> Duration {
        Duration::from_millis(self.input_interval_ms)
    }

    /// Interval between pursuer decisions.
    #[must_use]
    pub const fn pursuit_interval(&self) -> Duration {
        Duration::from_millis(self.pursuit_interval_ms)
    }
}

/// Configuration problems detected before a match starts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The board edge is below [`MIN_BOARD_SIZE`].
    #[error("board size {size} is below the minimum of {MIN_BOARD_SIZE}")]
    BoardTooSmall {
        /// Requested edge length.
        size: u32,
    },
    /// There is no room left for the robber.
    #[error("too many cops ({cops}) for a {size}x{size} board")]
    TooManyCops {
        /// Requested cop count.
        cops: u32,
        /// Requested edge length.
        size: u32,
    },
    /// A tick interval was zero.
    #[error("{name} interval must be greater than zero")]
    ZeroInterval {
        /// Which interval was rejected.
        name: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn reach_covers_moore_neighbourhood() {
        let centre = CellCoord::new(5, 5);
        for row in 4..=6 {
            for column in 4..=6 {
                assert!(centre.is_within_reach(CellCoord::new(row, column)));
            }
        }
        assert!(!centre.is_within_reach(CellCoord::new(7, 5)));
        assert!(!centre.is_within_reach(CellCoord::new(3, 3)));
    }

    #[test]
    fn step_refuses_negative_indices() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.step(Direction::Up), None);
        assert_eq!(corner.step(Direction::Left), None);
        assert_eq!(corner.step(Direction::Down), Some(CellCoord::new(1, 0)));
        assert_eq!(corner.step(Direction::Right), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_small_board() {
        let config = GameConfig {
            board_size: 14,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BoardTooSmall { size: 14 })
        );
    }

    #[test]
    fn validate_rejects_cops_filling_the_board() {
        let config = GameConfig {
            board_size: 15,
            cop_count: 224,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyCops {
                cops: 224,
                size: 15
            })
        );

        let roomy = GameConfig {
            cop_count: 223,
            ..config
        };
        assert_eq!(roomy.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_intervals() {
        let config = GameConfig {
            pursuit_interval_ms: 0,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroInterval { name: "pursuit" })
        );
    }

    #[test]
    fn money_shrinks_with_cops_and_grows_with_board() {
        let base = GameConfig {
            board_size: 20,
            cop_count: 2,
            ..GameConfig::default()
        };
        let more_cops = GameConfig {
            cop_count: 5,
            ..base.clone()
        };
        let bigger = GameConfig {
            board_size: 30,
            ..base.clone()
        };

        assert_eq!(base.money_count(), 16);
        assert!(more_cops.money_count() < base.money_count());
        assert!(bigger.money_count() > base.money_count());
    }

    #[test]
    fn money_never_drops_below_one() {
        let crowded = GameConfig {
            board_size: 15,
            cop_count: 100,
            ..GameConfig::default()
        };
        assert_eq!(crowded.money_count(), 1);
    }

    #[test]
    fn partial_config_file_falls_back_to_defaults() {
        let config: GameConfig = toml::from_str("board_size = 25\nseed = 7\n").expect("parse");
        assert_eq!(config.board_size, 25);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.cop_count, GameConfig::default().cop_count);
        assert_eq!(config.pursuit_interval(), Duration::from_secs(1));
    }

    #[test]
    fn resolutions_report_terminal_outcomes() {
        assert_eq!(PursuitStep::Captured.outcome(), Some(MatchOutcome::Captured));
        assert_eq!(PursuitStep::Held.outcome(), None);
        assert_eq!(MoveOutcome::Escaped.outcome(), Some(MatchOutcome::Escaped));
        assert_eq!(MoveOutcome::Captured.outcome(), Some(MatchOutcome::Captured));
        assert_eq!(MoveOutcome::Collected { remaining: 2 }.outcome(), None);
        assert_eq!(().outcome(), None);
    }
}
