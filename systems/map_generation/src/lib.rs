#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Board generation: wall templates and random placement of the cops, the
//! robber and the money.
//!
//! Generation runs once, single-threaded, before any actor starts.

use cops_and_robbers_core::{Cell, CellCoord, ConfigError, GameConfig};
use cops_and_robbers_world::{GameState, Grid, PlacementError};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;
use tracing::info;

/// Fixed wall templates a board can be painted with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WallPattern {
    /// Solid one-cell border only.
    Border,
    /// Border plus two perpendicular two-cell-thick bars.
    Cross,
    /// Border plus both diagonals.
    Diagonals,
}

impl WallPattern {
    /// Every available template.
    pub const ALL: [WallPattern; 3] = [
        WallPattern::Border,
        WallPattern::Cross,
        WallPattern::Diagonals,
    ];

    /// Picks a template uniformly at random.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Paints the template onto `grid`.
    ///
    /// Interior features start two cells in from each edge and leave the
    /// centred 2x2 block open.
    pub fn paint(self, grid: &mut Grid) {
        let size = grid.size();
        paint_border(grid);

        let mid_start = size / 2 - 1;
        let mid_end = size / 2;
        let outside_centre = |index: u32| index < mid_start || index > mid_end;

        match self {
            Self::Border => {}
            Self::Cross => {
                for index in (2..size - 2).filter(|index| outside_centre(*index)) {
                    paint_wall(grid, CellCoord::new(index, mid_start));
                    paint_wall(grid, CellCoord::new(index, mid_end));
                    paint_wall(grid, CellCoord::new(mid_start, index));
                    paint_wall(grid, CellCoord::new(mid_end, index));
                }
            }
            Self::Diagonals => {
                for index in (2..size - 2).filter(|index| outside_centre(*index)) {
                    paint_wall(grid, CellCoord::new(index, index));
                    paint_wall(grid, CellCoord::new(index, size - 1 - index));
                }
            }
        }
    }
}

fn paint_border(grid: &mut Grid) {
    let last = grid.size() - 1;
    for index in 0..=last {
        paint_wall(grid, CellCoord::new(0, index));
        paint_wall(grid, CellCoord::new(last, index));
        paint_wall(grid, CellCoord::new(index, 0));
        paint_wall(grid, CellCoord::new(index, last));
    }
}

fn paint_wall(grid: &mut Grid, cell: CellCoord) {
    let _ = grid.set(cell, Cell::Wall);
}

/// Errors that abort board generation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An element could not be placed.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// The walls left too few free cells for every element.
    #[error("board has {free} free cells but {required} are needed")]
    NoRoom {
        /// Cells left free after painting walls.
        free: usize,
        /// Cells needed for cops, robber and money.
        required: usize,
    },
}

/// Builds ready-to-play game states from a configuration.
#[derive(Debug)]
pub struct MapGenerator<R> {
    rng: R,
}

impl<R: Rng> MapGenerator<R> {
    /// Creates a generator drawing randomness from `rng`.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Validates `config`, paints a random wall template and scatters the elements.
    pub fn generate(&mut self, config: &GameConfig) -> Result<GameState, GenerationError> {
        let pattern = WallPattern::choose(&mut self.rng);
        self.generate_with(config, pattern)
    }

    /// Like [`MapGenerator::generate`] with an explicit wall template.
    pub fn generate_with(
        &mut self,
        config: &GameConfig,
        pattern: WallPattern,
    ) -> Result<GameState, GenerationError> {
        config.validate()?;

        let mut grid = Grid::new(config.board_size)?;
        pattern.paint(&mut grid);

        let mut free = grid.positions_of(Cell::Empty);
        let cops = usize::try_from(config.cop_count).unwrap_or(usize::MAX);
        let money = usize::try_from(config.money_count()).unwrap_or(usize::MAX);
        let required = cops.saturating_add(money).saturating_add(1);
        if free.len() < required {
            return Err(GenerationError::NoRoom {
                free: free.len(),
                required,
            });
        }

        free.shuffle(&mut self.rng);
        let mut cells = free.into_iter();
        let cop_cells: Vec<CellCoord> = cells.by_ref().take(cops).collect();
        let robber = cells.next().ok_or(GenerationError::NoRoom {
            free: 0,
            required,
        })?;

        let mut state = GameState::new(grid, robber)?;
        for cell in cop_cells {
            let _ = state.add_cop(cell)?;
        }
        for cell in cells.take(money) {
            state.add_money(cell)?;
        }

        info!(
            ?pattern,
            size = config.board_size,
            cops = state.cops().len(),
            money = state.money_remaining(),
            "board generated"
        );
        Ok(state)
    }
}
