#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state for Cops and Robbers.
//!
//! [`Grid`] is a plain value type with bounds-checked accessors and no
//! internal locking. [`GameState`] pairs it with the cached cop and robber
//! positions and the money counter, and only exposes mutations that keep the
//! caches and the grid in agreement. Thread safety is provided from outside
//! by the coordinator.

use cops_and_robbers_core::{Cell, CellCoord, ConfigError, CopId, MIN_BOARD_SIZE};
use thiserror::Error;
use tracing::debug;

/// Square matrix of cell states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an empty grid with edge length `size`.
    pub fn new(size: u32) -> Result<Self, ConfigError> {
        if size < MIN_BOARD_SIZE {
            return Err(ConfigError::BoardTooSmall { size });
        }

        let capacity_u64 = u64::from(size) * u64::from(size);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Ok(Self {
            size,
            cells: vec![Cell::Empty; capacity],
        })
    }

    /// Edge length of the board.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Reports whether `cell` lies on the board.
    #[must_use]
    pub fn is_valid(&self, cell: CellCoord) -> bool {
        cell.row() < self.size && cell.column() < self.size
    }

    /// Reports whether `cell` lies on the board and is empty.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.has(cell, Cell::Empty)
    }

    /// Reports whether `cell` lies on the board and holds `state`.
    #[must_use]
    pub fn has(&self, cell: CellCoord, state: Cell) -> bool {
        self.try_get(cell).is_ok_and(|current| current == state)
    }

    /// Reads `cell`, reporting out-of-range coordinates as an error value.
    pub fn try_get(&self, cell: CellCoord) -> Result<Cell, OutOfBounds> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .ok_or(OutOfBounds {
                cell,
                size: self.size,
            })
    }

    /// Reads `cell`.
    ///
    /// # Panics
    ///
    /// Panics when `cell` is off the board. Callers validate coordinates
    /// first, so reaching this is a coordination bug.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Cell {
        match self.try_get(cell) {
            Ok(state) => state,
            Err(error) => panic!("{error}"),
        }
    }

    /// Writes `state` into `cell`, returning `false` without mutation when off the board.
    pub fn set(&mut self, cell: CellCoord, state: Cell) -> bool {
        let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) else {
            return false;
        };
        *slot = state;
        true
    }

    /// Iterator over the board rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        let width = usize::try_from(self.size).unwrap_or(1).max(1);
        self.cells.chunks(width)
    }

    /// Number of cells holding `state`.
    #[must_use]
    pub fn count(&self, state: Cell) -> usize {
        self.cells.iter().filter(|cell| **cell == state).count()
    }

    /// Coordinates of every cell holding `state`, in row-major order.
    #[must_use]
    pub fn positions_of(&self, state: Cell) -> Vec<CellCoord> {
        let mut positions = Vec::new();
        for row in 0..self.size {
            for column in 0..self.size {
                let cell = CellCoord::new(row, column);
                if self.has(cell, state) {
                    positions.push(cell);
                }
            }
        }
        positions
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.is_valid(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.size).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Access to a coordinate outside the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("cell ({}, {}) is outside the {size}x{size} board", .cell.row(), .cell.column())]
pub struct OutOfBounds {
    /// Offending coordinate.
    pub cell: CellCoord,
    /// Edge length of the board.
    pub size: u32,
}

/// Reasons an element could not be placed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The coordinate is off the board.
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
    /// The target cell is not empty.
    #[error("cell ({}, {}) already holds {occupant:?}", .cell.row(), .cell.column())]
    Occupied {
        /// Requested coordinate.
        cell: CellCoord,
        /// Current content of the cell.
        occupant: Cell,
    },
}

/// Grid plus cached actor positions and the money counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    grid: Grid,
    robber: CellCoord,
    cops: Vec<CellCoord>,
    money_remaining: u32,
}

impl GameState {
    /// Places the robber on `grid` and wraps it in a fresh game state.
    pub fn new(mut grid: Grid, robber: CellCoord) -> Result<Self, PlacementError> {
        claim(&mut grid, robber, Cell::Robber)?;
        Ok(Self {
            grid,
            robber,
            cops: Vec::new(),
            money_remaining: 0,
        })
    }

    /// Places a new cop on an empty cell.
    pub fn add_cop(&mut self, cell: CellCoord) -> Result<CopId, PlacementError> {
        claim(&mut self.grid, cell, Cell::Cop)?;
        let id = CopId::new(u32::try_from(self.cops.len()).unwrap_or(u32::MAX));
        self.cops.push(cell);
        Ok(id)
    }

    /// Places a money cell on an empty cell and counts it.
    pub fn add_money(&mut self, cell: CellCoord) -> Result<(), PlacementError> {
        claim(&mut self.grid, cell, Cell::Money)?;
        self.money_remaining = self.money_remaining.saturating_add(1);
        Ok(())
    }

    /// Read-only access to the authoritative grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Cached robber position.
    #[must_use]
    pub const fn robber(&self) -> CellCoord {
        self.robber
    }

    /// Cached position of `cop`.
    #[must_use]
    pub fn cop(&self, cop: CopId) -> Option<CellCoord> {
        let index = usize::try_from(cop.get()).ok()?;
        self.cops.get(index).copied()
    }

    /// Cached positions of every cop, indexed by [`CopId`].
    #[must_use]
    pub fn cops(&self) -> &[CellCoord] {
        &self.cops
    }

    /// Identifiers of every placed cop.
    pub fn cop_ids(&self) -> impl Iterator<Item = CopId> + '_ {
        (0..self.cops.len()).map(|index| CopId::new(u32::try_from(index).unwrap_or(u32::MAX)))
    }

    /// Money cells still on the board.
    #[must_use]
    pub const fn money_remaining(&self) -> u32 {
        self.money_remaining
    }

    /// Moves `cop` to `to`, keeping the grid and the cached position in step.
    ///
    /// Cops only ever enter empty cells. Returns `false` without mutation for
    /// unknown cops, off-board destinations and occupied destinations.
    pub fn relocate_cop(&mut self, cop: CopId, to: CellCoord) -> bool {
        let Some(from) = self.cop(cop) else {
            return false;
        };
        if !self.grid.is_free(to) {
            return false;
        }

        if self.grid.has(from, Cell::Cop) {
            let _ = self.grid.set(from, Cell::Empty);
        }
        let _ = self.grid.set(to, Cell::Cop);
        if let Some(slot) = usize::try_from(cop.get())
            .ok()
            .and_then(|index| self.cops.get_mut(index))
        {
            *slot = to;
        }
        debug!(cop = cop.get(), ?from, ?to, "cop relocated");
        true
    }

    /// Moves the robber to an empty or money cell.
    ///
    /// Money under the destination is replaced by the robber; the counter is
    /// left to [`GameState::collect_money`]. Returns `false` without mutation
    /// for off-board destinations and for walls, cops or the robber itself.
    pub fn relocate_robber(&mut self, to: CellCoord) -> bool {
        match self.grid.try_get(to) {
            Ok(Cell::Empty | Cell::Money) => {}
            Ok(Cell::Wall | Cell::Cop | Cell::Robber) | Err(_) => return false,
        }

        let from = self.robber;
        if self.grid.has(from, Cell::Robber) {
            let _ = self.grid.set(from, Cell::Empty);
        }
        let _ = self.grid.set(to, Cell::Robber);
        self.robber = to;
        true
    }

    /// Records one money pickup and returns how much is left.
    pub fn collect_money(&mut self) -> u32 {
        self.money_remaining = self.money_remaining.saturating_sub(1);
        self.money_remaining
    }
}

fn claim(grid: &mut Grid, cell: CellCoord, state: Cell) -> Result<(), PlacementError> {
    let occupant = grid.try_get(cell)?;
    if occupant != Cell::Empty {
        return Err(PlacementError::Occupied { cell, occupant });
    }
    let _ = grid.set(cell, state);
    Ok(())
}

/// Query functions that provide read-only summaries of the game state.
pub mod query {
    use super::GameState;
    use cops_and_robbers_core::{Cell, CellCoord};

    /// Checks that the cached positions agree with the grid.
    ///
    /// Exactly one robber cell must exist at the cached robber position and
    /// every cached cop position must hold a cop, with no extra cop cells.
    #[must_use]
    pub fn positions_consistent(state: &GameState) -> bool {
        let grid = state.grid();
        grid.count(Cell::Robber) == 1
            && grid.has(state.robber(), Cell::Robber)
            && grid.count(Cell::Cop) == state.cops().len()
            && state.cops().iter().all(|cop| grid.has(*cop, Cell::Cop))
    }

    /// Coordinates of every wall, used to confirm walls never change.
    #[must_use]
    pub fn wall_cells(state: &GameState) -> Vec<CellCoord> {
        state.grid().positions_of(Cell::Wall)
    }

    /// Reports whether any cop is within reach of the robber.
    #[must_use]
    pub fn robber_cornered(state: &GameState) -> bool {
        let robber = state.robber();
        state.cops().iter().any(|cop| cop.is_within_reach(robber))
    }
}
