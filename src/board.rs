//! Ground truth of an episode: mine layout and neighbor counts.
//!
//! Generated at the first probe so that the probed cell can be kept free of
//! mines; it never changes afterwards. Only the referee paths (reveal, win
//! check) look at it directly; the solver reads revealed values through
//! [`RevealState::clue`](crate::reveal::RevealState::clue).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rng::GameRng;
use crate::types::{Coord, Dimensions, NeighborCache};

/// Content of one board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Mine,
    /// Number of mines among the Moore neighbors, 0 for a blank.
    Count(u8),
}

impl Cell {
    #[inline(always)]
    pub fn is_mine(self) -> bool {
        matches!(self, Cell::Mine)
    }
}

/// What the first probe of an episode is guaranteed to hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafeStart {
    /// Any non-mine cell.
    #[default]
    NonMine,
    /// A blank (count 0) cell, so the first probe opens a region.
    Opening,
}

impl SafeStart {
    fn accepts(self, board: &Board, probe: Coord) -> bool {
        match self {
            SafeStart::NonMine => !board.cell_at(probe).is_mine(),
            SafeStart::Opening => board.cell_at(probe) == Cell::Count(0),
        }
    }
}

fn check_mine_count(dims: Dimensions, bomb_count: usize) -> Result<()> {
    if bomb_count >= dims.cell_count() {
        return Err(Error::TooManyMines {
            bombs: bomb_count,
            cells: dims.cell_count(),
        });
    }
    Ok(())
}

/// Place `bomb_count` mines uniformly at random, never on `safe`.
///
/// Samples distinct indices over every cell but the safe one, so placement
/// always terminates and always yields exactly `bomb_count` mines.
pub fn place_mines(
    dims: Dimensions,
    bomb_count: usize,
    safe: Coord,
    rng: &mut GameRng,
) -> Result<Vec<bool>> {
    check_mine_count(dims, bomb_count)?;
    dims.check(safe)?;

    let total = dims.cell_count();
    let safe_idx = dims.index(safe);
    let mut mines = vec![false; total];

    for i in rng.sample_indices(total - 1, bomb_count) {
        let idx = if i >= safe_idx { i + 1 } else { i };
        mines[idx] = true;
    }

    Ok(mines)
}

/// Mine or neighbor-mine count for every cell of a layout.
pub fn calculate_numbers(mines: &[bool], neighbor_cache: &NeighborCache) -> Vec<Cell> {
    let dims = neighbor_cache.dims();
    let mut cells = vec![Cell::Count(0); dims.cell_count()];

    for x in 0..dims.width {
        for y in 0..dims.height {
            let c = Coord::new(x, y);
            let idx = dims.index(c);
            if mines[idx] {
                cells[idx] = Cell::Mine;
                continue;
            }

            let count = neighbor_cache
                .get(c)
                .iter()
                .filter(|&&n| mines[dims.index(n)])
                .count();
            cells[idx] = Cell::Count(count as u8);
        }
    }

    cells
}

/// Mine layout plus adjacency counts for one episode.
#[derive(Clone, Debug)]
pub struct Board {
    dims: Dimensions,
    cells: Vec<Cell>,
    mine_count: usize,
    neighbors: NeighborCache,
}

impl Board {
    fn from_layout(dims: Dimensions, mines: &[bool]) -> Self {
        let neighbors = NeighborCache::new(dims);
        let cells = calculate_numbers(mines, &neighbors);
        let mine_count = mines.iter().filter(|&&m| m).count();
        Self {
            dims,
            cells,
            mine_count,
            neighbors,
        }
    }

    /// Random board with `bomb_count` mines, none of them on `safe`.
    pub fn generate(
        dims: Dimensions,
        bomb_count: usize,
        safe: Coord,
        rng: &mut GameRng,
    ) -> Result<Self> {
        let mines = place_mines(dims, bomb_count, safe, rng)?;
        Ok(Self::from_layout(dims, &mines))
    }

    /// Board with mines at exactly the given cells. Duplicates count once.
    pub fn from_mines(dims: Dimensions, mine_cells: &[Coord]) -> Result<Self> {
        let mut mines = vec![false; dims.cell_count()];
        for &c in mine_cells {
            dims.check(c)?;
            mines[dims.index(c)] = true;
        }
        let count = mines.iter().filter(|&&m| m).count();
        check_mine_count(dims, count)?;
        Ok(Self::from_layout(dims, &mines))
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    /// Moore neighbors of an in-bounds cell.
    #[inline(always)]
    pub fn neighbors(&self, c: Coord) -> &[Coord] {
        self.neighbors.get(c)
    }

    /// Ground truth for one cell.
    pub fn cell(&self, c: Coord) -> Result<Cell> {
        self.dims.check(c)?;
        Ok(self.cell_at(c))
    }

    pub fn is_mine(&self, c: Coord) -> Result<bool> {
        Ok(self.cell(c)?.is_mine())
    }

    #[inline(always)]
    pub(crate) fn cell_at(&self, c: Coord) -> Cell {
        self.cells[self.dims.index(c)]
    }
}

/// Result of a board generation run.
pub struct Generated {
    pub board: Board,
    /// How many random layouts were tried.
    pub attempts: u32,
    /// False when `max_attempts` ran out before the acceptance test passed.
    pub satisfied: bool,
}

/// Generate boards until `accept` passes or `max_attempts` is reached.
///
/// Every candidate already keeps `safe` free of mines; `accept` can ask for
/// more. On exhaustion the last board is returned with `satisfied == false`.
pub fn generate_until<F>(
    dims: Dimensions,
    bomb_count: usize,
    safe: Coord,
    max_attempts: u32,
    rng: &mut GameRng,
    accept: F,
) -> Result<Generated>
where
    F: Fn(&Board) -> bool,
{
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        let board = Board::generate(dims, bomb_count, safe, rng)?;

        if accept(&board) {
            return Ok(Generated {
                board,
                attempts,
                satisfied: true,
            });
        }

        if attempts >= max_attempts {
            return Ok(Generated {
                board,
                attempts,
                satisfied: false,
            });
        }
    }
}

/// Generate the board for an episode whose first probe is `probe`.
pub fn generate_for_probe(
    dims: Dimensions,
    bomb_count: usize,
    probe: Coord,
    safe_start: SafeStart,
    max_attempts: u32,
    rng: &mut GameRng,
) -> Result<Generated> {
    let generated = generate_until(dims, bomb_count, probe, max_attempts, rng, |board| {
        safe_start.accepts(board, probe)
    })?;

    if generated.satisfied {
        tracing::debug!(attempts = generated.attempts, ?safe_start, "board generated");
    } else {
        tracing::warn!(
            attempts = generated.attempts,
            ?safe_start,
            "no layout satisfied the safe start, keeping a non-mine first probe"
        );
    }

    Ok(generated)
}
