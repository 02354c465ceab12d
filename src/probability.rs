//! Local mine-probability heuristic for hidden cells.
//!
//! Each hidden cell gets the mean mine density of the clues around it; cells
//! with no revealed clue nearby get the global density. This is a ranking
//! heuristic, not a posterior: the values need not add up to the mine count.

use crate::board::Board;
use crate::reveal::{Mark, RevealState};
use crate::types::{Coord, Dimensions};

/// Estimated mine probability per cell; `None` for cells that are not hidden.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityMap {
    dims: Dimensions,
    cells: Vec<Option<f64>>,
}

impl ProbabilityMap {
    /// Map with every cell unset.
    pub fn empty(dims: Dimensions) -> Self {
        Self {
            dims,
            cells: vec![None; dims.cell_count()],
        }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn get(&self, c: Coord) -> Option<f64> {
        if !self.dims.contains(c) {
            return None;
        }
        self.cells[self.dims.index(c)]
    }

    pub fn set(&mut self, c: Coord, p: f64) {
        let idx = self.dims.index(c);
        self.cells[idx] = Some(p);
    }

    /// Scored cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, f64)> + '_ {
        self.dims
            .row_major()
            .filter_map(move |c| self.cells[self.dims.index(c)].map(|p| (c, p)))
    }

    pub fn len(&self) -> usize {
        self.cells.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mines left spread evenly over every hidden cell, clamped to `[0, 1]`.
pub fn global_density(state: &RevealState, hidden_count: usize) -> f64 {
    if hidden_count == 0 {
        return 0.0;
    }
    (state.mines_left() as f64 / hidden_count as f64).clamp(0.0, 1.0)
}

/// Probability estimate for every hidden cell.
pub fn estimate(board: &Board, state: &RevealState) -> ProbabilityMap {
    let dims = board.dims();
    let mut map = ProbabilityMap::empty(dims);
    let hidden = state.hidden_cells();
    let prior = global_density(state, hidden.len());

    for &u in &hidden {
        let mut sum = 0.0;
        let mut used = 0usize;

        for &n in board.neighbors(u) {
            if state.mark_at(n) != Mark::Revealed {
                continue;
            }
            let Some(con) = state.constraint(board, n) else {
                continue;
            };
            if con.hidden.is_empty() {
                continue;
            }
            sum += con.remaining() as f64 / con.hidden.len() as f64;
            used += 1;
        }

        let p = if used == 0 { prior } else { sum / used as f64 };
        map.set(u, p.clamp(0.0, 1.0));
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(w: usize, h: usize, mines: &[(usize, usize)]) -> Board {
        let mines: Vec<Coord> = mines.iter().map(|&m| m.into()).collect();
        Board::from_mines(Dimensions::new(w, h).unwrap(), &mines).unwrap()
    }

    #[test]
    fn test_untouched_board_uses_global_density() {
        let b = board(4, 4, &[(0, 0), (3, 3)]);
        let state = RevealState::new(b.dims(), 2);
        let map = estimate(&b, &state);

        assert_eq!(map.len(), 16);
        for (_, p) in map.iter() {
            assert_eq!(p, 2.0 / 16.0);
        }
    }

    #[test]
    fn test_isolated_cell_gets_exact_prior() {
        // Column 4 is out of reach of the only clue at (0,0).
        let b = board(5, 3, &[(1, 1), (4, 2)]);
        let mut state = RevealState::new(b.dims(), 2);
        state.reveal(&b, Coord::new(0, 0)).unwrap();

        let map = estimate(&b, &state);
        let hidden = state.hidden_cells().len() as f64;
        assert_eq!(map.get(Coord::new(4, 0)), Some(2.0 / hidden));
        assert_eq!(map.get(Coord::new(0, 0)), None);
    }

    #[test]
    fn test_mean_of_local_densities() {
        let b = board(3, 2, &[(2, 0)]);
        let mut state = RevealState::new(b.dims(), 1);
        state.reveal(&b, Coord::new(1, 0)).unwrap();
        state.reveal(&b, Coord::new(1, 1)).unwrap();

        // (1,0) and (1,1) each show 1 over the four hidden cells.
        let map = estimate(&b, &state);
        assert_eq!(map.get(Coord::new(2, 0)), Some(0.25));
        assert_eq!(map.get(Coord::new(0, 1)), Some(0.25));
    }

    #[test]
    fn test_flags_reduce_local_density() {
        let b = board(3, 3, &[(0, 0), (2, 0)]);
        let mut state = RevealState::new(b.dims(), 2);
        state.reveal(&b, Coord::new(1, 1)).unwrap();
        state.flag(Coord::new(0, 0)).unwrap();

        // (1,1) shows 2, one flagged, seven hidden: 1/7 for every hidden cell
        // that only sees (1,1).
        let map = estimate(&b, &state);
        assert_eq!(map.get(Coord::new(2, 2)), Some(1.0 / 7.0));
        assert_eq!(map.get(Coord::new(0, 0)), None);
    }

    #[test]
    fn test_over_flagging_clamps_to_zero() {
        let b = board(3, 3, &[(0, 0)]);
        let mut state = RevealState::new(b.dims(), 1);
        state.reveal(&b, Coord::new(1, 1)).unwrap();
        state.flag(Coord::new(0, 0)).unwrap();
        state.flag(Coord::new(2, 2)).unwrap();

        let map = estimate(&b, &state);
        for (_, p) in map.iter() {
            assert!((0.0..=1.0).contains(&p));
        }
        assert_eq!(map.get(Coord::new(1, 0)), Some(0.0));
    }

    #[test]
    fn test_random_boards_stay_in_bounds() {
        use crate::rng::GameRng;

        let dims = Dimensions::new(16, 16).unwrap();
        for seed in 0..10 {
            let mut rng = GameRng::from_seed(seed);
            let b = Board::generate(dims, 40, Coord::new(8, 8), &mut rng).unwrap();
            let mut state = RevealState::new(dims, 40);
            state.reveal(&b, Coord::new(8, 8)).unwrap();

            let map = estimate(&b, &state);
            assert_eq!(map.len(), state.hidden_cells().len());
            for (c, p) in map.iter() {
                assert!((0.0..=1.0).contains(&p), "p={} at {}", p, c);
            }
        }
    }
}
