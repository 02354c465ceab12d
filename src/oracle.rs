//! Risk oracle consulted before a probabilistic probe.
//!
//! The oracle is an external classifier (for example a model trained on the
//! samples this crate records). It only ever sees the 3x3 window around a
//! candidate and the heuristic probability, never the board itself.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::reveal::{Mark, RevealState};
use crate::types::Coord;

/// Window encoding: off the board.
pub const OFF_BOARD: i8 = -1;
/// Window encoding: flagged cell.
pub const FLAGGED: i8 = 9;
/// Window encoding: unknown cell (hidden, questioned, or the candidate itself).
pub const UNKNOWN: i8 = 10;

/// Number of cells in the encoded window.
pub const WINDOW_LEN: usize = 9;

/// Oracle input: the candidate's 3x3 neighborhood plus its heuristic probability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Features {
    /// Column by column from the left, each column top to bottom; index 4
    /// is the candidate.
    pub window: [i8; WINDOW_LEN],
    pub probability: f64,
}

impl Features {
    pub fn new(board: &Board, state: &RevealState, at: Coord, probability: f64) -> Self {
        Self {
            window: encode_window(board, state, at),
            probability,
        }
    }
}

/// Encode the 3x3 window centred on `at` as the player sees it.
///
/// Index `3 * (dx + 1) + (dy + 1)` holds the cell at offset `(dx, dy)`, the
/// column order existing sample files use.
pub fn encode_window(board: &Board, state: &RevealState, at: Coord) -> [i8; WINDOW_LEN] {
    let dims = board.dims();
    let mut window = [OFF_BOARD; WINDOW_LEN];

    for (i, (dx, dy)) in (-1i64..=1)
        .flat_map(|dx| (-1i64..=1).map(move |dy| (dx, dy)))
        .enumerate()
    {
        if dx == 0 && dy == 0 {
            window[i] = UNKNOWN;
            continue;
        }
        let x = at.x as i64 + dx;
        let y = at.y as i64 + dy;
        if x < 0 || y < 0 || x >= dims.width as i64 || y >= dims.height as i64 {
            continue;
        }
        let c = Coord::new(x as usize, y as usize);
        window[i] = match state.mark_at(c) {
            Mark::Flagged => FLAGGED,
            Mark::Hidden | Mark::Questioned => UNKNOWN,
            // A revealed cell without a clue is the exploded mine.
            Mark::Revealed => state.clue(board, c).map_or(FLAGGED, |n| n as i8),
        };
    }

    window
}

/// External risk classifier.
pub trait Oracle {
    /// `Some(true)` rejects the candidate as too risky, `Some(false)` accepts
    /// it, `None` means the oracle could not answer.
    fn predict(&mut self, features: &Features) -> Option<bool>;
}

/// Accepts every candidate.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverReject;

impl Oracle for NeverReject {
    fn predict(&mut self, _features: &Features) -> Option<bool> {
        Some(false)
    }
}

/// Rejects candidates whose heuristic probability exceeds a cutoff.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdOracle {
    pub max_probability: f64,
}

impl Oracle for ThresholdOracle {
    fn predict(&mut self, features: &Features) -> Option<bool> {
        Some(features.probability > self.max_probability)
    }
}

impl<F> Oracle for F
where
    F: FnMut(&Features) -> Option<bool>,
{
    fn predict(&mut self, features: &Features) -> Option<bool> {
        self(features)
    }
}
