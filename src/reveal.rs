//! What the player has seen and marked.
//!
//! `RevealState` is the only per-cell state the solver may consult for cells
//! that are not revealed. Board values leak through [`RevealState::clue`]
//! only for revealed cells; reading the board for a hidden or flagged cell
//! happens solely inside [`RevealState::reveal`], which is how a loss is
//! detected.

use crate::board::{Board, Cell};
use crate::error::{Error, Result};
use crate::types::{Coord, Dimensions};

/// Player-visible status of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mark {
    #[default]
    Hidden,
    Revealed,
    Flagged,
    Questioned,
}

/// Result of a reveal request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The cell was not hidden; nothing changed.
    Ignored,
    /// Number of cells opened, including flood-filled ones.
    Opened(usize),
    /// The cell held a mine.
    Exploded,
}

/// A revealed numbered cell and its unresolved surroundings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub at: Coord,
    pub count: u8,
    /// Hidden neighbors, in neighbor-cache order.
    pub hidden: Vec<Coord>,
    pub flagged: usize,
    pub questioned: usize,
}

impl Constraint {
    /// Mines still to be placed among `hidden`. Negative when over-flagged.
    #[inline(always)]
    pub fn remaining(&self) -> i64 {
        self.count as i64 - self.flagged as i64
    }
}

#[derive(Clone, Debug)]
pub struct RevealState {
    dims: Dimensions,
    bomb_count: usize,
    marks: Vec<Mark>,
    mines_left: i64,
    revealed: usize,
    exploded: Option<Coord>,
}

impl RevealState {
    /// All-hidden state for a board of `dims` carrying `bomb_count` mines.
    pub fn new(dims: Dimensions, bomb_count: usize) -> Self {
        Self {
            dims,
            bomb_count,
            marks: vec![Mark::Hidden; dims.cell_count()],
            mines_left: bomb_count as i64,
            revealed: 0,
            exploded: None,
        }
    }

    /// Back to all-hidden for a new episode.
    pub fn reset(&mut self) {
        *self = Self::new(self.dims, self.bomb_count);
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Mine count minus placed flags, as shown on the counter.
    pub fn mines_left(&self) -> i64 {
        self.mines_left
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn exploded(&self) -> Option<Coord> {
        self.exploded
    }

    pub fn mark(&self, c: Coord) -> Result<Mark> {
        self.dims.check(c)?;
        Ok(self.mark_at(c))
    }

    #[inline(always)]
    pub(crate) fn mark_at(&self, c: Coord) -> Mark {
        self.marks[self.dims.index(c)]
    }

    #[inline(always)]
    fn set_mark(&mut self, c: Coord, mark: Mark) {
        let idx = self.dims.index(c);
        self.marks[idx] = mark;
    }

    /// Count shown by a revealed, non-mine cell. `None` for anything else.
    pub fn clue(&self, board: &Board, c: Coord) -> Option<u8> {
        if !self.dims.contains(c) || self.mark_at(c) != Mark::Revealed {
            return None;
        }
        match board.cell_at(c) {
            Cell::Count(n) => Some(n),
            Cell::Mine => None,
        }
    }

    /// Open a cell, flood-filling across blanks.
    ///
    /// Flagged, questioned and already revealed cells are left alone. The
    /// fill uses an explicit stack so large empty regions cannot exhaust the
    /// call stack.
    pub fn reveal(&mut self, board: &Board, c: Coord) -> Result<RevealOutcome> {
        self.dims.check(c)?;
        debug_assert_eq!(self.dims, board.dims());

        if self.mark_at(c) != Mark::Hidden {
            return Ok(RevealOutcome::Ignored);
        }

        if board.cell_at(c).is_mine() {
            self.set_mark(c, Mark::Revealed);
            self.exploded = Some(c);
            return Ok(RevealOutcome::Exploded);
        }

        let mut opened = 0;
        let mut stack = vec![c];

        while let Some(cur) = stack.pop() {
            if self.mark_at(cur) != Mark::Hidden {
                continue;
            }
            self.set_mark(cur, Mark::Revealed);
            self.revealed += 1;
            opened += 1;

            if board.cell_at(cur) == Cell::Count(0) {
                stack.extend(
                    board
                        .neighbors(cur)
                        .iter()
                        .filter(|&&n| self.mark_at(n) == Mark::Hidden),
                );
            }
        }

        Ok(RevealOutcome::Opened(opened))
    }

    /// Rotate `Hidden -> Flagged -> Questioned -> Hidden`.
    pub fn cycle_flag(&mut self, c: Coord) -> Result<Mark> {
        self.dims.check(c)?;
        let next = match self.mark_at(c) {
            Mark::Revealed => return Err(Error::AlreadyRevealed { x: c.x, y: c.y }),
            Mark::Hidden => {
                self.mines_left -= 1;
                Mark::Flagged
            }
            Mark::Flagged => {
                self.mines_left += 1;
                Mark::Questioned
            }
            Mark::Questioned => Mark::Hidden,
        };
        self.set_mark(c, next);
        Ok(next)
    }

    /// Mark a cell as a known mine. Returns whether the mark changed.
    pub fn flag(&mut self, c: Coord) -> Result<bool> {
        self.dims.check(c)?;
        match self.mark_at(c) {
            Mark::Revealed => Err(Error::AlreadyRevealed { x: c.x, y: c.y }),
            Mark::Flagged => Ok(false),
            Mark::Hidden | Mark::Questioned => {
                self.set_mark(c, Mark::Flagged);
                self.mines_left -= 1;
                Ok(true)
            }
        }
    }

    /// Hidden cells in row-major order.
    pub fn hidden_cells(&self) -> Vec<Coord> {
        self.dims
            .row_major()
            .filter(|&c| self.mark_at(c) == Mark::Hidden)
            .collect()
    }

    pub fn questioned_count(&self) -> usize {
        self.marks.iter().filter(|&&m| m == Mark::Questioned).count()
    }

    /// Revealed cells with a count of at least one, in row-major order.
    pub fn numbered_cells(&self, board: &Board) -> Vec<Coord> {
        self.dims
            .row_major()
            .filter(|&c| matches!(self.clue(board, c), Some(n) if n > 0))
            .collect()
    }

    /// Constraint view of a revealed numbered cell.
    pub fn constraint(&self, board: &Board, c: Coord) -> Option<Constraint> {
        let count = self.clue(board, c).filter(|&n| n > 0)?;
        let mut hidden = Vec::new();
        let mut flagged = 0;
        let mut questioned = 0;

        for &n in board.neighbors(c) {
            match self.mark_at(n) {
                Mark::Hidden => hidden.push(n),
                Mark::Flagged => flagged += 1,
                Mark::Questioned => questioned += 1,
                Mark::Revealed => {}
            }
        }

        Some(Constraint {
            at: c,
            count,
            hidden,
            flagged,
            questioned,
        })
    }
}
