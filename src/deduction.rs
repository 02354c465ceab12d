//! Certain-move deduction.
//!
//! - Strategy 1: single-cell saturation
//! - Strategy 2: pairwise subset difference between edge-adjacent clues
//! - Global mine count: all remaining hidden cells are mines, or none are
//!
//! Every strategy reads revealed clues through the reveal state and applies
//! its moves immediately, so later constraints in the same pass see them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::board::Board;
use crate::error::Result;
use crate::reveal::{Constraint, RevealOutcome, RevealState};
use crate::types::Coord;

/// Which strategies run after the always-on single-cell rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeductionConfig {
    pub pairwise: bool,
    pub global_count: bool,
}

impl Default for DeductionConfig {
    fn default() -> Self {
        Self {
            pairwise: true,
            global_count: true,
        }
    }
}

/// Moves made by one or more passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub flagged: usize,
    pub revealed: usize,
    /// A deduced reveal hit a mine. Only possible with wrong flags.
    pub exploded: bool,
}

impl Progress {
    pub fn any(&self) -> bool {
        self.flagged > 0 || self.revealed > 0 || self.exploded
    }

    fn absorb(&mut self, other: Progress) {
        self.flagged += other.flagged;
        self.revealed += other.revealed;
        self.exploded |= other.exploded;
    }

    fn flag(&mut self, state: &mut RevealState, cells: &[Coord]) -> Result<()> {
        for &c in cells {
            if state.flag(c)? {
                self.flagged += 1;
            }
        }
        Ok(())
    }

    /// Reveal `cells`, stopping at the first explosion.
    fn reveal(&mut self, board: &Board, state: &mut RevealState, cells: &[Coord]) -> Result<()> {
        for &c in cells {
            match state.reveal(board, c)? {
                RevealOutcome::Opened(n) => self.revealed += n,
                RevealOutcome::Exploded => {
                    self.exploded = true;
                    return Ok(());
                }
                RevealOutcome::Ignored => {}
            }
        }
        Ok(())
    }
}

/// Summary of a run to the fixed point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeductionReport {
    /// Passes executed, including the final unproductive one.
    pub passes: usize,
    pub progress: Progress,
}

// ─── Strategy 1: single-cell saturation ─────────────────────────────────────

/// One pass of the saturation rule over every numbered cell.
///
/// If a clue equals its hidden plus flagged neighbors, the hidden ones are
/// mines. If it equals its flagged neighbors, the hidden ones are safe.
pub fn apply_single_cell(board: &Board, state: &mut RevealState) -> Result<Progress> {
    let mut progress = Progress::default();

    for c in state.numbered_cells(board) {
        let Some(con) = state.constraint(board, c) else {
            continue;
        };
        if con.hidden.is_empty() || con.questioned > 0 {
            continue;
        }

        let count = con.count as usize;
        if count == con.hidden.len() + con.flagged {
            progress.flag(state, &con.hidden)?;
        } else if count == con.flagged {
            progress.reveal(board, state, &con.hidden)?;
            if progress.exploded {
                return Ok(progress);
            }
        }
    }

    Ok(progress)
}

// ─── Strategy 2: pairwise subset difference ─────────────────────────────────

/// Try to resolve `big` against `small`, where `big` needs at least as many
/// more mines. Returns the cells to flag and to reveal.
fn resolve_pair(big: &Constraint, small: &Constraint) -> Option<(Vec<Coord>, Vec<Coord>)> {
    let big_set: HashSet<Coord> = big.hidden.iter().copied().collect();
    let small_set: HashSet<Coord> = small.hidden.iter().copied().collect();

    let big_only: Vec<Coord> =
        big.hidden.iter().copied().filter(|c| !small_set.contains(c)).collect();
    let small_only: Vec<Coord> =
        small.hidden.iter().copied().filter(|c| !big_set.contains(c)).collect();

    let deficit = big.remaining() - small.remaining();
    if deficit != big_only.len() as i64 || (big_only.is_empty() && small_only.is_empty()) {
        return None;
    }

    Some((big_only, small_only))
}

fn usable(con: &Constraint) -> bool {
    con.questioned == 0 && con.remaining() >= 0
}

/// One pass of the pairwise rule over every edge-adjacent pair of clues.
///
/// Each unordered pair is visited once: a cell looks right and down only.
pub fn apply_pairwise(board: &Board, state: &mut RevealState) -> Result<Progress> {
    let mut progress = Progress::default();
    let dims = board.dims();

    for a_at in state.numbered_cells(board) {
        for b_at in [a_at.right(), a_at.down()] {
            if !dims.contains(b_at) {
                continue;
            }
            let Some(a) = state.constraint(board, a_at) else {
                continue;
            };
            let Some(b) = state.constraint(board, b_at) else {
                continue;
            };
            if !usable(&a) || !usable(&b) {
                continue;
            }

            let resolved = match a.remaining().cmp(&b.remaining()) {
                std::cmp::Ordering::Greater => resolve_pair(&a, &b),
                std::cmp::Ordering::Less => resolve_pair(&b, &a),
                std::cmp::Ordering::Equal => resolve_pair(&a, &b).or_else(|| resolve_pair(&b, &a)),
            };
            let Some((mines, safe)) = resolved else {
                continue;
            };

            tracing::trace!(a = %a_at, b = %b_at, ?mines, ?safe, "pairwise deduction");
            progress.flag(state, &mines)?;
            progress.reveal(board, state, &safe)?;
            if progress.exploded {
                return Ok(progress);
            }
        }
    }

    Ok(progress)
}

// ─── Global mine count ──────────────────────────────────────────────────────

/// Resolve every hidden cell at once when the mine counter decides them.
///
/// Skipped while question marks are on the board, since those cells are
/// neither counted as hidden nor as flagged.
pub fn apply_global_count(board: &Board, state: &mut RevealState) -> Result<Progress> {
    let mut progress = Progress::default();
    if state.questioned_count() > 0 {
        return Ok(progress);
    }

    let hidden = state.hidden_cells();
    if hidden.is_empty() {
        return Ok(progress);
    }

    let mines_left = state.mines_left();
    if mines_left == 0 {
        progress.reveal(board, state, &hidden)?;
    } else if mines_left == hidden.len() as i64 {
        progress.flag(state, &hidden)?;
    }

    Ok(progress)
}

/// One deduction pass: every enabled strategy once, in order.
pub fn deduction_pass(
    board: &Board,
    state: &mut RevealState,
    config: &DeductionConfig,
) -> Result<Progress> {
    let mut progress = apply_single_cell(board, state)?;

    if config.pairwise && !progress.exploded {
        progress.absorb(apply_pairwise(board, state)?);
    }
    if config.global_count && !progress.exploded {
        progress.absorb(apply_global_count(board, state)?);
    }

    Ok(progress)
}

/// Run passes until one makes no move or a mine explodes.
///
/// Each productive pass turns at least one hidden cell into a flag or an
/// opening, so this ends within `width * height` passes.
pub fn solve_to_fixed_point(
    board: &Board,
    state: &mut RevealState,
    config: &DeductionConfig,
) -> Result<DeductionReport> {
    let mut report = DeductionReport::default();

    loop {
        report.passes += 1;
        let pass = deduction_pass(board, state, config)?;
        report.progress.absorb(pass);

        if !pass.any() || pass.exploded {
            break;
        }
    }

    tracing::debug!(
        passes = report.passes,
        flagged = report.progress.flagged,
        revealed = report.progress.revealed,
        "deduction reached fixed point"
    );

    Ok(report)
}
