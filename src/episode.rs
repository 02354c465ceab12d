//! One game from first probe to win or loss, and the statistics kept across
//! games.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::board::{generate_for_probe, Board, SafeStart};
use crate::deduction::{solve_to_fixed_point, DeductionConfig, DeductionReport};
use crate::error::{Error, Result};
use crate::reveal::{Mark, RevealOutcome, RevealState};
use crate::rng::GameRng;
use crate::types::{Coord, Dimensions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl Phase {
    pub fn is_over(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

/// When an episode counts as won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinRule {
    /// Every non-mine cell revealed; flags are irrelevant.
    #[default]
    AllSafeRevealed,
    /// Every mine flagged, no flag on a safe cell, every safe cell revealed.
    AllMinesFlagged,
}

impl FromStr for WinRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all-safe-revealed" | "safe" => Ok(WinRule::AllSafeRevealed),
            "all-mines-flagged" | "flagged" => Ok(WinRule::AllMinesFlagged),
            other => Err(format!(
                "unknown win rule '{}' (expected 'all-safe-revealed' or 'all-mines-flagged')",
                other
            )),
        }
    }
}

/// Win test for a state that has not exploded.
pub fn check_win(board: &Board, state: &RevealState, rule: WinRule) -> bool {
    let dims = board.dims();
    let safe_cells = dims.cell_count() - board.mine_count();
    if state.revealed_count() != safe_cells {
        return false;
    }

    match rule {
        WinRule::AllSafeRevealed => true,
        WinRule::AllMinesFlagged => dims.row_major().all(|c| {
            let flagged = state.mark_at(c) == Mark::Flagged;
            flagged == board.cell_at(c).is_mine()
        }),
    }
}

/// Everything needed to set up an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameSettings {
    pub dims: Dimensions,
    pub bombs: usize,
    pub safe_start: SafeStart,
    pub max_generation_attempts: u32,
    pub win_rule: WinRule,
}

impl GameSettings {
    pub fn new(dims: Dimensions, bombs: usize) -> Self {
        Self {
            dims,
            bombs,
            safe_start: SafeStart::default(),
            max_generation_attempts: 100,
            win_rule: WinRule::default(),
        }
    }
}

/// Summary of a finished episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub won: bool,
    pub turns: usize,
    /// Probes made without certainty, the opening one included.
    pub guesses: usize,
    pub revealed: usize,
    pub generation_attempts: u32,
}

/// Win/loss counters across a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub played: usize,
    pub won: usize,
    /// Win rate after each episode.
    pub history: Vec<f64>,
}

impl RunStats {
    pub fn record(&mut self, result: &EpisodeResult) {
        self.played += 1;
        if result.won {
            self.won += 1;
        }
        self.history.push(self.win_rate());
    }

    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            return 0.0;
        }
        self.won as f64 / self.played as f64
    }
}

/// Receives a snapshot of the stats after every episode.
pub trait MetricsSink {
    fn publish(&mut self, stats: &RunStats);
}

/// Emits each snapshot as a tracing event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn publish(&mut self, stats: &RunStats) {
        tracing::info!(
            played = stats.played,
            won = stats.won,
            win_rate = stats.win_rate(),
            "run stats"
        );
    }
}

impl MetricsSink for Vec<RunStats> {
    fn publish(&mut self, stats: &RunStats) {
        self.push(stats.clone());
    }
}

/// Board, player view and phase of the current game.
///
/// The board does not exist until the first probe, which decides where the
/// guaranteed safe cell goes.
pub struct Episode {
    settings: GameSettings,
    board: Option<Board>,
    /// Layout to use instead of a random one at the next first probe.
    preset: Option<Board>,
    state: RevealState,
    phase: Phase,
    rng: GameRng,
    generation_attempts: u32,
}

impl Episode {
    pub fn new(settings: GameSettings, rng: GameRng) -> Result<Self> {
        // Surface impossible settings before any probe.
        if settings.bombs >= settings.dims.cell_count() {
            return Err(Error::TooManyMines {
                bombs: settings.bombs,
                cells: settings.dims.cell_count(),
            });
        }
        Ok(Self {
            state: RevealState::new(settings.dims, settings.bombs),
            settings,
            board: None,
            preset: None,
            phase: Phase::NotStarted,
            rng,
            generation_attempts: 0,
        })
    }

    /// Episode whose first game is played on `board` instead of a random layout.
    /// Later games are generated from `rng`.
    pub fn with_board(board: Board, win_rule: WinRule, rng: GameRng) -> Self {
        let settings = GameSettings {
            win_rule,
            ..GameSettings::new(board.dims(), board.mine_count())
        };
        Self {
            state: RevealState::new(settings.dims, settings.bombs),
            settings,
            board: None,
            preset: Some(board),
            phase: Phase::NotStarted,
            rng,
            generation_attempts: 0,
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn state(&self) -> &RevealState {
        &self.state
    }

    pub fn generation_attempts(&self) -> u32 {
        self.generation_attempts
    }

    fn ensure_open(&self) -> Result<()> {
        if self.phase.is_over() {
            return Err(Error::EpisodeOver);
        }
        Ok(())
    }

    fn start(&mut self, probe: Coord) -> Result<()> {
        let board = match self.preset.take() {
            Some(board) => {
                self.generation_attempts = 0;
                board
            }
            None => {
                let generated = generate_for_probe(
                    self.settings.dims,
                    self.settings.bombs,
                    probe,
                    self.settings.safe_start,
                    self.settings.max_generation_attempts,
                    &mut self.rng,
                )?;
                self.generation_attempts = generated.attempts;
                generated.board
            }
        };
        self.board = Some(board);
        self.phase = Phase::InProgress;
        Ok(())
    }

    fn refresh_phase(&mut self) {
        let Some(board) = self.board.as_ref() else {
            return;
        };
        if self.state.exploded().is_some() {
            self.phase = Phase::Lost;
        } else if check_win(board, &self.state, self.settings.win_rule) {
            self.phase = Phase::Won;
        }
    }

    /// Reveal a cell. The first probe of an episode creates the board.
    pub fn probe(&mut self, c: Coord) -> Result<RevealOutcome> {
        self.ensure_open()?;
        self.settings.dims.check(c)?;

        if self.phase == Phase::NotStarted {
            self.start(c)?;
        }
        let Some(board) = self.board.as_ref() else {
            return Err(Error::InvariantViolation("episode in progress without a board".into()));
        };

        let outcome = self.state.reveal(board, c)?;
        self.refresh_phase();
        Ok(outcome)
    }

    /// Cycle the player mark on a cell.
    pub fn toggle_flag(&mut self, c: Coord) -> Result<Mark> {
        self.ensure_open()?;
        let mark = self.state.cycle_flag(c)?;
        self.refresh_phase();
        Ok(mark)
    }

    /// Apply certain moves until none is left.
    pub fn deduce(&mut self, config: &DeductionConfig) -> Result<DeductionReport> {
        self.ensure_open()?;
        let Some(board) = self.board.as_ref() else {
            return Ok(DeductionReport::default());
        };

        let report = solve_to_fixed_point(board, &mut self.state, config)?;
        self.refresh_phase();
        Ok(report)
    }

    /// Drop the board and every mark. The next probe starts a new game.
    pub fn reset(&mut self) {
        self.board = None;
        self.state.reset();
        self.phase = Phase::NotStarted;
        self.generation_attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(board: Board, rule: WinRule) -> Episode {
        Episode::with_board(board, rule, GameRng::from_seed(0))
    }

    fn single_mine_board() -> Board {
        Board::from_mines(Dimensions::new(5, 5).unwrap(), &[Coord::new(4, 4)]).unwrap()
    }

    #[test]
    fn test_opening_wins_when_safe_cells_count() {
        let mut ep = preset(single_mine_board(), WinRule::AllSafeRevealed);
        assert_eq!(ep.phase(), Phase::NotStarted);

        let outcome = ep.probe(Coord::new(0, 0)).unwrap();
        assert_eq!(outcome, RevealOutcome::Opened(24));
        assert_eq!(ep.phase(), Phase::Won);
    }

    #[test]
    fn test_flag_rule_needs_the_flag() {
        let mut ep = preset(single_mine_board(), WinRule::AllMinesFlagged);
        ep.probe(Coord::new(0, 0)).unwrap();
        assert_eq!(ep.phase(), Phase::InProgress);

        assert_eq!(ep.toggle_flag(Coord::new(4, 4)).unwrap(), Mark::Flagged);
        assert_eq!(ep.phase(), Phase::Won);
    }

    #[test]
    fn test_flag_rule_won_by_deduction() {
        let mut ep = preset(single_mine_board(), WinRule::AllMinesFlagged);
        ep.probe(Coord::new(0, 0)).unwrap();

        let report = ep.deduce(&DeductionConfig::default()).unwrap();
        assert_eq!(report.progress.flagged, 1);
        assert_eq!(ep.phase(), Phase::Won);
    }

    #[test]
    fn test_mine_probe_loses() {
        let board = Board::from_mines(
            Dimensions::new(4, 4).unwrap(),
            &[Coord::new(3, 3), Coord::new(0, 3)],
        )
        .unwrap();
        let mut ep = preset(board, WinRule::AllSafeRevealed);
        ep.probe(Coord::new(3, 0)).unwrap();
        assert_eq!(ep.phase(), Phase::InProgress);

        assert_eq!(ep.probe(Coord::new(3, 3)).unwrap(), RevealOutcome::Exploded);
        assert_eq!(ep.phase(), Phase::Lost);
        assert!(matches!(ep.probe(Coord::new(1, 1)), Err(Error::EpisodeOver)));
        assert!(matches!(ep.toggle_flag(Coord::new(1, 1)), Err(Error::EpisodeOver)));
    }

    #[test]
    fn test_loss_beats_win() {
        // Every safe cell is open; the explosion must still count as a loss.
        let board = Board::from_mines(
            Dimensions::new(3, 1).unwrap(),
            &[Coord::new(2, 0)],
        )
        .unwrap();
        let mut ep = preset(board, WinRule::AllSafeRevealed);
        ep.probe(Coord::new(1, 0)).unwrap();
        assert_eq!(ep.phase(), Phase::InProgress);

        let board = ep.board().unwrap().clone();
        ep.state.reveal(&board, Coord::new(0, 0)).unwrap();
        ep.state.reveal(&board, Coord::new(2, 0)).unwrap();
        ep.refresh_phase();
        assert_eq!(ep.phase(), Phase::Lost);
    }

    #[test]
    fn test_games_after_preset_replay_from_seed() {
        let layouts: Vec<Vec<bool>> = (0..2)
            .map(|_| {
                let mut ep = Episode::with_board(
                    single_mine_board(),
                    WinRule::AllSafeRevealed,
                    GameRng::from_seed(77),
                );
                ep.probe(Coord::new(0, 0)).unwrap();
                ep.reset();
                ep.probe(Coord::new(2, 2)).unwrap();
                let board = ep.board().unwrap();
                board.dims().row_major().map(|c| board.is_mine(c).unwrap()).collect()
            })
            .collect();
        assert_eq!(layouts[0], layouts[1]);
    }

    #[test]
    fn test_out_of_bounds_probe() {
        let settings = GameSettings::new(Dimensions::new(9, 9).unwrap(), 10);
        let mut ep = Episode::new(settings, GameRng::from_seed(3)).unwrap();
        let err = ep.probe(Coord::new(9, 0)).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { x: 9, y: 0, width: 9, height: 9 }));
        assert_eq!(ep.phase(), Phase::NotStarted);
    }

    #[test]
    fn test_first_probe_never_loses() {
        let settings = GameSettings::new(Dimensions::new(8, 8).unwrap(), 40);
        let mut ep = Episode::new(settings, GameRng::from_seed(11)).unwrap();
        for _ in 0..20 {
            let outcome = ep.probe(Coord::new(4, 4)).unwrap();
            assert_ne!(outcome, RevealOutcome::Exploded);
            assert_ne!(ep.phase(), Phase::Lost);
            ep.reset();
            assert!(ep.board().is_none());
            assert_eq!(ep.state().revealed_count(), 0);
        }
    }

    #[test]
    fn test_too_many_mines_rejected_up_front() {
        let settings = GameSettings::new(Dimensions::new(3, 3).unwrap(), 9);
        assert!(matches!(
            Episode::new(settings, GameRng::from_seed(0)),
            Err(Error::TooManyMines { bombs: 9, cells: 9 })
        ));
    }

    #[test]
    fn test_run_stats_history() {
        let mut stats = RunStats::default();
        let mut result = EpisodeResult {
            won: true,
            turns: 3,
            guesses: 1,
            revealed: 10,
            generation_attempts: 1,
        };
        stats.record(&result);
        result.won = false;
        stats.record(&result);

        assert_eq!(stats.played, 2);
        assert_eq!(stats.won, 1);
        assert_eq!(stats.history, vec![1.0, 0.5]);

        let mut snapshots: Vec<RunStats> = Vec::new();
        snapshots.publish(&stats);
        assert_eq!(snapshots[0], stats);
    }

    #[test]
    fn test_win_rule_from_str() {
        assert_eq!("all-mines-flagged".parse::<WinRule>().unwrap(), WinRule::AllMinesFlagged);
        assert!("none".parse::<WinRule>().is_err());
    }
}
