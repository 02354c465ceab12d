//! The autonomous player: deduction first, a guess policy when stuck.

use crate::deduction::DeductionConfig;
use crate::episode::{Episode, EpisodeResult, MetricsSink, Phase, RunStats};
use crate::error::{Error, Result};
use crate::oracle::Features;
use crate::reveal::RevealOutcome;
use crate::rng::GameRng;
use crate::samples::{Sample, SampleSink};
use crate::selection::{Choice, GuessPolicy};
use crate::types::Coord;

/// What a single turn did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Turn {
    /// The opening probe that created the board.
    Opening(RevealOutcome),
    /// Deduction made at least one certain move.
    Deduced { flagged: usize, revealed: usize },
    /// Deduction was stuck, so the policy probed.
    Guessed { choice: Choice, outcome: RevealOutcome },
}

pub struct Agent {
    policy: Box<dyn GuessPolicy>,
    deduction: DeductionConfig,
    first_probe: Coord,
    rng: GameRng,
}

impl Agent {
    pub fn new(
        policy: Box<dyn GuessPolicy>,
        deduction: DeductionConfig,
        first_probe: Coord,
        rng: GameRng,
    ) -> Self {
        Self {
            policy,
            deduction,
            first_probe,
            rng,
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Play one turn of `episode`.
    ///
    /// Probes with a heuristic probability are recorded in `samples` once
    /// their outcome is known.
    pub fn take_turn(
        &mut self,
        episode: &mut Episode,
        samples: &mut dyn SampleSink,
    ) -> Result<Turn> {
        if episode.phase() == Phase::NotStarted {
            let outcome = episode.probe(self.first_probe)?;
            return Ok(Turn::Opening(outcome));
        }

        let report = episode.deduce(&self.deduction)?;
        if report.progress.any() {
            return Ok(Turn::Deduced {
                flagged: report.progress.flagged,
                revealed: report.progress.revealed,
            });
        }

        let Some(board) = episode.board() else {
            return Err(Error::InvariantViolation("episode in progress without a board".into()));
        };
        let state = episode.state();
        let choice = self.policy.choose(board, state, &mut self.rng)?;
        let features = choice
            .probability
            .map(|p| Features::new(board, state, choice.at, p));

        tracing::debug!(
            policy = self.policy.name(),
            cell = %choice.at,
            probability = ?choice.probability,
            rank = ?choice.rank,
            queries = choice.oracle_queries,
            "guess"
        );

        let outcome = episode.probe(choice.at)?;
        if let Some(features) = features {
            let mine = outcome == RevealOutcome::Exploded;
            samples.append(&Sample::new(choice.at, features, mine))?;
        }

        Ok(Turn::Guessed { choice, outcome })
    }

    /// Play `episode` from its current phase until it is won or lost.
    pub fn play_episode(
        &mut self,
        episode: &mut Episode,
        samples: &mut dyn SampleSink,
    ) -> Result<EpisodeResult> {
        let dims = episode.settings().dims;
        let max_turns = 2 * dims.cell_count() + 1;
        let mut turns = 0;
        let mut guesses = 0;

        while !episode.phase().is_over() {
            if turns >= max_turns {
                return Err(Error::InvariantViolation(format!(
                    "episode still running after {} turns",
                    turns
                )));
            }
            turns += 1;

            match self.take_turn(episode, samples)? {
                Turn::Opening(_) | Turn::Guessed { .. } => guesses += 1,
                Turn::Deduced { .. } => {}
            }
        }

        let result = EpisodeResult {
            won: episode.phase() == Phase::Won,
            turns,
            guesses,
            revealed: episode.state().revealed_count(),
            generation_attempts: episode.generation_attempts(),
        };
        tracing::info!(
            won = result.won,
            turns = result.turns,
            guesses = result.guesses,
            revealed = result.revealed,
            "episode finished"
        );
        Ok(result)
    }
}

/// Play `episodes` games back to back, resetting `episode` after each one.
pub fn run(
    agent: &mut Agent,
    episode: &mut Episode,
    episodes: usize,
    stats: &mut RunStats,
    samples: &mut dyn SampleSink,
    metrics: &mut dyn MetricsSink,
) -> Result<()> {
    for _ in 0..episodes {
        let result = agent.play_episode(episode, samples)?;
        stats.record(&result);
        metrics.publish(stats);
        episode.reset();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::episode::{GameSettings, WinRule};
    use crate::samples::NullSink;
    use crate::selection::Skill;
    use crate::types::Dimensions;

    fn agent(skill: Skill, first_probe: Coord, seed: u64) -> Agent {
        Agent::new(
            skill.policy(None),
            DeductionConfig::default(),
            first_probe,
            GameRng::from_seed(seed),
        )
    }

    #[test]
    fn test_single_mine_game_is_won_in_one_turn() {
        let board = Board::from_mines(Dimensions::new(5, 5).unwrap(), &[Coord::new(4, 4)]).unwrap();
        let mut ep = Episode::with_board(board, WinRule::AllSafeRevealed, GameRng::from_seed(2));
        let mut a = agent(Skill::Probability, Coord::new(0, 0), 1);

        let result = a.play_episode(&mut ep, &mut NullSink).unwrap();
        assert!(result.won);
        assert_eq!(result.turns, 1);
        assert_eq!(result.revealed, 24);
    }

    #[test]
    fn test_flag_rule_game_finishes_by_deduction() {
        let board = Board::from_mines(Dimensions::new(5, 5).unwrap(), &[Coord::new(4, 4)]).unwrap();
        let mut ep = Episode::with_board(board, WinRule::AllMinesFlagged, GameRng::from_seed(2));
        let mut a = agent(Skill::Logic, Coord::new(0, 0), 1);

        let result = a.play_episode(&mut ep, &mut NullSink).unwrap();
        assert!(result.won);
        assert_eq!(result.turns, 2);
        assert_eq!(result.guesses, 1);
    }

    #[test]
    fn test_guesses_are_logged_with_outcome() {
        let dims = Dimensions::new(16, 16).unwrap();
        let settings = GameSettings::new(dims, 40);
        let mut ep = Episode::new(settings, GameRng::from_seed(21)).unwrap();
        let mut a = agent(Skill::Probability, Coord::new(8, 8), 22);
        let mut samples: Vec<Sample> = Vec::new();

        let mut guessed = 0;
        for _ in 0..5 {
            let result = a.play_episode(&mut ep, &mut samples).unwrap();
            guessed += result.guesses - 1;
            if !result.won {
                let last = samples.last().unwrap();
                assert!(last.mine);
                assert_eq!(ep.state().exploded(), Some(last.at));
            }
            ep.reset();
        }
        assert_eq!(samples.len(), guessed);
        assert!(samples.iter().all(|s| s.window[4] == 10));
    }

    #[test]
    fn test_run_records_every_episode() {
        let settings = GameSettings::new(Dimensions::new(9, 9).unwrap(), 10);
        let mut ep = Episode::new(settings, GameRng::from_seed(7)).unwrap();
        let mut a = agent(Skill::Probability, Coord::new(4, 4), 8);
        let mut stats = RunStats::default();
        let mut snapshots: Vec<RunStats> = Vec::new();

        run(&mut a, &mut ep, 12, &mut stats, &mut NullSink, &mut snapshots).unwrap();

        assert_eq!(stats.played, 12);
        assert!(stats.won <= 12);
        assert_eq!(stats.history.len(), 12);
        assert_eq!(snapshots.len(), 12);
        assert_eq!(snapshots.last(), Some(&stats));
        assert_eq!(ep.phase(), Phase::NotStarted);
    }
}
