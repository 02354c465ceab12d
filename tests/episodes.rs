use minesweeper_agent::deduction::DeductionConfig;
use minesweeper_agent::oracle::{Features, NeverReject};
use minesweeper_agent::selection::Skill;
use minesweeper_agent::{
    run, Agent, AgentConfig, Board, Coord, Difficulty, Dimensions, Episode, GameRng,
    GameSettings, Mark, NullSink, Phase, RunStats, Sample, WinRule,
};

fn settings(width: usize, height: usize, bombs: usize, win_rule: WinRule) -> GameSettings {
    GameSettings {
        win_rule,
        ..GameSettings::new(Dimensions::new(width, height).unwrap(), bombs)
    }
}

/// Every flag the agent leaves behind sits on a mine, and a win means every
/// safe cell is open.
fn assert_consistent(episode: &Episode) {
    let board = episode.board().unwrap();
    let state = episode.state();
    let dims = board.dims();

    for c in dims.row_major() {
        if state.mark(c).unwrap() == Mark::Flagged {
            assert!(board.is_mine(c).unwrap(), "flag on safe cell {}", c);
        }
    }
    match episode.phase() {
        Phase::Won => {
            assert!(state.exploded().is_none());
            assert_eq!(state.revealed_count(), dims.cell_count() - board.mine_count());
        }
        Phase::Lost => assert!(state.exploded().is_some()),
        other => panic!("episode ended in {:?}", other),
    }
}

#[test]
fn seeded_runs_stay_sound_for_every_skill() {
    for skill in [Skill::Logic, Skill::Probability, Skill::Oracle] {
        let mut episode = Episode::new(
            settings(16, 16, 40, WinRule::AllSafeRevealed),
            GameRng::from_seed(100),
        )
        .unwrap();
        let mut agent = Agent::new(
            skill.policy(Some(Box::new(NeverReject))),
            DeductionConfig::default(),
            Coord::new(8, 8),
            GameRng::from_seed(101),
        );

        for _ in 0..10 {
            let result = agent.play_episode(&mut episode, &mut NullSink).unwrap();
            assert_consistent(&episode);
            assert_eq!(result.won, episode.phase() == Phase::Won);
            assert!(result.turns <= 2 * 256 + 1);
            episode.reset();
        }
    }
}

#[test]
fn flag_rule_wins_require_every_mine_flagged() {
    let mut episode = Episode::new(
        settings(9, 9, 10, WinRule::AllMinesFlagged),
        GameRng::from_seed(7),
    )
    .unwrap();
    let mut agent = Agent::new(
        Skill::Probability.policy(None),
        DeductionConfig::default(),
        Coord::new(4, 4),
        GameRng::from_seed(8),
    );

    let mut wins = 0;
    for _ in 0..20 {
        let result = agent.play_episode(&mut episode, &mut NullSink).unwrap();
        assert_consistent(&episode);
        if result.won {
            wins += 1;
            let board = episode.board().unwrap();
            for c in board.dims().row_major() {
                if board.is_mine(c).unwrap() {
                    assert_eq!(episode.state().mark(c).unwrap(), Mark::Flagged);
                }
            }
        }
        episode.reset();
    }
    // Beginner boards are mostly solvable from a centre opening.
    assert!(wins > 0);
}

#[test]
fn oracle_sees_only_player_view() {
    let board = Board::from_mines(
        Dimensions::new(6, 6).unwrap(),
        &[Coord::new(5, 0), Coord::new(0, 5), Coord::new(5, 5), Coord::new(3, 3)],
    )
    .unwrap();
    let mut episode = Episode::with_board(board, WinRule::AllSafeRevealed, GameRng::from_seed(0));

    let inspect = |f: &Features| {
        assert_eq!(f.window[4], 10);
        assert!(f.window.iter().all(|&v| (-1..=10).contains(&v)));
        assert!((0.0..=1.0).contains(&f.probability));
        Some(false)
    };
    let mut agent = Agent::new(
        Skill::Oracle.policy(Some(Box::new(inspect))),
        DeductionConfig::default(),
        Coord::new(0, 0),
        GameRng::from_seed(3),
    );

    let mut samples: Vec<Sample> = Vec::new();
    let result = agent.play_episode(&mut episode, &mut samples).unwrap();
    assert_consistent(&episode);
    assert_eq!(samples.len(), result.guesses - 1);
}

#[test]
fn run_from_config_tracks_win_rate() {
    let mut config = AgentConfig::default();
    config.board = Difficulty::Beginner.board();
    config.play.seed = Some(2024);

    let (mut agent, mut episode) = config.build(None).unwrap();
    let mut stats = RunStats::default();
    let mut snapshots: Vec<RunStats> = Vec::new();
    run(&mut agent, &mut episode, 25, &mut stats, &mut NullSink, &mut snapshots).unwrap();

    assert_eq!(stats.played, 25);
    assert_eq!(stats.history.len(), 25);
    assert!((stats.win_rate() - stats.won as f64 / 25.0).abs() < 1e-12);
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.played, i + 1);
        assert!(snapshot.history.iter().all(|r| (0.0..=1.0).contains(r)));
    }
}
