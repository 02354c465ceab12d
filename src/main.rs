use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use minesweeper_agent::config::{AgentConfig, Difficulty};
use minesweeper_agent::episode::{LogMetrics, RunStats};
use minesweeper_agent::samples::{CsvSampleStore, NullSink, SampleSink};
use minesweeper_agent::selection::Skill;

/// Let the agent play a batch of Minesweeper games.
#[derive(Parser)]
#[command(name = "minesweeper-agent", about = "Autonomous Minesweeper player")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "agent.toml")]
    config: PathBuf,

    /// Board preset: beginner, intermediate, expert or custom
    #[arg(long)]
    preset: Option<Difficulty>,

    /// Skill level: logic, probability or oracle
    #[arg(long)]
    skill: Option<Skill>,

    /// Override number of episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Append probe samples to this CSV file
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Reject guesses above this probability (enables the threshold oracle)
    #[arg(long)]
    oracle_threshold: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("minesweeper_agent=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AgentConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // CLI overrides
    if let Some(preset) = cli.preset {
        let first_probe = config.board.first_probe;
        config.board = preset.board();
        config.board.first_probe = first_probe;
    }
    if let Some(skill) = cli.skill {
        config.play.skill = skill;
    }
    if let Some(episodes) = cli.episodes {
        config.play.episodes = episodes;
    }
    if cli.seed.is_some() {
        config.play.seed = cli.seed;
    }
    if cli.samples.is_some() {
        config.samples.path = cli.samples;
    }
    if cli.oracle_threshold.is_some() {
        config.oracle.max_probability = cli.oracle_threshold;
    }
    config
        .validate()
        .context("invalid configuration after CLI overrides")?;

    let (mut agent, mut episode) = config.build(None).context("setting up the agent")?;

    let mut samples: Box<dyn SampleSink> = match &config.samples.path {
        Some(path) => Box::new(
            CsvSampleStore::open(path)
                .with_context(|| format!("opening sample store {}", path.display()))?,
        ),
        None => Box::new(NullSink),
    };

    tracing::info!(
        width = config.board.width,
        height = config.board.height,
        bombs = config.board.bombs,
        skill = agent.policy_name(),
        episodes = config.play.episodes,
        "starting run"
    );

    let mut stats = RunStats::default();
    minesweeper_agent::run(
        &mut agent,
        &mut episode,
        config.play.episodes,
        &mut stats,
        samples.as_mut(),
        &mut LogMetrics,
    )
    .context("playing episodes")?;

    println!(
        "played {} | won {} | win rate {:.1}%",
        stats.played,
        stats.won,
        stats.win_rate() * 100.0
    );
    Ok(())
}
