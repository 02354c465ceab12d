use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::agent::Agent;
use crate::board::SafeStart;
use crate::deduction::DeductionConfig;
use crate::episode::{Episode, GameSettings, WinRule};
use crate::error::{ConfigError, Result};
use crate::oracle::{Oracle, ThresholdOracle};
use crate::rng::GameRng;
use crate::selection::Skill;
use crate::types::{Coord, Dimensions};

/// Top-level agent configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub board: BoardConfig,
    pub play: PlayConfig,
    pub samples: SampleConfig,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub bombs: usize,
    /// Opening probe; the board centre when unset.
    pub first_probe: Option<Coord>,
    pub safe_start: SafeStart,
    pub max_generation_attempts: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Difficulty::Expert.board()
    }
}

impl BoardConfig {
    pub fn dims(&self) -> Result<Dimensions> {
        Dimensions::new(self.width, self.height)
    }

    pub fn first_probe(&self) -> Coord {
        self.first_probe.unwrap_or(Coord::new(self.width / 2, self.height / 2))
    }

    pub fn settings(&self, win_rule: WinRule) -> Result<GameSettings> {
        Ok(GameSettings {
            dims: self.dims()?,
            bombs: self.bombs,
            safe_start: self.safe_start,
            max_generation_attempts: self.max_generation_attempts,
            win_rule,
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    pub skill: Skill,
    pub win_rule: WinRule,
    pub episodes: usize,
    /// Seed for board generation and guesses; entropy when unset.
    pub seed: Option<u64>,
    pub deduction: DeductionConfig,
}

impl Default for PlayConfig {
    fn default() -> Self {
        PlayConfig {
            skill: Skill::default(),
            win_rule: WinRule::default(),
            episodes: 100,
            seed: None,
            deduction: DeductionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// CSV file receiving probe samples; none are kept when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Cutoff for the threshold oracle used by the `oracle` skill.
    pub max_probability: Option<f64>,
}

impl OracleConfig {
    pub fn build(&self) -> Option<Box<dyn Oracle>> {
        self.max_probability
            .map(|max_probability| Box::new(ThresholdOracle { max_probability }) as Box<dyn Oracle>)
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AgentConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> std::result::Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let b = &self.board;
        if b.width == 0 || b.height == 0 {
            return Err(ConfigError::Validation(
                "board.width and board.height must be > 0".into(),
            ));
        }
        if b.bombs >= b.width * b.height {
            return Err(ConfigError::Validation(format!(
                "board.bombs must be < {} for a {}x{} board",
                b.width * b.height,
                b.width,
                b.height
            )));
        }
        if let Some(p) = b.first_probe {
            if p.x >= b.width || p.y >= b.height {
                return Err(ConfigError::Validation(format!(
                    "board.first_probe {} is outside the {}x{} board",
                    p, b.width, b.height
                )));
            }
        }
        if b.max_generation_attempts == 0 {
            return Err(ConfigError::Validation(
                "board.max_generation_attempts must be > 0".into(),
            ));
        }
        if self.play.win_rule == WinRule::AllMinesFlagged && !self.play.deduction.global_count {
            return Err(ConfigError::Validation(
                "play.win_rule = \"all-mines-flagged\" needs play.deduction.global_count = true \
                 (mines touching no safe cell are only flagged by the global count)"
                    .into(),
            ));
        }
        if self.play.episodes == 0 {
            return Err(ConfigError::Validation(
                "play.episodes must be > 0".into(),
            ));
        }
        if let Some(p) = self.oracle.max_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Validation(
                    "oracle.max_probability must be in [0, 1]".into(),
                ));
            }
        }
        Ok(())
    }

    /// Agent and episode ready to play.
    ///
    /// `oracle` overrides the one described by `[oracle]`. Both share one seed
    /// but draw from separate generators.
    pub fn build(&self, oracle: Option<Box<dyn Oracle>>) -> Result<(Agent, Episode)> {
        let mut root = GameRng::from_optional_seed(self.play.seed);
        let settings = self.board.settings(self.play.win_rule)?;
        let episode = Episode::new(settings, root.fork())?;

        let oracle = oracle.or_else(|| self.oracle.build());
        let agent = Agent::new(
            self.play.skill.policy(oracle),
            self.play.deduction,
            self.board.first_probe(),
            root.fork(),
        );
        Ok((agent, episode))
    }
}

/// Board presets from the classic game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    pub fn board(self) -> BoardConfig {
        let (width, height, bombs) = match self {
            Difficulty::Beginner => (9, 9, 10),
            Difficulty::Intermediate => (16, 16, 40),
            Difficulty::Expert => (30, 16, 99),
            Difficulty::Custom => (80, 45, 742),
        };
        BoardConfig {
            width,
            height,
            bombs,
            first_probe: None,
            safe_start: SafeStart::default(),
            max_generation_attempts: 100,
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "expert" => Ok(Difficulty::Expert),
            "custom" => Ok(Difficulty::Custom),
            other => Err(format!(
                "unknown preset '{}' (expected 'beginner', 'intermediate', 'expert' or 'custom')",
                other
            )),
        }
    }
}
