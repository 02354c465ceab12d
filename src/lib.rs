//! Autonomous Minesweeper player.
//!
//! The agent plays episodes on its own: certain moves come from constraint
//! deduction over the revealed clues, and when none is left a guess policy
//! picks the hidden cell with the lowest estimated mine probability,
//! optionally vetted by an external oracle.
//!
//! Grids are stored flat in column-major layout: `cells[x * height + y]`.

pub mod agent;
pub mod board;
pub mod config;
pub mod deduction;
pub mod episode;
pub mod error;
pub mod oracle;
pub mod probability;
pub mod reveal;
pub mod rng;
pub mod samples;
pub mod selection;
pub mod types;

pub use agent::{run, Agent, Turn};
pub use board::{Board, Cell, SafeStart};
pub use config::{AgentConfig, Difficulty};
pub use episode::{Episode, EpisodeResult, GameSettings, MetricsSink, Phase, RunStats, WinRule};
pub use error::{ConfigError, Error, Result};
pub use oracle::{Features, NeverReject, Oracle, ThresholdOracle};
pub use reveal::{Mark, RevealOutcome, RevealState};
pub use rng::GameRng;
pub use samples::{CsvSampleStore, NullSink, Sample, SampleSink};
pub use selection::{GuessPolicy, Skill};
pub use types::{Coord, Dimensions};

// ─── WASM Exports (only compiled for wasm32 target) ─────────────────────────

#[cfg(target_arch = "wasm32")]
mod wasm_exports {
    use wasm_bindgen::prelude::*;

    use crate::config::AgentConfig;
    use crate::episode::{LogMetrics, RunStats};
    use crate::samples::NullSink;
    use crate::selection::Skill;

    fn js_err(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    /// Play `episodes` games and return `{ played, won, history }`.
    ///
    /// `skill` is `"logic"`, `"probability"` or `"oracle"`; a negative `seed`
    /// draws one from browser entropy.
    #[wasm_bindgen(js_name = "playEpisodes")]
    pub fn wasm_play_episodes(
        width: usize,
        height: usize,
        bombs: usize,
        episodes: usize,
        skill: &str,
        seed: f64,
    ) -> Result<JsValue, JsValue> {
        let mut config = AgentConfig::default();
        config.board.width = width;
        config.board.height = height;
        config.board.bombs = bombs;
        config.play.episodes = episodes;
        config.play.skill = skill.parse::<Skill>().map_err(js_err)?;
        config.play.seed = (seed >= 0.0).then_some(seed as u64);
        config.validate().map_err(js_err)?;

        let (mut agent, mut episode) = config.build(None).map_err(js_err)?;
        let mut stats = RunStats::default();
        crate::agent::run(
            &mut agent,
            &mut episode,
            episodes,
            &mut stats,
            &mut NullSink,
            &mut LogMetrics,
        )
        .map_err(js_err)?;

        serde_wasm_bindgen::to_value(&stats).map_err(js_err)
    }

    /// Ping function to verify WASM is loaded.
    #[wasm_bindgen(js_name = "ping")]
    pub fn wasm_ping() -> String {
        "WASM agent ready".to_string()
    }
}
