//! Probe selection when deduction is stuck.
//!
//! Candidates are ranked by the probability heuristic into tiers: the lowest
//! value, a same-value alternate, the next value up with its alternate, and on
//! large boards a third value. A [`GuessPolicy`] turns that ranking into one
//! probe; the skill levels differ only in which policy they use.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::board::Board;
use crate::error::{Error, Result};
use crate::oracle::{Features, Oracle};
use crate::probability::{estimate, ProbabilityMap};
use crate::reveal::RevealState;
use crate::rng::GameRng;
use crate::types::Coord;

/// Minimum board size for the third-lowest tier.
pub const THIRD_TIER_MIN_WIDTH: usize = 60;
pub const THIRD_TIER_MIN_HEIGHT: usize = 32;

/// Position of a candidate in the escalation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    FirstLowest,
    SecondChanceFirst,
    SecondLowest,
    SecondChanceSecond,
    ThirdLowest,
}

/// Ranked candidates taken from a probability map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tiers {
    pub first_lowest: Option<Coord>,
    pub second_chance_first: Option<Coord>,
    pub second_lowest: Option<Coord>,
    pub second_chance_second: Option<Coord>,
    pub third_lowest: Option<Coord>,
}

/// First cell (row-major) holding the minimum probability strictly above `floor`.
fn lowest_above(map: &ProbabilityMap, floor: Option<f64>) -> Option<Coord> {
    let mut best: Option<(Coord, f64)> = None;
    for (c, p) in map.iter() {
        if floor.is_some_and(|f| p <= f) {
            continue;
        }
        if best.is_none_or(|(_, b)| p < b) {
            best = Some((c, p));
        }
    }
    best.map(|(c, _)| c)
}

/// First other cell (row-major) with exactly the same probability as `c`.
fn same_tier(map: &ProbabilityMap, c: Coord) -> Option<Coord> {
    let p = map.get(c)?;
    map.iter().find(|&(o, q)| o != c && q == p).map(|(o, _)| o)
}

impl Tiers {
    pub fn from_map(map: &ProbabilityMap) -> Self {
        let dims = map.dims();
        let first_lowest = lowest_above(map, None);
        let second_chance_first = first_lowest.and_then(|c| same_tier(map, c));
        let second_lowest = first_lowest.and_then(|c| lowest_above(map, map.get(c)));
        let second_chance_second = second_lowest.and_then(|c| same_tier(map, c));
        let large = dims.width >= THIRD_TIER_MIN_WIDTH && dims.height >= THIRD_TIER_MIN_HEIGHT;
        let third_lowest = if large {
            second_lowest.and_then(|c| lowest_above(map, map.get(c)))
        } else {
            None
        };

        Self {
            first_lowest,
            second_chance_first,
            second_lowest,
            second_chance_second,
            third_lowest,
        }
    }

    /// Candidates in the order the oracle is asked about them.
    pub fn escalation(&self) -> impl Iterator<Item = (Rank, Coord)> {
        [
            (Rank::FirstLowest, self.first_lowest),
            (Rank::SecondChanceFirst, self.second_chance_first),
            (Rank::SecondLowest, self.second_lowest),
            (Rank::SecondChanceSecond, self.second_chance_second),
            (Rank::ThirdLowest, self.third_lowest),
        ]
        .into_iter()
        .filter_map(|(rank, c)| c.map(|c| (rank, c)))
    }
}

/// The probe a policy settled on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Choice {
    pub at: Coord,
    /// Heuristic probability, when the policy computed one.
    pub probability: Option<f64>,
    /// Tier of the accepted cell; `None` for a random pick.
    pub rank: Option<Rank>,
    pub oracle_queries: u32,
}

impl Choice {
    fn random(at: Coord) -> Self {
        Self {
            at,
            probability: None,
            rank: None,
            oracle_queries: 0,
        }
    }
}

/// Chooses one hidden cell to probe when no certain move exists.
pub trait GuessPolicy {
    fn name(&self) -> &'static str;

    fn choose(&mut self, board: &Board, state: &RevealState, rng: &mut GameRng) -> Result<Choice>;
}

/// Uniform pick among hidden cells.
///
/// No hidden cell while the episode is still running means the win check and
/// the reveal state disagree.
pub fn random_hidden(state: &RevealState, rng: &mut GameRng) -> Result<Choice> {
    let hidden = state.hidden_cells();
    rng.choose(&hidden)
        .map(|&c| Choice::random(c))
        .ok_or_else(|| Error::InvariantViolation("no hidden cell left to probe".into()))
}

/// Deduction-only play: guesses are uniformly random.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomGuess;

impl GuessPolicy for RandomGuess {
    fn name(&self) -> &'static str {
        "logic"
    }

    fn choose(&mut self, _board: &Board, state: &RevealState, rng: &mut GameRng) -> Result<Choice> {
        random_hidden(state, rng)
    }
}

/// Greedy play: always the first lowest-probability cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowestProbability;

impl LowestProbability {
    pub fn choose_from(map: &ProbabilityMap) -> Option<Choice> {
        let at = Tiers::from_map(map).first_lowest?;
        Some(Choice {
            at,
            probability: map.get(at),
            rank: Some(Rank::FirstLowest),
            oracle_queries: 0,
        })
    }
}

impl GuessPolicy for LowestProbability {
    fn name(&self) -> &'static str {
        "probability"
    }

    fn choose(&mut self, board: &Board, state: &RevealState, rng: &mut GameRng) -> Result<Choice> {
        let map = estimate(board, state);
        match Self::choose_from(&map) {
            Some(choice) => Ok(choice),
            None => random_hidden(state, rng),
        }
    }
}

/// Greedy play with an oracle allowed to veto candidates.
pub struct OracleGuided {
    oracle: Box<dyn Oracle>,
}

impl OracleGuided {
    pub fn new(oracle: Box<dyn Oracle>) -> Self {
        Self { oracle }
    }
}

/// Ask `oracle` about each tier in turn and take the first accepted cell.
///
/// When every candidate is rejected, or the oracle cannot answer, the
/// first-lowest cell is taken without another query.
pub fn run_cascade<F>(
    tiers: &Tiers,
    map: &ProbabilityMap,
    oracle: &mut dyn Oracle,
    mut features: F,
) -> Option<Choice>
where
    F: FnMut(Coord, f64) -> Features,
{
    let first = tiers.first_lowest?;
    let mut queries = 0;

    for (rank, at) in tiers.escalation() {
        let probability = map.get(at).unwrap_or(0.0);
        queries += 1;
        match oracle.predict(&features(at, probability)) {
            Some(false) => {
                return Some(Choice {
                    at,
                    probability: Some(probability),
                    rank: Some(rank),
                    oracle_queries: queries,
                });
            }
            Some(true) => {
                tracing::debug!(?rank, cell = %at, probability, "oracle rejected candidate");
            }
            None => {
                tracing::warn!("oracle unavailable, falling back to the lowest-probability cell");
                break;
            }
        }
    }

    Some(Choice {
        at: first,
        probability: map.get(first),
        rank: Some(Rank::FirstLowest),
        oracle_queries: queries,
    })
}

impl GuessPolicy for OracleGuided {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn choose(&mut self, board: &Board, state: &RevealState, rng: &mut GameRng) -> Result<Choice> {
        let map = estimate(board, state);
        let tiers = Tiers::from_map(&map);
        let choice = run_cascade(&tiers, &map, self.oracle.as_mut(), |at, p| {
            Features::new(board, state, at, p)
        });
        match choice {
            Some(choice) => Ok(choice),
            None => random_hidden(state, rng),
        }
    }
}

/// Player skill level, selecting the guess policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skill {
    /// Deduction, then random guesses.
    Logic,
    /// Deduction, then the lowest-probability cell.
    #[default]
    Probability,
    /// Deduction, then the oracle-vetted cascade.
    Oracle,
}

impl Skill {
    /// Build the guess policy for this skill.
    ///
    /// `Oracle` without an oracle degrades to `Probability`.
    pub fn policy(self, oracle: Option<Box<dyn Oracle>>) -> Box<dyn GuessPolicy> {
        match (self, oracle) {
            (Skill::Logic, _) => Box::new(RandomGuess),
            (Skill::Probability, _) => Box::new(LowestProbability),
            (Skill::Oracle, Some(oracle)) => Box::new(OracleGuided::new(oracle)),
            (Skill::Oracle, None) => {
                tracing::warn!("oracle skill requested without an oracle, using probability play");
                Box::new(LowestProbability)
            }
        }
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "logic" | "l" => Ok(Skill::Logic),
            "probability" | "p" => Ok(Skill::Probability),
            "oracle" | "n" => Ok(Skill::Oracle),
            other => Err(format!(
                "unknown skill '{}' (expected 'logic', 'probability' or 'oracle')",
                other
            )),
        }
    }
}
