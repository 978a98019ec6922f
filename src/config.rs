// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Engine Configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FollowModel;

/// Tolerance when checking that add probabilities sum to 1.
const PROB_SUM_TOLERANCE: f64 = 1e-9;

// ─── Sub-specifications ──────────────────────────────────────────────────────

/// One bin of a rank categorization: every element whose attribute is at
/// most `threshold` (and above the previous bin's) lands here with `rate`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RankBinSpec {
    pub threshold: f64,
    pub rate: f64,
}

/// An entity class: its share of create events, its engagement weight, and
/// a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeSpec {
    pub name: String,
    pub prob_add: f64,
    pub prob_follow: f64,
}

/// Tweet-observation schedule: age bins of uniform width
/// `initial_resolution`, each with its own observation probability density.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetObs {
    pub initial_resolution: f64,
    pub values: Vec<f64>,
}

impl TweetObs {
    /// Age at which a tweet in `bin` must be promoted to the next bin.
    pub fn threshold(&self, bin: usize) -> f64 {
        self.initial_resolution * (bin + 1) as f64
    }

    pub fn n_bins(&self) -> usize {
        self.values.len()
    }
}

// ─── SimConfig ───────────────────────────────────────────────────────────────

/// Immutable parameter bundle supplied by the caller. Unspecified fields
/// fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Hard ceiling on the population.
    pub max_entities: usize,
    /// Simulated-time termination bound.
    pub max_time: f64,
    /// Population created before the loop begins, all at creation time 0.
    pub initial_entities: usize,

    /// Exponential vs. deterministic time advance.
    pub use_random_increment: bool,
    /// Self-follow on creation (preferential-attachment seed).
    pub use_barabasi: bool,
    pub follow_model: FollowModel,
    pub output_stdout_summary: bool,

    /// Global event-class rates. The add rate is flat; the others scale
    /// with the population.
    pub rate_add: f64,
    pub rate_follow: f64,
    pub rate_tweet: f64,
    pub rate_retweet: f64,

    /// Language bins of the audience categorization.
    pub n_languages: usize,
    /// Per-slot capacity of the follow/follower edge lists.
    pub follow_slot_capacity: usize,

    pub entity_types: Vec<EntityTypeSpec>,
    pub tweet_ranks: Vec<RankBinSpec>,
    pub follow_ranks: Vec<RankBinSpec>,
    pub retweet_ranks: Vec<RankBinSpec>,
    pub tweet_obs: TweetObs,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_entities: 1000,
            max_time: 1000.0,
            initial_entities: 20,
            use_random_increment: true,
            use_barabasi: false,
            follow_model: FollowModel::Random,
            output_stdout_summary: false,
            rate_add: 1.0,
            rate_follow: 0.01,
            rate_tweet: 0.01,
            rate_retweet: 0.005,
            n_languages: 2,
            follow_slot_capacity: 64,
            entity_types: vec![EntityTypeSpec {
                name: "Standard".to_string(),
                prob_add: 1.0,
                prob_follow: 1.0,
            }],
            tweet_ranks: default_ranks(),
            follow_ranks: default_ranks(),
            retweet_ranks: default_ranks(),
            tweet_obs: TweetObs {
                initial_resolution: 60.0,
                values: vec![1.0, 0.5, 0.25, 0.1],
            },
        }
    }
}

fn default_ranks() -> Vec<RankBinSpec> {
    vec![
        RankBinSpec { threshold: 0.0, rate: 1.0 },
        RankBinSpec { threshold: 10.0, rate: 2.0 },
        RankBinSpec { threshold: 100.0, rate: 4.0 },
        RankBinSpec { threshold: f64::INFINITY, rate: 8.0 },
    ]
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Configuration defects detected before the loop starts. All fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("entity-type add probabilities sum to {0}, expected 1")]
    AddProbabilitySum(f64),

    #[error("no entity types configured")]
    NoEntityTypes,

    #[error("initial_entities {initial} exceeds max_entities {max}")]
    InitialExceedsMax { initial: usize, max: usize },

    #[error("{0} rank specification is empty")]
    EmptyRankSpec(&'static str),

    #[error("tweet observation values are empty")]
    EmptyObservation,

    #[error("tweet observation resolution must be positive, got {0}")]
    BadResolution(f64),

    #[error("negative {0} rate")]
    NegativeRate(&'static str),
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_types.is_empty() {
            return Err(ConfigError::NoEntityTypes);
        }
        let prob_sum: f64 = self.entity_types.iter().map(|t| t.prob_add).sum();
        if (prob_sum - 1.0).abs() > PROB_SUM_TOLERANCE {
            return Err(ConfigError::AddProbabilitySum(prob_sum));
        }
        if self.initial_entities > self.max_entities {
            return Err(ConfigError::InitialExceedsMax {
                initial: self.initial_entities,
                max: self.max_entities,
            });
        }
        for (name, spec) in [
            ("tweet_ranks", &self.tweet_ranks),
            ("follow_ranks", &self.follow_ranks),
            ("retweet_ranks", &self.retweet_ranks),
        ] {
            if spec.is_empty() {
                return Err(ConfigError::EmptyRankSpec(name));
            }
        }
        if self.tweet_obs.values.is_empty() {
            return Err(ConfigError::EmptyObservation);
        }
        if self.tweet_obs.initial_resolution <= 0.0 {
            return Err(ConfigError::BadResolution(self.tweet_obs.initial_resolution));
        }
        for (name, rate) in [
            ("add", self.rate_add),
            ("follow", self.rate_follow),
            ("tweet", self.rate_tweet),
            ("retweet", self.rate_retweet),
        ] {
            if rate < 0.0 {
                return Err(ConfigError::NegativeRate(name));
            }
        }
        Ok(())
    }
}
