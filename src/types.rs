// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Type Definitions

use serde::{Deserialize, Serialize};

/// Dense element identifier used across every categorization structure.
/// Entities and tweets are both addressed by non-negative values; -1 is the
/// conventional "no element" sentinel.
pub type Elem = i32;

pub const NO_ELEM: Elem = -1;

/// Cumulative-threshold comparison tolerance. Small enough to admit very
/// low add rates without misclassifying the draw.
pub const ZEROTOL: f64 = 1e-16;

/// Freshness window for retweet propagation: 48 hours in simulated minutes.
pub const RETWEET_WINDOW: f64 = 2880.0;

/// Population-milestone cadence: one 30-day month in simulated minutes.
pub const TIME_CAT_FREQ: f64 = 24.0 * 60.0 * 30.0;

/// Capacity of the per-entity recent-retweet ring.
pub const RETWEET_RING_CAPACITY: usize = 8;

// ─── Follow Model ────────────────────────────────────────────────────────────

/// Strategy for choosing whom a follow event targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FollowModel {
    Random = 0,
    Preferential = 1,
    Entity = 2,
    Retweet = 3,
}

impl Default for FollowModel {
    fn default() -> Self {
        FollowModel::Random
    }
}

// ─── Retweet Records ─────────────────────────────────────────────────────────

/// A witnessed retweet: who originally tweeted, and when the event happened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Retweet {
    pub original_tweeter: Elem,
    pub time: f64,
}

/// Bounded ring of recently witnessed retweets, with a cached most-recent
/// slot so freshness checks never scan the ring.
#[derive(Debug, Clone, Default)]
pub struct RetweetRing {
    slots: Vec<Retweet>,
    next: usize,
    most_recent: Option<Retweet>,
}

impl RetweetRing {
    pub fn add(&mut self, record: Retweet) {
        if self.slots.len() < RETWEET_RING_CAPACITY {
            self.slots.push(record);
        } else {
            self.slots[self.next] = record;
        }
        self.next = (self.next + 1) % RETWEET_RING_CAPACITY;
        self.most_recent = Some(record);
    }

    pub fn most_recent(&self) -> Option<&Retweet> {
        self.most_recent.as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ─── Entity Types ────────────────────────────────────────────────────────────

/// Runtime state of one configured entity class: the config-supplied
/// probabilities plus the dynamically maintained member list.
#[derive(Debug, Clone)]
pub struct EntityTypeState {
    pub name: String,
    pub prob_add: f64,
    pub prob_follow: f64,
    pub members: Vec<Elem>,
}

// ─── Simulation Statistics ───────────────────────────────────────────────────

/// Monotone event counters plus the cached total event rate of the last
/// rate-model refresh.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimStats {
    pub n_steps: u64,
    pub n_follows: u64,
    pub n_tweets: u64,
    pub n_retweets: u64,
    /// Total instantaneous rate R used to sample the step duration.
    pub event_rate: f64,
}

// ─── Summary Row ─────────────────────────────────────────────────────────────

/// One periodic snapshot handed to the summary sinks.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryRow {
    pub time: f64,
    pub n_entities: usize,
    pub n_follows: u64,
    pub n_tweets: u64,
    pub n_retweets: u64,
}
