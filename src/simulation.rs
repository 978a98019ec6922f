// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Simulation Core

use tracing::warn;

use crate::cancel;
use crate::cat_tree::{Layer, NodeCore, Pick, RankTree};
use crate::classify::{RankAttr, RankClassifier, N_IDEOLOGIES};
use crate::config::{ConfigError, SimConfig};
use crate::follow::find_follow_target;
use crate::network::Network;
use crate::rates::{compute_event_rates, EventRates};
use crate::rng::SimRng;
use crate::summary::SummaryRouter;
use crate::tweets::TweetBank;
use crate::types::{
    Elem, EntityTypeState, Retweet, SimStats, SummaryRow, NO_ELEM, RETWEET_WINDOW, TIME_CAT_FREQ,
    ZEROTOL,
};

// ─── AgoraSimulation ─────────────────────────────────────────────────────────

/// The engine: owns every piece of simulation state and advances it one
/// kinetic Monte Carlo step at a time. Strictly single-threaded; a step
/// never observes partially applied state from the same step.
pub struct AgoraSimulation {
    config: SimConfig,
    rng: SimRng,
    network: Network,

    // Rank categorizations of the population.
    tweet_ranks: RankTree,
    follow_ranks: RankTree,
    retweet_ranks: RankTree,

    // Age-binned tweet observation.
    tweet_bank: TweetBank,

    entity_types: Vec<EntityTypeState>,
    /// Per-type engagement weights, indexed by entity type.
    pref_rates: Vec<f64>,

    rates: EventRates,
    stats: SimStats,
    time: f64,

    /// Population size at each TIME_CAT_FREQ crossing, for age analysis.
    population_milestones: Vec<usize>,

    summary: SummaryRouter,
}

impl AgoraSimulation {
    /// Validate the configuration, build the initial population, and prime
    /// the rate model.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let entity_types: Vec<EntityTypeState> = config
            .entity_types
            .iter()
            .map(|t| EntityTypeState {
                name: t.name.clone(),
                prob_add: t.prob_add,
                prob_follow: t.prob_follow,
                members: Vec::new(),
            })
            .collect();
        let pref_rates: Vec<f64> = config.entity_types.iter().map(|t| t.prob_follow).collect();
        let network = Network::preallocate(
            config.max_entities,
            config.follow_slot_capacity,
            config.n_languages,
            config.entity_types.len(),
        );

        let mut sim = Self {
            rng: SimRng::from_seed(seed),
            network,
            tweet_ranks: RankTree::default(),
            follow_ranks: RankTree::default(),
            retweet_ranks: RankTree::default(),
            tweet_bank: TweetBank::new(),
            entity_types,
            pref_rates,
            rates: EventRates::default(),
            stats: SimStats::default(),
            time: 0.0,
            population_milestones: Vec::new(),
            summary: SummaryRouter::disabled(),
            config,
        };

        for _ in 0..sim.config.initial_entities {
            sim.create_entity_at(0.0);
        }
        sim.refresh_rates();
        Ok(sim)
    }

    /// Route summary rows to the given sinks.
    pub fn with_summary(mut self, summary: SummaryRouter) -> Self {
        self.summary = summary;
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn n_entities(&self) -> usize {
        self.network.n_entities()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn entity_types(&self) -> &[EntityTypeState] {
        &self.entity_types
    }

    pub fn tweet_bank(&self) -> &TweetBank {
        &self.tweet_bank
    }

    pub fn follow_ranks(&self) -> &RankTree {
        &self.follow_ranks
    }

    pub fn population_milestones(&self) -> &[usize] {
        &self.population_milestones
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    /// Create an entity at the next free slot, stamped with the current
    /// simulation time.
    pub fn create_entity(&mut self) -> Elem {
        let now = self.time;
        self.create_entity_at(now)
    }

    fn create_entity_at(&mut self, creation_time: f64) -> Elem {
        debug_assert!(!self.network.is_full(), "create past the population ceiling");

        // Pick the class by its cumulative share of create events.
        let mut rand_num = self.rng.uniform_real();
        let mut etype = self.entity_types.len() - 1;
        for (i, et) in self.entity_types.iter().enumerate() {
            if rand_num <= et.prob_add {
                etype = i;
                break;
            }
            rand_num -= et.prob_add;
        }

        let language = self.rng.uniform_int(self.config.n_languages) as u8;
        let ideology = self.rng.uniform_int(N_IDEOLOGIES) as u8;
        let id = self
            .network
            .create_entity(creation_time, etype, language, ideology);
        self.entity_types[etype].members.push(id);

        // Enter every rank categorization at the zero-attribute bin.
        let cls = RankClassifier::new(RankAttr::Followers, &self.config.follow_ranks);
        self.follow_ranks.add(&self.network, &cls, id);
        let cls = RankClassifier::new(RankAttr::Tweets, &self.config.tweet_ranks);
        self.tweet_ranks.add(&self.network, &cls, id);
        let cls = RankClassifier::new(RankAttr::Retweets, &self.config.retweet_ranks);
        self.retweet_ranks.add(&self.network, &cls, id);

        if self.config.use_barabasi {
            // Preferential-attachment seed: the newborn follows itself.
            self.follow(id, id);
        }
        id
    }

    /// Record `actor` following `target` and re-categorize the target by
    /// its new follower count. Returns whether the edge was recorded.
    pub fn follow(&mut self, actor: Elem, target: Elem) -> bool {
        let cls = RankClassifier::new(RankAttr::Followers, &self.config.follow_ranks);
        // Remove under the old follower count, mutate, re-add: the
        // classifier descend then always finds the element's actual bin.
        self.follow_ranks.remove(&self.network, &cls, target);
        let added = self.network.record_follow(actor, target, &self.pref_rates);
        self.follow_ranks.add(&self.network, &cls, target);
        if added {
            self.stats.n_follows += 1;
        }
        added
    }

    /// The entity tweets: bump its count, re-categorize, and enter the
    /// tweet into the observation tree at age bin 0.
    pub fn tweet(&mut self, entity: Elem) {
        let cls = RankClassifier::new(RankAttr::Tweets, &self.config.tweet_ranks);
        self.tweet_ranks.remove(&self.network, &cls, entity);
        self.network.entity_mut(entity).n_tweets += 1;
        self.tweet_ranks.add(&self.network, &cls, entity);
        self.tweet_bank
            .insert(&self.config.tweet_obs, entity, self.time);
        self.stats.n_tweets += 1;
    }

    /// The entity retweets: half the time a random followee, otherwise its
    /// freshest witnessed retweet when still inside the 48-hour window. On
    /// success the record propagates to every follower's ring.
    pub fn retweet(&mut self, entity: Elem) -> bool {
        let now = self.time;
        let mut origin = NO_ELEM;
        let rand_num = self.rng.uniform_real();
        if rand_num < 0.5 {
            let n_following = self.network.n_following(entity);
            if n_following != 0 {
                let k = self.rng.uniform_int(n_following);
                origin = self.network.follow_i(entity, k);
            }
        } else if let Some(recent) = self.network.entity(entity).retweets.most_recent() {
            if now - recent.time < RETWEET_WINDOW {
                origin = recent.original_tweeter;
            }
        }
        if origin == NO_ELEM {
            return false;
        }

        let record = Retweet {
            original_tweeter: origin,
            time: now,
        };
        let n_followers = self.network.n_followers(entity);
        for k in 0..n_followers {
            let follower = self.network.follower_i(entity, k);
            self.network.entity_mut(follower).retweets.add(record);
        }

        let cls = RankClassifier::new(RankAttr::Retweets, &self.config.retweet_ranks);
        self.retweet_ranks.remove(&self.network, &cls, entity);
        self.network.entity_mut(entity).n_retweets += 1;
        self.retweet_ranks.add(&self.network, &cls, entity);
        self.stats.n_retweets += 1;
        true
    }

    // ─── Event dispatch ──────────────────────────────────────────────────

    fn action_create(&mut self) {
        if self.network.is_full() {
            return;
        }
        let now = self.time;
        self.create_entity_at(now);
    }

    fn action_follow(&mut self) {
        let Some(actor) = self.follow_ranks.pick_uniform(&mut self.rng) else {
            return;
        };
        let target = find_follow_target(
            &self.config,
            &self.network,
            &self.follow_ranks,
            &self.entity_types,
            &mut self.rng,
            actor,
            self.time,
        );
        if target == NO_ELEM || target == actor {
            return;
        }
        self.follow(actor, target);
    }

    fn action_tweet(&mut self) {
        // Weighted by tweet-rank bin rates; uniform when the tree carries
        // no rate.
        let tweeter = if self.tweet_ranks.total_rate() > 0.0 {
            self.tweet_ranks.pick_weighted(&mut self.rng)
        } else {
            self.tweet_ranks.pick_uniform(&mut self.rng)
        };
        if let Some(entity) = tweeter {
            self.tweet(entity);
        }
    }

    fn action_retweet(&mut self) {
        // The observed tweet comes from the age-weighted observation tree
        // (stale candidates rebin lazily inside the draw); the reacting
        // entity from the tweeter's audience.
        let Some(tweet_id) =
            self.tweet_bank
                .pick_observed(&self.config.tweet_obs, self.time, &mut self.rng)
        else {
            return;
        };
        let tweeter = self.tweet_bank.tweet(tweet_id).tweeter;
        let Some(reactor) = self.network.audience(tweeter).pick_weighted(&mut self.rng) else {
            return;
        };
        self.retweet(reactor);
    }

    // ─── Step loop ───────────────────────────────────────────────────────

    /// One KMC step: draw the event class, dispatch, advance time, refresh
    /// the rate model.
    pub fn step_core(&mut self) {
        let u = self.rng.uniform_real();
        let p = self.rates;
        if u - p.prob_add <= ZEROTOL {
            self.action_create();
        } else if u - (p.prob_add + p.prob_follow) <= ZEROTOL {
            self.action_follow();
        } else if u - (p.prob_add + p.prob_follow + p.prob_tweet) <= ZEROTOL {
            self.action_tweet();
        } else if u - (p.prob_add + p.prob_follow + p.prob_tweet + p.prob_retweet) <= ZEROTOL {
            self.action_retweet();
        } else {
            // Cumulative thresholds exhausted by round-off; report and keep
            // going.
            warn!("event draw {} fell outside every class threshold", u);
        }

        self.step_time();
        self.stats.n_steps += 1;
        self.refresh_rates();

        #[cfg(debug_assertions)]
        if self.stats.n_steps % 1000 == 0 {
            self.debug_audit();
        }
    }

    fn step_time(&mut self) {
        let prev_milestone = (self.time / TIME_CAT_FREQ).floor();
        let prev_integer = self.time.floor();
        if self.config.use_random_increment {
            self.time += -self.rng.uniform_real().ln() / self.stats.event_rate;
        } else {
            self.time += 1.0 / self.stats.event_rate;
        }

        if (self.time / TIME_CAT_FREQ).floor() > prev_milestone {
            self.population_milestones.push(self.network.n_entities());
        }

        if self.config.output_stdout_summary && self.time.floor() > prev_integer {
            self.emit_summary();
        }
    }

    fn emit_summary(&mut self) {
        let row = SummaryRow {
            time: self.time,
            n_entities: self.network.n_entities(),
            n_follows: self.stats.n_follows,
            n_tweets: self.stats.n_tweets,
            n_retweets: self.stats.n_retweets,
        };
        if let Err(err) = self.summary.record(&row) {
            warn!("summary sink write failed: {}", err);
        }
    }

    fn refresh_rates(&mut self) {
        self.rates = compute_event_rates(&self.config, self.network.n_entities());
        self.stats.event_rate = self.rates.total_rate;
    }

    /// Run until the time bound, the population ceiling, or a cancellation
    /// request. Returns the final simulated time.
    pub fn run(&mut self) -> f64 {
        while self.time < self.config.max_time
            && self.network.n_entities() < self.config.max_entities
            && !cancel::cancel_requested()
        {
            if self.rates.total_rate <= 0.0 {
                break;
            }
            self.step_core();
        }
        self.time
    }

    #[cfg(debug_assertions)]
    fn debug_audit(&self) {
        use crate::audit::RateAudit;

        self.network.sanity_check();
        let mut audit = RateAudit::default();
        debug_assert!(audit.check_tree(&self.follow_ranks).balanced);
        debug_assert!(audit.check_tree(&self.tweet_ranks).balanced);
        debug_assert!(audit.check_tree(&self.retweet_ranks).balanced);
        debug_assert!(audit.check_tree(self.tweet_bank.tree()).balanced);
        let members: usize = self.entity_types.iter().map(|t| t.members.len()).sum();
        debug_assert_eq!(members, self.network.n_entities());
        debug_assert_eq!(self.follow_ranks.len(), self.network.n_entities());
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
