// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Time-Dependent Tweet Observation

use crate::cat_tree::{BinClassifier, Layer, NodeCore, Pick, RankTree};
use crate::config::TweetObs;
use crate::rng::SimRng;
use crate::types::Elem;

/// A unit of content living in the observation tree. The stored bin always
/// equals the bin the tweet resides in, except inside the brief window of a
/// promotion during a draw.
#[derive(Debug, Clone)]
pub struct Tweet {
    pub id: Elem,
    pub tweeter: Elem,
    pub creation_time: f64,
    pub age_bin: usize,
    /// Time at which this tweet must move to the next age bin.
    pub next_rebin_time: f64,
}

/// Bins tweets by their stored age bin; each bin's rate is the configured
/// observation probability density for that age.
#[derive(Clone, Copy)]
pub struct ObservationClassifier<'a> {
    pub obs: &'a TweetObs,
}

impl<'a> BinClassifier<[Tweet]> for ObservationClassifier<'a> {
    type Down = f64;

    fn classify(&self, tweets: &[Tweet], elem: Elem) -> usize {
        tweets[elem as usize].age_bin
    }

    fn descend(&self, _tweets: &[Tweet], bin: usize) -> f64 {
        self.obs.values[bin]
    }

    fn n_bins(&self) -> usize {
        self.obs.values.len()
    }
}

/// Arena of all tweets ever created plus the age-binned observation tree
/// over the ones still observable.
///
/// Rebinning is lazy: a tweet's age is only examined when a weighted draw
/// touches it. A stale candidate is pulled from its bin, promoted with a
/// refreshed rebin time, or evicted once past the last bin; the draw then
/// retries.
#[derive(Debug, Default)]
pub struct TweetBank {
    tweets: Vec<Tweet>,
    tree: RankTree,
}

impl TweetBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tweets still observable (present in some age bin).
    pub fn n_observable(&self) -> usize {
        self.tree.len()
    }

    /// Tweets ever created.
    pub fn n_total(&self) -> usize {
        self.tweets.len()
    }

    /// Total observation rate over all observable tweets.
    pub fn total_rate(&self) -> f64 {
        self.tree.total_rate()
    }

    pub fn tweet(&self, id: Elem) -> &Tweet {
        &self.tweets[id as usize]
    }

    pub fn tree(&self) -> &RankTree {
        &self.tree
    }

    /// Create a tweet at age bin 0.
    pub fn insert(&mut self, obs: &TweetObs, tweeter: Elem, now: f64) -> Elem {
        let id = self.tweets.len() as Elem;
        self.tweets.push(Tweet {
            id,
            tweeter,
            creation_time: now,
            age_bin: 0,
            next_rebin_time: now + obs.threshold(0),
        });
        let Self { tweets, tree } = self;
        tree.add(&tweets[..], &ObservationClassifier { obs }, id);
        id
    }

    /// Weighted draw of the tweet observed at `now`.
    ///
    /// Candidates past their rebin time are promoted or evicted on the spot
    /// and the draw retried, so the returned tweet is always current. Fails
    /// when no observable tweet remains.
    pub fn pick_observed(&mut self, obs: &TweetObs, now: f64, rng: &mut SimRng) -> Option<Elem> {
        let cls = ObservationClassifier { obs };
        loop {
            let id = self.tree.pick_weighted(rng)?;
            let idx = id as usize;
            if now <= self.tweets[idx].next_rebin_time {
                return Some(id);
            }
            // Stale candidate: pull it out of its bin first, while the
            // stored bin still matches its position.
            {
                let Self { tweets, tree } = self;
                tree.remove(&tweets[..], &cls, id);
            }
            let n_bins = obs.n_bins();
            let tweet = &mut self.tweets[idx];
            tweet.age_bin += 1;
            if tweet.age_bin < n_bins {
                tweet.next_rebin_time = tweet.creation_time + obs.threshold(tweet.age_bin);
                let Self { tweets, tree } = self;
                tree.add(&tweets[..], &cls, id);
            }
            // Evicted or rebinned either way; reject and retry.
        }
    }

    /// Recompute the tree's cached totals; needed if observation densities
    /// change under it.
    pub fn recalc_rates(&mut self, obs: &TweetObs) {
        let Self { tweets, tree } = self;
        tree.recalc_rates(&tweets[..], &ObservationClassifier { obs });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> TweetObs {
        TweetObs {
            initial_resolution: 10.0,
            values: vec![1.0, 0.5, 0.25],
        }
    }

    #[test]
    fn test_insert_lands_in_first_bin() {
        let obs = obs();
        let mut bank = TweetBank::new();
        let id = bank.insert(&obs, 3, 5.0);
        assert_eq!(bank.n_observable(), 1);
        let t = bank.tweet(id);
        assert_eq!(t.age_bin, 0);
        assert_eq!(t.next_rebin_time, 15.0);
        assert!((bank.total_rate() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fresh_tweet_survives_draw() {
        let obs = obs();
        let mut bank = TweetBank::new();
        let id = bank.insert(&obs, 3, 0.0);
        let mut rng = SimRng::from_seed(1);
        assert_eq!(bank.pick_observed(&obs, 5.0, &mut rng), Some(id));
        assert_eq!(bank.tweet(id).age_bin, 0);
    }

    #[test]
    fn test_stale_tweet_is_promoted_during_draw() {
        let obs = obs();
        let mut bank = TweetBank::new();
        let id = bank.insert(&obs, 3, 0.0);
        let mut rng = SimRng::from_seed(1);
        // Age 12 is past the first threshold (10) but inside the second (20).
        assert_eq!(bank.pick_observed(&obs, 12.0, &mut rng), Some(id));
        let t = bank.tweet(id);
        assert_eq!(t.age_bin, 1);
        assert_eq!(t.next_rebin_time, 20.0);
        assert!((bank.total_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ancient_tweet_is_evicted() {
        let obs = obs();
        let mut bank = TweetBank::new();
        bank.insert(&obs, 3, 0.0);
        let mut rng = SimRng::from_seed(1);
        // Past every threshold: promoted through all bins, then evicted.
        assert_eq!(bank.pick_observed(&obs, 1000.0, &mut rng), None);
        assert_eq!(bank.n_observable(), 0);
        assert_eq!(bank.n_total(), 1);
        assert!(bank.total_rate().abs() < 1e-12);
    }

    #[test]
    fn test_draw_skips_stale_and_returns_fresh() {
        let obs = obs();
        let mut bank = TweetBank::new();
        let old = bank.insert(&obs, 1, 0.0);
        let fresh = bank.insert(&obs, 2, 28.0);
        let mut rng = SimRng::from_seed(2);
        // At t=31 the old tweet (age 31) is past the last bin; only the
        // fresh one can come back, and touching the old one evicts it.
        for _ in 0..50 {
            assert_eq!(bank.pick_observed(&obs, 31.0, &mut rng), Some(fresh));
        }
        assert_eq!(bank.n_observable(), 1);
        let _ = old;
    }

    #[test]
    fn test_tree_totals_stay_consistent() {
        let obs = obs();
        let mut bank = TweetBank::new();
        for i in 0..10 {
            bank.insert(&obs, i, i as f64);
        }
        let mut rng = SimRng::from_seed(3);
        let _ = bank.pick_observed(&obs, 25.0, &mut rng);
        assert!(bank.tree().aggregate_rate_error() < 1e-9);
        assert!(bank.tree().aggregate_count_consistent());
    }
}
