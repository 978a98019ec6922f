// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Event-Class Rate Model

use crate::config::SimConfig;

/// Normalized event-class probabilities plus the total instantaneous rate
/// used to sample the step duration. Recomputed after every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRates {
    pub prob_add: f64,
    pub prob_follow: f64,
    pub prob_tweet: f64,
    pub prob_retweet: f64,
    pub total_rate: f64,
}

/// Derive the four event-class rates from the current population.
///
/// Creation runs at the flat configured rate while room remains; follow,
/// tweet and retweet activity scale with the population.
pub fn compute_event_rates(config: &SimConfig, n_entities: usize) -> EventRates {
    let n = n_entities as f64;
    let r_add = if n_entities < config.max_entities {
        config.rate_add
    } else {
        0.0
    };
    let r_follow = config.rate_follow * n;
    let r_tweet = config.rate_tweet * n;
    let r_retweet = config.rate_retweet * n;

    let total = r_add + r_follow + r_tweet + r_retweet;
    if total <= 0.0 {
        return EventRates::default();
    }
    EventRates {
        prob_add: r_add / total,
        prob_follow: r_follow / total,
        prob_tweet: r_tweet / total,
        prob_retweet: r_retweet / total,
        total_rate: total,
    }
}
