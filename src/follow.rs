// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Follow-Target Selection

use crate::cat_tree::RankTree;
use crate::config::SimConfig;
use crate::network::Network;
use crate::rng::SimRng;
use crate::types::{Elem, EntityTypeState, FollowModel, NO_ELEM, RETWEET_WINDOW, ZEROTOL};

/// Choose whom a follow event targets, per the configured model.
///
/// Returns `NO_ELEM` when the model yields no target this step; the caller
/// skips the event. Self-targets are the caller's concern.
pub fn find_follow_target(
    config: &SimConfig,
    network: &Network,
    follow_ranks: &RankTree,
    entity_types: &[EntityTypeState],
    rng: &mut SimRng,
    actor: Elem,
    now: f64,
) -> Elem {
    match config.follow_model {
        FollowModel::Random => rng.uniform_int(network.n_entities()) as Elem,
        FollowModel::Preferential => preferential_target(config, follow_ranks, rng),
        FollowModel::Entity => entity_type_target(entity_types, rng),
        FollowModel::Retweet => retweet_target(network, rng, actor, now),
    }
}

/// Weight each follower-rank bin by rate × population, normalize, then walk
/// the cumulative sum. The walk subtracts the bin probability in the same
/// pass that compares against it and keeps scanning past empty bins.
fn preferential_target(config: &SimConfig, follow_ranks: &RankTree, rng: &mut SimRng) -> Elem {
    let spec = &config.follow_ranks;
    let mut weights = vec![0.0; spec.len()];
    let mut sum_of_weights = 0.0;
    for (i, bin) in spec.iter().enumerate() {
        weights[i] = bin.rate * follow_ranks.bin_len(i) as f64;
        sum_of_weights += weights[i];
    }
    if sum_of_weights <= 0.0 {
        return NO_ELEM;
    }
    for w in weights.iter_mut() {
        *w /= sum_of_weights;
    }

    let mut rand_num = rng.uniform_real();
    for (i, w) in weights.iter().enumerate() {
        if rand_num - w <= ZEROTOL {
            if follow_ranks.bin_len(i) != 0 {
                if let Some(target) = follow_ranks.bin_pick(i, rng) {
                    return target;
                }
            }
        }
        rand_num -= w;
    }
    NO_ELEM
}

/// Walk the cumulative per-type follow probabilities; empty member lists
/// fall through to the next type.
fn entity_type_target(entity_types: &[EntityTypeState], rng: &mut SimRng) -> Elem {
    let mut rand_num = rng.uniform_real();
    for et in entity_types {
        if rand_num <= et.prob_follow {
            if !et.members.is_empty() {
                return et.members[rng.uniform_int(et.members.len())];
            }
        }
        rand_num -= et.prob_follow;
    }
    NO_ELEM
}

/// Half the time follow the original tweeter of the actor's freshest
/// witnessed retweet (when inside the freshness window), otherwise anyone.
fn retweet_target(network: &Network, rng: &mut SimRng, actor: Elem, now: f64) -> Elem {
    let rand_num = rng.uniform_real();
    if rand_num > 0.5 {
        if let Some(retweet) = network.entity(actor).retweets.most_recent() {
            if now - retweet.time < RETWEET_WINDOW {
                return retweet.original_tweeter;
            }
        }
        NO_ELEM
    } else {
        rng.uniform_int(network.n_entities()) as Elem
    }
}
