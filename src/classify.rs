// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Classifiers

use crate::cat_tree::{BinClassifier, LeafNode, TreeNode};
use crate::config::RankBinSpec;
use crate::network::{Entity, Network};
use crate::types::Elem;

/// Ideology classes an entity can be created with. Audience distance is the
/// absolute class difference, so distance bins span [0, N_IDEOLOGIES).
pub const N_IDEOLOGIES: usize = 4;

// ─── Rank classifier ─────────────────────────────────────────────────────────

/// Which monotone attribute a rank categorization bins on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankAttr {
    Followers,
    Tweets,
    Retweets,
}

/// Bins entities by a monotone attribute against an ordered threshold list;
/// each bin carries the configured rate.
#[derive(Debug, Clone, Copy)]
pub struct RankClassifier<'a> {
    attr: RankAttr,
    bins: &'a [RankBinSpec],
}

impl<'a> RankClassifier<'a> {
    pub fn new(attr: RankAttr, bins: &'a [RankBinSpec]) -> Self {
        debug_assert!(!bins.is_empty(), "rank specification must be non-empty");
        Self { attr, bins }
    }
}

/// First bin whose threshold admits `value`; values beyond every threshold
/// land in the last bin.
fn rank_bin(bins: &[RankBinSpec], value: f64) -> usize {
    bins.iter()
        .position(|b| value <= b.threshold)
        .unwrap_or(bins.len() - 1)
}

impl<'a> BinClassifier<Network> for RankClassifier<'a> {
    type Down = f64;

    fn classify(&self, network: &Network, elem: Elem) -> usize {
        let value = match self.attr {
            RankAttr::Followers => network.n_followers(elem) as f64,
            RankAttr::Tweets => network.entity(elem).n_tweets as f64,
            RankAttr::Retweets => network.entity(elem).n_retweets as f64,
        };
        rank_bin(self.bins, value)
    }

    fn descend(&self, _network: &Network, bin: usize) -> f64 {
        self.bins[bin].rate
    }

    fn n_bins(&self) -> usize {
        self.bins.len()
    }
}

// ─── Audience classifiers ────────────────────────────────────────────────────

/// Nested categorization of an entity's followers: language, then ideology
/// distance to the owner, then entity-type preference. Leaf rates are the
/// per-type engagement weights, so weighted draws favor reactive classes.
pub type AudienceTree = TreeNode<TreeNode<TreeNode<LeafNode>>>;

/// Classification state for audience trees: the entity table plus the
/// per-type engagement rates.
#[derive(Clone, Copy)]
pub struct AudienceCtx<'a> {
    pub entities: &'a [Entity],
    pub pref_rates: &'a [f64],
}

/// Top audience level: bins followers by their own language.
#[derive(Debug, Clone, Copy)]
pub struct LanguageLayer {
    pub owner_ideology: u8,
    pub n_languages: usize,
    pub n_types: usize,
}

/// Middle audience level: bins followers by ideology distance to the owner.
#[derive(Debug, Clone, Copy)]
pub struct DistanceLayer {
    pub owner_ideology: u8,
    pub n_types: usize,
}

/// Terminal audience level: bins followers by entity type.
#[derive(Debug, Clone, Copy)]
pub struct PreferenceLayer {
    pub n_types: usize,
}

impl<'a> BinClassifier<AudienceCtx<'a>> for LanguageLayer {
    type Down = DistanceLayer;

    fn classify(&self, ctx: &AudienceCtx<'a>, elem: Elem) -> usize {
        ctx.entities[elem as usize].language as usize
    }

    fn descend(&self, _ctx: &AudienceCtx<'a>, _bin: usize) -> DistanceLayer {
        DistanceLayer {
            owner_ideology: self.owner_ideology,
            n_types: self.n_types,
        }
    }

    fn n_bins(&self) -> usize {
        self.n_languages
    }
}

impl<'a> BinClassifier<AudienceCtx<'a>> for DistanceLayer {
    type Down = PreferenceLayer;

    fn classify(&self, ctx: &AudienceCtx<'a>, elem: Elem) -> usize {
        let follower = ctx.entities[elem as usize].ideology as i32;
        (follower - self.owner_ideology as i32).unsigned_abs() as usize
    }

    fn descend(&self, _ctx: &AudienceCtx<'a>, _bin: usize) -> PreferenceLayer {
        PreferenceLayer { n_types: self.n_types }
    }

    fn n_bins(&self) -> usize {
        N_IDEOLOGIES
    }
}

impl<'a> BinClassifier<AudienceCtx<'a>> for PreferenceLayer {
    type Down = f64;

    fn classify(&self, ctx: &AudienceCtx<'a>, elem: Elem) -> usize {
        ctx.entities[elem as usize].etype
    }

    fn descend(&self, ctx: &AudienceCtx<'a>, bin: usize) -> f64 {
        ctx.pref_rates[bin]
    }

    fn n_bins(&self) -> usize {
        self.n_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat_tree::{Layer, NodeCore};
    use crate::network::Entity;

    fn spec() -> Vec<RankBinSpec> {
        vec![
            RankBinSpec { threshold: 0.0, rate: 1.0 },
            RankBinSpec { threshold: 10.0, rate: 2.0 },
            RankBinSpec { threshold: f64::INFINITY, rate: 4.0 },
        ]
    }

    #[test]
    fn test_rank_bin_thresholds() {
        let bins = spec();
        assert_eq!(rank_bin(&bins, 0.0), 0);
        assert_eq!(rank_bin(&bins, 1.0), 1);
        assert_eq!(rank_bin(&bins, 10.0), 1);
        assert_eq!(rank_bin(&bins, 11.0), 2);
        assert_eq!(rank_bin(&bins, 1e12), 2);
    }

    #[test]
    fn test_rank_bin_beyond_all_thresholds_lands_last() {
        let bins = vec![
            RankBinSpec { threshold: 1.0, rate: 1.0 },
            RankBinSpec { threshold: 2.0, rate: 2.0 },
        ];
        assert_eq!(rank_bin(&bins, 5.0), 1);
    }

    fn entity(language: u8, ideology: u8, etype: usize) -> Entity {
        Entity {
            language,
            ideology,
            etype,
            ..Entity::default()
        }
    }

    #[test]
    fn test_audience_layers_bin_by_attributes() {
        let entities = vec![
            entity(0, 1, 0),
            entity(1, 3, 1),
            entity(0, 0, 1),
        ];
        let pref_rates = vec![0.5, 2.0];
        let ctx = AudienceCtx { entities: &entities, pref_rates: &pref_rates };
        let lang = LanguageLayer { owner_ideology: 1, n_languages: 2, n_types: 2 };

        assert_eq!(lang.classify(&ctx, 0), 0);
        assert_eq!(lang.classify(&ctx, 1), 1);

        let dist = lang.descend(&ctx, 0);
        assert_eq!(dist.classify(&ctx, 0), 0);
        assert_eq!(dist.classify(&ctx, 1), 2);
        assert_eq!(dist.classify(&ctx, 2), 1);

        let pref = dist.descend(&ctx, 0);
        assert_eq!(pref.classify(&ctx, 0), 0);
        assert_eq!(pref.classify(&ctx, 2), 1);
        assert_eq!(pref.descend(&ctx, 1), 2.0);
    }

    #[test]
    fn test_audience_tree_weighted_by_type_rate() {
        let entities = vec![
            entity(0, 1, 0), // the owner
            entity(0, 1, 0), // low-engagement follower
            entity(0, 1, 1), // high-engagement follower
        ];
        let pref_rates = vec![1.0, 9.0];
        let ctx = AudienceCtx { entities: &entities, pref_rates: &pref_rates };
        let cls = LanguageLayer { owner_ideology: 1, n_languages: 1, n_types: 2 };

        let mut tree = AudienceTree::default();
        assert!(tree.add(&ctx, &cls, 1).is_some());
        assert!(tree.add(&ctx, &cls, 2).is_some());
        assert_eq!(tree.len(), 2);
        assert!((tree.total_rate() - 10.0).abs() < 1e-12);
    }
}
