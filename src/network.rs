// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Network State

use crate::cat_tree::{Layer, NodeCore};
use crate::classify::{AudienceCtx, AudienceTree, LanguageLayer};
use crate::mem_pool::{MemPool, PoolSlot};
use crate::types::{Elem, RetweetRing};

/// One simulated entity. Entities are created at dense indices and never
/// destroyed; only their counters and edge lists evolve.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub creation_time: f64,
    pub etype: usize,
    pub language: u8,
    pub ideology: u8,
    pub n_tweets: u64,
    pub n_retweets: u64,
    /// Entities this one follows (pool-backed, append-only).
    pub follow_set: PoolSlot,
    /// Entities following this one (pool-backed, append-only).
    pub follower_set: PoolSlot,
    /// Recently witnessed retweets.
    pub retweets: RetweetRing,
}

/// The full simulated population: a flat entity array, the shared edge-list
/// pool, and one categorized audience tree per entity (followers binned by
/// language, ideology distance, and type preference).
#[derive(Debug)]
pub struct Network {
    entities: Vec<Entity>,
    audiences: Vec<AudienceTree>,
    pool: MemPool,
    max_entities: usize,
    n_languages: usize,
    n_types: usize,
}

impl Network {
    pub fn preallocate(
        max_entities: usize,
        slot_capacity: usize,
        n_languages: usize,
        n_types: usize,
    ) -> Self {
        Self {
            entities: Vec::with_capacity(max_entities),
            audiences: Vec::with_capacity(max_entities),
            // One follow slot and one follower slot per entity.
            pool: MemPool::preallocate(2 * max_entities, slot_capacity),
            max_entities,
            n_languages,
            n_types,
        }
    }

    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn max_entities(&self) -> usize {
        self.max_entities
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.max_entities
    }

    pub fn entity(&self, id: Elem) -> &Entity {
        &self.entities[id as usize]
    }

    pub fn entity_mut(&mut self, id: Elem) -> &mut Entity {
        &mut self.entities[id as usize]
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Occupy the next entity slot. The caller categorizes the new entity
    /// and maintains the per-type member lists.
    pub fn create_entity(
        &mut self,
        creation_time: f64,
        etype: usize,
        language: u8,
        ideology: u8,
    ) -> Elem {
        debug_assert!(!self.is_full(), "population ceiling exceeded");
        let follow_set = self.pool.alloc_slot();
        let follower_set = self.pool.alloc_slot();
        self.entities.push(Entity {
            creation_time,
            etype,
            language,
            ideology,
            n_tweets: 0,
            n_retweets: 0,
            follow_set,
            follower_set,
            retweets: RetweetRing::default(),
        });
        self.audiences.push(AudienceTree::default());
        (self.entities.len() - 1) as Elem
    }

    pub fn n_following(&self, id: Elem) -> usize {
        self.entities[id as usize].follow_set.len()
    }

    pub fn n_followers(&self, id: Elem) -> usize {
        self.entities[id as usize].follower_set.len()
    }

    /// The k-th entity this one follows.
    pub fn follow_i(&self, id: Elem, k: usize) -> Elem {
        self.pool.get(&self.entities[id as usize].follow_set, k)
    }

    /// The k-th follower of this entity.
    pub fn follower_i(&self, id: Elem, k: usize) -> Elem {
        self.pool.get(&self.entities[id as usize].follower_set, k)
    }

    pub fn audience(&self, id: Elem) -> &AudienceTree {
        &self.audiences[id as usize]
    }

    /// Record `actor` following `target`: append to the actor's follow list
    /// and the target's follower list, then insert the actor into the
    /// target's categorized audience. Either edge list being full reports
    /// failure and the follow is not counted.
    ///
    /// Capacity is checked on both slots before either is touched; the pool
    /// supports no deletion, so a half-recorded edge could never be undone.
    pub fn record_follow(&mut self, actor: Elem, target: Elem, pref_rates: &[f64]) -> bool {
        if self.entities[actor as usize].follow_set.is_full()
            || self.entities[target as usize].follower_set.is_full()
        {
            return false;
        }
        self.pool
            .add_if_possible(&mut self.entities[actor as usize].follow_set, target);
        self.pool
            .add_if_possible(&mut self.entities[target as usize].follower_set, actor);
        let cls = LanguageLayer {
            owner_ideology: self.entities[target as usize].ideology,
            n_languages: self.n_languages,
            n_types: self.n_types,
        };
        let ctx = AudienceCtx {
            entities: &self.entities,
            pref_rates,
        };
        self.audiences[target as usize].add(&ctx, &cls, actor);
        true
    }

    /// Debug-build structural invariants. Compiles to nothing in release.
    pub fn sanity_check(&self) {
        #[cfg(debug_assertions)]
        {
            assert!(self.entities.len() <= self.max_entities);
            assert_eq!(self.entities.len(), self.audiences.len());
            for (i, e) in self.entities.iter().enumerate() {
                assert!(e.etype < self.n_types, "entity {} has unknown type", i);
                assert!(
                    (e.language as usize) < self.n_languages,
                    "entity {} has unknown language",
                    i
                );
                // Repeat follows keep the pool list longer than the audience set.
                assert!(
                    self.audiences[i].len() <= e.follower_set.len(),
                    "audience of {} larger than its follower list",
                    i
                );
                for k in 0..e.follow_set.len() {
                    let t = self.pool.get(&e.follow_set, k);
                    assert!(
                        t >= 0 && (t as usize) < self.entities.len(),
                        "dangling followee {} on entity {}",
                        t,
                        i
                    );
                    // Reciprocity: every recorded followee must list us back.
                    let followers = self.pool.entries(&self.entities[t as usize].follower_set);
                    assert!(
                        followers.contains(&(i as Elem)),
                        "entity {} follows {} without a reciprocal follower entry",
                        i,
                        t
                    );
                }
            }
        }
    }
}
