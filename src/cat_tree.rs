// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Rate-Categorization Tree

use std::collections::HashMap;

use crate::rng::SimRng;
use crate::types::Elem;

/* The population is partitioned recursively: inner nodes split elements into
 * bins by a classifier, leaves hold an element set with one rate shared by
 * every member. Cached aggregates (total rate, element count) make both
 * uniform and rate-weighted random selection O(depth) instead of
 * O(population), which is the performance hinge of the whole engine.
 *
 * Nesting is expressed with plain generics: `TreeNode<LeafNode>` is a
 * one-level grouping, `TreeNode<TreeNode<TreeNode<LeafNode>>>` a three-level
 * one. A classifier is a cheap value type describing one level of the split;
 * its `descend` product is whatever the next level needs - a child
 * classifier for inner levels, the per-element rate for leaves.
 */

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Cached aggregate accessors shared by every tree level.
pub trait NodeCore {
    fn len(&self) -> usize;
    fn total_rate(&self) -> f64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Random element selection. Split from `Layer` so draws never need the
/// classifier state that only mutations require.
pub trait Pick: NodeCore {
    /// Uniform draw over all contained elements. Fails iff empty.
    fn pick_uniform(&self, rng: &mut SimRng) -> Option<Elem>;

    /// Draw weighted by the per-bin rates. Fails when empty or when the
    /// subtree carries no rate.
    fn pick_weighted(&self, rng: &mut SimRng) -> Option<Elem>;
}

/// One level of binning: assigns an element to a bin and produces whatever
/// guides the descent into that bin.
pub trait BinClassifier<S: ?Sized> {
    /// Child classifier for inner levels, the per-element rate for leaves.
    type Down;

    fn classify(&self, state: &S, elem: Elem) -> usize;
    fn descend(&self, state: &S, bin: usize) -> Self::Down;

    /// Upper bound on the number of bins this level may produce.
    fn n_bins(&self) -> usize;
}

/// Mutating tree operations, generic over the classification state `S` and
/// the guide `G` handed down by the parent level.
pub trait Layer<S: ?Sized, G>: NodeCore {
    /// Insert; returns the rate delta iff the element was not yet present.
    fn add(&mut self, state: &S, guide: &G, elem: Elem) -> Option<f64>;

    /// Erase; returns the (negative) rate delta iff the element was present.
    fn remove(&mut self, state: &S, guide: &G, elem: Elem) -> Option<f64>;

    /// Recompute every cached total bottom-up. Needed after classifier rates
    /// change under the tree.
    fn recalc_rates(&mut self, state: &S, guide: &G) -> f64;

    /// Move every contained element into `out`, leaving this subtree empty.
    fn drain_elems(&mut self, out: &mut Vec<Elem>);

    /// Move every contained element into `dst`, a same-level node, without
    /// reclassification.
    fn transfer_into(&mut self, state: &S, guide: &G, dst: &mut Self) {
        let mut moved = Vec::new();
        self.drain_elems(&mut moved);
        for elem in moved {
            dst.add(state, guide, elem);
        }
    }
}

// ─── RandomSet ───────────────────────────────────────────────────────────────

/// Unordered element set with O(1) insert, erase, and exact uniform draw:
/// a dense swap-remove vector plus a companion position map. No iteration
/// order leaks into draws, so runs stay reproducible.
#[derive(Debug, Clone, Default)]
pub struct RandomSet {
    elems: Vec<Elem>,
    slots: HashMap<Elem, usize>,
}

impl RandomSet {
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn contains(&self, elem: Elem) -> bool {
        self.slots.contains_key(&elem)
    }

    /// Returns true iff the element was not yet present.
    pub fn insert(&mut self, elem: Elem) -> bool {
        if self.slots.contains_key(&elem) {
            return false;
        }
        self.slots.insert(elem, self.elems.len());
        self.elems.push(elem);
        true
    }

    /// Returns true iff the element was present.
    pub fn remove(&mut self, elem: Elem) -> bool {
        let Some(slot) = self.slots.remove(&elem) else {
            return false;
        };
        self.elems.swap_remove(slot);
        if slot < self.elems.len() {
            self.slots.insert(self.elems[slot], slot);
        }
        true
    }

    pub fn pick(&self, rng: &mut SimRng) -> Option<Elem> {
        if self.elems.is_empty() {
            return None;
        }
        Some(self.elems[rng.uniform_int(self.elems.len())])
    }

    pub fn iter(&self) -> impl Iterator<Item = Elem> + '_ {
        self.elems.iter().copied()
    }

    pub fn drain_into(&mut self, out: &mut Vec<Elem>) {
        out.extend(self.elems.drain(..));
        self.slots.clear();
    }
}

// ─── LeafNode ────────────────────────────────────────────────────────────────

/// Terminal tree level: an element set whose members all carry the same
/// rate, with `total_rate = rate × |set|` kept incrementally.
#[derive(Debug, Clone, Default)]
pub struct LeafNode {
    total_rate: f64,
    elems: RandomSet,
}

impl NodeCore for LeafNode {
    fn len(&self) -> usize {
        self.elems.len()
    }

    fn total_rate(&self) -> f64 {
        self.total_rate
    }
}

impl Pick for LeafNode {
    fn pick_uniform(&self, rng: &mut SimRng) -> Option<Elem> {
        self.elems.pick(rng)
    }

    fn pick_weighted(&self, rng: &mut SimRng) -> Option<Elem> {
        // Every member shares one rate, so a weighted draw degenerates to a
        // uniform one.
        self.elems.pick(rng)
    }
}

impl<S: ?Sized> Layer<S, f64> for LeafNode {
    fn add(&mut self, _state: &S, rate: &f64, elem: Elem) -> Option<f64> {
        if !self.elems.insert(elem) {
            return None;
        }
        self.total_rate += *rate;
        Some(*rate)
    }

    fn remove(&mut self, _state: &S, rate: &f64, elem: Elem) -> Option<f64> {
        if !self.elems.remove(elem) {
            return None;
        }
        self.total_rate -= *rate;
        Some(-*rate)
    }

    fn recalc_rates(&mut self, _state: &S, rate: &f64) -> f64 {
        self.total_rate = rate * self.elems.len() as f64;
        self.total_rate
    }

    fn drain_elems(&mut self, out: &mut Vec<Elem>) {
        self.elems.drain_into(out);
        self.total_rate = 0.0;
    }
}

impl LeafNode {
    pub fn contains(&self, elem: Elem) -> bool {
        self.elems.contains(elem)
    }

    pub fn iter(&self) -> impl Iterator<Item = Elem> + '_ {
        self.elems.iter()
    }
}

// ─── TreeNode ────────────────────────────────────────────────────────────────

/// Inner tree level: an ordered list of child nodes with cached aggregates
/// `total_rate = Σ child.total_rate` and `n_elems = Σ child.n_elems`,
/// maintained on every add/remove.
#[derive(Debug, Clone, Default)]
pub struct TreeNode<Sub> {
    total_rate: f64,
    n_elems: usize,
    cats: Vec<Sub>,
}

/// One-level grouping: the shape used for every rank categorization and for
/// the age-binned observation tree.
pub type RankTree = TreeNode<LeafNode>;

impl<Sub> NodeCore for TreeNode<Sub> {
    fn len(&self) -> usize {
        self.n_elems
    }

    fn total_rate(&self) -> f64 {
        self.total_rate
    }
}

impl<Sub: NodeCore> TreeNode<Sub> {
    pub fn n_bins(&self) -> usize {
        self.cats.len()
    }

    pub fn bin(&self, bin: usize) -> Option<&Sub> {
        self.cats.get(bin)
    }

    /// Element count of `bin`; bins never touched yet count as empty.
    pub fn bin_len(&self, bin: usize) -> usize {
        self.cats.get(bin).map_or(0, |c| c.len())
    }

    pub fn bin_total_rate(&self, bin: usize) -> f64 {
        self.cats.get(bin).map_or(0.0, |c| c.total_rate())
    }

    /// Absolute difference between the cached total rate and the sum over
    /// children. Zero (to round-off) in every reachable state.
    pub fn aggregate_rate_error(&self) -> f64 {
        let sum: f64 = self.cats.iter().map(|c| c.total_rate()).sum();
        (self.total_rate - sum).abs()
    }

    /// Whether the cached element count matches the sum over children.
    pub fn aggregate_count_consistent(&self) -> bool {
        self.n_elems == self.cats.iter().map(|c| c.len()).sum::<usize>()
    }

    /// Uniform bin choice weighted by element count: subtract each bin's
    /// population from a uniform counter until it goes negative.
    fn uniform_bin(&self, rng: &mut SimRng) -> Option<usize> {
        if self.n_elems == 0 {
            return None;
        }
        let mut num = rng.uniform_int(self.n_elems) as i64;
        for (i, cat) in self.cats.iter().enumerate() {
            num -= cat.len() as i64;
            if num < 0 {
                return Some(i);
            }
        }
        debug_assert!(false, "bin populations do not add up to n_elems");
        None
    }

    /// Principal KMC choice: walk cumulative child rates left to right.
    fn weighted_bin(&self, rng: &mut SimRng) -> Option<usize> {
        if self.n_elems == 0 || self.total_rate <= 0.0 {
            return None;
        }
        let mut num = rng.uniform_real() * self.total_rate;
        for (i, cat) in self.cats.iter().enumerate() {
            num -= cat.total_rate();
            if num <= 0.0 {
                return Some(i);
            }
        }
        // Round-off exhausted the cumulative walk: take the last non-empty
        // bin.
        self.cats.iter().rposition(|c| c.len() > 0)
    }

    fn ensure_bin(&mut self, bin: usize)
    where
        Sub: Default,
    {
        if bin >= self.cats.len() {
            self.cats.resize_with(bin + 1, Sub::default);
        }
    }
}

impl<Sub: Pick> Pick for TreeNode<Sub> {
    fn pick_uniform(&self, rng: &mut SimRng) -> Option<Elem> {
        let bin = self.uniform_bin(rng)?;
        self.cats[bin].pick_uniform(rng)
    }

    fn pick_weighted(&self, rng: &mut SimRng) -> Option<Elem> {
        let bin = self.weighted_bin(rng)?;
        self.cats[bin].pick_weighted(rng)
    }
}

impl<S: ?Sized, Sub, C> Layer<S, C> for TreeNode<Sub>
where
    C: BinClassifier<S>,
    Sub: Layer<S, C::Down> + Default,
{
    fn add(&mut self, state: &S, cls: &C, elem: Elem) -> Option<f64> {
        let bin = cls.classify(state, elem);
        self.ensure_bin(bin);
        let guide = cls.descend(state, bin);
        let delta = self.cats[bin].add(state, &guide, elem)?;
        debug_assert!(delta >= 0.0, "negative rate delta on add");
        self.n_elems += 1;
        self.total_rate += delta;
        Some(delta)
    }

    fn remove(&mut self, state: &S, cls: &C, elem: Elem) -> Option<f64> {
        let bin = cls.classify(state, elem);
        if bin >= self.cats.len() {
            return None;
        }
        let guide = cls.descend(state, bin);
        let delta = self.cats[bin].remove(state, &guide, elem)?;
        debug_assert!(delta <= 0.0, "positive rate delta on remove");
        self.n_elems -= 1;
        self.total_rate += delta;
        Some(delta)
    }

    fn recalc_rates(&mut self, state: &S, cls: &C) -> f64 {
        let mut total = 0.0;
        for (i, cat) in self.cats.iter_mut().enumerate() {
            let guide = cls.descend(state, i);
            total += cat.recalc_rates(state, &guide);
        }
        self.total_rate = total;
        total
    }

    fn drain_elems(&mut self, out: &mut Vec<Elem>) {
        for cat in self.cats.iter_mut() {
            cat.drain_elems(out);
        }
        self.total_rate = 0.0;
        self.n_elems = 0;
    }
}

impl<Sub> TreeNode<Sub> {
    /// Time-dependent variant of `recalc_rates`: insert a new empty first
    /// bin (every existing bin shifts one slot right), collapse bins beyond
    /// the classifier's limit into the last legal bin by direct transfer,
    /// then recompute all cached totals.
    pub fn shift_and_recalc_rates<S: ?Sized, C>(&mut self, state: &S, cls: &C)
    where
        C: BinClassifier<S>,
        Sub: Layer<S, C::Down> + Default,
    {
        self.cats.insert(0, Sub::default());
        let max = cls.n_bins().max(1);
        while self.cats.len() > max {
            let mut tail = self.cats.pop().expect("overflow bin present");
            let guide = cls.descend(state, max - 1);
            tail.transfer_into(state, &guide, &mut self.cats[max - 1]);
        }
        self.recalc_rates(state, cls);
    }

    /// Direct leaf-level pick inside one bin, for selection loops that draw
    /// the bin themselves.
    pub fn bin_pick(&self, bin: usize, rng: &mut SimRng) -> Option<Elem>
    where
        Sub: Pick,
    {
        self.cats.get(bin).and_then(|c| c.pick_uniform(rng))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
