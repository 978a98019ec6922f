// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Rate-Consistency Audit

use crate::cat_tree::{NodeCore, TreeNode};

/// Absolute error below this threshold counts as consistent.
pub const RATE_TOLERANCE: f64 = 1e-9;

/// Outcome of a single tree check.
#[derive(Debug, Clone)]
pub struct AuditResult {
    pub balanced: bool,
    pub error: f64,
}

/// Tracks cumulative divergence between cached tree aggregates and their
/// recomputed sums. The cached totals are the values every KMC draw trusts;
/// a drift here corrupts event selection silently, so debug builds verify
/// them periodically.
#[derive(Debug, Clone)]
pub struct RateAudit {
    pub tolerance: f64,
    pub cumulative_error: f64,
    pub violations: u32,
}

impl Default for RateAudit {
    fn default() -> Self {
        Self::new(RATE_TOLERANCE)
    }
}

impl RateAudit {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cumulative_error: 0.0,
            violations: 0,
        }
    }

    /// Verify one tree: cached total rate against the per-bin sum, cached
    /// element count against the per-bin populations.
    pub fn check_tree<Sub: NodeCore>(&mut self, tree: &TreeNode<Sub>) -> AuditResult {
        let error = tree.aggregate_rate_error();
        let balanced = error <= self.tolerance && tree.aggregate_count_consistent();
        if !balanced {
            self.cumulative_error += error;
            self.violations += 1;
        }
        AuditResult { balanced, error }
    }

    pub fn is_clean(&self) -> bool {
        self.violations == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat_tree::{BinClassifier, Layer, LeafNode, RankTree};
    use crate::types::Elem;

    struct Halves;

    impl BinClassifier<()> for Halves {
        type Down = f64;

        fn classify(&self, _s: &(), elem: Elem) -> usize {
            (elem % 2) as usize
        }

        fn descend(&self, _s: &(), bin: usize) -> f64 {
            [1.0, 3.0][bin]
        }

        fn n_bins(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_consistent_tree_passes() {
        let mut tree = RankTree::default();
        for e in 0..10 {
            tree.add(&(), &Halves, e);
        }
        let mut audit = RateAudit::default();
        let result = audit.check_tree(&tree);
        assert!(result.balanced);
        assert!(result.error <= RATE_TOLERANCE);
        assert!(audit.is_clean());
    }

    #[test]
    fn test_mutated_tree_still_passes_after_churn() {
        let mut tree = RankTree::default();
        for e in 0..100 {
            tree.add(&(), &Halves, e);
        }
        for e in (0..100).step_by(3) {
            tree.remove(&(), &Halves, e);
        }
        for e in (0..100).step_by(3) {
            tree.add(&(), &Halves, e);
        }
        let mut audit = RateAudit::default();
        assert!(audit.check_tree(&tree).balanced);
    }

    #[test]
    fn test_empty_tree_is_balanced() {
        let tree: TreeNode<LeafNode> = TreeNode::default();
        let mut audit = RateAudit::default();
        assert!(audit.check_tree(&tree).balanced);
    }
}
