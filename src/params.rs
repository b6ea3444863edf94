//! Index tuning parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which neighbor-selection heuristic runs during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighborSelection {
    /// Keep the `m` candidates closest to the target (paper Algorithm 3).
    Simple,
    /// Diversity-aware selection (paper Algorithm 4): a candidate is kept
    /// only if it is closer to the target than to every already-kept
    /// neighbor.
    Heuristic,
}

/// HNSW construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Target degree per node (M in the paper). Layer 0 allows up to `2 * m`
    /// connections, every other layer up to `m`.
    pub m: usize,
    /// Beam width during insertion (efConstruction in the paper).
    /// Higher = better graph quality, slower build.
    pub ef_construction: usize,
    /// Decay of the level-sampling distribution (mL in the paper).
    /// Defaults to `1 / ln(m)`.
    pub level_lambda: f64,
    /// Neighbor-selection heuristic used while connecting and pruning.
    pub selection: NeighborSelection,
    /// Heuristic only: widen the candidate set by one hop before selecting.
    pub extend_candidates: bool,
    /// Heuristic only: backfill with the closest discarded candidates until
    /// the degree target is reached.
    pub keep_pruned: bool,
    /// Memoize pairwise distances for the duration of each insertion.
    pub cache_distances: bool,
}

impl Default for HnswParams {
    fn default() -> Self {
        let m = 10;
        Self {
            m,
            ef_construction: 200,
            level_lambda: 1.0 / (m as f64).ln(),
            selection: NeighborSelection::Simple,
            extend_candidates: false,
            keep_pruned: false,
            cache_distances: false,
        }
    }
}

impl HnswParams {
    /// Create parameters with a specific degree target, recomputing
    /// `level_lambda` as `1 / ln(m)`.
    pub fn with_m(m: usize) -> Self {
        Self {
            m,
            level_lambda: 1.0 / (m as f64).ln(),
            ..Self::default()
        }
    }

    /// Set the construction beam width.
    pub fn with_ef_construction(mut self, ef: usize) -> Self {
        self.ef_construction = ef;
        self
    }

    /// Override the level-sampling decay.
    pub fn with_level_lambda(mut self, lambda: f64) -> Self {
        self.level_lambda = lambda;
        self
    }

    /// Choose the neighbor-selection heuristic.
    pub fn with_selection(mut self, selection: NeighborSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Enable one-hop candidate expansion (heuristic only).
    pub fn with_extend_candidates(mut self, extend: bool) -> Self {
        self.extend_candidates = extend;
        self
    }

    /// Enable pruned-candidate backfill (heuristic only).
    pub fn with_keep_pruned(mut self, keep: bool) -> Self {
        self.keep_pruned = keep;
        self
    }

    /// Enable the per-insertion distance cache.
    pub fn with_distance_cache(mut self, cache: bool) -> Self {
        self.cache_distances = cache;
        self
    }

    /// Check the parameter invariants.
    pub fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(Error::invalid_param("m", format!("must be >= 2, got {}", self.m)));
        }
        if self.ef_construction < 1 {
            return Err(Error::invalid_param(
                "ef_construction",
                format!("must be >= 1, got {}", self.ef_construction),
            ));
        }
        if !(self.level_lambda > 0.0) || !self.level_lambda.is_finite() {
            return Err(Error::invalid_param(
                "level_lambda",
                format!("must be positive and finite, got {}", self.level_lambda),
            ));
        }
        Ok(())
    }

    /// Hard degree cap at a layer: `2 * m` at layer 0, `m` above.
    pub(crate) fn mmax(&self, layer: usize) -> usize {
        if layer == 0 {
            2 * self.m
        } else {
            self.m
        }
    }
}
