//! k-nearest-neighbor fusion graph.
//!
//! Every sample keeps its own ordered list of k neighbors, so the lists are
//! asymmetric: `j` may be a neighbor of `i` without `i` being a neighbor of
//! `j`. The penalty uses the union of those directed pairs, each unordered
//! pair counted once.

use crate::distance::sorted_distances_from;
use crate::error::ClusteringError;
use crate::union_find::UnionFind;
use log::debug;
use ndarray::ArrayView2;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// An undirected penalty edge between `source < target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Sparse weighted similarity graph over the samples.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    /// Number of feature dimensions the graph was built from
    n_features: usize,

    /// Per-sample k-NN lists of (neighbor index, weight), nearest first
    neighbors: Vec<Vec<(usize, f64)>>,

    /// Deduplicated penalty edges, sorted by (source, target)
    edges: Vec<Edge>,

    /// Per-sample (edge index, sign): +1 when the sample is the edge source
    incidence: Vec<Vec<(usize, f64)>>,

    /// Length scale used in the weight kernel
    kernel_scale: f64,
}

impl NeighborGraph {
    /// Build the k-NN graph of `data` with weights `exp(-distance / scale)`.
    ///
    /// # Arguments
    ///
    /// * `data` - Feature matrix of shape (n_samples, n_features)
    /// * `k` - Number of neighbors per sample, `1 <= k < n_samples`
    /// * `kernel_scale` - Kernel length scale; `None` uses the mean k-NN distance
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The matrix is empty, has no columns, or contains non-finite values
    /// - There are fewer than 2 samples, or `k >= n_samples`
    /// - `k == 0` or the kernel scale is not a positive finite number
    pub fn build(
        data: &ArrayView2<f64>,
        k: usize,
        kernel_scale: Option<f64>,
    ) -> Result<Self, ClusteringError> {
        validate_data(data)?;

        let n_samples = data.nrows();
        if k == 0 {
            return Err(ClusteringError::InvalidParameter(format!(
                "k must be at least 1, got {} (n_samples = {})",
                k, n_samples
            )));
        }
        if k >= n_samples {
            return Err(ClusteringError::DegenerateInput(format!(
                "k ({}) must be less than the number of samples ({})",
                k, n_samples
            )));
        }
        if let Some(scale) = kernel_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ClusteringError::InvalidParameter(format!(
                    "kernel scale must be positive and finite, got {}",
                    scale
                )));
            }
        }

        let knn: Vec<Vec<(f64, usize)>> = (0..n_samples)
            .into_par_iter()
            .map(|i| {
                let mut dists = sorted_distances_from(data, i);
                dists.truncate(k);
                dists
            })
            .collect();

        let scale = kernel_scale.unwrap_or_else(|| {
            let total: f64 = knn.iter().flatten().map(|&(d, _)| d).sum();
            let mean = total / (n_samples * k) as f64;
            if mean > 0.0 {
                mean
            } else {
                1.0
            }
        });

        let neighbors: Vec<Vec<(usize, f64)>> = knn
            .iter()
            .map(|row| row.iter().map(|&(d, j)| (j, (-d / scale).exp())).collect())
            .collect();

        let mut unique: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (i, row) in neighbors.iter().enumerate() {
            for &(j, weight) in row {
                unique.entry((i.min(j), i.max(j))).or_insert(weight);
            }
        }
        let edges: Vec<Edge> = unique
            .into_iter()
            .map(|((source, target), weight)| Edge {
                source,
                target,
                weight,
            })
            .collect();

        let mut incidence = vec![Vec::new(); n_samples];
        for (l, edge) in edges.iter().enumerate() {
            incidence[edge.source].push((l, 1.0));
            incidence[edge.target].push((l, -1.0));
        }

        debug!(
            "Built neighbor graph: {} samples, k = {}, {} penalty edges, kernel scale = {:.6}",
            n_samples,
            k,
            edges.len(),
            scale
        );

        Ok(Self {
            n_features: data.ncols(),
            neighbors,
            edges,
            incidence,
            kernel_scale: scale,
        })
    }

    /// Number of samples (graph nodes)
    pub fn n_nodes(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of feature dimensions of the data the graph was built from
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// The k nearest neighbors of sample `i` with their weights, nearest first
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.neighbors[i]
    }

    /// Undirected penalty edges
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn kernel_scale(&self) -> f64 {
        self.kernel_scale
    }

    /// Penalty edges touching sample `i`, with sign +1 when `i` is the edge source
    pub(crate) fn incidence(&self, i: usize) -> &[(usize, f64)] {
        &self.incidence[i]
    }

    /// Number of penalty edges touching sample `i`
    pub fn degree(&self, i: usize) -> usize {
        self.incidence[i].len()
    }

    /// Upper bound on the largest eigenvalue of the graph Laplacian:
    /// `max over edges (i, j) of deg(i) + deg(j)`. Zero for an edgeless graph.
    pub fn laplacian_bound(&self) -> usize {
        self.edges
            .iter()
            .map(|e| self.degree(e.source) + self.degree(e.target))
            .max()
            .unwrap_or(0)
    }

    /// Connected component id of every sample (ids dense, by first appearance)
    pub fn connected_components(&self) -> Vec<usize> {
        let mut uf = UnionFind::new(self.n_nodes());
        for edge in &self.edges {
            uf.union(edge.source, edge.target);
        }
        uf.component_ids()
    }

    pub fn n_components(&self) -> usize {
        self.connected_components()
            .into_iter()
            .max()
            .map_or(0, |max_id| max_id + 1)
    }
}

/// Shape and finiteness checks shared by every entry point taking a feature matrix
pub(crate) fn validate_data(data: &ArrayView2<f64>) -> Result<(), ClusteringError> {
    let (n_samples, n_features) = data.dim();
    if n_samples == 0 {
        return Err(ClusteringError::InvalidParameter(
            "feature matrix is empty (0 samples)".to_string(),
        ));
    }
    if n_features == 0 {
        return Err(ClusteringError::InvalidParameter(format!(
            "feature matrix has 0 dimensions ({} samples)",
            n_samples
        )));
    }
    if n_samples < 2 {
        return Err(ClusteringError::DegenerateInput(format!(
            "at least 2 samples are required, got {}",
            n_samples
        )));
    }
    if let Some(((i, j), value)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ClusteringError::InvalidParameter(format!(
            "feature matrix contains a non-finite value {} at ({}, {})",
            value, i, j
        )));
    }
    Ok(())
}
