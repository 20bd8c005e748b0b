use crate::algorithm::{check_graph_matches, solve_path, validate_lambdas, LambdaSolution};
use crate::config::ConvexClusterConfig;
use crate::error::ClusteringError;
use crate::extract::{count_clusters, extract_labels};
use crate::graph::NeighborGraph;
use log::info;
use ndarray::{Array1, Array2, Array3, ArrayView2};

/// Convex clustering over a k-nearest-neighbor fusion graph.
///
/// Instead of a single partition, this computes a regularization path: one
/// matrix of per-sample cluster centers for every penalty strength λ. As λ
/// grows, neighboring centers fuse and the number of clusters falls. The
/// final labels are read off the largest λ.
///
/// The engine holds only configuration. Every call is a pure function of its
/// arguments and returns a [`ClusterPath`] value.
///
/// # Example
///
/// ```
/// use convex_clustering_rs::ConvexClustering;
/// use ndarray::array;
///
/// let data = array![[0.0, 0.0], [0.1, 0.1], [5.0, 5.0], [5.1, 5.1]];
/// let engine = ConvexClustering::new(1);
///
/// let path = engine.fit_path(&data.view(), &[0.0, 0.5, 5.0]).unwrap();
/// assert_eq!(path.u_path().len(), 3);
/// assert_eq!(path.n_clusters(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ConvexClustering {
    /// Model configuration
    config: ConvexClusterConfig,
}

impl ConvexClustering {
    /// Create an engine with the default configuration and `k` neighbors.
    ///
    /// `k` is validated against the data when a path is fitted.
    pub fn new(k: usize) -> Self {
        Self {
            config: ConvexClusterConfig::new(k),
        }
    }

    /// Create an engine with a custom configuration
    pub fn with_config(config: ConvexClusterConfig) -> Self {
        Self { config }
    }

    /// Build the neighbor graph this engine would use for `data`
    pub fn build_graph(&self, data: &ArrayView2<f64>) -> Result<NeighborGraph, ClusteringError> {
        NeighborGraph::build(data, self.config.k, self.config.kernel_scale)
    }

    /// Compute the regularization path for an ascending λ sequence.
    ///
    /// # Arguments
    ///
    /// * `data` - Normalized feature matrix of shape (n_samples, n_features)
    /// * `lambdas` - Ascending, non-negative penalty strengths; `0` means no fusion
    ///
    /// # Errors
    ///
    /// Returns an error, before any λ is optimized, if:
    /// - The λ sequence is empty, negative, non-finite or not ascending
    /// - `k` is 0, the data is empty, or has no feature columns (`InvalidParameter`)
    /// - There are fewer than 2 samples or `k >= n_samples` (`DegenerateInput`)
    pub fn fit_path(
        &self,
        data: &ArrayView2<f64>,
        lambdas: &[f64],
    ) -> Result<ClusterPath, ClusteringError> {
        validate_lambdas(lambdas)?;
        self.validate_fusion_tol()?;

        let graph = self.build_graph(data)?;
        self.run(data, graph, lambdas)
    }

    /// Compute the regularization path over a prebuilt neighbor graph.
    ///
    /// # Errors
    ///
    /// Same as [`fit_path`](Self::fit_path), plus `InvalidDimensions` when the
    /// graph was built for data of a different shape.
    pub fn fit_path_with_graph(
        &self,
        data: &ArrayView2<f64>,
        graph: NeighborGraph,
        lambdas: &[f64],
    ) -> Result<ClusterPath, ClusteringError> {
        validate_lambdas(lambdas)?;
        self.validate_fusion_tol()?;
        check_graph_matches(data, &graph)?;

        self.run(data, graph, lambdas)
    }

    /// Fit the path and return only the final cluster labels.
    pub fn fit_predict(
        &self,
        data: &ArrayView2<f64>,
        lambdas: &[f64],
    ) -> Result<Array1<i64>, ClusteringError> {
        Ok(self.fit_path(data, lambdas)?.labels)
    }

    /// Get the neighbor count.
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Get the configuration.
    pub fn config(&self) -> &ConvexClusterConfig {
        &self.config
    }

    fn run(
        &self,
        data: &ArrayView2<f64>,
        graph: NeighborGraph,
        lambdas: &[f64],
    ) -> Result<ClusterPath, ClusteringError> {
        let solutions = solve_path(data, &graph, lambdas, &self.config)?;

        let final_centers = &solutions[solutions.len() - 1].centers;
        let labels = extract_labels(&final_centers.view(), self.config.fusion_tol)?;

        let path = ClusterPath {
            solutions,
            labels,
            graph,
            fusion_tol: self.config.fusion_tol,
        };
        info!(
            "Extracted {} clusters from {} samples at λ = {}",
            path.n_clusters(),
            data.nrows(),
            lambdas[lambdas.len() - 1]
        );

        Ok(path)
    }

    fn validate_fusion_tol(&self) -> Result<(), ClusteringError> {
        let fusion_tol = self.config.fusion_tol;
        if !fusion_tol.is_finite() || fusion_tol < 0.0 {
            return Err(ClusteringError::InvalidParameter(format!(
                "fusion tolerance must be finite and non-negative, got {}",
                fusion_tol
            )));
        }
        Ok(())
    }
}

/// The regularization path produced by [`ConvexClustering::fit_path`].
///
/// Holds one [`LambdaSolution`] per λ in input order (the U-path), the labels
/// extracted from the last one, and the neighbor graph the path was solved on.
#[derive(Debug, Clone)]
pub struct ClusterPath {
    solutions: Vec<LambdaSolution>,
    labels: Array1<i64>,
    graph: NeighborGraph,
    fusion_tol: f64,
}

impl ClusterPath {
    /// Number of λ values on the path
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Always false: a path has at least one λ
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn lambdas(&self) -> Vec<f64> {
        self.solutions.iter().map(|s| s.lambda).collect()
    }

    /// Center matrices in λ order
    pub fn u_path(&self) -> Vec<ArrayView2<'_, f64>> {
        self.solutions.iter().map(|s| s.centers.view()).collect()
    }

    pub fn centers_at(&self, index: usize) -> Option<&Array2<f64>> {
        self.solutions.get(index).map(|s| &s.centers)
    }

    /// Centers at the largest λ
    pub fn final_centers(&self) -> &Array2<f64> {
        &self.solutions[self.solutions.len() - 1].centers
    }

    /// Cluster labels extracted from the final centers
    pub fn labels(&self) -> &Array1<i64> {
        &self.labels
    }

    pub fn n_clusters(&self) -> usize {
        self.labels.iter().max().map_or(0, |&max_id| max_id as usize + 1)
    }

    /// Labels extracted from the centers at an intermediate λ
    pub fn labels_at(&self, index: usize) -> Result<Array1<i64>, ClusteringError> {
        let centers = self.centers_at(index).ok_or_else(|| {
            ClusteringError::InvalidParameter(format!(
                "λ index {} out of range for a path of length {}",
                index,
                self.len()
            ))
        })?;
        extract_labels(&centers.view(), self.fusion_tol)
    }

    /// Number of clusters at every λ
    pub fn cluster_counts(&self) -> Result<Vec<usize>, ClusteringError> {
        self.solutions
            .iter()
            .map(|s| count_clusters(&s.centers.view(), self.fusion_tol))
            .collect()
    }

    /// Positions the center of `sample` passes through, shape (n_lambdas, n_features)
    pub fn trajectory(&self, sample: usize) -> Option<Array2<f64>> {
        if sample >= self.graph.n_nodes() {
            return None;
        }
        let n_features = self.graph.n_features();
        Some(Array2::from_shape_fn(
            (self.solutions.len(), n_features),
            |(l, j)| self.solutions[l].centers[[sample, j]],
        ))
    }

    /// λ values whose optimization stopped at the iteration cap
    pub fn non_converged_lambdas(&self) -> Vec<f64> {
        self.solutions
            .iter()
            .filter(|s| !s.converged)
            .map(|s| s.lambda)
            .collect()
    }

    pub fn is_converged(&self) -> bool {
        self.solutions.iter().all(|s| s.converged)
    }

    /// The whole U-path stacked into shape (n_lambdas, n_samples, n_features)
    pub fn to_array3(&self) -> Array3<f64> {
        let (n_samples, n_features) = self.final_centers().dim();
        Array3::from_shape_fn((self.solutions.len(), n_samples, n_features), |(l, i, j)| {
            self.solutions[l].centers[[i, j]]
        })
    }

    pub fn solutions(&self) -> &[LambdaSolution] {
        &self.solutions
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    pub fn fusion_tol(&self) -> f64 {
        self.fusion_tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn four_points() -> Array2<f64> {
        array![[0.0, 0.0], [0.1, 0.1], [5.0, 5.0], [5.1, 5.1]]
    }

    #[test]
    fn test_convex_clustering_new() {
        let engine = ConvexClustering::new(5);
        assert_eq!(engine.k(), 5);
        assert_eq!(engine.config().fusion_tol, 1e-3);
    }

    #[test]
    fn test_fit_path_shapes() {
        let data = four_points();
        let engine = ConvexClustering::new(1);

        let path = engine.fit_path(&data.view(), &[0.0, 0.5, 5.0]).unwrap();

        assert_eq!(path.len(), 3);
        assert!(!path.is_empty());
        assert_eq!(path.lambdas(), vec![0.0, 0.5, 5.0]);
        assert_eq!(path.labels().len(), 4);
        assert_eq!(path.to_array3().dim(), (3, 4, 2));
        assert_eq!(path.trajectory(2).unwrap().dim(), (3, 2));
        assert!(path.trajectory(4).is_none());
        assert!(path.centers_at(3).is_none());
    }

    #[test]
    fn test_four_point_scenario() {
        let data = four_points();
        let engine = ConvexClustering::new(1);

        let path = engine.fit_path(&data.view(), &[0.0, 0.05, 0.5, 5.0, 50.0]).unwrap();

        assert_eq!(path.labels_at(0).unwrap().to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(path.cluster_counts().unwrap(), vec![4, 4, 2, 2, 2]);
        assert_eq!(path.labels().to_vec(), vec![0, 0, 1, 1]);
        assert!(path.is_converged());
    }

    #[test]
    fn test_fit_predict_matches_path_labels() {
        let data = four_points();
        let engine = ConvexClustering::new(1);

        let labels = engine.fit_predict(&data.view(), &[0.0, 5.0]).unwrap();
        let path = engine.fit_path(&data.view(), &[0.0, 5.0]).unwrap();
        assert_eq!(&labels, path.labels());
    }

    #[test]
    fn test_labels_at_out_of_range() {
        let data = four_points();
        let path = ConvexClustering::new(1)
            .fit_path(&data.view(), &[0.0])
            .unwrap();

        assert!(matches!(
            path.labels_at(1),
            Err(ClusteringError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_fit_path_with_prebuilt_graph() {
        let data = four_points();
        let engine = ConvexClustering::new(3);
        let graph = engine.build_graph(&data.view()).unwrap();

        let path = engine
            .fit_path_with_graph(&data.view(), graph, &[0.0, 100.0])
            .unwrap();
        assert_eq!(path.n_clusters(), 1);
        assert_eq!(path.graph().n_components(), 1);
    }

    #[test]
    fn test_invalid_fusion_tol_rejected_before_solving() {
        let data = four_points();
        let config = ConvexClusterConfig::new(1).with_fusion_tol(-1.0);

        let result = ConvexClustering::with_config(config).fit_path(&data.view(), &[0.0, 1.0]);
        assert!(matches!(result, Err(ClusteringError::InvalidParameter(_))));
    }
}
