//! # convex-clustering-rs
//!
//! Convex clustering regularization paths in Rust, compatible with ndarray.
//!
//! Convex clustering gives every sample its own center and penalizes the
//! distance between the centers of neighboring samples:
//!
//! ```text
//! minimize  1/2 Σ‖U_i − X_i‖²  +  λ Σ_(i,j) w_ij ‖U_i − U_j‖
//! ```
//!
//! The penalty is a sum of (unsquared) Euclidean norms, so as λ grows whole
//! groups of centers become exactly equal. Sweeping λ traces a path from one
//! cluster per sample to one cluster per connected component of the neighbor
//! graph.
//!
//! ## Features
//!
//! - **k-NN fusion graph**: each sample is linked to its k nearest neighbors,
//!   weighted by `exp(-distance / scale)`
//! - **Warm-started path**: each λ starts from the previous λ's solution,
//!   threaded explicitly through the path driver
//! - **Parallel computation**: per-sample and per-edge updates use rayon and
//!   stay bit-for-bit deterministic
//! - **ndarray compatible**: works on `ArrayView2<f64>` feature matrices
//!
//! ## Example
//!
//! ```rust
//! use convex_clustering_rs::{lambda_logspace, ConvexClusterConfig, ConvexClustering};
//! use ndarray::array;
//!
//! let data = array![
//!     [0.0, 0.0], [0.1, 0.0], [0.0, 0.1],
//!     [3.0, 3.0], [3.1, 3.0], [3.0, 3.1],
//! ];
//!
//! let config = ConvexClusterConfig::new(2).with_fusion_tol(1e-3);
//! let engine = ConvexClustering::with_config(config);
//!
//! let lambdas = lambda_logspace(-2.0, 1.0, 10);
//! let path = engine.fit_path(&data.view(), &lambdas).unwrap();
//!
//! assert_eq!(path.u_path().len(), 10);
//! assert_eq!(path.labels().len(), 6);
//! assert_eq!(path.n_clusters(), 2);
//! ```

mod algorithm;
mod config;
mod convex;
mod distance;
mod error;
mod extract;
mod graph;
mod schedule;
mod union_find;

pub use algorithm::{solve_lambda, solve_path, validate_lambdas, LambdaSolution, WarmStart};
pub use config::ConvexClusterConfig;
pub use convex::{ClusterPath, ConvexClustering};
pub use error::ClusteringError;
pub use extract::{count_clusters, extract_labels};
pub use graph::{Edge, NeighborGraph};
pub use schedule::lambda_logspace;
