//! Basic example demonstrating convex-clustering-rs usage
//!
//! Run with: cargo run --example basic --release

use convex_clustering_rs::{lambda_logspace, ConvexClusterConfig, ConvexClustering};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn main() {
    println!("=== convex-clustering-rs example ===\n");

    // 3 well-separated groups in 2D
    let n_samples = 90;
    let n_features = 2;
    let centers = [[-5.0, -5.0], [0.0, 5.0], [5.0, -5.0]];

    println!("Generating {} samples with {} features...", n_samples, n_features);

    let noise = Array2::random((n_samples, n_features), Uniform::new(-0.5, 0.5));
    let data = Array2::from_shape_fn((n_samples, n_features), |(i, j)| {
        centers[i % 3][j] + noise[[i, j]]
    });

    let config = ConvexClusterConfig::new(5)
        .with_max_iters(2_000)
        .with_fusion_tol(1e-3);
    let lambdas = lambda_logspace(-2.0, 2.0, 20);

    println!("Sweeping {} λ values with k = 5...\n", lambdas.len());

    let engine = ConvexClustering::with_config(config);
    let path = engine
        .fit_path(&data.view(), &lambdas)
        .expect("Path computation failed");

    println!("Clusters along the path:");
    let counts = path.cluster_counts().expect("Label extraction failed");
    for (lambda, count) in path.lambdas().iter().zip(counts.iter()) {
        println!("  λ = {:>9.4}: {:>3} clusters", lambda, count);
    }
    println!();

    let mut cluster_sizes = vec![0usize; path.n_clusters()];
    for &label in path.labels().iter() {
        cluster_sizes[label as usize] += 1;
    }

    println!("Final cluster distribution:");
    for (i, size) in cluster_sizes.iter().enumerate() {
        println!("  Cluster {}: {} samples", i, size);
    }

    let trajectory = path.trajectory(0).expect("sample 0 exists");
    println!(
        "\nSample 0 moved from ({:.2}, {:.2}) to ({:.2}, {:.2})",
        trajectory[[0, 0]],
        trajectory[[0, 1]],
        trajectory[[lambdas.len() - 1, 0]],
        trajectory[[lambdas.len() - 1, 1]]
    );

    println!("\n=== Done! ===");
}
