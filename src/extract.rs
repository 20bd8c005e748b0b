use crate::distance::euclidean_distance;
use crate::error::ClusteringError;
use crate::union_find::UnionFind;
use ndarray::{Array1, ArrayView2};
use rayon::prelude::*;

/// Group samples whose centers lie within `fusion_tol` of each other.
///
/// Pairs closer than `fusion_tol` (Euclidean) are joined with union-find, so
/// fusion is transitive: a chain of close centers forms one cluster even when
/// its endpoints are further apart than the tolerance. Cluster ids are dense
/// and assigned in order of first appearance by sample index.
///
/// # Errors
///
/// Returns `InvalidParameter` if `fusion_tol` is negative or not finite.
pub fn extract_labels(
    centers: &ArrayView2<f64>,
    fusion_tol: f64,
) -> Result<Array1<i64>, ClusteringError> {
    if !fusion_tol.is_finite() || fusion_tol < 0.0 {
        return Err(ClusteringError::InvalidParameter(format!(
            "fusion tolerance must be finite and non-negative, got {}",
            fusion_tol
        )));
    }

    let n_samples = centers.nrows();

    // Candidate pairs are found in parallel, merged serially in index order
    let close_pairs: Vec<Vec<usize>> = (0..n_samples)
        .into_par_iter()
        .map(|i| {
            let row = centers.row(i);
            ((i + 1)..n_samples)
                .filter(|&j| euclidean_distance(&row, &centers.row(j)) < fusion_tol)
                .collect()
        })
        .collect();

    let mut uf = UnionFind::new(n_samples);
    for (i, partners) in close_pairs.iter().enumerate() {
        for &j in partners {
            uf.union(i, j);
        }
    }

    Ok(uf
        .component_ids()
        .into_iter()
        .map(|id| id as i64)
        .collect())
}

/// Number of distinct clusters `extract_labels` would produce
pub fn count_clusters(centers: &ArrayView2<f64>, fusion_tol: f64) -> Result<usize, ClusteringError> {
    let labels = extract_labels(centers, fusion_tol)?;
    Ok(labels.iter().max().map_or(0, |&max_id| max_id as usize + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_extract_groups_close_centers() {
        let centers = array![[0.0, 0.0], [5.0, 5.0], [0.0, 0.0005], [5.0, 5.0]];
        let labels = extract_labels(&centers.view(), 1e-3).unwrap();

        assert_eq!(labels.to_vec(), vec![0, 1, 0, 1]);
        assert_eq!(count_clusters(&centers.view(), 1e-3).unwrap(), 2);
    }

    #[test]
    fn test_extract_is_transitive() {
        // 0-1 and 1-2 are within tolerance, 0-2 is not
        let centers = array![[0.0], [0.0008], [0.0016], [1.0]];
        let labels = extract_labels(&centers.view(), 1e-3).unwrap();

        assert_eq!(labels.to_vec(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_zero_tolerance_keeps_every_sample_apart() {
        // Distance must be strictly below the tolerance
        let centers = array![[1.0, 1.0], [1.0, 1.0], [2.0, 2.0]];
        let labels = extract_labels(&centers.view(), 0.0).unwrap();

        assert_eq!(labels.to_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_distinct_centers_are_singletons() {
        let centers = Array2::from_shape_fn((5, 3), |(i, j)| (i * 3 + j) as f64);
        assert_eq!(count_clusters(&centers.view(), 1e-2).unwrap(), 5);
    }

    #[test]
    fn test_invalid_tolerance() {
        let centers = array![[0.0], [1.0]];
        assert!(matches!(
            extract_labels(&centers.view(), -1.0),
            Err(ClusteringError::InvalidParameter(_))
        ));
        assert!(matches!(
            extract_labels(&centers.view(), f64::NAN),
            Err(ClusteringError::InvalidParameter(_))
        ));
    }
}
