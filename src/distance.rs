use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, Axis};
use rayon::prelude::*;

/// Euclidean distance between two rows, computed from the coordinate
/// differences so that identical rows are exactly 0 apart.
#[inline]
pub fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Distances from row `i` to every other row, as `(distance, index)` pairs
/// sorted ascending by distance with ties broken by index.
pub fn sorted_distances_from(data: &ArrayView2<f64>, i: usize) -> Vec<(f64, usize)> {
    let row = data.row(i);
    let mut dists: Vec<(f64, usize)> = data
        .outer_iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .map(|(j, other)| (euclidean_distance(&row, &other), j))
        .collect();

    // Inputs are validated finite, so total_cmp matches partial ordering
    dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    dists
}

/// Largest L2 movement of any row between two center matrices.
///
/// The max does not depend on rayon's reduction order.
pub fn compute_center_shift(old_centers: &ArrayView2<f64>, new_centers: &ArrayView2<f64>) -> f64 {
    old_centers
        .axis_iter(Axis(0))
        .into_par_iter()
        .zip(new_centers.axis_iter(Axis(0)).into_par_iter())
        .map(|(old_c, new_c)| euclidean_distance(&old_c, &new_c))
        .reduce(|| 0.0, f64::max)
}

/// Shrink `v` towards zero by `threshold` in L2 norm, clipping to exactly
/// zero when the threshold reaches the norm. A zero vector stays zero.
#[inline]
pub fn soft_threshold_in_place(v: &mut ArrayViewMut1<f64>, threshold: f64) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm <= threshold {
        v.fill(0.0);
    } else {
        let scale = 1.0 - threshold / norm;
        v.mapv_inplace(|x| x * scale);
    }
}

/// Project `v` onto the L2 ball of the given radius.
#[inline]
pub fn project_onto_ball_in_place(v: &mut ArrayViewMut1<f64>, radius: f64) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > radius {
        let scale = radius / norm;
        v.mapv_inplace(|x| x * scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_euclidean_distance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_relative_eq!(euclidean_distance(&a.view(), &b.view()), 5.0, epsilon = 1e-12);
        assert_eq!(euclidean_distance(&b.view(), &b.view()), 0.0);
    }

    #[test]
    fn test_sorted_distances_tie_break() {
        // Rows 1 and 2 are both at distance 1 from row 0
        let data = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]];
        let dists = sorted_distances_from(&data.view(), 0);

        let order: Vec<usize> = dists.iter().map(|&(_, j)| j).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert!(dists.iter().all(|&(_, j)| j != 0));
    }

    #[test]
    fn test_center_shift() {
        let old = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let new = array![[1.0, 0.0], [1.0, 1.0], [2.0, 4.0]];

        let shift = compute_center_shift(&old.view(), &new.view());
        assert_relative_eq!(shift, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_soft_threshold_shrinks() {
        let mut v = array![3.0, 4.0];
        soft_threshold_in_place(&mut v.view_mut(), 1.0);
        assert_relative_eq!(v[0], 2.4, epsilon = 1e-12);
        assert_relative_eq!(v[1], 3.2, epsilon = 1e-12);
    }

    #[test]
    fn test_soft_threshold_clips_to_zero() {
        let mut v = array![0.3, 0.4];
        soft_threshold_in_place(&mut v.view_mut(), 0.6);
        assert_eq!(v, array![0.0, 0.0]);

        // Zero vector must not divide by its norm
        let mut z = array![0.0, 0.0];
        soft_threshold_in_place(&mut z.view_mut(), 0.0);
        assert_eq!(z, array![0.0, 0.0]);
        assert!(z.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_project_onto_ball() {
        let mut v = array![3.0, 4.0];
        project_onto_ball_in_place(&mut v.view_mut(), 1.0);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-12);

        let mut inside = array![0.1, 0.1];
        project_onto_ball_in_place(&mut inside.view_mut(), 1.0);
        assert_eq!(inside, array![0.1, 0.1]);

        let mut collapsed = array![3.0, -4.0];
        project_onto_ball_in_place(&mut collapsed.view_mut(), 0.0);
        assert!(collapsed.iter().all(|x| *x == 0.0));
    }
}
