use crate::config::ConvexClusterConfig;
use crate::distance::{compute_center_shift, project_onto_ball_in_place, soft_threshold_in_place};
use crate::error::ClusteringError;
use crate::graph::{validate_data, NeighborGraph};
use log::{debug, info, trace, warn};
use ndarray::{Array2, ArrayView2, Axis, Zip};
use rayon::prelude::*;
use std::time::Instant;

/// Optimizer state handed from one λ to the next.
///
/// Holds one dual vector per penalty edge; the centers are a function of the
/// duals (`U = X + Dᵀ Λ`), so zero duals reproduce the data exactly.
#[derive(Debug, Clone)]
pub struct WarmStart {
    duals: Array2<f64>,
}

impl WarmStart {
    /// Zero duals: the optimizer starts from `U = X`
    pub fn cold(graph: &NeighborGraph) -> Self {
        Self {
            duals: Array2::zeros((graph.n_edges(), graph.n_features())),
        }
    }

    /// Edge duals of shape (n_edges, n_features)
    pub fn duals(&self) -> &Array2<f64> {
        &self.duals
    }
}

/// Result of optimizing the centers for a single λ
#[derive(Debug, Clone)]
pub struct LambdaSolution {
    /// Penalty strength this solution belongs to
    pub lambda: f64,

    /// Center matrix U of shape (n_samples, n_features)
    pub centers: Array2<f64>,

    /// Iterations actually run
    pub n_iterations: usize,

    /// False when the iteration cap was hit before the tolerance was met
    pub converged: bool,

    /// Largest per-sample center movement in the last iteration
    pub final_shift: f64,

    /// Penalty edges whose shrunken difference is exactly zero
    pub n_fused_edges: usize,
}

/// Minimize `1/2 Σ‖U_i − X_i‖² + λ Σ w_ij ‖U_i − U_j‖` for one λ.
///
/// Alternates a data-fit step, which rebuilds every center from the data and
/// the edge duals, with a per-edge step that projects each dual onto the ball
/// of radius `λ·w_ij`. The projection is the dual form of vector
/// soft-thresholding on the edge difference `U_i − U_j`, so a pair whose
/// difference is shrunk past zero stays fused.
///
/// # Arguments
///
/// * `data` - Feature matrix of shape (n_samples, n_features)
/// * `graph` - Neighbor graph built from `data`
/// * `lambda` - Penalty strength, finite and `>= 0`
/// * `warm_start` - State from a previous λ, or `None` to start from `U = X`
/// * `config` - Iteration cap and tolerance
///
/// # Returns
///
/// The solution for this λ plus the state to warm-start the next one.
/// Hitting `max_iters` is not an error: the latest centers are returned with
/// `converged == false` and a warning is logged.
pub fn solve_lambda(
    data: &ArrayView2<f64>,
    graph: &NeighborGraph,
    lambda: f64,
    warm_start: Option<&WarmStart>,
    config: &ConvexClusterConfig,
) -> Result<(LambdaSolution, WarmStart), ClusteringError> {
    check_graph_matches(data, graph)?;
    validate_solver_config(config)?;
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(ClusteringError::InvalidParameter(format!(
            "λ must be finite and non-negative, got {}",
            lambda
        )));
    }

    let expected = (graph.n_edges(), graph.n_features());
    let mut duals = match warm_start {
        Some(warm) if warm.duals.dim() != expected => {
            return Err(ClusteringError::InvalidDimensions(format!(
                "warm start has shape {:?}, expected {:?}",
                warm.duals.dim(),
                expected
            )));
        }
        Some(warm) => warm.duals.clone(),
        None => Array2::zeros(expected),
    };

    // A warm start from a larger λ can lie outside the current balls
    project_duals(&mut duals, graph, lambda);

    let step = step_size(graph);
    let mut centers = reconstruct_centers(data, graph, &duals.view());
    let mut n_iterations = 0;
    let mut final_shift = 0.0;
    let mut converged = false;

    for iteration in 0..config.max_iters {
        n_iterations = iteration + 1;

        update_duals(&mut duals, &centers.view(), graph, lambda, step);
        let new_centers = reconstruct_centers(data, graph, &duals.view());

        final_shift = compute_center_shift(&centers.view(), &new_centers.view());
        centers = new_centers;

        trace!(
            "  λ = {:.6} iteration {}/{}: shift = {:.3e}",
            lambda,
            n_iterations,
            config.max_iters,
            final_shift
        );

        if final_shift <= config.tol {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            "Optimizer did not converge for λ = {} after {} iterations (shift {:.3e} > tol {:.3e})",
            lambda, n_iterations, final_shift, config.tol
        );
    }

    let n_fused_edges = count_fused_edges(&centers.view(), &duals.view(), graph, lambda, step);

    Ok((
        LambdaSolution {
            lambda,
            centers,
            n_iterations,
            converged,
            final_shift,
            n_fused_edges,
        },
        WarmStart { duals },
    ))
}

/// Sweep an ascending λ sequence, warm-starting each λ from the previous one.
///
/// All parameters are validated before the first λ is processed. A λ that
/// does not converge is recorded in its [`LambdaSolution`] and the sweep
/// continues.
pub fn solve_path(
    data: &ArrayView2<f64>,
    graph: &NeighborGraph,
    lambdas: &[f64],
    config: &ConvexClusterConfig,
) -> Result<Vec<LambdaSolution>, ClusteringError> {
    validate_lambdas(lambdas)?;
    check_graph_matches(data, graph)?;
    validate_solver_config(config)?;

    let path_start = Instant::now();
    info!(
        "Solving convex clustering path: {} samples, {} features, {} edges, {} λ values in [{}, {}]",
        data.nrows(),
        data.ncols(),
        graph.n_edges(),
        lambdas.len(),
        lambdas[0],
        lambdas[lambdas.len() - 1]
    );

    let mut solutions = Vec::with_capacity(lambdas.len());
    let mut warm_start: Option<WarmStart> = None;

    for (index, &lambda) in lambdas.iter().enumerate() {
        let lambda_start = Instant::now();
        let (solution, next) = solve_lambda(data, graph, lambda, warm_start.as_ref(), config)?;

        debug!(
            "λ {}/{} = {:.6}: {} iterations, shift = {:.3e}, fused edges = {}/{}, time = {:.4}s",
            index + 1,
            lambdas.len(),
            lambda,
            solution.n_iterations,
            solution.final_shift,
            solution.n_fused_edges,
            graph.n_edges(),
            lambda_start.elapsed().as_secs_f64()
        );

        warm_start = Some(next);
        solutions.push(solution);
    }

    let n_unconverged = solutions.iter().filter(|s| !s.converged).count();
    if n_unconverged > 0 {
        warn!(
            "{} of {} λ values stopped at the iteration cap ({})",
            n_unconverged,
            solutions.len(),
            config.max_iters
        );
    }
    info!(
        "Convex clustering path finished in {:.4}s",
        path_start.elapsed().as_secs_f64()
    );

    Ok(solutions)
}

/// Check that a λ sequence is non-empty, finite, non-negative and ascending.
/// Equal consecutive values are accepted.
pub fn validate_lambdas(lambdas: &[f64]) -> Result<(), ClusteringError> {
    if lambdas.is_empty() {
        return Err(ClusteringError::InvalidParameter(
            "λ sequence is empty".to_string(),
        ));
    }
    if let Some((index, lambda)) = lambdas
        .iter()
        .enumerate()
        .find(|(_, l)| !l.is_finite() || **l < 0.0)
    {
        return Err(ClusteringError::InvalidParameter(format!(
            "λ[{}] = {} must be finite and non-negative",
            index, lambda
        )));
    }
    if let Some(index) = lambdas.windows(2).position(|w| w[1] < w[0]) {
        return Err(ClusteringError::InvalidParameter(format!(
            "λ sequence must be ascending, but λ[{}] = {} follows λ[{}] = {}",
            index + 1,
            lambdas[index + 1],
            index,
            lambdas[index]
        )));
    }
    Ok(())
}

pub(crate) fn check_graph_matches(
    data: &ArrayView2<f64>,
    graph: &NeighborGraph,
) -> Result<(), ClusteringError> {
    validate_data(data)?;
    if data.nrows() != graph.n_nodes() || data.ncols() != graph.n_features() {
        return Err(ClusteringError::InvalidDimensions(format!(
            "data has shape ({}, {}), graph was built for ({}, {})",
            data.nrows(),
            data.ncols(),
            graph.n_nodes(),
            graph.n_features()
        )));
    }
    Ok(())
}

fn validate_solver_config(config: &ConvexClusterConfig) -> Result<(), ClusteringError> {
    if config.max_iters == 0 {
        return Err(ClusteringError::InvalidParameter(
            "max_iters must be at least 1, got 0".to_string(),
        ));
    }
    if !config.tol.is_finite() || config.tol < 0.0 {
        return Err(ClusteringError::InvalidParameter(format!(
            "tol must be finite and non-negative, got {}",
            config.tol
        )));
    }
    Ok(())
}

/// Step size `1 / max(deg_i + deg_j)`, below `2 / λ_max` of the graph Laplacian
fn step_size(graph: &NeighborGraph) -> f64 {
    match graph.laplacian_bound() {
        0 => 1.0,
        bound => 1.0 / bound as f64,
    }
}

/// `U_i = X_i + Σ ±Λ_l` over the edges touching sample `i`
fn reconstruct_centers(
    data: &ArrayView2<f64>,
    graph: &NeighborGraph,
    duals: &ArrayView2<f64>,
) -> Array2<f64> {
    let mut centers = data.to_owned();

    centers
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut center)| {
            for &(l, sign) in graph.incidence(i) {
                center.scaled_add(sign, &duals.row(l));
            }
        });

    centers
}

/// `Λ_l ← P_{‖·‖ ≤ λ w_l}(Λ_l − step · (U_i − U_j))`
fn update_duals(
    duals: &mut Array2<f64>,
    centers: &ArrayView2<f64>,
    graph: &NeighborGraph,
    lambda: f64,
    step: f64,
) {
    duals
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(graph.edges().par_iter())
        .for_each(|(mut dual, edge)| {
            let source = centers.row(edge.source);
            let target = centers.row(edge.target);
            Zip::from(&mut dual)
                .and(&source)
                .and(&target)
                .for_each(|z, &a, &b| *z -= step * (a - b));
            project_onto_ball_in_place(&mut dual, lambda * edge.weight);
        });
}

fn project_duals(duals: &mut Array2<f64>, graph: &NeighborGraph, lambda: f64) {
    duals
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(graph.edges().par_iter())
        .for_each(|(mut dual, edge)| project_onto_ball_in_place(&mut dual, lambda * edge.weight));
}

/// Edges whose shrunken difference `S_{λ w / step}(U_i − U_j − Λ_l / step)` is exactly zero
fn count_fused_edges(
    centers: &ArrayView2<f64>,
    duals: &ArrayView2<f64>,
    graph: &NeighborGraph,
    lambda: f64,
    step: f64,
) -> usize {
    graph
        .edges()
        .par_iter()
        .enumerate()
        .filter(|(l, edge)| {
            let mut diff = &centers.row(edge.source) - &centers.row(edge.target);
            diff.scaled_add(-1.0 / step, &duals.row(*l));
            soft_threshold_in_place(&mut diff.view_mut(), lambda * edge.weight / step);
            diff.iter().all(|&x| x == 0.0)
        })
        .count()
}
