use thiserror::Error;

/// Error types for the convex clustering engine
///
/// Non-convergence at a single λ is not an error: it is reported through
/// [`LambdaSolution::converged`](crate::LambdaSolution::converged) and a
/// `warn!` log record, and the path keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusteringError {
    /// A caller-supplied parameter is out of range (k, λ sequence, tolerances, empty input)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The input cannot support a neighbor graph (fewer than 2 samples, or k >= N)
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Dimension mismatch between data and a prebuilt graph or warm start
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),
}
