/// Configuration for the convex clustering engine
#[derive(Debug, Clone)]
pub struct ConvexClusterConfig {
    /// Number of nearest neighbors each sample is linked to in the fusion graph
    pub k: usize,

    /// Maximum number of optimizer iterations per λ.
    /// Hitting the cap is reported as non-convergence, not as an error.
    pub max_iters: usize,

    /// Convergence tolerance. The optimizer stops once the largest per-sample
    /// center movement between two iterations falls below this value.
    pub tol: f64,

    /// Euclidean distance under which two centers are treated as fused when
    /// extracting cluster labels.
    pub fusion_tol: f64,

    /// Length scale of the edge weight kernel `exp(-distance / scale)`.
    /// `None` uses the mean k-NN distance of the data.
    pub kernel_scale: Option<f64>,
}

impl Default for ConvexClusterConfig {
    fn default() -> Self {
        Self {
            k: 50,
            max_iters: 2_000,
            tol: 1e-6,
            fusion_tol: 1e-3,
            kernel_scale: None,
        }
    }
}

impl ConvexClusterConfig {
    /// Create a new configuration with the specified neighbor count
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations per λ
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the fusion tolerance used by label extraction
    pub fn with_fusion_tol(mut self, fusion_tol: f64) -> Self {
        self.fusion_tol = fusion_tol;
        self
    }

    /// Set a fixed kernel length scale (or `None` for the data-driven default)
    pub fn with_kernel_scale(mut self, kernel_scale: Option<f64>) -> Self {
        self.kernel_scale = kernel_scale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConvexClusterConfig::default();
        assert_eq!(config.k, 50);
        assert_eq!(config.max_iters, 2_000);
        assert!(config.kernel_scale.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let config = ConvexClusterConfig::new(7)
            .with_max_iters(10)
            .with_tol(1e-4)
            .with_fusion_tol(1e-2)
            .with_kernel_scale(Some(0.5));

        assert_eq!(config.k, 7);
        assert_eq!(config.max_iters, 10);
        assert_eq!(config.tol, 1e-4);
        assert_eq!(config.fusion_tol, 1e-2);
        assert_eq!(config.kernel_scale, Some(0.5));
    }
}
