//! Run convex clustering over a latent feature matrix stored as `.npy`.
//!
//! Writes the U-path (`u_path.npy`, shape n_lambdas x n_samples x n_features),
//! the final cluster labels (`labels.npy`) and the λ sequence (`lambdas.npy`)
//! into the output directory for plotting and scoring.
//!
//! Usage:
//!   convex-path -i latent.npy -o out/                       # default sweep, k = 50
//!   convex-path -i latent.npy -o out/ -k 20 --lambda-count 40
//!   convex-path -i latent.npy -o out/ --labels y.npy --label-names genres.txt -v

use clap::Parser;
use convex_clustering_rs::{
    lambda_logspace, ClusterPath, ClusteringError, ConvexClusterConfig, ConvexClustering,
};
use log::{info, warn, LevelFilter};
use ndarray::{Array1, Array2};
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// convex-path - convex clustering regularization path
///
/// Sweeps λ over a log-spaced grid, warm-starting each step, and extracts
/// cluster labels from the largest λ.
#[derive(Parser, Debug)]
#[command(name = "convex-path")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Normalized feature matrix (.npy, 2-D, f64 or f32)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Directory for u_path.npy, labels.npy and lambdas.npy
    #[arg(short, long, value_name = "DIR")]
    output_dir: PathBuf,

    /// True labels (.npy, 1-D, i64), only used for the cluster composition report
    #[arg(long, value_name = "FILE")]
    labels: Option<PathBuf>,

    /// Label names, one per line; line i decodes label id i
    #[arg(long, value_name = "FILE", requires = "labels")]
    label_names: Option<PathBuf>,

    /// Number of nearest neighbors in the fusion graph
    #[arg(short, long, default_value_t = 50)]
    k: usize,

    /// Number of λ values in the sweep
    #[arg(long, default_value_t = 30)]
    lambda_count: usize,

    /// log10 of the smallest λ
    #[arg(long, default_value_t = -2.0, allow_negative_numbers = true)]
    lambda_min_exp: f64,

    /// log10 of the largest λ
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    lambda_max_exp: f64,

    /// Iteration cap per λ
    #[arg(long, default_value_t = 2_000)]
    max_iters: usize,

    /// Convergence tolerance on the largest center movement
    #[arg(long, default_value_t = 1e-6)]
    tol: f64,

    /// Distance under which two centers count as the same cluster
    #[arg(long, default_value_t = 1e-3)]
    fusion_tol: f64,

    /// Edge kernel length scale (default: mean k-NN distance)
    #[arg(long)]
    kernel_scale: Option<f64>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let data = read_features(&cli.input)?;
    info!(
        "Loaded {}: {} samples x {} features",
        cli.input.display(),
        data.nrows(),
        data.ncols()
    );

    let true_labels = cli.labels.as_deref().map(read_labels).transpose()?;
    if let Some(labels) = &true_labels {
        if labels.len() != data.nrows() {
            return Err(ClusteringError::InvalidDimensions(format!(
                "{} true labels for {} samples",
                labels.len(),
                data.nrows()
            ))
            .into());
        }
    }
    let label_names = cli
        .label_names
        .as_deref()
        .map(read_label_names)
        .transpose()?
        .unwrap_or_default();

    let config = ConvexClusterConfig::new(cli.k)
        .with_max_iters(cli.max_iters)
        .with_tol(cli.tol)
        .with_fusion_tol(cli.fusion_tol)
        .with_kernel_scale(cli.kernel_scale);
    let lambdas = lambda_logspace(cli.lambda_min_exp, cli.lambda_max_exp, cli.lambda_count);

    info!(
        "Running convex clustering with k={}, {} λ values in [1e{}, 1e{}]",
        cli.k, cli.lambda_count, cli.lambda_min_exp, cli.lambda_max_exp
    );
    let engine = ConvexClustering::with_config(config);
    let path = engine.fit_path(&data.view(), &lambdas)?;

    report_path(&path)?;
    if let Some(labels) = &true_labels {
        report_composition(path.labels(), labels, &label_names);
    }

    write_outputs(&cli.output_dir, &path)?;
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Read a 2-D feature matrix, accepting f32 files by widening them
fn read_features(path: &Path) -> Result<Array2<f64>, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    match Array2::<f64>::read_npy(reader) {
        Ok(data) => Ok(data),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            let reader = BufReader::new(File::open(path)?);
            let data = Array2::<f32>::read_npy(reader)?;
            Ok(data.mapv(f64::from))
        }
        Err(err) => Err(err.into()),
    }
}

fn read_labels(path: &Path) -> Result<Array1<i64>, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(Array1::<i64>::read_npy(reader)?)
}

fn read_label_names(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(|line| line.trim().to_string())
        .collect())
}

fn report_path(path: &ClusterPath) -> Result<(), ClusteringError> {
    let counts = path.cluster_counts()?;
    for (lambda, count) in path.lambdas().iter().zip(counts.iter()) {
        info!("  λ = {:>10.6}: {} clusters", lambda, count);
    }

    let non_converged = path.non_converged_lambdas();
    if !non_converged.is_empty() {
        warn!(
            "{} λ values hit the iteration cap: {:?}",
            non_converged.len(),
            non_converged
        );
    }
    info!(
        "Final partition: {} clusters over {} samples ({} graph components)",
        path.n_clusters(),
        path.labels().len(),
        path.graph().n_components()
    );
    Ok(())
}

/// Log which true labels make up each predicted cluster
fn report_composition(predicted: &Array1<i64>, truth: &Array1<i64>, names: &[String]) {
    let decode = |id: i64| -> String {
        usize::try_from(id)
            .ok()
            .and_then(|i| names.get(i))
            .cloned()
            .unwrap_or_else(|| id.to_string())
    };

    let mut composition: BTreeMap<i64, BTreeMap<i64, usize>> = BTreeMap::new();
    for (&cluster, &label) in predicted.iter().zip(truth.iter()) {
        *composition
            .entry(cluster)
            .or_default()
            .entry(label)
            .or_default() += 1;
    }

    info!("Cluster composition by true label:");
    for (cluster, members) in &composition {
        let total: usize = members.values().sum();
        let parts: Vec<String> = members
            .iter()
            .map(|(&label, count)| format!("{}: {}", decode(label), count))
            .collect();
        info!("  cluster {} ({} samples): {}", cluster, total, parts.join(", "));
    }
}

fn write_outputs(dir: &Path, path: &ClusterPath) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;

    let u_path_file = dir.join("u_path.npy");
    path.to_array3().write_npy(File::create(&u_path_file)?)?;

    let labels_file = dir.join("labels.npy");
    path.labels().write_npy(File::create(&labels_file)?)?;

    let lambdas_file = dir.join("lambdas.npy");
    Array1::from(path.lambdas()).write_npy(File::create(&lambdas_file)?)?;

    info!(
        "Saved {}, {} and {}",
        u_path_file.display(),
        labels_file.display(),
        lambdas_file.display()
    );
    Ok(())
}
