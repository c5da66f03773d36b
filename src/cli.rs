use std::path::PathBuf;

use clap::Parser;

/// Compute adaptively-scaled texton and color histogram images from an
/// input raster, plus the intermediate texture-scale, probability-of-
/// texture, dual-lattice, and sparse-pattern maps.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Input image path (any format the `image` crate can decode).
    pub input: PathBuf,

    /// Directory visualizations and histogram files are written to.
    /// Defaults to the input file's directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print debug information; can be repeated for trace-level output.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Do not print logs to console.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Force grayscale processing even if the input has color channels.
    #[arg(long)]
    pub grayscale: bool,

    /// Number of K-means texton clusters.
    #[arg(long, default_value_t = 36)]
    pub kmeans_k: usize,

    /// Hard cap on K-means iterations per convergence loop.
    #[arg(long, default_value_t = 30)]
    pub kmeans_iters: usize,

    /// Prune over-clustered K texton labels after convergence.
    #[arg(long)]
    pub kmeans_prune: bool,

    /// Outer margin trimmed from the input before analysis.
    #[arg(long, default_value_t = 10)]
    pub n_cropped_pixels: usize,

    /// PRNG seed for K-means initialization and sparse pattern synthesis.
    #[arg(long, default_value_t = 0x7e57_ed42)]
    pub seed: u64,
}
