use texton_cluster::InitStrategy;
use texton_sample::DensityLaw;

/// The full parameter bundle for one pipeline run. Field names and defaults
/// mirror the canonical configuration knobs of the reference system this
/// pipeline reimplements.
#[derive(Debug, Clone)]
pub struct Params {
    pub n_gauss_scales: usize,
    pub n_gauss_orientations: usize,
    pub gauss_sigma_y: f32,
    pub gauss_x_to_y_ratio: f32,
    pub n_dog_scales: usize,
    pub dog_excit_sigma: f32,
    pub dog_inhib_ratio_1: f32,
    pub dog_inhib_ratio_2: f32,

    pub n_cropped_pixels: usize,

    pub weber_const: f32,

    pub kmeans_k: usize,
    pub kmeans_iters: usize,
    pub kmeans_init: InitStrategy,
    pub kmeans_prune: bool,
    pub kmeans_stopping_factor: f32,
    pub kmeans_stopping_k: usize,
    pub kmeans_majority_cleanup: bool,

    pub texture_min_dist: f32,
    pub texture_max_dist: f32,
    pub texture_alpha: f32,

    pub texture_middle_band: f32,
    pub texture_tau: f32,
    pub texture_beta: f32,

    pub color_bins_a: usize,
    pub color_bins_b: usize,
    pub color_bins_c: usize,
    pub color_soft_sigma: f32,
    pub color_fast_accumulate: bool,

    pub edgel_length: f32,
    pub intervening_contour_sigma: f32,

    pub sparse_dense_radius: usize,
    pub sparse_max_radius: usize,
    pub sparse_n_samples: usize,
    pub sparse_density: DensityLaw,
    pub sparse_half: bool,
    pub sparse_center_on: bool,

    pub low_energy_fraction: f32,
    pub seed: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            n_gauss_scales: 4,
            n_gauss_orientations: 12,
            gauss_sigma_y: 1.41,
            gauss_x_to_y_ratio: 3.0,
            n_dog_scales: 4,
            dog_excit_sigma: 1.41,
            dog_inhib_ratio_1: 0.62,
            dog_inhib_ratio_2: 1.6,

            n_cropped_pixels: 10,

            weber_const: 0.01,

            kmeans_k: 36,
            kmeans_iters: 30,
            kmeans_init: InitStrategy::RandomPoints,
            kmeans_prune: false,
            kmeans_stopping_factor: 2.0,
            kmeans_stopping_k: 1,
            kmeans_majority_cleanup: true,

            texture_min_dist: 3.0,
            texture_max_dist: 0.1,
            texture_alpha: 1.5,

            texture_middle_band: 3.0,
            texture_tau: 0.3,
            texture_beta: 0.04,

            color_bins_a: 8,
            color_bins_b: 8,
            color_bins_c: 8,
            color_soft_sigma: 1.8,
            color_fast_accumulate: true,

            edgel_length: 2.0,
            intervening_contour_sigma: 0.016,

            sparse_dense_radius: 10,
            sparse_max_radius: 30,
            sparse_n_samples: 400,
            sparse_density: DensityLaw::Default,
            sparse_half: false,
            sparse_center_on: true,

            low_energy_fraction: 0.001,
            seed: 0x7e57_ed42,
        }
    }
}
