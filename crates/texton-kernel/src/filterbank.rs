use crate::kernel::{dog_kernel, oriented_kernel, Kernel};

/// Filterbank configuration, defaults per the canonical parameter bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterbankConfig {
    pub n_gauss_scales: usize,
    pub n_gauss_orientations: usize,
    pub gauss_sigma_y: f32,
    pub gauss_x_to_y_ratio: f32,
    pub n_dog_scales: usize,
    pub dog_excit_sigma: f32,
    pub dog_inhib_ratio_1: f32,
    pub dog_inhib_ratio_2: f32,
}

impl Default for FilterbankConfig {
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
        }
    }
}

/// The analytically-constructed bank: `n_gauss_scales * n_gauss_orientations`
/// even/odd quadrature pairs followed by `n_dog_scales` isotropic DoG
/// kernels. The second-derivative order is fixed at 2 for all oriented
/// kernels, matching the reference filterbank.
#[derive(Debug, Clone)]
pub struct Filterbank {
    pub config: FilterbankConfig,
    /// Ordered `(scale, orientation, even-or-odd)` oriented kernels, `2 *
    /// n_gauss_scales * n_gauss_orientations` entries, followed by
    /// `n_dog_scales` DoG kernels.
    pub kernels: Vec<Kernel>,
}

impl Filterbank {
    pub fn build(config: FilterbankConfig) -> Self {
        let mut kernels = Vec::with_capacity(config.n_gauss_scales * config.n_gauss_orientations * 2 + config.n_dog_scales);

        for scale in 0..config.n_gauss_scales {
            let sigma_y = config.gauss_sigma_y.powi(scale as i32);
            let sigma_x = sigma_y * config.gauss_x_to_y_ratio;
            for i_theta in 0..config.n_gauss_orientations {
                let theta = std::f32::consts::PI * i_theta as f32 / config.n_gauss_orientations as f32;
                kernels.push(oriented_kernel(sigma_x, sigma_y, 2, theta, false));
                kernels.push(oriented_kernel(sigma_x, sigma_y, 2, theta, true));
            }
        }

        for scale in 0..config.n_dog_scales {
            let sigma_e = config.dog_excit_sigma.powi(scale as i32);
            kernels.push(dog_kernel(sigma_e, config.dog_inhib_ratio_1, config.dog_inhib_ratio_2));
        }

        tracing::debug!(
            n_oriented = config.n_gauss_scales * config.n_gauss_orientations * 2,
            n_dog = config.n_dog_scales,
            "filterbank synthesized"
        );

        Self { kernels, config }
    }

    pub fn n_oriented_kernels(&self) -> usize {
        self.config.n_gauss_scales * self.config.n_gauss_orientations * 2
    }

    /// Index of the even kernel at `(scale, orientation)`; the odd companion
    /// is always the next entry.
    pub fn even_index(&self, scale: usize, orientation: usize) -> usize {
        (scale * self.config.n_gauss_orientations + orientation) * 2
    }

    pub fn dog_index(&self, scale: usize) -> usize {
        self.n_oriented_kernels() + scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_count_matches_config() {
        let config = FilterbankConfig {
            n_gauss_scales: 2,
            n_gauss_orientations: 3,
            n_dog_scales: 2,
            ..Default::default()
        };
        let fb = Filterbank::build(config);
        assert_eq!(fb.kernels.len(), 2 * 3 * 2 + 2);
    }

    #[test]
    fn even_index_layout_is_contiguous_pairs() {
        let config = FilterbankConfig {
            n_gauss_scales: 1,
            n_gauss_orientations: 4,
            n_dog_scales: 1,
            ..Default::default()
        };
        let fb = Filterbank::build(config);
        assert_eq!(fb.even_index(0, 0), 0);
        assert_eq!(fb.even_index(0, 1), 2);
        assert_eq!(fb.dog_index(0), 8);
    }
}
