use rand_pcg::Pcg64;

use texton_cluster::{KMeansConfig, PointSet, PruneConfig};
use texton_contour::{combine_scales, localize_scale, orientation_energy, suppress_low_energy, EnergyMode, ScaleContour};
use texton_gate::GateConfig;
use texton_grid::{Image, ImageSequence, Roi};
use texton_histogram::HistogramImage;
use texton_kernel::{Filterbank, FilterbankConfig};
use texton_lattice::DualLattice;

use crate::error::{Error, Result};
use crate::input::InputImage;
use crate::params::Params;

/// Everything a pipeline run produces. `textons`, `texture_scale`, and
/// `p_texture` are exposed alongside the two histogram images and the dual
/// lattice because downstream grouping code and tests both want access to
/// the intermediate per-pixel maps, not just the final histograms.
#[derive(Debug)]
pub struct PipelineOutput {
    pub texton_histogram: HistogramImage,
    pub color_histogram: HistogramImage,
    pub dual_lattice: DualLattice,
    pub sparse_pattern: Image<u8>,
    pub textons: Image<i32>,
    pub texture_scale: Image<i32>,
    pub p_texture: Image<f32>,
    pub r_min: i32,
    pub r_max: i32,
}

fn crop_roi(width: usize, height: usize, margin: usize) -> Result<Roi> {
    if 2 * margin >= width || 2 * margin >= height {
        return Err(Error::DegenerateInput(format!(
            "image {width}x{height} is too small for a crop margin of {margin} pixels"
        )));
    }
    Ok(Roi {
        start_x: margin,
        end_x: width - margin,
        start_y: margin,
        end_y: height - margin,
    })
}

/// Runs the full pipeline end to end: filterbank construction, orientation
/// energy and sub-pixel contour localization, Weber-normalized K-means
/// texton clustering, texture-scale estimation, the probability-of-texture
/// gate, the texton and color histogram images, the dual-lattice
/// intervening-contour map, and the sparse sampling pattern.
pub fn run(input: &InputImage, params: &Params) -> Result<PipelineOutput> {
    let width = input.width();
    let height = input.height();
    if width == 0 || height == 0 {
        return Err(Error::InvalidArgument("image has a zero dimension".to_string()));
    }

    let (mut l, mut a, mut b, is_color) = match input {
        InputImage::Gray { data, .. } => {
            if data.len() != width * height {
                return Err(Error::InvalidArgument(format!(
                    "grayscale buffer length {} does not match {width}x{height}",
                    data.len()
                )));
            }
            let l = texton_color::gray_to_luminance(width, height, data);
            (l, Image::<f32>::new(width, height), Image::<f32>::new(width, height), false)
        }
        InputImage::Rgb { data, .. } => {
            if data.len() != width * height * 3 {
                return Err(Error::InvalidArgument(format!(
                    "RGB buffer length {} does not match {width}x{height}x3",
                    data.len()
                )));
            }
            let [l, a, b] = texton_color::rgb_to_lab(width, height, data, texton_color::rgb_to_default_gamma());
            (l, a, b, true)
        }
    };

    let roi = crop_roi(width, height, params.n_cropped_pixels)?;
    l.set_roi(roi);
    a.set_roi(roi);
    b.set_roi(roi);

    tracing::info!(width, height, is_color, margin = params.n_cropped_pixels, "pipeline started");

    let fb_config = FilterbankConfig {
        n_gauss_scales: params.n_gauss_scales,
        n_gauss_orientations: params.n_gauss_orientations,
        gauss_sigma_y: params.gauss_sigma_y,
        gauss_x_to_y_ratio: params.gauss_x_to_y_ratio,
        n_dog_scales: params.n_dog_scales,
        dog_excit_sigma: params.dog_excit_sigma,
        dog_inhib_ratio_1: params.dog_inhib_ratio_1,
        dog_inhib_ratio_2: params.dog_inhib_ratio_2,
    };
    let fb = Filterbank::build(fb_config);

    let l_responses = texton_convolve::convolve_bank(&l, &fb.kernels);
    let mode = EnergyMode::LuminanceOnly;
    let energy = orientation_energy(&fb, &l_responses, None, mode);

    let n_scales = params.n_gauss_scales;
    let n_orientations = params.n_gauss_orientations;
    let mut scale_contours: Vec<ScaleContour> = Vec::with_capacity(n_scales);
    for s in 0..n_scales {
        let mut seq = ImageSequence::with_capacity(n_orientations);
        for o in 0..n_orientations {
            seq.push(energy.get(s * n_orientations + o).clone());
        }
        let mut contour = localize_scale(&seq, n_orientations);
        suppress_low_energy(&mut contour, params.low_energy_fraction);
        scale_contours.push(contour);
    }
    let combined = combine_scales(&scale_contours);

    let mut stack: Vec<Image<f32>> = Vec::with_capacity(n_scales * n_orientations + params.n_dog_scales);
    for s in 0..n_scales {
        for o in 0..n_orientations {
            stack.push(l_responses[fb.even_index(s, o)].clone());
        }
    }
    for s in 0..params.n_dog_scales {
        stack.push(l_responses[fb.dog_index(s)].clone());
    }
    texton_cluster::weber_normalize(&mut stack, params.weber_const);

    let mut rng = Pcg64::new(params.seed.into(), 0xda3e_39cb_94b0_95bd);

    let pixels: Vec<(usize, usize)> = roi.iter_pixels().collect();
    let n_dims = stack.len();
    let mut points = PointSet::new(pixels.len(), n_dims);
    for (p, &(x, y)) in pixels.iter().enumerate() {
        for (d, channel) in stack.iter().enumerate() {
            points.set(d, p, *channel.get(x, y));
        }
    }

    let kmeans_config = KMeansConfig {
        k: params.kmeans_k,
        max_iters: params.kmeans_iters,
        init: params.kmeans_init.clone(),
        prune: params.kmeans_prune.then_some(PruneConfig {
            stopping_factor: params.kmeans_stopping_factor,
            stopping_k: params.kmeans_stopping_k,
        }),
        reseed_empty: true,
        majority_cleanup: params.kmeans_majority_cleanup.then_some((roi.width(), roi.height())),
    };
    let kmeans_result = texton_cluster::run(&points, &kmeans_config, &mut rng);
    let k = kmeans_result.k;

    let mut textons = Image::<i32>::new(width, height);
    textons.set_roi(roi);
    for (p, &(x, y)) in pixels.iter().enumerate() {
        *textons.get_mut(x, y) = kmeans_result.assignments[p] as i32;
    }

    let (texture_scale, r_min, r_max) = texton_scale::compute_texture_scale(&textons, k, params.texture_min_dist, params.texture_max_dist, params.texture_alpha);

    let masks = texton_sample::circle_masks(r_min.max(0) as usize, r_max.max(0) as usize);

    let gate_config = GateConfig {
        disk_middle_width: params.texture_middle_band,
        tau: params.texture_tau,
        beta: params.texture_beta,
    };
    let p_texture = texton_gate::compute_p_texture(&textons, &combined.theta, &texture_scale, &masks, r_min, k, &gate_config);

    let texton_histogram = texton_histogram::compute_texton_histogram(&textons, &p_texture, &texture_scale, &masks, r_min, k);

    let color_channels: Vec<Image<f32>> = if is_color { vec![l.clone(), a.clone(), b.clone()] } else { vec![l.clone()] };
    let color_bins: Vec<usize> = if is_color {
        vec![params.color_bins_a, params.color_bins_b, params.color_bins_c]
    } else {
        vec![params.color_bins_a]
    };
    let color_histogram = texton_histogram::compute_color_histogram(&color_channels, &texture_scale, &masks, r_min, &color_bins, params.color_soft_sigma, params.color_fast_accumulate);

    let dual_lattice = texton_lattice::compute_dual_lattice(&scale_contours, &p_texture, params.edgel_length, params.intervening_contour_sigma);

    let sparse_pattern = texton_sample::sparse_pattern(
        params.sparse_dense_radius,
        params.sparse_max_radius,
        params.sparse_n_samples,
        params.sparse_density,
        params.sparse_half,
        params.sparse_center_on,
        &mut rng,
    );

    tracing::info!(k, r_min, r_max, "pipeline finished");

    Ok(PipelineOutput {
        texton_histogram,
        color_histogram,
        dual_lattice,
        sparse_pattern,
        textons,
        texture_scale,
        p_texture,
        r_min,
        r_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> Params {
        Params {
            n_gauss_scales: 2,
            n_gauss_orientations: 4,
            n_dog_scales: 2,
            n_cropped_pixels: 4,
            kmeans_k: 4,
            kmeans_iters: 10,
            sparse_dense_radius: 2,
            sparse_max_radius: 5,
            sparse_n_samples: 20,
            ..Params::default()
        }
    }

    fn checkerboard(width: usize, height: usize, period: usize) -> InputImage {
        let mut data = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                data[y * width + x] = if ((x / period) + (y / period)) % 2 == 0 { 40 } else { 220 };
            }
        }
        InputImage::Gray { width, height, data }
    }

    #[test]
    fn grayscale_checkerboard_runs_end_to_end() {
        let input = checkerboard(32, 32, 4);
        let output = run(&input, &small_params()).expect("pipeline should succeed on a well-formed image");
        assert_eq!(output.textons.width(), 32);
        assert_eq!(output.textons.height(), 32);
        assert!(output.r_max >= output.r_min);
        assert_eq!(output.texton_histogram.width(), 32);
        assert_eq!(output.color_histogram.axes().len(), 1);
    }

    #[test]
    fn color_input_uses_three_axis_histogram() {
        let width = 28;
        let height = 28;
        let mut data = vec![0u8; width * height * 3];
        for y in 0..height {
            for x in 0..width {
                let base = (y * width + x) * 3;
                data[base] = ((x * 7) % 256) as u8;
                data[base + 1] = ((y * 5) % 256) as u8;
                data[base + 2] = 128;
            }
        }
        let input = InputImage::Rgb { width, height, data };
        let output = run(&input, &small_params()).expect("color pipeline should succeed");
        assert_eq!(output.color_histogram.axes().len(), 3);
    }

    #[test]
    fn image_smaller_than_crop_margin_is_degenerate() {
        let input = checkerboard(6, 6, 2);
        let err = run(&input, &small_params()).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput(_)));
    }

    #[test]
    fn mismatched_buffer_length_is_invalid_argument() {
        let input = InputImage::Gray {
            width: 10,
            height: 10,
            data: vec![0u8; 5],
        };
        let err = run(&input, &small_params()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
