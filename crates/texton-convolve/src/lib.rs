//! Dense 2-D convolution of a float image against a [`Kernel`], operating on
//! a reflection-padded source image so radial neighborhoods never read
//! outside the array.

use rayon::prelude::*;
use texton_grid::Image;
use texton_kernel::Kernel;

/// Margin (in pixels, per side) `input` must have beyond its ROI for a
/// kernel of the given odd side length.
pub fn required_margin(kernel_side: usize) -> usize {
    kernel_side / 2
}

/// Convolve `input`'s ROI against `kernel`, writing into an output image of
/// the same ROI. `input` must already have been reflection-padded with a
/// margin at least [`required_margin`]`(kernel.side())` on every side;
/// violating this precondition is a bug (checked with `debug_assert!`).
pub fn convolve(input: &Image<f32>, kernel: &Kernel) -> Image<f32> {
    let side = kernel.side();
    let half = side / 2;
    let roi = input.roi();

    debug_assert!(
        roi.start_x >= half
            && roi.start_y >= half
            && input.width() - roi.end_x >= side - half - 1
            && input.height() - roi.end_y >= side - half - 1,
        "input ROI margin is too small for a kernel of side {side}"
    );

    let mut output = Image::<f32>::new(input.width(), input.height());
    output.set_roi(roi);

    let kernel_begin = -(half as i64);
    let width = input.width();
    let input_buf = input.buf();
    let kernel_buf = kernel.image.buf();

    let rows: Vec<(usize, Vec<f32>)> = (roi.start_y..roi.end_y)
        .into_par_iter()
        .map(|y| {
            let mut row = vec![0.0f32; roi.width()];
            for (xi, x) in (roi.start_x..roi.end_x).enumerate() {
                let mut acc = 0.0f32;
                for ky in 0..side {
                    let iy = y as i64 + kernel_begin + ky as i64;
                    let flipped_ky = side - 1 - ky;
                    for kx in 0..side {
                        let ix = x as i64 + kernel_begin + kx as i64;
                        let flipped_kx = side - 1 - kx;
                        let kv = kernel_buf[flipped_ky * side + flipped_kx];
                        let iv = input_buf[iy as usize * width + ix as usize];
                        acc += kv * iv;
                    }
                }
                row[xi] = acc;
            }
            (y, row)
        })
        .collect();

    for (y, row) in rows {
        for (xi, x) in (roi.start_x..roi.end_x).enumerate() {
            *output.get_mut(x, y) = row[xi];
        }
    }

    output
}

/// Convolve against every kernel in a filterbank, returning one output image
/// per kernel in the same order.
pub fn convolve_bank(input: &Image<f32>, kernels: &[Kernel]) -> Vec<Image<f32>> {
    kernels
        .iter()
        .map(|k| {
            let margin = required_margin(k.side());
            let mut padded = input.clone();
            padded.reflect_to_roi(margin);
            convolve(&padded, k)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_kernel::oriented_kernel;

    #[test]
    fn convolving_all_black_image_is_zero() {
        let mut input = Image::<f32>::new(20, 20);
        let kernel = oriented_kernel(1.41, 4.23, 2, 0.0, false);
        input.reflect_to_roi(required_margin(kernel.side()));
        let out = convolve(&input, &kernel);
        for (_, _, v) in out.iter_roi() {
            assert!(v.abs() < 1e-6);
        }
    }

    #[test]
    fn convolving_constant_image_with_zero_mean_kernel_is_near_zero() {
        let mut input = Image::<f32>::filled(20, 20, 5.0);
        let kernel = oriented_kernel(1.41, 4.23, 2, 0.3, false);
        input.reflect_to_roi(required_margin(kernel.side()));
        let out = convolve(&input, &kernel);
        for (_, _, v) in out.iter_roi() {
            assert!(v.abs() < 1e-3, "expected near zero, got {v}");
        }
    }
}
