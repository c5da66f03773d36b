use texton_grid::Image;

use crate::hilbert::hilbert_inplace;

/// An odd-side square kernel with zero mean and unit L1 norm.
#[derive(Debug, Clone)]
pub struct Kernel {
    pub image: Image<f32>,
    pub sigma_x: f32,
    pub sigma_y: f32,
    pub order_y: u8,
    pub theta: f32,
    pub is_hilbert: bool,
}

impl Kernel {
    pub fn side(&self) -> usize {
        self.image.width()
    }
}

/// Round `x` up to the next odd integer `>= 1`.
fn round_up_odd(x: f32) -> usize {
    let mut n = x.ceil().max(1.0) as i64;
    if n % 2 == 0 {
        n += 1;
    }
    n.max(1) as usize
}

/// Sample the separable, axis-aligned Gaussian-derivative kernel of the given
/// side into a fresh image: a zeroth-order Gaussian along x times a
/// `order_y`-th derivative Gaussian (optionally Hilbert-transformed) along y.
fn draw_no_rot(side: usize, sigma_x: f32, sigma_y: f32, order_y: u8, is_hilbert: bool) -> Image<f32> {
    let half = (side / 2) as i64;
    let norm = 1.0 / (sigma_x * sigma_y * std::f32::consts::TAU);
    let sigma_sqr_x = sigma_x * sigma_x;
    let sigma_sqr_y = sigma_y * sigma_y;
    let recip_two_sigma_sqr_x = 1.0 / (2.0 * sigma_sqr_x);
    let recip_two_sigma_sqr_y = 1.0 / (2.0 * sigma_sqr_y);
    let recip_sigma_sqr_y = 1.0 / sigma_sqr_y;
    let recip_sigma_fourth_y = 1.0 / (sigma_sqr_y * sigma_sqr_y);

    let mut y_profile = vec![0.0f32; side];
    for (i, y) in (-half..=half).enumerate() {
        let y = y as f32;
        let y_sqr = y * y;
        let mut fy = (-y_sqr * recip_two_sigma_sqr_y).exp();
        fy *= match order_y {
            0 => 1.0,
            1 => -y * recip_sigma_sqr_y,
            2 => recip_sigma_sqr_y * (y_sqr * recip_sigma_sqr_y - 1.0),
            3 => recip_sigma_fourth_y * y * (3.0 - y_sqr * recip_sigma_sqr_y),
            other => panic!("unsupported derivative order {other}"),
        };
        y_profile[i] = fy;
    }
    if is_hilbert {
        hilbert_inplace(&mut y_profile);
    }

    let mut image = Image::<f32>::new(side, side);
    for (iy, y) in (-half..=half).enumerate() {
        let _ = y;
        for (ix, x) in (-half..=half).enumerate() {
            let x = x as f32;
            let fx = (-x * x * recip_two_sigma_sqr_x).exp();
            *image.get_mut(ix, iy) = fx * y_profile[iy] * norm;
        }
    }
    image
}

/// Rotate `src` by `theta` radians (counter-clockwise) around its center
/// using bilinear interpolation, producing an image of the same size with
/// out-of-source samples treated as zero.
fn rotate_bilinear(src: &Image<f32>, theta: f32) -> Image<f32> {
    let side = src.width();
    debug_assert_eq!(src.height(), side);
    let center = (side as f32 - 1.0) / 2.0;
    let cos_t = theta.cos();
    let sin_t = theta.sin();

    let mut dest = Image::<f32>::new(side, side);
    for dy in 0..side {
        for dx in 0..side {
            let rx = dx as f32 - center;
            let ry = dy as f32 - center;
            // Inverse-map the destination pixel back into source space.
            let sx = rx * cos_t + ry * sin_t + center;
            let sy = -rx * sin_t + ry * cos_t + center;

            let x0 = sx.floor();
            let y0 = sy.floor();
            let fx = sx - x0;
            let fy = sy - y0;
            let x0 = x0 as i64;
            let y0 = y0 as i64;

            let sample = |xi: i64, yi: i64| -> f32 { *src.try_get(xi, yi).unwrap_or(&0.0) };

            let v00 = sample(x0, y0);
            let v10 = sample(x0 + 1, y0);
            let v01 = sample(x0, y0 + 1);
            let v11 = sample(x0 + 1, y0 + 1);

            let top = v00 * (1.0 - fx) + v10 * fx;
            let bot = v01 * (1.0 - fx) + v11 * fx;
            *dest.get_mut(dx, dy) = top * (1.0 - fy) + bot * fy;
        }
    }
    dest
}

fn zero_mean_l1_normalize(image: &mut Image<f32>) {
    let mean = image.mean();
    image.add_scalar(-mean);
    let l1 = image.sum_abs();
    if l1 > 0.0 {
        image.mul_scalar(1.0 / l1);
    }
}

/// Build an oriented Gaussian-derivative kernel, even (`order_y` in `0..=3`,
/// `is_hilbert = false`) or Hilbert-odd (`is_hilbert = true`), at orientation
/// `theta` (radians, `[0, pi)`).
pub fn oriented_kernel(sigma_x: f32, sigma_y: f32, order_y: u8, theta: f32, is_hilbert: bool) -> Kernel {
    let side = round_up_odd(4.2426 * sigma_x.max(sigma_y));

    let mut image = if theta != 0.0 {
        let big_side = round_up_odd(1.5 * side as f32);
        let big = draw_no_rot(big_side, sigma_x, sigma_y, order_y, is_hilbert);
        let rotated = rotate_bilinear(&big, -theta);
        let half_diff = (big_side - side) / 2;
        let mut cropped = Image::<f32>::new(side, side);
        rotated.extract(&mut cropped, -(half_diff as i64), -(half_diff as i64));
        cropped
    } else {
        draw_no_rot(side, sigma_x, sigma_y, order_y, is_hilbert)
    };

    zero_mean_l1_normalize(&mut image);

    Kernel {
        image,
        sigma_x,
        sigma_y,
        order_y,
        theta,
        is_hilbert,
    }
}

/// Build an isotropic Difference-of-Gaussians kernel: `2*G(sigma_e) -
/// G(sigma_e*r1) - G(sigma_e*r2)`, zero-meaned and L1-normalized.
pub fn dog_kernel(sigma_e: f32, ratio_1: f32, ratio_2: f32) -> Kernel {
    let sigma_i1 = sigma_e * ratio_1;
    let sigma_i2 = sigma_e * ratio_2;
    let side = round_up_odd(4.2426 * sigma_e.max(sigma_i1).max(sigma_i2));

    let g0 = draw_no_rot(side, sigma_e, sigma_e, 0, false);
    let g1 = draw_no_rot(side, sigma_i1, sigma_i1, 0, false);
    let g2 = draw_no_rot(side, sigma_i2, sigma_i2, 0, false);

    let mut image = Image::<f32>::new(side, side);
    for y in 0..side {
        for x in 0..side {
            *image.get_mut(x, y) = 2.0 * g0.get(x, y) - g1.get(x, y) - g2.get(x, y);
        }
    }
    zero_mean_l1_normalize(&mut image);

    Kernel {
        image,
        sigma_x: sigma_e,
        sigma_y: sigma_e,
        order_y: 0,
        theta: 0.0,
        is_hilbert: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oriented_kernel_is_zero_mean_and_unit_l1() {
        for &theta in &[0.0, std::f32::consts::FRAC_PI_4, 1.3] {
            let k = oriented_kernel(1.41, 4.23, 1, theta, false);
            let sum: f32 = k.image.buf().iter().sum();
            let l1: f32 = k.image.buf().iter().map(|v| v.abs()).sum();
            assert!(sum.abs() <= 1e-4, "theta={theta} sum={sum}");
            assert!((l1 - 1.0).abs() <= 1e-4, "theta={theta} l1={l1}");
        }
    }

    #[test]
    fn dog_kernel_is_zero_mean_and_unit_l1() {
        let k = dog_kernel(1.41, 0.62, 1.6);
        let sum: f32 = k.image.buf().iter().sum();
        let l1: f32 = k.image.buf().iter().map(|v| v.abs()).sum();
        assert!(sum.abs() <= 1e-4);
        assert!((l1 - 1.0).abs() <= 1e-4);
    }

    #[test]
    fn kernel_side_is_odd() {
        let k = oriented_kernel(1.41, 4.23, 0, 0.0, false);
        assert_eq!(k.side() % 2, 1);
    }
}
