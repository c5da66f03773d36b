use rand::seq::SliceRandom;
use rand::Rng;
use texton_grid::Image;

use crate::circle::circumference_offsets;

/// How many samples to place on each circumference ring between the dense
/// radius and the max radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityLaw {
    /// Every ring gets the same sample count as the ring just past the
    /// dense radius.
    Uniform,
    /// A ring's sample count falls off as `dense_circ / (radius - dense_rad)`.
    InverseRadius,
    /// Distribute whatever samples remain evenly over the remaining rings,
    /// rounding up so the remainder is absorbed by the innermost rings.
    Default,
}

/// Sparse sampling pattern (C12): solid inside `dense_rad`, then a budget of
/// `n_samples` non-zero pixels scattered across rings out to `max_rad`
/// according to `density`.
pub fn sparse_pattern(dense_rad: usize, max_rad: usize, n_samples: usize, density: DensityLaw, half: bool, center_on: bool, rng: &mut impl Rng) -> Image<u8> {
    let width = 2 * max_rad + 1;
    let mut img = Image::<u8>::new(width, width);
    let center = max_rad as i64;

    let mut c_samples = 0usize;
    let dense_f = (dense_rad + 1) as f32;
    for y in 0..width {
        for x in 0..width {
            let dx = x as i64 - center;
            let dy = y as i64 - center;
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist < dense_f {
                *img.get_mut(x, y) = 255;
                c_samples += 1;
            }
        }
    }

    let dense_circ = circumference_offsets(dense_rad as i64).len();

    for rad in (dense_rad + 1)..=max_rad {
        let ring = circumference_offsets(rad as i64);
        let n_circ = ring.len();

        let n_target = match density {
            DensityLaw::Uniform => dense_circ,
            DensityLaw::InverseRadius => dense_circ / (rad - dense_rad),
            DensityLaw::Default => {
                let samples_left = n_samples.saturating_sub(c_samples);
                let radii_left = max_rad - rad + 1;
                let mut per_rad = samples_left / radii_left;
                let remainder = samples_left - per_rad * radii_left;
                if remainder != 0 {
                    per_rad += 1;
                }
                per_rad
            }
        };

        let mut indices: Vec<usize> = (0..n_circ).collect();
        let take = if n_target >= n_circ {
            n_circ
        } else {
            indices.shuffle(rng);
            n_target
        };
        for &i in &indices[..take] {
            let (dx, dy) = ring[i];
            let x = (center + dx) as usize;
            let y = (center + dy) as usize;
            *img.get_mut(x, y) = 255;
        }
        c_samples += take;
    }

    let half_width = width / 2;
    let center_flat = half_width * width + half_width;
    if half {
        for i in 0..center_flat {
            img.buf_mut()[i] = 0;
        }
    }
    if !center_on {
        img.buf_mut()[center_flat] = 0;
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg64;

    #[test]
    fn dense_core_is_fully_set() {
        let mut rng = Pcg64::new(1, 1);
        let img = sparse_pattern(1, 4, 20, DensityLaw::Default, false, true, &mut rng);
        let center = 4;
        assert_eq!(*img.get(center, center), 255);
        assert_eq!(*img.get(center + 1, center), 255);
    }

    #[test]
    fn center_pixel_can_be_forced_off() {
        let mut rng = Pcg64::new(2, 2);
        let img = sparse_pattern(1, 4, 20, DensityLaw::Default, false, false, &mut rng);
        let center = 4;
        assert_eq!(*img.get(center, center), 0);
    }

    #[test]
    fn half_flag_zeroes_leading_rows() {
        let mut rng = Pcg64::new(3, 3);
        let img = sparse_pattern(1, 4, 20, DensityLaw::Default, true, true, &mut rng);
        assert_eq!(*img.get(0, 0), 0);
    }
}
