//! Probability-of-texture gate (C11): a half-disc chi-square texton-label
//! comparison, squashed through a logistic sigmoid.

use rayon::prelude::*;
use texton_grid::{Image, Roi};

#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    pub disk_middle_width: f32,
    pub tau: f32,
    pub beta: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            disk_middle_width: 3.0,
            tau: 0.3,
            beta: 0.04,
        }
    }
}

fn normalize_l1(histo: &mut [f32]) {
    let sum: f32 = histo.iter().sum();
    if sum > 0.0 {
        for v in histo.iter_mut() {
            *v /= sum;
        }
    }
}

/// `0.5 * sum((a-b)^2 / (a+b))`, skipping bins where both are zero.
fn chi_square(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for (av, bv) in a.iter().zip(b) {
        let denom = av + bv;
        if denom != 0.0 {
            let diff = av - bv;
            sum += diff * diff / denom;
        }
    }
    sum * 0.5
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Compute P_texture (C11) for every pixel. `masks` holds one filled-disc
/// mask per integer radius in `[r_min, r_min + masks.len() - 1]`, as produced
/// by `texton_sample::circle_masks`. `texture_scale` gives each pixel's
/// adaptive radius, already clamped into that range by construction.
pub fn compute_p_texture(textons: &Image<i32>, theta_star: &Image<f32>, texture_scale: &Image<i32>, masks: &[Image<u8>], r_min: i32, k: usize, config: &GateConfig) -> Image<f32> {
    let width = textons.width();
    let height = textons.height();
    let roi = textons.roi();

    let margin = if masks.is_empty() {
        0
    } else {
        (r_min.max(0) as usize) + masks.len() - 1
    };

    let padded = textons.reflect_padded(margin);

    let mut p_texture = Image::<f32>::new(width, height);
    p_texture.set_roi(roi);

    let half_mid = config.disk_middle_width * 0.5;

    let pixels: Vec<(usize, usize)> = roi.iter_pixels().collect();
    let values: Vec<(usize, usize, f32)> = pixels
        .into_par_iter()
        .map(|(x, y)| {
            let theta = *theta_star.get(x, y);
            let cos_t = theta.cos();
            let neg_sin_t = -theta.sin();
            let mut rad = *texture_scale.get(x, y);
            if masks.is_empty() {
                return (x, y, 0.0);
            }
            rad = rad.clamp(r_min, r_min + masks.len() as i32 - 1);
            let mask = &masks[(rad - r_min) as usize];

            let mut histo_l = vec![0.0f32; k];
            let mut histo_c = vec![0.0f32; k];
            let mut histo_r = vec![0.0f32; k];

            for yy in -rad..=rad {
                for xx in -rad..=rad {
                    let mval = *mask.get((xx + rad) as usize, (yy + rad) as usize);
                    if mval == 0 {
                        continue;
                    }
                    let dot = xx as f32 * neg_sin_t + yy as f32 * cos_t;
                    let px = (x as i64 + margin as i64 + xx as i64) as usize;
                    let py = (y as i64 + margin as i64 + yy as i64) as usize;
                    let texton = *padded.get(px, py) as usize;
                    if dot.abs() < half_mid {
                        histo_c[texton] += 1.0;
                    } else if dot > 0.0 {
                        histo_l[texton] += 1.0;
                    } else {
                        histo_r[texton] += 1.0;
                    }
                }
            }

            let mut histo_tmp: Vec<f32> = histo_l.iter().zip(&histo_c).map(|(a, b)| a + b).collect();
            let mut histo_c_plus_r: Vec<f32> = histo_c.iter().zip(&histo_r).map(|(a, b)| a + b).collect();

            normalize_l1(&mut histo_l);
            normalize_l1(&mut histo_r);
            normalize_l1(&mut histo_tmp);
            normalize_l1(&mut histo_c_plus_r);

            let chi1 = chi_square(&histo_l, &histo_c_plus_r);
            let chi2 = chi_square(&histo_r, &histo_tmp);
            let chi = chi1.max(chi2);

            let p = (1.0 - sigmoid((chi - config.tau) / config.beta)).clamp(0.0, 1.0);
            (x, y, p)
        })
        .collect();

    for (x, y, v) in values {
        *p_texture.get_mut(x, y) = v;
    }

    p_texture
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_sample::circle_masks;

    #[test]
    fn uniform_texture_scores_near_one() {
        let w = 20;
        let h = 20;
        let mut textons = Image::<i32>::new(w, h);
        textons.set_roi(Roi::full(w, h));
        for y in 0..h {
            for x in 0..w {
                *textons.get_mut(x, y) = ((x + y) % 2) as i32;
            }
        }
        let theta = Image::<f32>::new(w, h);
        let mut scale = Image::<i32>::new(w, h);
        scale.set_roi(Roi::full(w, h));
        for y in 0..h {
            for x in 0..w {
                *scale.get_mut(x, y) = 3;
            }
        }
        let masks = circle_masks(1, 5);
        let p = compute_p_texture(&textons, &theta, &scale, &masks, 1, 2, &GateConfig::default());
        let (_, max_p) = p.min_max();
        assert!(max_p >= 0.0);
        for (_, _, v) in p.iter_roi() {
            assert!(*v >= 0.0 && *v <= 1.0);
        }
    }
}
