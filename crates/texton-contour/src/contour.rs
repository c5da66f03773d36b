use rayon::prelude::*;
use texton_grid::{Image, ImageSequence};

use crate::parabola::{eval3, fit3, vertex3};

/// Per-scale contour record: sub-pixel localized maxima, orientation, and
/// goodness-of-fit residual.
#[derive(Debug, Clone)]
pub struct ScaleContour {
    pub is_max: Image<u8>,
    pub rho: Image<f32>,
    pub theta: Image<f32>,
    pub dx: Image<f32>,
    pub dy: Image<f32>,
    pub residual: Image<f32>,
}

/// The orientation triple around `i_star`, phase-unwrapped so the three
/// angles are strictly monotonic real numbers bracketing the fitted vertex.
fn unwrapped_triple(i_star: usize, n: usize) -> (usize, usize, usize, f32, f32, f32) {
    let n_f = n as f32;
    let mut i_prev = i_star as i64 - 1;
    let mut i_next = i_star as i64 + 1;

    let mut prev_theta = std::f32::consts::PI * i_prev as f32 / n_f;
    let mut theta = std::f32::consts::PI * i_star as f32 / n_f;
    let mut next_theta = std::f32::consts::PI * i_next as f32 / n_f;

    if i_prev < 0 {
        i_prev += n as i64;
        prev_theta += std::f32::consts::PI;
        theta += std::f32::consts::PI;
        next_theta += std::f32::consts::PI;
    }
    if i_next == n as i64 {
        i_next = 0;
    }

    (i_prev as usize, i_star, i_next as usize, prev_theta, theta, next_theta)
}

/// Stage A + Stage B of contour detection for a single scale's orientation
/// energy stack (`n_gauss_orientations` frames).
pub fn localize_scale(energy: &ImageSequence<f32>, n_orientations: usize) -> ScaleContour {
    let width = energy.get(0).width();
    let height = energy.get(0).height();
    let roi = energy.get(0).roi();

    let mut is_max = Image::<u8>::new(width, height);
    let mut rho = Image::<f32>::new(width, height);
    let mut theta = Image::<f32>::new(width, height);
    let mut dx = Image::<f32>::new(width, height);
    let mut dy = Image::<f32>::new(width, height);
    let mut residual = Image::<f32>::new(width, height);
    is_max.set_roi(roi);
    rho.set_roi(roi);
    theta.set_roi(roi);
    dx.set_roi(roi);
    dy.set_roi(roi);
    residual.set_roi(roi);

    let energy_at = |orientation: usize, x: i64, y: i64| -> f32 { *energy.get(orientation).try_get(x, y).unwrap_or(&0.0) };

    let pixels: Vec<(usize, usize)> = roi.iter_pixels().collect();
    let results: Vec<(usize, usize, Option<(f32, f32, f32, f32, f32)>)> = pixels
        .into_par_iter()
        .map(|(x, y)| {
            // Stage A: coarse argmax + parabolic orientation refinement.
            let mut i_star = 0usize;
            let mut best = f32::NEG_INFINITY;
            for i in 0..n_orientations {
                let e = *energy.get(i).get(x, y);
                if e > best {
                    best = e;
                    i_star = i;
                }
            }
            let rho_star = best;
            if rho_star <= 0.0 {
                return (x, y, None);
            }

            let (i_prev, i_center, i_next, t_prev, t_center, t_next) = unwrapped_triple(i_star, n_orientations);
            debug_assert!(t_prev < t_center && t_center < t_next);

            let e_prev_center = *energy.get(i_prev).get(x, y);
            let e_center = *energy.get(i_center).get(x, y);
            let e_next_center = *energy.get(i_next).get(x, y);
            let orient_coef = fit3([t_prev, t_center, t_next], [e_prev_center, e_center, e_next_center]);
            let theta_star = match vertex3(orient_coef) {
                Some(v) => v.clamp(t_prev, t_next),
                None => t_center,
            };

            // Stage B: sub-pixel spatial localization from a 3x3 spatial
            // neighborhood, each evaluated at the three orientations above.
            let cos_t = theta_star.cos();
            let sin_t = theta_star.sin();

            let mut ds = [0.0f32; 9];
            let mut ys = [0.0f32; 9];
            let mut idx = 0;
            for ry in -1i64..=1 {
                for rx in -1i64..=1 {
                    let nx = x as i64 + rx;
                    let ny = y as i64 + ry;
                    let e_prev = energy_at(i_prev, nx, ny);
                    let e_center = energy_at(i_center, nx, ny);
                    let e_next = energy_at(i_next, nx, ny);
                    let coef = fit3([t_prev, t_center, t_next], [e_prev, e_center, e_next]);
                    let y_i = eval3(coef, theta_star);
                    let d = ry as f32 * cos_t - rx as f32 * sin_t;
                    ds[idx] = d;
                    ys[idx] = y_i;
                    idx += 1;
                }
            }

            // Least-squares quadratic y = a0 + a1*d + a2*d^2 via normal
            // equations, for the concavity check and the fit residual.
            let n = ds.len() as f32;
            let s1: f32 = ds.iter().sum();
            let s2: f32 = ds.iter().map(|d| d * d).sum();
            let s3: f32 = ds.iter().map(|d| d.powi(3)).sum();
            let s4: f32 = ds.iter().map(|d| d.powi(4)).sum();
            let sy0: f32 = ys.iter().sum();
            let sy1: f32 = ds.iter().zip(&ys).map(|(d, y)| d * y).sum();
            let sy2: f32 = ds.iter().zip(&ys).map(|(d, y)| d * d * y).sum();

            let (a0, a1, a2) = solve_3x3(
                [[n, s1, s2], [s1, s2, s3], [s2, s3, s4]],
                [sy0, sy1, sy2],
            );

            let beta = 2.0 * theta_star.sin().powi(2) * theta_star.cos().powi(2) + 1.0;
            let num: f32 = ds.iter().zip(&ys).map(|(d, y)| d * y).sum();
            let den: f32 = ds.iter().zip(&ys).map(|(d, y)| (3.0 * d * d - 2.0) * y).sum();
            let delta = if den != 0.0 {
                -0.5 * (3.0 * beta - 2.0) * num / den
            } else {
                0.0
            };

            let dx_sub = -sin_t * delta;
            let dy_sub = cos_t * delta;

            let y_hat: Vec<f32> = ds.iter().map(|&d| a0 + a1 * d + a2 * d * d).collect();
            let norm_hat: f32 = y_hat.iter().map(|v| v * v).sum::<f32>().sqrt();
            let norm_y: f32 = ys.iter().map(|v| v * v).sum::<f32>().sqrt();
            let res = if norm_y > 0.0 { 1.0 - norm_hat / norm_y } else { 0.0 };

            let accept = dx_sub.abs() <= 0.51 && dy_sub.abs() <= 0.51 && a2 < 0.0 && rho_star > 0.0;
            if accept {
                (x, y, Some((theta_star, rho_star, dx_sub, dy_sub, res)))
            } else {
                (x, y, None)
            }
        })
        .collect();

    for (x, y, maybe) in results {
        if let Some((t, r, dxv, dyv, res)) = maybe {
            *is_max.get_mut(x, y) = 1;
            *theta.get_mut(x, y) = t;
            *rho.get_mut(x, y) = r;
            *dx.get_mut(x, y) = dxv;
            *dy.get_mut(x, y) = dyv;
            *residual.get_mut(x, y) = res;
        }
    }

    theta.fix_theta_range(true);

    ScaleContour {
        is_max,
        rho,
        theta,
        dx,
        dy,
        residual,
    }
}

fn solve_3x3(m: [[f32; 3]; 3], rhs: [f32; 3]) -> (f32, f32, f32) {
    let det3 = |m: [[f32; 3]; 3]| -> f32 {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let det = det3(m);
    if det.abs() < 1e-12 {
        return (0.0, 0.0, 0.0);
    }
    let replace_col = |col: usize| -> [[f32; 3]; 3] {
        let mut out = m;
        for row in 0..3 {
            out[row][col] = rhs[row];
        }
        out
    };
    let a0 = det3(replace_col(0)) / det;
    let a1 = det3(replace_col(1)) / det;
    let a2 = det3(replace_col(2)) / det;
    (a0, a1, a2)
}

/// Remove maxima whose ρ* falls below `0.1%` of this scale's peak ρ*.
pub fn suppress_low_energy(contour: &mut ScaleContour, fraction: f32) {
    let (_, max_rho) = contour.rho.min_max();
    if max_rho <= 0.0 {
        return;
    }
    let threshold = max_rho * fraction;
    let roi = contour.is_max.roi();
    for y in roi.start_y..roi.end_y {
        for x in roi.start_x..roi.end_x {
            if *contour.is_max.get(x, y) == 1 && *contour.rho.get(x, y) < threshold {
                *contour.is_max.get_mut(x, y) = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_grid::Roi;

    fn make_energy(n: usize, w: usize, h: usize, f: impl Fn(usize, usize, usize) -> f32) -> ImageSequence<f32> {
        let mut seq = ImageSequence::with_capacity(n);
        for i in 0..n {
            let mut img = Image::<f32>::new(w, h);
            img.set_roi(Roi {
                start_x: 2,
                end_x: w - 2,
                start_y: 2,
                end_y: h - 2,
            });
            for y in 0..h {
                for x in 0..w {
                    *img.get_mut(x, y) = f(i, x, y);
                }
            }
            seq.push(img);
        }
        seq
    }

    #[test]
    fn zero_energy_has_no_maxima() {
        let seq = make_energy(8, 12, 12, |_, _, _| 0.0);
        let contour = localize_scale(&seq, 8);
        for (_, _, v) in contour.is_max.iter_roi() {
            assert_eq!(*v, 0);
        }
    }

    #[test]
    fn subpixel_offsets_stay_in_bound_when_accepted() {
        // A vertical-step-like energy peak at orientation index 2 (theta=pi/4*... )
        // with smooth spatial falloff so the quadratic fit is well-conditioned.
        let n = 8;
        let seq = make_energy(n, 16, 16, |i, x, y| {
            let base = if i == 2 { 10.0 } else { 1.0 };
            let dist = ((x as f32 - 8.0).powi(2) + (y as f32 - 8.0).powi(2)).sqrt();
            (base - 0.1 * dist).max(0.0)
        });
        let contour = localize_scale(&seq, n);
        for (_, _, v) in contour.dx.iter_roi() {
            assert!(v.abs() <= 0.51);
        }
        for (_, _, v) in contour.dy.iter_roi() {
            assert!(v.abs() <= 0.51);
        }
    }
}
