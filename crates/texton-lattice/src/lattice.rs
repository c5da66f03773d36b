use rayon::prelude::*;
use texton_contour::ScaleContour;
use texton_grid::Image;

use crate::geometry::segments_intersect;

/// Dual-lattice edge maps (C15). `h.get(x, y)` is the contour-crossing
/// probability on the cell edge between `(x, y)` and `(x, y + 1)`; `v.get(x,
/// y)` is the one between `(x, y)` and `(x + 1, y)`. The last row of `h` and
/// the last column of `v` are unused and stay zero.
#[derive(Debug)]
pub struct DualLattice {
    pub h: Image<f32>,
    pub v: Image<f32>,
}

struct Update {
    horizontal: bool,
    x: usize,
    y: usize,
    value: f32,
}

/// Draws a length-`edgel_length` edgelet at every accepted sub-pixel contour
/// maximum in `scales`, centered at `(x + dx, y + dy)` with orientation
/// `theta*`, and for each of the four cell-boundary segments of the pixel
/// cell it lands in, records a `max(prior, P_B)` update where `P_B = (1 -
/// P_texture) * P_con` and `P_con = 1 - exp(-sqrt(rho*) / sigma_ic)`.
pub fn compute_dual_lattice(scales: &[ScaleContour], p_texture: &Image<f32>, edgel_length: f32, sigma_ic: f32) -> DualLattice {
    let width = p_texture.width();
    let height = p_texture.height();
    let roi = p_texture.roi();

    let half_len = edgel_length * 0.5;

    let updates: Vec<Update> = scales
        .par_iter()
        .flat_map(|scale| {
            let pixels: Vec<(usize, usize)> = roi.iter_pixels().collect();
            pixels
                .into_par_iter()
                .filter(|&(x, y)| *scale.is_max.get(x, y) == 1)
                .flat_map(|(x, y)| {
                    let rho = *scale.rho.get(x, y);
                    if rho <= 0.0 {
                        return Vec::new();
                    }
                    let theta = *scale.theta.get(x, y);
                    let dx = *scale.dx.get(x, y);
                    let dy = *scale.dy.get(x, y);
                    let p_tex = *p_texture.get(x, y);

                    let p_con = 1.0 - (-rho.sqrt() / sigma_ic).exp();
                    let p_b = (1.0 - p_tex) * p_con;

                    let px = x as f32 + dx;
                    let py = y as f32 + dy;
                    let ex = half_len * theta.cos();
                    let ey = half_len * theta.sin();
                    let p1 = (px - ex, py - ey);
                    let p2 = (px + ex, py + ey);

                    let ix = px.floor() as i64;
                    let iy = py.floor() as i64;

                    let mut out = Vec::with_capacity(4);

                    // top: edge between (ix, iy-1) and (ix, iy)
                    let top = ((ix as f32 - 0.5, iy as f32 - 0.5), (ix as f32 + 0.5, iy as f32 - 0.5));
                    if iy >= 1 && segments_intersect(p1, p2, top.0, top.1) {
                        out.push(Update { horizontal: true, x: ix as usize, y: (iy - 1) as usize, value: p_b });
                    }

                    // bottom: edge between (ix, iy) and (ix, iy+1)
                    let bottom = ((ix as f32 - 0.5, iy as f32 + 0.5), (ix as f32 + 0.5, iy as f32 + 0.5));
                    if ix >= 0 && (ix as usize) < width && iy >= 0 && (iy as usize + 1) < height && segments_intersect(p1, p2, bottom.0, bottom.1) {
                        out.push(Update { horizontal: true, x: ix as usize, y: iy as usize, value: p_b });
                    }

                    // left: edge between (ix-1, iy) and (ix, iy)
                    let left = ((ix as f32 - 0.5, iy as f32 - 0.5), (ix as f32 - 0.5, iy as f32 + 0.5));
                    if ix >= 1 && segments_intersect(p1, p2, left.0, left.1) {
                        out.push(Update { horizontal: false, x: (ix - 1) as usize, y: iy as usize, value: p_b });
                    }

                    // right: edge between (ix, iy) and (ix+1, iy)
                    let right = ((ix as f32 + 0.5, iy as f32 - 0.5), (ix as f32 + 0.5, iy as f32 + 0.5));
                    if iy >= 0 && (iy as usize) < height && ix >= 0 && (ix as usize + 1) < width && segments_intersect(p1, p2, right.0, right.1) {
                        out.push(Update { horizontal: false, x: ix as usize, y: iy as usize, value: p_b });
                    }

                    out
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut h = Image::<f32>::new(width, height);
    let mut v = Image::<f32>::new(width, height);
    h.set_roi(roi);
    v.set_roi(roi);

    for u in updates {
        let target = if u.horizontal { &mut h } else { &mut v };
        if u.x < width && u.y < height {
            let slot = target.get_mut(u.x, u.y);
            if u.value > *slot {
                *slot = u.value;
            }
        }
    }

    DualLattice { h, v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_grid::Roi;

    fn flat_scale(w: usize, h: usize) -> ScaleContour {
        let roi = Roi::full(w, h);
        let mut is_max = Image::<u8>::new(w, h);
        let mut rho = Image::<f32>::new(w, h);
        let mut theta = Image::<f32>::new(w, h);
        let dx = Image::<f32>::new(w, h);
        let dy = Image::<f32>::new(w, h);
        let residual = Image::<f32>::new(w, h);
        is_max.set_roi(roi);
        rho.set_roi(roi);
        theta.set_roi(roi);
        ScaleContour { is_max, rho, theta, dx, dy, residual }
    }

    #[test]
    fn vertical_edge_crosses_the_right_boundary() {
        let w = 8;
        let h = 8;
        let mut scale = flat_scale(w, h);
        // A contour oriented straight up/down (theta = pi/2) sitting exactly
        // on the right edge of pixel (3,4) should only light up V(3,4).
        *scale.is_max.get_mut(3, 4) = 1;
        *scale.rho.get_mut(3, 4) = 1.0;
        *scale.theta.get_mut(3, 4) = std::f32::consts::FRAC_PI_2;

        let mut p_texture = Image::<f32>::new(w, h);
        p_texture.set_roi(Roi::full(w, h));

        // dx of 0.5 puts the maximum exactly at x = 3.5, the cell boundary.
        *scale.dx.get_mut(3, 4) = 0.499;

        let lattice = compute_dual_lattice(&[scale], &p_texture, 2.0, 0.016);
        assert!(*lattice.v.get(3, 4) > 0.0);
    }

    #[test]
    fn zero_rho_produces_no_updates() {
        let w = 6;
        let h = 6;
        let mut scale = flat_scale(w, h);
        *scale.is_max.get_mut(2, 2) = 1;
        let p_texture = Image::<f32>::new(w, h);
        let lattice = compute_dual_lattice(&[scale], &p_texture, 2.0, 0.016);
        for (_, _, val) in lattice.h.iter_roi() {
            assert_eq!(*val, 0.0);
        }
        for (_, _, val) in lattice.v.iter_roi() {
            assert_eq!(*val, 0.0);
        }
    }
}
