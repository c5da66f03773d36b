use texton_grid::Image;

use crate::contour::ScaleContour;

/// Combined contour record across scales: per pixel, the scale that
/// maximizes rho* among pixels whose per-scale mask is set.
pub struct CombinedContour {
    pub is_max: Image<u8>,
    pub rho: Image<f32>,
    pub theta: Image<f32>,
    pub dx: Image<f32>,
    pub dy: Image<f32>,
    pub best_scale: Image<i32>,
}

/// Argmax-across-scales combiner (C7). `scales` must be non-empty and all
/// the same size/ROI.
pub fn combine_scales(scales: &[ScaleContour]) -> CombinedContour {
    assert!(!scales.is_empty(), "combine_scales requires at least one scale");
    let width = scales[0].rho.width();
    let height = scales[0].rho.height();
    let roi = scales[0].rho.roi();

    let mut is_max = Image::<u8>::new(width, height);
    let mut rho = Image::<f32>::new(width, height);
    let mut theta = Image::<f32>::new(width, height);
    let mut dx = Image::<f32>::new(width, height);
    let mut dy = Image::<f32>::new(width, height);
    let mut best_scale = Image::<i32>::new(width, height);
    is_max.set_roi(roi);
    rho.set_roi(roi);
    theta.set_roi(roi);
    dx.set_roi(roi);
    dy.set_roi(roi);
    best_scale.set_roi(roi);

    for y in roi.start_y..roi.end_y {
        for x in roi.start_x..roi.end_x {
            let mut best_rho = f32::NEG_INFINITY;
            let mut best_idx: Option<usize> = None;
            for (s, scale) in scales.iter().enumerate() {
                if *scale.is_max.get(x, y) == 1 && *scale.rho.get(x, y) > best_rho {
                    best_rho = *scale.rho.get(x, y);
                    best_idx = Some(s);
                }
            }
            if let Some(s) = best_idx {
                let scale = &scales[s];
                *is_max.get_mut(x, y) = 1;
                *rho.get_mut(x, y) = *scale.rho.get(x, y);
                *theta.get_mut(x, y) = *scale.theta.get(x, y);
                *dx.get_mut(x, y) = *scale.dx.get(x, y);
                *dy.get_mut(x, y) = *scale.dy.get(x, y);
                *best_scale.get_mut(x, y) = s as i32;
            } else {
                *best_scale.get_mut(x, y) = -1;
            }
        }
    }

    theta.fix_theta_range(true);

    CombinedContour {
        is_max,
        rho,
        theta,
        dx,
        dy,
        best_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_grid::Roi;

    fn scale_with(w: usize, h: usize, rho_val: f32, is_max: u8) -> ScaleContour {
        let roi = Roi::full(w, h);
        let mut rho = Image::<f32>::new(w, h);
        rho.set_roi(roi);
        let mut mask = Image::<u8>::new(w, h);
        mask.set_roi(roi);
        for y in 0..h {
            for x in 0..w {
                *rho.get_mut(x, y) = rho_val;
                *mask.get_mut(x, y) = is_max;
            }
        }
        let mut theta = Image::<f32>::new(w, h);
        theta.set_roi(roi);
        let dx = Image::<f32>::new(w, h);
        let dy = Image::<f32>::new(w, h);
        let residual = Image::<f32>::new(w, h);
        ScaleContour {
            is_max: mask,
            rho,
            theta,
            dx,
            dy,
            residual,
        }
    }

    #[test]
    fn picks_scale_with_highest_rho() {
        let scales = vec![scale_with(4, 4, 0.5, 1), scale_with(4, 4, 0.9, 1), scale_with(4, 4, 0.2, 1)];
        let combined = combine_scales(&scales);
        assert_eq!(*combined.best_scale.get(0, 0), 1);
        assert_eq!(*combined.rho.get(0, 0), 0.9);
    }

    #[test]
    fn no_mask_set_anywhere_yields_no_maxima() {
        let scales = vec![scale_with(3, 3, 0.5, 0)];
        let combined = combine_scales(&scales);
        for (_, _, v) in combined.is_max.iter_roi() {
            assert_eq!(*v, 0);
        }
    }
}
