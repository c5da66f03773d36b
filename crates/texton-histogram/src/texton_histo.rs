use rayon::prelude::*;
use texton_grid::Image;

use crate::histogram::{Axis, Histogram};
use crate::histogram_image::HistogramImage;

/// Texton-histogram image (C13): per pixel, a soft histogram over `K+1`
/// texton-label bins (`[0]` is "looked like a contour", `[1..=K]` are the
/// texton labels), weighted by `P_texture`.
pub fn compute_texton_histogram(textons: &Image<i32>, p_texture: &Image<f32>, texture_scale: &Image<i32>, masks: &[Image<u8>], r_min: i32, k: usize) -> HistogramImage {
    let width = textons.width();
    let height = textons.height();
    let roi = textons.roi();

    let margin = if masks.is_empty() { 0 } else { (r_min.max(0) as usize) + masks.len() - 1 };
    let padded_textons = textons.reflect_padded(margin);
    let padded_p = p_texture.reflect_padded(margin);

    let axes = vec![Axis {
        n_bins: k + 1,
        min: 0.0,
        max: (k + 1) as f32,
    }];

    let pixels: Vec<(usize, usize)> = roi.iter_pixels().collect();
    let results: Vec<(usize, usize, Histogram)> = pixels
        .into_par_iter()
        .map(|(x, y)| {
            let mut h = Histogram::new(axes.clone());
            if !masks.is_empty() {
                let rad = (*texture_scale.get(x, y)).clamp(r_min, r_min + masks.len() as i32 - 1);
                let mask = &masks[(rad - r_min) as usize];
                for yy in -rad..=rad {
                    for xx in -rad..=rad {
                        if *mask.get((xx + rad) as usize, (yy + rad) as usize) == 0 {
                            continue;
                        }
                        let px = (x as i64 + margin as i64 + xx as i64) as usize;
                        let py = (y as i64 + margin as i64 + yy as i64) as usize;
                        let label = *padded_textons.get(px, py);
                        let pt = *padded_p.get(px, py);
                        h.increment_bin(&[(label + 1) as usize], pt);
                        h.increment_bin(&[0], 1.0 - pt);
                    }
                }
            }
            h.normalize_l1();
            (x, y, h)
        })
        .collect();

    let mut out = HistogramImage::new(width, height, axes);
    for (x, y, h) in results {
        out.set(x, y, h);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_grid::Roi;
    use texton_sample::circle_masks;

    #[test]
    fn uniform_texture_fills_single_label_bin() {
        let w = 10;
        let h = 10;
        let k = 3;
        let mut textons = Image::<i32>::new(w, h);
        textons.set_roi(Roi::full(w, h));
        for y in 0..h {
            for x in 0..w {
                *textons.get_mut(x, y) = 1;
            }
        }
        let mut p_texture = Image::<f32>::filled(w, h, 1.0);
        p_texture.set_roi(Roi::full(w, h));
        let mut scale = Image::<i32>::new(w, h);
        scale.set_roi(Roi::full(w, h));
        for y in 0..h {
            for x in 0..w {
                *scale.get_mut(x, y) = 2;
            }
        }
        let masks = circle_masks(1, 4);
        let histos = compute_texton_histogram(&textons, &p_texture, &scale, &masks, 1, k);
        let cell = histos.get(5, 5);
        assert!((cell.bins()[0]).abs() < 1e-6);
        assert!(cell.bins()[2] > 0.9);
    }
}
