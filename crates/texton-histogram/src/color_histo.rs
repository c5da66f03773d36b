use rayon::prelude::*;
use texton_grid::Image;

use crate::histogram::{Axis, Histogram, PatchCache};
use crate::histogram_image::HistogramImage;

/// Color-histogram image (C14): per pixel, a soft joint histogram over 1
/// (luminance-only) or 3 (Lab) color channels, same adaptive-radius disc
/// scheme as [`crate::compute_texton_histogram`].
///
/// `fast` selects the patch-cached Gaussian update over the direct
/// per-sample exponential; both are numerically close for the default
/// `sigma`/bin-count settings.
pub fn compute_color_histogram(channels: &[Image<f32>], texture_scale: &Image<i32>, masks: &[Image<u8>], r_min: i32, bins: &[usize], sigma: f32, fast: bool) -> HistogramImage {
    assert_eq!(channels.len(), bins.len());
    assert!((1..=3).contains(&channels.len()));

    let width = channels[0].width();
    let height = channels[0].height();
    let roi = channels[0].roi();

    let axes: Vec<Axis> = channels
        .iter()
        .zip(bins)
        .map(|(ch, &n_bins)| {
            let (min, max) = ch.min_max();
            Axis { n_bins, min, max }
        })
        .collect();

    let margin = if masks.is_empty() { 0 } else { (r_min.max(0) as usize) + masks.len() - 1 };
    let padded: Vec<Image<f32>> = channels.iter().map(|c| c.reflect_padded(margin)).collect();

    let pixels: Vec<(usize, usize)> = roi.iter_pixels().collect();
    let results: Vec<(usize, usize, Histogram)> = pixels
        .into_par_iter()
        .map(|(x, y)| {
            let mut h = Histogram::new(axes.clone());
            let mut cache = PatchCache::new(channels.len(), sigma);
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
                        let coords: Vec<f32> = padded.iter().map(|ch| *ch.get(px, py)).collect();
                        if fast {
                            h.soft_accumulate_fast(&coords, 1.0, &mut cache);
                        } else {
                            h.soft_accumulate(&coords, 1.0, sigma);
                        }
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
    fn grayscale_histogram_is_rank_one() {
        let w = 10;
        let h = 10;
        let mut luminance = Image::<f32>::new(w, h);
        luminance.set_roi(Roi::full(w, h));
        for y in 0..h {
            for x in 0..w {
                *luminance.get_mut(x, y) = (x as f32) * 10.0;
            }
        }
        let mut scale = Image::<i32>::new(w, h);
        scale.set_roi(Roi::full(w, h));
        for y in 0..h {
            for x in 0..w {
                *scale.get_mut(x, y) = 2;
            }
        }
        let masks = circle_masks(1, 4);
        let histos = compute_color_histogram(&[luminance], &scale, &masks, 1, &[8], 1.8, true);
        assert_eq!(histos.axes().len(), 1);
        let cell = histos.get(5, 5);
        let sum: f32 = cell.bins().iter().sum();
        assert!((sum - 1.0).abs() < 1e-4 || sum == 0.0);
    }
}
