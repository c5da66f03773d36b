use std::collections::HashSet;

use delaunator::{triangulate, Point};
use rayon::prelude::*;
use texton_grid::Image;

use crate::median::median_filter;

fn median_of(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    let mid = n / 2;
    if n % 2 == 0 {
        (values[mid] + values[mid - 1]) * 0.5
    } else {
        values[mid]
    }
}

/// One label's pass: the raw scale channel for sites carrying `label`,
/// zero everywhere else.
fn label_scale_channel(textons: &Image<i32>, label: i32, width: usize, height: usize, min_dist: f32, max_dist: f32, alpha: f32) -> Image<f32> {
    let roi = textons.roi();
    let mut out = Image::<f32>::new(width, height);
    out.set_roi(roi);

    let sites: Vec<(usize, usize)> = roi
        .iter_pixels()
        .filter(|&(x, y)| *textons.get(x, y) == label)
        .collect();

    if sites.len() < 3 {
        return out;
    }

    let points: Vec<Point> = sites.iter().map(|&(x, y)| Point { x: x as f64, y: y as f64 }).collect();
    let triangulation = triangulate(&points);

    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    for tri in triangulation.triangles.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]];
        for &(i, j) in &[(a, b), (b, c), (c, a)] {
            edges.insert((i.min(j), i.max(j)));
        }
    }

    let mut neighbor_dists: Vec<Vec<f32>> = vec![Vec::new(); sites.len()];
    for (i, j) in edges {
        let (xi, yi) = sites[i];
        let (xj, yj) = sites[j];
        let dist = (((xi as f32 - xj as f32).powi(2)) + ((yi as f32 - yj as f32).powi(2))).sqrt();
        neighbor_dists[i].push(dist);
        neighbor_dists[j].push(dist);
    }

    let (lo, hi) = (min_dist.min(max_dist), min_dist.max(max_dist));
    for (i, &(x, y)) in sites.iter().enumerate() {
        if neighbor_dists[i].is_empty() {
            continue;
        }
        let d = median_of(&mut neighbor_dists[i]).clamp(lo, hi);
        *out.get_mut(x, y) = alpha * d;
    }

    out
}

fn merge_max(channels: &[Image<f32>]) -> Image<f32> {
    let mut out = channels[0].clone();
    let roi = out.roi();
    for channel in &channels[1..] {
        for y in roi.start_y..roi.end_y {
            for x in roi.start_x..roi.end_x {
                let v = out.get_mut(x, y);
                *v = v.max(*channel.get(x, y));
            }
        }
    }
    out
}

/// Texture scale estimator (C10). Returns the per-pixel integer adaptive
/// radius map plus the min/max radius observed across the ROI.
pub fn compute_texture_scale(textons: &Image<i32>, k: usize, min_dist: f32, max_dist: f32, alpha: f32) -> (Image<i32>, i32, i32) {
    let width = textons.width();
    let height = textons.height();

    let channels: Vec<Image<f32>> = (0..k as i32)
        .into_par_iter()
        .map(|label| label_scale_channel(textons, label, width, height, min_dist, max_dist, alpha))
        .collect();

    let combined = if channels.is_empty() {
        let mut zero = Image::<f32>::new(width, height);
        zero.set_roi(textons.roi());
        zero
    } else {
        merge_max(&channels)
    };

    let smoothed = median_filter(&combined, 2);

    let roi = smoothed.roi();
    let mut radius = Image::<i32>::new(width, height);
    radius.set_roi(roi);
    let mut r_min = i32::MAX;
    let mut r_max = i32::MIN;
    for y in roi.start_y..roi.end_y {
        for x in roi.start_x..roi.end_x {
            let r = smoothed.get(x, y).round() as i32;
            *radius.get_mut(x, y) = r;
            r_min = r_min.min(r);
            r_max = r_max.max(r);
        }
    }
    if roi.is_empty() {
        r_min = 0;
        r_max = 0;
    }

    (radius, r_min, r_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_grid::Roi;

    #[test]
    fn uniform_texton_field_yields_uniform_scale() {
        let w = 12;
        let h = 12;
        let mut textons = Image::<i32>::new(w, h);
        textons.set_roi(Roi::full(w, h));
        for y in 0..h {
            for x in 0..w {
                *textons.get_mut(x, y) = ((x + y) % 3) as i32;
            }
        }
        let (radius, r_min, r_max) = compute_texture_scale(&textons, 3, 1.0, 10.0, 1.5);
        assert!(r_min <= r_max);
        for (_, _, v) in radius.iter_roi() {
            assert!(*v >= 0);
        }
    }

    #[test]
    fn sparse_label_with_too_few_sites_contributes_nothing() {
        let w = 8;
        let h = 8;
        let mut textons = Image::<i32>::new(w, h);
        textons.set_roi(Roi::full(w, h));
        *textons.get_mut(0, 0) = 1;
        *textons.get_mut(1, 0) = 1;
        let (radius, _, _) = compute_texture_scale(&textons, 2, 1.0, 5.0, 1.5);
        for (_, _, v) in radius.iter_roi() {
            assert_eq!(*v, 0);
        }
    }
}
