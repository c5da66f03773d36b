use std::collections::HashMap;

/// One axis of a histogram: bin count plus an inclusive value range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub n_bins: usize,
    pub min: f32,
    pub max: f32,
}

fn cartesian_product(axes: &[Vec<i64>]) -> Vec<Vec<i64>> {
    let mut out = vec![Vec::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(out.len() * axis.len());
        for prefix in &out {
            for &v in axis {
                let mut combo = prefix.clone();
                combo.push(v);
                next.push(combo);
            }
        }
        out = next;
    }
    out
}

/// A rank-generic (1, 2, or 3 axis) float histogram: a flat buffer plus a
/// per-axis `(n_bins, min, max)` descriptor. Bin indexing is a closed-form
/// function of rank rather than a separate class per dimensionality.
#[derive(Debug, Clone)]
pub struct Histogram {
    axes: Vec<Axis>,
    bins: Vec<f32>,
}

impl Histogram {
    pub fn new(axes: Vec<Axis>) -> Self {
        assert!(!axes.is_empty() && axes.len() <= 3, "histogram rank must be 1..=3");
        let total: usize = axes.iter().map(|a| a.n_bins.max(1)).product();
        Self {
            axes,
            bins: vec![0.0; total],
        }
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    pub fn zero(&mut self) {
        self.bins.iter_mut().for_each(|b| *b = 0.0);
    }

    pub fn is_empty(&self) -> bool {
        self.bins.iter().all(|&b| b == 0.0)
    }

    fn frac_coord(&self, axis: usize, value: f32) -> f32 {
        let a = &self.axes[axis];
        let span = (a.max - a.min).max(1e-12);
        ((value - a.min) / span * a.n_bins as f32).clamp(0.0, a.n_bins as f32 - 1.0e-4)
    }

    fn flat_index(&self, idx: &[usize]) -> usize {
        let mut flat = 0;
        let mut mult = 1;
        for (axis, &i) in idx.iter().enumerate() {
            flat += i * mult;
            mult *= self.axes[axis].n_bins;
        }
        flat
    }

    pub fn increment_bin(&mut self, idx: &[usize], weight: f32) {
        let flat = self.flat_index(idx);
        self.bins[flat] += weight;
    }

    pub fn increment_flat(&mut self, flat: usize, weight: f32) {
        self.bins[flat] += weight;
    }

    /// Literal accumulation: the sample lands in exactly one bin per axis.
    pub fn accumulate(&mut self, coords: &[f32], weight: f32) {
        let idx: Vec<usize> = coords
            .iter()
            .enumerate()
            .map(|(a, &v)| self.frac_coord(a, v).floor() as usize)
            .collect();
        self.increment_bin(&idx, weight);
    }

    /// Soft (Gaussian-weighted) accumulation over a neighborhood of radius
    /// `floor(3*sigma)` bins around the sample's fractional bin coordinate,
    /// clipped at the array boundary. Re-evaluates the exponential for every
    /// sample; see [`soft_accumulate_fast`][Self::soft_accumulate_fast] for
    /// the patch-cached variant.
    pub fn soft_accumulate(&mut self, coords: &[f32], weight: f32, sigma: f32) {
        let rank = self.rank();
        let centers: Vec<f32> = coords.iter().enumerate().map(|(a, &v)| self.frac_coord(a, v)).collect();
        let radius = (3.0 * sigma).floor() as i64;

        let offsets_per_axis: Vec<Vec<i64>> = (0..rank)
            .map(|a| {
                let base = centers[a].floor() as i64;
                let lo = (base - radius).max(0);
                let hi = (base + radius).min(self.axes[a].n_bins as i64 - 1);
                (lo..=hi).collect()
            })
            .collect();

        for combo in cartesian_product(&offsets_per_axis) {
            let mut w = weight;
            for (a, &bin) in combo.iter().enumerate() {
                let d = bin as f32 + 0.5 - centers[a];
                w *= (-0.5 * (d / sigma).powi(2)).exp();
            }
            let idx: Vec<usize> = combo.iter().map(|&v| v as usize).collect();
            self.increment_bin(&idx, w);
        }
    }

    /// Patch-cached variant of [`soft_accumulate`][Self::soft_accumulate]:
    /// the Gaussian weights only depend on which half-bin quadrant the
    /// sample's fractional coordinate falls into, so `cache` stores one
    /// weight patch per quadrant and the inner loop becomes a lookup-and-add.
    pub fn soft_accumulate_fast(&mut self, coords: &[f32], weight: f32, cache: &mut PatchCache) {
        let rank = self.rank();
        let centers: Vec<f32> = coords.iter().enumerate().map(|(a, &v)| self.frac_coord(a, v)).collect();
        let bases: Vec<i64> = centers.iter().map(|&c| c.floor() as i64).collect();
        let fracs: Vec<f32> = centers.iter().zip(&bases).map(|(&c, &b)| c - b as f32).collect();

        let patch = cache.get_or_build(&fracs);
        for (offset, w) in &patch.offsets {
            let mut idx = Vec::with_capacity(rank);
            let mut in_bounds = true;
            for a in 0..rank {
                let v = bases[a] + offset[a];
                if v < 0 || v >= self.axes[a].n_bins as i64 {
                    in_bounds = false;
                    break;
                }
                idx.push(v as usize);
            }
            if in_bounds {
                self.increment_bin(&idx, weight * w);
            }
        }
    }

    pub fn normalize_l1(&mut self) {
        let sum: f32 = self.bins.iter().sum();
        if sum > 0.0 {
            for b in self.bins.iter_mut() {
                *b /= sum;
            }
        }
    }

    /// `0.5 * sum((p-q)^2 / (p+q))`, with the `0/0 -> 0` convention.
    pub fn chi_square(&self, other: &Histogram) -> f32 {
        let mut sum = 0.0f32;
        for (p, q) in self.bins.iter().zip(&other.bins) {
            let denom = p + q;
            if denom != 0.0 {
                let diff = p - q;
                sum += diff * diff / denom;
            }
        }
        sum * 0.5
    }
}

/// A patch of relative bin offsets and precomputed Gaussian weights, shared
/// by every sample whose fractional bin coordinate falls in the same
/// half-bin quadrant.
pub struct Patch {
    pub offsets: Vec<(Vec<i64>, f32)>,
}

pub struct PatchCache {
    rank: usize,
    sigma: f32,
    radius: i64,
    cache: HashMap<Vec<i64>, Patch>,
}

impl PatchCache {
    pub fn new(rank: usize, sigma: f32) -> Self {
        Self {
            rank,
            sigma,
            radius: (3.0 * sigma).floor() as i64,
            cache: HashMap::new(),
        }
    }

    fn quadrant_key(fracs: &[f32]) -> Vec<i64> {
        fracs.iter().map(|&f| if f < 0.5 { 0 } else { 1 }).collect()
    }

    fn get_or_build(&mut self, fracs: &[f32]) -> &Patch {
        let key = Self::quadrant_key(fracs);
        let rank = self.rank;
        let sigma = self.sigma;
        let radius = self.radius;
        self.cache.entry(key.clone()).or_insert_with(|| {
            let reps: Vec<f32> = key.iter().map(|&k| if k == 0 { 0.25 } else { 0.75 }).collect();
            let per_axis: Vec<Vec<i64>> = (0..rank).map(|_| (-radius..=radius).collect()).collect();
            let mut offsets = Vec::new();
            for combo in cartesian_product(&per_axis) {
                let mut w = 1.0f32;
                for (a, &off) in combo.iter().enumerate() {
                    let d = off as f32 - reps[a];
                    w *= (-0.5 * (d / sigma).powi(2)).exp();
                }
                offsets.push((combo, w));
            }
            Patch { offsets }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizing_empty_histogram_stays_zero() {
        let mut h = Histogram::new(vec![Axis { n_bins: 4, min: 0.0, max: 4.0 }]);
        h.normalize_l1();
        assert!(h.is_empty());
    }

    #[test]
    fn accumulate_lands_in_expected_bin() {
        let mut h = Histogram::new(vec![Axis { n_bins: 4, min: 0.0, max: 4.0 }]);
        h.accumulate(&[2.5], 1.0);
        assert_eq!(h.bins()[2], 1.0);
        h.normalize_l1();
        assert_eq!(h.bins()[2], 1.0);
    }

    #[test]
    fn chi_square_of_identical_histograms_is_zero() {
        let mut a = Histogram::new(vec![Axis { n_bins: 3, min: 0.0, max: 3.0 }]);
        a.accumulate(&[1.0], 1.0);
        a.normalize_l1();
        let b = a.clone();
        assert!(a.chi_square(&b).abs() < 1e-6);
    }

    #[test]
    fn chi_square_stays_in_unit_range_for_disjoint_histograms() {
        let mut a = Histogram::new(vec![Axis { n_bins: 2, min: 0.0, max: 2.0 }]);
        a.accumulate(&[0.0], 1.0);
        a.normalize_l1();
        let mut b = Histogram::new(vec![Axis { n_bins: 2, min: 0.0, max: 2.0 }]);
        b.accumulate(&[1.5], 1.0);
        b.normalize_l1();
        let chi = a.chi_square(&b);
        assert!((0.0..=1.0).contains(&chi));
    }

    #[test]
    fn soft_and_fast_accumulation_agree_approximately() {
        let axes = vec![Axis { n_bins: 8, min: 0.0, max: 8.0 }, Axis { n_bins: 8, min: 0.0, max: 8.0 }];
        let sigma = 1.8;
        let mut classic = Histogram::new(axes.clone());
        let mut fast = Histogram::new(axes);
        let mut cache = PatchCache::new(2, sigma);
        for &(a, b) in &[(3.2, 4.6), (1.1, 0.9), (6.7, 2.3)] {
            classic.soft_accumulate(&[a, b], 1.0, sigma);
            fast.soft_accumulate_fast(&[a, b], 1.0, &mut cache);
        }
        classic.normalize_l1();
        fast.normalize_l1();
        let chi = classic.chi_square(&fast);
        assert!(chi < 0.05, "classic/fast diverged: chi={chi}");
    }
}
