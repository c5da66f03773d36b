use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use texton_grid::{Image, Roi};

/// Points laid out dimension-major (`dims[d][p]`) rather than point-major, so
/// that a distance computation for one cluster center walks each dimension's
/// values contiguously.
#[derive(Debug, Clone)]
pub struct PointSet {
    pub n_points: usize,
    pub n_dims: usize,
    dims: Vec<Vec<f32>>,
}

impl PointSet {
    pub fn new(n_points: usize, n_dims: usize) -> Self {
        Self {
            n_points,
            n_dims,
            dims: vec![vec![0.0; n_points]; n_dims],
        }
    }

    #[inline]
    pub fn value(&self, dim: usize, point: usize) -> f32 {
        self.dims[dim][point]
    }

    #[inline]
    pub fn set(&mut self, dim: usize, point: usize, value: f32) {
        self.dims[dim][point] = value;
    }

    fn square_distance(&self, point: usize, mean: &[f32]) -> f32 {
        (0..self.n_dims)
            .map(|d| {
                let diff = self.dims[d][point] - mean[d];
                diff * diff
            })
            .sum()
    }
}

#[derive(Debug, Clone)]
pub enum InitStrategy {
    RandomPoints,
    FayyadRefined { sub_size: usize, j: usize },
}

#[derive(Debug, Clone)]
pub struct PruneConfig {
    pub stopping_factor: f32,
    pub stopping_k: usize,
}

#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub k: usize,
    pub max_iters: usize,
    pub init: InitStrategy,
    pub prune: Option<PruneConfig>,
    pub reseed_empty: bool,
    /// `(width, height)` of the point grid, if the optional 3x3 majority
    /// cleanup should run after convergence.
    pub majority_cleanup: Option<(usize, usize)>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 36,
            max_iters: 30,
            init: InitStrategy::RandomPoints,
            prune: None,
            reseed_empty: true,
            majority_cleanup: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KMeansResult {
    pub assignments: Vec<usize>,
    pub means: Vec<Vec<f32>>,
    pub k: usize,
}

fn assign_step(points: &PointSet, means: &[Vec<f32>]) -> Vec<usize> {
    (0..points.n_points)
        .into_par_iter()
        .map(|p| {
            let mut best_k = 0;
            let mut best_dist = f32::INFINITY;
            for (k, mean) in means.iter().enumerate() {
                let d = points.square_distance(p, mean);
                if d < best_dist {
                    best_dist = d;
                    best_k = k;
                }
            }
            best_k
        })
        .collect()
}

/// Per-worker partial `(sums, counts)` reduced into a single combine step.
fn accumulate_sums(points: &PointSet, assignments: &[usize], k: usize) -> (Vec<Vec<f32>>, Vec<usize>) {
    (0..points.n_points)
        .into_par_iter()
        .fold(
            || (vec![vec![0.0f32; points.n_dims]; k], vec![0usize; k]),
            |mut acc, p| {
                let kk = assignments[p];
                acc.1[kk] += 1;
                for d in 0..points.n_dims {
                    acc.0[kk][d] += points.dims[d][p];
                }
                acc
            },
        )
        .reduce(
            || (vec![vec![0.0f32; points.n_dims]; k], vec![0usize; k]),
            |mut a, b| {
                for kk in 0..k {
                    a.1[kk] += b.1[kk];
                    for d in 0..points.n_dims {
                        a.0[kk][d] += b.0[kk][d];
                    }
                }
                a
            },
        )
}

/// Recompute each cluster's mean from its members; clusters with no members
/// keep their previous mean.
fn recompute_means(points: &PointSet, assignments: &[usize], k: usize, prev: &[Vec<f32>]) -> (Vec<Vec<f32>>, Vec<usize>) {
    let (sums, counts) = accumulate_sums(points, assignments, k);
    let mut means = prev.to_vec();
    for kk in 0..k {
        if counts[kk] > 0 {
            let factor = 1.0 / counts[kk] as f32;
            for d in 0..points.n_dims {
                means[kk][d] = sums[kk][d] * factor;
            }
        }
    }
    (means, counts)
}

fn total_error(points: &PointSet, assignments: &[usize], means: &[Vec<f32>]) -> f32 {
    (0..points.n_points)
        .map(|p| points.square_distance(p, &means[assignments[p]]))
        .sum()
}

/// Plain Lloyd iteration to convergence (or `max_iters`), with no empty
/// cluster handling: an emptied cluster simply keeps its stale mean.
fn iterate_to_convergence(points: &PointSet, mut means: Vec<Vec<f32>>, max_iters: usize) -> (Vec<usize>, Vec<Vec<f32>>, Vec<usize>) {
    let k = means.len();
    let mut assignments = assign_step(points, &means);
    let (new_means, counts) = recompute_means(points, &assignments, k, &means);
    means = new_means;
    let mut counts = counts;
    for _ in 1..max_iters {
        let new_assignments = assign_step(points, &means);
        let changed = new_assignments
            .iter()
            .zip(&assignments)
            .filter(|(a, b)| a != b)
            .count();
        assignments = new_assignments;
        let (new_means, new_counts) = recompute_means(points, &assignments, k, &means);
        means = new_means;
        counts = new_counts;
        if changed == 0 {
            break;
        }
    }
    (assignments, means, counts)
}

/// Outer loop matching the original's `IterateMod`: run to convergence, and
/// if any cluster emptied out, reseed it at the point farthest from its
/// (stale) center and run the whole thing again.
fn iterate_with_reseed(points: &PointSet, mut means: Vec<Vec<f32>>, max_iters: usize, reseed_empty: bool) -> (Vec<usize>, Vec<Vec<f32>>) {
    let k = means.len();
    // Bounded defensively: each pass can reseed at most k clusters, and a
    // reseed can't repeat indefinitely without some cluster gaining members.
    let guard = (k + 1) * 4;
    for _ in 0..guard {
        let (assignments, new_means, counts) = iterate_to_convergence(points, means, max_iters);
        means = new_means;
        if !reseed_empty {
            return (assignments, means);
        }
        let empty: Vec<usize> = (0..k).filter(|&kk| counts[kk] == 0).collect();
        if empty.is_empty() {
            return (assignments, means);
        }
        for kk in empty {
            let mut far_p = 0;
            let mut far_dist = -1.0f32;
            for p in 0..points.n_points {
                let d = points.square_distance(p, &means[kk]);
                if d > far_dist {
                    far_dist = d;
                    far_p = p;
                }
            }
            for d in 0..points.n_dims {
                means[kk][d] = points.dims[d][far_p];
            }
        }
    }
    let assignments = assign_step(points, &means);
    (assignments, means)
}

fn random_init(points: &PointSet, k: usize, rng: &mut impl Rng) -> Vec<Vec<f32>> {
    let mut idx: Vec<usize> = (0..points.n_points).collect();
    idx.shuffle(rng);
    idx.truncate(k);
    idx.into_iter()
        .map(|p| (0..points.n_dims).map(|d| points.dims[d][p]).collect())
        .collect()
}

fn subsample(points: &PointSet, sub_size: usize, rng: &mut impl Rng) -> PointSet {
    let n = sub_size.min(points.n_points);
    let mut idx: Vec<usize> = (0..points.n_points).collect();
    idx.shuffle(rng);
    idx.truncate(n);
    let mut sub = PointSet::new(n, points.n_dims);
    for (new_p, &old_p) in idx.iter().enumerate() {
        for d in 0..points.n_dims {
            sub.set(d, new_p, points.dims[d][old_p]);
        }
    }
    sub
}

fn pointset_from_means(means_pool: &[Vec<f32>], n_dims: usize) -> PointSet {
    let mut set = PointSet::new(means_pool.len(), n_dims);
    for (p, mean) in means_pool.iter().enumerate() {
        for d in 0..n_dims {
            set.set(d, p, mean[d]);
        }
    }
    set
}

/// Fayyad-style refined initialization: `j` subsample-trained candidate mean
/// sets are pooled into a meta dataset of `j*k` points, each candidate set is
/// used to seed a k-means run over that meta dataset, and the lowest-distortion
/// result's means seed the real run.
fn fayyad_refined_init(points: &PointSet, k: usize, sub_size: usize, j: usize, rng: &mut impl Rng) -> Vec<Vec<f32>> {
    let mut candidate_sets: Vec<Vec<Vec<f32>>> = Vec::with_capacity(j);
    for _ in 0..j {
        let sub = subsample(points, sub_size, rng);
        let init = random_init(&sub, k, rng);
        let (_, means, _) = iterate_to_convergence(&sub, init, 30);
        candidate_sets.push(means);
    }

    let mut meta_pool: Vec<Vec<f32>> = Vec::with_capacity(j * k);
    for set in &candidate_sets {
        meta_pool.extend(set.iter().cloned());
    }
    let meta_points = pointset_from_means(&meta_pool, points.n_dims);

    let mut best_means = candidate_sets[0].clone();
    let mut best_error = f32::INFINITY;
    for candidate in &candidate_sets {
        let (assignments, means, _) = iterate_to_convergence(&meta_points, candidate.clone(), 30);
        let error = total_error(&meta_points, &assignments, &means);
        if error < best_error {
            best_error = error;
            best_means = means;
        }
    }
    best_means
}

fn prune(points: &PointSet, mut assignments: Vec<usize>, mut means: Vec<Vec<f32>>, cfg: &PruneConfig) -> (Vec<usize>, Vec<Vec<f32>>) {
    let initial_error = total_error(points, &assignments, &means);
    let final_error = cfg.stopping_factor * initial_error;
    let mut new_error = 0.0f32;

    while means.len() > 1 && new_error < final_error && cfg.stopping_k > 0 && means.len() > cfg.stopping_k {
        let k = means.len();
        let mut k_errors = vec![0.0f32; k];
        for p in 0..points.n_points {
            let mut min1 = points.square_distance(p, &means[0]);
            let mut min2 = points.square_distance(p, &means[1]);
            let mut nearest = if min1 <= min2 { 0 } else { 1 };
            if min2 < min1 {
                std::mem::swap(&mut min1, &mut min2);
            }
            for kk in 2..k {
                let d = points.square_distance(p, &means[kk]);
                if d < min1 {
                    min2 = min1;
                    min1 = d;
                    nearest = kk;
                }
            }
            k_errors[nearest] += min2 - min1;
        }
        let (worst_k, _) = k_errors
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();

        let last = k - 1;
        means.swap(worst_k, last);
        means.pop();

        assignments = assign_step(points, &means);
        let (recomputed, _) = recompute_means(points, &assignments, means.len(), &means);
        means = recomputed;
        let (iterated_assignments, iterated_means, _) = iterate_to_convergence(points, means, 3);
        assignments = iterated_assignments;
        means = iterated_means;
        new_error = total_error(points, &assignments, &means);
    }

    (assignments, means)
}

/// 3x3 majority filter: if 5 or more of a point's 8 grid neighbors share a
/// label different from its own, reassign it to that label. Operates on a
/// frozen snapshot so every point in the pass sees the same neighborhood.
fn majority_cleanup(assignments: &[usize], width: usize, height: usize, k: usize) -> Vec<usize> {
    let mut img = Image::<i32>::new(width, height);
    img.set_roi(Roi::full(width, height));
    for (p, &label) in assignments.iter().enumerate() {
        let x = p % width;
        let y = p / width;
        *img.get_mut(x, y) = label as i32;
    }
    img.reflect_to_roi(1);

    let mut out = assignments.to_vec();
    for y in 0..height {
        for x in 0..width {
            let mut histo = vec![0u32; k];
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if let Some(&label) = img.try_get(x as i64 + dx, y as i64 + dy) {
                        histo[label as usize] += 1;
                    }
                }
            }
            let current = *img.get(x, y) as usize;
            if let Some((new_label, _)) = histo
                .iter()
                .enumerate()
                .find(|(label, &count)| count > 4 && *label != current)
            {
                out[y * width + x] = new_label;
            }
        }
    }
    out
}

/// Run K-means (C9) to completion: initialization, Lloyd iteration with
/// empty-cluster reseeding, optional pruning, and optional 2-D majority
/// cleanup.
pub fn run(points: &PointSet, config: &KMeansConfig, rng: &mut impl Rng) -> KMeansResult {
    let init_means = match &config.init {
        InitStrategy::RandomPoints => random_init(points, config.k, rng),
        InitStrategy::FayyadRefined { sub_size, j } => fayyad_refined_init(points, config.k, *sub_size, *j, rng),
    };

    let (mut assignments, mut means) = iterate_with_reseed(points, init_means, config.max_iters, config.reseed_empty);

    if let Some(prune_cfg) = &config.prune {
        let (pruned_assignments, pruned_means) = prune(points, assignments, means, prune_cfg);
        assignments = pruned_assignments;
        means = pruned_means;
    }

    if let Some((width, height)) = config.majority_cleanup {
        assignments = majority_cleanup(&assignments, width, height, means.len());
    }

    let k = means.len();
    KMeansResult { assignments, means, k }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg64;

    fn two_blob_points() -> PointSet {
        // 8 points: 4 clustered near (0,0), 4 near (10,10), in 2 dims.
        let mut pts = PointSet::new(8, 2);
        let coords = [
            (0.0, 0.0),
            (0.1, -0.1),
            (-0.1, 0.1),
            (0.2, 0.0),
            (10.0, 10.0),
            (9.9, 10.1),
            (10.1, 9.9),
            (10.0, 9.8),
        ];
        for (p, (x, y)) in coords.iter().enumerate() {
            pts.set(0, p, *x);
            pts.set(1, p, *y);
        }
        pts
    }

    #[test]
    fn separates_two_well_formed_blobs() {
        let pts = two_blob_points();
        let mut rng = Pcg64::new(42, 54);
        let cfg = KMeansConfig {
            k: 2,
            max_iters: 30,
            init: InitStrategy::RandomPoints,
            prune: None,
            reseed_empty: true,
            majority_cleanup: None,
        };
        let result = run(&pts, &cfg, &mut rng);
        let label0 = result.assignments[0];
        for p in 0..4 {
            assert_eq!(result.assignments[p], label0);
        }
        let label1 = result.assignments[4];
        assert_ne!(label0, label1);
        for p in 4..8 {
            assert_eq!(result.assignments[p], label1);
        }
    }

    #[test]
    fn prune_reduces_k_when_overclustered() {
        let pts = two_blob_points();
        let mut rng = Pcg64::new(7, 1);
        let cfg = KMeansConfig {
            k: 6,
            max_iters: 30,
            init: InitStrategy::RandomPoints,
            prune: Some(PruneConfig {
                stopping_factor: 1.5,
                stopping_k: 1,
            }),
            reseed_empty: true,
            majority_cleanup: None,
        };
        let result = run(&pts, &cfg, &mut rng);
        assert!(result.k < 6);
    }

    #[test]
    fn majority_cleanup_removes_isolated_label() {
        // 3x3 grid, all label 0 except the center which is an island of 1.
        let width = 3;
        let height = 3;
        let mut assignments = vec![0usize; 9];
        assignments[4] = 1;
        let cleaned = majority_cleanup(&assignments, width, height, 2);
        assert_eq!(cleaned[4], 0);
    }
}
