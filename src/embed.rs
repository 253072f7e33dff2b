//! UMAP embedding of k-mer frequency profiles.
//!
//! Implements Uniform Manifold Approximation and Projection (McInnes et al.,
//! 2018) in four phases:
//!
//! 1. exact k-nearest-neighbor search under the chosen [`Metric`];
//! 2. fuzzy simplicial set with binary-searched per-point bandwidths,
//!    symmetrized with the probabilistic t-conorm;
//! 3. least-squares fit of the `1 / (1 + a·d^(2b))` curve to `min_dist`;
//! 4. stochastic gradient descent with negative sampling.
//!
//! Everything runs on one thread in a fixed order from a seeded ChaCha RNG,
//! so the same input and parameters always give a bit-identical embedding.

use std::collections::BTreeMap;

use ndarray::{s, Array2, ArrayView2, ArrayViewMut2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::{
    config::EmbedParams,
    error::KmerBinError,
    metric::Metric,
    table::{EmbeddedTable, FrequencyTable},
};

#[cfg(feature = "tracing")]
use tracing::{debug, info, info_span};

/// Reads × `n_components` coordinates, in input row order.
pub type Embedding = Array2<f64>;

/// Negative samples drawn per positive edge sample.
pub const NEGATIVE_SAMPLE_RATE: usize = 5;
/// Datasets up to this size are optimized for [`SMALL_DATA_EPOCHS`].
pub const SMALL_DATA_THRESHOLD: usize = 10_000;
/// Optimization epochs for datasets of at most [`SMALL_DATA_THRESHOLD`] reads.
pub const SMALL_DATA_EPOCHS: usize = 500;
/// Optimization epochs for larger datasets.
pub const LARGE_DATA_EPOCHS: usize = 200;
/// Rows whose distances are held at once by the default neighbor search.
pub const DISTANCE_BLOCK_ROWS: usize = 256;

const SPREAD: f64 = 1.0;
const INITIAL_ALPHA: f64 = 1.0;
const REPULSION_STRENGTH: f64 = 1.0;
const INIT_RANGE: f64 = 10.0;
const GRADIENT_CLIP: f64 = 4.0;
const SMOOTH_K_ITERATIONS: usize = 64;
const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const MIN_K_DIST_SCALE: f64 = 1e-3;

/// Embeds the motif frequencies of `table` and joins the result with its
/// `read` and `length` columns.
///
/// # Errors
///
/// - [`KmerBinError::UnknownMetric`] if `params.metric` is not recognized;
/// - [`KmerBinError::Embedding`] if there are fewer than two reads or
///   `n_neighbors` exceeds the number of reads.
pub fn embed(table: &FrequencyTable, params: &EmbedParams) -> Result<EmbeddedTable, KmerBinError> {
    let umap = Umap::from_params(params)?;

    #[cfg(feature = "tracing")]
    info!(
        reads = table.n_reads(),
        motifs = table.motifs().len(),
        n_neighbors = umap.n_neighbors,
        min_dist = umap.min_dist,
        metric = %umap.metric,
        n_components = umap.n_components,
        low_memory = umap.low_memory,
        seed = umap.random_state,
        "Embedding k-mer profiles"
    );

    let coords = umap.fit(table.frequencies().view())?;
    EmbeddedTable::from_frequencies(table, coords)
}

/// UMAP dimensionality reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct Umap {
    n_neighbors: usize,
    min_dist: f64,
    metric: Metric,
    low_memory: bool,
    n_components: usize,
    random_state: u64,
}

/// A directed edge of the symmetrized neighbor graph.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    head: usize,
    tail: usize,
    weight: f64,
}

/// Nearest neighbors of every point, nearest first, the point itself in
/// column 0.
struct KnnGraph {
    indices: Array2<usize>,
    distances: Array2<f64>,
}

impl Umap {
    /// Builds a reducer, resolving the metric name.
    pub fn from_params(params: &EmbedParams) -> Result<Self, KmerBinError> {
        if params.n_components == 0 {
            return Err(KmerBinError::embedding("n_components must be at least 1"));
        }
        if params.n_neighbors < 2 {
            return Err(KmerBinError::embedding("n_neighbors must be at least 2"));
        }
        if !(params.min_dist.is_finite() && params.min_dist >= 0.0) {
            return Err(KmerBinError::embedding(format!(
                "min_dist must be non-negative, got {}",
                params.min_dist
            )));
        }
        Ok(Self {
            n_neighbors: params.n_neighbors,
            min_dist: params.min_dist,
            metric: params.metric.parse()?,
            low_memory: params.low_memory,
            n_components: params.n_components,
            random_state: params.random_state,
        })
    }

    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Runs UMAP on a samples × features matrix and returns the
    /// samples × `n_components` embedding.
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> Result<Embedding, KmerBinError> {
        let n = data.nrows();
        if n < 2 {
            return Err(KmerBinError::embedding(format!(
                "at least 2 reads are required, got {n}"
            )));
        }
        if self.n_neighbors > n {
            return Err(KmerBinError::embedding(format!(
                "n_neighbors ({}) is larger than the number of reads ({n})",
                self.n_neighbors
            )));
        }

        let knn = {
            #[cfg(feature = "tracing")]
            let _span = info_span!("nearest_neighbors", low_memory = self.low_memory).entered();
            nearest_neighbors(data, self.n_neighbors, self.metric, self.low_memory)
        };

        let n_epochs = if n <= SMALL_DATA_THRESHOLD {
            SMALL_DATA_EPOCHS
        } else {
            LARGE_DATA_EPOCHS
        };
        let edges = fuzzy_simplicial_set(&knn, n_epochs);

        #[cfg(feature = "tracing")]
        debug!(edges = edges.len(), n_epochs, "Fuzzy simplicial set built");

        let (a, b) = find_ab_params(SPREAD, self.min_dist);

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut embedding = Array2::from_shape_fn((n, self.n_components), |_| {
            rng.gen_range(-INIT_RANGE..INIT_RANGE)
        });

        {
            #[cfg(feature = "tracing")]
            let _span = info_span!("optimize_layout", n_epochs).entered();
            optimize_layout(&mut embedding, &edges, n_epochs, a, b, &mut rng);
        }

        #[cfg(feature = "tracing")]
        info!(rows = n, dims = self.n_components, "Embedding complete");

        Ok(embedding)
    }
}

/// Distance between rows `i` and `j`, always evaluated with the lower index
/// first so the dense and low-memory paths agree bit for bit.
fn pair_distance(data: ArrayView2<'_, f64>, metric: Metric, i: usize, j: usize) -> f64 {
    match i.cmp(&j) {
        std::cmp::Ordering::Equal => 0.0,
        std::cmp::Ordering::Less => metric.distance(data.row(i), data.row(j)),
        std::cmp::Ordering::Greater => metric.distance(data.row(j), data.row(i)),
    }
}

/// Fills `block` with the distances from rows `start..start + block.nrows()`
/// to every row of `data`.
fn distance_block(
    data: ArrayView2<'_, f64>,
    metric: Metric,
    start: usize,
    block: &mut ArrayViewMut2<'_, f64>,
) {
    for (offset, mut row) in block.rows_mut().into_iter().enumerate() {
        let i = start + offset;
        for (j, d) in row.iter_mut().enumerate() {
            *d = pair_distance(data, metric, i, j);
        }
    }
}

/// Exact neighbor search. Distances are computed for [`DISTANCE_BLOCK_ROWS`]
/// rows at a time, or one row at a time with `low_memory`, so the buffer
/// never holds more than `DISTANCE_BLOCK_ROWS * n` values.
fn nearest_neighbors(
    data: ArrayView2<'_, f64>,
    k: usize,
    metric: Metric,
    low_memory: bool,
) -> KnnGraph {
    let n = data.nrows();
    let block_rows = if low_memory { 1 } else { DISTANCE_BLOCK_ROWS.min(n).max(1) };

    let mut indices = Array2::zeros((n, k));
    let mut distances = Array2::zeros((n, k));
    let mut buffer = Array2::zeros((block_rows, n));
    let mut candidates: Vec<(f64, usize)> = Vec::with_capacity(n);

    for start in (0..n).step_by(block_rows) {
        let rows = block_rows.min(n - start);
        let mut block = buffer.slice_mut(s![..rows, ..]);
        distance_block(data, metric, start, &mut block);

        for (offset, row) in block.rows().into_iter().enumerate() {
            let i = start + offset;
            candidates.clear();
            candidates.extend(row.iter().copied().zip(0..n));

            // Self first, then by distance, ties by row index.
            let order = |x: &(f64, usize), y: &(f64, usize)| {
                (x.1 != i)
                    .cmp(&(y.1 != i))
                    .then(x.0.total_cmp(&y.0))
                    .then(x.1.cmp(&y.1))
            };
            if k < n {
                candidates.select_nth_unstable_by(k - 1, order);
            }
            candidates[..k].sort_unstable_by(order);

            for (slot, &(d, j)) in candidates[..k].iter().enumerate() {
                indices[[i, slot]] = j;
                distances[[i, slot]] = d;
            }
        }
    }

    KnnGraph { indices, distances }
}

/// Per-point `(rho, sigma)`: the distance to the nearest distinct neighbor
/// and the bandwidth that makes the membership strengths sum to `log2(k)`.
fn smooth_knn_dist(distances: &Array2<f64>) -> Vec<(f64, f64)> {
    let k = distances.ncols();
    let target = (k as f64).log2();
    let mean_all = distances.mean().unwrap_or(0.0);

    distances
        .rows()
        .into_iter()
        .map(|row| {
            let rho = row.iter().copied().find(|&d| d > 0.0).unwrap_or(0.0);

            let (mut lo, mut hi, mut mid) = (0.0_f64, f64::INFINITY, 1.0_f64);
            for _ in 0..SMOOTH_K_ITERATIONS {
                let psum: f64 = row
                    .iter()
                    .skip(1)
                    .map(|&d| {
                        let d = d - rho;
                        if d > 0.0 {
                            (-d / mid).exp()
                        } else {
                            1.0
                        }
                    })
                    .sum();

                if (psum - target).abs() < SMOOTH_K_TOLERANCE {
                    break;
                }
                if psum > target {
                    hi = mid;
                    mid = (lo + hi) / 2.0;
                } else {
                    lo = mid;
                    mid = if hi.is_infinite() {
                        mid * 2.0
                    } else {
                        (lo + hi) / 2.0
                    };
                }
            }

            let floor = if rho > 0.0 {
                MIN_K_DIST_SCALE * row.mean().unwrap_or(0.0)
            } else {
                MIN_K_DIST_SCALE * mean_all
            };
            (rho, mid.max(floor))
        })
        .collect()
}

/// Builds the symmetrized, pruned edge list, sorted by `(head, tail)`.
fn fuzzy_simplicial_set(knn: &KnnGraph, n_epochs: usize) -> Vec<Edge> {
    let params = smooth_knn_dist(&knn.distances);

    let mut directed: FxHashMap<(usize, usize), f64> = FxHashMap::default();
    for (i, (row_indices, row_distances)) in knn
        .indices
        .rows()
        .into_iter()
        .zip(knn.distances.rows())
        .enumerate()
    {
        let (rho, sigma) = params[i];
        for (&j, &d) in row_indices.iter().zip(row_distances.iter()) {
            if j == i {
                continue;
            }
            let strength = if d - rho <= 0.0 || sigma == 0.0 {
                1.0
            } else {
                (-(d - rho) / sigma).exp()
            };
            directed.insert((i, j), strength);
        }
    }

    // w(i,j) + w(j,i) - w(i,j)·w(j,i), stored in both directions.
    let mut symmetric: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (&(i, j), &w_ij) in &directed {
        let w_ji = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let w = w_ij + w_ji - w_ij * w_ji;
        symmetric.insert((i, j), w);
        symmetric.insert((j, i), w);
    }

    let max_weight = symmetric.values().copied().fold(0.0, f64::max);
    let threshold = max_weight / n_epochs as f64;

    symmetric
        .into_iter()
        .filter(|&(_, w)| w > 0.0 && w >= threshold)
        .map(|((head, tail), weight)| Edge { head, tail, weight })
        .collect()
}

/// Fits `a` and `b` of `1 / (1 + a·x^(2b))` to the offset exponential
/// defined by `spread` and `min_dist`, by Levenberg-Marquardt least squares.
pub(crate) fn find_ab_params(spread: f64, min_dist: f64) -> (f64, f64) {
    const SAMPLES: usize = 300;
    const MAX_ITERATIONS: usize = 500;

    let xs: Vec<f64> = (0..SAMPLES)
        .map(|i| 3.0 * spread * i as f64 / (SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let cost = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| {
                let r = 1.0 / (1.0 + a * x.powf(2.0 * b)) - y;
                r * r
            })
            .sum()
    };

    let (mut a, mut b) = (1.0_f64, 1.0_f64);
    let mut current = cost(a, b);
    let mut lambda = 1e-3;

    for _ in 0..MAX_ITERATIONS {
        // Normal equations of the linearized residuals.
        let (mut jaa, mut jab, mut jbb, mut ga, mut gb) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&x, &y) in xs.iter().zip(&ys) {
            if x <= 0.0 {
                continue;
            }
            let u = x.powf(2.0 * b);
            let denom = 1.0 + a * u;
            let r = 1.0 / denom - y;
            let da = -u / (denom * denom);
            let db = -2.0 * a * u * x.ln() / (denom * denom);
            jaa += da * da;
            jab += da * db;
            jbb += db * db;
            ga += da * r;
            gb += db * r;
        }

        let (maa, mbb) = (jaa * (1.0 + lambda), jbb * (1.0 + lambda));
        let det = maa * mbb - jab * jab;
        if det.abs() < f64::MIN_POSITIVE {
            break;
        }
        let step_a = -(mbb * ga - jab * gb) / det;
        let step_b = -(maa * gb - jab * ga) / det;

        let (next_a, next_b) = (a + step_a, b + step_b);
        let next = if next_a > 0.0 && next_b > 0.0 {
            cost(next_a, next_b)
        } else {
            f64::INFINITY
        };

        if next < current {
            let improvement = current - next;
            a = next_a;
            b = next_b;
            current = next;
            lambda = (lambda / 10.0).max(1e-12);
            if improvement < 1e-14 {
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                break;
            }
        }
    }

    (a, b)
}

fn clip(value: f64) -> f64 {
    value.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

fn squared_distance(embedding: &Array2<f64>, i: usize, j: usize) -> f64 {
    embedding
        .row(i)
        .iter()
        .zip(embedding.row(j).iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

/// Stochastic gradient descent over the edge list with a linearly decaying
/// learning rate. Edges are sampled in proportion to their weight.
fn optimize_layout(
    embedding: &mut Array2<f64>,
    edges: &[Edge],
    n_epochs: usize,
    a: f64,
    b: f64,
    rng: &mut ChaCha8Rng,
) {
    let n_vertices = embedding.nrows();
    let dim = embedding.ncols();

    let max_weight = edges.iter().map(|e| e.weight).fold(0.0, f64::max);
    let epochs_per_sample: Vec<f64> = edges.iter().map(|e| max_weight / e.weight).collect();
    let epochs_per_negative_sample: Vec<f64> = epochs_per_sample
        .iter()
        .map(|&eps| eps / NEGATIVE_SAMPLE_RATE as f64)
        .collect();
    let mut next_sample = epochs_per_sample.clone();
    let mut next_negative_sample = epochs_per_negative_sample.clone();

    for epoch in 0..n_epochs {
        let now = epoch as f64;
        let alpha = INITIAL_ALPHA * (1.0 - now / n_epochs as f64);

        for (e, edge) in edges.iter().enumerate() {
            if next_sample[e] > now {
                continue;
            }
            let (j, k) = (edge.head, edge.tail);

            let dist_sq = squared_distance(embedding, j, k);
            let attraction = if dist_sq > 0.0 {
                -2.0 * a * b * dist_sq.powf(b - 1.0) / (a * dist_sq.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..dim {
                let grad = clip(attraction * (embedding[[j, d]] - embedding[[k, d]]));
                embedding[[j, d]] += grad * alpha;
                embedding[[k, d]] -= grad * alpha;
            }
            next_sample[e] += epochs_per_sample[e];

            let n_negative = ((now - next_negative_sample[e]) / epochs_per_negative_sample[e])
                .floor()
                .max(0.0) as usize;
            for _ in 0..n_negative {
                let k = rng.gen_range(0..n_vertices);
                if k == j {
                    continue;
                }
                let dist_sq = squared_distance(embedding, j, k);
                if dist_sq <= 0.0 {
                    continue;
                }
                let repulsion = 2.0 * REPULSION_STRENGTH * b
                    / ((0.001 + dist_sq) * (a * dist_sq.powf(b) + 1.0));
                for d in 0..dim {
                    let grad = clip(repulsion * (embedding[[j, d]] - embedding[[k, d]]));
                    embedding[[j, d]] += grad * alpha;
                }
            }
            next_negative_sample[e] += n_negative as f64 * epochs_per_negative_sample[e];
        }
    }
}
