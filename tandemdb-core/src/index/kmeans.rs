//! Spherical-style k-means used to train inverted-file partitions.
//!
//! Points are assigned to the centroid with the largest inner product, which
//! matches how the coarse quantizer routes vectors at add and search time.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::similarity::inner_product;
use crate::vector::VectorBatch;

pub(crate) const KMEANS_ITERATIONS: usize = 10;
const KMEANS_SEED: u64 = 1234;

/// Runs k-means over `points` and returns `k` centroids, row-major.
pub(crate) fn train_centroids(points: &VectorBatch, k: usize) -> Result<Vec<f32>> {
    let n = points.len();
    if k == 0 {
        return Err(Error::Training("number of partitions must be positive".into()));
    }
    if n < k {
        return Err(Error::Training(format!(
            "need at least {k} training points, got {n}"
        )));
    }

    let dim = points.dimension();
    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
    let mut centroids: Vec<f32> = Vec::with_capacity(k * dim);
    for idx in rand::seq::index::sample(&mut rng, n, k).into_iter() {
        centroids.extend_from_slice(points.row(idx));
    }

    let mut assignments = vec![usize::MAX; n];
    for iteration in 0..KMEANS_ITERATIONS {
        let mut changed = 0usize;
        for (i, point) in points.rows().enumerate() {
            let best = nearest(&centroids, dim, point);
            if assignments[i] != best {
                assignments[i] = best;
                changed += 1;
            }
        }

        if changed == 0 {
            tracing::debug!(iteration, "k-means converged");
            break;
        }

        // Recompute centroids
        let mut sums = vec![0.0f64; k * dim];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.rows().zip(assignments.iter()) {
            counts[cluster] += 1;
            let sum = &mut sums[cluster * dim..(cluster + 1) * dim];
            for (s, &v) in sum.iter_mut().zip(point) {
                *s += v as f64;
            }
        }

        for cluster in 0..k {
            // Empty clusters keep their previous centroid.
            if counts[cluster] == 0 {
                continue;
            }
            let count = counts[cluster] as f64;
            for j in 0..dim {
                centroids[cluster * dim + j] = (sums[cluster * dim + j] / count) as f32;
            }
        }
    }

    Ok(centroids)
}

fn nearest(centroids: &[f32], dim: usize, point: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (c, centroid) in centroids.chunks_exact(dim).enumerate() {
        let score = inner_product(point, centroid);
        if score > best_score {
            best_score = score;
            best = c;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_too_few_points() {
        let points = VectorBatch::from_rows(2, &[[1.0f32, 0.0]]).unwrap();
        assert!(matches!(
            train_centroids(&points, 2),
            Err(Error::Training(_))
        ));
    }

    #[test]
    fn test_separates_clusters() {
        let rows = [
            [1.0f32, 0.0],
            [0.9, 0.1],
            [0.95, 0.05],
            [0.0, 1.0],
            [0.1, 0.9],
            [0.05, 0.95],
        ];
        let points = VectorBatch::from_rows(2, &rows).unwrap();
        let centroids = train_centroids(&points, 2).unwrap();
        assert_eq!(centroids.len(), 4);

        let a = nearest(&centroids, 2, &[1.0, 0.0]);
        let b = nearest(&centroids, 2, &[0.0, 1.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic() {
        let rows: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![(i as f32).sin(), (i as f32).cos(), 0.5])
            .collect();
        let points = VectorBatch::from_rows(3, &rows).unwrap();
        assert_eq!(
            train_centroids(&points, 4).unwrap(),
            train_centroids(&points, 4).unwrap()
        );
    }
}
