use std::thread;

use anyhow::{Context, anyhow};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_sdf::SignedDistanceField;
use tracing::{info, warn};

use crate::config::QuerySettings;

/// Aggregates over the queries of one worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryStats {
    pub samples: usize,
    /// Queries that landed inside the terrain (negative distance).
    pub inside: usize,
    pub min_distance: f64,
    pub max_distance: f64,
    pub mean_gradient_norm: f64,
}

impl QueryStats {
    fn merge(self, other: QueryStats) -> QueryStats {
        let samples = self.samples + other.samples;
        let mean_gradient_norm = if samples == 0 {
            0.0
        } else {
            (self.mean_gradient_norm * self.samples as f64
                + other.mean_gradient_norm * other.samples as f64)
                / samples as f64
        };
        QueryStats {
            samples,
            inside: self.inside + other.inside,
            min_distance: self.min_distance.min(other.min_distance),
            max_distance: self.max_distance.max(other.max_distance),
            mean_gradient_norm,
        }
    }
}

impl Default for QueryStats {
    fn default() -> Self {
        Self {
            samples: 0,
            inside: 0,
            min_distance: f64::INFINITY,
            max_distance: f64::NEG_INFINITY,
            mean_gradient_norm: 0.0,
        }
    }
}

/// Queries the field from several threads at random points inside its bounds.
///
/// The field is shared by reference, no locking is involved.
pub fn run_queries(
    sdf: &SignedDistanceField,
    settings: &QuerySettings,
) -> anyhow::Result<QueryStats> {
    if settings.workers == 0 {
        warn!("No query workers configured, skipping queries.");
        return Ok(QueryStats::default());
    }

    let results = thread::scope(|scope| {
        let handles = (0..settings.workers)
            .map(|worker| {
                let seed = settings.seed.wrapping_add(worker as u64);
                thread::Builder::new()
                    .name(format!("query-{}", worker))
                    .spawn_scoped(scope, move || {
                        query_worker(sdf, seed, settings.samples_per_worker)
                    })
                    .context("failed to spawn query worker")
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow!("query worker panicked"))
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let total = results
        .into_iter()
        .fold(QueryStats::default(), QueryStats::merge);
    info!(
        workers = settings.workers,
        samples = total.samples,
        inside = total.inside,
        min_distance = total.min_distance,
        max_distance = total.max_distance,
        mean_gradient_norm = total.mean_gradient_norm,
        "Query workers finished"
    );
    Ok(total)
}

fn query_worker(sdf: &SignedDistanceField, seed: u64, samples: usize) -> QueryStats {
    let mut rng = StdRng::seed_from_u64(seed);
    let (low, high) = field_bounds(sdf);
    let mut stats = QueryStats::default();
    let mut gradient_norm_sum = 0.0;

    for _ in 0..samples {
        let position = Vector3::new(
            rng.random_range(low.x..=high.x),
            rng.random_range(low.y..=high.y),
            rng.random_range(low.z..=high.z),
        );
        let (distance, gradient) = sdf.value_and_gradient_at(&position);

        stats.samples += 1;
        if distance < 0.0 {
            stats.inside += 1;
        }
        stats.min_distance = stats.min_distance.min(distance);
        stats.max_distance = stats.max_distance.max(distance);
        gradient_norm_sum += gradient.norm();
    }

    if stats.samples > 0 {
        stats.mean_gradient_norm = gradient_norm_sum / stats.samples as f64;
    }
    stats
}

/// World-space corners spanned by the field nodes.
fn field_bounds(sdf: &SignedDistanceField) -> (Vector3<f64>, Vector3<f64>) {
    let lookup = sdf.lookup();
    let origin = *lookup.origin();
    let size = lookup.size();
    let extent = Vector3::new(
        (size.rows - 1) as f64,
        (size.cols - 1) as f64,
        (size.layers - 1) as f64,
    ) * lookup.resolution();
    let low = Vector3::new(origin.x - extent.x, origin.y - extent.y, origin.z);
    let high = Vector3::new(origin.x, origin.y, origin.z + extent.z);
    (low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;
    use strata_map::GridMap;

    fn flat_sdf() -> SignedDistanceField {
        let mut map = GridMap::new(10, 10, 0.1, Vector2::zeros()).unwrap();
        map.add_constant_layer("elevation", 0.0);
        SignedDistanceField::new(&map, "elevation", -0.5, 0.5).unwrap()
    }

    #[test]
    fn test_workers_are_deterministic() {
        let sdf = flat_sdf();
        let settings = QuerySettings {
            workers: 3,
            samples_per_worker: 200,
            seed: 5,
        };
        let a = run_queries(&sdf, &settings).unwrap();
        let b = run_queries(&sdf, &settings).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.samples, 600);
        assert!(a.inside > 0);
        assert!(a.min_distance < 0.0 && a.max_distance > 0.0);
    }

    #[test]
    fn test_no_workers() {
        let sdf = flat_sdf();
        let settings = QuerySettings {
            workers: 0,
            samples_per_worker: 10,
            seed: 0,
        };
        let stats = run_queries(&sdf, &settings).unwrap();
        assert_eq!(stats.samples, 0);
    }

    #[test]
    fn test_field_bounds() {
        let sdf = flat_sdf();
        let (low, high) = field_bounds(&sdf);
        assert!((high.x - 0.45).abs() < 1e-9);
        assert!((low.x + 0.45).abs() < 1e-9);
        assert!((low.z + 0.5).abs() < 1e-9);
        assert!(high.z > low.z);
    }
}
