use anyhow::ensure;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_map::GridMap;
use tracing::{debug, info};

use crate::config::{MapSettings, TerrainKind, TerrainSettings};

/// A Gaussian bump added on top of the base height.
#[derive(Debug, Clone, Copy)]
struct Bump {
    centre: Vector2<f64>,
    height: f32,
}

/// Creates the elevation map described by the settings.
pub fn build_map(map: &MapSettings, terrain: &TerrainSettings) -> anyhow::Result<GridMap> {
    let position = Vector2::new(map.position[0], map.position[1]);
    let mut grid_map = GridMap::new(map.rows, map.cols, map.resolution, position)?;
    let layer = map.elevation_layer.as_str();

    match terrain.kind {
        TerrainKind::Flat => grid_map.add_constant_layer(layer, terrain.height),
        TerrainKind::Step => {
            // Raised half on the negative x side of the map centre.
            let (base, step) = (terrain.height, terrain.height + terrain.step_height);
            grid_map.add_layer_from_fn(layer, |p| if p.x < position.x { step } else { base });
        }
        TerrainKind::Bumps => {
            ensure!(
                terrain.bump_radius.is_finite() && terrain.bump_radius > 0.0,
                "bump radius must be positive and finite, got {}",
                terrain.bump_radius
            );
            let bumps = random_bumps(&grid_map, terrain);
            let two_sigma_sq = 2.0 * terrain.bump_radius * terrain.bump_radius;
            grid_map.add_layer_from_fn(layer, |p| {
                bumps.iter().fold(terrain.height, |z, bump| {
                    let falloff = (-(p - bump.centre).norm_squared() / two_sigma_sq).exp();
                    z + bump.height * falloff as f32
                })
            });
        }
    }

    info!(
        rows = map.rows,
        cols = map.cols,
        resolution = map.resolution,
        kind = ?terrain.kind,
        "Generated terrain"
    );
    Ok(grid_map)
}

fn random_bumps(map: &GridMap, terrain: &TerrainSettings) -> Vec<Bump> {
    let mut rng = StdRng::seed_from_u64(terrain.seed);
    let half = map.length() / 2.0;
    let centre = *map.position();

    (0..terrain.bumps)
        .map(|_| {
            let bump = Bump {
                centre: Vector2::new(
                    centre.x + rng.random_range(-half.x..=half.x),
                    centre.y + rng.random_range(-half.y..=half.y),
                ),
                height: terrain.bump_height * rng.random_range(0.5..=1.0),
            };
            debug!(?bump, "Placed bump");
            bump
        })
        .collect()
}
