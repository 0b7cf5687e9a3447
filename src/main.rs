mod config; // brings `config.rs` in as `crate::config`
mod queries; // concurrent read-only queries
mod terrain; // synthetic elevation maps

use anyhow::Context;
use strata_sdf::{FieldPoint, SignedDistanceField};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_CONFIG_PATH, load_config};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let settings = load_config(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    let map = terrain::build_map(&settings.map, &settings.terrain)
        .context("failed to build the elevation map")?;

    let sdf = SignedDistanceField::new(
        &map,
        &settings.map.elevation_layer,
        settings.field.min_height,
        settings.field.max_height,
    )
    .context("failed to build the signed distance field")?;

    queries::run_queries(&sdf, &settings.queries)?;
    log_point_cloud_summary(&sdf.as_point_cloud(), sdf.lookup().resolution());

    info!("Done.");
    Ok(())
}

/// Logs distance range and the number of nodes close to the terrain surface.
fn log_point_cloud_summary(points: &[FieldPoint], resolution: f64) {
    let half_cell = (resolution / 2.0) as f32;
    let (min, max) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
            (min.min(p.intensity), max.max(p.intensity))
        });
    let surface = points
        .iter()
        .filter(|p| p.intensity.abs() <= half_cell)
        .count();
    let inside = points.iter().filter(|p| p.intensity < 0.0).count();

    info!(
        points = points.len(),
        min_distance = min,
        max_distance = max,
        surface,
        inside,
        "Point cloud summary"
    );
}
