use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Settings of the demo application.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub map: MapSettings,
    pub terrain: TerrainSettings,
    pub field: FieldSettings,
    pub queries: QuerySettings,
}

/// Geometry of the elevation map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub rows: usize,
    pub cols: usize,
    pub resolution: f64,
    pub position: [f64; 2],
    pub elevation_layer: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 100,
            resolution: 0.05,
            position: [0.0, 0.0],
            elevation_layer: "elevation".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    Flat,
    Step,
    Bumps,
}

/// Synthetic terrain generated into the elevation layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub kind: TerrainKind,
    pub height: f32,
    pub step_height: f32,
    pub bumps: usize,
    pub bump_height: f32,
    pub bump_radius: f64,
    pub seed: u64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            kind: TerrainKind::Flat,
            height: 0.0,
            step_height: 0.3,
            bumps: 10,
            bump_height: 0.4,
            bump_radius: 0.3,
            seed: 0,
        }
    }
}

/// Height range covered by the distance field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    pub min_height: f64,
    pub max_height: f64,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            min_height: -0.5,
            max_height: 1.0,
        }
    }
}

/// Concurrent query benchmark.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub workers: usize,
    pub samples_per_worker: usize,
    pub seed: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            workers: 4,
            samples_per_worker: 10_000,
            seed: 0,
        }
    }
}

/// Loads settings from a TOML file, with `STRATA_<TABLE>__<KEY>` environment overrides.
pub fn load_config(path: &str) -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("STRATA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
fn parse_config(toml: &str) -> Result<Settings, ConfigError> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()
}
