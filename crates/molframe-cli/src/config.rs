use crate::error::{CliError, Result};
use molframe::engine::config::{
    BondPolicy, ModelConfig, ModelConfigBuilder, SymmetryMatesConfig, SymmetryMatesConfigBuilder,
};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialBondConfig {
    max_radius: Option<f64>,
    policy: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialBoundaryConfig {
    fast_threshold: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialLookupConfig {
    cell_size: Option<f64>,
    elements_per_cell: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCacheConfig {
    bond_cache_capacity: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMatesConfig {
    radius: Option<f64>,
    cell_range: Option<i32>,
    chunk_size: Option<usize>,
}

/// Settings read from a TOML file, every value optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    bonds: Option<PartialBondConfig>,
    boundary: Option<PartialBoundaryConfig>,
    lookup: Option<PartialLookupConfig>,
    cache: Option<PartialCacheConfig>,
    mates: Option<PartialMatesConfig>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` when given, then applies `--set` overrides.
    pub fn load(path: Option<&Path>, set_values: &[String]) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_set_values(set_values)?;
        Ok(config)
    }

    pub fn model_config(&self) -> Result<ModelConfig> {
        let mut builder = ModelConfigBuilder::new();
        if let Some(bonds) = &self.bonds {
            if let Some(radius) = bonds.max_radius {
                builder = builder.bond_max_radius(radius);
            }
            if let Some(policy) = &bonds.policy {
                let policy =
                    BondPolicy::from_str(policy).map_err(|e| CliError::Config(e.to_string()))?;
                builder = builder.bond_policy(policy);
            }
        }
        if let Some(threshold) = self.boundary.as_ref().and_then(|b| b.fast_threshold) {
            builder = builder.fast_boundary_threshold(threshold);
        }
        if let Some(lookup) = &self.lookup {
            if let Some(size) = lookup.cell_size {
                builder = builder.lookup_cell_size(size);
            }
            if let Some(n) = lookup.elements_per_cell {
                builder = builder.lookup_elements_per_cell(n);
            }
        }
        if let Some(capacity) = self.cache.as_ref().and_then(|c| c.bond_cache_capacity) {
            builder = builder.bond_cache_capacity(capacity);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Command-line values win over the file; the radius is required from one of them.
    pub fn mates_config(
        &self,
        cli_radius: Option<f64>,
        cli_cell_range: Option<i32>,
    ) -> Result<SymmetryMatesConfig> {
        let file = self.mates.as_ref();
        let mut builder = SymmetryMatesConfigBuilder::new();
        if let Some(radius) = cli_radius.or(file.and_then(|m| m.radius)) {
            builder = builder.radius(radius);
        }
        if let Some(range) = cli_cell_range.or(file.and_then(|m| m.cell_range)) {
            builder = builder.cell_range(range);
        }
        if let Some(size) = file.and_then(|m| m.chunk_size) {
            builder = builder.chunk_size(size);
        }
        builder.build().map_err(|e| {
            CliError::Config(format!(
                "{}. Use --radius or set `mates.radius` in the config file.",
                e
            ))
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "bonds.max-radius" => {
                    self.bonds.get_or_insert_with(Default::default).max_radius =
                        Some(parse(key, value)?);
                }
                "bonds.policy" => {
                    self.bonds.get_or_insert_with(Default::default).policy =
                        Some(value.to_string());
                }
                "boundary.fast-threshold" => {
                    self.boundary
                        .get_or_insert_with(Default::default)
                        .fast_threshold = Some(parse(key, value)?);
                }
                "lookup.cell-size" => {
                    self.lookup.get_or_insert_with(Default::default).cell_size =
                        Some(parse(key, value)?);
                }
                "lookup.elements-per-cell" => {
                    self.lookup
                        .get_or_insert_with(Default::default)
                        .elements_per_cell = Some(parse(key, value)?);
                }
                "cache.bond-cache-capacity" => {
                    self.cache
                        .get_or_insert_with(Default::default)
                        .bond_cache_capacity = Some(parse(key, value)?);
                }
                "mates.radius" => {
                    self.mates.get_or_insert_with(Default::default).radius =
                        Some(parse(key, value)?);
                }
                "mates.cell-range" => {
                    self.mates.get_or_insert_with(Default::default).cell_range =
                        Some(parse(key, value)?);
                }
                "mates.chunk-size" => {
                    self.mates.get_or_insert_with(Default::default).chunk_size =
                        Some(parse(key, value)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("molframe.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_gives_core_defaults() {
        let config = PartialConfig::load(None, &[]).unwrap();
        assert_eq!(config.model_config().unwrap(), ModelConfig::default());
    }

    #[test]
    fn file_values_reach_the_model_config() {
        let (_dir, path) = write_config(
            r#"
            [bonds]
            max-radius = 3.5
            policy = "explicit-only"

            [lookup]
            elements-per-cell = 8

            [cache]
            bond-cache-capacity = 4
            "#,
        );
        let config = PartialConfig::load(Some(&path), &[]).unwrap();
        let model = config.model_config().unwrap();
        assert_eq!(model.bonds.max_radius, 3.5);
        assert_eq!(model.bonds.policy, BondPolicy::ExplicitOnly);
        assert_eq!(model.lookup.elements_per_cell, 8);
        assert_eq!(model.cache.bond_cache_capacity, 4);
    }

    #[test]
    fn set_values_override_the_file() {
        let (_dir, path) = write_config("[bonds]\nmax-radius = 3.5\n");
        let config = PartialConfig::load(
            Some(&path),
            &["bonds.max-radius=2.0".to_string(), "bonds.policy = always-infer".to_string()],
        )
        .unwrap();
        let model = config.model_config().unwrap();
        assert_eq!(model.bonds.max_radius, 2.0);
        assert_eq!(model.bonds.policy, BondPolicy::AlwaysInfer);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_dir, path) = write_config("[bonds]\nmax_radius = 3.5\n");
        assert!(matches!(
            PartialConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
        assert!(PartialConfig::load(None, &["bonds.radius=1".to_string()]).is_err());
        assert!(PartialConfig::load(None, &["bonds.max-radius".to_string()]).is_err());
        assert!(PartialConfig::load(None, &["bonds.max-radius=far".to_string()]).is_err());
    }

    #[test]
    fn invalid_values_fail_when_building() {
        let config = PartialConfig::load(None, &["bonds.policy=sometimes".to_string()]).unwrap();
        assert!(matches!(config.model_config(), Err(CliError::Config(_))));
        let config = PartialConfig::load(None, &["bonds.max-radius=-1".to_string()]).unwrap();
        assert!(config.model_config().is_err());
    }

    #[test]
    fn mates_radius_comes_from_cli_or_file() {
        let config = PartialConfig::load(None, &["mates.radius=6".to_string()]).unwrap();
        assert_eq!(config.mates_config(None, None).unwrap().radius, 6.0);
        let mates = config.mates_config(Some(2.0), Some(1)).unwrap();
        assert_eq!((mates.radius, mates.cell_range), (2.0, 1));
        assert!(PartialConfig::default().mates_config(None, None).is_err());
    }
}
