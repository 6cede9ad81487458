pub mod defaults;

use crate::cli::BuildOptions;
use crate::error::{CliError, Result};
use crate::utils::parser;
use blockforge::engine::config::{self as core_config, BuildConfig, MotifSource};
use defaults::DefaultsConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEmbeddingConfig {
    relaxation_sweeps: Option<usize>,
    bond_stiffness: Option<f64>,
    angle_stiffness: Option<f64>,
    repulsion_stiffness: Option<f64>,
    repulsion_distance: Option<f64>,
    max_step: Option<f64>,
    component_spacing: Option<f64>,
}

/// The optional TOML configuration file, every field optional.
///
/// ```toml
/// motif-table = "motifs.toml"
/// generate-coordinates = true
///
/// [embedding]
/// relaxation-sweeps = 500
/// max-step = 0.1
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialBuildConfig {
    motif_table: Option<PathBuf>,
    generate_coordinates: Option<bool>,
    embedding: Option<PartialEmbeddingConfig>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

impl PartialBuildConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the config file named in `options`, if any, and merges it with
    /// the command line. Command-line values take precedence.
    pub fn resolve(options: &BuildOptions) -> Result<BuildConfig> {
        let partial = match &options.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        partial.merge_with_cli(options)
    }

    pub fn merge_with_cli(mut self, options: &BuildOptions) -> Result<BuildConfig> {
        self.apply_set_values(&options.set_values)?;
        let defaults = DefaultsConfig::default();
        let embedding = self.embedding.take().unwrap_or_default();

        let motif_source = match options.registry.as_ref().or(self.motif_table.as_ref()) {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("Motif table does not exist: {}", path.display()),
                    )));
                }
                MotifSource::File(path.clone())
            }
            None => MotifSource::Builtin,
        };

        let generate_coordinates = if options.no_coordinates {
            false
        } else {
            self.generate_coordinates
                .unwrap_or(defaults.generate_coordinates)
        };

        let mut builder = core_config::BuildConfigBuilder::new()
            .motif_source(motif_source)
            .generate_coordinates(generate_coordinates);
        if let Some(v) = embedding.relaxation_sweeps {
            builder = builder.relaxation_sweeps(v);
        }
        if let Some(v) = embedding.bond_stiffness {
            builder = builder.bond_stiffness(v);
        }
        if let Some(v) = embedding.angle_stiffness {
            builder = builder.angle_stiffness(v);
        }
        if let Some(v) = embedding.repulsion_stiffness {
            builder = builder.repulsion_stiffness(v);
        }
        if let Some(v) = embedding.repulsion_distance {
            builder = builder.repulsion_distance(v);
        }
        if let Some(v) = embedding.max_step {
            builder = builder.max_step(v);
        }
        if let Some(v) = embedding.component_spacing {
            builder = builder.component_spacing(v);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = parser::parse_key_value(kv_pair)
                .map_err(|e| CliError::Config(format!("Invalid --set value: {}", e)))?;

            match key {
                "motif-table" => self.motif_table = Some(PathBuf::from(value.trim())),
                "generate-coordinates" => {
                    self.generate_coordinates = Some(parse_value(key, value)?)
                }
                _ => {
                    let Some(field) = key.strip_prefix("embedding.") else {
                        return Err(CliError::Config(format!(
                            "Unsupported configuration key for --set: '{}'",
                            key
                        )));
                    };
                    let embedding = self.embedding.get_or_insert_with(Default::default);
                    match field {
                        "relaxation-sweeps" => {
                            embedding.relaxation_sweeps = Some(parse_value(key, value)?)
                        }
                        "bond-stiffness" => embedding.bond_stiffness = Some(parse_value(key, value)?),
                        "angle-stiffness" => {
                            embedding.angle_stiffness = Some(parse_value(key, value)?)
                        }
                        "repulsion-stiffness" => {
                            embedding.repulsion_stiffness = Some(parse_value(key, value)?)
                        }
                        "repulsion-distance" => {
                            embedding.repulsion_distance = Some(parse_value(key, value)?)
                        }
                        "max-step" => embedding.max_step = Some(parse_value(key, value)?),
                        "component-spacing" => {
                            embedding.component_spacing = Some(parse_value(key, value)?)
                        }
                        _ => {
                            return Err(CliError::Config(format!(
                                "Unsupported configuration key for --set: '{}'",
                                key
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn options(args: &[&str]) -> BuildOptions {
        let mut argv = vec!["bforge"];
        argv.extend_from_slice(args);
        argv.push("motifs");
        Cli::parse_from(argv).build
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = PartialBuildConfig::resolve(&options(&[])).unwrap();
        assert_eq!(config, BuildConfig::default());
    }

    #[test]
    fn file_values_are_read_and_cli_overrides_them() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "generate-coordinates = true\n\n[embedding]\nrelaxation-sweeps = 50\nmax-step = 0.05\n",
        )
        .unwrap();
        let path_str = path.to_str().unwrap();

        let config = PartialBuildConfig::resolve(&options(&[
            "--config",
            path_str,
            "-S",
            "embedding.relaxation-sweeps=20",
            "--no-coordinates",
        ]))
        .unwrap();

        assert_eq!(config.embedding.relaxation_sweeps, 20);
        assert_eq!(config.embedding.max_step, 0.05);
        assert!(!config.generate_coordinates);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "temperature = 300\n").unwrap();
        let result = PartialBuildConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn unsupported_set_keys_are_rejected() {
        let result = PartialBuildConfig::resolve(&options(&["-S", "embedding.temperature=3"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("embedding.temperature")));

        let result = PartialBuildConfig::resolve(&options(&["-S", "embedding.max-step=fast"]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_embedding_values_surface_as_config_errors() {
        let result = PartialBuildConfig::resolve(&options(&["-S", "embedding.bond-stiffness=2"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("bond_stiffness")));
    }

    #[test]
    fn missing_motif_table_is_reported() {
        let result = PartialBuildConfig::resolve(&options(&["--registry", "/nonexistent/motifs.toml"]));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
