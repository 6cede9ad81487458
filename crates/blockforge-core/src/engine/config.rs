use crate::core::conformer::{ConformerError, EmbeddingConfig};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Where the functional group motif definitions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotifSource {
    Builtin,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub motif_source: MotifSource,
    /// Whether descriptor-built molecules receive generated coordinates; if
    /// not, every atom starts at the origin.
    pub generate_coordinates: bool,
    pub embedding: EmbeddingConfig,
}

#[derive(Default)]
pub struct BuildConfigBuilder {
    motif_source: Option<MotifSource>,
    generate_coordinates: Option<bool>,
    relaxation_sweeps: Option<usize>,
    bond_stiffness: Option<f64>,
    angle_stiffness: Option<f64>,
    repulsion_stiffness: Option<f64>,
    repulsion_distance: Option<f64>,
    max_step: Option<f64>,
    component_spacing: Option<f64>,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motif_source(mut self, source: MotifSource) -> Self {
        self.motif_source = Some(source);
        self
    }
    pub fn generate_coordinates(mut self, enabled: bool) -> Self {
        self.generate_coordinates = Some(enabled);
        self
    }
    pub fn relaxation_sweeps(mut self, sweeps: usize) -> Self {
        self.relaxation_sweeps = Some(sweeps);
        self
    }
    pub fn bond_stiffness(mut self, stiffness: f64) -> Self {
        self.bond_stiffness = Some(stiffness);
        self
    }
    pub fn angle_stiffness(mut self, stiffness: f64) -> Self {
        self.angle_stiffness = Some(stiffness);
        self
    }
    pub fn repulsion_stiffness(mut self, stiffness: f64) -> Self {
        self.repulsion_stiffness = Some(stiffness);
        self
    }
    pub fn repulsion_distance(mut self, distance: f64) -> Self {
        self.repulsion_distance = Some(distance);
        self
    }
    pub fn max_step(mut self, step: f64) -> Self {
        self.max_step = Some(step);
        self
    }
    pub fn component_spacing(mut self, spacing: f64) -> Self {
        self.component_spacing = Some(spacing);
        self
    }

    /// Builds the configuration. The motif source is required; embedding
    /// parameters that were not set keep their defaults.
    pub fn build(self) -> Result<BuildConfig, ConfigError> {
        let defaults = EmbeddingConfig::default();
        let embedding = EmbeddingConfig {
            relaxation_sweeps: self.relaxation_sweeps.unwrap_or(defaults.relaxation_sweeps),
            bond_stiffness: self.bond_stiffness.unwrap_or(defaults.bond_stiffness),
            angle_stiffness: self.angle_stiffness.unwrap_or(defaults.angle_stiffness),
            repulsion_stiffness: self
                .repulsion_stiffness
                .unwrap_or(defaults.repulsion_stiffness),
            repulsion_distance: self
                .repulsion_distance
                .unwrap_or(defaults.repulsion_distance),
            max_step: self.max_step.unwrap_or(defaults.max_step),
            component_spacing: self.component_spacing.unwrap_or(defaults.component_spacing),
        };
        embedding.validate().map_err(|e| match e {
            ConformerError::InvalidParameter { name, reason } => {
                ConfigError::InvalidParameter { name, reason }
            }
            other => ConfigError::InvalidParameter {
                name: "embedding",
                reason: other.to_string(),
            },
        })?;

        Ok(BuildConfig {
            motif_source: self
                .motif_source
                .ok_or(ConfigError::MissingParameter("motif_source"))?,
            generate_coordinates: self.generate_coordinates.unwrap_or(true),
            embedding,
        })
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            motif_source: MotifSource::Builtin,
            generate_coordinates: true,
            embedding: EmbeddingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_a_motif_source() {
        assert_eq!(
            BuildConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("motif_source"))
        );
    }

    #[test]
    fn unset_embedding_parameters_keep_defaults() {
        let config = BuildConfigBuilder::new()
            .motif_source(MotifSource::File(PathBuf::from("motifs.toml")))
            .relaxation_sweeps(10)
            .build()
            .unwrap();
        assert_eq!(config.embedding.relaxation_sweeps, 10);
        assert_eq!(config.embedding.max_step, EmbeddingConfig::default().max_step);
        assert!(config.generate_coordinates);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let result = BuildConfigBuilder::new()
            .motif_source(MotifSource::Builtin)
            .bond_stiffness(1.5)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "bond_stiffness", .. })
        ));
    }
}
