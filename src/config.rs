//! Aggregated options for every algorithm, loadable from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::operations::extraction::{MaxLikelihoodOptions, SplitMergeOptions};
use crate::operations::intersect::IntersectOptions;
use crate::operations::simplify::VisvalingamOptions;

/// Options of every algorithm in one document.
///
/// Missing sections and fields take their defaults, so an empty document is
/// a valid configuration.
///
/// ```yaml
/// split_merge:
///   distance_threshold: 0.05
///   target_vertices: 12
/// max_likelihood:
///   max_edge_length: 1.5
///   optimize: false
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub intersect: IntersectOptions,
    pub visvalingam: VisvalingamOptions,
    pub split_merge: SplitMergeOptions,
    pub max_likelihood: MaxLikelihoodOptions,
}

impl ExtractionConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Yaml` if the document does not parse
    /// - `ConfigError::Invalid` if an option is out of range
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Io` if the file cannot be read
    /// - any error of [`Self::from_yaml_str`]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_yaml_str(&contents)
    }

    /// Serializes the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Yaml` if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self).map_err(ConfigError::from)?)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the section and the offending
    /// option.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let sections = [
            ("intersect", self.intersect.validate()),
            ("visvalingam", self.visvalingam.validate()),
            ("split_merge", self.split_merge.validate()),
            ("max_likelihood", self.max_likelihood.validate()),
        ];
        for (section, result) in sections {
            if let Err(e) = result {
                return Err(ConfigError::Invalid(format!("{section}: {e}")));
            }
        }
        Ok(())
    }
}
