// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management

use crate::error::{PipelineError, Result};
use crate::types::Metric;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File names probed in the working directory when no config is given
pub const DEFAULT_CONFIG_NAMES: [&str; 3] = ["heuristics.toml", "heuristics.yaml", "heuristics.yml"];

/// Prefix for environment overrides, e.g. `RETRORANK__OUTPUT__RANKINGS_FILE`
pub const ENV_PREFIX: &str = "RETRORANK";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scoring model
    #[serde(default)]
    pub model: ModelConfig,
    /// Input datasets
    pub data: DataConfig,
    /// Output artifact
    pub output: OutputConfig,
    /// Directory relative paths resolve against (the config file's directory)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Scoring model section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Weights and thresholds
    #[serde(default)]
    pub parameters: ScoringParams,
}

/// Weights and thresholds handed explicitly to each pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Metric name -> weight
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// `min_<metric>` -> floor
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
}

/// A single `min_<metric>` floor
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    /// Metric name after stripping `min_`
    pub metric: String,
    /// Minimum acceptable value
    pub floor: f64,
}

impl ScoringParams {
    /// Build parameters from literal weight and threshold pairs
    #[must_use]
    pub fn new(weights: &[(&str, f64)], thresholds: &[(&str, f64)]) -> Self {
        Self {
            weights: weights.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
            thresholds: thresholds.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
        }
    }

    /// Weight entries naming a recognized metric
    #[must_use]
    pub fn recognized_weights(&self) -> Vec<(Metric, f64)> {
        self.weights
            .iter()
            .filter_map(|(name, w)| Metric::from_name(name).map(|m| (m, *w)))
            .collect()
    }

    /// Weight entries that name no recognized metric
    #[must_use]
    pub fn unrecognized_weights(&self) -> Vec<&str> {
        self.weights
            .keys()
            .filter(|name| Metric::from_name(name).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Parsed threshold table; keys without the `min_` prefix are skipped
    #[must_use]
    pub fn thresholds(&self) -> Vec<Threshold> {
        self.thresholds
            .iter()
            .filter_map(|(key, floor)| {
                key.trim().strip_prefix("min_").map(|metric| Threshold {
                    metric: metric.to_string(),
                    floor: *floor,
                })
            })
            .collect()
    }

    /// Recognized metrics referenced by either the weight or threshold table
    #[must_use]
    pub fn referenced_metrics(&self) -> BTreeSet<Metric> {
        let mut metrics: BTreeSet<Metric> =
            self.recognized_weights().into_iter().map(|(m, _)| m).collect();
        metrics.extend(self.thresholds().iter().filter_map(|t| Metric::from_name(&t.metric)));
        metrics
    }

    /// Whether `metric` is weighted or thresholded
    #[must_use]
    pub fn references(&self, metric: Metric) -> bool {
        self.referenced_metrics().contains(&metric)
    }

    /// Log the entries that will be ignored or behave oddly
    pub fn warn_unrecognized(&self) {
        for name in self.unrecognized_weights() {
            warn!("Ignoring weight for unrecognized metric '{}'", name);
        }
        for key in self.thresholds.keys() {
            match key.trim().strip_prefix("min_") {
                None => warn!("Ignoring threshold '{}': keys must look like min_<metric>", key),
                Some(metric) if Metric::from_name(metric).is_none() => {
                    warn!("Threshold '{}' names an unrecognized metric; it reads as 0", key);
                }
                Some(_) => {}
            }
        }
    }

    /// Reject non-finite values and negative weights
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "weight '{name}' must be a finite non-negative number, got {weight}"
                )));
            }
        }
        for (key, floor) in &self.thresholds {
            if !floor.is_finite() {
                return Err(PipelineError::InvalidConfig(format!(
                    "threshold '{key}' must be finite, got {floor}"
                )));
            }
        }
        Ok(())
    }
}

/// Input dataset locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Projects table (delimited, header row)
    pub projects_file: PathBuf,
    /// Contributor / connection records
    pub contributor_file: PathBuf,
    /// Dependency events
    pub dependency_file: PathBuf,
    /// Optional on-chain metrics table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onchain_file: Option<PathBuf>,
}

/// Output artifact location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Ranked table destination
    pub rankings_file: PathBuf,
}

impl Config {
    /// Load configuration from `path`, layered with `RETRORANK__*` overrides.
    ///
    /// The format follows the file extension (TOML, YAML or JSON).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingConfig {
                path: path.to_path_buf(),
                reason: "file does not exist".into(),
            });
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PipelineError::MissingConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut config: Config =
            settings
                .try_deserialize()
                .map_err(|e| PipelineError::MissingConfig {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;

        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.model.parameters.validate()?;

        debug!(
            "Loaded config from {} ({} weights, {} thresholds)",
            path.display(),
            config.model.parameters.weights.len(),
            config.model.parameters.thresholds.len()
        );
        Ok(config)
    }

    /// Resolve a configured path against the config file's directory
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Resolved projects dataset path
    #[must_use]
    pub fn projects_path(&self) -> PathBuf {
        self.resolve(&self.data.projects_file)
    }

    /// Resolved contributor dataset path
    #[must_use]
    pub fn contributor_path(&self) -> PathBuf {
        self.resolve(&self.data.contributor_file)
    }

    /// Resolved dependency dataset path
    #[must_use]
    pub fn dependency_path(&self) -> PathBuf {
        self.resolve(&self.data.dependency_file)
    }

    /// Resolved on-chain dataset path, if configured
    #[must_use]
    pub fn onchain_path(&self) -> Option<PathBuf> {
        self.data.onchain_file.as_deref().map(|p| self.resolve(p))
    }

    /// Resolved output path
    #[must_use]
    pub fn rankings_path(&self) -> PathBuf {
        self.resolve(&self.output.rankings_file)
    }

    /// The stock heuristic written by `retrorank init`
    #[must_use]
    pub fn default_template() -> Self {
        Self {
            model: ModelConfig {
                parameters: ScoringParams::new(
                    &[
                        ("stars", 0.3),
                        ("forks", 0.2),
                        ("contributors", 0.3),
                        ("dependents", 0.2),
                    ],
                    &[("min_dependents", 1.0), ("min_contributors", 1.0)],
                ),
            },
            data: DataConfig {
                projects_file: PathBuf::from("projects.csv"),
                contributor_file: PathBuf::from("contributors.json"),
                dependency_file: PathBuf::from("dependencies.csv"),
                onchain_file: None,
            },
            output: OutputConfig {
                rankings_file: PathBuf::from("rankings.csv"),
            },
            base_dir: PathBuf::new(),
        }
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Find the configuration file to use.
///
/// An explicit path always wins, even if it does not exist, so that the
/// caller reports the path the user asked for.
#[must_use]
pub fn locate(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    for name in DEFAULT_CONFIG_NAMES {
        let candidate = PathBuf::from(name);
        if candidate.is_file() {
            return candidate;
        }
    }

    directories::ProjectDirs::from("org", "hyperpolymath", "retrorank")
        .map(|d| d.config_dir().join(DEFAULT_CONFIG_NAMES[0]))
        .filter(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAMES[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const YAML: &str = "
model:
  parameters:
    weights:
      stars: 0.3
      forks: 0.2
      contributors: 0.3
      dependents: 0.2
    thresholds:
      min_dependents: 1
      min_contributors: 1
data:
  projects_file: projects.csv
  contributor_file: contributors.json
  dependency_file: deps.csv
output:
  rankings_file: out/rankings.csv
";

    #[test]
    fn test_load_yaml_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("heuristics.yaml");
        fs::write(&path, YAML).unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.model.parameters.weights.len(), 4);
        assert_eq!(config.model.parameters.thresholds["min_dependents"], 1.0);
        assert_eq!(config.projects_path(), dir.path().join("projects.csv"));
        assert_eq!(config.rankings_path(), dir.path().join("out/rankings.csv"));
        assert!(config.onchain_path().is_none());
    }

    #[test]
    fn test_template_round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("heuristics.toml");
        fs::write(&path, Config::default_template().to_toml().unwrap()).unwrap();

        let loaded = Config::load(&path).unwrap();
        let template = Config::default_template();

        assert_eq!(loaded.model, template.model);
        assert_eq!(loaded.data, template.data);
        assert_eq!(loaded.output, template.output);
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingConfig { .. }));
    }

    #[test]
    fn test_unparsable_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "model = [[[").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MissingConfig { .. }));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let params = ScoringParams::new(&[("stars", -1.0)], &[]);
        assert!(matches!(params.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_thresholds_strip_prefix() {
        let params = ScoringParams::new(&[], &[("min_stars", 5.0), ("stars", 1.0)]);
        let thresholds = params.thresholds();

        assert_eq!(thresholds.len(), 1);
        assert_eq!(thresholds[0].metric, "stars");
        assert_eq!(thresholds[0].floor, 5.0);
    }

    #[test]
    fn test_referenced_metrics_union() {
        let params = ScoringParams::new(
            &[("stars", 1.0), ("bogus", 2.0)],
            &[("min_dependents", 1.0), ("min_other", 1.0)],
        );

        let referenced = params.referenced_metrics();
        assert_eq!(
            referenced.into_iter().collect::<Vec<_>>(),
            vec![Metric::Stars, Metric::Dependents]
        );
        assert_eq!(params.unrecognized_weights(), vec!["bogus"]);
    }
}
