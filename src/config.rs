// In: src/config.rs

//! The single source of truth for pipeline configuration.
//!
//! `PipelineConfig` is created once at the application boundary (from a JSON
//! file or in code) and passed by reference to `Pipeline::run_with_config` and
//! the pipeline-description parser. It holds the logging setup, the rayon
//! thread budget, and `FilterDefaults`: the neighbor counts, search radii,
//! tolerances and iteration caps every filter falls back to when a parameter
//! is not given explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EbsdError;
use crate::grid::Connectivity;
use crate::kernels::alignment::SearchStrategy;
use crate::kernels::segmentation::{GrowthReference, UndersizedPolicy};

//==================================================================================
// I. Logging & Parallelism
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Appends to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ParallelConfig {
    /// Worker threads for the per-filter data-parallel phases. `None` uses
    /// rayon's global pool.
    pub num_threads: Option<usize>,
}

//==================================================================================
// II. Filter Defaults
//==================================================================================

/// Fallback values for filter parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct FilterDefaults {
    /// Degrees.
    #[serde(default = "default_misorientation_tolerance")]
    pub misorientation_tolerance: f64,

    /// Good, consistent neighbors required to fill a bad voxel.
    #[serde(default = "default_min_neighbors")]
    pub min_neighbors: usize,

    /// Outermost neighbor level examined by the bad-data check.
    #[serde(default = "default_search_radius")]
    pub search_radius: usize,

    #[serde(default)]
    pub connectivity: Connectivity,

    /// Cap on passes per level / iterations per correlation run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Neighbor agreement (including the candidate) required by the correlation.
    #[serde(default = "default_min_agreement")]
    pub min_agreement: usize,

    /// Regions smaller than this are handled by `undersized_policy`. `1` disables it.
    #[serde(default = "default_min_feature_size")]
    pub min_feature_size: usize,

    #[serde(default)]
    pub undersized_policy: UndersizedPolicy,

    #[serde(default)]
    pub growth_reference: GrowthReference,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Pixels.
    #[serde(default = "default_alignment_search_radius")]
    pub alignment_search_radius: i32,

    #[serde(default)]
    pub alignment_search: SearchStrategy,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            misorientation_tolerance: default_misorientation_tolerance(),
            min_neighbors: default_min_neighbors(),
            search_radius: default_search_radius(),
            connectivity: Connectivity::default(),
            max_iterations: default_max_iterations(),
            min_confidence: default_min_confidence(),
            min_agreement: default_min_agreement(),
            min_feature_size: default_min_feature_size(),
            undersized_policy: UndersizedPolicy::default(),
            growth_reference: GrowthReference::default(),
            histogram_bins: default_histogram_bins(),
            alignment_search_radius: default_alignment_search_radius(),
            alignment_search: SearchStrategy::default(),
        }
    }
}

fn default_misorientation_tolerance() -> f64 {
    5.0
}

fn default_min_neighbors() -> usize {
    4
}

fn default_search_radius() -> usize {
    2
}

fn default_max_iterations() -> usize {
    100
}

fn default_min_confidence() -> f32 {
    0.1
}

fn default_min_agreement() -> usize {
    3
}

fn default_min_feature_size() -> usize {
    1
}

fn default_histogram_bins() -> usize {
    32
}

fn default_alignment_search_radius() -> i32 {
    5
}

//==================================================================================
// III. The Unified PipelineConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub parallel: ParallelConfig,

    #[serde(default)]
    pub filter_defaults: FilterDefaults,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EbsdError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EbsdError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.logging.enabled);
        assert_eq!(config.filter_defaults.min_neighbors, 4);
        assert_eq!(config.filter_defaults.alignment_search, SearchStrategy::Exhaustive);
    }

    #[test]
    fn test_partial_overrides() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "logging": {"level": "debug"},
                "parallel": {"num_threads": 2},
                "filter_defaults": {
                    "min_neighbors": 6,
                    "connectivity": "full",
                    "undersized_policy": "unlabel",
                    "alignment_search": {"kind": "hill_climb", "max_steps": 8}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.enabled);
        assert_eq!(config.parallel.num_threads, Some(2));
        let d = &config.filter_defaults;
        assert_eq!(d.min_neighbors, 6);
        assert_eq!(d.search_radius, 2);
        assert_eq!(d.connectivity, Connectivity::Full);
        assert_eq!(d.undersized_policy, UndersizedPolicy::Unlabel);
        assert_eq!(d.alignment_search, SearchStrategy::HillClimb { max_steps: 8 });
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"filter_defaults": {"histogram_bins": 64}}"#).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.filter_defaults.histogram_bins, 64);

        assert!(matches!(
            PipelineConfig::from_json_file(dir.path().join("missing.json")),
            Err(EbsdError::Io(_))
        ));
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(EbsdError::SerdeJson(_))
        ));
    }
}
