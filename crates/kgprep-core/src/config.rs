//! Preparation settings.

use crate::loader::DatasetFiles;
use crate::sampling::IsolatedEntityPolicy;
use crate::split::SplitRatios;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Settings for one preparation run.
///
/// Missing fields in a JSON config fall back to [`PrepConfig::default`].
///
/// ```rust
/// use kgprep_core::PrepConfig;
///
/// let config: PrepConfig = serde_json::from_str(r#"{"dataset": "music", "seed": 7}"#).unwrap();
/// assert_eq!(config.dataset, "music");
/// assert_eq!(config.neighbor_sample_size, 8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Root directory holding one directory per dataset.
    pub data_dir: PathBuf,
    /// Dataset directory name under `data_dir`.
    pub dataset: String,
    /// Train fraction of the ratings.
    pub train_ratio: f64,
    /// Eval fraction of the ratings.
    pub eval_ratio: f64,
    /// Neighbors sampled per entity.
    pub neighbor_sample_size: usize,
    /// RNG seed; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Handling of entities without edges.
    pub isolated_entity: IsolatedEntityPolicy,
    /// Read and write the binary cache.
    pub use_cache: bool,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            dataset: "movie".to_string(),
            train_ratio: 0.6,
            eval_ratio: 0.2,
            neighbor_sample_size: 8,
            seed: None,
            isolated_entity: IsolatedEntityPolicy::Fail,
            use_cache: true,
        }
    }
}

impl PrepConfig {
    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Set the data root.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the dataset name.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Set train and eval fractions.
    pub fn with_ratios(mut self, train_ratio: f64, eval_ratio: f64) -> Self {
        self.train_ratio = train_ratio;
        self.eval_ratio = eval_ratio;
        self
    }

    /// Set neighbors sampled per entity.
    pub fn with_neighbor_sample_size(mut self, k: usize) -> Self {
        self.neighbor_sample_size = k;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the isolated-entity policy.
    pub fn with_isolated_entity(mut self, policy: IsolatedEntityPolicy) -> Self {
        self.isolated_entity = policy;
        self
    }

    /// Enable or disable the binary cache.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Split fractions.
    pub fn ratios(&self) -> SplitRatios {
        SplitRatios::new(self.train_ratio, self.eval_ratio)
    }

    /// `data_dir/dataset`
    pub fn dataset_dir(&self) -> PathBuf {
        self.data_dir.join(&self.dataset)
    }

    /// Files of the selected dataset.
    pub fn files(&self) -> DatasetFiles {
        DatasetFiles::new(self.dataset_dir())
    }

    /// Check every setting before any data is touched.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(Error::Config("dataset name is empty".to_string()));
        }
        if self.neighbor_sample_size == 0 {
            return Err(Error::Config(
                "neighbor_sample_size must be at least 1".to_string(),
            ));
        }
        self.ratios().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PrepConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ratios(), SplitRatios::new(0.6, 0.2));
        assert_eq!(config.dataset_dir(), PathBuf::from("data/movie"));
    }

    #[test]
    fn test_builder() {
        let config = PrepConfig::default()
            .with_data_dir("/tmp/kg")
            .with_dataset("music")
            .with_ratios(0.8, 0.1)
            .with_neighbor_sample_size(4)
            .with_seed(1)
            .with_isolated_entity(IsolatedEntityPolicy::Sentinel)
            .with_cache(false);
        assert_eq!(config.dataset_dir(), PathBuf::from("/tmp/kg/music"));
        assert_eq!(config.seed, Some(1));
        assert!(!config.use_cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let bad = [
            PrepConfig::default().with_neighbor_sample_size(0),
            PrepConfig::default().with_dataset("  "),
            PrepConfig::default().with_ratios(0.9, 0.2),
            PrepConfig::default().with_ratios(0.6, 0.0),
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{config:?}");
        }
    }

    #[test]
    fn test_json_policy_names() {
        let config: PrepConfig =
            serde_json::from_str(r#"{"isolated_entity": "sentinel", "use_cache": false}"#).unwrap();
        assert_eq!(config.isolated_entity, IsolatedEntityPolicy::Sentinel);
        assert!(!config.use_cache);
        assert_eq!(config.train_ratio, 0.6);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prep.json");
        std::fs::write(&path, r#"{"dataset": "book", "neighbor_sample_size": 4}"#).unwrap();

        let config = PrepConfig::from_json_file(&path).unwrap();
        assert_eq!(config.dataset, "book");
        assert_eq!(config.neighbor_sample_size, 4);
    }
}
