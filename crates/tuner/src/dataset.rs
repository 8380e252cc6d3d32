//! Model of the input dataset a hypothetical run would read.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    config::Configuration,
    error::{Result, TunerError},
    profile::JobProfile,
};

/// Description of one logical map input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputSpec {
    /// Which map kind reads this input.
    pub index: usize,
    /// Number of input splits, one map task each.
    pub split_count: u64,
    /// Average split size, bytes.
    pub avg_size: u64,
    /// Whether the input is stored compressed.
    #[serde(default)]
    pub compressed: bool,
}

/// Produces the map input description for a hypothetical run.
pub trait DatasetModel: Send + Sync {
    /// Input specs of the dataset under the given configuration.
    fn map_input_specs(&self, config: &Configuration) -> Vec<InputSpec>;
}

/// Dataset with a fixed list of input specs, loaded from a document or
/// derived from a profile.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StaticDataset {
    pub inputs: Vec<InputSpec>,
}

impl StaticDataset {
    /// Derives the dataset the profile was measured on by simple averaging:
    /// one spec per map kind with its task count and mean split size.
    pub fn from_profile(profile: &JobProfile) -> Self {
        StaticDataset {
            inputs: profile
                .map_profiles
                .iter()
                .enumerate()
                .map(|(index, map)| InputSpec {
                    index,
                    split_count: map.num_tasks,
                    avg_size: map.avg_input_size().round() as u64,
                    compressed: false,
                })
                .collect(),
        }
    }

    /// Reads an input-spec document from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self> {
        let text = std::fs::read_to_string(&file).map_err(|e| TunerError::document(&file, e))?;
        serde_yaml::from_str(&text).map_err(|e| TunerError::document(&file, e))
    }
}

impl DatasetModel for StaticDataset {
    fn map_input_specs(&self, _config: &Configuration) -> Vec<InputSpec> {
        self.inputs.clone()
    }
}
