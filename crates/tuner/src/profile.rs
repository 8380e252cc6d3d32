//! Aggregate statistics describing one job's measured behavior.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    config::Configuration,
    error::{Result, TunerError},
};

/// Execution phases of map and reduce tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    // Map side.
    Read,
    Map,
    Collect,
    Spill,
    Merge,
    // Reduce side.
    Shuffle,
    Sort,
    Reduce,
    Write,
}

impl Phase {
    /// Phases making up a map attempt, in execution order.
    pub const MAP_PHASES: [Phase; 5] = [Phase::Read, Phase::Map, Phase::Collect, Phase::Spill, Phase::Merge];
}

/// Dataflow counters of one task kind, totals across all its tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    InputBytes,
    InputRecords,
    OutputBytes,
    OutputRecords,
    ShuffleBytes,
    ReduceGroups,
}

/// Derived statistics of one task kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Memory used by one task, bytes.
    MemoryPerTask,
    /// Output-size ratio of running the combiner on map output.
    CombineSelectivity,
    /// Size ratio of compressed to raw intermediate data.
    CompressionRatio,
}

/// Kind of tasks a [TaskProfile] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Map,
    Reduce,
}

/// Measured behavior of one logical task kind: how many tasks it ran and
/// their average per-phase timings, dataflow counters and statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskProfile {
    pub kind: TaskKind,
    pub num_tasks: u64,
    /// Average duration of each phase in one task, seconds.
    #[serde(default)]
    pub phase_times: BTreeMap<Phase, f64>,
    #[serde(default)]
    pub counters: BTreeMap<Counter, u64>,
    #[serde(default)]
    pub statistics: BTreeMap<Statistic, f64>,
}

impl TaskProfile {
    /// Creates an empty profile of `num_tasks` tasks of the given kind.
    pub fn new(kind: TaskKind, num_tasks: u64) -> Self {
        TaskProfile {
            kind,
            num_tasks,
            phase_times: BTreeMap::new(),
            counters: BTreeMap::new(),
            statistics: BTreeMap::new(),
        }
    }

    /// Average duration of one phase, zero when unmeasured.
    pub fn phase_time(&self, phase: Phase) -> f64 {
        self.phase_times.get(&phase).copied().unwrap_or(0.0)
    }

    /// Sum of all phase durations of one task.
    pub fn total_task_time(&self) -> f64 {
        self.phase_times.values().sum()
    }

    /// Counter total, zero when unmeasured.
    pub fn counter(&self, counter: Counter) -> u64 {
        self.counters.get(&counter).copied().unwrap_or(0)
    }

    /// Statistic value, `default` when unmeasured.
    pub fn statistic_or(&self, statistic: Statistic, default: f64) -> f64 {
        self.statistics.get(&statistic).copied().unwrap_or(default)
    }

    /// Average input size of one task, bytes.
    pub fn avg_input_size(&self) -> f64 {
        if self.num_tasks == 0 {
            0.0
        } else {
            self.counter(Counter::InputBytes) as f64 / self.num_tasks as f64
        }
    }

    /// Average output size of one task, bytes.
    pub fn avg_output_size(&self) -> f64 {
        if self.num_tasks == 0 {
            0.0
        } else {
            self.counter(Counter::OutputBytes) as f64 / self.num_tasks as f64
        }
    }
}

/// Measured behavior of a whole job: one profile per logical map kind
/// (a job may read several distinct inputs), at most one reduce profile,
/// and the configuration the measurements were taken under.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobProfile {
    #[serde(default)]
    pub job_name: String,
    pub map_profiles: Vec<TaskProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_profile: Option<TaskProfile>,
    /// Configuration in effect when the profile was measured.
    #[serde(default)]
    pub measured_config: Configuration,
}

impl JobProfile {
    /// Total number of map tasks across all map kinds.
    pub fn num_map_tasks(&self) -> u64 {
        self.map_profiles.iter().map(|p| p.num_tasks).sum()
    }

    /// Number of reduce tasks, zero for map-only jobs.
    pub fn num_reduce_tasks(&self) -> u64 {
        self.reduce_profile.as_ref().map(|p| p.num_tasks).unwrap_or(0)
    }

    /// Whether the job runs no reducers.
    pub fn is_map_only(&self) -> bool {
        self.num_reduce_tasks() == 0
    }

    /// Total shuffle volume, bytes.
    pub fn shuffle_bytes(&self) -> u64 {
        self.reduce_profile
            .as_ref()
            .map(|p| p.counter(Counter::ShuffleBytes))
            .unwrap_or(0)
    }

    /// The reduce profile, or a [MissingProfile](TunerError::MissingProfile)
    /// error for map-only jobs.
    pub fn reduce_profile_required(&self) -> Result<&TaskProfile> {
        self.reduce_profile
            .as_ref()
            .ok_or(TunerError::MissingProfile { kind: "reduce" })
    }

    /// Reads a profile document from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self> {
        let text = std::fs::read_to_string(&file).map_err(|e| TunerError::document(&file, e))?;
        serde_yaml::from_str(&text).map_err(|e| TunerError::document(&file, e))
    }

    /// Writes the profile document to a YAML file.
    pub fn save_yaml<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let text = serde_yaml::to_string(self).map_err(|e| TunerError::document(&file, e))?;
        std::fs::write(&file, text).map_err(|e| TunerError::document(&file, e))
    }

    /// Renders the profile as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| TunerError::Document {
            path: "<profile>".to_string(),
            message: e.to_string(),
        })
    }
}
