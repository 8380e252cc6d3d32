//! Read-only model of the cluster the job runs on.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    config::Configuration,
    error::{Result, TunerError},
};

/// One task tracker: the slots and memory of a single host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub name: String,
    pub map_slots: u32,
    pub reduce_slots: u32,
    /// Memory available to a single task, bytes.
    pub max_task_memory: u64,
}

/// One rack of hosts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RackConfig {
    pub name: String,
    pub hosts: Vec<TrackerConfig>,
}

/// Rack -> host -> tracker topology. The simulator consults only the
/// flattened tracker list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub racks: Vec<RackConfig>,
}

impl Cluster {
    /// Synthesizes a uniform cluster: `racks` racks of `hosts_per_rack`
    /// hosts, every host with the same slot counts and memory.
    pub fn uniform(racks: usize, hosts_per_rack: usize, map_slots: u32, reduce_slots: u32, max_task_memory: u64) -> Self {
        Cluster {
            name: "uniform".to_string(),
            racks: (0..racks)
                .map(|rack| RackConfig {
                    name: format!("rack_{}", rack),
                    hosts: (0..hosts_per_rack)
                        .map(|host| TrackerConfig {
                            name: format!("host_{}_{}", rack, host),
                            map_slots,
                            reduce_slots,
                            max_task_memory,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Synthesizes a uniform cluster from `cluster.*` configuration keys:
    /// `cluster.racks`, `cluster.hosts.per.rack`, `cluster.map.slots`,
    /// `cluster.reduce.slots`, `cluster.task.memory`.
    pub fn from_config(config: &Configuration) -> Result<Self> {
        Ok(Cluster::uniform(
            config.get_parsed_or("cluster.racks", 1)?,
            config.get_parsed_or("cluster.hosts.per.rack", 1)?,
            config.get_parsed_or("cluster.map.slots", 2)?,
            config.get_parsed_or("cluster.reduce.slots", 2)?,
            config.get_parsed_or("cluster.task.memory", 1 << 30)?,
        ))
    }

    /// Flattened tracker list, rack by rack.
    pub fn trackers(&self) -> impl Iterator<Item = &TrackerConfig> {
        self.racks.iter().flat_map(|rack| rack.hosts.iter())
    }

    /// Total number of map slots.
    pub fn total_map_slots(&self) -> u32 {
        self.trackers().map(|t| t.map_slots).sum()
    }

    /// Total number of reduce slots.
    pub fn total_reduce_slots(&self) -> u32 {
        self.trackers().map(|t| t.reduce_slots).sum()
    }

    /// Smallest per-task memory across trackers, bytes. Zero for an empty
    /// cluster.
    pub fn min_task_memory(&self) -> u64 {
        self.trackers().map(|t| t.max_task_memory).min().unwrap_or(0)
    }

    /// Reads a cluster document from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self> {
        let text = std::fs::read_to_string(&file).map_err(|e| TunerError::document(&file, e))?;
        serde_yaml::from_str(&text).map_err(|e| TunerError::document(&file, e))
    }

    /// Writes the cluster document to a YAML file.
    pub fn save_yaml<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let text = serde_yaml::to_string(self).map_err(|e| TunerError::document(&file, e))?;
        std::fs::write(&file, text).map_err(|e| TunerError::document(&file, e))
    }
}
