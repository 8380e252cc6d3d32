//! Synthetic execution timeline produced by the detailed simulator mode.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};

/// Role of a synthetic task in the job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticTaskKind {
    Setup,
    Map,
    Reduce,
    Cleanup,
}

/// The single attempt of a synthetic task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskAttempt {
    pub host: String,
    pub start_time: f64,
    pub end_time: f64,
    /// End of the shuffle phase; reduce attempts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_end_time: Option<f64>,
    /// End of the sort phase; reduce attempts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_end_time: Option<f64>,
}

/// One synthetic task with its single attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyntheticTask {
    pub kind: SyntheticTaskKind,
    pub attempt: TaskAttempt,
}

impl SyntheticTask {
    pub(crate) fn new(kind: SyntheticTaskKind, host: String, start_time: f64, end_time: f64) -> Self {
        SyntheticTask {
            kind,
            attempt: TaskAttempt {
                host,
                start_time,
                end_time,
                shuffle_end_time: None,
                sort_end_time: None,
            },
        }
    }
}

/// Full synthetic execution of one job: ordered task lists per role,
/// created fresh by each detailed simulation and immutable afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobExecution {
    pub submission_time: f64,
    pub setup_tasks: Vec<SyntheticTask>,
    pub map_tasks: Vec<SyntheticTask>,
    pub reduce_tasks: Vec<SyntheticTask>,
    pub cleanup_tasks: Vec<SyntheticTask>,
}

impl JobExecution {
    /// Completion time of the job: the end of its last task.
    pub fn completion_time(&self) -> f64 {
        self.all_tasks().map(|t| t.attempt.end_time).fold(self.submission_time, f64::max)
    }

    /// Predicted running time from submission to completion.
    pub fn duration(&self) -> f64 {
        self.completion_time() - self.submission_time
    }

    /// All tasks in setup, map, reduce, cleanup order.
    pub fn all_tasks(&self) -> impl Iterator<Item = &SyntheticTask> {
        self.setup_tasks
            .iter()
            .chain(self.map_tasks.iter())
            .chain(self.reduce_tasks.iter())
            .chain(self.cleanup_tasks.iter())
    }

    /// Writes the timeline as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(|e| TunerError::document(&file, e))?;
        std::fs::write(&file, text).map_err(|e| TunerError::document(&file, e))
    }

    /// Renders the timeline as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("execution always serializes")
    }
}
