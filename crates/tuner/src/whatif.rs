//! What-if engine: composes the profile oracle with the scheduler
//! simulator into prediction queries.

use std::sync::Arc;

use crate::{
    config::Configuration,
    dataset::DatasetModel,
    error::Result,
    execution::JobExecution,
    oracle::ProfileOracle,
    profile::JobProfile,
    simulator::TaskScheduler,
};

/// Answers what-if questions for one job on one cluster. Holds the only
/// mutable state of a prediction session: the scheduler's slot occupancy,
/// governed by its checkpoint/reset discipline. No other caching.
pub struct WhatIfEngine {
    oracle: Arc<dyn ProfileOracle>,
    dataset: Arc<dyn DatasetModel>,
    scheduler: TaskScheduler,
}

impl WhatIfEngine {
    pub fn new(oracle: Arc<dyn ProfileOracle>, dataset: Arc<dyn DatasetModel>, scheduler: TaskScheduler) -> Self {
        WhatIfEngine {
            oracle,
            dataset,
            scheduler,
        }
    }

    pub fn oracle(&self) -> &Arc<dyn ProfileOracle> {
        &self.oracle
    }

    pub fn dataset(&self) -> &Arc<dyn DatasetModel> {
        &self.dataset
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut TaskScheduler {
        &mut self.scheduler
    }

    /// The profile the job would have under the configuration.
    pub fn predict_profile(&self, config: &Configuration) -> Result<JobProfile> {
        self.oracle.project(config, self.dataset.as_ref(), false)
    }

    /// Predicted running time under the configuration. With
    /// `ignore_reducers` the reduce side contributes nothing, which the
    /// phase-decomposed search strategies use to cost the map side alone.
    pub fn predict_duration(&mut self, config: &Configuration, submission_time: f64, ignore_reducers: bool) -> Result<f64> {
        let profile = self.oracle.project(config, self.dataset.as_ref(), ignore_reducers)?;
        self.scheduler
            .fast_schedule(&profile, config, submission_time, ignore_reducers)
    }

    /// Full synthetic execution under the configuration.
    pub fn predict_execution(&mut self, config: &Configuration, submission_time: f64) -> Result<JobExecution> {
        let profile = self.oracle.project(config, self.dataset.as_ref(), false)?;
        self.scheduler.detailed_schedule(&profile, config, submission_time)
    }
}
