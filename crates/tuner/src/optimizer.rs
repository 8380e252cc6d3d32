//! Job optimizer: drives a search strategy over the parameter space using
//! the what-if engine as cost oracle.

use std::sync::{Arc, Mutex};

use log::{error, info};
use threadpool::ThreadPool;

use crate::{
    cluster::Cluster,
    config::Configuration,
    dataset::DatasetModel,
    error::Result,
    execution::JobExecution,
    oracle::ProfileOracle,
    profile::JobProfile,
    search_strategies::SearchStrategy,
    simulator::TaskScheduler,
    space::{ParameterSpace, SpacePoint},
    space_builder::{self, SpaceScope},
    whatif::WhatIfEngine,
};

/// Whether a candidate is costed with or without its reduce side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostMode {
    /// Whole job.
    Full,
    /// Reducers ignored on oracle and simulator; used by the
    /// phase-decomposed strategies to cost map parameters alone.
    MapOnly,
}

/// Outcome of one optimization run.
#[derive(Debug)]
pub struct OptimizationResult {
    /// Baseline configuration with the winning point stamped on.
    pub best_configuration: Configuration,
    /// The winning point itself.
    pub best_point: SpacePoint,
    /// Predicted running time at the winner, seconds.
    pub predicted_duration: f64,
    /// Detailed synthetic execution at the winner.
    pub execution: JobExecution,
    /// Number of what-if evaluations the search spent.
    pub evaluations: usize,
}

/// Searches the tunable-configuration space of one job for the settings
/// minimizing its predicted running time.
pub struct JobOptimizer {
    engine: WhatIfEngine,
    cluster: Cluster,
    base_config: Configuration,
    strategy: Box<dyn SearchStrategy>,
    threads: usize,
}

impl JobOptimizer {
    pub fn new(
        oracle: Arc<dyn ProfileOracle>,
        dataset: Arc<dyn DatasetModel>,
        cluster: Cluster,
        base_config: Configuration,
        strategy: Box<dyn SearchStrategy>,
    ) -> Self {
        let scheduler = TaskScheduler::new(&cluster);
        JobOptimizer {
            engine: WhatIfEngine::new(oracle, dataset, scheduler),
            cluster,
            base_config,
            strategy,
            threads: 1,
        }
    }

    /// Number of worker threads grid evaluation may fan out on. One (the
    /// default) keeps everything on the calling thread; more never changes
    /// the winner, only the wall-clock time.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Runs the search and re-simulates the winner in detailed mode.
    pub fn optimize(&mut self, submission_time: f64) -> Result<OptimizationResult> {
        self.engine.scheduler_mut().checkpoint();
        let base_profile = self.engine.predict_profile(&self.base_config)?;

        let mut context = SearchContext {
            engine: &mut self.engine,
            cluster: &self.cluster,
            base_config: &self.base_config,
            base_profile,
            submission_time,
            threads: self.threads,
            evaluations: 0,
        };
        let search = self.strategy.search_best_point(&mut context);
        let evaluations = context.evaluations;
        let best_point = match search {
            Ok(point) => point,
            Err(e) => {
                self.engine.scheduler_mut().reset();
                return Err(e);
            }
        };

        self.engine.scheduler_mut().reset();
        let mut best_configuration = self.base_config.clone();
        best_point.apply_to(&mut best_configuration);
        let execution = self.engine.predict_execution(&best_configuration, submission_time)?;
        let predicted_duration = execution.duration();
        info!(
            "search finished after {} evaluations, predicted duration {:.3}s",
            evaluations, predicted_duration
        );
        Ok(OptimizationResult {
            best_configuration,
            best_point,
            predicted_duration,
            execution,
            evaluations,
        })
    }
}

/// Everything a search strategy may touch during one search: space
/// construction for the job at hand and candidate costing against the
/// checkpointed scheduler baseline.
pub struct SearchContext<'a> {
    engine: &'a mut WhatIfEngine,
    cluster: &'a Cluster,
    base_config: &'a Configuration,
    base_profile: JobProfile,
    submission_time: f64,
    threads: usize,
    evaluations: usize,
}

impl SearchContext<'_> {
    /// Builds the parameter space of one scope for the job under search.
    pub fn build_space(&self, scope: SpaceScope) -> Result<ParameterSpace> {
        space_builder::build_space(scope, self.base_config, &self.base_profile, self.cluster)
    }

    /// Number of what-if evaluations spent so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Predicted cost of one candidate point: stamped onto a copy of the
    /// baseline configuration, costed against a scheduler reset to the
    /// checkpointed baseline. A failed evaluation aborts the whole search.
    pub fn cost_of(&mut self, point: &SpacePoint, mode: CostMode) -> Result<f64> {
        let mut config = self.base_config.clone();
        point.apply_to(&mut config);
        self.engine.scheduler_mut().reset();
        self.evaluations += 1;
        self.engine
            .predict_duration(&config, self.submission_time, mode == CostMode::MapOnly)
            .map_err(|e| {
                error!("what-if evaluation failed for configuration:\n{}", config.to_yaml());
                e
            })
    }

    /// Costs of a batch of candidates, in order. Fans out on a thread pool
    /// when the optimizer was given more than one thread; each worker
    /// evaluates against its own clone of the checkpointed scheduler, so
    /// results are identical to the sequential path.
    pub fn costs_of(&mut self, points: &[SpacePoint], mode: CostMode) -> Result<Vec<f64>> {
        if self.threads <= 1 || points.len() <= 1 {
            return points.iter().map(|point| self.cost_of(point, mode)).collect();
        }

        let oracle = self.engine.oracle().clone();
        let dataset = self.engine.dataset().clone();
        let results = Arc::new(Mutex::new(Vec::with_capacity(points.len())));
        let pool = ThreadPool::new(self.threads);
        for (index, point) in points.iter().enumerate() {
            let oracle = oracle.clone();
            let dataset = dataset.clone();
            let results = results.clone();
            let mut config = self.base_config.clone();
            point.apply_to(&mut config);
            let mut scheduler = self.engine.scheduler().clone();
            let submission_time = self.submission_time;
            pool.execute(move || {
                scheduler.reset();
                let cost = oracle
                    .project(&config, dataset.as_ref(), mode == CostMode::MapOnly)
                    .and_then(|profile| {
                        scheduler.fast_schedule(&profile, &config, submission_time, mode == CostMode::MapOnly)
                    });
                if cost.is_err() {
                    error!("what-if evaluation failed for configuration:\n{}", config.to_yaml());
                }
                results.lock().unwrap().push((index, cost));
            });
        }
        pool.join();
        self.evaluations += points.len();

        let mut results = Arc::try_unwrap(results).unwrap().into_inner().unwrap();
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, cost)| cost).collect()
    }

    /// Index and cost of the cheapest candidate; a linear scan where the
    /// first of equally cheap candidates wins, keeping searches
    /// deterministic. `None` for an empty batch.
    pub fn find_best_among(&mut self, points: &[SpacePoint], mode: CostMode) -> Result<Option<(usize, f64)>> {
        let costs = self.costs_of(points, mode)?;
        let mut best: Option<(usize, f64)> = None;
        for (index, cost) in costs.into_iter().enumerate() {
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((index, cost));
            }
        }
        Ok(best)
    }
}
