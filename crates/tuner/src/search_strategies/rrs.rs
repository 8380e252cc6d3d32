//! Recursive random search: multi-resolution randomized optimization
//! alternating global exploration with region-shrinking exploitation.

use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::{
    error::Result,
    optimizer::{CostMode, SearchContext},
    space::{ParameterSpace, SpacePoint},
    space_builder::SpaceScope,
};

use super::SearchStrategy;

/// Tuning knobs of the search.
#[derive(Clone, Copy, Debug)]
pub struct RrsParams {
    /// Probability that one exploration round lands a sample in the best
    /// [explore_percentile](RrsParams::explore_percentile) fraction.
    pub explore_confidence: f64,
    /// Fraction of the space an exploration round aims to hit.
    pub explore_percentile: f64,
    /// Probability that one exploitation round lands a sample in the best
    /// part of its region before the region shrinks.
    pub exploit_confidence: f64,
    /// A new exploration must beat the incumbent cost by this factor to be
    /// worth exploiting.
    pub exploit_expected_value: f64,
    /// Per-axis region shrink factor between exploitation levels.
    pub exploit_reduction_ratio: f64,
    /// Relative per-axis region size below which exploitation stops.
    pub exploit_termination_size: f64,
    /// Hard budget of what-if evaluations for the whole search.
    pub max_evaluations: usize,
    /// Consecutive explorations allowed to miss the improvement margin
    /// before the search ends.
    pub max_fruitless_explorations: usize,
}

impl Default for RrsParams {
    fn default() -> Self {
        RrsParams {
            explore_confidence: 0.99,
            explore_percentile: 0.1,
            exploit_confidence: 0.99,
            exploit_expected_value: 0.8,
            exploit_reduction_ratio: 0.5,
            exploit_termination_size: 0.001,
            max_evaluations: 500,
            max_fruitless_explorations: 2,
        }
    }
}

impl RrsParams {
    /// Samples per exploration round: enough that with
    /// `explore_confidence` probability at least one lands in the best
    /// `explore_percentile` fraction of the space.
    fn explore_samples(&self) -> usize {
        ((1.0 - self.explore_confidence).ln() / (1.0 - self.explore_percentile).ln()).ceil() as usize
    }

    /// Consecutive non-improving samples after which an exploitation
    /// region is considered drained and shrinks.
    fn exploit_samples(&self) -> usize {
        ((1.0 - self.exploit_confidence).ln() / self.exploit_expected_value.ln()).ceil() as usize
    }
}

pub struct RrsStrategy {
    params: RrsParams,
    rng: Pcg64,
}

impl RrsStrategy {
    pub fn new(params: RrsParams, seed: u64) -> Self {
        Self {
            params,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Runs the search over one space. Every candidate is overlaid on
    /// `base_point` before costing, which the smart variant uses to pin
    /// the map-phase winner during the reduce phase; the returned point
    /// includes the overlay.
    pub(crate) fn search_in_space(
        &mut self,
        context: &mut SearchContext,
        space: &ParameterSpace,
        base_point: &SpacePoint,
        mode: CostMode,
    ) -> Result<SpacePoint> {
        if space.is_empty() {
            return Ok(base_point.clone());
        }
        let explore_samples = self.params.explore_samples();
        let start_evaluations = context.evaluations();
        let max_evaluations = self.params.max_evaluations;
        let budget_left = |context: &SearchContext| context.evaluations() - start_evaluations < max_evaluations;

        let mut best: Option<(SpacePoint, f64)> = None;
        let mut fruitless = 0;
        while fruitless < self.params.max_fruitless_explorations && budget_left(context) {
            let mut round_best: Option<(SpacePoint, f64)> = None;
            for _ in 0..explore_samples {
                if !budget_left(context) {
                    break;
                }
                let mut candidate = base_point.clone();
                candidate.merge(&space.random_point(&mut self.rng));
                let cost = context.cost_of(&candidate, mode)?;
                if round_best.as_ref().map_or(true, |(_, c)| cost < *c) {
                    round_best = Some((candidate, cost));
                }
            }
            let Some((explored, explored_cost)) = round_best else {
                break;
            };
            let worth_exploiting = match &best {
                None => true,
                Some((_, incumbent)) => explored_cost < self.params.exploit_expected_value * incumbent,
            };
            if !worth_exploiting {
                debug!(
                    "rrs: exploration cost {:.3}s misses the margin against {:.3}s",
                    explored_cost,
                    best.as_ref().map(|(_, c)| *c).unwrap_or(f64::INFINITY)
                );
                fruitless += 1;
                continue;
            }
            fruitless = 0;
            let (point, cost) =
                self.exploit(context, space, base_point, explored, explored_cost, mode, start_evaluations)?;
            if best.as_ref().map_or(true, |(_, c)| cost < *c) {
                best = Some((point, cost));
            }
        }

        match best {
            Some((point, cost)) => {
                info!(
                    "rrs: best cost {:.3}s after {} evaluations",
                    cost,
                    context.evaluations() - start_evaluations
                );
                Ok(point)
            }
            None => Ok(base_point.clone()),
        }
    }

    /// Shrinks a sampling region around the incumbent, recentering on
    /// every improvement, until the region's relative per-axis size drops
    /// below the termination size.
    #[allow(clippy::too_many_arguments)]
    fn exploit(
        &mut self,
        context: &mut SearchContext,
        space: &ParameterSpace,
        base_point: &SpacePoint,
        mut center: SpacePoint,
        mut center_cost: f64,
        mode: CostMode,
        start_evaluations: usize,
    ) -> Result<(SpacePoint, f64)> {
        let exploit_samples = self.params.exploit_samples();
        let axes = space.num_parameters() as i32;
        let mut axis_scale = self.params.exploit_reduction_ratio;
        while axis_scale >= self.params.exploit_termination_size {
            let mut failures = 0;
            while failures < exploit_samples {
                if context.evaluations() - start_evaluations >= self.params.max_evaluations {
                    return Ok((center, center_cost));
                }
                // random_point_near takes a volume scale and roots it per
                // axis; raise the per-axis scale back to a volume.
                let mut candidate = base_point.clone();
                candidate.merge(&space.random_point_near(&mut self.rng, &center, axis_scale.powi(axes)));
                let cost = context.cost_of(&candidate, mode)?;
                if cost < center_cost {
                    center = candidate;
                    center_cost = cost;
                    failures = 0;
                } else {
                    failures += 1;
                }
            }
            axis_scale *= self.params.exploit_reduction_ratio;
        }
        debug!("rrs: exploitation settled at cost {:.3}s", center_cost);
        Ok((center, center_cost))
    }
}

impl SearchStrategy for RrsStrategy {
    fn search_best_point(&mut self, context: &mut SearchContext) -> Result<SpacePoint> {
        let space = context.build_space(SpaceScope::All)?;
        self.search_in_space(context, &space, &SpacePoint::new(), CostMode::Full)
    }
}
