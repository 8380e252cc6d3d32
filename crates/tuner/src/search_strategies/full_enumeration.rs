//! Exhaustive grid search over the whole parameter space.

use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::{
    error::Result,
    optimizer::{CostMode, SearchContext},
    space::{GridSampling, SpacePoint},
    space_builder::SpaceScope,
};

use super::SearchStrategy;

/// Grids the whole space and evaluates every point. Cost grows with the
/// product of per-axis sample counts, so this is only practical for small
/// spaces or small sample counts.
pub struct FullEnumerationStrategy {
    samples_per_axis: usize,
    sampling: GridSampling,
    rng: Pcg64,
}

impl FullEnumerationStrategy {
    pub fn new(samples_per_axis: usize, sampling: GridSampling, seed: u64) -> Self {
        Self {
            samples_per_axis,
            sampling,
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl SearchStrategy for FullEnumerationStrategy {
    fn search_best_point(&mut self, context: &mut SearchContext) -> Result<SpacePoint> {
        let space = context.build_space(SpaceScope::All)?;
        let mut points = space.grid(self.samples_per_axis, self.sampling, &mut self.rng);
        info!(
            "full enumeration: {} grid points over {} parameters",
            points.len(),
            space.num_parameters()
        );
        match context.find_best_among(&points, CostMode::Full)? {
            Some((index, cost)) => {
                info!("full enumeration: best cost {:.3}s", cost);
                Ok(points.swap_remove(index))
            }
            None => Ok(SpacePoint::new()),
        }
    }
}
