//! Phase-decomposed grid search.
//!
//! Map-side cost barely depends on reduce-side parameters and vice versa,
//! so instead of one multiplicative grid over everything this runs two
//! sequential sub-searches: the map-affecting grid with reducers ignored,
//! then the reduce-affecting grid with the map winner fixed.

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

pub struct SmartEnumerationStrategy {
    samples_per_axis: usize,
    sampling: GridSampling,
    rng: Pcg64,
}

impl SmartEnumerationStrategy {
    pub fn new(samples_per_axis: usize, sampling: GridSampling, seed: u64) -> Self {
        Self {
            samples_per_axis,
            sampling,
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl SearchStrategy for SmartEnumerationStrategy {
    fn search_best_point(&mut self, context: &mut SearchContext) -> Result<SpacePoint> {
        let map_space = context.build_space(SpaceScope::MapAffecting)?;
        let mut map_points = map_space.grid(self.samples_per_axis, self.sampling, &mut self.rng);
        info!("smart enumeration: {} map-side grid points", map_points.len());
        let map_best = match context.find_best_among(&map_points, CostMode::MapOnly)? {
            Some((index, _)) => map_points.swap_remove(index),
            None => SpacePoint::new(),
        };

        let reduce_space = context.build_space(SpaceScope::ReduceAffecting)?;
        let mut reduce_points: Vec<SpacePoint> = reduce_space
            .grid(self.samples_per_axis, self.sampling, &mut self.rng)
            .into_iter()
            .map(|point| {
                let mut merged = map_best.clone();
                merged.merge(&point);
                merged
            })
            .collect();
        info!("smart enumeration: {} reduce-side grid points", reduce_points.len());
        match context.find_best_among(&reduce_points, CostMode::Full)? {
            Some((index, cost)) => {
                info!("smart enumeration: best cost {:.3}s", cost);
                Ok(reduce_points.swap_remove(index))
            }
            None => Ok(map_best),
        }
    }
}
