//! Phase-decomposed recursive random search, the default strategy: the
//! map/reduce phase split of smart enumeration with each phase solved by
//! recursive random search.

use log::info;

use crate::{
    error::Result,
    optimizer::{CostMode, SearchContext},
    space::SpacePoint,
    space_builder::SpaceScope,
};

use super::{
    rrs::{RrsParams, RrsStrategy},
    SearchStrategy,
};

pub struct SmartRrsStrategy {
    rrs: RrsStrategy,
}

impl SmartRrsStrategy {
    pub fn new(params: RrsParams, seed: u64) -> Self {
        Self {
            rrs: RrsStrategy::new(params, seed),
        }
    }
}

impl SearchStrategy for SmartRrsStrategy {
    fn search_best_point(&mut self, context: &mut SearchContext) -> Result<SpacePoint> {
        let map_space = context.build_space(SpaceScope::MapAffecting)?;
        info!("smart rrs: map phase over {} parameters", map_space.num_parameters());
        let map_best = self
            .rrs
            .search_in_space(context, &map_space, &SpacePoint::new(), CostMode::MapOnly)?;

        let reduce_space = context.build_space(SpaceScope::ReduceAffecting)?;
        info!("smart rrs: reduce phase over {} parameters", reduce_space.num_parameters());
        self.rrs
            .search_in_space(context, &reduce_space, &map_best, CostMode::Full)
    }
}
