//! Implementations of the search strategies.

pub mod full_enumeration;
pub mod rrs;
pub mod smart_enumeration;
pub mod smart_rrs;

use crate::{
    error::{Result, TunerError},
    optimizer::SearchContext,
    space::{GridSampling, SpacePoint},
};

use self::{
    full_enumeration::FullEnumerationStrategy, rrs::RrsParams, rrs::RrsStrategy,
    smart_enumeration::SmartEnumerationStrategy, smart_rrs::SmartRrsStrategy,
};

/// Default number of grid samples per axis for the enumeration strategies.
pub const DEFAULT_SAMPLES_PER_AXIS: usize = 2;

/// One way of searching the parameter space for the cheapest point. The
/// implementation set is closed: full and smart enumeration, recursive
/// random search and its smart variant.
pub trait SearchStrategy {
    /// Runs the search and returns the best point found. An empty point
    /// means nothing was searchable and the baseline stands.
    fn search_best_point(&mut self, context: &mut SearchContext) -> Result<SpacePoint>;
}

/// Resolves a search-mode name from the CLI into a strategy.
pub fn search_strategy_resolver(name: &str, samples_per_axis: usize, seed: u64) -> Result<Box<dyn SearchStrategy>> {
    match name {
        "full" => Ok(Box::new(FullEnumerationStrategy::new(
            samples_per_axis,
            GridSampling::EquiSpaced,
            seed,
        ))),
        "smart_full" => Ok(Box::new(SmartEnumerationStrategy::new(
            samples_per_axis,
            GridSampling::EquiSpaced,
            seed,
        ))),
        "rrs" => Ok(Box::new(RrsStrategy::new(RrsParams::default(), seed))),
        "smart_rrs" => Ok(Box::new(SmartRrsStrategy::new(RrsParams::default(), seed))),
        other => Err(TunerError::UnknownStrategy(other.to_string())),
    }
}
