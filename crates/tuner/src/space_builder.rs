//! Builds searchable parameter spaces for a specific job/cluster pairing.
//!
//! Static domains are often infeasible for a concrete job: a sort buffer
//! larger than the task memory, or a reduce count the cluster can never
//! run, would waste search budget outside the reachable region. Bounds are
//! therefore tightened from the projected profile and the cluster before a
//! descriptor enters the space.

use crate::{
    cluster::Cluster,
    config::Configuration,
    descriptor::ParameterDescriptor,
    error::Result,
    parameters::{Parameter, ParameterEffect, EXCLUDED_PARAMETERS_KEY},
    profile::{Counter, JobProfile, Statistic},
    space::ParameterSpace,
};

const MIB: u64 = 1 << 20;

/// Which slice of the catalog a space covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpaceScope {
    /// Every parameter.
    All,
    /// Parameters affecting map-task cost.
    MapAffecting,
    /// Parameters affecting shuffle/sort/reduce cost.
    ReduceAffecting,
}

impl SpaceScope {
    fn admits(&self, effect: ParameterEffect) -> bool {
        match self {
            SpaceScope::All => true,
            SpaceScope::MapAffecting => matches!(effect, ParameterEffect::MapOnly | ParameterEffect::Both),
            SpaceScope::ReduceAffecting => matches!(effect, ParameterEffect::ReduceOnly | ParameterEffect::Both),
        }
    }
}

/// Builds the space of one scope from the configuration, the profile
/// projected for it and the cluster. Parameters whose key appears in the
/// comma-separated exclusion-list configuration value are skipped.
/// Map-only jobs short-circuit: output compression is the only tunable
/// left (nothing passes through the sort/shuffle path), so the all/map
/// scopes yield the minimal space and the reduce scope an empty one.
pub fn build_space(
    scope: SpaceScope,
    config: &Configuration,
    profile: &JobProfile,
    cluster: &Cluster,
) -> Result<ParameterSpace> {
    let excluded: Vec<&str> = config
        .get(EXCLUDED_PARAMETERS_KEY)
        .map(|list| list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let mut space = ParameterSpace::new();
    if profile.is_map_only() {
        let minimal = match scope {
            SpaceScope::All | SpaceScope::MapAffecting => true,
            SpaceScope::ReduceAffecting => false,
        };
        if minimal && !excluded.contains(&Parameter::CompressOutput.key()) {
            space.add(Parameter::CompressOutput, Parameter::CompressOutput.static_descriptor());
        }
        return Ok(space);
    }

    for parameter in Parameter::ALL {
        if !scope.admits(parameter.effect()) || excluded.contains(&parameter.key()) {
            continue;
        }
        space.add(parameter, tightened_descriptor(parameter, profile, cluster)?);
    }
    Ok(space)
}

/// The parameter's static domain, tightened to the region reachable for
/// this job/cluster pairing.
fn tightened_descriptor(parameter: Parameter, profile: &JobProfile, cluster: &Cluster) -> Result<ParameterDescriptor> {
    let memory = cluster.min_task_memory();
    match parameter {
        Parameter::SortBufferMb if memory > 0 => {
            let memory_mb = (memory / MIB) as i64;
            let map_memory_mb = profile
                .map_profiles
                .iter()
                .map(|p| p.statistic_or(Statistic::MemoryPerTask, 0.0))
                .fold(0.0, f64::max) as i64
                / MIB as i64;
            let ceiling = (memory_mb * 3 / 4).max(20);
            let max = (memory_mb - map_memory_mb).clamp(20, ceiling);
            let min = match parameter.static_descriptor() {
                ParameterDescriptor::IntegerRange { min, .. } => min.min(max),
                _ => max,
            };
            ParameterDescriptor::integer_range(min, max)
        }
        Parameter::ReduceInputBufferFraction if memory > 0 => {
            let reduce_memory = profile
                .reduce_profile_required()?
                .statistic_or(Statistic::MemoryPerTask, 0.0);
            let max = (1.0 - reduce_memory / memory as f64).clamp(0.0, 0.8);
            ParameterDescriptor::double_range(0.0, max)
        }
        Parameter::ReduceTasks if memory > 0 && profile.shuffle_bytes() > 0 => {
            let shuffle = profile.shuffle_bytes() as f64;
            let groups = profile
                .reduce_profile_required()?
                .counter(Counter::ReduceGroups)
                .max(1) as i64;
            let slots = (cluster.total_reduce_slots() as i64).max(1);
            let raw_max = (4.0 * shuffle / memory as f64).ceil() as i64;
            let max = raw_max.clamp(slots, groups.max(slots));
            let min = ((shuffle / (2.0 * memory as f64)).ceil() as i64).clamp(1, max);
            ParameterDescriptor::integer_range(min, max)
        }
        _ => Ok(parameter.static_descriptor()),
    }
}
