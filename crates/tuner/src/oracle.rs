//! Profile projection: from a measured base profile to the profile of a
//! hypothetical dataset/configuration pairing.

use std::collections::BTreeMap;

use crate::{
    config::Configuration,
    dataset::DatasetModel,
    error::Result,
    parameters::Parameter,
    profile::{Counter, JobProfile, Phase, Statistic, TaskKind, TaskProfile},
};

/// Projects a job profile for a hypothetical configuration and dataset.
/// Implementations must be deterministic for fixed inputs. When
/// `ignore_reducers` is set the projected profile carries no reduce side.
pub trait ProfileOracle: Send + Sync {
    fn project(&self, config: &Configuration, dataset: &dyn DatasetModel, ignore_reducers: bool)
        -> Result<JobProfile>;
}

/// Default oracle: rescales a measured base profile by dataset size ratios
/// and configuration effects (reduce-count repartitioning, combiner
/// selectivity, compression ratio, spill and merge-round estimates). The
/// numeric model is deliberately coarse; it exists so predictions react to
/// every searched knob in a plausible direction.
#[derive(Clone, Debug)]
pub struct ScalingOracle {
    base: JobProfile,
}

impl ScalingOracle {
    pub fn new(base: JobProfile) -> Self {
        ScalingOracle { base }
    }

    /// The measured profile the oracle projects from.
    pub fn base_profile(&self) -> &JobProfile {
        &self.base
    }

    /// Number of spill files one map task writes given its output size and
    /// the sort-buffer settings.
    fn num_spills(output_bytes: f64, sort_buffer_mb: i64, spill_fraction: f64, record_fraction: f64) -> f64 {
        let buffer = sort_buffer_mb as f64 * (1 << 20) as f64 * spill_fraction * (1.0 - record_fraction);
        if buffer <= 0.0 {
            return 1.0;
        }
        (output_bytes / buffer).ceil().max(1.0)
    }

    /// Number of multi-pass merge rounds needed to merge `segments` streams
    /// with the given fan-in.
    fn merge_rounds(segments: f64, merge_factor: i64) -> f64 {
        let factor = (merge_factor as f64).max(2.0);
        if segments <= 1.0 {
            0.0
        } else {
            (segments.ln() / factor.ln()).ceil()
        }
    }

    fn project_map_kind(
        &self,
        base: &TaskProfile,
        config: &Configuration,
        split_count: u64,
        avg_size: u64,
    ) -> Result<TaskProfile> {
        let base_config = &self.base.measured_config;
        let size_ratio = ratio(avg_size as f64, base.avg_input_size());

        let combine = base.statistic_or(Statistic::CombineSelectivity, 1.0);
        let compress = base.statistic_or(Statistic::CompressionRatio, 1.0);
        let combine_factor = ratio(
            combiner_factor(Parameter::UseCombiner.bool_value(config)?, combine),
            combiner_factor(Parameter::UseCombiner.bool_value(base_config)?, combine),
        );
        let output_per_task = base.avg_output_size() * size_ratio * combine_factor;
        let written_factor = ratio(
            compression_factor(Parameter::CompressMapOutput.bool_value(config)?, compress),
            compression_factor(Parameter::CompressMapOutput.bool_value(base_config)?, compress),
        );

        let spills = Self::num_spills(
            output_per_task,
            Parameter::SortBufferMb.i64_value(config)?,
            Parameter::SpillFraction.f64_value(config)?,
            Parameter::SortRecordFraction.f64_value(config)?,
        );
        let base_spills = Self::num_spills(
            base.avg_output_size(),
            Parameter::SortBufferMb.i64_value(base_config)?,
            Parameter::SpillFraction.f64_value(base_config)?,
            Parameter::SortRecordFraction.f64_value(base_config)?,
        );
        let rounds_ratio = ratio(
            1.0 + Self::merge_rounds(spills, Parameter::MergeFactor.i64_value(config)?),
            1.0 + Self::merge_rounds(base_spills, Parameter::MergeFactor.i64_value(base_config)?),
        );

        let mut projected = TaskProfile::new(TaskKind::Map, split_count);
        let output_ratio = size_ratio * combine_factor;
        for (phase, factor) in [
            (Phase::Read, size_ratio),
            (Phase::Map, size_ratio),
            (Phase::Collect, size_ratio),
            (Phase::Spill, output_ratio * written_factor * ratio(spills, base_spills).max(1.0)),
            (Phase::Merge, output_ratio * written_factor * rounds_ratio),
        ] {
            projected.phase_times.insert(phase, base.phase_time(phase) * factor);
        }

        projected.counters.insert(
            Counter::InputBytes,
            (avg_size as f64 * split_count as f64).round() as u64,
        );
        projected.counters.insert(
            Counter::OutputBytes,
            (output_per_task * split_count as f64).round() as u64,
        );
        for counter in [Counter::InputRecords, Counter::OutputRecords] {
            let scaled = base.counter(counter) as f64 * size_ratio * ratio(split_count as f64, base.num_tasks as f64);
            projected.counters.insert(counter, scaled.round() as u64);
        }
        projected.statistics = base.statistics.clone();
        Ok(projected)
    }

    fn project_reduce(
        &self,
        base: &TaskProfile,
        config: &Configuration,
        map_profiles: &[TaskProfile],
    ) -> Result<Option<TaskProfile>> {
        let base_config = &self.base.measured_config;
        let num_reduce = Parameter::ReduceTasks.i64_value(config)?.max(0) as u64;
        if num_reduce == 0 {
            return Ok(None);
        }

        let compress = base.statistic_or(Statistic::CompressionRatio, 1.0);
        let shuffled_factor = ratio(
            compression_factor(Parameter::CompressMapOutput.bool_value(config)?, compress),
            compression_factor(Parameter::CompressMapOutput.bool_value(base_config)?, compress),
        );
        let total_map_output: f64 = map_profiles.iter().map(|p| p.counter(Counter::OutputBytes) as f64).sum();
        let shuffle_total = total_map_output * shuffled_factor;
        let per_reduce = shuffle_total / num_reduce as f64;
        let base_per_reduce = ratio(base.counter(Counter::ShuffleBytes) as f64, base.num_tasks as f64);
        let data_ratio = ratio(per_reduce, base_per_reduce);

        // One shuffle segment per map task; the merge fan-in and the shuffle
        // buffer decide how much of the merging spills through disk.
        let num_maps: u64 = map_profiles.iter().map(|p| p.num_tasks).sum();
        let base_num_maps = self.base.num_map_tasks();
        let memory = base.statistic_or(Statistic::MemoryPerTask, 1.0);
        let sort_cost = |config: &Configuration, segments: u64, per_reduce: f64| -> Result<f64> {
            let rounds = 1.0 + Self::merge_rounds(segments as f64, Parameter::MergeFactor.i64_value(config)?);
            let in_memory = Parameter::ShuffleInputBufferFraction.f64_value(config)? * memory;
            let disk_fraction = (1.0 - ratio(in_memory, per_reduce.max(1.0))).clamp(0.0, 1.0);
            Ok(rounds * (0.25 + 0.75 * disk_fraction))
        };
        let sort_factor = ratio(
            sort_cost(config, num_maps, per_reduce)?,
            sort_cost(base_config, base_num_maps, base_per_reduce)?,
        );
        let reduce_factor = ratio(
            1.0 - 0.3 * Parameter::ReduceInputBufferFraction.f64_value(config)?,
            1.0 - 0.3 * Parameter::ReduceInputBufferFraction.f64_value(base_config)?,
        );
        let write_factor = ratio(
            compression_factor(Parameter::CompressOutput.bool_value(config)?, compress),
            compression_factor(Parameter::CompressOutput.bool_value(base_config)?, compress),
        );

        let mut projected = TaskProfile::new(TaskKind::Reduce, num_reduce);
        for (phase, factor) in [
            (Phase::Shuffle, data_ratio),
            (Phase::Sort, data_ratio * sort_factor),
            (Phase::Reduce, data_ratio * reduce_factor),
            (Phase::Write, data_ratio * write_factor),
        ] {
            projected.phase_times.insert(phase, base.phase_time(phase) * factor);
        }

        let mut counters = BTreeMap::new();
        counters.insert(Counter::ShuffleBytes, shuffle_total.round() as u64);
        let input_ratio = ratio(shuffle_total, base.counter(Counter::ShuffleBytes) as f64);
        for counter in [Counter::OutputBytes, Counter::ReduceGroups] {
            counters.insert(counter, (base.counter(counter) as f64 * input_ratio).round() as u64);
        }
        projected.counters = counters;
        projected.statistics = base.statistics.clone();
        Ok(Some(projected))
    }
}

impl ProfileOracle for ScalingOracle {
    fn project(
        &self,
        config: &Configuration,
        dataset: &dyn DatasetModel,
        ignore_reducers: bool,
    ) -> Result<JobProfile> {
        let mut map_profiles = Vec::new();
        for spec in dataset.map_input_specs(config) {
            let base = self
                .base
                .map_profiles
                .get(spec.index)
                .or_else(|| self.base.map_profiles.first())
                .ok_or(crate::error::TunerError::MissingProfile { kind: "map" })?;
            map_profiles.push(self.project_map_kind(base, config, spec.split_count, spec.avg_size)?);
        }

        let reduce_profile = match (&self.base.reduce_profile, ignore_reducers) {
            (Some(base), false) => self.project_reduce(base, config, &map_profiles)?,
            _ => None,
        };

        let mut measured_config = config.clone();
        measured_config.set(Parameter::ReduceTasks.key(), reduce_profile.as_ref().map(|p| p.num_tasks).unwrap_or(0));
        Ok(JobProfile {
            job_name: self.base.job_name.clone(),
            map_profiles,
            reduce_profile,
            measured_config,
        })
    }
}

fn ratio(new: f64, base: f64) -> f64 {
    if base <= 0.0 {
        1.0
    } else {
        new / base
    }
}

fn combiner_factor(enabled: bool, selectivity: f64) -> f64 {
    if enabled {
        selectivity.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

fn compression_factor(enabled: bool, compression_ratio: f64) -> f64 {
    if enabled {
        compression_ratio.clamp(0.0, 1.0)
    } else {
        1.0
    }
}
