//! The fixed catalog of tunable job parameters.

use serde::{Deserialize, Serialize};

use crate::{
    config::Configuration,
    descriptor::{ParamValue, ParameterDescriptor},
    error::Result,
};

/// Which side of the job a parameter influences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterEffect {
    /// Only map-task cost.
    MapOnly,
    /// Only shuffle/sort/reduce cost.
    ReduceOnly,
    /// Both sides.
    Both,
    /// Job-level output handling, independent of either side's task cost.
    JobLevelOnly,
}

/// Catalog of tunables. The set is closed; every entry carries a stable
/// configuration key, an effect tag, a default and a static domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    /// Size of the map-side sort buffer, MB.
    SortBufferMb,
    /// Fill fraction of the sort buffer which triggers a spill.
    SpillFraction,
    /// Fraction of the sort buffer reserved for record metadata.
    SortRecordFraction,
    /// Fan-in of multi-pass merges on both sides.
    MergeFactor,
    /// Number of reduce tasks.
    ReduceTasks,
    /// Number of in-memory shuffle segments which triggers an in-memory merge.
    InMemMergeThreshold,
    /// Fraction of reduce-task memory buffering shuffled map output.
    ShuffleInputBufferFraction,
    /// Fill fraction of the shuffle buffer which triggers a disk merge.
    ShuffleMergeFraction,
    /// Fraction of reduce-task memory retaining merged input during the
    /// reduce function.
    ReduceInputBufferFraction,
    /// Fraction of finished maps after which reducers may start.
    ReduceSlowstartFraction,
    /// Whether to run the combiner on map output.
    UseCombiner,
    /// Whether to compress intermediate map output.
    CompressMapOutput,
    /// Whether to compress the job output.
    CompressOutput,
}

/// Configuration key listing parameter keys excluded from search,
/// comma-separated.
pub const EXCLUDED_PARAMETERS_KEY: &str = "tuner.excluded.parameters";

/// Default reduce slow-start fraction.
pub const DEFAULT_SLOWSTART_FRACTION: f64 = 0.05;

impl Parameter {
    /// Every catalog entry, in descriptor-set order.
    pub const ALL: [Parameter; 13] = [
        Parameter::SortBufferMb,
        Parameter::SpillFraction,
        Parameter::SortRecordFraction,
        Parameter::MergeFactor,
        Parameter::ReduceTasks,
        Parameter::InMemMergeThreshold,
        Parameter::ShuffleInputBufferFraction,
        Parameter::ShuffleMergeFraction,
        Parameter::ReduceInputBufferFraction,
        Parameter::ReduceSlowstartFraction,
        Parameter::UseCombiner,
        Parameter::CompressMapOutput,
        Parameter::CompressOutput,
    ];

    /// Stable configuration key.
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::SortBufferMb => "job.sort.buffer.mb",
            Parameter::SpillFraction => "job.sort.spill.fraction",
            Parameter::SortRecordFraction => "job.sort.record.fraction",
            Parameter::MergeFactor => "job.merge.factor",
            Parameter::ReduceTasks => "job.reduce.tasks",
            Parameter::InMemMergeThreshold => "job.inmem.merge.threshold",
            Parameter::ShuffleInputBufferFraction => "job.shuffle.input.buffer.fraction",
            Parameter::ShuffleMergeFraction => "job.shuffle.merge.fraction",
            Parameter::ReduceInputBufferFraction => "job.reduce.input.buffer.fraction",
            Parameter::ReduceSlowstartFraction => "job.reduce.slowstart.fraction",
            Parameter::UseCombiner => "job.use.combiner",
            Parameter::CompressMapOutput => "job.compress.map.output",
            Parameter::CompressOutput => "job.compress.output",
        }
    }

    /// Which side of the job the parameter influences.
    pub fn effect(&self) -> ParameterEffect {
        match self {
            Parameter::SortBufferMb
            | Parameter::SpillFraction
            | Parameter::SortRecordFraction
            | Parameter::UseCombiner => ParameterEffect::MapOnly,
            Parameter::MergeFactor | Parameter::CompressMapOutput => ParameterEffect::Both,
            Parameter::ReduceTasks
            | Parameter::InMemMergeThreshold
            | Parameter::ShuffleInputBufferFraction
            | Parameter::ShuffleMergeFraction
            | Parameter::ReduceInputBufferFraction
            | Parameter::ReduceSlowstartFraction => ParameterEffect::ReduceOnly,
            Parameter::CompressOutput => ParameterEffect::JobLevelOnly,
        }
    }

    /// Value assumed when the configuration does not set the key.
    pub fn default_value(&self) -> ParamValue {
        match self {
            Parameter::SortBufferMb => ParamValue::Int(100),
            Parameter::SpillFraction => ParamValue::Double(0.8),
            Parameter::SortRecordFraction => ParamValue::Double(0.05),
            Parameter::MergeFactor => ParamValue::Int(10),
            Parameter::ReduceTasks => ParamValue::Int(1),
            Parameter::InMemMergeThreshold => ParamValue::Int(1000),
            Parameter::ShuffleInputBufferFraction => ParamValue::Double(0.7),
            Parameter::ShuffleMergeFraction => ParamValue::Double(0.66),
            Parameter::ReduceInputBufferFraction => ParamValue::Double(0.0),
            Parameter::ReduceSlowstartFraction => ParamValue::Double(DEFAULT_SLOWSTART_FRACTION),
            Parameter::UseCombiner | Parameter::CompressMapOutput | Parameter::CompressOutput => {
                ParamValue::Bool(false)
            }
        }
    }

    /// Reads the parameter from a configuration as a double, falling back
    /// to the catalog default.
    pub fn f64_value(&self, config: &Configuration) -> Result<f64> {
        match self.default_value() {
            ParamValue::Bool(_) | ParamValue::Str(_) => Ok(0.0),
            default => config.get_parsed_or(self.key(), default.as_f64().unwrap()),
        }
    }

    /// Reads the parameter from a configuration as an integer, falling back
    /// to the catalog default.
    pub fn i64_value(&self, config: &Configuration) -> Result<i64> {
        let default = match self.default_value() {
            ParamValue::Int(v) => v,
            other => other.as_f64().unwrap_or(0.0).round() as i64,
        };
        config.get_parsed_or(self.key(), default)
    }

    /// Reads the parameter from a configuration as a boolean, falling back
    /// to the catalog default.
    pub fn bool_value(&self, config: &Configuration) -> Result<bool> {
        let default = matches!(self.default_value(), ParamValue::Bool(true));
        config.get_parsed_or(self.key(), default)
    }

    /// Static domain, before any per-job tightening.
    pub fn static_descriptor(&self) -> ParameterDescriptor {
        match self {
            Parameter::SortBufferMb => ParameterDescriptor::IntegerRange { min: 50, max: 200 },
            Parameter::SpillFraction => ParameterDescriptor::DoubleRange { min: 0.5, max: 0.9 },
            Parameter::SortRecordFraction => ParameterDescriptor::DoubleRange { min: 0.01, max: 0.3 },
            Parameter::MergeFactor => ParameterDescriptor::IntegerRange { min: 10, max: 100 },
            Parameter::ReduceTasks => ParameterDescriptor::IntegerRange { min: 1, max: 100 },
            Parameter::InMemMergeThreshold => ParameterDescriptor::IntegerRange { min: 10, max: 1000 },
            Parameter::ShuffleInputBufferFraction => ParameterDescriptor::DoubleRange { min: 0.2, max: 0.9 },
            Parameter::ShuffleMergeFraction => ParameterDescriptor::DoubleRange { min: 0.2, max: 0.9 },
            Parameter::ReduceInputBufferFraction => ParameterDescriptor::DoubleRange { min: 0.0, max: 0.8 },
            Parameter::ReduceSlowstartFraction => ParameterDescriptor::DoubleRange { min: 0.0, max: 0.5 },
            Parameter::UseCombiner | Parameter::CompressMapOutput | Parameter::CompressOutput => {
                ParameterDescriptor::Boolean
            }
        }
    }
}
