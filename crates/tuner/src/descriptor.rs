//! Value domains of single tunables and sampling over them.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};

/// One sampled value of a tunable. Stringifies for configuration stamping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl ParamValue {
    /// Numeric view of the value, when it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Bool(_) | ParamValue::Str(_) => None,
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Double(v) => Some(*v),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

/// Domain of one tunable together with its sampling rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParameterDescriptor {
    /// `false` / `true`.
    Boolean,
    /// Integers in `[min, max]`, both inclusive.
    IntegerRange { min: i64, max: i64 },
    /// Doubles in `[min, max]`, both inclusive.
    DoubleRange { min: f64, max: f64 },
    /// A fixed list of admissible strings.
    EnumeratedList { values: Vec<String> },
}

impl ParameterDescriptor {
    /// Integer range descriptor. `min > max` is a domain error.
    pub fn integer_range(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(TunerError::InvalidDomain {
                param: "integer range".to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(ParameterDescriptor::IntegerRange { min, max })
    }

    /// Double range descriptor. `min > max` is a domain error.
    pub fn double_range(min: f64, max: f64) -> Result<Self> {
        if min > max {
            return Err(TunerError::InvalidDomain {
                param: "double range".to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(ParameterDescriptor::DoubleRange { min, max })
    }

    /// Number of distinct values, `None` for continuous domains.
    pub fn cardinality(&self) -> Option<u64> {
        match self {
            ParameterDescriptor::Boolean => Some(2),
            ParameterDescriptor::IntegerRange { min, max } => Some((max - min) as u64 + 1),
            ParameterDescriptor::DoubleRange { min, max } => {
                if min == max {
                    Some(1)
                } else {
                    None
                }
            }
            ParameterDescriptor::EnumeratedList { values } => Some(values.len() as u64),
        }
    }

    /// The median of the domain, used for degenerate sample requests.
    pub fn median(&self) -> ParamValue {
        match self {
            ParameterDescriptor::Boolean => ParamValue::Bool(false),
            ParameterDescriptor::IntegerRange { min, max } => ParamValue::Int(min + (max - min) / 2),
            ParameterDescriptor::DoubleRange { min, max } => ParamValue::Double((min + max) / 2.0),
            ParameterDescriptor::EnumeratedList { values } => ParamValue::Str(values[values.len() / 2].clone()),
        }
    }

    /// `count` equi-spaced values covering the domain, in ascending order.
    /// Deterministic; capped at the cardinality for discrete domains;
    /// `count <= 1` yields the single median value.
    pub fn equi_spaced_values(&self, count: usize) -> Vec<ParamValue> {
        if count <= 1 {
            return vec![self.median()];
        }
        match self {
            ParameterDescriptor::Boolean => vec![ParamValue::Bool(false), ParamValue::Bool(true)],
            ParameterDescriptor::IntegerRange { min, max } => {
                let count = (count as u64).min(self.cardinality().unwrap()) as usize;
                if count == 1 {
                    return vec![ParamValue::Int(*min)];
                }
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    let fraction = i as f64 / (count - 1) as f64;
                    let value = min + ((max - min) as f64 * fraction).round() as i64;
                    if values.last() != Some(&ParamValue::Int(value)) {
                        values.push(ParamValue::Int(value));
                    }
                }
                values
            }
            ParameterDescriptor::DoubleRange { min, max } => {
                if min == max {
                    return vec![ParamValue::Double(*min)];
                }
                (0..count)
                    .map(|i| ParamValue::Double(min + (max - min) * i as f64 / (count - 1) as f64))
                    .collect()
            }
            ParameterDescriptor::EnumeratedList { values } => {
                let count = count.min(values.len());
                if count == 1 {
                    return vec![ParamValue::Str(values[0].clone())];
                }
                (0..count)
                    .map(|i| {
                        let index = (i as f64 * (values.len() - 1) as f64 / (count - 1) as f64).round() as usize;
                        ParamValue::Str(values[index].clone())
                    })
                    .collect()
            }
        }
    }

    /// `count` random values, distinct where the domain allows it.
    pub fn random_values<R: Rng>(&self, rng: &mut R, count: usize) -> Vec<ParamValue> {
        if count <= 1 {
            return vec![self.median()];
        }
        if let Some(cardinality) = self.cardinality() {
            if cardinality <= count as u64 {
                return self.equi_spaced_values(cardinality as usize);
            }
        }
        let mut values: Vec<ParamValue> = Vec::with_capacity(count);
        let mut attempts = 0;
        while values.len() < count {
            let value = self.random_value(rng);
            attempts += 1;
            if !values.contains(&value) || attempts > count * 10 {
                values.push(value);
            }
        }
        values
    }

    /// One value drawn uniformly from the whole domain.
    pub fn random_value<R: Rng>(&self, rng: &mut R) -> ParamValue {
        match self {
            ParameterDescriptor::Boolean => ParamValue::Bool(rng.gen()),
            ParameterDescriptor::IntegerRange { min, max } => ParamValue::Int(rng.gen_range(*min..=*max)),
            ParameterDescriptor::DoubleRange { min, max } => {
                if min == max {
                    ParamValue::Double(*min)
                } else {
                    ParamValue::Double(rng.gen_range(*min..*max))
                }
            }
            ParameterDescriptor::EnumeratedList { values } => {
                ParamValue::Str(values[rng.gen_range(0..values.len())].clone())
            }
        }
    }

    /// One value within `scale` of `center`: numeric domains draw uniformly
    /// from a window of half-width `scale * (max - min) / 2` around the
    /// center, clamped to the domain; discrete domains keep the center with
    /// probability `1 - scale`. `scale` is clamped to `[0, 1]`.
    pub fn random_value_near<R: Rng>(&self, rng: &mut R, center: &ParamValue, scale: f64) -> ParamValue {
        let scale = scale.clamp(0.0, 1.0);
        match self {
            ParameterDescriptor::Boolean | ParameterDescriptor::EnumeratedList { .. } => {
                if rng.gen_range(0.0..1.0) < scale {
                    self.random_value(rng)
                } else {
                    center.clone()
                }
            }
            ParameterDescriptor::IntegerRange { min, max } => {
                let center = match center {
                    ParamValue::Int(v) => *v,
                    other => other.as_f64().map(|v| v.round() as i64).unwrap_or(*min),
                }
                .clamp(*min, *max);
                let half_width = ((max - min) as f64 * scale / 2.0).round() as i64;
                let low = (center - half_width).max(*min);
                let high = (center + half_width).min(*max);
                ParamValue::Int(rng.gen_range(low..=high))
            }
            ParameterDescriptor::DoubleRange { min, max } => {
                let center = center.as_f64().unwrap_or((min + max) / 2.0).clamp(*min, *max);
                let half_width = (max - min) * scale / 2.0;
                let low = (center - half_width).max(*min);
                let high = (center + half_width).min(*max);
                if low == high {
                    ParamValue::Double(low)
                } else {
                    ParamValue::Double(rng.gen_range(low..high))
                }
            }
        }
    }
}
