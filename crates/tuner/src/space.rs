//! Searchable parameter spaces and points within them.

use std::collections::BTreeMap;

use rand::Rng;

use crate::{
    config::Configuration,
    descriptor::{ParamValue, ParameterDescriptor},
    parameters::{Parameter, ParameterEffect},
};

/// How grid axes pick their values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridSampling {
    /// Deterministic equi-spaced values per axis.
    EquiSpaced,
    /// Random values per axis, distinct where the domain allows.
    Random,
}

/// A deduplicated set of parameter descriptors, keyed by parameter so each
/// tunable appears at most once and iteration order is deterministic.
#[derive(Clone, Debug, Default)]
pub struct ParameterSpace {
    descriptors: BTreeMap<Parameter, ParameterDescriptor>,
}

impl ParameterSpace {
    /// Creates an empty space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, replacing any previous descriptor of the same
    /// parameter.
    pub fn add(&mut self, parameter: Parameter, descriptor: ParameterDescriptor) {
        self.descriptors.insert(parameter, descriptor);
    }

    /// Returns the descriptor of a parameter.
    pub fn descriptor(&self, parameter: Parameter) -> Option<&ParameterDescriptor> {
        self.descriptors.get(&parameter)
    }

    /// Whether a parameter is part of the space.
    pub fn contains(&self, parameter: Parameter) -> bool {
        self.descriptors.contains_key(&parameter)
    }

    /// Number of parameters in the space.
    pub fn num_parameters(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the space has no parameters.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates over `(parameter, descriptor)` pairs in parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &ParameterDescriptor)> {
        self.descriptors.iter().map(|(p, d)| (*p, d))
    }

    /// New space keeping only parameters whose effect tag is in `effects`.
    pub fn filter_by_effect(&self, effects: &[ParameterEffect]) -> ParameterSpace {
        ParameterSpace {
            descriptors: self
                .descriptors
                .iter()
                .filter(|(p, _)| effects.contains(&p.effect()))
                .map(|(p, d)| (*p, d.clone()))
                .collect(),
        }
    }

    /// Total number of distinct points: the product of axis cardinalities,
    /// `None` when any axis is unbounded or the product overflows.
    pub fn num_unique_points(&self) -> Option<u64> {
        let mut total: u64 = 1;
        for descriptor in self.descriptors.values() {
            total = total.checked_mul(descriptor.cardinality()?)?;
        }
        Some(total)
    }

    /// One point drawn uniformly from the whole space.
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> SpacePoint {
        SpacePoint {
            values: self
                .descriptors
                .iter()
                .map(|(p, d)| (*p, d.random_value(rng)))
                .collect(),
        }
    }

    /// One point localized around `center`. The per-parameter scale is
    /// `scale^(1/k)` for k parameters so the sampled volume shrinks by
    /// `scale` uniformly across dimensions. Parameters missing from the
    /// center are drawn from the whole axis.
    pub fn random_point_near<R: Rng>(&self, rng: &mut R, center: &SpacePoint, scale: f64) -> SpacePoint {
        if self.descriptors.is_empty() {
            return SpacePoint::new();
        }
        let axis_scale = scale.powf(1.0 / self.descriptors.len() as f64);
        SpacePoint {
            values: self
                .descriptors
                .iter()
                .map(|(p, d)| {
                    let value = match center.get(*p) {
                        Some(center_value) => d.random_value_near(rng, center_value, axis_scale),
                        None => d.random_value(rng),
                    };
                    (*p, value)
                })
                .collect(),
        }
    }

    /// Cartesian-product grid with up to `samples_per_axis` values per axis.
    /// The first axis seeds one point per value, each later axis multiplies
    /// the existing points by its value count. An empty space grids to no
    /// points.
    pub fn grid<R: Rng>(&self, samples_per_axis: usize, sampling: GridSampling, rng: &mut R) -> Vec<SpacePoint> {
        let mut points: Vec<SpacePoint> = Vec::new();
        for (parameter, descriptor) in self.descriptors.iter() {
            let values = match sampling {
                GridSampling::EquiSpaced => descriptor.equi_spaced_values(samples_per_axis),
                GridSampling::Random => descriptor.random_values(rng, samples_per_axis),
            };
            if points.is_empty() {
                points = values
                    .into_iter()
                    .map(|value| {
                        let mut point = SpacePoint::new();
                        point.set(*parameter, value);
                        point
                    })
                    .collect();
            } else {
                let mut extended = Vec::with_capacity(points.len() * values.len());
                for point in points.into_iter() {
                    for value in values.iter() {
                        let mut next = point.clone();
                        next.set(*parameter, value.clone());
                        extended.push(next);
                    }
                }
                points = extended;
            }
        }
        points
    }
}

/// One assignment of values to the parameters of a space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpacePoint {
    values: BTreeMap<Parameter, ParamValue>,
}

impl SpacePoint {
    /// Creates an empty point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of one parameter.
    pub fn set(&mut self, parameter: Parameter, value: ParamValue) {
        self.values.insert(parameter, value);
    }

    /// Returns the value of one parameter.
    pub fn get(&self, parameter: Parameter) -> Option<&ParamValue> {
        self.values.get(&parameter)
    }

    /// Number of assigned parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the point assigns no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(parameter, value)` pairs in parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &ParamValue)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    /// Merges `other` into this point; values of `other` win on overlap.
    pub fn merge(&mut self, other: &SpacePoint) {
        for (parameter, value) in other.values.iter() {
            self.values.insert(*parameter, value.clone());
        }
    }

    /// Stamps the point onto a configuration, stringifying every value.
    pub fn apply_to(&self, config: &mut Configuration) {
        for (parameter, value) in self.values.iter() {
            config.set(parameter.key(), value);
        }
    }
}
