use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg64;

use mr_tuner::{
    cluster::Cluster,
    config::Configuration,
    descriptor::{ParamValue, ParameterDescriptor},
    error::TunerError,
    oracle::{ProfileOracle, ScalingOracle},
    dataset::StaticDataset,
    optimizer::JobOptimizer,
    parameters::{Parameter, EXCLUDED_PARAMETERS_KEY},
    profile::{Counter, JobProfile, Phase, Statistic, TaskKind, TaskProfile},
    search_strategies::search_strategy_resolver,
    simulator::TaskScheduler,
    space::{GridSampling, ParameterSpace, SpacePoint},
    space_builder::{build_space, SpaceScope},
    whatif::WhatIfEngine,
};

const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

fn sample_cluster() -> Cluster {
    Cluster::uniform(1, 2, 2, 2, GIB)
}

fn sample_map_profile(num_tasks: u64) -> TaskProfile {
    let mut map = TaskProfile::new(TaskKind::Map, num_tasks);
    map.phase_times = [
        (Phase::Read, 2.0),
        (Phase::Map, 3.0),
        (Phase::Collect, 1.0),
        (Phase::Spill, 1.0),
        (Phase::Merge, 1.0),
    ]
    .into_iter()
    .collect();
    map.counters = [
        (Counter::InputBytes, num_tasks * 128 * MIB),
        (Counter::InputRecords, num_tasks * 1_000_000),
        (Counter::OutputBytes, 2 * GIB),
        (Counter::OutputRecords, num_tasks * 1_000_000),
    ]
    .into_iter()
    .collect();
    map.statistics = [
        (Statistic::MemoryPerTask, 300.0 * MIB as f64),
        (Statistic::CombineSelectivity, 0.5),
        (Statistic::CompressionRatio, 0.4),
    ]
    .into_iter()
    .collect();
    map
}

fn sample_profile() -> JobProfile {
    let mut reduce = TaskProfile::new(TaskKind::Reduce, 2);
    reduce.phase_times = [
        (Phase::Shuffle, 6.0),
        (Phase::Sort, 2.0),
        (Phase::Reduce, 3.0),
        (Phase::Write, 1.0),
    ]
    .into_iter()
    .collect();
    reduce.counters = [
        (Counter::ShuffleBytes, 2 * GIB),
        (Counter::ReduceGroups, 100),
        (Counter::OutputBytes, GIB),
    ]
    .into_iter()
    .collect();
    reduce.statistics = [
        (Statistic::MemoryPerTask, 600.0 * MIB as f64),
        (Statistic::CompressionRatio, 0.4),
    ]
    .into_iter()
    .collect();

    let mut measured_config = Configuration::new();
    measured_config.set(Parameter::ReduceTasks.key(), 2);

    JobProfile {
        job_name: "sample".to_string(),
        map_profiles: vec![sample_map_profile(8)],
        reduce_profile: Some(reduce),
        measured_config,
    }
}

fn map_only_profile() -> JobProfile {
    JobProfile {
        job_name: "map_only".to_string(),
        map_profiles: vec![sample_map_profile(8)],
        reduce_profile: None,
        measured_config: Configuration::new(),
    }
}

#[test]
fn descriptor_domain_errors() {
    assert!(matches!(
        ParameterDescriptor::integer_range(5, 2),
        Err(TunerError::InvalidDomain { .. })
    ));
    assert!(matches!(
        ParameterDescriptor::double_range(0.9, 0.1),
        Err(TunerError::InvalidDomain { .. })
    ));
    assert!(ParameterDescriptor::integer_range(2, 2).is_ok());
}

#[test]
fn equi_spaced_values_are_deterministic_and_capped() {
    let descriptor = ParameterDescriptor::integer_range(0, 4).unwrap();
    let first = descriptor.equi_spaced_values(3);
    let second = descriptor.equi_spaced_values(3);
    assert_eq!(first, second);
    assert_eq!(first, vec![ParamValue::Int(0), ParamValue::Int(2), ParamValue::Int(4)]);

    // More samples than values collapses to the whole domain.
    assert_eq!(descriptor.equi_spaced_values(100).len(), 5);

    // Degenerate requests return the single median value.
    assert_eq!(descriptor.equi_spaced_values(1), vec![ParamValue::Int(2)]);
    assert_eq!(descriptor.equi_spaced_values(0), vec![ParamValue::Int(2)]);

    let double = ParameterDescriptor::double_range(0.0, 1.0).unwrap();
    assert_eq!(double.equi_spaced_values(1), vec![ParamValue::Double(0.5)]);
    let values = double.equi_spaced_values(5);
    assert_eq!(values.first(), Some(&ParamValue::Double(0.0)));
    assert_eq!(values.last(), Some(&ParamValue::Double(1.0)));
}

#[test]
fn localized_values_stay_within_scale() {
    let descriptor = ParameterDescriptor::double_range(0.0, 100.0).unwrap();
    let center = ParamValue::Double(50.0);
    let mut rng = Pcg64::seed_from_u64(123);
    for _ in 0..200 {
        let value = descriptor.random_value_near(&mut rng, &center, 0.1);
        let v = value.as_f64().unwrap();
        assert!((v - 50.0).abs() <= 0.1 * 100.0 / 2.0 + 1e-9, "{} too far from center", v);
    }
    // At scale zero the center is returned exactly.
    let value = descriptor.random_value_near(&mut rng, &center, 0.0);
    assert_eq!(value, ParamValue::Double(50.0));

    let int = ParameterDescriptor::integer_range(0, 100).unwrap();
    let center = ParamValue::Int(50);
    for _ in 0..200 {
        let value = int.random_value_near(&mut rng, &center, 0.2);
        if let ParamValue::Int(v) = value {
            assert!((v - 50).abs() <= 10, "{} too far from center", v);
        } else {
            panic!("integer domain produced a non-integer value");
        }
    }
}

#[test]
fn grid_cardinality_is_product_of_capped_axes() {
    let mut space = ParameterSpace::new();
    space.add(Parameter::UseCombiner, ParameterDescriptor::Boolean);
    space.add(Parameter::MergeFactor, ParameterDescriptor::integer_range(1, 5).unwrap());
    space.add(
        Parameter::CompressOutput,
        ParameterDescriptor::EnumeratedList {
            values: vec!["none".to_string(), "fast".to_string(), "best".to_string()],
        },
    );
    let mut rng = Pcg64::seed_from_u64(123);

    // 2 samples per axis: min(2,2) * min(2,5) * min(2,3) complete points.
    let grid = space.grid(2, GridSampling::EquiSpaced, &mut rng);
    assert_eq!(grid.len(), 8);
    assert!(grid.iter().all(|point| point.len() == 3));

    // 10 samples per axis: every axis capped at its cardinality.
    let grid = space.grid(10, GridSampling::EquiSpaced, &mut rng);
    assert_eq!(grid.len(), 2 * 5 * 3);

    let random_grid = space.grid(10, GridSampling::Random, &mut rng);
    assert_eq!(random_grid.len(), 2 * 5 * 3);

    assert_eq!(space.num_unique_points(), Some(2 * 5 * 3));
    space.add(
        Parameter::SpillFraction,
        ParameterDescriptor::double_range(0.0, 1.0).unwrap(),
    );
    assert_eq!(space.num_unique_points(), None);
}

#[test]
fn point_merge_later_wins() {
    let mut a = SpacePoint::new();
    a.set(Parameter::MergeFactor, ParamValue::Int(10));
    a.set(Parameter::UseCombiner, ParamValue::Bool(false));
    let mut b = SpacePoint::new();
    b.set(Parameter::MergeFactor, ParamValue::Int(20));
    a.merge(&b);
    assert_eq!(a.get(Parameter::MergeFactor), Some(&ParamValue::Int(20)));
    assert_eq!(a.get(Parameter::UseCombiner), Some(&ParamValue::Bool(false)));

    let mut config = Configuration::new();
    a.apply_to(&mut config);
    assert_eq!(config.get("job.merge.factor"), Some("20"));
    assert_eq!(config.get("job.use.combiner"), Some("false"));
}

#[test]
fn space_builder_tightens_bounds() {
    let config = Configuration::new();
    let profile = sample_profile();
    let cluster = sample_cluster();

    let space = build_space(SpaceScope::All, &config, &profile, &cluster).unwrap();
    assert_eq!(space.num_parameters(), 13);

    // Sort buffer: memory 1024 MB, estimated map memory 300 MB.
    assert_eq!(
        space.descriptor(Parameter::SortBufferMb),
        Some(&ParameterDescriptor::IntegerRange { min: 50, max: 724 })
    );

    // Reduce input buffer: 1 - 600/1024, within [0, 0.8].
    match space.descriptor(Parameter::ReduceInputBufferFraction) {
        Some(ParameterDescriptor::DoubleRange { min, max }) => {
            assert_eq!(*min, 0.0);
            assert!((max - (1.0 - 600.0 / 1024.0)).abs() < 1e-9);
        }
        other => panic!("unexpected descriptor {:?}", other),
    }

    // Reduce count: shuffle 2 GiB on 1 GiB tasks, 4 reduce slots, 100 groups.
    assert_eq!(
        space.descriptor(Parameter::ReduceTasks),
        Some(&ParameterDescriptor::IntegerRange { min: 1, max: 8 })
    );
}

#[test]
fn map_only_jobs_short_circuit_space_building() {
    let config = Configuration::new();
    let profile = map_only_profile();
    let cluster = sample_cluster();

    for scope in [SpaceScope::All, SpaceScope::MapAffecting] {
        let space = build_space(scope, &config, &profile, &cluster).unwrap();
        assert_eq!(space.num_parameters(), 1);
        assert!(space.contains(Parameter::CompressOutput));
    }
    let reduce_space = build_space(SpaceScope::ReduceAffecting, &config, &profile, &cluster).unwrap();
    assert!(reduce_space.is_empty());
}

#[test]
fn exclusion_removes_exactly_one_descriptor_everywhere() {
    let profile = sample_profile();
    let cluster = sample_cluster();
    let mut config = Configuration::new();

    let baseline: Vec<usize> = [SpaceScope::All, SpaceScope::MapAffecting, SpaceScope::ReduceAffecting]
        .into_iter()
        .map(|scope| build_space(scope, &config, &profile, &cluster).unwrap().num_parameters())
        .collect();
    assert_eq!(baseline, vec![13, 6, 8]);

    config.set(EXCLUDED_PARAMETERS_KEY, Parameter::MergeFactor.key());
    for (scope, expected) in [
        (SpaceScope::All, 12),
        (SpaceScope::MapAffecting, 5),
        (SpaceScope::ReduceAffecting, 7),
    ] {
        let space = build_space(scope, &config, &profile, &cluster).unwrap();
        assert_eq!(space.num_parameters(), expected);
        assert!(!space.contains(Parameter::MergeFactor));
        assert_eq!(space.contains(Parameter::SortBufferMb), scope != SpaceScope::ReduceAffecting);
    }
}

#[test]
fn end_to_end_scenario_two_waves_and_slow_start() {
    // 1 rack, 2 hosts, 2 map + 2 reduce slots each; 8 uniform maps of 8s,
    // 2 reducers; heartbeat 3s, setup/cleanup 1s.
    let cluster = sample_cluster();
    let profile = sample_profile();
    let config = Configuration::new();
    let mut scheduler = TaskScheduler::new(&cluster);

    let execution = scheduler.detailed_schedule(&profile, &config, 0.0).unwrap();

    assert_eq!(execution.setup_tasks.len(), 1);
    assert_eq!(execution.map_tasks.len(), 8);
    assert_eq!(execution.reduce_tasks.len(), 2);
    assert_eq!(execution.cleanup_tasks.len(), 1);

    // 8 maps over 4 slots run in exactly 2 waves.
    let mut starts: Vec<f64> = execution.map_tasks.iter().map(|t| t.attempt.start_time).collect();
    starts.sort_by(f64::total_cmp);
    assert!(starts[3] < starts[4], "expected two map waves");
    let first_wave_end = execution.map_tasks.iter().map(|t| t.attempt.end_time).fold(f64::MAX, f64::min);
    assert!(starts[4] >= first_wave_end);

    // Reducers start once ceil(0.05 * 8) = 1 map has completed.
    for task in execution.reduce_tasks.iter() {
        assert!(task.attempt.start_time >= first_wave_end);
    }

    // Cleanup runs after the later reducer.
    let last_reduce_end = execution.reduce_tasks.iter().map(|t| t.attempt.end_time).fold(0.0, f64::max);
    assert!(execution.cleanup_tasks[0].attempt.start_time >= last_reduce_end);

    // Hand-computed completion: last map ends at 32, the overlapping
    // reducers finish shuffling at 32 + 6/8, sort 2s, reduce+write 4s,
    // then two heartbeats and the 1s cleanup.
    let expected = 32.0 + 6.0 / 8.0 + 2.0 + 4.0 + 2.0 * 3.0 + 1.0;
    assert!((execution.completion_time() - expected).abs() < 1e-9);
}

#[test]
fn reduce_attempt_ordering_invariants() {
    let cluster = sample_cluster();
    let profile = sample_profile();
    let config = Configuration::new();
    let mut scheduler = TaskScheduler::new(&cluster);

    let execution = scheduler.detailed_schedule(&profile, &config, 0.0).unwrap();
    let last_map_end = execution.map_tasks.iter().map(|t| t.attempt.end_time).fold(0.0, f64::max);
    for task in execution.reduce_tasks.iter() {
        let attempt = &task.attempt;
        let shuffle_end = attempt.shuffle_end_time.unwrap();
        let sort_end = attempt.sort_end_time.unwrap();
        assert!(shuffle_end >= attempt.start_time);
        assert!(sort_end >= shuffle_end);
        assert!(attempt.end_time >= sort_end);
        if attempt.start_time < last_map_end {
            assert!(shuffle_end >= last_map_end);
        }
    }
}

#[test]
fn map_only_jobs_skip_the_reduce_side_entirely() {
    let cluster = sample_cluster();
    let config = Configuration::new();
    let mut scheduler = TaskScheduler::new(&cluster);

    let execution = scheduler.detailed_schedule(&map_only_profile(), &config, 0.0).unwrap();
    assert!(execution.reduce_tasks.is_empty());
    assert_eq!(execution.cleanup_tasks.len(), 1);

    // Setup + two 8s map waves + cleanup on the latest map's slot; no
    // shuffle/sort/reduce contribution.
    let expected = 32.0 + 2.0 * 3.0 + 1.0;
    assert!((execution.completion_time() - expected).abs() < 1e-9);

    // Ignoring reducers on a job that has them gives the same timeline.
    scheduler.reset();
    let duration = scheduler.fast_schedule(&sample_profile(), &config, 0.0, true).unwrap();
    assert!((duration - expected).abs() < 1e-9);
}

#[test]
fn fast_and_detailed_modes_agree() {
    let cluster = sample_cluster();
    let profile = sample_profile();
    let config = Configuration::new();
    let mut scheduler = TaskScheduler::new(&cluster);

    let detailed = scheduler.detailed_schedule(&profile, &config, 0.0).unwrap();
    scheduler.reset();
    let fast = scheduler.fast_schedule(&profile, &config, 0.0, false).unwrap();
    assert!((fast - detailed.duration()).abs() < 1e-9);
}

#[test]
fn checkpoint_and_reset_restore_slot_occupancy() {
    let cluster = sample_cluster();
    let profile = sample_profile();
    let config = Configuration::new();
    let mut scheduler = TaskScheduler::new(&cluster);

    let first = scheduler.fast_schedule(&profile, &config, 0.0, false).unwrap();
    // Without a reset the slots stay busy and the next job queues behind.
    let queued = scheduler.fast_schedule(&profile, &config, 0.0, false).unwrap();
    assert!(queued > first);
    scheduler.reset();
    let restored = scheduler.fast_schedule(&profile, &config, 0.0, false).unwrap();
    assert!((restored - first).abs() < 1e-9);

    // A checkpoint moves the baseline to the current occupancy.
    scheduler.checkpoint();
    let stacked = scheduler.fast_schedule(&profile, &config, 0.0, false).unwrap();
    scheduler.reset();
    let stacked_again = scheduler.fast_schedule(&profile, &config, 0.0, false).unwrap();
    assert!((stacked - stacked_again).abs() < 1e-9);
    assert!(stacked_again > first);
}

#[test]
fn missing_slots_are_an_error() {
    let profile = sample_profile();
    let config = Configuration::new();

    let mut no_reduce_slots = TaskScheduler::new(&Cluster::uniform(1, 2, 2, 0, GIB));
    assert!(matches!(
        no_reduce_slots.fast_schedule(&profile, &config, 0.0, false),
        Err(TunerError::MissingSlots { kind: "reduce" })
    ));

    let mut no_map_slots = TaskScheduler::new(&Cluster::uniform(1, 2, 0, 2, GIB));
    assert!(matches!(
        no_map_slots.fast_schedule(&profile, &config, 0.0, false),
        Err(TunerError::MissingSlots { kind: "map" })
    ));
}

#[test]
fn larger_map_inputs_are_scheduled_first() {
    let mut small = sample_map_profile(1);
    small.counters.insert(Counter::InputBytes, 10 * MIB);
    small.phase_times.insert(Phase::Map, 1.0);
    let mut large = sample_map_profile(1);
    large.counters.insert(Counter::InputBytes, 20 * MIB);
    large.phase_times.insert(Phase::Map, 7.0);
    let profile = JobProfile {
        job_name: "two_kinds".to_string(),
        map_profiles: vec![small, large],
        reduce_profile: None,
        measured_config: Configuration::new(),
    };

    let mut scheduler = TaskScheduler::new(&Cluster::uniform(1, 1, 1, 0, GIB));
    let execution = scheduler.detailed_schedule(&profile, &Configuration::new(), 0.0).unwrap();
    let first = &execution.map_tasks[0].attempt;
    // The large kind runs 7s of map phase against the small kind's 1s.
    assert!((first.end_time - first.start_time - 12.0).abs() < 1e-9);
}

#[test]
fn oracle_projection_is_deterministic() {
    let profile = sample_profile();
    let oracle = ScalingOracle::new(profile.clone());
    let dataset = StaticDataset::from_profile(&profile);
    let config = profile.measured_config.clone();

    let a = oracle.project(&config, &dataset, false).unwrap();
    let b = oracle.project(&config, &dataset, false).unwrap();
    assert_eq!(a.num_map_tasks(), b.num_map_tasks());
    assert_eq!(a.num_reduce_tasks(), 2);
    for (x, y) in a.map_profiles[0].phase_times.iter().zip(b.map_profiles[0].phase_times.iter()) {
        assert_eq!(x, y);
    }

    // The measured dataset projects the measured timings back unchanged.
    for (phase, time) in profile.map_profiles[0].phase_times.iter() {
        assert!((a.map_profiles[0].phase_time(*phase) - time).abs() < 1e-9);
    }

    let map_only = oracle.project(&config, &dataset, true).unwrap();
    assert!(map_only.is_map_only());
}

fn optimizer_for(profile: &JobProfile, mode: &str, samples: usize, threads: usize) -> JobOptimizer {
    let oracle = Arc::new(ScalingOracle::new(profile.clone()));
    let dataset = Arc::new(StaticDataset::from_profile(profile));
    let strategy = search_strategy_resolver(mode, samples, 123).unwrap();
    JobOptimizer::new(oracle, dataset, sample_cluster(), profile.measured_config.clone(), strategy)
        .with_threads(threads)
}

#[test]
fn full_enumeration_returns_the_grid_optimum() {
    let profile = sample_profile();
    let mut base_config = profile.measured_config.clone();
    // Keep the grid small: search three axes only.
    base_config.set(
        EXCLUDED_PARAMETERS_KEY,
        [
            Parameter::SortBufferMb,
            Parameter::SpillFraction,
            Parameter::SortRecordFraction,
            Parameter::InMemMergeThreshold,
            Parameter::ShuffleInputBufferFraction,
            Parameter::ShuffleMergeFraction,
            Parameter::ReduceInputBufferFraction,
            Parameter::ReduceSlowstartFraction,
            Parameter::UseCombiner,
            Parameter::CompressMapOutput,
        ]
        .iter()
        .map(|p| p.key())
        .collect::<Vec<_>>()
        .join(","),
    );
    let mut searched_profile = profile.clone();
    searched_profile.measured_config = base_config.clone();

    let mut optimizer = optimizer_for(&searched_profile, "full", 2, 1);
    let result = optimizer.optimize(0.0).unwrap();

    // Rebuild the same grid and cost every point independently.
    let oracle = ScalingOracle::new(searched_profile.clone());
    let dataset = StaticDataset::from_profile(&searched_profile);
    let cluster = sample_cluster();
    let projected = oracle.project(&base_config, &dataset, false).unwrap();
    let space = build_space(SpaceScope::All, &base_config, &projected, &cluster).unwrap();
    let mut rng = Pcg64::seed_from_u64(123);
    let grid = space.grid(2, GridSampling::EquiSpaced, &mut rng);
    assert_eq!(grid.len(), 8);

    let mut scheduler = TaskScheduler::new(&cluster);
    let mut best = f64::MAX;
    for point in grid.iter() {
        let mut config = base_config.clone();
        point.apply_to(&mut config);
        let profile = oracle.project(&config, &dataset, false).unwrap();
        scheduler.reset();
        let cost = scheduler.fast_schedule(&profile, &config, 0.0, false).unwrap();
        assert!(result.predicted_duration <= cost + 1e-9);
        best = best.min(cost);
    }
    assert!((result.predicted_duration - best).abs() < 1e-9);
    assert_eq!(result.evaluations, 8);
}

#[test]
fn parallel_grid_evaluation_matches_sequential() {
    let profile = sample_profile();
    let sequential = optimizer_for(&profile, "full", 2, 1).optimize(0.0).unwrap();
    let parallel = optimizer_for(&profile, "full", 2, 4).optimize(0.0).unwrap();
    assert!((sequential.predicted_duration - parallel.predicted_duration).abs() < 1e-9);
    assert_eq!(sequential.best_point, parallel.best_point);
    assert_eq!(sequential.evaluations, parallel.evaluations);
}

#[test]
fn smart_enumeration_covers_both_phases() {
    let profile = sample_profile();
    let mut optimizer = optimizer_for(&profile, "smart_full", 2, 1);
    let result = optimizer.optimize(0.0).unwrap();

    assert!(result.best_point.get(Parameter::SortBufferMb).is_some());
    assert!(result.best_point.get(Parameter::ReduceTasks).is_some());
    assert!(result.predicted_duration > 0.0);

    // The winner's stamped configuration reproduces the predicted cost.
    let duration = optimizer_duration_of(&profile, &result.best_configuration);
    assert!((duration - result.predicted_duration).abs() < 1e-9);
}

fn optimizer_duration_of(profile: &JobProfile, config: &Configuration) -> f64 {
    let oracle = Arc::new(ScalingOracle::new(profile.clone()));
    let dataset = Arc::new(StaticDataset::from_profile(profile));
    let mut engine = WhatIfEngine::new(oracle, dataset, TaskScheduler::new(&sample_cluster()));
    engine.predict_duration(config, 0.0, false).unwrap()
}

#[test]
fn randomized_strategies_return_valid_winners() {
    let profile = sample_profile();
    for mode in ["rrs", "smart_rrs"] {
        let mut optimizer = optimizer_for(&profile, mode, 2, 1);
        let result = optimizer.optimize(0.0).unwrap();
        assert!(result.evaluations > 0, "{} spent no evaluations", mode);
        let duration = optimizer_duration_of(&profile, &result.best_configuration);
        assert!(
            (duration - result.predicted_duration).abs() < 1e-9,
            "{} winner does not reproduce its cost",
            mode
        );
        // A seeded strategy is fully deterministic.
        let repeat = optimizer_for(&profile, mode, 2, 1).optimize(0.0).unwrap();
        assert_eq!(result.best_point, repeat.best_point);
        assert_eq!(result.evaluations, repeat.evaluations);
    }
}

#[test]
fn unknown_strategy_is_reported() {
    assert!(search_strategy_resolver("smart_rrs", 2, 123).is_ok());
    assert!(matches!(
        search_strategy_resolver("annealing", 2, 123),
        Err(TunerError::UnknownStrategy(_))
    ));
}

#[test]
fn unparsable_configuration_values_are_errors() {
    let mut config = Configuration::new();
    config.set(Parameter::ReduceTasks.key(), "several");
    assert!(matches!(
        config.get_parsed::<i64>(Parameter::ReduceTasks.key()),
        Err(TunerError::InvalidValue { .. })
    ));
    assert_eq!(config.get_parsed_or("absent.key", 7).unwrap(), 7);

    // Unknown keys pass through stamping untouched.
    config.set("site.custom.flag", "kept");
    let mut point = SpacePoint::new();
    point.set(Parameter::ReduceTasks, ParamValue::Int(4));
    point.apply_to(&mut config);
    assert_eq!(config.get("site.custom.flag"), Some("kept"));
    assert_eq!(config.get(Parameter::ReduceTasks.key()), Some("4"));
}
