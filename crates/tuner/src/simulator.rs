//! Scheduler simulator: reconstructs a synthetic FIFO execution timeline
//! on the cluster's map and reduce slots from aggregate profile data.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use itertools::Itertools;
use log::debug;

use crate::{
    cluster::Cluster,
    config::Configuration,
    error::{Result, TunerError},
    execution::{JobExecution, SyntheticTask, SyntheticTaskKind},
    parameters::Parameter,
    profile::{JobProfile, Phase},
};

/// Latency of the tracker polling interval, applied before each attempt
/// starts and after it ends before its slot is ready again.
pub const HEARTBEAT_DELAY: f64 = 3.0;

/// Duration of the job setup task.
pub const SETUP_TASK_DURATION: f64 = 1.0;

/// Duration of the job cleanup task.
pub const CLEANUP_TASK_DURATION: f64 = 1.0;

/// One execution lane of a tracker with the time it next becomes ready.
#[derive(Clone, Copy, Debug)]
struct Slot {
    ready: f64,
    index: usize,
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ready.total_cmp(&other.ready).then(self.index.cmp(&other.index))
    }
}

/// Priority queue of slots of one kind, earliest-ready first with the slot
/// index as a deterministic tie-break.
#[derive(Clone, Debug)]
struct SlotPool {
    heap: BinaryHeap<Reverse<Slot>>,
    hosts: Vec<String>,
}

impl SlotPool {
    fn new(hosts: Vec<String>) -> Self {
        let heap = hosts
            .iter()
            .enumerate()
            .map(|(index, _)| Reverse(Slot { ready: 0.0, index }))
            .collect();
        SlotPool { heap, hosts }
    }

    fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    fn pop(&mut self) -> Slot {
        self.heap.pop().expect("pool emptiness checked before scheduling").0
    }

    fn push(&mut self, slot: Slot) {
        self.heap.push(Reverse(slot));
    }

    fn host(&self, index: usize) -> &str {
        &self.hosts[index]
    }

    /// Moves the ready time of one specific slot, wherever it sits in the
    /// queue.
    fn occupy(&mut self, index: usize, ready: f64) {
        let mut slots: Vec<Slot> = self.heap.drain().map(|r| r.0).collect();
        for slot in slots.iter_mut() {
            if slot.index == index {
                slot.ready = ready;
            }
        }
        self.heap = slots.into_iter().map(Reverse).collect();
    }

    fn snapshot(&self) -> Vec<Slot> {
        self.heap.iter().map(|r| r.0).collect()
    }

    fn restore(&mut self, snapshot: &[Slot]) {
        self.heap = snapshot.iter().copied().map(Reverse).collect();
    }
}

/// Simulates FIFO scheduling of one job on a slot-limited cluster, without
/// failures or speculative attempts. Slot occupancy survives between calls
/// so consecutive what-if evaluations share one baseline; [checkpoint]
/// (TaskScheduler::checkpoint) captures the baseline and [reset]
/// (TaskScheduler::reset) restores it.
#[derive(Clone, Debug)]
pub struct TaskScheduler {
    map_slots: SlotPool,
    reduce_slots: SlotPool,
    baseline_map: Vec<Slot>,
    baseline_reduce: Vec<Slot>,
}

impl TaskScheduler {
    /// Builds a scheduler over the cluster's flattened tracker list, all
    /// slots ready at time zero.
    pub fn new(cluster: &Cluster) -> Self {
        let mut map_hosts = Vec::new();
        let mut reduce_hosts = Vec::new();
        for tracker in cluster.trackers() {
            for _ in 0..tracker.map_slots {
                map_hosts.push(tracker.name.clone());
            }
            for _ in 0..tracker.reduce_slots {
                reduce_hosts.push(tracker.name.clone());
            }
        }
        let map_slots = SlotPool::new(map_hosts);
        let reduce_slots = SlotPool::new(reduce_hosts);
        let baseline_map = map_slots.snapshot();
        let baseline_reduce = reduce_slots.snapshot();
        TaskScheduler {
            map_slots,
            reduce_slots,
            baseline_map,
            baseline_reduce,
        }
    }

    /// Captures the current slot occupancy as the baseline [reset]
    /// (TaskScheduler::reset) restores.
    pub fn checkpoint(&mut self) {
        self.baseline_map = self.map_slots.snapshot();
        self.baseline_reduce = self.reduce_slots.snapshot();
    }

    /// Restores the slot occupancy captured by the last [checkpoint]
    /// (TaskScheduler::checkpoint), or the construction state.
    pub fn reset(&mut self) {
        self.map_slots.restore(&self.baseline_map);
        self.reduce_slots.restore(&self.baseline_reduce);
    }

    /// Fast mode: predicted running time only, no task objects.
    pub fn fast_schedule(
        &mut self,
        profile: &JobProfile,
        config: &Configuration,
        submission_time: f64,
        ignore_reducers: bool,
    ) -> Result<f64> {
        let (completion, _) = self.simulate(profile, config, submission_time, ignore_reducers, false)?;
        Ok(completion - submission_time)
    }

    /// Detailed mode: the full synthetic execution, with timing identical
    /// to the fast mode.
    pub fn detailed_schedule(
        &mut self,
        profile: &JobProfile,
        config: &Configuration,
        submission_time: f64,
    ) -> Result<JobExecution> {
        let (_, execution) = self.simulate(profile, config, submission_time, false, true)?;
        Ok(execution.expect("detailed mode always records an execution"))
    }

    fn simulate(
        &mut self,
        profile: &JobProfile,
        config: &Configuration,
        submission_time: f64,
        ignore_reducers: bool,
        detailed: bool,
    ) -> Result<(f64, Option<JobExecution>)> {
        if self.map_slots.is_empty() {
            return Err(TunerError::MissingSlots { kind: "map" });
        }
        let mut execution = detailed.then(|| JobExecution {
            submission_time,
            setup_tasks: Vec::new(),
            map_tasks: Vec::new(),
            reduce_tasks: Vec::new(),
            cleanup_tasks: Vec::new(),
        });

        // Setup attempt on the earliest-ready map slot.
        let slot = self.map_slots.pop();
        let setup_start = slot.ready.max(submission_time) + HEARTBEAT_DELAY;
        let setup_end = setup_start + SETUP_TASK_DURATION;
        if let Some(execution) = execution.as_mut() {
            execution.setup_tasks.push(SyntheticTask::new(
                SyntheticTaskKind::Setup,
                self.map_slots.host(slot.index).to_string(),
                setup_start,
                setup_end,
            ));
        }
        self.map_slots.push(Slot {
            ready: setup_end + HEARTBEAT_DELAY,
            index: slot.index,
        });

        // Map kinds largest input first, every instance on the
        // earliest-ready map slot; none start before setup ends.
        let mut map_ends: Vec<f64> = Vec::with_capacity(profile.num_map_tasks() as usize);
        let mut latest = (setup_end, slot.index);
        let kinds = profile
            .map_profiles
            .iter()
            .sorted_by(|a, b| b.avg_input_size().total_cmp(&a.avg_input_size()));
        for kind in kinds {
            let duration: f64 = Phase::MAP_PHASES.iter().map(|phase| kind.phase_time(*phase)).sum();
            for _ in 0..kind.num_tasks {
                let slot = self.map_slots.pop();
                let start = slot.ready.max(setup_end) + HEARTBEAT_DELAY;
                let end = start + duration;
                self.map_slots.push(Slot {
                    ready: end + HEARTBEAT_DELAY,
                    index: slot.index,
                });
                map_ends.push(end);
                if end > latest.0 {
                    latest = (end, slot.index);
                }
                if let Some(execution) = execution.as_mut() {
                    execution.map_tasks.push(SyntheticTask::new(
                        SyntheticTaskKind::Map,
                        self.map_slots.host(slot.index).to_string(),
                        start,
                        end,
                    ));
                }
            }
        }
        let last_map_end = latest.0;

        let num_reduce = profile.num_reduce_tasks();
        if num_reduce == 0 || ignore_reducers {
            // Map-only: cleanup goes on the slot that produced the latest
            // completion; shuffle/sort/reduce contribute nothing.
            let completion = self.run_cleanup(true, latest, execution.as_mut());
            debug!("map-only schedule done at {:.3}", completion);
            return Ok((completion, execution));
        }
        if self.reduce_slots.is_empty() {
            return Err(TunerError::MissingSlots { kind: "reduce" });
        }

        // Reducers may start once enough maps have finished.
        let slowstart_fraction = Parameter::ReduceSlowstartFraction.f64_value(config)?;
        map_ends.sort_by(f64::total_cmp);
        let slowstart_time = if map_ends.is_empty() {
            setup_end
        } else {
            let needed = ((slowstart_fraction * map_ends.len() as f64).ceil() as usize).clamp(1, map_ends.len());
            map_ends[needed - 1]
        };

        let reduce = profile.reduce_profile_required()?;
        let shuffle_time = reduce.phase_time(Phase::Shuffle);
        let sort_time = reduce.phase_time(Phase::Sort);
        let reduce_time = reduce.phase_time(Phase::Reduce) + reduce.phase_time(Phase::Write);
        let num_maps = map_ends.len().max(1) as f64;

        let mut latest_reduce = (setup_end, 0usize);
        for _ in 0..num_reduce {
            let slot = self.reduce_slots.pop();
            let start = slot.ready.max(slowstart_time) + HEARTBEAT_DELAY;
            // A reducer overlapping the map wave finishes shuffling shortly
            // after the last map: only the last map's share remains.
            let shuffle_end = if start < last_map_end {
                last_map_end + shuffle_time / num_maps
            } else {
                start + shuffle_time
            };
            let sort_end = shuffle_end + sort_time;
            let end = sort_end + reduce_time;
            self.reduce_slots.push(Slot {
                ready: end + HEARTBEAT_DELAY,
                index: slot.index,
            });
            if end > latest_reduce.0 {
                latest_reduce = (end, slot.index);
            }
            if let Some(execution) = execution.as_mut() {
                let mut task = SyntheticTask::new(
                    SyntheticTaskKind::Reduce,
                    self.reduce_slots.host(slot.index).to_string(),
                    start,
                    end,
                );
                task.attempt.shuffle_end_time = Some(shuffle_end);
                task.attempt.sort_end_time = Some(sort_end);
                execution.reduce_tasks.push(task);
            }
        }

        let completion = self.run_cleanup(false, latest_reduce, execution.as_mut());
        debug!("schedule done at {:.3}", completion);
        Ok((completion, execution))
    }

    /// Schedules the cleanup task on the specific slot that produced the
    /// job's latest completion and returns the cleanup end time.
    fn run_cleanup(&mut self, on_map_slot: bool, latest: (f64, usize), execution: Option<&mut JobExecution>) -> f64 {
        let (latest_end, slot_index) = latest;
        let pool = if on_map_slot { &mut self.map_slots } else { &mut self.reduce_slots };
        let start = latest_end + 2.0 * HEARTBEAT_DELAY;
        let end = start + CLEANUP_TASK_DURATION;
        pool.occupy(slot_index, end + HEARTBEAT_DELAY);
        if let Some(execution) = execution {
            execution.cleanup_tasks.push(SyntheticTask::new(
                SyntheticTaskKind::Cleanup,
                pool.host(slot_index).to_string(),
                start,
                end,
            ));
        }
        end
    }
}
