//! The per-episode rollout metrics orchestrator.
//!
//! [`RolloutMetrics`] owns one instance of each enabled tracker for the
//! lifetime of one episode and binds them to the task lifecycle:
//!
//! - `init` at environment construction and at every reset (prior state is
//!   discarded; episodes never share accumulator state),
//! - `step` once per simulation step,
//! - `mark_stage` whenever a task milestone predicate fires,
//! - `finalize` when the episode's success predicate is evaluated.

use bench_types::{
    ArmMetric, ArmSide, ErrorMetric, EvalError, MetricsReport, Result, StepSample, TrackingConfig,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    CollisionTracker, CoordinationTracker, KinematicAccumulator, SlipDetector, StageTracker,
};

/// Lifecycle state of a [`RolloutMetrics`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutState {
    /// Constructed but not yet bound to an episode.
    Uninitialized,
    /// Accepting step and stage calls.
    Active,
    /// Report produced; only repeated finalize reads are allowed.
    Finalized,
}

impl RolloutState {
    /// Lowercase name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for RolloutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-episode metrics engine.
///
/// # Example
///
/// ```
/// use bench_metrics::RolloutMetrics;
/// use bench_types::{ArmSample, ArmSide, StepSample, TrackingConfig};
/// use nalgebra::Point3;
///
/// let config = TrackingConfig::bimanual()
///     .with_control_dt(0.02)
///     .with_cartesian_path_length();
/// let mut metrics = RolloutMetrics::new(config).unwrap();
///
/// metrics.init(0.0);
/// let sample = StepSample::new(0.02)
///     .with_arm(ArmSide::Left, ArmSample::at_position(Point3::origin()))
///     .with_arm(ArmSide::Right, ArmSample::at_position(Point3::new(0.1, 0.0, 0.0)));
/// metrics.step(&sample).unwrap();
///
/// let report = metrics.finalize(true, None, None).unwrap();
/// assert_eq!(report.success, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct RolloutMetrics {
    config: TrackingConfig,
    state: RolloutState,
    start_time: f64,
    last_time: f64,
    stages: StageTracker,
    slip: Option<SlipDetector>,
    collisions: Option<CollisionTracker>,
    kinematics: Option<KinematicAccumulator>,
    coordination: Option<CoordinationTracker>,
    report: Option<MetricsReport>,
}

impl RolloutMetrics {
    /// Create an engine for the given configuration.
    ///
    /// Configuration errors surface here, before the first episode starts.
    pub fn new(config: TrackingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: RolloutState::Uninitialized,
            start_time: 0.0,
            last_time: 0.0,
            stages: StageTracker::new(),
            slip: None,
            collisions: None,
            kinematics: None,
            coordination: None,
            report: None,
        })
    }

    /// Begin an episode at the given simulated time.
    ///
    /// Callable from any state; all prior accumulator state is discarded.
    pub fn init(&mut self, time: f64) {
        debug!(time, state = %self.state, "rollout metrics init");
        self.start_time = time;
        self.last_time = time;
        self.stages = StageTracker::new();
        self.slip = self.config.track_slippage.then(|| {
            SlipDetector::new(
                self.config.slip_objects.iter().cloned(),
                self.config.slip_sample_window,
                self.config.release_policy,
            )
        });
        self.collisions = self.config.track_collisions.then(CollisionTracker::new);
        self.kinematics = self
            .config
            .any_kinematics()
            .then(|| KinematicAccumulator::new(&self.config));
        self.coordination = self
            .config
            .any_coordination()
            .then(CoordinationTracker::new);
        self.report = None;
        self.state = RolloutState::Active;
    }

    /// Process one step's snapshot.
    pub fn step(&mut self, sample: &StepSample) -> Result<()> {
        if self.state != RolloutState::Active {
            return Err(EvalError::lifecycle("step", self.state.as_str()));
        }

        if self.kinematics.is_some() || self.coordination.is_some() {
            for side in self.config.arms.sides() {
                let arm = sample
                    .arm(*side)
                    .ok_or(EvalError::MissingArm { side: *side })?;
                if let Some(kinematics) = &mut self.kinematics {
                    kinematics.sample_arm(*side, arm);
                }
            }
            if let Some(coordination) = &mut self.coordination {
                // Arm presence was checked above; bimanual layout guaranteed
                // by config validation.
                let left = sample
                    .arm(ArmSide::Left)
                    .ok_or(EvalError::MissingArm {
                        side: ArmSide::Left,
                    })?;
                let right = sample
                    .arm(ArmSide::Right)
                    .ok_or(EvalError::MissingArm {
                        side: ArmSide::Right,
                    })?;
                coordination.sample(
                    left.joint_speed(),
                    right.joint_speed(),
                    left.position.z,
                    right.position.z,
                );
            }
        }

        if let Some(slip) = &mut self.slip {
            slip.sample(&sample.held, &sample.release_commanded)?;
        }

        if let Some(collisions) = &mut self.collisions {
            collisions.update(&sample.contacts);
        }

        self.last_time = sample.time;
        Ok(())
    }

    /// Record a stage milestone.
    pub fn mark_stage(&mut self, stage_index: u32, reached: bool) -> Result<()> {
        if self.state != RolloutState::Active {
            return Err(EvalError::lifecycle("mark_stage", self.state.as_str()));
        }
        self.stages.mark(stage_index, reached);
        Ok(())
    }

    /// Produce the episode report.
    ///
    /// Valid in `Active` (assembles and caches the report) and in
    /// `Finalized` (returns the cached report unchanged; arguments of the
    /// repeat call are ignored). The call is a pure read of accumulator
    /// state, never a reset.
    pub fn finalize(
        &mut self,
        success: bool,
        target_distance: Option<ErrorMetric>,
        pose_error: Option<ErrorMetric>,
    ) -> Result<MetricsReport> {
        match self.state {
            RolloutState::Uninitialized => {
                Err(EvalError::lifecycle("finalize", self.state.as_str()))
            }
            RolloutState::Finalized => match &self.report {
                Some(report) => {
                    debug!("repeated finalize, returning cached report");
                    Ok(report.clone())
                }
                None => Err(EvalError::lifecycle("finalize", self.state.as_str())),
            },
            RolloutState::Active => {
                let report = self.assemble(success, target_distance, pose_error);
                debug!(summary = %report.summary(), "rollout finalized");
                self.report = Some(report.clone());
                self.state = RolloutState::Finalized;
                Ok(report)
            }
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RolloutState {
        self.state
    }

    /// The configuration this engine was built with.
    #[must_use]
    pub const fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Current stage progress (mid-episode read).
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.stages.progress()
    }

    /// Elapsed simulated time since init.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.last_time - self.start_time
    }

    fn assemble(
        &self,
        success: bool,
        target_distance: Option<ErrorMetric>,
        pose_error: Option<ErrorMetric>,
    ) -> MetricsReport {
        let mut report = MetricsReport::new(success, self.elapsed(), self.stages.progress());
        let layout = self.config.arms;
        let bimanual = layout.is_bimanual();

        if let Some(coordination) = &self.coordination {
            if coordination.has_samples() {
                if self.config.track_vel_sync {
                    report.vel_sync_error = Some(coordination.vel_sync_error());
                }
                if self.config.track_vertical_sync {
                    report.vertical_sync_error = Some(coordination.vertical_sync_error());
                }
            }
        }

        if let Some(slip) = &self.slip {
            report.slip_count = Some(slip.slip_count());
            report.object_slip_counts = Some(slip.object_slips());
        }

        if let Some(collisions) = &self.collisions {
            report.env_collision_count = Some(collisions.env_count());
            report.self_collision_count = Some(collisions.self_count());
        }

        if let Some(kinematics) = &self.kinematics {
            if kinematics.has_samples() {
                let aggregate = |values: &BTreeMap<ArmSide, f64>| {
                    let metric = ArmMetric::from_values(layout, values);
                    let total = bimanual.then(|| metric.as_ref().map_or(0.0, ArmMetric::total));
                    let avg = bimanual.then(|| metric.as_ref().map_or(0.0, ArmMetric::mean));
                    (metric, total, avg)
                };

                if self.config.track_cartesian_path_length {
                    let (metric, total, avg) = aggregate(&kinematics.cartesian_path_lengths());
                    report.cartesian_path_length = metric;
                    report.total_cartesian_path_length = total;
                    report.avg_cartesian_path_length = avg;
                }
                if self.config.track_joint_path_length {
                    let (metric, total, avg) = aggregate(&kinematics.joint_path_lengths());
                    report.joint_path_length = metric;
                    report.total_joint_path_length = total;
                    report.avg_joint_path_length = avg;
                }
                if self.config.track_orientation_path_length {
                    let (metric, total, avg) = aggregate(&kinematics.orientation_path_lengths());
                    report.orientation_path_length = metric;
                    report.total_orientation_path_length = total;
                    report.avg_orientation_path_length = avg;
                }
                if self.config.track_cartesian_jerk {
                    let (metric, _, avg) = aggregate(&kinematics.cartesian_jerk_avg());
                    report.cartesian_jerk_avg = metric;
                    report.overall_cartesian_jerk_avg = avg;
                    let (metric, _, avg) = aggregate(&kinematics.cartesian_jerk_rms());
                    report.cartesian_jerk_rms = metric;
                    report.overall_cartesian_jerk_rms = avg;
                }
                if self.config.track_joint_jerk {
                    let (metric, _, avg) = aggregate(&kinematics.joint_jerk_avg());
                    report.joint_jerk_avg = metric;
                    report.overall_joint_jerk_avg = avg;
                    let (metric, _, avg) = aggregate(&kinematics.joint_jerk_rms());
                    report.joint_jerk_rms = metric;
                    report.overall_joint_jerk_rms = avg;
                }
            }
        }

        report.target_distance = target_distance;
        report.pose_error = pose_error;
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bench_types::ArmSample;
    use nalgebra::Point3;

    fn both_arms(time: f64, left: Point3<f64>, right: Point3<f64>) -> StepSample {
        StepSample::new(time)
            .with_arm(ArmSide::Left, ArmSample::at_position(left))
            .with_arm(ArmSide::Right, ArmSample::at_position(right))
    }

    #[test]
    fn test_step_before_init_fails() {
        let mut metrics = RolloutMetrics::new(TrackingConfig::bimanual()).unwrap();
        let err = metrics.step(&StepSample::new(0.0)).unwrap_err();
        assert!(err.is_lifecycle());
        assert_eq!(metrics.state(), RolloutState::Uninitialized);
    }

    #[test]
    fn test_finalize_before_init_fails() {
        let mut metrics = RolloutMetrics::new(TrackingConfig::bimanual()).unwrap();
        assert!(metrics.finalize(true, None, None).unwrap_err().is_lifecycle());
    }

    #[test]
    fn test_step_after_finalize_fails() {
        let mut metrics = RolloutMetrics::new(TrackingConfig::bimanual()).unwrap();
        metrics.init(0.0);
        metrics.finalize(false, None, None).unwrap();

        let err = metrics.step(&StepSample::new(0.1)).unwrap_err();
        assert!(err.is_lifecycle());
        assert!(err.to_string().contains("finalized"));

        assert!(metrics.mark_stage(1, true).unwrap_err().is_lifecycle());
    }

    #[test]
    fn test_config_error_at_construction() {
        let config = TrackingConfig::bimanual().with_slippage(Vec::<String>::new());
        assert!(RolloutMetrics::new(config).unwrap_err().is_config_error());
    }

    #[test]
    fn test_zero_step_episode() {
        let config = TrackingConfig::bimanual()
            .with_cartesian_path_length()
            .with_vel_sync()
            .with_cartesian_jerk();
        let mut metrics = RolloutMetrics::new(config).unwrap();
        metrics.init(3.0);

        let report = metrics.finalize(false, None, None).unwrap();
        assert_eq!(report.success, 0.0);
        assert_eq!(report.completion_time, 0.0);
        assert_eq!(report.subtask_progress, 0.0);
        // No samples: kinematic and coordination fields absent, not zero
        assert!(report.cartesian_path_length.is_none());
        assert!(report.cartesian_jerk_avg.is_none());
        assert!(report.vel_sync_error.is_none());
    }

    #[test]
    fn test_completion_time_is_simulated_elapsed() {
        let mut metrics = RolloutMetrics::new(TrackingConfig::bimanual()).unwrap();
        metrics.init(10.0);
        metrics.step(&StepSample::new(10.5)).unwrap();
        metrics.step(&StepSample::new(11.0)).unwrap();

        let report = metrics.finalize(true, None, None).unwrap();
        assert_relative_eq!(report.completion_time, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reinit_discards_state() {
        let config = TrackingConfig::bimanual().with_cartesian_path_length();
        let mut metrics = RolloutMetrics::new(config).unwrap();

        metrics.init(0.0);
        metrics
            .step(&both_arms(0.1, Point3::origin(), Point3::new(1.0, 0.0, 0.0)))
            .unwrap();
        metrics
            .step(&both_arms(0.2, Point3::origin(), Point3::new(2.0, 0.0, 0.0)))
            .unwrap();
        metrics.mark_stage(1, true).unwrap();

        // Reset mid-episode
        metrics.init(5.0);
        metrics
            .step(&both_arms(5.1, Point3::origin(), Point3::origin()))
            .unwrap();

        let report = metrics.finalize(false, None, None).unwrap();
        assert_eq!(report.subtask_progress, 0.0);
        assert_eq!(
            report.cartesian_path_length,
            Some(ArmMetric::Bimanual {
                left: 0.0,
                right: 0.0
            })
        );
        assert_relative_eq!(report.completion_time, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_arm_is_data_shape_error() {
        let config = TrackingConfig::bimanual().with_cartesian_path_length();
        let mut metrics = RolloutMetrics::new(config).unwrap();
        metrics.init(0.0);

        let sample = StepSample::new(0.1)
            .with_arm(ArmSide::Left, ArmSample::at_position(Point3::origin()));
        let err = metrics.step(&sample).unwrap_err();
        assert!(err.is_data_shape_error());
        assert!(err.to_string().contains("right"));
    }

    #[test]
    fn test_finalize_is_idempotent_read() {
        let config = TrackingConfig::bimanual()
            .with_cartesian_path_length()
            .with_collisions();
        let mut metrics = RolloutMetrics::new(config).unwrap();
        metrics.init(0.0);
        metrics
            .step(&both_arms(0.1, Point3::origin(), Point3::new(0.5, 0.0, 0.0)))
            .unwrap();

        let first = metrics.finalize(true, Some(0.05.into()), None).unwrap();
        // Repeat finalize ignores its arguments and returns the cached report
        let second = metrics.finalize(false, None, Some(9.9.into())).unwrap();
        assert_eq!(first, second);
        assert_eq!(metrics.state(), RolloutState::Finalized);
    }

    #[test]
    fn test_stage_progress_flows_into_report() {
        let mut metrics = RolloutMetrics::new(TrackingConfig::bimanual()).unwrap();
        metrics.init(0.0);
        metrics.mark_stage(1, true).unwrap();
        metrics.mark_stage(2, false).unwrap();

        assert_relative_eq!(metrics.progress(), 0.5, epsilon = 1e-12);
        let report = metrics.finalize(false, None, None).unwrap();
        assert_relative_eq!(report.subtask_progress, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_caller_supplied_fields() {
        let mut metrics = RolloutMetrics::new(TrackingConfig::bimanual()).unwrap();
        metrics.init(0.0);

        let mut named = BTreeMap::new();
        named.insert("cube".to_string(), 0.02);
        let report = metrics
            .finalize(true, Some(0.05.into()), Some(ErrorMetric::Named(named)))
            .unwrap();

        assert_eq!(report.target_distance, Some(ErrorMetric::Scalar(0.05)));
        assert!(matches!(report.pose_error, Some(ErrorMetric::Named(_))));
    }
}
