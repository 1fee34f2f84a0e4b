//! Tracking configuration for the rollout metrics engine.
//!
//! Every metric family is gated by an enable flag. A disabled tracker
//! allocates no state and its fields are entirely absent from the final
//! report; consumers must treat absence as "not tracked", never as zero.

use crate::{ArmLayout, EvalError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default slip sampling window, in control steps.
pub const DEFAULT_SLIP_SAMPLE_WINDOW: usize = 20;

/// Criterion for suppressing a grasp-loss event as a deliberate release.
///
/// The source signal is the caller's per-object `release_commanded` flag; the
/// engine never thresholds raw gripper control values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReleasePolicy {
    /// A holding true→false transition accompanied by an explicit open
    /// command on that gripper is a release, not a slip.
    #[default]
    SuppressCommandedRelease,
    /// Every holding true→false transition counts as a slip.
    CountAllReleases,
}

/// Immutable configuration for one episode's metric tracking.
///
/// # Example
///
/// ```
/// use bench_types::TrackingConfig;
///
/// let config = TrackingConfig::bimanual()
///     .with_control_dt(1.0 / 50.0)
///     .with_cartesian_path_length()
///     .with_collisions();
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackingConfig {
    /// The robot's arm-side layout.
    pub arms: ArmLayout,
    /// Fixed control-step duration (seconds), 1 / control frequency.
    pub control_dt: f64,
    /// Track the running mean of cross-arm velocity difference.
    pub track_vel_sync: bool,
    /// Track the running mean of cross-arm wrist-height difference.
    pub track_vertical_sync: bool,
    /// Track grasp-slip events on `slip_objects`.
    pub track_slippage: bool,
    /// Objects whose holding state is sampled for slip detection.
    pub slip_objects: Vec<String>,
    /// Slip sampling window (control steps between holding comparisons).
    pub slip_sample_window: usize,
    /// What counts as a deliberate release.
    pub release_policy: ReleasePolicy,
    /// Count newly-appearing environment and self contact pairs.
    pub track_collisions: bool,
    /// Accumulate cartesian jerk statistics per arm.
    pub track_cartesian_jerk: bool,
    /// Accumulate joint-space jerk statistics per arm.
    pub track_joint_jerk: bool,
    /// Accumulate cartesian end-effector path length per arm.
    pub track_cartesian_path_length: bool,
    /// Accumulate joint-space path length per arm.
    pub track_joint_path_length: bool,
    /// Accumulate orientation (geodesic) path length per arm.
    pub track_orientation_path_length: bool,
}

impl TrackingConfig {
    /// Create a configuration for the given arm layout with all tracking
    /// disabled and a 50 Hz control rate.
    #[must_use]
    pub fn new(arms: ArmLayout) -> Self {
        Self {
            arms,
            control_dt: 1.0 / 50.0,
            track_vel_sync: false,
            track_vertical_sync: false,
            track_slippage: false,
            slip_objects: Vec::new(),
            slip_sample_window: DEFAULT_SLIP_SAMPLE_WINDOW,
            release_policy: ReleasePolicy::default(),
            track_collisions: false,
            track_cartesian_jerk: false,
            track_joint_jerk: false,
            track_cartesian_path_length: false,
            track_joint_path_length: false,
            track_orientation_path_length: false,
        }
    }

    /// Create a configuration for a bimanual robot.
    #[must_use]
    pub fn bimanual() -> Self {
        Self::new(ArmLayout::Bimanual)
    }

    /// Create a configuration for a single-arm robot.
    #[must_use]
    pub fn single_arm(side: crate::ArmSide) -> Self {
        Self::new(ArmLayout::Single(side))
    }

    /// Set the fixed control-step duration.
    #[must_use]
    pub fn with_control_dt(mut self, dt: f64) -> Self {
        self.control_dt = dt;
        self
    }

    /// Enable cross-arm velocity synchrony tracking (bimanual only).
    #[must_use]
    pub fn with_vel_sync(mut self) -> Self {
        self.track_vel_sync = true;
        self
    }

    /// Enable cross-arm vertical synchrony tracking (bimanual only).
    #[must_use]
    pub fn with_vertical_sync(mut self) -> Self {
        self.track_vertical_sync = true;
        self
    }

    /// Enable slip tracking for the given objects.
    #[must_use]
    pub fn with_slippage(mut self, objects: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.track_slippage = true;
        self.slip_objects = objects.into_iter().map(Into::into).collect();
        self
    }

    /// Set the slip sampling window.
    #[must_use]
    pub fn with_slip_sample_window(mut self, window: usize) -> Self {
        self.slip_sample_window = window;
        self
    }

    /// Set the release-suppression policy.
    #[must_use]
    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.release_policy = policy;
        self
    }

    /// Enable collision counting.
    #[must_use]
    pub fn with_collisions(mut self) -> Self {
        self.track_collisions = true;
        self
    }

    /// Enable cartesian jerk tracking.
    #[must_use]
    pub fn with_cartesian_jerk(mut self) -> Self {
        self.track_cartesian_jerk = true;
        self
    }

    /// Enable joint-space jerk tracking.
    #[must_use]
    pub fn with_joint_jerk(mut self) -> Self {
        self.track_joint_jerk = true;
        self
    }

    /// Enable cartesian path-length tracking.
    #[must_use]
    pub fn with_cartesian_path_length(mut self) -> Self {
        self.track_cartesian_path_length = true;
        self
    }

    /// Enable joint-space path-length tracking.
    #[must_use]
    pub fn with_joint_path_length(mut self) -> Self {
        self.track_joint_path_length = true;
        self
    }

    /// Enable orientation path-length tracking.
    #[must_use]
    pub fn with_orientation_path_length(mut self) -> Self {
        self.track_orientation_path_length = true;
        self
    }

    /// Whether any kinematic accumulator (path length or jerk) is enabled.
    #[must_use]
    pub const fn any_kinematics(&self) -> bool {
        self.track_cartesian_jerk
            || self.track_joint_jerk
            || self.track_cartesian_path_length
            || self.track_joint_path_length
            || self.track_orientation_path_length
    }

    /// Whether any coordination metric is enabled.
    #[must_use]
    pub const fn any_coordination(&self) -> bool {
        self.track_vel_sync || self.track_vertical_sync
    }

    /// Validate the configuration.
    ///
    /// Called by the orchestrator at construction so misconfiguration
    /// surfaces before the first step, not mid-episode.
    pub fn validate(&self) -> Result<()> {
        if !self.control_dt.is_finite() || self.control_dt <= 0.0 {
            return Err(EvalError::invalid_config(format!(
                "control_dt must be positive and finite, got {}",
                self.control_dt
            )));
        }

        if self.any_coordination() && !self.arms.is_bimanual() {
            return Err(EvalError::invalid_config(
                "coordination tracking requires a bimanual arm layout",
            ));
        }

        if self.track_slippage {
            if self.slip_objects.is_empty() {
                return Err(EvalError::invalid_config(
                    "slip tracking enabled with an empty object list",
                ));
            }
            if self.slip_sample_window == 0 {
                return Err(EvalError::invalid_config(
                    "slip_sample_window must be at least 1",
                ));
            }
            let mut seen = std::collections::BTreeSet::new();
            for object in &self.slip_objects {
                if !seen.insert(object.as_str()) {
                    return Err(EvalError::invalid_config(format!(
                        "duplicate slip object '{object}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Control frequency in Hz.
    #[must_use]
    pub fn control_frequency(&self) -> f64 {
        1.0 / self.control_dt
    }
}
