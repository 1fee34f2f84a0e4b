//! The per-episode metrics report.
//!
//! A [`MetricsReport`] is produced exactly once per episode by the rollout
//! orchestrator. `success`, `completion_time`, and `subtask_progress` are
//! always present; every other metric is an `Option` populated only when the
//! corresponding tracking flag was enabled *and* the episode produced at
//! least one sample. Serialization skips `None` fields, so consumers see
//! absent keys for untracked metrics rather than sentinel zeros.

use std::collections::BTreeMap;

use crate::{ArmLayout, ArmSide};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A per-arm metric whose report shape depends on the robot's arity.
///
/// Single-arm robots report a bare scalar; bimanual robots report a
/// two-key map. Serialization is untagged, so the variant tag never appears
/// on the wire:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// use bench_types::ArmMetric;
///
/// let single = serde_json::to_string(&ArmMetric::Single(0.3)).unwrap();
/// assert_eq!(single, "0.3");
///
/// let both = serde_json::to_string(&ArmMetric::Bimanual { left: 0.1, right: 0.2 }).unwrap();
/// assert_eq!(both, r#"{"left":0.1,"right":0.2}"#);
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ArmMetric {
    /// Value for a single-arm robot.
    Single(f64),
    /// Per-side values for a bimanual robot.
    Bimanual {
        /// Left-arm value.
        left: f64,
        /// Right-arm value.
        right: f64,
    },
}

impl ArmMetric {
    /// Build from per-side values for the given layout.
    ///
    /// Returns `None` if a side required by the layout is missing from
    /// `values`.
    #[must_use]
    pub fn from_values(layout: ArmLayout, values: &BTreeMap<ArmSide, f64>) -> Option<Self> {
        match layout {
            ArmLayout::Single(side) => values.get(&side).map(|v| Self::Single(*v)),
            ArmLayout::Bimanual => {
                let left = *values.get(&ArmSide::Left)?;
                let right = *values.get(&ArmSide::Right)?;
                Some(Self::Bimanual { left, right })
            }
        }
    }

    /// Get the value for one side. For `Single`, returns the value
    /// regardless of side.
    #[must_use]
    pub const fn get(&self, side: ArmSide) -> f64 {
        match self {
            Self::Single(v) => *v,
            Self::Bimanual { left, right } => match side {
                ArmSide::Left => *left,
                ArmSide::Right => *right,
            },
        }
    }

    /// Sum across sides.
    #[must_use]
    pub fn total(&self) -> f64 {
        match self {
            Self::Single(v) => *v,
            Self::Bimanual { left, right } => left + right,
        }
    }

    /// Mean across sides.
    #[must_use]
    pub fn mean(&self) -> f64 {
        match self {
            Self::Single(v) => *v,
            Self::Bimanual { left, right } => (left + right) / 2.0,
        }
    }
}

/// A caller-supplied distance/error value: a bare scalar or a named map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ErrorMetric {
    /// A single scalar value.
    Scalar(f64),
    /// Named scalar values (e.g. one per target object).
    Named(BTreeMap<String, f64>),
}

impl From<f64> for ErrorMetric {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<BTreeMap<String, f64>> for ErrorMetric {
    fn from(values: BTreeMap<String, f64>) -> Self {
        Self::Named(values)
    }
}

/// Immutable per-episode evaluation report.
///
/// Field presence is decided entirely by the `TrackingConfig` the episode
/// was initialized with; consumers must treat absent fields as "not
/// tracked", never as zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricsReport {
    /// Task success as 0.0 / 1.0.
    pub success: f64,
    /// Elapsed simulated time from init to finalize (seconds).
    pub completion_time: f64,
    /// Reached stages divided by the highest registered stage index; 0.0
    /// when no stage was registered.
    pub subtask_progress: f64,

    /// Running mean of cross-arm velocity difference (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub vel_sync_error: Option<f64>,
    /// Running mean of cross-arm wrist-height difference (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub vertical_sync_error: Option<f64>,

    /// Total grasp-slip events across all tracked objects.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub slip_count: Option<u32>,
    /// Grasp-slip events per tracked object.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub object_slip_counts: Option<BTreeMap<String, u32>>,

    /// Newly-appearing robot-environment contact pairs.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub env_collision_count: Option<u32>,
    /// Newly-appearing robot-robot contact pairs.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub self_collision_count: Option<u32>,

    /// Cartesian end-effector path length per arm (meters).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cartesian_path_length: Option<ArmMetric>,
    /// Sum of per-arm cartesian path lengths (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub total_cartesian_path_length: Option<f64>,
    /// Mean of per-arm cartesian path lengths (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub avg_cartesian_path_length: Option<f64>,

    /// Joint-space path length per arm (radians).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub joint_path_length: Option<ArmMetric>,
    /// Sum of per-arm joint path lengths (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub total_joint_path_length: Option<f64>,
    /// Mean of per-arm joint path lengths (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub avg_joint_path_length: Option<f64>,

    /// Orientation (geodesic) path length per arm (radians).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub orientation_path_length: Option<ArmMetric>,
    /// Sum of per-arm orientation path lengths (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub total_orientation_path_length: Option<f64>,
    /// Mean of per-arm orientation path lengths (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub avg_orientation_path_length: Option<f64>,

    /// Running mean of |cartesian jerk| per arm.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cartesian_jerk_avg: Option<ArmMetric>,
    /// Running RMS of cartesian jerk per arm.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cartesian_jerk_rms: Option<ArmMetric>,
    /// Mean of per-arm cartesian jerk averages (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub overall_cartesian_jerk_avg: Option<f64>,
    /// Mean of per-arm cartesian jerk RMS values (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub overall_cartesian_jerk_rms: Option<f64>,

    /// Running mean of |joint jerk| per arm.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub joint_jerk_avg: Option<ArmMetric>,
    /// Running RMS of joint jerk per arm.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub joint_jerk_rms: Option<ArmMetric>,
    /// Mean of per-arm joint jerk averages (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub overall_joint_jerk_avg: Option<f64>,
    /// Mean of per-arm joint jerk RMS values (bimanual only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub overall_joint_jerk_rms: Option<f64>,

    /// Caller-supplied distance to target at episode end.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub target_distance: Option<ErrorMetric>,
    /// Caller-supplied pose error at episode end.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub pose_error: Option<ErrorMetric>,
}

impl MetricsReport {
    /// Create a report with only the always-present fields set.
    #[must_use]
    pub fn new(success: bool, completion_time: f64, subtask_progress: f64) -> Self {
        Self {
            success: if success { 1.0 } else { 0.0 },
            completion_time,
            subtask_progress,
            vel_sync_error: None,
            vertical_sync_error: None,
            slip_count: None,
            object_slip_counts: None,
            env_collision_count: None,
            self_collision_count: None,
            cartesian_path_length: None,
            total_cartesian_path_length: None,
            avg_cartesian_path_length: None,
            joint_path_length: None,
            total_joint_path_length: None,
            avg_joint_path_length: None,
            orientation_path_length: None,
            total_orientation_path_length: None,
            avg_orientation_path_length: None,
            cartesian_jerk_avg: None,
            cartesian_jerk_rms: None,
            overall_cartesian_jerk_avg: None,
            overall_cartesian_jerk_rms: None,
            joint_jerk_avg: None,
            joint_jerk_rms: None,
            overall_joint_jerk_avg: None,
            overall_joint_jerk_rms: None,
            target_distance: None,
            pose_error: None,
        }
    }

    /// Whether the episode succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success >= 0.5
    }

    /// Short human-readable summary line for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "success={} time={:.3}s progress={:.2}",
            self.success, self.completion_time, self.subtask_progress
        );
        if let Some(count) = self.slip_count {
            line.push_str(&format!(" slips={count}"));
        }
        if let (Some(env), Some(own)) = (self.env_collision_count, self.self_collision_count) {
            line.push_str(&format!(" collisions={env}env/{own}self"));
        }
        if let Some(path) = &self.cartesian_path_length {
            line.push_str(&format!(" path={:.3}m", path.total()));
        }
        line
    }
}
