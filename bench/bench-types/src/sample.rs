//! Per-step snapshot types consumed by the metrics engine.
//!
//! A [`StepSample`] is assembled by the enclosing task once per simulation
//! step from whatever the physics layer reports: wrist poses and joint state
//! per arm, gripper holding booleans per tracked object, and the active
//! contact-pair set. The engine reads the snapshot; it never writes back.

use std::collections::BTreeMap;

use nalgebra::{DVector, Point3, UnitQuaternion};

use crate::{ArmSide, ContactPair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kinematic state of one arm at one step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArmSample {
    /// End-effector (wrist) position in world coordinates.
    pub position: Point3<f64>,
    /// End-effector (wrist) orientation.
    pub rotation: UnitQuaternion<f64>,
    /// Joint positions for this arm.
    pub joint_positions: DVector<f64>,
    /// Joint velocities for this arm.
    pub joint_velocities: DVector<f64>,
}

impl ArmSample {
    /// Create an arm sample.
    #[must_use]
    pub fn new(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
        joint_positions: DVector<f64>,
        joint_velocities: DVector<f64>,
    ) -> Self {
        Self {
            position,
            rotation,
            joint_positions,
            joint_velocities,
        }
    }

    /// Create a sample at the given position with identity rotation and no
    /// joint state. Useful for tests and cartesian-only tracking.
    #[must_use]
    pub fn at_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
            joint_positions: DVector::zeros(0),
            joint_velocities: DVector::zeros(0),
        }
    }

    /// Euclidean norm of the joint-velocity vector.
    #[must_use]
    pub fn joint_speed(&self) -> f64 {
        self.joint_velocities.norm()
    }
}

/// Snapshot of all evaluation-relevant simulation state at one step.
///
/// # Example
///
/// ```
/// use bench_types::{ArmSample, ArmSide, StepSample};
/// use nalgebra::Point3;
///
/// let sample = StepSample::new(0.05)
///     .with_arm(ArmSide::Right, ArmSample::at_position(Point3::new(0.1, 0.0, 0.9)))
///     .with_held("cube", true);
///
/// assert!(sample.arm(ArmSide::Right).is_some());
/// assert_eq!(sample.held.get("cube"), Some(&true));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepSample {
    /// Elapsed simulated time at this step (seconds).
    pub time: f64,
    /// Per-side arm state.
    pub arms: BTreeMap<ArmSide, ArmSample>,
    /// Tracked-object identity to "currently held" flag.
    pub held: BTreeMap<String, bool>,
    /// Objects whose gripper received an explicit open/release command this
    /// step.
    pub release_commanded: BTreeMap<String, bool>,
    /// Active contact pairs this step, classified by the caller.
    pub contacts: Vec<ContactPair>,
}

impl StepSample {
    /// Create an empty snapshot at the given simulated time.
    #[must_use]
    pub fn new(time: f64) -> Self {
        Self {
            time,
            arms: BTreeMap::new(),
            held: BTreeMap::new(),
            release_commanded: BTreeMap::new(),
            contacts: Vec::new(),
        }
    }

    /// Attach one arm's state.
    #[must_use]
    pub fn with_arm(mut self, side: ArmSide, arm: ArmSample) -> Self {
        self.arms.insert(side, arm);
        self
    }

    /// Set the holding flag for a tracked object.
    #[must_use]
    pub fn with_held(mut self, object: impl Into<String>, held: bool) -> Self {
        self.held.insert(object.into(), held);
        self
    }

    /// Record an explicit release command for a tracked object's gripper.
    #[must_use]
    pub fn with_release_commanded(mut self, object: impl Into<String>) -> Self {
        self.release_commanded.insert(object.into(), true);
        self
    }

    /// Append an active contact pair.
    #[must_use]
    pub fn with_contact(mut self, pair: ContactPair) -> Self {
        self.contacts.push(pair);
        self
    }

    /// Replace the full contact set.
    #[must_use]
    pub fn with_contacts(mut self, contacts: Vec<ContactPair>) -> Self {
        self.contacts = contacts;
        self
    }

    /// Get one arm's state, if present.
    #[must_use]
    pub fn arm(&self, side: ArmSide) -> Option<&ArmSample> {
        self.arms.get(&side)
    }

    /// Whether an explicit release command was issued for this object.
    #[must_use]
    pub fn release_commanded_for(&self, object: &str) -> bool {
        self.release_commanded.get(object).copied().unwrap_or(false)
    }
}
