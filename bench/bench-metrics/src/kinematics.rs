//! Per-arm path-length and jerk accumulation.
//!
//! Path lengths are summed pairwise between consecutive samples; jerk is
//! estimated from a 4-sample sliding window by repeated backward
//! differences (velocity from positions, acceleration from velocities, jerk
//! from accelerations). The control period `dt` is fixed; variable
//! timesteps are not supported.

use std::collections::{BTreeMap, VecDeque};

use bench_types::{ArmSample, ArmSide, TrackingConfig};
use nalgebra::{DVector, Vector3};

/// Samples needed before one jerk value can be produced.
const JERK_WINDOW: usize = 4;

/// Running mean-of-|jerk| and RMS-of-jerk statistics.
#[derive(Debug, Clone, Copy, Default)]
struct JerkStats {
    count: u64,
    abs_sum: f64,
    sq_sum: f64,
}

impl JerkStats {
    fn push(&mut self, magnitude: f64) {
        self.count += 1;
        self.abs_sum += magnitude;
        self.sq_sum += magnitude * magnitude;
    }

    fn mean_abs(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.abs_sum / self.count as f64
        }
    }

    fn rms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.sq_sum / self.count as f64).sqrt()
        }
    }
}

/// Accumulated state for one arm.
#[derive(Debug, Clone, Default)]
struct ArmAccum {
    samples: usize,
    prev_position: Option<Vector3<f64>>,
    prev_joints: Option<DVector<f64>>,
    prev_rotation: Option<nalgebra::UnitQuaternion<f64>>,
    cartesian_path: f64,
    joint_path: f64,
    orientation_path: f64,
    position_window: VecDeque<Vector3<f64>>,
    joint_window: VecDeque<DVector<f64>>,
    cartesian_jerk: JerkStats,
    joint_jerk: JerkStats,
}

/// Third backward difference over a window of four samples, divided by
/// `dt³`. Returns the jerk vector's magnitude.
fn jerk_magnitude(window: &VecDeque<Vector3<f64>>, dt: f64) -> f64 {
    debug_assert_eq!(window.len(), JERK_WINDOW);
    let v1 = (window[1] - window[0]) / dt;
    let v2 = (window[2] - window[1]) / dt;
    let v3 = (window[3] - window[2]) / dt;
    let a1 = (v2 - v1) / dt;
    let a2 = (v3 - v2) / dt;
    ((a2 - a1) / dt).norm()
}

/// Same as [`jerk_magnitude`] over joint-space vectors.
fn joint_jerk_magnitude(window: &VecDeque<DVector<f64>>, dt: f64) -> f64 {
    debug_assert_eq!(window.len(), JERK_WINDOW);
    let v1 = (&window[1] - &window[0]) / dt;
    let v2 = (&window[2] - &window[1]) / dt;
    let v3 = (&window[3] - &window[2]) / dt;
    let a1 = (&v2 - &v1) / dt;
    let a2 = (&v3 - &v2) / dt;
    ((a2 - a1) / dt).norm()
}

/// Per-arm running path-length and jerk statistics.
///
/// Allocated only when at least one kinematic flag is enabled; each
/// sub-metric is accumulated only when its own flag is set.
#[derive(Debug, Clone)]
pub struct KinematicAccumulator {
    dt: f64,
    track_cartesian_path: bool,
    track_joint_path: bool,
    track_orientation_path: bool,
    track_cartesian_jerk: bool,
    track_joint_jerk: bool,
    arms: BTreeMap<ArmSide, ArmAccum>,
}

impl KinematicAccumulator {
    /// Create an accumulator for the config's tracked sides and flags.
    #[must_use]
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            dt: config.control_dt,
            track_cartesian_path: config.track_cartesian_path_length,
            track_joint_path: config.track_joint_path_length,
            track_orientation_path: config.track_orientation_path_length,
            track_cartesian_jerk: config.track_cartesian_jerk,
            track_joint_jerk: config.track_joint_jerk,
            arms: config
                .arms
                .sides()
                .iter()
                .map(|side| (*side, ArmAccum::default()))
                .collect(),
        }
    }

    /// Feed one arm's state for the current step.
    pub fn sample_arm(&mut self, side: ArmSide, arm: &ArmSample) {
        let Some(accum) = self.arms.get_mut(&side) else {
            return;
        };
        accum.samples += 1;

        let position = arm.position.coords;

        if self.track_cartesian_path {
            if let Some(prev) = accum.prev_position {
                accum.cartesian_path += (position - prev).norm();
            }
            accum.prev_position = Some(position);
        }

        if self.track_orientation_path {
            if let Some(prev) = accum.prev_rotation {
                accum.orientation_path += prev.angle_to(&arm.rotation);
            }
            accum.prev_rotation = Some(arm.rotation);
        }

        if self.track_joint_path {
            match &accum.prev_joints {
                Some(prev) if prev.len() == arm.joint_positions.len() => {
                    accum.joint_path += (&arm.joint_positions - prev).norm();
                }
                _ => {}
            }
            accum.prev_joints = Some(arm.joint_positions.clone());
        }

        if self.track_cartesian_jerk {
            accum.position_window.push_back(position);
            if accum.position_window.len() > JERK_WINDOW {
                accum.position_window.pop_front();
            }
            if accum.position_window.len() == JERK_WINDOW {
                accum
                    .cartesian_jerk
                    .push(jerk_magnitude(&accum.position_window, self.dt));
            }
        }

        if self.track_joint_jerk {
            // Joint dimension is fixed per robot; a resize resets the window
            if accum
                .joint_window
                .back()
                .is_some_and(|prev| prev.len() != arm.joint_positions.len())
            {
                accum.joint_window.clear();
            }
            accum.joint_window.push_back(arm.joint_positions.clone());
            if accum.joint_window.len() > JERK_WINDOW {
                accum.joint_window.pop_front();
            }
            if accum.joint_window.len() == JERK_WINDOW {
                accum
                    .joint_jerk
                    .push(joint_jerk_magnitude(&accum.joint_window, self.dt));
            }
        }
    }

    /// Number of samples fed for the given side.
    #[must_use]
    pub fn sample_count(&self, side: ArmSide) -> usize {
        self.arms.get(&side).map_or(0, |a| a.samples)
    }

    /// Whether any side has received at least one sample.
    #[must_use]
    pub fn has_samples(&self) -> bool {
        self.arms.values().any(|a| a.samples > 0)
    }

    /// Accumulated cartesian path length per side.
    #[must_use]
    pub fn cartesian_path_lengths(&self) -> BTreeMap<ArmSide, f64> {
        self.per_side(|a| a.cartesian_path)
    }

    /// Accumulated joint-space path length per side.
    #[must_use]
    pub fn joint_path_lengths(&self) -> BTreeMap<ArmSide, f64> {
        self.per_side(|a| a.joint_path)
    }

    /// Accumulated orientation path length per side.
    #[must_use]
    pub fn orientation_path_lengths(&self) -> BTreeMap<ArmSide, f64> {
        self.per_side(|a| a.orientation_path)
    }

    /// Running mean of |cartesian jerk| per side.
    #[must_use]
    pub fn cartesian_jerk_avg(&self) -> BTreeMap<ArmSide, f64> {
        self.per_side(|a| a.cartesian_jerk.mean_abs())
    }

    /// Running RMS of cartesian jerk per side.
    #[must_use]
    pub fn cartesian_jerk_rms(&self) -> BTreeMap<ArmSide, f64> {
        self.per_side(|a| a.cartesian_jerk.rms())
    }

    /// Running mean of |joint jerk| per side.
    #[must_use]
    pub fn joint_jerk_avg(&self) -> BTreeMap<ArmSide, f64> {
        self.per_side(|a| a.joint_jerk.mean_abs())
    }

    /// Running RMS of joint jerk per side.
    #[must_use]
    pub fn joint_jerk_rms(&self) -> BTreeMap<ArmSide, f64> {
        self.per_side(|a| a.joint_jerk.rms())
    }

    fn per_side(&self, value: impl Fn(&ArmAccum) -> f64) -> BTreeMap<ArmSide, f64> {
        self.arms
            .iter()
            .map(|(side, accum)| (*side, value(accum)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bench_types::ArmLayout;
    use nalgebra::{Point3, UnitQuaternion};

    fn config_all() -> TrackingConfig {
        TrackingConfig::bimanual()
            .with_control_dt(0.1)
            .with_cartesian_path_length()
            .with_joint_path_length()
            .with_orientation_path_length()
            .with_cartesian_jerk()
            .with_joint_jerk()
    }

    fn arm_at(x: f64, y: f64, z: f64) -> ArmSample {
        ArmSample::at_position(Point3::new(x, y, z))
    }

    #[test]
    fn test_straight_line_path_length() {
        let mut accum = KinematicAccumulator::new(&config_all());

        // N straight-line increments of d each
        let n = 10;
        let d = 0.05;
        for i in 0..=n {
            accum.sample_arm(ArmSide::Right, &arm_at(d * f64::from(i), 0.0, 0.0));
        }

        let paths = accum.cartesian_path_lengths();
        assert_relative_eq!(paths[&ArmSide::Right], f64::from(n) * d, epsilon = 1e-12);
        // Left arm never sampled
        assert_eq!(paths[&ArmSide::Left], 0.0);
    }

    #[test]
    fn test_first_sample_contributes_zero() {
        let mut accum = KinematicAccumulator::new(&config_all());
        accum.sample_arm(ArmSide::Left, &arm_at(5.0, 5.0, 5.0));
        assert_eq!(accum.cartesian_path_lengths()[&ArmSide::Left], 0.0);
        assert_eq!(accum.sample_count(ArmSide::Left), 1);
    }

    #[test]
    fn test_joint_path_length() {
        let mut accum = KinematicAccumulator::new(&config_all());

        let mut arm = arm_at(0.0, 0.0, 0.0);
        arm.joint_positions = DVector::from_vec(vec![0.0, 0.0]);
        accum.sample_arm(ArmSide::Left, &arm);

        arm.joint_positions = DVector::from_vec(vec![3.0, 4.0]);
        accum.sample_arm(ArmSide::Left, &arm);

        assert_relative_eq!(
            accum.joint_path_lengths()[&ArmSide::Left],
            5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_orientation_path_length() {
        let mut accum = KinematicAccumulator::new(&config_all());

        let mut arm = arm_at(0.0, 0.0, 0.0);
        arm.rotation = UnitQuaternion::identity();
        accum.sample_arm(ArmSide::Left, &arm);

        // Rotate 90 degrees about Z in two 45-degree increments
        for step in 1..=2 {
            arm.rotation = UnitQuaternion::from_euler_angles(
                0.0,
                0.0,
                f64::from(step) * std::f64::consts::FRAC_PI_4,
            );
            accum.sample_arm(ArmSide::Left, &arm);
        }

        assert_relative_eq!(
            accum.orientation_path_lengths()[&ArmSide::Left],
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_constant_velocity_has_zero_jerk() {
        let mut accum = KinematicAccumulator::new(&config_all());

        for i in 0..10 {
            accum.sample_arm(ArmSide::Right, &arm_at(0.1 * f64::from(i), 0.0, 0.0));
        }

        assert_relative_eq!(
            accum.cartesian_jerk_avg()[&ArmSide::Right],
            0.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            accum.cartesian_jerk_rms()[&ArmSide::Right],
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_known_jerk_value() {
        let dt = 0.1;
        let mut accum = KinematicAccumulator::new(&config_all());

        // x(t) = t^3 has constant third derivative 6
        for i in 0..JERK_WINDOW {
            let t = dt * i as f64;
            accum.sample_arm(ArmSide::Left, &arm_at(t * t * t, 0.0, 0.0));
        }

        // Exactly one jerk value from the first full window; backward
        // differences recover the cubic's third derivative exactly
        assert_relative_eq!(
            accum.cartesian_jerk_avg()[&ArmSide::Left],
            6.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            accum.cartesian_jerk_rms()[&ArmSide::Left],
            6.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_fewer_than_window_samples_no_jerk() {
        let mut accum = KinematicAccumulator::new(&config_all());

        for i in 0..(JERK_WINDOW - 1) {
            accum.sample_arm(ArmSide::Left, &arm_at(f64::from(i as u32), 0.0, 0.0));
        }

        assert_eq!(accum.cartesian_jerk_avg()[&ArmSide::Left], 0.0);
        assert_eq!(accum.joint_jerk_avg()[&ArmSide::Left], 0.0);
    }

    #[test]
    fn test_single_arm_layout_tracks_one_side() {
        let config = TrackingConfig::new(ArmLayout::Single(ArmSide::Right))
            .with_control_dt(0.1)
            .with_cartesian_path_length();
        let mut accum = KinematicAccumulator::new(&config);

        accum.sample_arm(ArmSide::Right, &arm_at(0.0, 0.0, 0.0));
        accum.sample_arm(ArmSide::Right, &arm_at(1.0, 0.0, 0.0));
        // Untracked side is ignored
        accum.sample_arm(ArmSide::Left, &arm_at(9.0, 9.0, 9.0));

        let paths = accum.cartesian_path_lengths();
        assert_eq!(paths.len(), 1);
        assert_relative_eq!(paths[&ArmSide::Right], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_disabled_metrics_stay_zero() {
        let config = TrackingConfig::bimanual()
            .with_control_dt(0.1)
            .with_cartesian_path_length();
        let mut accum = KinematicAccumulator::new(&config);

        let mut arm = arm_at(0.0, 0.0, 0.0);
        arm.joint_positions = DVector::from_vec(vec![0.0]);
        accum.sample_arm(ArmSide::Left, &arm);
        arm.joint_positions = DVector::from_vec(vec![2.0]);
        arm.position = Point3::new(1.0, 0.0, 0.0);
        accum.sample_arm(ArmSide::Left, &arm);

        assert!(accum.cartesian_path_lengths()[&ArmSide::Left] > 0.0);
        // Joint path flag off: nothing accumulated
        assert_eq!(accum.joint_path_lengths()[&ArmSide::Left], 0.0);
    }
}
