//! Per-episode rollout metrics for manipulation benchmarks.
//!
//! This crate converts raw simulation signals into a structured evaluation
//! report for one episode at a time:
//!
//! - [`StageTracker`] - Monotonic task-stage progression
//! - [`SlipDetector`] - Grasp-loss events on a fixed frame window
//! - [`CollisionTracker`] - Newly-appearing environment/self contact pairs
//! - [`KinematicAccumulator`] - Path length and jerk statistics per arm
//! - [`CoordinationTracker`] - Cross-arm synchrony (bimanual robots)
//! - [`RolloutMetrics`] - The orchestrator binding them to the task
//!   lifecycle: init → step/mark_stage → finalize
//!
//! # Design Philosophy
//!
//! The engine aggregates; it never decides. Task success, stage predicates,
//! and contact classification belong to the enclosing task environment.
//! Every tracker is a bounded in-memory computation with no suspension
//! points, and each [`RolloutMetrics`] instance owns its state exclusively:
//! batch evaluation parallelizes by running independent instances, not by
//! sharing this one.
//!
//! # Example
//!
//! ```ignore
//! use bench_metrics::RolloutMetrics;
//! use bench_types::TrackingConfig;
//!
//! let config = TrackingConfig::bimanual()
//!     .with_cartesian_path_length()
//!     .with_collisions();
//! let mut metrics = RolloutMetrics::new(config)?;
//!
//! metrics.init(0.0);
//! // per simulation step: metrics.step(&sample)?;
//! // per milestone:       metrics.mark_stage(idx, true)?;
//! let report = metrics.finalize(success, target_distance, pose_error)?;
//! ```

#![doc(html_root_url = "https://docs.rs/bench-metrics/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc
)]

mod collision;
mod coordination;
mod kinematics;
mod rollout;
mod slip;
mod stage;

pub use collision::CollisionTracker;
pub use coordination::CoordinationTracker;
pub use kinematics::KinematicAccumulator;
pub use rollout::{RolloutMetrics, RolloutState};
pub use slip::SlipDetector;
pub use stage::StageTracker;

// Re-export the shared vocabulary so callers can depend on one crate.
pub use bench_types::{
    ArmLayout, ArmMetric, ArmSample, ArmSide, ContactKind, ContactPair, ErrorMetric, EvalError,
    MetricsReport, ReleasePolicy, Result, StepSample, TrackingConfig,
};
