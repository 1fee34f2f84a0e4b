//! Core data types for manipulation-benchmark evaluation.
//!
//! This crate provides the foundational types for the rollout metrics
//! engine:
//!
//! - [`StepSample`] - Per-step snapshot of evaluation-relevant simulation state
//! - [`TrackingConfig`] - Enable flags and parameters for metric tracking
//! - [`MetricsReport`] - The per-episode evaluation report
//! - [`ContactPair`] - Classified contact pairs from the physics layer
//! - [`ArmSide`] / [`ArmLayout`] - Arm-side identity and robot arity
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no tracking behavior; they're
//! the common language between:
//!
//! - Task environments (assembling step snapshots)
//! - The metrics engine (bench-metrics, consuming snapshots)
//! - Evaluation harnesses (consuming reports)
//!
//! Per-arm report fields are shaped by robot arity, not by a separate
//! schema: a single-arm robot reports bare scalars, a bimanual robot
//! reports per-side maps ([`ArmMetric`]). With the `serde` feature enabled,
//! that tag is flattened away on the wire and untracked metrics are absent
//! keys, never zeros.

#![doc(html_root_url = "https://docs.rs/bench-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
// Allow certain clippy lints that are overly pedantic for type definitions
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::cast_precision_loss,   // usize to f64 is fine for counts
    clippy::missing_errors_doc     // Error docs added where non-obvious
)]

mod arm;
mod config;
mod contact;
mod error;
mod report;
mod sample;

pub use arm::{ArmLayout, ArmSide};
pub use config::{ReleasePolicy, TrackingConfig, DEFAULT_SLIP_SAMPLE_WINDOW};
pub use contact::{ContactKind, ContactPair};
pub use error::EvalError;
pub use report::{ArmMetric, ErrorMetric, MetricsReport};
pub use sample::{ArmSample, StepSample};

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
