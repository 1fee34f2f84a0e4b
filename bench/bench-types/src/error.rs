//! Error types for the evaluation engine.
//!
//! Three categories, all surfaced synchronously to the caller:
//! lifecycle violations (calls out of order), configuration errors (caught
//! when the engine is constructed), and data-shape errors (a step sample
//! missing data the configuration declared as tracked).

use thiserror::Error;

use crate::ArmSide;

/// Errors that can occur during rollout evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// A lifecycle call was made in the wrong state. Fatal to the caller;
    /// never retried.
    #[error("lifecycle violation: {call} called in {state} state")]
    Lifecycle {
        /// The offending call.
        call: &'static str,
        /// The state the engine was in.
        state: &'static str,
    },

    /// Invalid tracking configuration, reported before the first step.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// A step sample is missing a tracked arm side.
    #[error("step sample missing data for {side} arm")]
    MissingArm {
        /// The missing side.
        side: ArmSide,
    },

    /// A step sample is missing a tracked object's holding state.
    #[error("step sample missing holding state for object '{name}'")]
    MissingObject {
        /// The missing object's name.
        name: String,
    },
}

impl EvalError {
    /// Create a lifecycle violation error.
    #[must_use]
    pub const fn lifecycle(call: &'static str, state: &'static str) -> Self {
        Self::Lifecycle { call, state }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a missing-object data-shape error.
    #[must_use]
    pub fn missing_object(name: impl Into<String>) -> Self {
        Self::MissingObject { name: name.into() }
    }

    /// Check if this is a lifecycle (usage) error.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this is a data-shape error.
    #[must_use]
    pub const fn is_data_shape_error(&self) -> bool {
        matches!(self, Self::MissingArm { .. } | Self::MissingObject { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::lifecycle("step", "finalized");
        assert_eq!(
            err.to_string(),
            "lifecycle violation: step called in finalized state"
        );

        let err = EvalError::MissingArm {
            side: ArmSide::Left,
        };
        assert!(err.to_string().contains("left"));

        let err = EvalError::missing_object("cube");
        assert!(err.to_string().contains("cube"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(EvalError::lifecycle("step", "uninitialized").is_lifecycle());
        assert!(EvalError::invalid_config("bad").is_config_error());
        assert!(EvalError::missing_object("cube").is_data_shape_error());
        assert!(EvalError::MissingArm {
            side: ArmSide::Right
        }
        .is_data_shape_error());
        assert!(!EvalError::invalid_config("bad").is_lifecycle());
    }
}
