//! Arm-side identifiers and robot arm layouts.
//!
//! A manipulation robot exposes one or two manipulator arms. Per-arm data
//! throughout the evaluation engine is keyed by [`ArmSide`]; the set of
//! sides a robot actually has is described by [`ArmLayout`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the robot's manipulator arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ArmSide {
    /// The left arm.
    Left,
    /// The right arm.
    Right,
}

impl ArmSide {
    /// Get the lowercase name used in reports and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Get the opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for ArmSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of arm sides a robot exposes.
///
/// Single-arm robots report per-arm metrics as bare scalars; bimanual robots
/// report them as per-side maps. The layout is fixed for the lifetime of an
/// episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArmLayout {
    /// A robot with a single manipulator arm.
    Single(ArmSide),
    /// A robot with both a left and a right arm.
    Bimanual,
}

impl ArmLayout {
    /// The sides present in this layout, in report order.
    #[must_use]
    pub const fn sides(&self) -> &'static [ArmSide] {
        match self {
            Self::Single(ArmSide::Left) => &[ArmSide::Left],
            Self::Single(ArmSide::Right) => &[ArmSide::Right],
            Self::Bimanual => &[ArmSide::Left, ArmSide::Right],
        }
    }

    /// Number of arm sides.
    #[must_use]
    pub const fn side_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Bimanual => 2,
        }
    }

    /// Whether this layout has two arms.
    #[must_use]
    pub const fn is_bimanual(&self) -> bool {
        matches!(self, Self::Bimanual)
    }

    /// Whether the given side exists in this layout.
    #[must_use]
    pub const fn contains(&self, side: ArmSide) -> bool {
        match self {
            Self::Single(s) => *s as u8 == side as u8,
            Self::Bimanual => true,
        }
    }
}

impl std::fmt::Display for ArmLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(side) => write!(f, "single-arm ({side})"),
            Self::Bimanual => f.write_str("bimanual"),
        }
    }
}
