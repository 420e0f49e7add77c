#![forbid(unsafe_code)]

//! Tooltip placement relative to its target.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Preferred side of the tooltip relative to the highlighted target.
///
/// The requested placement may be flipped to [`Placement::opposite`] at
/// computation time when the preferred side would overflow the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Above the target.
    Top,
    /// Below the target.
    #[default]
    Bottom,
    /// Left of the target.
    Left,
    /// Right of the target.
    Right,
    /// Centered in the viewport, ignoring the target.
    Center,
}

impl Placement {
    /// All placements, in declaration order.
    pub const ALL: [Placement; 5] = [
        Placement::Top,
        Placement::Bottom,
        Placement::Left,
        Placement::Right,
        Placement::Center,
    ];

    /// The side a directional placement flips to. `Center` maps to itself.
    #[must_use]
    pub const fn opposite(self) -> Placement {
        match self {
            Placement::Top => Placement::Bottom,
            Placement::Bottom => Placement::Top,
            Placement::Left => Placement::Right,
            Placement::Right => Placement::Left,
            Placement::Center => Placement::Center,
        }
    }

    /// Whether the placement anchors against a target side.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Placement::Center)
    }

    /// Whether the placement stacks the tooltip vertically against the target.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Placement::Top | Placement::Bottom)
    }

    /// Lower-case name, as used in tour step definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Placement::Top => "top",
            Placement::Bottom => "bottom",
            Placement::Left => "left",
            Placement::Right => "right",
            Placement::Center => "center",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown placement name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlacementError(pub String);

impl fmt::Display for ParsePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown placement: {:?}", self.0)
    }
}

impl std::error::Error for ParsePlacementError {}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Placement::Top),
            "bottom" => Ok(Placement::Bottom),
            "left" => Ok(Placement::Left),
            "right" => Ok(Placement::Right),
            "center" | "centre" => Ok(Placement::Center),
            _ => Err(ParsePlacementError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for p in Placement::ALL {
            assert_eq!(p.opposite().opposite(), p);
        }
        assert_eq!(Placement::Top.opposite(), Placement::Bottom);
        assert_eq!(Placement::Left.opposite(), Placement::Right);
    }

    #[test]
    fn parse_round_trips_names() {
        for p in Placement::ALL {
            assert_eq!(p.as_str().parse::<Placement>(), Ok(p));
        }
        assert_eq!(" Bottom ".parse::<Placement>(), Ok(Placement::Bottom));
        assert!("diagonal".parse::<Placement>().is_err());
    }

    #[test]
    fn center_is_not_directional() {
        assert!(!Placement::Center.is_directional());
        assert!(Placement::Left.is_directional());
        assert!(Placement::Top.is_vertical());
        assert!(!Placement::Right.is_vertical());
    }
}
