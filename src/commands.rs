//! Motion tokens, maneuvers and the outcomes of applying them.
//!
//! # Token Grammar
//!
//! A motion token is a single character:
//!
//! | Token | Maneuver |
//! |-------|----------|
//! | `1` | [`Maneuver::Forward`] |
//! | `2` | [`Maneuver::Backward`] |
//! | `3` | [`Maneuver::SpinLeft`] |
//! | `4` | [`Maneuver::SpinRight`] |
//! | `5` | [`Maneuver::TurnLeft`] |
//! | `6` | [`Maneuver::TurnRight`] |
//! | `7` | [`Maneuver::TurnLeftBackward`] |
//! | `8` | [`Maneuver::TurnRightBackward`] |
//!
//! Anything else is [`MotionToken::Stop`].
//!
//! ```rust
//! use rs_rover::{Maneuver, MotionToken};
//!
//! assert_eq!(MotionToken::parse("1"), MotionToken::Move(Maneuver::Forward));
//! assert_eq!(MotionToken::parse("8"), MotionToken::Move(Maneuver::TurnRightBackward));
//! assert_eq!(MotionToken::parse("x"), MotionToken::Stop);
//! ```

use crate::traits::Side;

// ============================================================================
// Direction
// ============================================================================

/// Direction of travel owned by the motion controller.
///
/// Turns share the direction of the straight maneuver they arc from, so a
/// forward arc is [`Forward`](Self::Forward).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Not moving.
    #[default]
    Idle,
    /// Travelling forward (straight or arcing).
    Forward,
    /// Travelling backward (straight or arcing).
    Backward,
    /// Pivoting in place to the left.
    SpinLeft,
    /// Pivoting in place to the right.
    SpinRight,
}

impl Direction {
    /// Returns the direction as a snake_case string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Idle => "idle",
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::SpinLeft => "spin_left",
            Direction::SpinRight => "spin_right",
        }
    }

    /// Side whose clearance guards this direction, if any.
    ///
    /// Spins and idle are not guarded by the sonar.
    #[inline]
    pub const fn guarded_side(&self) -> Option<Side> {
        match self {
            Direction::Forward => Some(Side::Front),
            Direction::Backward => Some(Side::Back),
            Direction::Idle | Direction::SpinLeft | Direction::SpinRight => None,
        }
    }
}

// ============================================================================
// Maneuver
// ============================================================================

/// A discrete motion mode selected by a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maneuver {
    /// Both wheels forward.
    Forward,
    /// Both wheels backward.
    Backward,
    /// Pivot left in place.
    SpinLeft,
    /// Pivot right in place.
    SpinRight,
    /// Forward arc to the left.
    TurnLeft,
    /// Forward arc to the right.
    TurnRight,
    /// Backward arc to the left.
    TurnLeftBackward,
    /// Backward arc to the right.
    TurnRightBackward,
}

impl Maneuver {
    /// Every maneuver in token order.
    pub const ALL: [Maneuver; 8] = [
        Maneuver::Forward,
        Maneuver::Backward,
        Maneuver::SpinLeft,
        Maneuver::SpinRight,
        Maneuver::TurnLeft,
        Maneuver::TurnRight,
        Maneuver::TurnLeftBackward,
        Maneuver::TurnRightBackward,
    ];

    /// Maps a token character to a maneuver.
    pub const fn from_token(c: char) -> Option<Self> {
        match c {
            '1' => Some(Maneuver::Forward),
            '2' => Some(Maneuver::Backward),
            '3' => Some(Maneuver::SpinLeft),
            '4' => Some(Maneuver::SpinRight),
            '5' => Some(Maneuver::TurnLeft),
            '6' => Some(Maneuver::TurnRight),
            '7' => Some(Maneuver::TurnLeftBackward),
            '8' => Some(Maneuver::TurnRightBackward),
            _ => None,
        }
    }

    /// The token character for this maneuver.
    pub const fn token(&self) -> char {
        match self {
            Maneuver::Forward => '1',
            Maneuver::Backward => '2',
            Maneuver::SpinLeft => '3',
            Maneuver::SpinRight => '4',
            Maneuver::TurnLeft => '5',
            Maneuver::TurnRight => '6',
            Maneuver::TurnLeftBackward => '7',
            Maneuver::TurnRightBackward => '8',
        }
    }

    /// Direction of travel this maneuver produces.
    pub const fn direction(&self) -> Direction {
        match self {
            Maneuver::Forward | Maneuver::TurnLeft | Maneuver::TurnRight => Direction::Forward,
            Maneuver::Backward | Maneuver::TurnLeftBackward | Maneuver::TurnRightBackward => {
                Direction::Backward
            }
            Maneuver::SpinLeft => Direction::SpinLeft,
            Maneuver::SpinRight => Direction::SpinRight,
        }
    }

    /// True for the six maneuvers that travel and are debounced.
    ///
    /// Spins pivot in place and bypass the debounce window.
    #[inline]
    pub const fn is_travel(&self) -> bool {
        !matches!(self, Maneuver::SpinLeft | Maneuver::SpinRight)
    }

    /// True for the arcing maneuvers that slow one wheel.
    #[inline]
    pub const fn is_turn(&self) -> bool {
        matches!(
            self,
            Maneuver::TurnLeft
                | Maneuver::TurnRight
                | Maneuver::TurnLeftBackward
                | Maneuver::TurnRightBackward
        )
    }
}

// ============================================================================
// Motion Tokens
// ============================================================================

/// A parsed motion token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionToken {
    /// Start or adjust a maneuver.
    Move(Maneuver),
    /// Stop. Any unrecognised input maps here.
    Stop,
}

impl MotionToken {
    /// Parses a raw token. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        let mut chars = raw.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Maneuver::from_token(c).map_or(MotionToken::Stop, MotionToken::Move),
            _ => MotionToken::Stop,
        }
    }

    /// True if this token is one of the debounced travel tokens.
    #[inline]
    pub fn is_travel(&self) -> bool {
        matches!(self, MotionToken::Move(m) if m.is_travel())
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// What a motion command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionOutcome {
    /// A direction change ran to completion (brake, re-aim, ramp).
    Started(Maneuver),
    /// Already travelling that way; only the wheel duties were rewritten.
    SpeedUpdated(Maneuver),
    /// The interlock refused the move and the rover was stopped.
    Blocked(Blocked),
    /// A direction change is already in flight; nothing was done.
    Busy,
    /// The rover was stopped.
    Stopped,
}

impl MotionOutcome {
    /// Returns true if the maneuver is now driving the wheels.
    pub fn is_moving(&self) -> bool {
        matches!(self, MotionOutcome::Started(_) | MotionOutcome::SpeedUpdated(_))
    }
}

/// Details of an interlock refusal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blocked {
    /// Side whose clearance was too small.
    pub side: Side,
    /// Filtered distance in centimeters.
    pub distance_cm: u16,
    /// Configured threshold in centimeters.
    pub threshold_cm: u16,
}
