//! Hardware abstraction traits for wheels, aiming servo, sonar and timing.
//!
//! This module defines the hardware interfaces that let the rover core run
//! on real boards and on desktop mocks alike.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`WheelDriver`] | Four PWM terminals of a dual H-bridge |
//! | [`ServoDriver`] | Angle output for the sonar aiming servo |
//! | [`RangeSensor`] | Single ultrasonic ping |
//! | [`TemperatureSensor`] | Board temperature for telemetry |
//! | [`Clock`] | Monotonic millisecond time source |
//! | [`Delay`] | Blocking pause used by brake, ramp and settle steps |
//!
//! # Example
//!
//! ```rust
//! use rs_rover::traits::{WheelDriver, WheelOutputs};
//! use rs_rover::hal::MockWheels;
//!
//! let mut wheels = MockWheels::new();
//! wheels.write(WheelOutputs::new(1023, 0, 1023, 0)).unwrap();
//! assert_eq!(wheels.outputs.left_forward, 1023);
//! ```

/// Largest PWM duty accepted by the wheel terminals (10-bit).
pub const MAX_DUTY: u16 = 1023;

/// Which way the single sonar can look.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Looking ahead of the rover.
    Front,
    /// Looking behind the rover.
    Back,
}

impl Side {
    /// Returns the side as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }

    /// The opposite side.
    #[inline]
    pub const fn opposite(&self) -> Side {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

/// Duties for the four H-bridge terminals, each in `0..=MAX_DUTY`.
///
/// A wheel is driven forward by its `*_forward` terminal and backward by
/// its `*_backward` terminal. Constructors clamp every value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WheelOutputs {
    /// Left wheel, forward terminal.
    pub left_forward: u16,
    /// Left wheel, backward terminal.
    pub left_backward: u16,
    /// Right wheel, forward terminal.
    pub right_forward: u16,
    /// Right wheel, backward terminal.
    pub right_backward: u16,
}

impl WheelOutputs {
    /// All terminals at zero.
    pub const ZERO: WheelOutputs = WheelOutputs {
        left_forward: 0,
        left_backward: 0,
        right_forward: 0,
        right_backward: 0,
    };

    /// Creates an output set, clamping each duty to `0..=MAX_DUTY`.
    pub fn new(left_forward: u16, left_backward: u16, right_forward: u16, right_backward: u16) -> Self {
        Self {
            left_forward: left_forward.min(MAX_DUTY),
            left_backward: left_backward.min(MAX_DUTY),
            right_forward: right_forward.min(MAX_DUTY),
            right_backward: right_backward.min(MAX_DUTY),
        }
    }

    /// Returns true if every terminal is at zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Scales every terminal by `percent` (0..=100).
    pub fn scaled(&self, percent: u8) -> Self {
        let pct = u32::from(percent.min(100));
        let scale = |d: u16| ((u32::from(d) * pct) / 100) as u16;
        Self {
            left_forward: scale(self.left_forward),
            left_backward: scale(self.left_backward),
            right_forward: scale(self.right_forward),
            right_backward: scale(self.right_backward),
        }
    }

    /// Drives each currently powered wheel the other way at `duty`.
    ///
    /// Wheels that are not powered stay at zero. Used for the brake pulse.
    pub fn reversed_at(&self, duty: u16) -> Self {
        let duty = duty.min(MAX_DUTY);
        let flip = |fwd: u16, back: u16| -> (u16, u16) {
            if fwd > 0 {
                (0, duty)
            } else if back > 0 {
                (duty, 0)
            } else {
                (0, 0)
            }
        };
        let (left_forward, left_backward) = flip(self.left_forward, self.left_backward);
        let (right_forward, right_backward) = flip(self.right_forward, self.right_backward);
        Self {
            left_forward,
            left_backward,
            right_forward,
            right_backward,
        }
    }
}

/// Wheel driver trait - abstracts a dual H-bridge driven by four PWM pins.
///
/// # Implementation Notes
///
/// - All four terminals should be updated together
/// - Values are already clamped to `0..=MAX_DUTY` by [`WheelOutputs`]
pub trait WheelDriver {
    /// Error type for PWM writes.
    type Error;

    /// Writes all four terminal duties.
    fn write(&mut self, outputs: WheelOutputs) -> Result<(), Self::Error>;
}

/// Servo output for the sonar aiming mount.
///
/// Implementations only move the horn. Settle timing is tracked by
/// [`ServoPositionModel`](crate::servo::ServoPositionModel).
pub trait ServoDriver {
    /// Error type for servo writes.
    type Error;

    /// Commands the servo to `angle` degrees (0..=180).
    fn set_angle(&mut self, angle: u8) -> Result<(), Self::Error>;
}

/// Ultrasonic range sensor (HC-SR04 style).
pub trait RangeSensor {
    /// Performs one ping and returns the distance in centimeters.
    ///
    /// Returns `None` when no echo was received.
    fn ping_cm(&mut self) -> Option<u16>;
}

/// Board temperature, reported in telemetry only.
pub trait TemperatureSensor {
    /// Current temperature in degrees Celsius.
    fn read_celsius(&mut self) -> i16;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for servo settle tracking.
///
/// # Example
///
/// ```rust
/// use rs_rover::traits::Clock;
/// use rs_rover::hal::MockTimer;
///
/// let timer = MockTimer::new();
/// assert_eq!(timer.now_ms(), 0);
///
/// timer.advance(100);
/// assert_eq!(timer.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Blocking delay.
///
/// Every brake pulse, ramp step and servo settle wait goes through this
/// trait. Nothing else runs on the control context while it blocks.
pub trait Delay {
    /// Pauses for the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// A clock that can also pause. Implemented for anything that is both.
pub trait Timer: Clock + Delay {}

impl<T: Clock + Delay> Timer for T {}
