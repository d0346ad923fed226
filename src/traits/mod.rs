//! Trait definitions for hardware abstraction.
//!
//! This module defines the abstractions that allow rs-rover to run on a
//! microcontroller board and on a desktop with mocks.
//!
//! # Submodules
//!
//! - `hardware`: Wheels, aiming servo, sonar, thermometer, clock and delay
//! - `indicator`: Status glyph output
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`WheelDriver`]: Four-terminal PWM wheel output
//! - [`ServoDriver`]: Sonar aiming servo
//! - [`RangeSensor`]: Ultrasonic ping
//! - [`Clock`] and [`Delay`]: Time source and blocking pause

pub mod hardware;
pub mod indicator;

pub use hardware::*;
pub use indicator::*;
