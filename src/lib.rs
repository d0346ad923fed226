//! # rs-rover
//!
//! Motion safety core for a two-wheeled, remote-controlled rover with a
//! single ultrasonic sensor on an aiming servo.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for wheels, servo, sonar, thermometer and timing
//! - **Safe direction changes**: Brake pulse, sonar re-aim and 25/50/100% ramp
//! - **Collision interlock**: Refuses travel toward an obstacle, and a periodic
//!   safety tick stops the rover when one appears
//! - **Robust ranging**: Retried pings, median-of-3 and hold-last-good per side
//! - **Line protocol**: Single-character motion tokens and JSON settings, with
//!   debouncing of conflicting travel tokens
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and status indicator abstractions
//! - `commands` - Maneuvers, motion tokens and outcomes
//! - `sonar` - Distance filtering
//! - `servo` - Aiming servo position model
//! - `motion` - Motion controller that owns the wheel outputs
//! - `dispatcher` - Inbound line handling and debounce
//! - `safety` - Periodic interlock
//! - `robot` - Aggregate that ties everything together
//! - `hal` - Concrete implementations (mock for testing, host timing)
//!
//! ## Example
//!
//! ```rust
//! use rs_rover::{
//!     Clearance, Direction, Maneuver, MotionController, MotionOutcome,
//!     config::RobotConfig,
//!     hal::{MockIndicator, MockServo, MockTimer, MockWheels},
//! };
//!
//! let mut motion = MotionController::new(
//!     MockWheels::new(),
//!     MockServo::new(),
//!     MockTimer::new(),
//!     MockIndicator::new(),
//!     &RobotConfig::default(),
//! );
//!
//! // Drive forward at full duty (sonar has no reading yet)
//! let outcome = motion.execute(Maneuver::Forward, Clearance::unknown(999)).unwrap();
//! assert_eq!(outcome, MotionOutcome::Started(Maneuver::Forward));
//!
//! // Slow down without braking
//! motion.set_custom_duties(600, 600);
//! motion.execute(Maneuver::Forward, Clearance::unknown(999)).unwrap();
//! assert_eq!(motion.outputs().left_forward, 600);
//!
//! motion.stop();
//! assert_eq!(motion.direction(), Direction::Idle);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Maneuvers, motion tokens and outcome types.
pub mod commands;
/// Built-in configuration with builder overrides.
pub mod config;
/// Inbound line classification, settings application and debounce.
pub mod dispatcher;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Client connection state and change listeners.
pub mod link;
/// Settings message types (serde-based).
pub mod messages;
/// Motion controller that owns the wheel outputs.
pub mod motion;
/// The rover aggregate.
pub mod robot;
/// Periodic safety interlock.
pub mod safety;
/// Aiming servo position model.
pub mod servo;
/// Sonar distance filtering.
pub mod sonar;
/// Change-only telemetry lines.
pub mod telemetry;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use commands::{Blocked, Direction, Maneuver, MotionOutcome, MotionToken};
pub use config::RobotConfig;
pub use dispatcher::{CommandDispatcher, Debounce, DispatchOutcome, PairStatus, SettingsReport};
pub use messages::{parse_settings, SettingsMessage, SettingsParse};
pub use motion::{MotionController, MotionState, MotionStats, SafeDistances};
pub use robot::Robot;
pub use safety::{SafetyMonitor, SafetyReport};
pub use servo::{AimResult, ServoPositionModel};
pub use sonar::{median_of_3, Clearance, DistanceFilter, Ranging};
pub use telemetry::{Telemetry, TelemetryReporter};
pub use traits::{
    // Hardware
    Clock,
    Delay,
    // Status
    Glyph,
    RangeSensor,
    ServoDriver,
    Side,
    StatusIndicator,
    TemperatureSensor,
    Timer,
    WheelDriver,
    WheelOutputs,
    MAX_DUTY,
};
