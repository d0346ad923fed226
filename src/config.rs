//! Built-in configuration for the rover core.
//!
//! Nothing is loaded from storage: every value below is a compile-time
//! default that can be overridden with the `with_*` builders at
//! construction. At runtime only the custom duties and safe distances
//! change, through settings messages.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::config::{RobotConfig, SafetyConfig, ServoConfig};
//!
//! // Use defaults
//! let config = RobotConfig::default();
//! assert_eq!(config.safety.default_front_cm, 40);
//!
//! // Or customize
//! let config = RobotConfig::default()
//!     .with_safety(SafetyConfig::default().with_tick_interval_ms(80))
//!     .with_servo(ServoConfig::default().with_angles(3, 173, 83));
//! ```

use crate::traits::{Side, MAX_DUTY};

// ============================================================================
// Main Config
// ============================================================================

/// Complete rover configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RobotConfig {
    /// Wheel drive, braking and ramp settings
    pub motion: MotionConfig,
    /// Aiming servo angles and settle times
    pub servo: ServoConfig,
    /// Sonar retry and range settings
    pub sonar: SonarConfig,
    /// Safe distances and interlock tick
    pub safety: SafetyConfig,
    /// Command debounce
    pub dispatch: DispatchConfig,
    /// Telemetry cadence
    pub telemetry: TelemetryConfig,
}

impl RobotConfig {
    /// Set motion configuration
    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    /// Set servo configuration
    pub fn with_servo(mut self, servo: ServoConfig) -> Self {
        self.servo = servo;
        self
    }

    /// Set sonar configuration
    pub fn with_sonar(mut self, sonar: SonarConfig) -> Self {
        self.sonar = sonar;
        self
    }

    /// Set safety configuration
    pub fn with_safety(mut self, safety: SafetyConfig) -> Self {
        self.safety = safety;
        self
    }

    /// Set dispatch configuration
    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Set telemetry configuration
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }
}

// ============================================================================
// Motion Config
// ============================================================================

/// Wheel drive configuration
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MotionConfig {
    /// Duty used when no custom duty is set
    pub max_duty: u16,
    /// Numerator of the inner-wheel ratio for arcs
    pub turn_scale_num: u16,
    /// Denominator of the inner-wheel ratio for arcs
    pub turn_scale_den: u16,
    /// Length of the reverse-polarity brake pulse (0 disables braking)
    pub brake_ms: u32,
    /// Pause with all outputs at zero after the brake pulse
    pub brake_settle_ms: u32,
    /// Ramp percentages, strictly increasing and ending at 100
    pub ramp_percent: [u8; 3],
    /// Pause between ramp steps
    pub ramp_step_ms: u32,
    /// Whether an in-direction speed update re-checks the interlock
    pub recheck_interlock_on_speed_update: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_duty: MAX_DUTY,
            turn_scale_num: 4,
            turn_scale_den: 10,
            brake_ms: 100,
            brake_settle_ms: 20,
            ramp_percent: [25, 50, 100],
            ramp_step_ms: 30,
            recheck_interlock_on_speed_update: true,
        }
    }
}

impl MotionConfig {
    /// Set the arc ratio. A zero denominator is ignored.
    pub fn with_turn_scale(mut self, num: u16, den: u16) -> Self {
        if den > 0 {
            self.turn_scale_num = num.min(den);
            self.turn_scale_den = den;
        }
        self
    }

    /// Set the brake pulse and settle pause lengths
    pub fn with_brake(mut self, brake_ms: u32, settle_ms: u32) -> Self {
        self.brake_ms = brake_ms;
        self.brake_settle_ms = settle_ms;
        self
    }

    /// Set the ramp step pause
    pub fn with_ramp_step_ms(mut self, ms: u32) -> Self {
        self.ramp_step_ms = ms;
        self
    }

    /// Choose whether speed updates re-check the interlock
    pub fn with_recheck_on_speed_update(mut self, recheck: bool) -> Self {
        self.recheck_interlock_on_speed_update = recheck;
        self
    }

    /// Scale `duty` by the arc ratio.
    pub fn inner_wheel(&self, duty: u16) -> u16 {
        let den = u32::from(self.turn_scale_den.max(1));
        ((u32::from(duty) * u32::from(self.turn_scale_num)) / den) as u16
    }
}

// ============================================================================
// Servo Config
// ============================================================================

/// Aiming servo configuration
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ServoConfig {
    /// Angle that points the sonar ahead
    pub forward_angle: u8,
    /// Angle that points the sonar behind
    pub backward_angle: u8,
    /// Neutral parking angle (neither side aimable)
    pub idle_angle: u8,
    /// Settle time for moves up to `long_move_deg`
    pub settle_ms: u32,
    /// Settle time for moves larger than `long_move_deg`
    pub long_settle_ms: u32,
    /// Angle difference above which `long_settle_ms` applies
    pub long_move_deg: u8,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            forward_angle: 0,
            backward_angle: 173,
            idle_angle: 83,
            settle_ms: 150,
            long_settle_ms: 200,
            long_move_deg: 90,
        }
    }
}

impl ServoConfig {
    /// Set the forward, backward and idle angles (clamped to 180)
    pub fn with_angles(mut self, forward: u8, backward: u8, idle: u8) -> Self {
        self.forward_angle = forward.min(180);
        self.backward_angle = backward.min(180);
        self.idle_angle = idle.min(180);
        self
    }

    /// Set the short and long settle times
    pub fn with_settle_ms(mut self, short_ms: u32, long_ms: u32) -> Self {
        self.settle_ms = short_ms;
        self.long_settle_ms = long_ms;
        self
    }

    /// Angle that aims the sonar at `side`
    pub fn angle_for(&self, side: Side) -> u8 {
        match side {
            Side::Front => self.forward_angle,
            Side::Back => self.backward_angle,
        }
    }

    /// Settle time for a move between two angles
    pub fn settle_for(&self, from: u8, to: u8) -> u32 {
        if from.abs_diff(to) > self.long_move_deg {
            self.long_settle_ms
        } else {
            self.settle_ms
        }
    }
}

// ============================================================================
// Sonar Config
// ============================================================================

/// Sonar configuration
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SonarConfig {
    /// Extra attempts after a missed echo within one burst
    pub retries: u8,
    /// Smallest plausible reading in centimeters
    pub min_cm: u16,
    /// Largest plausible reading in centimeters
    pub max_cm: u16,
    /// Value held before the first valid reading ("far / unknown")
    pub unknown_cm: u16,
    /// Pause before each ping
    pub ping_settle_ms: u32,
    /// Pause after a missed echo
    pub retry_pause_ms: u32,
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            min_cm: 2,
            max_cm: 300,
            unknown_cm: 999,
            ping_settle_ms: 1,
            retry_pause_ms: 4,
        }
    }
}

impl SonarConfig {
    /// Set the retry count (at least 2)
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries.max(2);
        self
    }

    /// Set the plausible range
    pub fn with_range(mut self, min_cm: u16, max_cm: u16) -> Self {
        self.min_cm = min_cm;
        self.max_cm = max_cm;
        self
    }

    /// Returns true if `cm` is a usable reading
    #[inline]
    pub fn is_plausible(&self, cm: u16) -> bool {
        cm != 0 && cm >= self.min_cm && cm <= self.max_cm
    }
}

// ============================================================================
// Safety Config
// ============================================================================

/// Clearance thresholds and interlock tick
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SafetyConfig {
    /// Front threshold at startup
    pub default_front_cm: u16,
    /// Back threshold at startup
    pub default_back_cm: u16,
    /// Accepted front thresholds (inclusive)
    pub front_bounds: (u16, u16),
    /// Accepted back thresholds (inclusive)
    pub back_bounds: (u16, u16),
    /// Safety tick period
    pub tick_interval_ms: u32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            default_front_cm: 40,
            default_back_cm: 40,
            front_bounds: (20, 100),
            back_bounds: (20, 100),
            tick_interval_ms: 100,
        }
    }
}

impl SafetyConfig {
    /// Set the startup thresholds
    pub fn with_defaults(mut self, front_cm: u16, back_cm: u16) -> Self {
        self.default_front_cm = front_cm;
        self.default_back_cm = back_cm;
        self
    }

    /// Set the accepted back-threshold bounds
    pub fn with_back_bounds(mut self, min_cm: u16, max_cm: u16) -> Self {
        self.back_bounds = (min_cm, max_cm);
        self
    }

    /// Set the tick period
    pub fn with_tick_interval_ms(mut self, ms: u32) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Bounds for `side`
    pub fn bounds(&self, side: Side) -> (u16, u16) {
        match side {
            Side::Front => self.front_bounds,
            Side::Back => self.back_bounds,
        }
    }

    /// Returns true if `value` lies inside the bounds for `side`
    pub fn accepts(&self, side: Side, value: f64) -> bool {
        let (lo, hi) = self.bounds(side);
        value >= f64::from(lo) && value <= f64::from(hi)
    }

    /// Clamps `value` into the bounds for `side`
    pub fn clamp(&self, side: Side, value: i32) -> u16 {
        let (lo, hi) = self.bounds(side);
        value.clamp(i32::from(lo), i32::from(hi)) as u16
    }
}

// ============================================================================
// Dispatch / Telemetry Config
// ============================================================================

/// Command dispatcher configuration
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct DispatchConfig {
    /// Window in which a conflicting travel token is dropped
    pub debounce_ms: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 150 }
    }
}

impl DispatchConfig {
    /// Set the debounce window
    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }
}

/// Telemetry reporter configuration
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TelemetryConfig {
    /// Period between telemetry checks
    pub interval_ms: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}
