//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without the rover.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockWheels`] | [`WheelDriver`] | Records every output write |
//! | [`MockServo`] | [`ServoDriver`] | Records commanded angles |
//! | [`MockSonar`] | [`RangeSensor`] | Queued pings with a fallback reading |
//! | [`MockThermometer`] | [`TemperatureSensor`] | Fixed temperature |
//! | [`MockTimer`] | [`Clock`] + [`Delay`] | Shared time that delays advance |
//! | [`MockIndicator`] | [`StatusIndicator`] | Records shown glyphs |
//!
//! # Example
//!
//! ```rust
//! use rs_rover::hal::{MockIndicator, MockServo, MockTimer, MockWheels};
//! use rs_rover::{MotionController, MotionOutcome, Maneuver, Clearance};
//! use rs_rover::config::RobotConfig;
//! use rs_rover::traits::Clock;
//!
//! let timer = MockTimer::new();
//! let mut motion = MotionController::new(
//!     MockWheels::new(),
//!     MockServo::new(),
//!     timer.clone(),
//!     MockIndicator::new(),
//!     &RobotConfig::default(),
//! );
//!
//! let outcome = motion.execute(Maneuver::Forward, Clearance::unknown(999)).unwrap();
//! assert_eq!(outcome, MotionOutcome::Started(Maneuver::Forward));
//! assert_eq!(motion.wheels().outputs.left_forward, 1023);
//! assert!(timer.now_ms() > 0); // settle and ramp pauses advanced the clock
//! ```
//!
//! [`WheelDriver`]: crate::traits::WheelDriver
//! [`ServoDriver`]: crate::traits::ServoDriver
//! [`RangeSensor`]: crate::traits::RangeSensor
//! [`TemperatureSensor`]: crate::traits::TemperatureSensor
//! [`Clock`]: crate::traits::Clock
//! [`Delay`]: crate::traits::Delay
//! [`StatusIndicator`]: crate::traits::StatusIndicator

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::traits::{
    Clock, Delay, Glyph, RangeSensor, ServoDriver, StatusIndicator, TemperatureSensor,
    WheelDriver, WheelOutputs,
};

// ============================================================================
// Actuator Mocks
// ============================================================================

/// Mock wheel driver.
///
/// Every write is appended to `history` so tests can check the exact
/// brake and ramp sequence.
///
/// # Example
///
/// ```rust
/// use rs_rover::hal::MockWheels;
/// use rs_rover::traits::{WheelDriver, WheelOutputs};
///
/// let mut wheels = MockWheels::new();
/// wheels.write(WheelOutputs::new(500, 0, 500, 0)).unwrap();
/// wheels.write(WheelOutputs::ZERO).unwrap();
///
/// assert!(wheels.outputs.is_zero());
/// assert_eq!(wheels.history.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockWheels {
    /// Last written outputs.
    pub outputs: WheelOutputs,
    /// Every write in order.
    pub history: Vec<WheelOutputs>,
    /// Number of upcoming writes that fail with `Err(())`.
    pub fail_writes: usize,
}

impl MockWheels {
    /// Creates a new mock with all terminals at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail.
    pub fn failing(mut self, count: usize) -> Self {
        self.fail_writes = count;
        self
    }

    /// Forgets recorded writes.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl WheelDriver for MockWheels {
    type Error = ();

    fn write(&mut self, outputs: WheelOutputs) -> Result<(), ()> {
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(());
        }
        self.outputs = outputs;
        self.history.push(outputs);
        Ok(())
    }
}

/// Mock aiming servo.
#[derive(Debug, Default)]
pub struct MockServo {
    /// Last commanded angle, if any.
    pub angle: Option<u8>,
    /// Every commanded angle in order.
    pub history: Vec<u8>,
}

impl MockServo {
    /// Creates a servo that has not been commanded yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServoDriver for MockServo {
    type Error = ();

    fn set_angle(&mut self, angle: u8) -> Result<(), ()> {
        self.angle = Some(angle);
        self.history.push(angle);
        Ok(())
    }
}

// ============================================================================
// Sensor Mocks
// ============================================================================

/// Mock ultrasonic sensor.
///
/// Queued pings come out first-in first-out. When the queue is empty the
/// fallback reading is returned.
///
/// # Example
///
/// ```rust
/// use rs_rover::hal::MockSonar;
/// use rs_rover::traits::RangeSensor;
///
/// let mut sonar = MockSonar::new().with_fallback(Some(120));
/// sonar.queue_pings(&[None, Some(30)]);
///
/// assert_eq!(sonar.ping_cm(), None);
/// assert_eq!(sonar.ping_cm(), Some(30));
/// assert_eq!(sonar.ping_cm(), Some(120));
/// assert_eq!(sonar.pings, 3);
/// ```
#[derive(Debug, Default)]
pub struct MockSonar {
    queue: VecDeque<Option<u16>>,
    fallback: Option<u16>,
    /// Number of pings performed.
    pub pings: usize,
}

impl MockSonar {
    /// Creates a sonar that never hears an echo until pings are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reading returned once the queue is empty.
    pub fn with_fallback(mut self, fallback: Option<u16>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Changes the fallback reading.
    pub fn set_fallback(&mut self, fallback: Option<u16>) {
        self.fallback = fallback;
    }

    /// Queues one ping result.
    pub fn queue_ping(&mut self, reading: Option<u16>) {
        self.queue.push_back(reading);
    }

    /// Queues several ping results.
    pub fn queue_pings(&mut self, readings: &[Option<u16>]) {
        self.queue.extend(readings.iter().copied());
    }
}

impl RangeSensor for MockSonar {
    fn ping_cm(&mut self) -> Option<u16> {
        self.pings += 1;
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}

/// Mock thermometer returning a settable temperature.
#[derive(Debug, Default)]
pub struct MockThermometer {
    /// Reported temperature.
    pub celsius: i16,
}

impl MockThermometer {
    /// Creates a thermometer reading `celsius`.
    pub fn new(celsius: i16) -> Self {
        Self { celsius }
    }
}

impl TemperatureSensor for MockThermometer {
    fn read_celsius(&mut self) -> i16 {
        self.celsius
    }
}

// ============================================================================
// Timing Mock
// ============================================================================

/// Mock time source whose delays advance the clock.
///
/// Clones share the same time and delay log, so the motion controller and
/// the distance filter can each own a handle while the test keeps one.
///
/// # Example
///
/// ```rust
/// use rs_rover::hal::MockTimer;
/// use rs_rover::traits::{Clock, Delay};
///
/// let timer = MockTimer::new();
/// let mut handle = timer.clone();
///
/// handle.delay_ms(150);
/// assert_eq!(timer.now_ms(), 150);
/// assert_eq!(timer.delays(), vec![150]);
///
/// timer.set(1000);
/// assert_eq!(handle.now_ms(), 1000);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockTimer {
    now: Rc<Cell<u64>>,
    delays: Rc<RefCell<Vec<u32>>>,
}

impl MockTimer {
    /// Creates a new mock timer starting at 0ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    /// Advances the clock without recording a delay.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<u32> {
        self.delays.borrow().clone()
    }

    /// Sum of all requested delays.
    pub fn total_delay_ms(&self) -> u64 {
        self.delays.borrow().iter().map(|&d| u64::from(d)).sum()
    }

    /// Forgets recorded delays (time is kept).
    pub fn clear_delays(&self) {
        self.delays.borrow_mut().clear();
    }
}

impl Clock for MockTimer {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl Delay for MockTimer {
    fn delay_ms(&mut self, ms: u32) {
        self.delays.borrow_mut().push(ms);
        self.advance(u64::from(ms));
    }
}

// ============================================================================
// Indicator Mock
// ============================================================================

/// Mock status indicator.
#[derive(Debug, Default)]
pub struct MockIndicator {
    /// Every glyph shown, in order.
    pub shown: Vec<Glyph>,
}

impl MockIndicator {
    /// Creates an indicator that has shown nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last glyph shown.
    pub fn last(&self) -> Option<Glyph> {
        self.shown.last().copied()
    }
}

impl StatusIndicator for MockIndicator {
    fn show(&mut self, glyph: Glyph) {
        self.shown.push(glyph);
    }
}
