//! The rover as one owned aggregate.
//!
//! [`Robot`] owns every piece of mutable state: motion controller, distance
//! filter, dispatcher, safety monitor, telemetry reporter and connection
//! state. A host runtime feeds it three kinds of events on one context:
//!
//! | Event | Call |
//! |-------|------|
//! | Inbound line | [`Robot::dispatch`] |
//! | Safety tick (~100ms) | [`Robot::poll`] |
//! | Telemetry tick (~1s) | [`Robot::telemetry`] |
//!
//! Each call runs to completion, including any brake, settle and ramp
//! pauses, before the next event is handled.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::config::RobotConfig;
//! use rs_rover::hal::*;
//! use rs_rover::{Direction, Robot};
//!
//! let timer = MockTimer::new();
//! let mut robot = Robot::new(
//!     MockWheels::new(),
//!     MockServo::new(),
//!     MockSonar::new().with_fallback(Some(200)),
//!     MockThermometer::new(22),
//!     timer.clone(),
//!     MockIndicator::new(),
//!     &RobotConfig::default(),
//! );
//! robot.init().unwrap();
//!
//! robot.dispatch("1", 0).unwrap();
//! assert_eq!(robot.motion().direction(), Direction::Forward);
//!
//! // Sonar now points ahead and sees 200cm
//! let report = robot.poll(1000).unwrap();
//! assert_eq!(report.front, Some(200));
//! assert!(!report.stopped);
//! ```

use heapless::String;

use crate::config::RobotConfig;
use crate::dispatcher::{CommandDispatcher, DispatchOutcome};
use crate::link::ConnectionState;
use crate::motion::MotionController;
use crate::safety::{SafetyMonitor, SafetyReport};
use crate::sonar::{Clearance, DistanceFilter};
use crate::telemetry::{Telemetry, TelemetryReporter, LINE_CAPACITY};
use crate::traits::{
    Glyph, RangeSensor, ServoDriver, Side, StatusIndicator, TemperatureSensor, Timer,
    WheelDriver,
};

/// Everything the rover needs, owned in one place.
pub struct Robot<W, S, R, C, T, I>
where
    W: WheelDriver,
    S: ServoDriver<Error = W::Error>,
    R: RangeSensor,
    C: TemperatureSensor,
    T: Timer + Clone,
    I: StatusIndicator,
{
    motion: MotionController<W, S, T, I>,
    filter: DistanceFilter<R, T>,
    dispatcher: CommandDispatcher,
    safety: SafetyMonitor,
    telemetry: TelemetryReporter,
    link: ConnectionState,
    thermometer: C,
    unknown_cm: u16,
}

impl<W, S, R, C, T, I> Robot<W, S, R, C, T, I>
where
    W: WheelDriver,
    S: ServoDriver<Error = W::Error>,
    R: RangeSensor,
    C: TemperatureSensor,
    T: Timer + Clone,
    I: StatusIndicator,
{
    /// Wires the hardware together. The timer is shared by the motion
    /// controller and the distance filter.
    pub fn new(
        wheels: W,
        servo: S,
        sonar: R,
        thermometer: C,
        timer: T,
        indicator: I,
        config: &RobotConfig,
    ) -> Self {
        Self {
            filter: DistanceFilter::new(sonar, timer.clone(), &config.sonar),
            motion: MotionController::new(wheels, servo, timer, indicator, config),
            dispatcher: CommandDispatcher::new(&config.dispatch, &config.safety),
            safety: SafetyMonitor::new(config.safety.tick_interval_ms),
            telemetry: TelemetryReporter::new(config.telemetry.interval_ms),
            link: ConnectionState::new(),
            thermometer,
            unknown_cm: config.sonar.unknown_cm,
        }
    }

    /// Startup: wheels off, servo parked, idle glyph.
    pub fn init(&mut self) -> Result<(), W::Error> {
        log::info!("rover starting");
        self.motion.init()
    }

    /// Handles one inbound line.
    ///
    /// Travel tokens measure the guarded side after the sonar is aimed at it.
    pub fn dispatch(&mut self, raw: &str, now_ms: u64) -> Result<DispatchOutcome, W::Error> {
        self.dispatcher
            .dispatch(raw, now_ms, &mut self.motion, &mut self.filter)
    }

    /// Runs the safety tick if it is due.
    pub fn poll(&mut self, now_ms: u64) -> Option<SafetyReport> {
        self.safety.poll(now_ms, &mut self.motion, &mut self.filter)
    }

    /// Runs the telemetry tick if it is due and returns the line to send.
    pub fn telemetry(&mut self, now_ms: u64) -> Option<String<LINE_CAPACITY>> {
        if !self.telemetry.tick_due(now_ms) {
            return None;
        }
        let held = self.filter.clearance();
        let aimed = self.motion.servo().aimed_side();
        let seen = |side| {
            if aimed == Some(side) {
                held.get(side)
            } else {
                self.unknown_cm
            }
        };
        let clearance = Clearance::new(seen(Side::Front), seen(Side::Back));
        let sample = Telemetry::new(self.thermometer.read_celsius(), clearance, self.unknown_cm);
        self.telemetry.report(self.link.is_connected(), sample)
    }

    /// Records a client connecting or disconnecting.
    pub fn set_connected(&mut self, connected: bool) {
        if !self.link.set_connected(connected) {
            return;
        }
        self.motion.set_connected(connected);
        self.motion.show(if connected {
            Glyph::Connected
        } else {
            Glyph::Disconnected
        });
    }

    /// Registers a listener for connection changes.
    pub fn on_connection_change<F>(&mut self, listener: F)
    where
        F: FnMut(bool) + 'static,
    {
        self.link.on_change(listener);
    }

    /// Returns true while a client is connected.
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Borrow the motion controller.
    pub fn motion(&self) -> &MotionController<W, S, T, I> {
        &self.motion
    }

    /// Mutably borrow the motion controller.
    pub fn motion_mut(&mut self) -> &mut MotionController<W, S, T, I> {
        &mut self.motion
    }

    /// Borrow the distance filter.
    pub fn filter(&self) -> &DistanceFilter<R, T> {
        &self.filter
    }

    /// Mutably borrow the distance filter.
    pub fn filter_mut(&mut self) -> &mut DistanceFilter<R, T> {
        &mut self.filter
    }

    /// Borrow the dispatcher.
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Borrow the safety monitor.
    pub fn safety(&self) -> &SafetyMonitor {
        &self.safety
    }
}
