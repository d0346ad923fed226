//! Motion controller: direction state machine, interlock and wheel output.
//!
//! This module provides [`MotionController`], which owns the direction and
//! duty state and is the only writer of the wheel outputs.
//!
//! # Overview
//!
//! For every maneuver the controller:
//!
//! 1. Refuses with [`MotionOutcome::Busy`] while a direction change is in
//!    flight.
//! 2. If already travelling that way, rechecks the interlock and only
//!    rewrites the duties ([`MotionOutcome::SpeedUpdated`]). No brake, no
//!    servo move.
//! 3. Otherwise runs a safe direction change: brake pulse if running, zero
//!    and settle, aim the sonar, check the interlock, then ramp
//!    25% → 50% → 100%.
//!
//! The interlock asks a [`Ranging`] source for the guarded side only once
//! the sonar points that way. A side closer than its safe distance stops the
//! rover and reports [`MotionOutcome::Blocked`]. Spins skip the interlock and
//! the servo but still brake before a reversal.
//!
//! # Timing
//!
//! Brake, settle and ramp pauses block through the [`Delay`] trait. Nothing
//! else runs on the control context meanwhile, including the safety tick.
//!
//! # Example
//!
//! ```rust
//! use rs_rover::{Clearance, Direction, Maneuver, MotionController, MotionOutcome};
//! use rs_rover::config::RobotConfig;
//! use rs_rover::hal::{MockIndicator, MockServo, MockTimer, MockWheels};
//!
//! let mut motion = MotionController::new(
//!     MockWheels::new(),
//!     MockServo::new(),
//!     MockTimer::new(),
//!     MockIndicator::new(),
//!     &RobotConfig::default(),
//! );
//!
//! // Something 25cm ahead, default safe distance is 40cm
//! let outcome = motion.execute(Maneuver::Forward, Clearance::new(25, 999)).unwrap();
//! assert!(matches!(outcome, MotionOutcome::Blocked(_)));
//! assert_eq!(motion.direction(), Direction::Idle);
//!
//! // Nothing behind
//! let outcome = motion.execute(Maneuver::Backward, Clearance::new(25, 999)).unwrap();
//! assert_eq!(outcome, MotionOutcome::Started(Maneuver::Backward));
//! assert_eq!(motion.direction(), Direction::Backward);
//! ```
//!
//! [`Delay`]: crate::traits::Delay
//! [`Ranging`]: crate::sonar::Ranging

use crate::commands::{Blocked, Direction, Maneuver, MotionOutcome};
use crate::config::{MotionConfig, RobotConfig, SafetyConfig};
use crate::servo::{AimResult, ServoPositionModel};
use crate::sonar::{Clearance, Ranging};
use crate::traits::{
    Glyph, Indicator, ServoDriver, Side, StatusIndicator, Timer, WheelDriver, WheelOutputs,
    MAX_DUTY,
};

/// Direction and duty state owned by the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionState {
    /// Current direction of travel.
    pub direction: Direction,
    /// Maneuver driving the wheels, if any.
    pub maneuver: Option<Maneuver>,
    /// Custom left duty (0 = use maximum).
    pub left_duty: u16,
    /// Custom right duty (0 = use maximum).
    pub right_duty: u16,
    /// True while the wheels are powered.
    pub running: bool,
    /// True while a direction change is in flight.
    pub transitioning: bool,
}

/// Configured clearance thresholds in centimeters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SafeDistances {
    /// Minimum clearance ahead for forward travel.
    pub front: u16,
    /// Minimum clearance behind for backward travel.
    pub back: u16,
}

impl SafeDistances {
    /// Threshold for `side`.
    pub const fn get(&self, side: Side) -> u16 {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }
}

/// Counters for what the controller has done since startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionStats {
    /// Completed direction changes.
    pub direction_changes: u32,
    /// In-direction duty rewrites.
    pub speed_updates: u32,
    /// Calls to `stop()`.
    pub stops: u32,
    /// Interlock refusals.
    pub blocked: u32,
    /// Requests dropped because a direction change was in flight.
    pub busy: u32,
}

/// Owner of the wheel outputs and the direction state machine.
///
/// # Type Parameters
///
/// - `W`: wheel driver ([`WheelDriver`])
/// - `S`: aiming servo driver ([`ServoDriver`]) sharing `W`'s error type
/// - `T`: clock and blocking delay ([`Timer`])
/// - `I`: status indicator ([`StatusIndicator`])
///
/// # Thread Safety
///
/// The controller is meant to live on a single control context. A threaded
/// host must funnel every call through one owner (an actor or a mutex).
pub struct MotionController<W, S, T, I>
where
    W: WheelDriver,
    S: ServoDriver<Error = W::Error>,
    T: Timer,
    I: StatusIndicator,
{
    wheels: W,
    servo_driver: S,
    servo: ServoPositionModel,
    timer: T,
    indicator: Indicator<I>,
    config: MotionConfig,
    safety: SafetyConfig,
    state: MotionState,
    safe: SafeDistances,
    outputs: WheelOutputs,
    connected: bool,
    stats: MotionStats,
}

impl<W, S, T, I> MotionController<W, S, T, I>
where
    W: WheelDriver,
    S: ServoDriver<Error = W::Error>,
    T: Timer,
    I: StatusIndicator,
{
    /// Creates an idle controller with default safe distances.
    ///
    /// No hardware is touched until [`init`](Self::init) or a command.
    pub fn new(wheels: W, servo_driver: S, timer: T, indicator: I, config: &RobotConfig) -> Self {
        Self {
            wheels,
            servo_driver,
            servo: ServoPositionModel::new(&config.servo),
            timer,
            indicator: Indicator::new(indicator),
            config: config.motion.clone(),
            safety: config.safety.clone(),
            state: MotionState::default(),
            safe: SafeDistances {
                front: config.safety.default_front_cm,
                back: config.safety.default_back_cm,
            },
            outputs: WheelOutputs::ZERO,
            connected: false,
            stats: MotionStats::default(),
        }
    }

    /// Puts the hardware in its startup state: wheels off, servo parked.
    pub fn init(&mut self) -> Result<(), W::Error> {
        self.write(WheelOutputs::ZERO)?;
        self.servo_driver.set_angle(self.servo.current_angle())?;
        self.show_idle();
        Ok(())
    }

    // ========================================================================
    // Maneuvers
    // ========================================================================

    /// Applies `maneuver`, asking `ranging` for clearance when the
    /// interlock runs.
    pub fn execute<G: Ranging>(
        &mut self,
        maneuver: Maneuver,
        mut ranging: G,
    ) -> Result<MotionOutcome, W::Error> {
        if self.state.transitioning {
            self.stats.busy += 1;
            log::debug!("{:?} dropped: direction change in flight", maneuver);
            return Ok(MotionOutcome::Busy);
        }

        let direction = maneuver.direction();
        if self.state.direction != direction {
            return self.change_direction(maneuver, &mut ranging);
        }

        if let Some(side) = direction.guarded_side() {
            if self.config.recheck_interlock_on_speed_update {
                self.aim_servo(side)?;
                if let Some(blocked) = self.check_interlock(side, ranging.range(side)) {
                    return Ok(self.refuse(maneuver, blocked));
                }
            }
        }

        let target = self.target_outputs(maneuver);
        self.write(target)?;
        self.state.maneuver = Some(maneuver);
        self.indicator.show(Glyph::Arrow(maneuver));
        self.stats.speed_updates += 1;
        Ok(MotionOutcome::SpeedUpdated(maneuver))
    }

    /// Drive forward.
    pub fn forward<G: Ranging>(&mut self, ranging: G) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::Forward, ranging)
    }

    /// Drive backward.
    pub fn backward<G: Ranging>(&mut self, ranging: G) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::Backward, ranging)
    }

    /// Pivot left in place.
    pub fn spin_left(&mut self) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::SpinLeft, self.no_clearance())
    }

    /// Pivot right in place.
    pub fn spin_right(&mut self) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::SpinRight, self.no_clearance())
    }

    /// Forward arc to the left.
    pub fn turn_left<G: Ranging>(&mut self, ranging: G) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::TurnLeft, ranging)
    }

    /// Forward arc to the right.
    pub fn turn_right<G: Ranging>(&mut self, ranging: G) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::TurnRight, ranging)
    }

    /// Backward arc to the left.
    pub fn turn_left_backward<G: Ranging>(&mut self, ranging: G) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::TurnLeftBackward, ranging)
    }

    /// Backward arc to the right.
    pub fn turn_right_backward<G: Ranging>(&mut self, ranging: G) -> Result<MotionOutcome, W::Error> {
        self.execute(Maneuver::TurnRightBackward, ranging)
    }

    /// Stops the rover. Safe from any state and never fails.
    ///
    /// Brakes first if the wheels were powered. Custom duties survive so the
    /// next maneuver resumes at the configured speed.
    pub fn stop(&mut self) -> MotionOutcome {
        if self.state.running && self.brake_pulse().is_err() {
            log::error!("brake pulse write failed; zeroing outputs");
        }
        self.halt_outputs();
        self.show_idle();
        self.stats.stops += 1;
        MotionOutcome::Stopped
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Stores custom duties, clamped to `0..=MAX_DUTY`.
    ///
    /// Takes effect on the next maneuver. Zero means "use maximum".
    pub fn set_custom_duties(&mut self, left: i32, right: i32) {
        let clamp = |d: i32| d.clamp(0, i32::from(MAX_DUTY)) as u16;
        self.state.left_duty = clamp(left);
        self.state.right_duty = clamp(right);
    }

    /// Custom duties as `(left, right)`.
    pub fn custom_duties(&self) -> (u16, u16) {
        (self.state.left_duty, self.state.right_duty)
    }

    /// Clears custom duties so maneuvers run at maximum.
    pub fn reset_custom_duties(&mut self) {
        self.state.left_duty = 0;
        self.state.right_duty = 0;
    }

    /// Stores safe distances, each clamped to its configured bounds.
    pub fn set_safe_distances(&mut self, front: i32, back: i32) {
        self.safe.front = self.safety.clamp(Side::Front, front);
        self.safe.back = self.safety.clamp(Side::Back, back);
    }

    /// Current safe distances.
    pub fn safe_distances(&self) -> SafeDistances {
        self.safe
    }

    /// Restores the startup safe distances.
    pub fn reset_safe_distances(&mut self) {
        self.safe = SafeDistances {
            front: self.safety.default_front_cm,
            back: self.safety.default_back_cm,
        };
    }

    /// Moves the servo back to its idle angle and waits for it to settle.
    pub fn park_servo(&mut self) -> Result<(), W::Error> {
        let now = self.timer.now_ms();
        let result = self.servo.park(now);
        self.settle_servo(result)
    }

    /// Completes a servo move whose settle time has passed.
    pub fn update_servo(&mut self) -> bool {
        let now = self.timer.now_ms();
        self.servo.update(now)
    }

    /// Records whether a client is connected (chooses the idle glyph).
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Shows `glyph` on the status indicator if it changed.
    pub fn show(&mut self, glyph: Glyph) {
        self.indicator.show(glyph);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Snapshot of the direction and duty state.
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Current direction of travel.
    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    /// Returns true while the wheels are powered.
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Returns true while a direction change is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.state.transitioning
    }

    /// Last outputs written to the wheels.
    pub fn outputs(&self) -> WheelOutputs {
        self.outputs
    }

    /// Effective `(left, right)` duties after the "0 = maximum" rule.
    pub fn effective_duties(&self) -> (u16, u16) {
        let pick = |d: u16| if d > 0 { d } else { self.config.max_duty };
        (pick(self.state.left_duty), pick(self.state.right_duty))
    }

    /// Counters since startup.
    pub fn stats(&self) -> MotionStats {
        self.stats
    }

    /// Servo position model.
    pub fn servo(&self) -> &ServoPositionModel {
        &self.servo
    }

    /// Borrow the wheel driver.
    pub fn wheels(&self) -> &W {
        &self.wheels
    }

    /// Borrow the servo driver.
    pub fn servo_driver(&self) -> &S {
        &self.servo_driver
    }

    /// Borrow the status indicator.
    pub fn indicator(&self) -> &I {
        self.indicator.inner()
    }

    /// Borrow the timer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_interlock(&self, side: Side, distance_cm: u16) -> Option<Blocked> {
        let threshold_cm = self.safe.get(side);
        (distance_cm < threshold_cm).then_some(Blocked {
            side,
            distance_cm,
            threshold_cm,
        })
    }

    fn refuse(&mut self, maneuver: Maneuver, blocked: Blocked) -> MotionOutcome {
        log::warn!(
            "{:?} refused: {} clearance {}cm < {}cm",
            maneuver,
            blocked.side.as_str(),
            blocked.distance_cm,
            blocked.threshold_cm
        );
        self.stop();
        self.indicator.show(Glyph::Blocked);
        self.stats.blocked += 1;
        MotionOutcome::Blocked(blocked)
    }

    // Spins never look at clearance; any value passes.
    fn no_clearance(&self) -> Clearance {
        Clearance::unknown(u16::MAX)
    }

    fn change_direction<G: Ranging>(
        &mut self,
        maneuver: Maneuver,
        ranging: &mut G,
    ) -> Result<MotionOutcome, W::Error> {
        self.state.transitioning = true;
        let result = self.run_direction_change(maneuver, ranging);
        self.state.transitioning = false;

        match result {
            Ok(Some(blocked)) => Ok(self.refuse(maneuver, blocked)),
            Ok(None) => {
                self.stats.direction_changes += 1;
                log::debug!("now {:?} at {:?}", maneuver, self.outputs);
                Ok(MotionOutcome::Started(maneuver))
            }
            Err(e) => {
                log::error!("direction change to {:?} failed; stopping", maneuver);
                self.halt_outputs();
                Err(e)
            }
        }
    }

    // Wheels are already zero when the interlock runs.
    fn run_direction_change<G: Ranging>(
        &mut self,
        maneuver: Maneuver,
        ranging: &mut G,
    ) -> Result<Option<Blocked>, W::Error> {
        if self.state.running {
            self.brake_pulse()?;
            self.write(WheelOutputs::ZERO)?;
            self.mark_idle();
            self.timer.delay_ms(self.config.brake_settle_ms);
        }

        let direction = maneuver.direction();
        if let Some(side) = direction.guarded_side() {
            self.aim_servo(side)?;
            if let Some(blocked) = self.check_interlock(side, ranging.range(side)) {
                return Ok(Some(blocked));
            }
        }

        let target = self.target_outputs(maneuver);
        for pct in self.config.ramp_percent.into_iter().filter(|&p| p < 100) {
            self.write(target.scaled(pct))?;
            self.timer.delay_ms(self.config.ramp_step_ms);
        }
        self.write(target)?;

        self.state.direction = direction;
        self.state.maneuver = Some(maneuver);
        self.state.running = true;
        self.indicator.show(Glyph::Arrow(maneuver));
        Ok(None)
    }

    fn aim_servo(&mut self, side: Side) -> Result<(), W::Error> {
        let now = self.timer.now_ms();
        let result = self.servo.aim(side, now);
        self.settle_servo(result)
    }

    fn settle_servo(&mut self, result: AimResult) -> Result<(), W::Error> {
        match result {
            AimResult::Started { to, settle_ms, .. } => {
                if let Err(e) = self.servo_driver.set_angle(to) {
                    self.servo.cancel();
                    return Err(e);
                }
                self.timer.delay_ms(settle_ms);
                self.update_servo();
            }
            AimResult::AlreadyAimed => {}
            AimResult::Busy => log::debug!("servo still moving; keeping current aim"),
        }
        Ok(())
    }

    // Reverse polarity at half the mean effective duty, held for brake_ms.
    fn brake_pulse(&mut self) -> Result<(), W::Error> {
        if self.config.brake_ms == 0 {
            return Ok(());
        }
        let (left, right) = self.effective_duties();
        let pulse = ((u32::from(left) + u32::from(right)) / 2 / 2) as u16;
        let reversed = self.outputs.reversed_at(pulse);
        self.write(reversed)?;
        self.timer.delay_ms(self.config.brake_ms);
        Ok(())
    }

    fn target_outputs(&self, maneuver: Maneuver) -> WheelOutputs {
        let (l, r) = self.effective_duties();
        let slow = |d: u16| self.config.inner_wheel(d);
        match maneuver {
            Maneuver::Forward => WheelOutputs::new(l, 0, r, 0),
            Maneuver::Backward => WheelOutputs::new(0, l, 0, r),
            Maneuver::SpinLeft => WheelOutputs::new(l, 0, 0, r),
            Maneuver::SpinRight => WheelOutputs::new(0, l, r, 0),
            Maneuver::TurnLeft => WheelOutputs::new(l, 0, slow(r), 0),
            Maneuver::TurnRight => WheelOutputs::new(slow(l), 0, r, 0),
            Maneuver::TurnLeftBackward => WheelOutputs::new(0, l, 0, slow(r)),
            Maneuver::TurnRightBackward => WheelOutputs::new(0, slow(l), 0, r),
        }
    }

    fn write(&mut self, outputs: WheelOutputs) -> Result<(), W::Error> {
        self.wheels.write(outputs)?;
        self.outputs = outputs;
        Ok(())
    }

    fn halt_outputs(&mut self) {
        if self.write(WheelOutputs::ZERO).is_err() {
            log::error!("failed to zero wheel outputs");
        }
        self.mark_idle();
    }

    fn mark_idle(&mut self) {
        self.state.running = false;
        self.state.direction = Direction::Idle;
        self.state.maneuver = None;
    }

    fn show_idle(&mut self) {
        let glyph = if self.connected {
            Glyph::Ready
        } else {
            Glyph::Offline
        };
        self.indicator.show(glyph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockIndicator, MockServo, MockTimer, MockWheels};

    type TestController = MotionController<MockWheels, MockServo, MockTimer, MockIndicator>;

    const CLEAR: Clearance = Clearance::unknown(999);

    fn controller() -> (TestController, MockTimer) {
        let timer = MockTimer::new();
        let motion = MotionController::new(
            MockWheels::new(),
            MockServo::new(),
            timer.clone(),
            MockIndicator::new(),
            &RobotConfig::default(),
        );
        (motion, timer)
    }

    // =========================================================================
    // Direction Change Tests
    // =========================================================================

    #[test]
    fn forward_from_idle_aims_and_ramps() {
        let (mut motion, timer) = controller();
        let outcome = motion.forward(CLEAR).unwrap();

        assert_eq!(outcome, MotionOutcome::Started(Maneuver::Forward));
        assert_eq!(motion.direction(), Direction::Forward);
        assert!(motion.is_running());
        assert!(!motion.is_transitioning());
        assert_eq!(motion.servo().current_angle(), 0);
        assert_eq!(motion.servo_driver().angle, Some(0));
        assert_eq!(
            motion.wheels().history,
            vec![
                WheelOutputs::new(255, 0, 255, 0),
                WheelOutputs::new(511, 0, 511, 0),
                WheelOutputs::new(1023, 0, 1023, 0),
            ]
        );
        // settle 150 (83 -> 0), then two ramp pauses; no brake from idle
        assert_eq!(timer.delays(), vec![150, 30, 30]);
    }

    #[test]
    fn reversal_brakes_before_reaiming() {
        let (mut motion, timer) = controller();
        motion.forward(CLEAR).unwrap();
        motion.wheels.clear_history();
        timer.clear_delays();

        let outcome = motion.backward(CLEAR).unwrap();
        assert_eq!(outcome, MotionOutcome::Started(Maneuver::Backward));
        assert_eq!(motion.direction(), Direction::Backward);
        assert_eq!(
            motion.wheels().history,
            vec![
                WheelOutputs::new(0, 511, 0, 511),
                WheelOutputs::ZERO,
                WheelOutputs::new(0, 255, 0, 255),
                WheelOutputs::new(0, 511, 0, 511),
                WheelOutputs::new(0, 1023, 0, 1023),
            ]
        );
        // brake 100, settle 20, servo 0 -> 173 is a long move
        assert_eq!(timer.delays(), vec![100, 20, 200, 30, 30]);
        assert_eq!(motion.servo().current_angle(), 173);
    }

    #[test]
    fn same_direction_is_speed_update_only() {
        let (mut motion, timer) = controller();
        motion.forward(CLEAR).unwrap();
        motion.set_custom_duties(600, 700);
        motion.wheels.clear_history();
        timer.clear_delays();

        let outcome = motion.forward(CLEAR).unwrap();
        assert_eq!(outcome, MotionOutcome::SpeedUpdated(Maneuver::Forward));
        assert_eq!(motion.wheels().history, vec![WheelOutputs::new(600, 0, 700, 0)]);
        assert!(timer.delays().is_empty());
        assert_eq!(motion.servo_driver().history.len(), 1);
    }

    #[test]
    fn turn_from_forward_reshapes_without_brake() {
        let (mut motion, timer) = controller();
        motion.forward(CLEAR).unwrap();
        timer.clear_delays();

        let outcome = motion.turn_left(CLEAR).unwrap();
        assert_eq!(outcome, MotionOutcome::SpeedUpdated(Maneuver::TurnLeft));
        assert_eq!(motion.outputs(), WheelOutputs::new(1023, 0, 409, 0));
        assert_eq!(motion.state().maneuver, Some(Maneuver::TurnLeft));
        assert!(timer.delays().is_empty());
    }

    #[test]
    fn turn_patterns_scale_one_wheel() {
        let (motion, _) = controller();
        assert_eq!(motion.target_outputs(Maneuver::TurnRight), WheelOutputs::new(409, 0, 1023, 0));
        assert_eq!(
            motion.target_outputs(Maneuver::TurnLeftBackward),
            WheelOutputs::new(0, 1023, 0, 409)
        );
        assert_eq!(
            motion.target_outputs(Maneuver::TurnRightBackward),
            WheelOutputs::new(0, 409, 0, 1023)
        );
    }

    #[test]
    fn spin_skips_servo_and_interlock() {
        let (mut motion, _) = controller();
        let outcome = motion.spin_left().unwrap();
        assert_eq!(outcome, MotionOutcome::Started(Maneuver::SpinLeft));
        assert_eq!(motion.outputs(), WheelOutputs::new(1023, 0, 0, 1023));
        assert!(motion.servo_driver().history.is_empty());
        assert_eq!(motion.servo().current_angle(), 83);
    }

    #[test]
    fn spin_reversal_brakes() {
        let (mut motion, _) = controller();
        motion.spin_left().unwrap();
        motion.wheels.clear_history();
        motion.spin_right().unwrap();
        assert_eq!(motion.wheels().history[0], WheelOutputs::new(0, 511, 511, 0));
        assert_eq!(motion.wheels().history[1], WheelOutputs::ZERO);
        assert_eq!(motion.outputs(), WheelOutputs::new(0, 1023, 1023, 0));
    }

    // =========================================================================
    // Interlock Tests
    // =========================================================================

    #[test]
    fn blocked_forward_stops_and_shows_blocked() {
        let (mut motion, _) = controller();
        let outcome = motion.forward(Clearance::new(39, 999)).unwrap();
        assert_eq!(
            outcome,
            MotionOutcome::Blocked(Blocked {
                side: Side::Front,
                distance_cm: 39,
                threshold_cm: 40
            })
        );
        assert_eq!(motion.direction(), Direction::Idle);
        assert!(motion.outputs().is_zero());
        assert_eq!(motion.indicator().last(), Some(Glyph::Blocked));
        assert_eq!(motion.stats().blocked, 1);
        assert_eq!(motion.stats().stops, 1);
    }

    #[test]
    fn reversal_checks_back_after_reaiming() {
        let (mut motion, timer) = controller();
        motion.forward(CLEAR).unwrap();
        motion.wheels.clear_history();
        timer.clear_delays();

        let outcome = motion.backward(Clearance::new(999, 15)).unwrap();
        assert!(matches!(outcome, MotionOutcome::Blocked(b) if b.side == Side::Back));
        // brake, zero, refusal zero; no ramp
        assert_eq!(
            motion.wheels().history,
            vec![WheelOutputs::new(0, 511, 0, 511), WheelOutputs::ZERO, WheelOutputs::ZERO]
        );
        assert_eq!(timer.delays(), vec![100, 20, 200]);
        assert_eq!(motion.servo().current_angle(), 173);
        assert_eq!(motion.direction(), Direction::Idle);
    }

    #[derive(Default)]
    struct AskedSides(Vec<Side>);

    impl Ranging for AskedSides {
        fn range(&mut self, side: Side) -> u16 {
            self.0.push(side);
            999
        }
    }

    #[test]
    fn ranging_asked_only_for_guarded_side() {
        let (mut motion, _) = controller();
        let mut asked = AskedSides::default();
        motion.execute(Maneuver::SpinLeft, &mut asked).unwrap();
        assert!(asked.0.is_empty());

        motion.execute(Maneuver::TurnRightBackward, &mut asked).unwrap();
        assert_eq!(asked.0, vec![Side::Back]);
        assert_eq!(motion.servo().aimed_side(), Some(Side::Back));
    }

    #[test]
    fn threshold_equal_is_not_blocked() {
        let (mut motion, _) = controller();
        let outcome = motion.backward(Clearance::new(999, 40)).unwrap();
        assert_eq!(outcome, MotionOutcome::Started(Maneuver::Backward));
    }

    #[test]
    fn speed_update_rechecks_by_default() {
        let (mut motion, _) = controller();
        motion.forward(CLEAR).unwrap();
        let outcome = motion.forward(Clearance::new(10, 999)).unwrap();
        assert!(matches!(outcome, MotionOutcome::Blocked(_)));
        assert_eq!(motion.direction(), Direction::Idle);
    }

    #[test]
    fn speed_update_recheck_can_be_disabled() {
        let timer = MockTimer::new();
        let config = RobotConfig::default()
            .with_motion(MotionConfig::default().with_recheck_on_speed_update(false));
        let mut motion = MotionController::new(
            MockWheels::new(),
            MockServo::new(),
            timer,
            MockIndicator::new(),
            &config,
        );
        motion.forward(CLEAR).unwrap();
        let outcome = motion.forward(Clearance::new(10, 999)).unwrap();
        assert_eq!(outcome, MotionOutcome::SpeedUpdated(Maneuver::Forward));
    }

    #[test]
    fn busy_while_transitioning() {
        let (mut motion, _) = controller();
        motion.state.transitioning = true;
        let outcome = motion.forward(CLEAR).unwrap();
        assert_eq!(outcome, MotionOutcome::Busy);
        assert!(motion.wheels().history.is_empty());
        assert_eq!(motion.stats().busy, 1);
    }

    // =========================================================================
    // Stop Tests
    // =========================================================================

    #[test]
    fn stop_while_running_brakes_then_zeroes() {
        let (mut motion, timer) = controller();
        motion.forward(CLEAR).unwrap();
        motion.wheels.clear_history();
        timer.clear_delays();

        assert_eq!(motion.stop(), MotionOutcome::Stopped);
        assert_eq!(
            motion.wheels().history,
            vec![WheelOutputs::new(0, 511, 0, 511), WheelOutputs::ZERO]
        );
        assert_eq!(timer.delays(), vec![100]);
        assert_eq!(motion.direction(), Direction::Idle);
        assert!(!motion.is_running());
    }

    #[test]
    fn stop_when_idle_only_zeroes() {
        let (mut motion, timer) = controller();
        motion.stop();
        assert_eq!(motion.wheels().history, vec![WheelOutputs::ZERO]);
        assert!(timer.delays().is_empty());
    }

    #[test]
    fn stop_keeps_custom_duties() {
        let (mut motion, _) = controller();
        motion.set_custom_duties(300, 400);
        motion.forward(CLEAR).unwrap();
        motion.stop();
        assert_eq!(motion.custom_duties(), (300, 400));
        motion.forward(CLEAR).unwrap();
        assert_eq!(motion.outputs(), WheelOutputs::new(300, 0, 400, 0));
    }

    #[test]
    fn stop_survives_write_failure() {
        let timer = MockTimer::new();
        let mut motion = MotionController::new(
            MockWheels::new().failing(2),
            MockServo::new(),
            timer,
            MockIndicator::new(),
            &RobotConfig::default(),
        );
        motion.state.running = true;
        motion.state.direction = Direction::Forward;
        assert_eq!(motion.stop(), MotionOutcome::Stopped);
        assert_eq!(motion.direction(), Direction::Idle);
        assert!(!motion.is_running());
    }

    #[test]
    fn failed_ramp_clears_guard_and_halts() {
        let timer = MockTimer::new();
        let mut motion = MotionController::new(
            MockWheels::new().failing(1),
            MockServo::new(),
            timer,
            MockIndicator::new(),
            &RobotConfig::default(),
        );
        assert!(motion.forward(CLEAR).is_err());
        assert!(!motion.is_transitioning());
        assert!(!motion.is_running());
        assert_eq!(motion.direction(), Direction::Idle);
        assert!(motion.outputs().is_zero());
    }

    #[test]
    fn stop_glyph_depends_on_connection() {
        let (mut motion, _) = controller();
        motion.stop();
        assert_eq!(motion.indicator().last(), Some(Glyph::Offline));
        motion.set_connected(true);
        motion.stop();
        assert_eq!(motion.indicator().last(), Some(Glyph::Ready));
    }

    // =========================================================================
    // Settings Tests
    // =========================================================================

    #[test]
    fn custom_duties_clamped() {
        let (mut motion, _) = controller();
        motion.set_custom_duties(-5, 5000);
        assert_eq!(motion.custom_duties(), (0, 1023));
        assert_eq!(motion.effective_duties(), (1023, 1023));
        motion.set_custom_duties(200, 0);
        assert_eq!(motion.effective_duties(), (200, 1023));
        motion.reset_custom_duties();
        assert_eq!(motion.custom_duties(), (0, 0));
    }

    #[test]
    fn safe_distances_clamped_and_reset() {
        let (mut motion, _) = controller();
        motion.set_safe_distances(5, 500);
        assert_eq!(motion.safe_distances(), SafeDistances { front: 20, back: 100 });
        motion.reset_safe_distances();
        assert_eq!(motion.safe_distances(), SafeDistances { front: 40, back: 40 });
    }

    #[test]
    fn init_parks_servo_and_zeroes() {
        let (mut motion, _) = controller();
        motion.init().unwrap();
        assert_eq!(motion.servo_driver().angle, Some(83));
        assert!(motion.outputs().is_zero());
        assert_eq!(motion.indicator().last(), Some(Glyph::Offline));
    }

    #[test]
    fn park_servo_after_forward() {
        let (mut motion, timer) = controller();
        motion.forward(CLEAR).unwrap();
        timer.clear_delays();
        motion.park_servo().unwrap();
        assert_eq!(motion.servo().current_angle(), 83);
        assert_eq!(timer.delays(), vec![150]);
    }
}
