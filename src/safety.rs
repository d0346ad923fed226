//! Periodic safety interlock.
//!
//! [`SafetyMonitor`] runs on a fixed tick, independent of inbound commands.
//! Each tick it:
//!
//! 1. Completes any servo move whose settle time has passed.
//! 2. Samples the side the sonar is aimed at. The other side is unknown for
//!    this tick. With the servo parked or still moving, nothing is sampled.
//! 3. Stops the rover if it travels toward the sampled side and the reading
//!    is below that side's safe distance.
//!
//! An unknown side never triggers a stop.

use crate::motion::MotionController;
use crate::sonar::DistanceFilter;
use crate::traits::{Delay, RangeSensor, ServoDriver, Side, StatusIndicator, Timer, WheelDriver};

/// What one safety tick saw and did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SafetyReport {
    /// Side that was sampled, if the sonar was aimed.
    pub aimed: Option<Side>,
    /// Fresh front reading, `None` when not sampled this tick.
    pub front: Option<u16>,
    /// Fresh back reading, `None` when not sampled this tick.
    pub back: Option<u16>,
    /// True if this tick stopped the rover.
    pub stopped: bool,
}

impl SafetyReport {
    /// Reading for `side` this tick.
    pub fn reading(&self, side: Side) -> Option<u16> {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }
}

/// Fixed-period clearance check that can stop the rover on its own.
#[derive(Clone, Debug)]
pub struct SafetyMonitor {
    interval_ms: u64,
    last_tick_ms: Option<u64>,
    stops: u32,
}

impl SafetyMonitor {
    /// Creates a monitor that ticks every `interval_ms`.
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms.max(1)),
            last_tick_ms: None,
            stops: 0,
        }
    }

    /// Returns true if a tick is due at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_tick_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Runs a tick if one is due.
    pub fn poll<W, S, T, I, R, D>(
        &mut self,
        now_ms: u64,
        motion: &mut MotionController<W, S, T, I>,
        filter: &mut DistanceFilter<R, D>,
    ) -> Option<SafetyReport>
    where
        W: WheelDriver,
        S: ServoDriver<Error = W::Error>,
        T: Timer,
        I: StatusIndicator,
        R: RangeSensor,
        D: Delay,
    {
        if !self.is_due(now_ms) {
            return None;
        }
        self.last_tick_ms = Some(now_ms);
        Some(self.tick(motion, filter))
    }

    /// Runs one tick unconditionally.
    pub fn tick<W, S, T, I, R, D>(
        &mut self,
        motion: &mut MotionController<W, S, T, I>,
        filter: &mut DistanceFilter<R, D>,
    ) -> SafetyReport
    where
        W: WheelDriver,
        S: ServoDriver<Error = W::Error>,
        T: Timer,
        I: StatusIndicator,
        R: RangeSensor,
        D: Delay,
    {
        motion.update_servo();

        let mut report = SafetyReport::default();
        let Some(side) = motion.servo().aimed_side() else {
            return report;
        };

        let distance = filter.sample(side);
        report.aimed = Some(side);
        match side {
            Side::Front => report.front = Some(distance),
            Side::Back => report.back = Some(distance),
        }

        if motion.direction().guarded_side() == Some(side) {
            let threshold = motion.safe_distances().get(side);
            if distance < threshold {
                log::warn!(
                    "safety stop: {} clearance {}cm < {}cm while {}",
                    side.as_str(),
                    distance,
                    threshold,
                    motion.direction().as_str()
                );
                motion.stop();
                self.stops += 1;
                report.stopped = true;
            }
        }

        report
    }

    /// Number of stops this monitor has forced.
    pub fn stops(&self) -> u32 {
        self.stops
    }
}
