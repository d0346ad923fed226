//! Sonar distance filtering with retry, median-of-3 and hold-last-good.
//!
//! One ultrasonic sensor sits on the aiming servo, so it measures the front
//! or the back depending on where it points. [`DistanceFilter`] turns its
//! noisy pings into a per-side reading that never gets worse than "stale":
//!
//! 1. A *burst* pings up to `1 + retries` times and keeps the first echo.
//! 2. Three bursts are taken and the middle value is the candidate.
//! 3. A candidate of zero or outside `[min_cm, max_cm]` is discarded and the
//!    held value for that side is returned unchanged.
//!
//! Before the first valid reading each side holds `unknown_cm`, which is far
//! enough that it never trips the interlock.
//!
//! ```rust
//! use rs_rover::sonar::{median_of_3, DistanceFilter};
//! use rs_rover::config::SonarConfig;
//! use rs_rover::hal::{MockSonar, MockTimer};
//! use rs_rover::traits::Side;
//!
//! assert_eq!(median_of_3(5, 999, 6), 6);
//!
//! let mut sonar = MockSonar::new();
//! sonar.queue_pings(&[Some(5), Some(999), Some(6)]);
//! let mut filter = DistanceFilter::new(sonar, MockTimer::new(), &SonarConfig::default());
//! assert_eq!(filter.sample(Side::Front), 6);
//! assert_eq!(filter.last_good(Side::Front), 6);
//! assert_eq!(filter.last_good(Side::Back), 999);
//! ```

use crate::config::SonarConfig;
use crate::traits::{Delay, RangeSensor, Side};

/// Where the motion interlock gets its clearance from.
///
/// The controller asks only after the sonar points at `side`, so a
/// [`DistanceFilter`] answers with a fresh measurement. A [`Clearance`]
/// snapshot answers with its fixed values, which is what the unit tests use.
pub trait Ranging {
    /// Clearance on `side` in centimeters.
    fn range(&mut self, side: Side) -> u16;
}

impl<G: Ranging + ?Sized> Ranging for &mut G {
    fn range(&mut self, side: Side) -> u16 {
        (**self).range(side)
    }
}

/// Middle value of three readings.
pub fn median_of_3(a: u16, b: u16, c: u16) -> u16 {
    let mut v = [a, b, c];
    v.sort_unstable();
    v[1]
}

/// Held clearance per side, in centimeters.
///
/// This is what the motion interlock compares against the safe distances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clearance {
    /// Clearance ahead.
    pub front: u16,
    /// Clearance behind.
    pub back: u16,
}

impl Clearance {
    /// Both sides at the given value.
    pub const fn unknown(sentinel_cm: u16) -> Self {
        Self {
            front: sentinel_cm,
            back: sentinel_cm,
        }
    }

    /// Explicit readings.
    pub const fn new(front: u16, back: u16) -> Self {
        Self { front, back }
    }

    /// Clearance on `side`.
    pub const fn get(&self, side: Side) -> u16 {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }
}

impl Ranging for Clearance {
    fn range(&mut self, side: Side) -> u16 {
        self.get(side)
    }
}

/// Retry-robust, median-filtered range reading per side.
pub struct DistanceFilter<R: RangeSensor, D: Delay> {
    sensor: R,
    delay: D,
    config: SonarConfig,
    held: Clearance,
}

impl<R: RangeSensor, D: Delay> DistanceFilter<R, D> {
    /// Creates a filter with both sides holding `config.unknown_cm`.
    pub fn new(sensor: R, delay: D, config: &SonarConfig) -> Self {
        Self {
            sensor,
            delay,
            config: config.clone(),
            held: Clearance::unknown(config.unknown_cm),
        }
    }

    /// Measures `side` and returns the filtered distance.
    ///
    /// Never fails: a bad measurement returns the held value for `side`.
    pub fn sample(&mut self, side: Side) -> u16 {
        let a = self.burst();
        let b = self.burst();
        let c = self.burst();
        self.accept(side, median_of_3(a, b, c))
    }

    /// Applies the range check and hold-last-good policy to a candidate.
    pub fn accept(&mut self, side: Side, candidate: u16) -> u16 {
        if !self.config.is_plausible(candidate) {
            log::debug!(
                "sonar {}: discarding {}cm, holding {}cm",
                side.as_str(),
                candidate,
                self.held.get(side)
            );
            return self.held.get(side);
        }
        match side {
            Side::Front => self.held.front = candidate,
            Side::Back => self.held.back = candidate,
        }
        candidate
    }

    /// Last valid reading for `side` (or the unknown sentinel).
    pub fn last_good(&self, side: Side) -> u16 {
        self.held.get(side)
    }

    /// Snapshot of the held readings for both sides.
    pub fn clearance(&self) -> Clearance {
        self.held
    }

    /// Borrow the sensor.
    pub fn sensor(&self) -> &R {
        &self.sensor
    }

    /// Mutably borrow the sensor.
    pub fn sensor_mut(&mut self) -> &mut R {
        &mut self.sensor
    }

    // One retried ping: first nonzero echo wins, zero if none.
    fn burst(&mut self) -> u16 {
        for _ in 0..=self.config.retries {
            self.delay.delay_ms(self.config.ping_settle_ms);
            match self.sensor.ping_cm() {
                Some(cm) if cm > 0 => return cm,
                _ => self.delay.delay_ms(self.config.retry_pause_ms),
            }
        }
        0
    }
}

impl<R: RangeSensor, D: Delay> Ranging for DistanceFilter<R, D> {
    fn range(&mut self, side: Side) -> u16 {
        self.sample(side)
    }
}
