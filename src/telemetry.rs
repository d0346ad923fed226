//! Outbound telemetry lines.
//!
//! Once per telemetry tick the rover reports board temperature and the
//! clearance on the side the sonar faces, as one newline-terminated JSON
//! object:
//!
//! ```text
//! {"cpu":24,"front":57,"back":null}
//! ```
//!
//! A line is produced only while a client is connected and only when some
//! field changed since the last line. The side the sonar is not aimed at, and
//! a side with no reading yet, are `null`.

use heapless::String;
use serde::Serialize;

use crate::sonar::Clearance;

/// Capacity of one telemetry line including the trailing newline.
pub const LINE_CAPACITY: usize = 64;

/// One telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    /// Board temperature in degrees Celsius.
    pub cpu: i16,
    /// Front clearance in centimeters.
    pub front: Option<u16>,
    /// Back clearance in centimeters.
    pub back: Option<u16>,
}

impl Telemetry {
    /// Builds a sample, mapping the unknown sentinel to `None`.
    pub fn new(cpu: i16, clearance: Clearance, unknown_cm: u16) -> Self {
        let known = |cm: u16| (cm != unknown_cm).then_some(cm);
        Self {
            cpu,
            front: known(clearance.front),
            back: known(clearance.back),
        }
    }

    /// Serializes the sample as one JSON line.
    pub fn to_line(&self) -> Option<String<LINE_CAPACITY>> {
        let mut line: String<LINE_CAPACITY> = serde_json_core::to_string(self).ok()?;
        line.push('\n').ok()?;
        Some(line)
    }
}

/// Change-only telemetry emitter.
#[derive(Debug, Clone)]
pub struct TelemetryReporter {
    interval_ms: u64,
    last_tick_ms: Option<u64>,
    last_sent: Option<Telemetry>,
}

impl TelemetryReporter {
    /// Creates a reporter that ticks every `interval_ms`.
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms.max(1)),
            last_tick_ms: None,
            last_sent: None,
        }
    }

    /// Returns true and starts a new period if a tick is due at `now_ms`.
    pub fn tick_due(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_tick_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.interval_ms);
        if due {
            self.last_tick_ms = Some(now_ms);
        }
        due
    }

    /// Returns the line to send for `sample`, if any.
    pub fn report(&mut self, connected: bool, sample: Telemetry) -> Option<String<LINE_CAPACITY>> {
        if !connected || self.last_sent == Some(sample) {
            return None;
        }
        let line = sample.to_line();
        if line.is_none() {
            log::error!("telemetry line did not fit in {} bytes", LINE_CAPACITY);
            return None;
        }
        self.last_sent = Some(sample);
        line
    }

    /// Forgets the last sample so the next report is always sent.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cpu: i16, front: u16, back: u16) -> Telemetry {
        Telemetry::new(cpu, Clearance::new(front, back), 999)
    }

    #[test]
    fn line_format() {
        let line = sample(24, 57, 999).to_line().unwrap();
        assert_eq!(line.as_str(), "{\"cpu\":24,\"front\":57,\"back\":null}\n");
    }

    #[test]
    fn only_when_connected() {
        let mut reporter = TelemetryReporter::new(1000);
        assert!(reporter.report(false, sample(20, 50, 60)).is_none());
        assert!(reporter.report(true, sample(20, 50, 60)).is_some());
    }

    #[test]
    fn only_when_changed() {
        let mut reporter = TelemetryReporter::new(1000);
        assert!(reporter.report(true, sample(20, 50, 60)).is_some());
        assert!(reporter.report(true, sample(20, 50, 60)).is_none());
        assert!(reporter.report(true, sample(21, 50, 60)).is_some());
        assert!(reporter.report(true, sample(21, 50, 61)).is_some());
        reporter.reset();
        assert!(reporter.report(true, sample(21, 50, 61)).is_some());
    }

    #[test]
    fn tick_cadence() {
        let mut reporter = TelemetryReporter::new(1000);
        assert!(reporter.tick_due(0));
        assert!(!reporter.tick_due(999));
        assert!(reporter.tick_due(1000));
        assert!(!reporter.tick_due(1500));
    }
}
