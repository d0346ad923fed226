//! Command dispatch: settings messages, motion tokens and debouncing.
//!
//! Every inbound line goes through [`CommandDispatcher::dispatch`]:
//!
//! 1. Try it as a settings object ([`parse_settings`]). Each complete pair
//!    (`l`+`r`, `f`+`b`) is validated and applied on its own. An
//!    out-of-range pair is rejected whole, never clamped.
//! 2. If at least one pair was applied the line is consumed.
//! 3. Otherwise the raw text is a motion token. It passes the [`Debounce`]
//!    window and then drives the [`MotionController`]. Unknown tokens stop.
//!
//! # Debounce
//!
//! - The same token as last time always runs and leaves the window alone.
//! - A travel token (`1 2 5 6 7 8`) right after a *different* travel token
//!   is dropped until `debounce_ms` has passed since that one was accepted.
//! - Spins and stop are never dropped (they still become "last token").
//!
//! ```rust
//! use rs_rover::dispatcher::Debounce;
//! use rs_rover::{Maneuver, MotionToken};
//!
//! let mut debounce = Debounce::new(150);
//! let fwd = MotionToken::Move(Maneuver::Forward);
//! let back = MotionToken::Move(Maneuver::Backward);
//!
//! assert!(debounce.should_accept(fwd, 0));
//! assert!(debounce.should_accept(fwd, 10));    // repeat: always
//! assert!(!debounce.should_accept(back, 100)); // conflicting, too soon
//! assert!(debounce.should_accept(back, 150));  // window elapsed
//! ```

use crate::commands::{MotionOutcome, MotionToken};
use crate::config::{DispatchConfig, SafetyConfig};
use crate::messages::{parse_settings, SettingsMessage, SettingsParse};
use crate::motion::MotionController;
use crate::sonar::Ranging;
use crate::traits::{ServoDriver, Side, StatusIndicator, Timer, WheelDriver, MAX_DUTY};

// ============================================================================
// Outcomes
// ============================================================================

/// What happened to one half of a settings message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PairStatus {
    /// One or both keys were missing.
    #[default]
    Absent,
    /// Both values were in range and stored.
    Applied,
    /// At least one value was out of range; nothing was stored.
    Rejected,
}

/// Per-pair result of applying a settings message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettingsReport {
    /// Custom duty pair (`l`, `r`).
    pub duties: PairStatus,
    /// Safe distance pair (`f`, `b`).
    pub distances: PairStatus,
}

impl SettingsReport {
    /// True if either pair was stored, which consumes the message.
    pub fn any_applied(&self) -> bool {
        self.duties == PairStatus::Applied || self.distances == PairStatus::Applied
    }
}

/// Result of dispatching one inbound line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The line was a settings message and at least one pair was applied.
    Settings(SettingsReport),
    /// The line ran as a motion token.
    Motion(MotionToken, MotionOutcome),
    /// The token was dropped by the debounce window.
    Debounced(MotionToken),
}

// ============================================================================
// Debounce
// ============================================================================

/// Drops conflicting travel tokens that arrive too close together.
#[derive(Clone, Debug)]
pub struct Debounce {
    window_ms: u64,
    last: Option<MotionToken>,
    last_ms: u64,
}

impl Debounce {
    /// Creates a debouncer with the given window.
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: u64::from(window_ms),
            last: None,
            last_ms: 0,
        }
    }

    /// Decides whether `token` runs, updating the window when it is new.
    pub fn should_accept(&mut self, token: MotionToken, now_ms: u64) -> bool {
        if self.last == Some(token) {
            return true;
        }

        let conflicting = token.is_travel() && self.last.is_some_and(|t| t.is_travel());
        if conflicting && now_ms.saturating_sub(self.last_ms) < self.window_ms {
            return false;
        }

        self.last = Some(token);
        self.last_ms = now_ms;
        true
    }

    /// Last accepted token, if any.
    pub fn last(&self) -> Option<MotionToken> {
        self.last
    }

    /// Forgets the last token so the next one always runs.
    pub fn reset(&mut self) {
        self.last = None;
        self.last_ms = 0;
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Classifies inbound lines and forwards them to the motion controller.
#[derive(Clone, Debug)]
pub struct CommandDispatcher {
    safety: SafetyConfig,
    debounce: Debounce,
}

impl CommandDispatcher {
    /// Creates a dispatcher. `safety` supplies the distance bounds used to
    /// validate `f`/`b`.
    pub fn new(config: &DispatchConfig, safety: &SafetyConfig) -> Self {
        Self {
            safety: safety.clone(),
            debounce: Debounce::new(config.debounce_ms),
        }
    }

    /// Handles one inbound line.
    ///
    /// `ranging` answers the interlock if the line turns out to be a travel
    /// token.
    pub fn dispatch<W, S, T, I, G>(
        &mut self,
        raw: &str,
        now_ms: u64,
        motion: &mut MotionController<W, S, T, I>,
        ranging: G,
    ) -> Result<DispatchOutcome, W::Error>
    where
        W: WheelDriver,
        S: ServoDriver<Error = W::Error>,
        T: Timer,
        I: StatusIndicator,
        G: Ranging,
    {
        if let SettingsParse::Settings(msg) = parse_settings(raw) {
            let report = self.apply_settings(&msg, motion);
            if report.any_applied() {
                return Ok(DispatchOutcome::Settings(report));
            }
            log::debug!("settings message applied nothing; treating as token");
        }

        let token = MotionToken::parse(raw);
        if !self.debounce.should_accept(token, now_ms) {
            log::debug!("debounced {:?} at {}ms", token, now_ms);
            return Ok(DispatchOutcome::Debounced(token));
        }

        let outcome = match token {
            MotionToken::Move(maneuver) => motion.execute(maneuver, ranging)?,
            MotionToken::Stop => motion.stop(),
        };
        Ok(DispatchOutcome::Motion(token, outcome))
    }

    /// Validates and applies each complete pair in `msg`.
    pub fn apply_settings<W, S, T, I>(
        &self,
        msg: &SettingsMessage,
        motion: &mut MotionController<W, S, T, I>,
    ) -> SettingsReport
    where
        W: WheelDriver,
        S: ServoDriver<Error = W::Error>,
        T: Timer,
        I: StatusIndicator,
    {
        let mut report = SettingsReport::default();

        if let Some((l, r)) = msg.duty_pair() {
            let max = f64::from(MAX_DUTY);
            let valid = |d: f64| is_whole(d) && (0.0..=max).contains(&d);
            if valid(l) && valid(r) {
                motion.set_custom_duties(l as i32, r as i32);
                log::info!("custom duties set to ({}, {})", l as i32, r as i32);
                report.duties = PairStatus::Applied;
            } else {
                log::warn!("rejected duties ({}, {}): not whole numbers in 0..={}", l, r, MAX_DUTY);
                report.duties = PairStatus::Rejected;
            }
        }

        if let Some((f, b)) = msg.distance_pair() {
            let valid = |side, d: f64| is_whole(d) && self.safety.accepts(side, d);
            if valid(Side::Front, f) && valid(Side::Back, b) {
                motion.set_safe_distances(f as i32, b as i32);
                log::info!("safe distances set to front {}cm, back {}cm", f as i32, b as i32);
                report.distances = PairStatus::Applied;
            } else {
                log::warn!("rejected safe distances ({}, {}): out of bounds", f, b);
                report.distances = PairStatus::Rejected;
            }
        }

        report
    }

    /// Borrow the debouncer.
    pub fn debounce(&self) -> &Debounce {
        &self.debounce
    }

    /// Clears the debounce history.
    pub fn reset(&mut self) {
        self.debounce.reset();
    }
}

// Settings keys are integers on the wire.
fn is_whole(value: f64) -> bool {
    value.is_finite() && value == (value as i64) as f64
}
