//! Position model for the sonar aiming servo.
//!
//! Hobby servos give no position feedback, so the model assumes a move
//! takes a fixed settle time (longer for large swings). Until that time has
//! elapsed the reported angle is still the pre-move angle and no side is
//! aimable.
//!
//! The model is state-tracked: [`ServoPositionModel::aim`] starts a move and
//! [`ServoPositionModel::update`] completes it once the settle time has
//! passed. The motion controller waits out the settle time with a blocking
//! pause and then calls `update`.

use crate::config::ServoConfig;
use crate::traits::Side;

/// Result of asking the servo to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AimResult {
    /// The servo already rests at that angle.
    AlreadyAimed,
    /// A move is in flight; the request was ignored.
    Busy,
    /// A move started.
    Started {
        /// Angle before the move.
        from: u8,
        /// Commanded angle.
        to: u8,
        /// Time to wait before the new angle is trusted.
        settle_ms: u32,
    },
}

/// Angle bookkeeping for one aiming servo.
#[derive(Clone, Debug)]
pub struct ServoPositionModel {
    config: ServoConfig,
    current_angle: u8,
    target_angle: u8,
    moving: bool,
    move_started_at: u64,
    settle_ms: u32,
}

impl ServoPositionModel {
    /// Creates a model resting at the idle angle.
    pub fn new(config: &ServoConfig) -> Self {
        Self {
            config: config.clone(),
            current_angle: config.idle_angle,
            target_angle: config.idle_angle,
            moving: false,
            move_started_at: 0,
            settle_ms: 0,
        }
    }

    /// Requests a move that aims the sonar at `side`.
    pub fn aim(&mut self, side: Side, now_ms: u64) -> AimResult {
        self.move_to(self.config.angle_for(side), now_ms)
    }

    /// Requests a move back to the idle angle.
    pub fn park(&mut self, now_ms: u64) -> AimResult {
        self.move_to(self.config.idle_angle, now_ms)
    }

    /// Requests a move to `angle` (clamped to 180).
    pub fn move_to(&mut self, angle: u8, now_ms: u64) -> AimResult {
        let angle = angle.min(180);
        if self.moving {
            return AimResult::Busy;
        }
        if angle == self.current_angle {
            return AimResult::AlreadyAimed;
        }
        let settle_ms = self.config.settle_for(self.current_angle, angle);
        self.target_angle = angle;
        self.moving = true;
        self.move_started_at = now_ms;
        self.settle_ms = settle_ms;
        AimResult::Started {
            from: self.current_angle,
            to: angle,
            settle_ms,
        }
    }

    /// Completes an in-flight move once its settle time has elapsed.
    ///
    /// Returns true if a move completed on this call.
    pub fn update(&mut self, now_ms: u64) -> bool {
        if !self.moving {
            return false;
        }
        let elapsed = now_ms.saturating_sub(self.move_started_at);
        if elapsed < u64::from(self.settle_ms) {
            return false;
        }
        self.current_angle = self.target_angle;
        self.moving = false;
        true
    }

    /// Abandons an in-flight move; the servo keeps its pre-move angle.
    ///
    /// Used when the servo write itself failed.
    pub fn cancel(&mut self) {
        self.target_angle = self.current_angle;
        self.moving = false;
    }

    /// Trusted angle. During a move this is still the pre-move angle.
    pub fn current_angle(&self) -> u8 {
        self.current_angle
    }

    /// Angle of the last commanded move.
    pub fn target_angle(&self) -> u8 {
        self.target_angle
    }

    /// Returns true while a move is in flight.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Side the sonar can measure right now, if any.
    ///
    /// `None` while moving or when parked at the idle angle.
    pub fn aimed_side(&self) -> Option<Side> {
        if self.moving {
            None
        } else if self.current_angle == self.config.forward_angle {
            Some(Side::Front)
        } else if self.current_angle == self.config.backward_angle {
            Some(Side::Back)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ServoPositionModel {
        ServoPositionModel::new(&ServoConfig::default())
    }

    #[test]
    fn starts_parked_and_unaimed() {
        let servo = model();
        assert_eq!(servo.current_angle(), 83);
        assert!(!servo.is_moving());
        assert_eq!(servo.aimed_side(), None);
    }

    #[test]
    fn aim_starts_move_with_short_settle() {
        let mut servo = model();
        let result = servo.aim(Side::Front, 1000);
        assert_eq!(
            result,
            AimResult::Started {
                from: 83,
                to: 0,
                settle_ms: 150
            }
        );
        assert!(servo.is_moving());
        assert_eq!(servo.target_angle(), 0);
    }

    #[test]
    fn reads_pre_move_angle_until_settled() {
        let mut servo = model();
        servo.aim(Side::Front, 1000);
        assert!(!servo.update(1149));
        assert_eq!(servo.current_angle(), 83);
        assert_eq!(servo.aimed_side(), None);

        assert!(servo.update(1150));
        assert_eq!(servo.current_angle(), 0);
        assert_eq!(servo.aimed_side(), Some(Side::Front));
    }

    #[test]
    fn large_swing_uses_long_settle() {
        let mut servo = model();
        servo.aim(Side::Front, 0);
        servo.update(150);
        let result = servo.aim(Side::Back, 200);
        assert_eq!(
            result,
            AimResult::Started {
                from: 0,
                to: 173,
                settle_ms: 200
            }
        );
        assert!(!servo.update(399));
        assert!(servo.update(400));
        assert_eq!(servo.aimed_side(), Some(Side::Back));
    }

    #[test]
    fn no_new_move_while_moving() {
        let mut servo = model();
        servo.aim(Side::Front, 0);
        assert_eq!(servo.aim(Side::Back, 10), AimResult::Busy);
        assert_eq!(servo.park(10), AimResult::Busy);
        assert_eq!(servo.target_angle(), 0);
    }

    #[test]
    fn aim_at_current_angle_is_noop() {
        let mut servo = model();
        servo.aim(Side::Back, 0);
        servo.update(1000);
        assert_eq!(servo.aim(Side::Back, 1000), AimResult::AlreadyAimed);
        assert!(!servo.is_moving());
    }

    #[test]
    fn update_without_move_is_noop() {
        let mut servo = model();
        assert!(!servo.update(10_000));
        assert_eq!(servo.current_angle(), 83);
    }

    #[test]
    fn move_to_clamps_angle() {
        let mut servo = model();
        assert!(matches!(servo.move_to(250, 0), AimResult::Started { to: 180, .. }));
    }

    #[test]
    fn cancel_keeps_pre_move_angle() {
        let mut servo = model();
        servo.aim(Side::Front, 0);
        servo.cancel();
        assert!(!servo.is_moving());
        assert_eq!(servo.target_angle(), 83);
        assert!(!servo.update(1000));
        assert_eq!(servo.current_angle(), 83);
    }

    #[test]
    fn park_returns_to_idle() {
        let mut servo = model();
        servo.aim(Side::Front, 0);
        servo.update(150);
        assert!(matches!(servo.park(200), AimResult::Started { to: 83, .. }));
        servo.update(350);
        assert_eq!(servo.aimed_side(), None);
    }
}
