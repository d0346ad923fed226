//! Edge case tests for filtering, clamping and hardware failures

use rs_rover::{
    config::{MotionConfig, RobotConfig, SonarConfig},
    hal::{MockIndicator, MockServo, MockSonar, MockTimer, MockWheels},
    median_of_3, Clearance, Direction, DistanceFilter, Maneuver, MotionController, MotionOutcome,
    Side, WheelOutputs, MAX_DUTY,
};

type TestController = MotionController<MockWheels, MockServo, MockTimer, MockIndicator>;

fn controller_with(wheels: MockWheels, config: &RobotConfig) -> TestController {
    MotionController::new(wheels, MockServo::new(), MockTimer::new(), MockIndicator::new(), config)
}

fn controller() -> TestController {
    controller_with(MockWheels::new(), &RobotConfig::default())
}

// =============================================================================
// Duty clamping
// =============================================================================

#[test]
fn custom_duties_always_in_range() {
    let mut motion = controller();
    let cases = [
        (i32::MIN, i32::MAX),
        (-1, 0),
        (0, 1023),
        (1023, 1024),
        (512, -512),
        (100_000, 7),
    ];
    for (l, r) in cases {
        motion.set_custom_duties(l, r);
        let (left, right) = motion.custom_duties();
        assert!(left <= MAX_DUTY && right <= MAX_DUTY, "({l}, {r}) -> ({left}, {right})");
        assert_eq!(i32::from(left), l.clamp(0, 1023));
        assert_eq!(i32::from(right), r.clamp(0, 1023));
    }
}

#[test]
fn outputs_never_exceed_max_duty() {
    let mut motion = controller();
    motion.set_custom_duties(5000, 5000);
    for maneuver in Maneuver::ALL {
        motion.execute(maneuver, Clearance::unknown(999)).unwrap();
        let o = motion.outputs();
        for duty in [o.left_forward, o.left_backward, o.right_forward, o.right_backward] {
            assert!(duty <= MAX_DUTY);
        }
    }
}

#[test]
fn zero_custom_duty_means_maximum() {
    let mut motion = controller();
    motion.set_custom_duties(0, 300);
    motion.execute(Maneuver::Backward, Clearance::unknown(999)).unwrap();
    assert_eq!(motion.outputs(), WheelOutputs::new(0, 1023, 0, 300));
}

// =============================================================================
// Distance filter
// =============================================================================

#[test]
fn median_property() {
    assert_eq!(median_of_3(5, 999, 6), 6);
    assert_eq!(median_of_3(6, 5, 999), 6);
}

#[test]
fn all_below_min_keeps_previous_value() {
    let mut sonar = MockSonar::new();
    sonar.queue_pings(&[Some(70), Some(70), Some(70), Some(1), Some(1), Some(1)]);
    let mut filter = DistanceFilter::new(sonar, MockTimer::new(), &SonarConfig::default());

    assert_eq!(filter.sample(Side::Back), 70);
    assert_eq!(filter.sample(Side::Back), 70);
    assert_eq!(filter.last_good(Side::Back), 70);
}

#[test]
fn custom_range_respected() {
    let config = SonarConfig::default().with_range(10, 100);
    let mut sonar = MockSonar::new().with_fallback(Some(150));
    sonar.queue_pings(&[Some(50), Some(50), Some(50)]);
    let mut filter = DistanceFilter::new(sonar, MockTimer::new(), &config);

    assert_eq!(filter.sample(Side::Front), 50);
    assert_eq!(filter.sample(Side::Front), 50);
}

// =============================================================================
// Safe distances
// =============================================================================

#[test]
fn setter_clamps_safe_distances() {
    let mut motion = controller();
    motion.set_safe_distances(-10, 1000);
    let safe = motion.safe_distances();
    assert_eq!((safe.front, safe.back), (20, 100));
}

#[test]
fn interlock_uses_updated_threshold() {
    let mut motion = controller();
    motion.set_safe_distances(80, 40);
    let outcome = motion.execute(Maneuver::TurnRight, Clearance::new(60, 999)).unwrap();
    assert!(matches!(outcome, MotionOutcome::Blocked(b) if b.threshold_cm == 80));
    motion.reset_safe_distances();
    let outcome = motion.execute(Maneuver::TurnRight, Clearance::new(60, 999)).unwrap();
    assert_eq!(outcome, MotionOutcome::Started(Maneuver::TurnRight));
}

// =============================================================================
// Hardware failures and timing knobs
// =============================================================================

#[test]
fn write_failure_during_change_leaves_rover_stopped() {
    let mut motion = controller_with(MockWheels::new().failing(2), &RobotConfig::default());
    assert!(motion.execute(Maneuver::Forward, Clearance::unknown(999)).is_err());
    assert!(!motion.is_transitioning());
    assert_eq!(motion.direction(), Direction::Idle);

    // later commands work again
    let outcome = motion.execute(Maneuver::Forward, Clearance::unknown(999)).unwrap();
    assert_eq!(outcome, MotionOutcome::Started(Maneuver::Forward));
}

#[test]
fn braking_can_be_disabled() {
    let config = RobotConfig::default().with_motion(MotionConfig::default().with_brake(0, 0));
    let mut motion = controller_with(MockWheels::new(), &config);
    motion.execute(Maneuver::SpinLeft, Clearance::unknown(999)).unwrap();
    let before = motion.wheels().history.len();
    motion.execute(Maneuver::SpinRight, Clearance::unknown(999)).unwrap();
    // zero, then ramp 25/50/100
    assert_eq!(motion.wheels().history[before], WheelOutputs::ZERO);
    assert_eq!(motion.wheels().history.len(), before + 4);
}

#[test]
fn reset_custom_duties_restores_maximum() {
    let mut motion = controller();
    motion.set_custom_duties(100, 100);
    motion.reset_custom_duties();
    motion.execute(Maneuver::Forward, Clearance::unknown(999)).unwrap();
    assert_eq!(motion.outputs(), WheelOutputs::new(1023, 0, 1023, 0));
}
