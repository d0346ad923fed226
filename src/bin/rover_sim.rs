//! Desktop simulator for the rover core.
//!
//! Reads newline-delimited commands from stdin, exactly as the rover would
//! receive them over its serial link, and prints telemetry lines to stdout.
//! Logs go to stderr.
//!
//! The simulated world is a straight corridor: an obstacle ahead and one
//! behind. Driving forward closes the gap ahead, driving backward closes the
//! gap behind. The sonar sees whichever side the servo points at.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=rs_rover=debug cargo run --bin rover_sim --features sim
//! ```
//!
//! Besides the rover protocol (`1`..`8`, anything else stops, JSON settings
//! such as `{"l":600,"r":600}`), lines starting with `!` control the world:
//!
//! | Line | Effect |
//! |------|--------|
//! | `!connect` / `!disconnect` | Client link state |
//! | `!front 80` | Put the obstacle ahead at 80cm |
//! | `!back 30` | Put the obstacle behind at 30cm |
//! | `!state` | Print the rover state |

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use rs_rover::config::RobotConfig;
use rs_rover::hal::HostTimer;
use rs_rover::traits::{
    Clock, Glyph, RangeSensor, ServoDriver, StatusIndicator, TemperatureSensor, WheelDriver,
    WheelOutputs, MAX_DUTY,
};
use rs_rover::Robot;

/// Top speed of the simulated rover at full duty.
const TOP_SPEED_CM_PER_S: f32 = 60.0;

/// Sonar range limit; farther obstacles give no echo.
const SONAR_LIMIT_CM: f32 = 400.0;

// ============================================================================
// Simulated World
// ============================================================================

struct World {
    angle: u8,
    outputs: WheelOutputs,
    front_cm: f32,
    back_cm: f32,
    config: RobotConfig,
}

impl World {
    fn new(config: &RobotConfig) -> Self {
        Self {
            angle: config.servo.idle_angle,
            outputs: WheelOutputs::ZERO,
            front_cm: 150.0,
            back_cm: 150.0,
            config: config.clone(),
        }
    }

    // Moves the rover along the corridor for `dt_ms` at the current outputs.
    fn advance(&mut self, dt_ms: u64) {
        let o = self.outputs;
        let forward = f32::from(o.left_forward) + f32::from(o.right_forward);
        let backward = f32::from(o.left_backward) + f32::from(o.right_backward);
        let net = (forward - backward) / (2.0 * f32::from(MAX_DUTY));
        let moved = net * TOP_SPEED_CM_PER_S * dt_ms as f32 / 1000.0;
        self.front_cm = (self.front_cm - moved).max(0.0);
        self.back_cm = (self.back_cm + moved).max(0.0);
    }

    fn echo(&self) -> Option<u16> {
        let distance = if self.angle == self.config.servo.forward_angle {
            self.front_cm
        } else if self.angle == self.config.servo.backward_angle {
            self.back_cm
        } else {
            return None;
        };
        (distance < SONAR_LIMIT_CM).then_some(distance as u16)
    }
}

type SharedWorld = Rc<RefCell<World>>;

struct SimWheels(SharedWorld);

impl WheelDriver for SimWheels {
    type Error = Infallible;

    fn write(&mut self, outputs: WheelOutputs) -> Result<(), Infallible> {
        self.0.borrow_mut().outputs = outputs;
        Ok(())
    }
}

struct SimServo(SharedWorld);

impl ServoDriver for SimServo {
    type Error = Infallible;

    fn set_angle(&mut self, angle: u8) -> Result<(), Infallible> {
        self.0.borrow_mut().angle = angle;
        Ok(())
    }
}

struct SimSonar(SharedWorld);

impl RangeSensor for SimSonar {
    fn ping_cm(&mut self) -> Option<u16> {
        self.0.borrow().echo()
    }
}

struct SimThermometer;

impl TemperatureSensor for SimThermometer {
    fn read_celsius(&mut self) -> i16 {
        24
    }
}

struct LogIndicator;

impl StatusIndicator for LogIndicator {
    fn show(&mut self, glyph: Glyph) {
        log::info!("indicator: {:?}", glyph);
    }
}

type SimRobot = Robot<SimWheels, SimServo, SimSonar, SimThermometer, HostTimer, LogIndicator>;

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rs_rover=info,rover_sim=info".into()),
        )
        .init();

    let config = RobotConfig::default();
    let world: SharedWorld = Rc::new(RefCell::new(World::new(&config)));
    let timer = HostTimer::new();

    let mut robot: SimRobot = Robot::new(
        SimWheels(world.clone()),
        SimServo(world.clone()),
        SimSonar(world.clone()),
        SimThermometer,
        timer,
        LogIndicator,
        &config,
    );
    robot.init()?;

    eprintln!("rover_sim ready: type 1-8 to move, anything else stops, !connect to report");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_millis(10));
    let mut last_advance = timer.now_ms();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                let now = timer.now_ms();
                world.borrow_mut().advance(now.saturating_sub(last_advance));
                last_advance = now;
                if let Err(e) = handle_line(&mut robot, &world, line.trim(), now) {
                    log::warn!("{e:#}");
                }
            }
            _ = tick.tick() => {
                let now = timer.now_ms();
                world.borrow_mut().advance(now.saturating_sub(last_advance));
                last_advance = now;

                if let Some(report) = robot.poll(now) {
                    if report.stopped {
                        log::warn!("safety stop: {:?}", report);
                    }
                }
                if let Some(line) = robot.telemetry(now) {
                    print!("{line}");
                }
            }
        }
    }

    robot.motion_mut().stop();
    log::info!("stdin closed, rover stopped");
    Ok(())
}

fn handle_line(robot: &mut SimRobot, world: &SharedWorld, line: &str, now: u64) -> Result<()> {
    let Some(control) = line.strip_prefix('!') else {
        let outcome = robot.dispatch(line, now)?;
        log::info!("{line:?} -> {outcome:?}");
        return Ok(());
    };

    let mut parts = control.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("connect"), None) => robot.set_connected(true),
        (Some("disconnect"), None) => robot.set_connected(false),
        (Some("front"), Some(cm)) => world.borrow_mut().front_cm = cm.parse::<f32>().context("front cm")?,
        (Some("back"), Some(cm)) => world.borrow_mut().back_cm = cm.parse::<f32>().context("back cm")?,
        (Some("state"), None) => {
            let w = world.borrow();
            let motion = robot.motion();
            println!(
                "direction={} outputs={:?} servo={} front={:.0}cm back={:.0}cm held={:?}",
                motion.direction().as_str(),
                motion.outputs(),
                w.angle,
                w.front_cm,
                w.back_cm,
                robot.filter().clearance(),
            );
        }
        _ => bail!("unknown control line: !{control}"),
    }
    Ok(())
}
