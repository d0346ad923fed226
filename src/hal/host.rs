//! Host (desktop) timing on top of `std`.

use std::time::{Duration, Instant};

use crate::traits::{Clock, Delay};

/// Monotonic clock and sleeping delay for desktop runs.
///
/// Clones share the same epoch.
///
/// # Example
///
/// ```rust
/// use rs_rover::hal::HostTimer;
/// use rs_rover::traits::{Clock, Delay};
///
/// let mut timer = HostTimer::new();
/// let start = timer.now_ms();
/// timer.delay_ms(2);
/// assert!(timer.now_ms() >= start + 2);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct HostTimer {
    epoch: Instant,
}

impl HostTimer {
    /// Creates a timer whose epoch is now.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for HostTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostTimer {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Delay for HostTimer {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
