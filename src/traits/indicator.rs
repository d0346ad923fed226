//! Status indicator abstraction.
//!
//! The rover shows a single glyph at a time (a 5x5 LED matrix on the stock
//! board). The core only decides *what* to show. [`StatusIndicator`]
//! implementations decide how.

use crate::commands::Maneuver;

/// Something the status indicator can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    /// Arrow for the maneuver now driving the wheels.
    Arrow(Maneuver),
    /// The interlock refused a move.
    Blocked,
    /// Stopped with a client connected.
    Ready,
    /// Stopped with no client connected.
    Offline,
    /// A client just connected.
    Connected,
    /// The client just disconnected.
    Disconnected,
}

/// Display trait for the status glyph.
pub trait StatusIndicator {
    /// Shows `glyph`, replacing whatever was shown before.
    fn show(&mut self, glyph: Glyph);
}

/// Wraps an indicator and drops writes that would not change the glyph.
#[derive(Debug)]
pub struct Indicator<I: StatusIndicator> {
    inner: I,
    current: Option<Glyph>,
}

impl<I: StatusIndicator> Indicator<I> {
    /// Wraps `inner`. The first [`show`](Self::show) always goes through.
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            current: None,
        }
    }

    /// Shows `glyph` if it differs from the last one shown.
    ///
    /// Returns true if the underlying indicator was written.
    pub fn show(&mut self, glyph: Glyph) -> bool {
        if self.current == Some(glyph) {
            return false;
        }
        self.current = Some(glyph);
        self.inner.show(glyph);
        true
    }

    /// The glyph currently shown.
    pub fn current(&self) -> Option<Glyph> {
        self.current
    }

    /// Borrow the wrapped indicator.
    pub fn inner(&self) -> &I {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockIndicator;

    #[test]
    fn repeated_glyph_is_written_once() {
        let mut indicator = Indicator::new(MockIndicator::new());
        assert!(indicator.show(Glyph::Ready));
        assert!(!indicator.show(Glyph::Ready));
        assert!(indicator.show(Glyph::Arrow(Maneuver::Forward)));
        assert!(indicator.show(Glyph::Ready));
        assert_eq!(indicator.inner().shown.len(), 3);
        assert_eq!(indicator.current(), Some(Glyph::Ready));
    }
}
