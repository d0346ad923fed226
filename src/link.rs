//! Client connection state with synchronous change listeners.

use alloc::boxed::Box;
use alloc::vec::Vec;

type Listener = Box<dyn FnMut(bool)>;

/// Whether a client is connected, plus the listeners told about changes.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use rs_rover::link::ConnectionState;
///
/// let seen = Rc::new(Cell::new(0));
/// let counter = seen.clone();
///
/// let mut link = ConnectionState::new();
/// link.on_change(move |_| counter.set(counter.get() + 1));
///
/// assert!(link.set_connected(true));
/// assert!(!link.set_connected(true)); // no change, no notification
/// assert_eq!(seen.get(), 1);
/// ```
#[derive(Default)]
pub struct ConnectionState {
    connected: bool,
    listeners: Vec<Listener>,
}

impl ConnectionState {
    /// Starts disconnected with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener called with the new state on every change.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(bool) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Updates the state. Returns true (after notifying) if it changed.
    pub fn set_connected(&mut self, connected: bool) -> bool {
        if self.connected == connected {
            return false;
        }
        self.connected = connected;
        log::info!("client {}", if connected { "connected" } else { "disconnected" });
        for listener in self.listeners.iter_mut() {
            listener(connected);
        }
        true
    }

    /// Current state.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl core::fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectionState")
            .field("connected", &self.connected)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
