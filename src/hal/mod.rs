//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `host`: `std` timing for desktop runs (requires `std` feature)

pub mod mock;

#[cfg(feature = "std")]
pub mod host;

pub use mock::*;

#[cfg(feature = "std")]
pub use host::HostTimer;
