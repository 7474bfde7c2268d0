//! Host-side utilities for the `impression-tracker` crate.
//!
//! `impression-tracker` only reads geometry through its [`impression_tracker::ScrollHost`]
//! trait. This crate provides framework-neutral pieces that make it easy to drive:
//!
//! - [`ListLayout`]: a linear scroll container model (extents, scroll offset, realized range)
//! - [`SimHost`]: a recycling host with an outer vertical list and nested horizontal lists
//! - [`EventRecorder`]: a listener that records every impression callback
//!
//! These are useful for tests, demos and for prototyping an adapter before wiring a real UI.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod host;
mod layout;
mod recorder;

#[cfg(test)]
mod tests;

pub use host::{ContainerId, GeometryFault, SimHost, ViewHandle};
pub use layout::ListLayout;
pub use recorder::{EventRecorder, ImpressionEvent};
